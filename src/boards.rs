//! Bead board arithmetic.

use tracing::info;

/// Beads along one side of the board used for the usage estimate.
pub const BEADS_PER_BOARD: u32 = 29;

/// Diameter of one bead.
pub const BEAD_SIZE_CM: f64 = 0.5;

/// Default board edge length used when sizing an image in boards.
pub const DEFAULT_BOARD_DIMENSION: u32 = 20;

/// Boards needed to cover `beads` beads along one side.
///
/// This rounds half up instead of rounding up, so a dimension of 14 beads
/// reports zero boards.
pub fn boards_needed(beads: u32) -> u32 {
    (beads as f64 / BEADS_PER_BOARD as f64 + 0.5).floor() as u32
}

/// Physical length in cm of `beads` beads in a row.
pub fn measurement_cm(beads: u32) -> f64 {
    beads as f64 * BEAD_SIZE_CM
}

pub fn log_board_usage(width: u32, height: u32) {
    info!(
        width = boards_needed(width),
        height = boards_needed(height),
        "Bead board used"
    );
    info!(
        width = measurement_cm(width),
        height = measurement_cm(height),
        "Bead board measurement in cm"
    );
}

/// Target size of the pattern, in beads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    pub width: u32,
    pub height: u32,
    /// Overrides `width` when non-zero.
    pub boards_width: u32,
    /// Overrides `height` when non-zero.
    pub boards_height: u32,
    pub board_dimension: u32,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            boards_width: 0,
            boards_height: 0,
            board_dimension: DEFAULT_BOARD_DIMENSION,
        }
    }
}

impl ResizeOptions {
    /// The requested `(width, height)`, where zero means "keep the aspect
    /// ratio". `None` when no resize was asked for. Board sizes too large
    /// for `u32` saturate.
    pub fn target(&self) -> Option<(u32, u32)> {
        let width = if self.boards_width > 0 {
            self.boards_width.saturating_mul(self.board_dimension)
        } else {
            self.width
        };
        let height = if self.boards_height > 0 {
            self.boards_height.saturating_mul(self.board_dimension)
        } else {
            self.height
        };

        (width > 0 || height > 0).then_some((width, height))
    }
}
