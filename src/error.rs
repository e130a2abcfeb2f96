use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Filtering left no bead colors to match against. Raised before any pixel
    /// is processed.
    #[error("no bead colors left after applying the palette filters")]
    EmptyPalette,

    #[error("invalid palette file: {0}")]
    PaletteFile(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The usage aggregator stopped before all pixels were counted.
    #[error("bead usage stream closed before processing finished")]
    UsageStreamClosed,
}
