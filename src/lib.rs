//! Bead-machine turns images into craft bead patterns.
//!
//! Every pixel is replaced by the closest bead color of a palette, compared
//! in CIE Lab (D50) space, and the number of beads per color is counted.
//!
//! ### Basic Usage
//!
//! ```rust
//! use bead_machine::{
//!     BeadKind,
//!     InclusionFlags,
//!     PaletteEntry,
//!     PaletteIndex,
//!     PixelProcessor,
//!     ProcessOptions,
//!     RgbColor,
//! };
//! use image::{
//!     Rgba,
//!     RgbaImage,
//! };
//!
//! let palette = vec![
//!     PaletteEntry::new("black", RgbColor::new(0, 0, 0), BeadKind::default()),
//!     PaletteEntry::new("white", RgbColor::new(255, 255, 255), BeadKind::default()),
//! ];
//! let index = PaletteIndex::filter(palette, InclusionFlags::default())?;
//!
//! let image = RgbaImage::from_pixel(4, 4, Rgba([30, 30, 30, 255]));
//! let pattern = PixelProcessor::new(&index, ProcessOptions::default()).run(&image)?;
//!
//! assert_eq!(pattern.usage.count("black"), 16);
//! # Ok::<(), bead_machine::Error>(())
//! ```
//!
//! ## Pieces
//! - [`PaletteIndex`] holds the beads a run may use, selected by
//!   [`InclusionFlags`]. Palette files are read with [`load_palette`].
//! - [`NearestColorMatcher`] finds the closest bead for a color. It owns a
//!   [`LabCache`] and a [`MatchCache`], so cached results never outlive the
//!   palette they were computed for.
//! - [`PixelProcessor`] runs the matcher over all rows in parallel and feeds
//!   a [`UsageAggregator`] with one event per pixel.
//! - [`filters`], [`boards`] and [`html`] cover the steps around matching.

pub mod boards;
pub mod color;
pub mod error;
pub mod filters;
pub mod html;
pub mod matcher;
pub mod palette_index;
pub mod processor;
pub mod usage;

pub use crate::{
    color::{
        to_lab,
        CacheStats,
        LabCache,
        LabColor,
        RgbColor,
    },
    error::{
        Error,
        Result,
    },
    matcher::{
        MatchCache,
        NearestColorMatcher,
    },
    palette_index::{
        load_palette,
        parse_palette,
        BeadKind,
        InclusionFlags,
        PaletteEntry,
        PaletteIndex,
    },
    processor::{
        MatchedGrid,
        Pattern,
        PixelProcessor,
        ProcessOptions,
        BEAD_STYLE_FACTOR,
    },
    usage::{
        UsageAggregator,
        UsageSender,
        UsageSink,
        UsageTable,
    },
};
