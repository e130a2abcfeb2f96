//! Color keys and the sRGB to CIE Lab conversion used for bead matching.
//!
//! Conversion pipeline, fixed for the whole crate:
//! - 8-bit channels are scaled to `0.0..=1.0`
//! - the sRGB transfer curve is removed and the linear values are taken to
//!   XYZ with the sRGB primaries and D65 white point
//! - XYZ is adapted from D65 to the D50 reference white with the Bradford
//!   transform
//! - XYZ (D50) is converted to Lab (D50)

use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use dashmap::DashMap;
use image::{
    Rgb,
    Rgba,
};
use palette::{
    chromatic_adaptation::AdaptIntoUnclamped,
    lms::matrix::Bradford,
    white_point::{
        D50,
        D65,
    },
    FromColor,
    IntoColor,
    Lab,
    Srgb,
    Xyz,
};

/// Lab coordinate relative to the D50 reference white.
pub type LabColor = Lab<D50, f32>;

/// An 8-bit RGB color.
///
/// Alpha is never part of this type, so two pixels that only differ in alpha
/// share one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// The color as a fully opaque pixel.
    pub const fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.red, self.green, self.blue, u8::MAX])
    }

    /// `#rrggbb` notation.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    pub fn to_lab(self) -> LabColor {
        to_lab(self)
    }
}

impl From<Rgba<u8>> for RgbColor {
    fn from(Rgba([red, green, blue, _]): Rgba<u8>) -> Self {
        Self::new(red, green, blue)
    }
}

impl From<Rgb<u8>> for RgbColor {
    fn from(Rgb([red, green, blue]): Rgb<u8>) -> Self {
        Self::new(red, green, blue)
    }
}

impl From<[u8; 3]> for RgbColor {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::new(red, green, blue)
    }
}

/// Converts an 8-bit sRGB color to Lab (D50), adapting the white point with
/// the Bradford method.
pub fn to_lab(color: RgbColor) -> LabColor {
    let xyz: Xyz<D65, f32> = Srgb::new(color.red, color.green, color.blue)
        .into_format::<f32>()
        .into_color();
    let adapted: Xyz<D50, f32> = xyz.adapt_into_unclamped_with::<Bradford>();

    LabColor::from_color(adapted)
}

/// Lookup counters for one of the run caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Memoizes [`to_lab`] for the lifetime of a run.
///
/// Lookups of different keys go to different shards, and readers of a shard
/// never block each other.
#[derive(Debug, Default)]
pub struct LabCache {
    entries: DashMap<RgbColor, LabColor>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl LabCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_convert(&self, color: RgbColor) -> LabColor {
        if let Some(lab) = self.entries.get(&color).map(|lab| *lab) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return lab;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let lab = to_lab(color);

        // A concurrent miss on the same key computes the same value, whichever
        // insert lands first is what every caller sees.
        *self.entries.entry(color).or_insert(lab)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rayon::iter::{
        IntoParallelIterator,
        ParallelIterator,
    };

    use super::*;

    #[test]
    fn black_is_origin() {
        let lab = to_lab(RgbColor::new(0, 0, 0));
        assert_abs_diff_eq!(lab.l, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(lab.a, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(lab.b, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn white_maps_to_reference_white() {
        let lab = to_lab(RgbColor::new(255, 255, 255));
        assert_abs_diff_eq!(lab.l, 100.0, epsilon = 0.05);
        assert_abs_diff_eq!(lab.a, 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(lab.b, 0.0, epsilon = 0.05);
    }

    #[test]
    fn greys_are_neutral() {
        for v in [27u8, 64, 128, 145, 200] {
            let lab = to_lab(RgbColor::new(v, v, v));
            assert_abs_diff_eq!(lab.a, 0.0, epsilon = 0.05);
            assert_abs_diff_eq!(lab.b, 0.0, epsilon = 0.05);
        }
    }

    #[test]
    fn grey_lightness() {
        assert_abs_diff_eq!(to_lab(RgbColor::new(27, 27, 27)).l, 10.0, epsilon = 0.5);
        assert_abs_diff_eq!(to_lab(RgbColor::new(145, 145, 145)).l, 60.0, epsilon = 0.5);
    }

    #[test]
    fn primary_red_d50() {
        let lab = to_lab(RgbColor::new(255, 0, 0));
        assert_abs_diff_eq!(lab.l, 54.29, epsilon = 0.5);
        assert_abs_diff_eq!(lab.a, 80.80, epsilon = 0.5);
        assert_abs_diff_eq!(lab.b, 69.89, epsilon = 0.5);
    }

    #[test]
    fn primary_blue_d50() {
        let lab = to_lab(RgbColor::new(0, 0, 255));
        assert_abs_diff_eq!(lab.l, 29.57, epsilon = 0.5);
        assert_abs_diff_eq!(lab.a, 68.29, epsilon = 0.5);
        assert_abs_diff_eq!(lab.b, -112.03, epsilon = 0.5);
    }

    #[test]
    fn alpha_is_not_part_of_the_key() {
        let opaque = RgbColor::from(Rgba([10, 20, 30, 255]));
        let clear = RgbColor::from(Rgba([10, 20, 30, 0]));
        assert_eq!(opaque, clear);

        let cache = LabCache::new();
        cache.get_or_convert(opaque);
        cache.get_or_convert(clear);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn hex_notation() {
        assert_eq!(RgbColor::new(255, 8, 171).to_hex(), "#ff08ab");
    }

    #[test]
    fn concurrent_lookups_agree() {
        let cache = LabCache::new();
        let expected = to_lab(RgbColor::new(12, 200, 99));

        let results = (0..256)
            .into_par_iter()
            .map(|_| cache.get_or_convert(RgbColor::new(12, 200, 99)))
            .collect::<Vec<_>>();

        assert_eq!(cache.len(), 1);
        assert!(results.iter().all(|lab| *lab == expected));
    }
}
