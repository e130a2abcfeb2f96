//! Image adjustments applied before matching.

use image::{
    imageops::FilterType,
    DynamicImage,
    GenericImageView,
};
use rayon::{
    iter::ParallelIterator,
    slice::ParallelSliceMut,
};
use tracing::debug;

/// Adjustment strengths. Zero disables an adjustment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterOptions {
    /// Gaussian blur sigma (0.0 - 10.0).
    pub blur: f32,
    /// Unsharp mask sigma (0.0 - 10.0).
    pub sharpen: f32,
    /// Gamma correction (0.0 - 10.0). Values above 1 lighten.
    pub gamma: f32,
    /// Contrast in percent (-100 - 100).
    pub contrast: f32,
    /// Brightness in percent (-100 - 100).
    pub brightness: f32,
}

impl FilterOptions {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

pub fn apply_filters(mut image: DynamicImage, options: &FilterOptions) -> DynamicImage {
    if options.is_noop() {
        return image;
    }
    debug!(?options, "Applying filters");

    if options.blur > 0.0 {
        image = image.blur(options.blur);
    }
    if options.sharpen > 0.0 {
        image = image.unsharpen(options.sharpen, 0);
    }
    if options.gamma > 0.0 {
        image = adjust_gamma(image, options.gamma);
    }
    if options.contrast != 0.0 {
        image = image.adjust_contrast(options.contrast);
    }
    if options.brightness != 0.0 {
        let shift = (255.0 * options.brightness / 100.0).round() as i32;
        image = image.brighten(shift);
    }

    image
}

/// `out = in ^ (1 / gamma)` on every color channel.
fn adjust_gamma(image: DynamicImage, gamma: f32) -> DynamicImage {
    let exponent = 1.0 / gamma as f64;
    let table: [u8; 256] = std::array::from_fn(|v| {
        let value = (v as f64 / 255.0).powf(exponent) * 255.0;
        value.round().clamp(0.0, 255.0) as u8
    });

    let mut rgba = image.into_rgba8();
    let buffer: &mut [u8] = &mut rgba;
    buffer.par_chunks_mut(4).for_each(|pixel| {
        for channel in &mut pixel[..3] {
            *channel = table[*channel as usize];
        }
    });

    DynamicImage::ImageRgba8(rgba)
}

/// Resizes with a Lanczos filter. A zero side is derived from the other one
/// to keep the aspect ratio.
pub fn resize(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (src_width, src_height) = image.dimensions();
    let (src_width, src_height) = (src_width.max(1) as f64, src_height.max(1) as f64);

    let (width, height) = match (width, height) {
        (0, 0) => return image.clone(),
        (0, h) => (((h as f64 * src_width / src_height).round() as u32).max(1), h),
        (w, 0) => (w, ((w as f64 * src_height / src_width).round() as u32).max(1)),
        size => size,
    };

    image.resize_exact(width, height, FilterType::Lanczos3)
}
