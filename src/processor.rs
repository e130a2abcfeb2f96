//! The pixel pass: matches every pixel of an image to a bead, in parallel.

use std::{
    path::Path,
    time::Instant,
};

use image::{
    ImageFormat,
    Rgba,
    RgbaImage,
};
use rayon::{
    iter::{
        IndexedParallelIterator,
        ParallelIterator,
    },
    slice::{
        ParallelSlice,
        ParallelSliceMut,
    },
};
use tracing::{
    debug,
    info,
};

use crate::{
    color::RgbColor,
    matcher::NearestColorMatcher,
    palette_index::{
        PaletteEntry,
        PaletteIndex,
    },
    usage::{
        UsageAggregator,
        UsageSink,
        UsageTable,
    },
    Result,
};

/// Edge length in output pixels of one bead in bead-style output.
pub const BEAD_STYLE_FACTOR: u32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Draw every bead as a `BEAD_STYLE_FACTOR` square block.
    pub bead_style: bool,
    /// Skip matching and copy the input as an opaque image.
    pub no_color_matching: bool,
}

impl ProcessOptions {
    pub fn scale(&self) -> u32 {
        if self.bead_style && !self.no_color_matching {
            BEAD_STYLE_FACTOR
        } else {
            1
        }
    }
}

/// The bead chosen for every coordinate of the processed image.
#[derive(Debug, Clone)]
pub struct MatchedGrid<'r> {
    width: u32,
    height: u32,
    index: &'r PaletteIndex,
    ids: Vec<usize>,
}

impl<'r> MatchedGrid<'r> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The bead at `(x, y)` in input coordinates.
    pub fn get(&self, x: u32, y: u32) -> Option<&'r PaletteEntry> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let id = self.ids[y as usize * self.width as usize + x as usize];
        self.index.get(id)
    }

    /// Rows of beads, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = &'r PaletteEntry> + '_> + '_ {
        let index = self.index;
        self.ids
            .chunks(self.width.max(1) as usize)
            .map(move |row| row.iter().map(move |&id| &index[id]))
    }
}

/// Result of a run.
#[derive(Debug)]
pub struct Pattern<'r> {
    /// The rendered pattern, enlarged in bead-style mode.
    pub image: RgbaImage,
    /// `None` when color matching was skipped.
    pub matches: Option<MatchedGrid<'r>>,
    pub usage: UsageTable,
}

/// Drives the matcher over an image.
#[derive(Debug, Clone, Copy)]
pub struct PixelProcessor<'r> {
    index: &'r PaletteIndex,
    options: ProcessOptions,
}

impl<'r> PixelProcessor<'r> {
    pub fn new(index: &'r PaletteIndex, options: ProcessOptions) -> Self {
        Self { index, options }
    }

    /// Processes `input` with fresh caches and returns the pattern together
    /// with the completed usage table.
    pub fn run(&self, input: &RgbaImage) -> Result<Pattern<'r>> {
        if self.options.no_color_matching {
            return Ok(Pattern {
                image: copy_opaque(input),
                matches: None,
                usage: UsageTable::new(),
            });
        }

        let matcher = NearestColorMatcher::new(self.index);

        let start = Instant::now();
        let (sink, aggregator) = UsageAggregator::spawn()?;
        let processed = self.process(input, &matcher, sink);
        // The sink is gone at this point, whatever the outcome, so the
        // aggregator always terminates.
        let usage = aggregator.finish()?;
        let (image, grid) = processed?;

        info!(duration = ?start.elapsed(), "Image processed");
        usage.report();
        let labs = matcher.lab_cache();
        let matches = matcher.match_cache();
        debug!(
            colors = labs.len(),
            lab_hits = labs.stats().hits,
            lab_misses = labs.stats().misses,
            match_hits = matches.stats().hits,
            match_misses = matches.stats().misses,
            "Cache statistics"
        );

        Ok(Pattern {
            image,
            matches: Some(grid),
            usage,
        })
    }

    /// Matches every pixel and emits one usage event per input pixel into
    /// `sink`. The sink is dropped once all rows are done, and the first
    /// failing event aborts the pass.
    ///
    /// Rows are processed in parallel; each row owns a disjoint band of the
    /// output buffer and of the matched grid.
    pub fn process<S: UsageSink>(
        &self,
        input: &RgbaImage,
        matcher: &NearestColorMatcher<'r>,
        sink: S,
    ) -> Result<(RgbaImage, MatchedGrid<'r>)> {
        let (width, height) = input.dimensions();
        let scale = self.options.scale();
        let out_width = width * scale;

        let mut output = RgbaImage::new(out_width, height * scale);
        let mut ids = vec![0; width as usize * height as usize];

        if width > 0 && height > 0 {
            let band_len = out_width as usize * scale as usize * 4;
            let buffer: &mut [u8] = &mut output;

            buffer
                .par_chunks_mut(band_len)
                .zip(ids.par_chunks_mut(width as usize))
                .enumerate()
                .try_for_each(|(y, (band, id_row))| -> Result<()> {
                    for (x, slot) in id_row.iter_mut().enumerate() {
                        let pixel = RgbColor::from(*input.get_pixel(x as u32, y as u32));
                        let id = matcher.match_id(pixel);
                        let entry = &matcher.index()[id];
                        let Rgba(rgba) = entry.color.to_rgba();

                        for dy in 0..scale as usize {
                            let row_start = dy * out_width as usize;
                            for dx in 0..scale as usize {
                                let offset = (row_start + x * scale as usize + dx) * 4;
                                band[offset..offset + 4].copy_from_slice(&rgba);
                            }
                        }

                        *slot = id;
                        sink.record(entry.name.clone())?;
                    }
                    Ok(())
                })?;
        }

        drop(sink);

        Ok((
            output,
            MatchedGrid {
                width,
                height,
                index: matcher.index(),
                ids,
            },
        ))
    }
}

/// Copies `input` with every pixel made fully opaque.
pub fn copy_opaque(input: &RgbaImage) -> RgbaImage {
    let mut output = RgbaImage::new(input.width(), input.height());
    let buffer: &mut [u8] = &mut output;

    buffer
        .par_chunks_mut(4)
        .zip(input.as_raw().par_chunks(4))
        .for_each(|(out, src)| {
            out[..3].copy_from_slice(&src[..3]);
            out[3] = u8::MAX;
        });

    output
}

/// Writes `image` as PNG regardless of the extension of `path`.
pub fn save_png(image: &RgbaImage, path: impl AsRef<Path>) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
