//! Nearest bead lookup in Lab space, memoized per RGB color.

use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use dashmap::DashMap;
use ordered_float::OrderedFloat;
use palette::color_difference::EuclideanDistance;

use crate::{
    color::{
        CacheStats,
        LabCache,
        LabColor,
        RgbColor,
    },
    palette_index::{
        PaletteEntry,
        PaletteIndex,
    },
};

/// Maps already matched colors to the position of their bead in the
/// [`PaletteIndex`] of the run.
///
/// Once a color has been committed every lookup returns that same bead.
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: DashMap<RgbColor, usize>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, color: RgbColor) -> Option<usize> {
        let found = self.entries.get(&color).map(|id| *id);
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Stores `id` for `color` unless another worker got there first, and
    /// returns the value that is now in the cache.
    pub fn commit(&self, color: RgbColor, id: usize) -> usize {
        *self.entries.entry(color).or_insert(id)
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

/// Position of the bead closest to `lab`. Ties go to the earliest bead.
pub fn nearest(index: &PaletteIndex, lab: LabColor) -> usize {
    index
        .iter()
        .enumerate()
        // `min_by_key` keeps the first of several equal minimums.
        .min_by_key(|(_, entry)| OrderedFloat(entry.lab.distance_squared(lab)))
        .map_or(0, |(id, _)| id)
}

/// Finds the closest bead for a pixel.
///
/// The matcher owns its caches, so cached positions always refer to the
/// index it was built with. One matcher serves one run.
#[derive(Debug)]
pub struct NearestColorMatcher<'r> {
    index: &'r PaletteIndex,
    labs: LabCache,
    matches: MatchCache,
}

impl<'r> NearestColorMatcher<'r> {
    pub fn new(index: &'r PaletteIndex) -> Self {
        Self {
            index,
            labs: LabCache::new(),
            matches: MatchCache::new(),
        }
    }

    pub fn index(&self) -> &'r PaletteIndex {
        self.index
    }

    pub fn lab_cache(&self) -> &LabCache {
        &self.labs
    }

    pub fn match_cache(&self) -> &MatchCache {
        &self.matches
    }

    /// Position of the matching bead in the index.
    pub fn match_id(&self, pixel: RgbColor) -> usize {
        if let Some(id) = self.matches.get(pixel) {
            return id;
        }

        let lab = self.labs.get_or_convert(pixel);
        let id = nearest(self.index, lab);

        // Two workers missing on the same color compute the same bead, so it
        // does not matter whose commit wins.
        self.matches.commit(pixel, id)
    }

    pub fn match_color(&self, pixel: RgbColor) -> &'r PaletteEntry {
        &self.index[self.match_id(pixel)]
    }
}
