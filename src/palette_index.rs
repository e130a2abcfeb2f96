//! Bead palettes: loading the palette file and narrowing it down to the beads
//! a run is allowed to use.

use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::Path,
    sync::Arc,
};

use serde::Deserialize;
use tracing::debug;

use crate::{
    color::{
        LabColor,
        RgbColor,
    },
    Error,
    Result,
};

/// Tags of a bead type that decide whether a run may use it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BeadKind {
    pub grey: bool,
    pub translucent: bool,
    pub fluorescent: bool,
}

/// A single bead color. The Lab coordinate is computed once on creation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub name: Arc<str>,
    pub color: RgbColor,
    pub lab: LabColor,
    pub kind: BeadKind,
}

impl PaletteEntry {
    pub fn new(name: impl Into<Arc<str>>, color: RgbColor, kind: BeadKind) -> Self {
        Self {
            name: name.into(),
            color,
            lab: color.to_lab(),
            kind,
        }
    }
}

/// Which bead types take part in matching. Plain and grey beads are always
/// allowed; translucent and fluorescent beads are opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InclusionFlags {
    /// Grey-scale mode: only grey beads are used, regardless of the
    /// translucent and fluorescent flags.
    pub grey_scale: bool,
    pub translucent: bool,
    pub fluorescent: bool,
}

impl InclusionFlags {
    pub fn includes(&self, kind: BeadKind) -> bool {
        if self.grey_scale {
            return kind.grey;
        }

        (!kind.translucent || self.translucent)
            && (!kind.fluorescent || self.fluorescent)
    }
}

/// The beads available to a run, in load order.
///
/// Never empty, and read-only once built.
#[derive(Debug, Clone)]
pub struct PaletteIndex {
    entries: Vec<PaletteEntry>,
}

impl PaletteIndex {
    /// Keeps the entries allowed by `flags`, preserving their order.
    ///
    /// Fails with [`Error::EmptyPalette`] when nothing is left.
    pub fn filter(
        entries: impl IntoIterator<Item = PaletteEntry>,
        flags: InclusionFlags,
    ) -> Result<Self> {
        let mut total = 0;
        let entries = entries
            .into_iter()
            .inspect(|_| total += 1)
            .filter(|entry| flags.includes(entry.kind))
            .collect::<Vec<_>>();

        debug!(total, kept = entries.len(), ?flags, "Palette filtered");

        if entries.is_empty() {
            return Err(Error::EmptyPalette);
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn get(&self, id: usize) -> Option<&PaletteEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaletteEntry> {
        self.entries.iter()
    }
}

impl std::ops::Index<usize> for PaletteIndex {
    type Output = PaletteEntry;

    fn index(&self, id: usize) -> &PaletteEntry {
        &self.entries[id]
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BeadConfig {
    r: u8,
    g: u8,
    b: u8,
    #[serde(default)]
    grey_shade: bool,
    #[serde(default)]
    translucent: bool,
    #[serde(default, alias = "Fluorescent")]
    flourescent: bool,
}

impl BeadConfig {
    fn into_entry(self, name: String) -> PaletteEntry {
        PaletteEntry::new(
            name,
            RgbColor::new(self.r, self.g, self.b),
            BeadKind {
                grey: self.grey_shade,
                translucent: self.translucent,
                fluorescent: self.flourescent,
            },
        )
    }
}

fn into_entries(configs: BTreeMap<String, BeadConfig>) -> Vec<PaletteEntry> {
    configs
        .into_iter()
        .map(|(name, config)| config.into_entry(name))
        .collect()
}

/// Parses a palette file: a JSON object mapping bead names to
/// `{"R", "G", "B", "GreyShade", "Translucent", "Flourescent"}`.
///
/// Entries come back sorted by name.
pub fn parse_palette(json: &str) -> Result<Vec<PaletteEntry>> {
    let configs: BTreeMap<String, BeadConfig> = serde_json::from_str(json)?;
    Ok(into_entries(configs))
}

pub fn load_palette(path: impl AsRef<Path>) -> Result<Vec<PaletteEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let configs: BTreeMap<String, BeadConfig> = serde_json::from_reader(reader)?;
    Ok(into_entries(configs))
}
