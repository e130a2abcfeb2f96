//! Counting how many beads of each color a pattern needs.
//!
//! Workers emit one event per matched pixel into a [`UsageSender`]. A single
//! aggregator thread folds the events into a [`UsageTable`] and hands it out
//! only after every sender has been dropped, so the table is never partial.

use std::{
    collections::HashMap,
    sync::{
        mpsc::{
            channel,
            Receiver,
            Sender,
        },
        Arc,
    },
    thread::{
        self,
        JoinHandle,
    },
};

use tracing::info;

use crate::{
    Error,
    Result,
};

/// Receives the name of the bead matched for each processed pixel.
pub trait UsageSink: Sync {
    fn record(&self, bead: Arc<str>) -> Result<()>;
}

/// Bead name to number of pixels matched to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageTable {
    counts: HashMap<Arc<str>, usize>,
}

impl UsageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, bead: Arc<str>) {
        *self.counts.entry(bead).or_default() += 1;
    }

    /// Pixels matched to `bead`, zero if it was never used.
    pub fn count(&self, bead: &str) -> usize {
        self.counts.get(bead).copied().unwrap_or(0)
    }

    /// Number of different bead colors used.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Total number of beads.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(bead, count)` pairs, most used first and by name among equal counts.
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut rows = self
            .counts
            .iter()
            .map(|(name, count)| (&**name, *count))
            .collect::<Vec<_>>();
        rows.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    pub fn report(&self) {
        info!(count = self.distinct(), "Bead colors");
        for (color, count) in self.sorted() {
            info!(color, count, "Beads used");
        }
    }
}

impl Extend<Arc<str>> for UsageTable {
    fn extend<I: IntoIterator<Item = Arc<str>>>(&mut self, iter: I) {
        for bead in iter {
            self.record(bead);
        }
    }
}

impl FromIterator<Arc<str>> for UsageTable {
    fn from_iter<I: IntoIterator<Item = Arc<str>>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

/// Producer half of the usage stream. Dropping every clone closes the stream.
#[derive(Debug, Clone)]
pub struct UsageSender {
    sender: Sender<Arc<str>>,
}

impl UsageSink for UsageSender {
    fn record(&self, bead: Arc<str>) -> Result<()> {
        self.sender
            .send(bead)
            .map_err(|_| Error::UsageStreamClosed)
    }
}

/// Consumer half of the usage stream, running on its own thread.
#[derive(Debug)]
pub struct UsageAggregator {
    handle: JoinHandle<UsageTable>,
}

impl UsageAggregator {
    /// Opens a usage stream and starts the thread that consumes it.
    pub fn spawn() -> Result<(UsageSender, Self)> {
        let (sender, receiver) = channel();
        let handle = thread::Builder::new()
            .name("bead-usage".into())
            .spawn(move || aggregate(receiver))?;

        Ok((UsageSender { sender }, Self { handle }))
    }

    /// Waits for the stream to close and returns the completed table.
    /// Nothing is reported before that.
    ///
    /// Blocks until every [`UsageSender`] has been dropped.
    pub fn finish(self) -> Result<UsageTable> {
        self.handle.join().map_err(|_| Error::UsageStreamClosed)
    }
}

fn aggregate(receiver: Receiver<Arc<str>>) -> UsageTable {
    receiver.into_iter().collect()
}
