use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom as _;
use rand::{Rng, SeedableRng as _};

use super::error::{Error, Result};

/// One unit of load handed to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// An existing content identifier (download, provider lookup, ...).
    Key(Arc<str>),
    /// A synthetic payload to be generated and written by the executor.
    Payload { seq: u64, size: u64 },
}

impl WorkItem {
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Key(k) => Some(k),
            Self::Payload { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Finite(u64),
    Unbounded,
}

/// Supplies work items in dispatch order.
///
/// `remaining()` must reflect the true number of items `next_item()` will still yield:
/// a source that reports `Finite(n)` with `n > 0` must return `Some` from `next_item()`.
pub trait WorkloadSource: Send + 'static {
    fn next_item(&mut self) -> Option<WorkItem>;

    fn remaining(&self) -> Remaining;

    fn is_exhausted(&self) -> bool {
        self.remaining() == Remaining::Finite(0)
    }
}

/// A pre-loaded, finite list of identifiers.
#[derive(Debug, Clone)]
pub struct ListSource {
    items: Vec<Arc<str>>,
    cursor: usize,
}

impl ListSource {
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arc<str>>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            cursor: 0,
        }
    }

    /// Builds the list and applies one uniform random permutation to it.
    pub fn shuffled<I, T, R>(items: I, rng: &mut R) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arc<str>>,
        R: Rng + ?Sized,
    {
        let mut source = Self::new(items);
        source.items.shuffle(rng);
        source
    }

    pub fn shuffled_with_seed<I, T>(items: I, seed: u64) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arc<str>>,
    {
        Self::shuffled(items, &mut SmallRng::seed_from_u64(seed))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl WorkloadSource for ListSource {
    fn next_item(&mut self) -> Option<WorkItem> {
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(WorkItem::Key(item))
    }

    fn remaining(&self) -> Remaining {
        Remaining::Finite(self.items.len().saturating_sub(self.cursor) as u64)
    }
}

/// Generates payload descriptors of a fixed size, either up to a count or forever.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    size: u64,
    total: Option<u64>,
    next_seq: u64,
}

impl SyntheticSource {
    /// `count == None` yields items until the run is stopped externally.
    pub fn new(size: u64, count: Option<u64>) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidPayloadSize);
        }
        Ok(Self {
            size,
            total: count,
            next_seq: 0,
        })
    }

    pub fn unbounded(size: u64) -> Result<Self> {
        Self::new(size, None)
    }
}

impl WorkloadSource for SyntheticSource {
    fn next_item(&mut self) -> Option<WorkItem> {
        if self.total.is_some_and(|total| self.next_seq >= total) {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(WorkItem::Payload {
            seq,
            size: self.size,
        })
    }

    fn remaining(&self) -> Remaining {
        match self.total {
            Some(total) => Remaining::Finite(total.saturating_sub(self.next_seq)),
            None => Remaining::Unbounded,
        }
    }
}
