//! Work distribution: static chunks or dynamic batches over the rank space

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the rank space is divided among workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// One contiguous range per worker, computed up front
    Static,
    /// Shared cursor, `batch_size` ranks per pull
    #[default]
    Dynamic,
}

/// A half-open rank range owned by one worker at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchUnit {
    pub start: u128,
    pub end: u128,
}

impl SearchUnit {
    pub fn len(&self) -> u128 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl From<SearchUnit> for Range<u128> {
    fn from(unit: SearchUnit) -> Self {
        unit.start..unit.end
    }
}

/// Source of search units shared by all workers
pub trait WorkSource: Send + Sync {
    /// Next unit for `worker`, `None` once it has nothing left to do
    fn next_unit(&self, worker: usize) -> Option<SearchUnit>;

    /// Size of the rank space being covered
    fn space(&self) -> u128;
}

/// Split `[0, space)` into `parts` contiguous ranges whose sizes differ by at
/// most one. Empty ranges are only produced when `space < parts`.
pub fn static_chunks(space: u128, parts: usize) -> Vec<SearchUnit> {
    if parts == 0 {
        return Vec::new();
    }

    let parts_u = parts as u128;
    let base = space / parts_u;
    let extra = space % parts_u;

    let mut start = 0u128;
    (0..parts_u)
        .map(|i| {
            let size = base + u128::from(i < extra);
            let unit = SearchUnit { start, end: start + size };
            start += size;
            unit
        })
        .collect()
}

/// Static chunking: worker `i` gets chunk `i`, once
#[derive(Debug)]
pub struct StaticChunks {
    units: Vec<SearchUnit>,
    claimed: Vec<AtomicBool>,
    space: u128,
}

impl StaticChunks {
    pub fn new(space: u128, workers: usize) -> Self {
        let units = static_chunks(space, workers);
        let claimed = units.iter().map(|_| AtomicBool::new(false)).collect();
        Self { units, claimed, space }
    }
}

impl WorkSource for StaticChunks {
    fn next_unit(&self, worker: usize) -> Option<SearchUnit> {
        let unit = *self.units.get(worker)?;
        if unit.is_empty() || self.claimed[worker].swap(true, Ordering::AcqRel) {
            return None;
        }
        debug!(worker, start = %unit.start, end = %unit.end, "claimed static chunk");
        Some(unit)
    }

    fn space(&self) -> u128 {
        self.space
    }
}

/// Dynamic batching: one mutex-guarded cursor, advanced only under the lock
#[derive(Debug)]
pub struct DynamicBatches {
    cursor: Mutex<u128>,
    batch_size: u128,
    space: u128,
}

impl DynamicBatches {
    pub fn new(space: u128, batch_size: usize) -> Self {
        Self {
            cursor: Mutex::new(0),
            batch_size: batch_size.max(1) as u128,
            space,
        }
    }

    /// Ranks not yet handed out
    pub fn remaining(&self) -> u128 {
        let cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        self.space - *cursor
    }
}

impl WorkSource for DynamicBatches {
    fn next_unit(&self, worker: usize) -> Option<SearchUnit> {
        let unit = {
            let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
            if *cursor >= self.space {
                return None;
            }
            let start = *cursor;
            let end = start.saturating_add(self.batch_size).min(self.space);
            *cursor = end;
            SearchUnit { start, end }
        };

        debug!(worker, start = %unit.start, end = %unit.end, "pulled batch");
        Some(unit)
    }

    fn space(&self) -> u128 {
        self.space
    }
}

/// Build the work source for `partition`
pub fn work_source(partition: Partition, space: u128, workers: usize, batch_size: usize) -> Box<dyn WorkSource> {
    match partition {
        Partition::Static => Box::new(StaticChunks::new(space, workers)),
        Partition::Dynamic => Box::new(DynamicBatches::new(space, batch_size)),
    }
}
