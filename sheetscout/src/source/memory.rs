use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Row, TableSource};
use crate::errors::{SearchError, SearchResult};

/// In-memory table source with a fetch counter
#[derive(Debug, Default)]
pub struct MemorySource {
    partitions: HashMap<String, Vec<Row>>,
    fetches: AtomicU64,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a partition
    pub fn with_partition<R, C>(mut self, partition: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.partitions.insert(partition.into(), rows);
        self
    }

    /// Number of `fetch_all_rows` calls served so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl TableSource for MemorySource {
    fn fetch_all_rows(&self, partition: &str) -> SearchResult<Vec<Row>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.partitions.get(partition).cloned().ok_or_else(|| {
            SearchError::source_unavailable(format!("unknown partition '{}'", partition))
        })
    }
}
