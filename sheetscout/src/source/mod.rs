/// Table sources: where the rows of a partition come from.
///
/// The search service only needs one read call per request, so the seam is a
/// single method. [`SheetsClient`] reads from the Google Sheets API;
/// [`MemorySource`] serves fixed rows and backs the tests and benchmarks.
pub mod memory;
pub mod sheets;

pub use memory::MemorySource;
pub use sheets::{SheetsClient, SheetsCredentials};

use std::sync::Arc;

use crate::errors::SearchResult;

/// An ordered sequence of cells. Only the first two are used: the display
/// label and the searchable text.
pub type Row = Vec<String>;

/// Provides every row of a named partition, in source order
pub trait TableSource: Send + Sync {
    /// Fetches all rows of `partition`, header rows included.
    ///
    /// Implementations must not mutate the source and must give up after a
    /// bounded time, reporting `SearchError::SourceUnavailable`.
    fn fetch_all_rows(&self, partition: &str) -> SearchResult<Vec<Row>>;
}

impl<T: TableSource + ?Sized> TableSource for Arc<T> {
    fn fetch_all_rows(&self, partition: &str) -> SearchResult<Vec<Row>> {
        (**self).fetch_all_rows(partition)
    }
}

impl<T: TableSource + ?Sized> TableSource for Box<T> {
    fn fetch_all_rows(&self, partition: &str) -> SearchResult<Vec<Row>> {
        (**self).fetch_all_rows(partition)
    }
}
