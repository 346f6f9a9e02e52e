/// The search-and-format routine behind `/search`.
///
/// A request flows through three small pieces:
/// 1. [`Query`] validates the arguments: a known mode and a non-empty keyword.
///    Nothing is fetched when validation fails.
/// 2. [`SearchService`] reads every row of the mode's partition from its
///    [`TableSource`](crate::source::TableSource).
/// 3. [`RowMatcher`] skips the header rows and keeps, in source order, each
///    row whose second cell contains the keyword, ignoring case.
///
/// The kept rows are rendered by [`SearchOutput`](crate::results::SearchOutput),
/// which bounds the reply to the display cap.
pub mod engine;
pub mod matcher;
pub mod query;

pub use engine::{SearchService, SearchSettings};
pub use matcher::RowMatcher;
pub use query::Query;
