use crate::errors::{SearchError, SearchResult};
use crate::modes::{Mode, ModeTable};

/// A validated search request: the partition to read and the lower-cased
/// keyword to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub mode: Mode,
    pub keyword: String,
}

impl Query {
    /// Builds a query from a mode name and a raw keyword.
    ///
    /// The keyword is trimmed, inner whitespace runs collapse to one space,
    /// and the result is lower-cased. An empty keyword is a usage error;
    /// an unknown mode is an invalid-mode error.
    pub fn new(mode: &str, keyword: &str, modes: &ModeTable) -> SearchResult<Self> {
        let keyword = keyword.split_whitespace().collect::<Vec<_>>().join(" ");
        if keyword.is_empty() {
            return Err(SearchError::Usage);
        }

        let mode = modes
            .resolve(mode)
            .ok_or_else(|| SearchError::invalid_mode(mode.trim().to_lowercase()))?;

        Ok(Self {
            mode: mode.clone(),
            keyword: keyword.to_lowercase(),
        })
    }

    /// Builds a query from `/search` arguments: the first is the mode, the
    /// rest are joined with single spaces into the keyword
    pub fn from_args<S: AsRef<str>>(args: &[S], modes: &ModeTable) -> SearchResult<Self> {
        let tokens: Vec<&str> = args
            .iter()
            .flat_map(|arg| arg.as_ref().split_whitespace())
            .collect();

        match tokens.split_first() {
            Some((mode, keyword)) if !keyword.is_empty() => {
                Self::new(mode, &keyword.join(" "), modes)
            }
            _ => Err(SearchError::Usage),
        }
    }
}
