/// Error types for sheetscout.
///
/// Every failure a chat command can run into is a variant of [`SearchError`].
/// The bot layer never forwards these to the requester verbatim: each variant
/// is mapped to one of the fixed texts in [`crate::messages`], and only the
/// log sees the detail.
///
/// ```rust,ignore
/// match service.search("live", "anirudh") {
///     Ok(reply) => notifier.reply(chat, &reply),
///     Err(SearchError::InvalidMode { .. }) => notifier.reply(chat, &messages.invalid_mode()),
///     Err(e) => notifier.reply(chat, &messages.reply_for(&e)),
/// }
/// ```
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while handling a command
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Usage error: expected a mode and at least one keyword")]
    Usage,
    #[error("Invalid mode: {mode}")]
    InvalidMode { mode: String },
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn invalid_mode(mode: impl Into<String>) -> Self {
        Self::InvalidMode { mode: mode.into() }
    }

    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the error was caused by the requester rather than by the
    /// bot or one of its collaborators
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Usage | Self::InvalidMode { .. })
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SearchError::invalid_mode("foo");
        assert!(matches!(err, SearchError::InvalidMode { ref mode } if mode == "foo"));

        let err = SearchError::source_unavailable("connection refused");
        assert!(matches!(err, SearchError::SourceUnavailable(_)));

        let err = SearchError::transport("sendMessage failed");
        assert!(matches!(err, SearchError::Transport(_)));

        let err = SearchError::config_error("missing bot token");
        assert!(matches!(err, SearchError::ConfigError(_)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SearchError::Usage.to_string(),
            "Usage error: expected a mode and at least one keyword"
        );
        assert_eq!(
            SearchError::invalid_mode("foo").to_string(),
            "Invalid mode: foo"
        );
        assert_eq!(
            SearchError::source_unavailable("HTTP 503").to_string(),
            "Source unavailable: HTTP 503"
        );
        assert_eq!(
            SearchError::config_error("Missing required field").to_string(),
            "Configuration error: Missing required field"
        );
    }

    #[test]
    fn test_user_errors() {
        assert!(SearchError::Usage.is_user_error());
        assert!(SearchError::invalid_mode("x").is_user_error());
        assert!(!SearchError::source_unavailable("x").is_user_error());
        assert!(!SearchError::transport("x").is_user_error());
    }
}
