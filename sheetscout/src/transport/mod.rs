/// Message transport: receiving commands and delivering replies.
///
/// [`Transport`] and [`Notifier`] are the two seams the bot loop talks to.
/// [`TelegramClient`] implements both against the Telegram Bot API; tests
/// use in-memory fakes.
pub mod telegram;

pub use telegram::TelegramClient;

use crate::errors::SearchResult;

/// Identifies the conversation a reply goes to
pub type ChatId = i64;

/// One inbound update. Updates that carry no text still advance the
/// polling offset, so they are kept with `text == None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub update_id: i64,
    pub chat_id: Option<ChatId>,
    pub text: Option<String>,
}

impl Update {
    pub fn text_message(update_id: i64, chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            update_id,
            chat_id: Some(chat_id),
            text: Some(text.into()),
        }
    }

    /// The bot command in this update, if any
    pub fn command(&self) -> Option<Command> {
        self.text.as_deref().and_then(Command::parse)
    }
}

/// A parsed `/name arg1 arg2 ...` message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Lower-cased command name without the slash or `@botname` suffix
    pub name: String,
    /// Whitespace-separated arguments
    pub args: Vec<String>,
}

impl Command {
    pub fn new<S: Into<String>>(name: &str, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_lowercase(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses message text. Returns `None` unless the text starts with `/`
    /// followed by a command name made of letters, digits and underscores.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;
        let mut tokens = rest.split_whitespace();
        let head = tokens.next()?;
        let name = head.split('@').next().unwrap_or_default();

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }

        Some(Self::new(name, tokens))
    }
}

/// Receives updates from the messaging platform
pub trait Transport: Send + Sync {
    /// Returns updates with `update_id >= offset`, waiting on the platform
    /// for a bounded time when none are pending
    fn get_updates(&self, offset: Option<i64>) -> SearchResult<Vec<Update>>;
}

/// Delivers replies to the requester
pub trait Notifier: Send + Sync {
    fn reply(&self, chat_id: ChatId, text: &str) -> SearchResult<()>;
}
