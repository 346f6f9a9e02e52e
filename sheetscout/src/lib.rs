pub mod bot;
pub mod config;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod metrics;
pub mod modes;
pub mod results;
pub mod search;
pub mod source;
pub mod transport;

pub use bot::{CommandHandler, Poller};
pub use config::BotConfig;
pub use errors::{SearchError, SearchResult};
pub use messages::Messages;
pub use modes::{Mode, ModeTable};
pub use results::{Match, SearchOutput};
pub use search::{Query, SearchService, SearchSettings};
pub use source::{MemorySource, SheetsClient, TableSource};
pub use transport::{Command, Notifier, TelegramClient, Transport, Update};
