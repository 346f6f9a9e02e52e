use crate::config::BotConfig;
use crate::errors::SearchError;
use crate::modes::ModeTable;

/// Reply when the table source cannot be read
pub const SOURCE_ERROR: &str = "❌ Error accessing data.";

/// Reply for failures that are neither the user's nor the source's
pub const INTERNAL_ERROR: &str = "⚠️ Something went wrong while searching.";

/// The fixed texts the bot replies with
#[derive(Debug, Clone)]
pub struct Messages {
    bot_name: String,
    mode_list: String,
    welcome_mode: String,
    usage_mode: String,
    example_keyword: String,
}

impl Messages {
    pub fn new(bot_name: &str, modes: &ModeTable, example_keyword: &str) -> Self {
        let mut names = modes.names();
        let first = names.next().unwrap_or("complete").to_string();
        let last = names.last().map(str::to_string).unwrap_or_else(|| first.clone());

        Self {
            bot_name: bot_name.to_string(),
            mode_list: modes.joined_names(),
            welcome_mode: first,
            usage_mode: last,
            example_keyword: example_keyword.to_string(),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(&config.bot_name, &config.modes, &config.example_keyword)
    }

    /// Reply to `/start`
    pub fn welcome(&self) -> String {
        format!(
            "👋 Welcome to {}!\n\
             Use /search <mode> <keyword> to find matching rows 🎶\n\
             Available modes: {}\n\n\
             Example: /search {} {}",
            self.bot_name, self.mode_list, self.welcome_mode, self.example_keyword
        )
    }

    /// Reply to `/search` with a missing mode or keyword
    pub fn usage(&self) -> String {
        format!(
            "❗Usage: /search <mode> <keyword>\nExample: /search {} {}",
            self.usage_mode, self.example_keyword
        )
    }

    /// Reply to `/search` with a mode outside the configured set
    pub fn invalid_mode(&self) -> String {
        format!("❗Invalid mode. Choose from: {}", self.mode_list)
    }

    /// Maps a failed search to the text shown to the requester. Error
    /// details never leak into the reply.
    pub fn reply_for(&self, err: &SearchError) -> String {
        match err {
            SearchError::Usage => self.usage(),
            SearchError::InvalidMode { .. } => self.invalid_mode(),
            SearchError::SourceUnavailable(_) => SOURCE_ERROR.to_string(),
            SearchError::Transport(_) | SearchError::ConfigError(_) | SearchError::IoError(_) => {
                INTERNAL_ERROR.to_string()
            }
        }
    }
}
