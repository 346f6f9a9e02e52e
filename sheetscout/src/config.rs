use config::{Config as ConfigBuilder, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{SearchError, SearchResult};
use crate::modes::ModeTable;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "SHEETSCOUT";

const REDACTED: &str = "<redacted>";

/// Configuration for the bot, built once at process start and handed to the
/// search service and the adapters.
///
/// # Configuration Locations
///
/// Sources are merged in order of precedence (later wins):
/// 1. Global `$CONFIG_DIR/sheetscout/config.yaml`
/// 2. Local `.sheetscout.yaml` in the current directory
/// 3. Custom config file specified via `--config`
/// 4. Environment variables prefixed with `SHEETSCOUT_`, using `__` between
///    nested keys (`SHEETSCOUT_TELEGRAM__BOT_TOKEN`)
///
/// # Configuration Format
///
/// ```yaml
/// bot_name: "Tamil FLAC Search Bot"
/// example_keyword: "vijay"
///
/// # Mode name -> partition (sheet title), listed in this order
/// modes:
///   - { name: complete, partition: Sheet1 }
///   - { name: date, partition: Sheet2 }
///   - { name: live, partition: Sheet3 }
///
/// # Leading rows of every partition that are never searched
/// header_rows: 3
///
/// # Matches shown per reply
/// display_cap: 5
///
/// log_level: "info"
/// workers: 4
///
/// telegram:
///   bot_token: "123456:ABC..."
///   poll_timeout: "30s"
///   retry_delay: "5s"
///
/// sheets:
///   spreadsheet_id: "1AbC..."
///   api_key: "AIza..."
///   fetch_timeout: "10s"
/// ```
///
/// Secrets can be left out of the file and supplied through the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Name used in the welcome message
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Keyword used in the example lines of the help texts
    #[serde(default = "default_example_keyword")]
    pub example_keyword: String,

    /// Accepted modes and the partitions they map to
    #[serde(default)]
    pub modes: ModeTable,

    /// Number of leading rows in each partition treated as headers
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,

    /// Maximum number of matches rendered in one reply
    #[serde(default = "default_display_cap")]
    pub display_cap: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of threads handling one batch of updates
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_workers")]
    pub workers: NonZeroUsize,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub sheets: SheetsConfig,
}

/// Settings of the Telegram Bot API transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// How long one `getUpdates` call waits on the server for new messages
    #[serde(default = "default_poll_timeout", with = "duration_str")]
    pub poll_timeout: Duration,

    /// Pause after a failed `getUpdates` call
    #[serde(default = "default_retry_delay", with = "duration_str")]
    pub retry_delay: Duration,
}

/// Settings of the Google Sheets table source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,

    /// API key for spreadsheets readable by link
    #[serde(default)]
    pub api_key: Option<String>,

    /// OAuth bearer token; takes precedence over `api_key`
    #[serde(default)]
    pub access_token: Option<String>,

    /// File holding an OAuth bearer token, read once at startup
    #[serde(default)]
    pub access_token_file: Option<PathBuf>,

    /// Upper bound for one row fetch
    #[serde(default = "default_fetch_timeout", with = "duration_str")]
    pub fetch_timeout: Duration,
}

fn default_bot_name() -> String {
    "Sheet Search Bot".to_string()
}

fn default_example_keyword() -> String {
    "vijay".to_string()
}

fn default_header_rows() -> usize {
    3
}

fn default_display_cap() -> NonZeroUsize {
    NonZeroUsize::new(5).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_workers() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            example_keyword: default_example_keyword(),
            modes: ModeTable::default(),
            header_rows: default_header_rows(),
            display_cap: default_display_cap(),
            log_level: default_log_level(),
            workers: default_workers(),
            telegram: TelegramConfig::default(),
            sheets: SheetsConfig::default(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_telegram_api_base(),
            poll_timeout: default_poll_timeout(),
            retry_delay: default_retry_delay(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            api_base: default_sheets_api_base(),
            api_key: None,
            access_token: None,
            access_token_file: None,
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl BotConfig {
    /// Loads configuration from the default locations and the process
    /// environment
    pub fn load() -> SearchResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, adding a specific file on top of the default
    /// locations
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        Self::load_with_env(config_path, None)
    }

    /// Like [`BotConfig::load_from`], but reads overrides from `env` instead
    /// of the process environment when given
    pub fn load_with_env(
        config_path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(SearchError::config_error(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("sheetscout/config.yaml")),
            // Local config
            Some(PathBuf::from(".sheetscout.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: BotConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks settings the search service depends on. Adapter credentials
    /// are checked when the adapters are built.
    pub fn validate(&self) -> SearchResult<()> {
        self.modes.validate()?;

        if self.example_keyword.trim().is_empty() {
            return Err(SearchError::config_error("example_keyword must not be empty"));
        }

        Ok(())
    }

    /// Renders the effective configuration as YAML with every secret replaced
    pub fn to_redacted_yaml(&self) -> SearchResult<String> {
        let mut shown = self.clone();
        let redact = |secret: &mut Option<String>| {
            if secret.is_some() {
                *secret = Some(REDACTED.to_string());
            }
        };
        redact(&mut shown.telegram.bot_token);
        redact(&mut shown.sheets.api_key);
        redact(&mut shown.sheets.access_token);

        serde_yaml::to_string(&shown)
            .map_err(|e| SearchError::config_error(format!("cannot render config: {}", e)))
    }
}

/// Serde adapter for durations written as humantime strings (`"30s"`, `"1m"`)
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
