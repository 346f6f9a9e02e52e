/// The bot layer: turns commands into replies and runs the polling loop.
///
/// [`CommandHandler`] is the boundary where every [`SearchError`] becomes a
/// short user-facing text; nothing past it can fail a command. [`Poller`]
/// feeds it batches of updates and sends the replies back.
///
/// Within one batch the commands are handled in parallel on a dedicated
/// rayon pool. Each command only reads the table source, so handlers share
/// nothing but the service's immutable settings and the atomic metrics.
/// Replies are still sent in update order.
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::errors::{SearchError, SearchResult};
use crate::messages::Messages;
use crate::metrics::BotMetrics;
use crate::search::{SearchService, SearchSettings};
use crate::source::SheetsClient;
use crate::transport::{ChatId, Command, Notifier, TelegramClient, Transport, Update};

/// How often the running poller logs its statistics
const STATS_INTERVAL: Duration = Duration::from_secs(600);

/// Granularity of the shutdown check while waiting to retry
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Builds a search service reading from the configured spreadsheet
pub fn sheets_service(config: &BotConfig, metrics: BotMetrics) -> SearchResult<SearchService> {
    let source = SheetsClient::from_config(&config.sheets)?;
    Ok(SearchService::with_metrics(
        Arc::new(source),
        SearchSettings::from(config),
        metrics,
    ))
}

/// Maps commands to replies
#[derive(Clone)]
pub struct CommandHandler {
    service: SearchService,
    messages: Messages,
}

impl CommandHandler {
    pub fn new(service: SearchService, messages: Messages) -> Self {
        Self { service, messages }
    }

    pub fn metrics(&self) -> &BotMetrics {
        self.service.metrics()
    }

    /// Reply for `command`, or `None` for commands the bot does not know
    pub fn handle(&self, command: &Command) -> Option<String> {
        match command.name.as_str() {
            "start" => {
                self.metrics().record_command(&command.name);
                Some(self.messages.welcome())
            }
            "search" => {
                self.metrics().record_command(&command.name);
                Some(self.search(&command.args))
            }
            other => {
                debug!("Ignoring unknown command /{}", other);
                None
            }
        }
    }

    fn search(&self, args: &[String]) -> String {
        match self.service.search_args(args) {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    SearchError::Usage => self.metrics().record_usage_error(),
                    SearchError::InvalidMode { mode } => {
                        debug!("Rejected unknown mode '{}'", mode);
                        self.metrics().record_invalid_mode();
                    }
                    // Source failures are logged where the fetch happens
                    _ => {}
                }
                self.messages.reply_for(&e)
            }
        }
    }
}

/// Long-polling loop: fetch updates, handle commands, send replies
pub struct Poller {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    handler: CommandHandler,
    pool: rayon::ThreadPool,
    retry_delay: Duration,
    offset: Option<i64>,
}

impl Poller {
    pub fn new(
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        handler: CommandHandler,
        workers: usize,
        retry_delay: Duration,
    ) -> SearchResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("sheetscout-worker-{}", i))
            .build()
            .map_err(|e| SearchError::config_error(format!("cannot start worker pool: {}", e)))?;

        Ok(Self {
            transport,
            notifier,
            handler,
            pool,
            retry_delay,
            offset: None,
        })
    }

    /// Wires the Telegram transport and the Sheets source from configuration
    pub fn from_config(config: &BotConfig) -> SearchResult<Self> {
        let telegram = Arc::new(TelegramClient::from_config(&config.telegram)?);
        let service = sheets_service(config, BotMetrics::new())?;
        let handler = CommandHandler::new(service, Messages::from_config(config));

        Self::new(
            telegram.clone(),
            telegram,
            handler,
            config.workers.get(),
            config.telegram.retry_delay,
        )
    }

    pub fn metrics(&self) -> &BotMetrics {
        self.handler.metrics()
    }

    /// Offset the next `get_updates` call will use
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetches and handles one batch of updates. Returns the batch size.
    pub fn run_once(&mut self) -> SearchResult<usize> {
        let updates = self.transport.get_updates(self.offset).map_err(|e| {
            self.metrics().record_poll_failure();
            e
        })?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset = Some(last + 1);
        }

        let handler = &self.handler;
        let replies: Vec<(ChatId, String)> = self.pool.install(|| {
            updates
                .par_iter()
                .filter_map(|update| Self::handle_update(handler, update))
                .collect()
        });

        for (chat_id, text) in replies {
            match self.notifier.reply(chat_id, &text) {
                Ok(()) => self.metrics().record_reply(true),
                Err(e) => {
                    warn!("Reply to chat {} failed: {}", chat_id, e);
                    self.metrics().record_reply(false);
                }
            }
        }

        Ok(updates.len())
    }

    fn handle_update(handler: &CommandHandler, update: &Update) -> Option<(ChatId, String)> {
        let chat_id = update.chat_id?;
        let command = update.command()?;
        info!("Handling /{} from chat {}", command.name, chat_id);
        handler.handle(&command).map(|reply| (chat_id, reply))
    }

    /// Polls until `shutdown` is set. Poll failures are logged and retried
    /// after the configured delay; they never end the loop.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!("Polling for commands");
        let mut last_stats = Instant::now();

        while !shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.run_once() {
                warn!(
                    "Polling failed: {}; retrying in {}",
                    e,
                    humantime::format_duration(self.retry_delay)
                );
                Self::pause(self.retry_delay, shutdown);
            }

            if last_stats.elapsed() >= STATS_INTERVAL {
                self.metrics().log_stats();
                last_stats = Instant::now();
            }
        }

        info!("Polling stopped");
        self.metrics().log_stats();
    }

    fn pause(delay: Duration, shutdown: &AtomicBool) {
        let until = Instant::now() + delay;
        while !shutdown.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= until {
                break;
            }
            thread::sleep(SHUTDOWN_POLL.min(until - now));
        }
    }
}
