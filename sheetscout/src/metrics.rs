use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Counters describing what the bot has done since start.
///
/// Cloning shares the counters, so one instance can be handed to the search
/// service, the command handler and the poller.
#[derive(Debug, Clone)]
pub struct BotMetrics {
    // Command metrics
    commands_received: Arc<AtomicU64>,
    usage_errors: Arc<AtomicU64>,
    invalid_modes: Arc<AtomicU64>,

    // Search metrics
    searches: Arc<AtomicU64>,
    empty_searches: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
    source_failures: Arc<AtomicU64>,
    fetch_micros_total: Arc<AtomicU64>,
    fetch_micros_peak: Arc<AtomicU64>,

    // Transport metrics
    replies_sent: Arc<AtomicU64>,
    reply_failures: Arc<AtomicU64>,
    poll_failures: Arc<AtomicU64>,
}

impl BotMetrics {
    /// Creates a new BotMetrics instance
    pub fn new() -> Self {
        Self {
            commands_received: Arc::new(AtomicU64::new(0)),
            usage_errors: Arc::new(AtomicU64::new(0)),
            invalid_modes: Arc::new(AtomicU64::new(0)),
            searches: Arc::new(AtomicU64::new(0)),
            empty_searches: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
            source_failures: Arc::new(AtomicU64::new(0)),
            fetch_micros_total: Arc::new(AtomicU64::new(0)),
            fetch_micros_peak: Arc::new(AtomicU64::new(0)),
            replies_sent: Arc::new(AtomicU64::new(0)),
            reply_failures: Arc::new(AtomicU64::new(0)),
            poll_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_command(&self, name: &str) {
        let total = self.commands_received.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Command /{} received, total: {}", name, total);
    }

    pub fn record_usage_error(&self) {
        self.usage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_mode(&self) {
        self.invalid_modes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed search and its match count
    pub fn record_search(&self, matches: usize) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        if matches == 0 {
            self.empty_searches.fetch_add(1, Ordering::Relaxed);
        }
        self.matches_found
            .fetch_add(matches as u64, Ordering::Relaxed);
    }

    pub fn record_source_failure(&self) {
        self.source_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the duration of a successful row fetch
    pub fn record_fetch(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.fetch_micros_total
            .fetch_add(micros, Ordering::Relaxed);
        self.fetch_micros_peak.fetch_max(micros, Ordering::Relaxed);
    }

    /// Records the outcome of one reply delivery
    pub fn record_reply(&self, delivered: bool) {
        if delivered {
            self.replies_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.reply_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_poll_failure(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets current statistics
    pub fn get_stats(&self) -> BotStats {
        let searches = self.searches.load(Ordering::Relaxed);
        let fetch_total = self.fetch_micros_total.load(Ordering::Relaxed);
        BotStats {
            commands_received: self.commands_received.load(Ordering::Relaxed),
            usage_errors: self.usage_errors.load(Ordering::Relaxed),
            invalid_modes: self.invalid_modes.load(Ordering::Relaxed),
            searches,
            empty_searches: self.empty_searches.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            mean_fetch: Duration::from_micros(fetch_total.checked_div(searches).unwrap_or(0)),
            peak_fetch: Duration::from_micros(self.fetch_micros_peak.load(Ordering::Relaxed)),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            reply_failures: self.reply_failures.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Bot stats:\n\
             Commands received: {}\n\
             Usage errors/invalid modes: {}/{}\n\
             Searches (empty): {} ({})\n\
             Matches found: {}\n\
             Source failures: {}\n\
             Fetch time (mean/peak): {}/{}\n\
             Replies sent/failed: {}/{}\n\
             Poll failures: {}",
            stats.commands_received,
            stats.usage_errors,
            stats.invalid_modes,
            stats.searches,
            stats.empty_searches,
            stats.matches_found,
            stats.source_failures,
            humantime::format_duration(stats.mean_fetch),
            humantime::format_duration(stats.peak_fetch),
            stats.replies_sent,
            stats.reply_failures,
            stats.poll_failures
        );
    }
}

impl Default for BotMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`BotMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotStats {
    pub commands_received: u64,
    pub usage_errors: u64,
    pub invalid_modes: u64,
    pub searches: u64,
    pub empty_searches: u64,
    pub matches_found: u64,
    pub source_failures: u64,
    pub mean_fetch: Duration,
    pub peak_fetch: Duration,
    pub replies_sent: u64,
    pub reply_failures: u64,
    pub poll_failures: u64,
}
