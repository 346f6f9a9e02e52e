use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::matcher::RowMatcher;
use super::query::Query;
use crate::config::BotConfig;
use crate::errors::SearchResult;
use crate::metrics::BotMetrics;
use crate::modes::ModeTable;
use crate::results::SearchOutput;
use crate::source::TableSource;

/// Settings the search routine reads; a subset of [`BotConfig`]
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub modes: ModeTable,
    pub header_rows: usize,
    pub display_cap: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&BotConfig::default())
    }
}

impl From<&BotConfig> for SearchSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            modes: config.modes.clone(),
            header_rows: config.header_rows,
            display_cap: config.display_cap.get(),
        }
    }
}

/// Runs keyword searches against a table source.
///
/// The service holds no per-request state; one instance is shared by every
/// worker handling updates.
#[derive(Clone)]
pub struct SearchService {
    source: Arc<dyn TableSource>,
    settings: SearchSettings,
    metrics: BotMetrics,
}

impl SearchService {
    pub fn new(source: Arc<dyn TableSource>, settings: SearchSettings) -> Self {
        Self::with_metrics(source, settings, BotMetrics::new())
    }

    /// Creates a service that records into shared metrics
    pub fn with_metrics(
        source: Arc<dyn TableSource>,
        settings: SearchSettings,
        metrics: BotMetrics,
    ) -> Self {
        Self {
            source,
            settings,
            metrics,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn modes(&self) -> &ModeTable {
        &self.settings.modes
    }

    pub fn metrics(&self) -> &BotMetrics {
        &self.metrics
    }

    /// Searches `keyword` in the partition of `mode` and renders the reply
    pub fn search(&self, mode: &str, keyword: &str) -> SearchResult<String> {
        let query = Query::new(mode, keyword, &self.settings.modes)?;
        Ok(self.find(&query)?.render())
    }

    /// Like [`SearchService::search`], taking the raw `/search` arguments
    pub fn search_args<S: AsRef<str>>(&self, args: &[S]) -> SearchResult<String> {
        let query = Query::from_args(args, &self.settings.modes)?;
        Ok(self.find(&query)?.render())
    }

    /// Fetches the partition of `query` and collects its matches
    pub fn find(&self, query: &Query) -> SearchResult<SearchOutput> {
        info!(
            "Searching mode '{}' for '{}'",
            query.mode.name, query.keyword
        );

        let started = Instant::now();
        let rows = self
            .source
            .fetch_all_rows(&query.mode.partition)
            .map_err(|e| {
                warn!(
                    "Fetching partition '{}' for mode '{}' failed: {}",
                    query.mode.partition, query.mode.name, e
                );
                self.metrics.record_source_failure();
                e
            })?;
        self.metrics.record_fetch(started.elapsed());

        let matcher = RowMatcher::new(&query.keyword);
        let mut output = SearchOutput::new(
            &query.mode.name,
            matcher.keyword(),
            self.settings.display_cap,
        );
        output.rows_scanned = rows.len().saturating_sub(self.settings.header_rows);
        for m in matcher.find_matches(&rows, self.settings.header_rows) {
            output.push(m);
        }

        self.metrics.record_search(output.total_matches);
        debug!(
            "Found {} matches in {} rows of '{}'",
            output.total_matches, output.rows_scanned, query.mode.partition
        );

        Ok(output)
    }
}
