//! Google Sheets table source.
//!
//! Blocking reqwest client against the Sheets v4 `values` endpoint. One
//! partition is one sheet title; the whole sheet is read in a single call.

use std::fs;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use super::{Row, TableSource};
use crate::config::SheetsConfig;
use crate::errors::{SearchError, SearchResult};

const USER_AGENT: &str = concat!("sheetscout/", env!("CARGO_PKG_VERSION"));

/// How requests to the Sheets API are authorized
#[derive(Clone, PartialEq, Eq)]
pub enum SheetsCredentials {
    /// `key=` query parameter, for spreadsheets shared by link
    ApiKey(String),
    /// OAuth bearer token
    AccessToken(String),
}

impl std::fmt::Debug for SheetsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsCredentials::ApiKey(_) => f.write_str("ApiKey(..)"),
            SheetsCredentials::AccessToken(_) => f.write_str("AccessToken(..)"),
        }
    }
}

impl SheetsCredentials {
    /// Resolves credentials: access token > token file > API key
    pub fn from_config(config: &SheetsConfig) -> SearchResult<Self> {
        if let Some(token) = non_blank(config.access_token.as_deref()) {
            return Ok(Self::AccessToken(token.to_string()));
        }

        if let Some(path) = &config.access_token_file {
            let token = fs::read_to_string(path).map_err(|e| {
                SearchError::config_error(format!(
                    "cannot read access token file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let token = token.trim();
            if token.is_empty() {
                return Err(SearchError::config_error(format!(
                    "access token file {} is empty",
                    path.display()
                )));
            }
            return Ok(Self::AccessToken(token.to_string()));
        }

        if let Some(key) = non_blank(config.api_key.as_deref()) {
            return Ok(Self::ApiKey(key.to_string()));
        }

        Err(SearchError::config_error(
            "missing Sheets credentials: set sheets.api_key, sheets.access_token or sheets.access_token_file",
        ))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Body of a `values.get` response. `values` is absent for an empty sheet.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Reads partitions from one spreadsheet
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    api_base: String,
    spreadsheet_id: String,
    credentials: SheetsCredentials,
    timeout: Duration,
}

impl SheetsClient {
    /// Builds a client from the `sheets` section of the configuration
    pub fn from_config(config: &SheetsConfig) -> SearchResult<Self> {
        let spreadsheet_id = non_blank(config.spreadsheet_id.as_deref())
            .ok_or_else(|| SearchError::config_error("missing sheets.spreadsheet_id"))?;
        let credentials = SheetsCredentials::from_config(config)?;
        Self::new(
            &config.api_base,
            spreadsheet_id,
            credentials,
            config.fetch_timeout,
        )
    }

    pub fn new(
        api_base: &str,
        spreadsheet_id: &str,
        credentials: SheetsCredentials,
        timeout: Duration,
    ) -> SearchResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::config_error(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            credentials,
            timeout,
        })
    }

    /// `{api_base}/v4/spreadsheets/{id}/values/{partition}`, each segment
    /// percent-encoded
    fn values_url(&self, partition: &str) -> SearchResult<Url> {
        let mut url = Url::parse(&self.api_base).map_err(|e| {
            SearchError::config_error(format!("invalid sheets.api_base '{}': {}", self.api_base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SearchError::config_error(format!(
                    "sheets.api_base '{}' cannot carry a path",
                    self.api_base
                ))
            })?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                partition,
            ]);
        Ok(url)
    }
}

impl TableSource for SheetsClient {
    fn fetch_all_rows(&self, partition: &str) -> SearchResult<Vec<Row>> {
        let url = self.values_url(partition)?;
        debug!("Fetching rows of partition '{}'", partition);

        let mut request = self
            .http
            .get(url)
            .query(&[("majorDimension", "ROWS")]);
        request = match &self.credentials {
            SheetsCredentials::ApiKey(key) => request.query(&[("key", key.as_str())]),
            SheetsCredentials::AccessToken(token) => request.bearer_auth(token),
        };

        // without_url: the request URL can carry the API key
        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                SearchError::source_unavailable(format!(
                    "fetching '{}' timed out after {}",
                    partition,
                    humantime::format_duration(self.timeout)
                ))
            } else {
                SearchError::source_unavailable(format!(
                    "fetching '{}' failed: {}",
                    partition,
                    e.without_url()
                ))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().unwrap_or(serde_json::Value::Null);
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("no error message");
            return Err(SearchError::source_unavailable(format!(
                "fetching '{}' returned HTTP {}: {}",
                partition,
                status.as_u16(),
                message
            )));
        }

        let range: ValueRange = response.json().map_err(|e| {
            SearchError::source_unavailable(format!(
                "malformed response for '{}': {}",
                partition,
                e.without_url()
            ))
        })?;

        let rows: Vec<Row> = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        debug!("Partition '{}' has {} rows", partition, rows.len());
        Ok(rows)
    }
}

fn cell_text(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
