use serde::{Deserialize, Serialize};

use crate::errors::{SearchError, SearchResult};

/// A named partition of the table source, selected by the first argument of
/// `/search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    /// Key the user types, e.g. `live`
    pub name: String,
    /// Partition identifier in the table source, e.g. a sheet title
    pub partition: String,
}

impl Mode {
    pub fn new(name: impl Into<String>, partition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition: partition.into(),
        }
    }
}

/// The closed set of modes the bot accepts, in the order they are listed to
/// users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeTable {
    modes: Vec<Mode>,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            modes: vec![
                Mode::new("complete", "Sheet1"),
                Mode::new("date", "Sheet2"),
                Mode::new("live", "Sheet3"),
            ],
        }
    }
}

impl ModeTable {
    pub fn new(modes: Vec<Mode>) -> SearchResult<Self> {
        let table = Self { modes };
        table.validate()?;
        Ok(table)
    }

    /// Looks up a mode by name, ignoring case
    pub fn resolve(&self, name: &str) -> Option<&Mode> {
        let name = name.trim().to_lowercase();
        self.modes
            .iter()
            .find(|mode| mode.name.to_lowercase() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modes.iter().map(|mode| mode.name.as_str())
    }

    /// Mode names separated by `", "`, as shown in help texts
    pub fn joined_names(&self) -> String {
        self.names().collect::<Vec<_>>().join(", ")
    }

    pub fn first(&self) -> Option<&Mode> {
        self.modes.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mode> {
        self.modes.iter()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn validate(&self) -> SearchResult<()> {
        if self.modes.is_empty() {
            return Err(SearchError::config_error("at least one mode is required"));
        }

        for (i, mode) in self.modes.iter().enumerate() {
            if mode.name.trim().is_empty() || mode.name.contains(char::is_whitespace) {
                return Err(SearchError::config_error(format!(
                    "mode name '{}' must be a single non-empty word",
                    mode.name
                )));
            }
            if mode.partition.trim().is_empty() {
                return Err(SearchError::config_error(format!(
                    "mode '{}' has no partition",
                    mode.name
                )));
            }
            if self.modes[..i]
                .iter()
                .any(|other| other.name.to_lowercase() == mode.name.to_lowercase())
            {
                return Err(SearchError::config_error(format!(
                    "mode '{}' is defined more than once",
                    mode.name
                )));
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a ModeTable {
    type Item = &'a Mode;
    type IntoIter = std::slice::Iter<'a, Mode>;

    fn into_iter(self) -> Self::IntoIter {
        self.modes.iter()
    }
}
