/// Search result types and the reply digest built from them.
///
/// A [`SearchOutput`] only ever holds as many matches as the display cap
/// allows. Matches past the cap are counted but not kept, so the size of a
/// reply does not depend on how many rows matched.
use std::fmt;

/// Separator between a row's label and its searchable text
pub const LABEL_SEPARATOR: &str = " — ";

/// Reply text when nothing matched
pub const NO_RESULTS: &str = "❌ No results found.";

/// Represents a single matching row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Zero-based index of the row in its partition, headers included
    pub row_index: usize,
    /// First cell of the row
    pub label: String,
    /// Second cell of the row, the one the keyword was found in
    pub text: String,
}

impl Match {
    pub fn new(row_index: usize, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            row_index,
            label: label.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.label, LABEL_SEPARATOR, self.text)
    }
}

/// Represents the outcome of one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutput {
    /// Mode the search ran against
    pub mode: String,
    /// Lower-cased keyword
    pub keyword: String,
    /// Matches in source row order, at most `cap` of them
    pub matches: Vec<Match>,
    /// Number of matching rows, including those past the cap
    pub total_matches: usize,
    /// Number of data rows examined (header rows excluded)
    pub rows_scanned: usize,
    cap: usize,
}

impl SearchOutput {
    /// Creates an empty result that keeps at most `cap` matches
    pub fn new(mode: impl Into<String>, keyword: impl Into<String>, cap: usize) -> Self {
        Self {
            mode: mode.into(),
            keyword: keyword.into(),
            matches: Vec::with_capacity(cap.min(16)),
            total_matches: 0,
            rows_scanned: 0,
            cap,
        }
    }

    /// Records a matching row; rows past the cap only bump the count
    pub fn push(&mut self, m: Match) {
        self.total_matches += 1;
        if self.matches.len() < self.cap {
            self.matches.push(m);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.total_matches > self.matches.len()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Formatted `"<label> — <text>"` lines of the kept matches
    pub fn formatted(&self) -> Vec<String> {
        self.matches.iter().map(Match::to_string).collect()
    }

    /// Renders the reply sent back to the requester
    pub fn render(&self) -> String {
        if self.is_empty() {
            return NO_RESULTS.to_string();
        }

        let body = self.formatted().join("\n\n");
        if self.is_truncated() {
            format!(
                "Found {} matches. Here are the top {}:\n\n{}",
                self.total_matches,
                self.matches.len(),
                body
            )
        } else {
            body
        }
    }
}

impl fmt::Display for SearchOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_with(count: usize, cap: usize) -> SearchOutput {
        let mut output = SearchOutput::new("complete", "song", cap);
        for i in 0..count {
            output.push(Match::new(i + 3, format!("Song{}", i), format!("song text {}", i)));
        }
        output
    }

    #[test]
    fn test_match_display() {
        let m = Match::new(3, "SongA", "Vijay Hits");
        assert_eq!(m.to_string(), "SongA — Vijay Hits");
    }

    #[test]
    fn test_empty_output_renders_no_results() {
        let output = SearchOutput::new("live", "nothing", 5);
        assert!(output.is_empty());
        assert_eq!(output.render(), NO_RESULTS);
    }

    #[test]
    fn test_output_within_cap() {
        let output = output_with(2, 5);
        assert!(!output.is_truncated());
        assert_eq!(output.render(), "Song0 — song text 0\n\nSong1 — song text 1");
    }

    #[test]
    fn test_output_exactly_at_cap() {
        let output = output_with(5, 5);
        assert!(!output.is_truncated());
        assert!(!output.render().starts_with("Found"));
        assert_eq!(output.render().matches(LABEL_SEPARATOR).count(), 5);
    }

    #[test]
    fn test_output_over_cap() {
        let output = output_with(12, 5);
        assert_eq!(output.total_matches, 12);
        assert_eq!(output.matches.len(), 5);
        assert!(output.is_truncated());

        let rendered = output.render();
        assert!(rendered.starts_with("Found 12 matches. Here are the top 5:\n\n"));
        assert_eq!(rendered.matches(LABEL_SEPARATOR).count(), 5);
        assert!(rendered.contains("Song4"));
        assert!(!rendered.contains("Song5"));
    }
}
