use crate::results::Match;
use crate::source::Row;

/// Case-insensitive substring matcher over the searchable cell of a row
#[derive(Debug, Clone)]
pub struct RowMatcher {
    keyword: String,
}

impl RowMatcher {
    /// Index of the cell holding the display label
    pub const LABEL_CELL: usize = 0;
    /// Index of the cell the keyword is searched in
    pub const TEXT_CELL: usize = 1;

    /// Creates a matcher for `keyword`; the keyword is lower-cased here so
    /// callers may pass it in any case
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Whether `row` has a label and text cell and its text contains the
    /// keyword
    pub fn is_match(&self, row: &[String]) -> bool {
        if self.keyword.is_empty() {
            return false;
        }
        match row.get(Self::TEXT_CELL) {
            Some(text) if !text.is_empty() => text.to_lowercase().contains(&self.keyword),
            _ => false,
        }
    }

    /// Yields matches in source order, skipping the first `header_rows` rows
    pub fn find_matches<'a>(
        &'a self,
        rows: &'a [Row],
        header_rows: usize,
    ) -> impl Iterator<Item = Match> + 'a {
        rows.iter()
            .enumerate()
            .skip(header_rows)
            .filter(|(_, row)| self.is_match(row))
            .map(|(index, row)| {
                Match::new(
                    index,
                    row[Self::LABEL_CELL].clone(),
                    row[Self::TEXT_CELL].clone(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_case_insensitive_match() {
        let matcher = RowMatcher::new("VIJAY");
        assert!(matcher.is_match(&row(&["SongA", "Vijay Hits"])));
        assert!(matcher.is_match(&row(&["SongB", "best of vijay"])));
        assert!(!matcher.is_match(&row(&["SongC", "Other"])));
    }

    #[test]
    fn test_only_second_cell_is_searched() {
        let matcher = RowMatcher::new("vijay");
        assert!(!matcher.is_match(&row(&["Vijay", "Other", "vijay"])));
    }

    #[test]
    fn test_malformed_rows_never_match() {
        let matcher = RowMatcher::new("a");
        assert!(!matcher.is_match(&row(&[])));
        assert!(!matcher.is_match(&row(&["a"])));
        assert!(!matcher.is_match(&row(&["a", ""])));
        assert!(!RowMatcher::new("").is_match(&row(&["a", "a"])));
    }

    #[test]
    fn test_find_matches_skips_headers_and_keeps_order() {
        let rows = vec![
            row(&["Title", "Artist vijay"]),
            row(&["", ""]),
            row(&["Notes"]),
            row(&["SongB", "Vijay Live"]),
            row(&["SongC", "Other"]),
            row(&["SongA", "vijay hits"]),
        ];

        let matches: Vec<Match> = RowMatcher::new("vijay").find_matches(&rows, 3).collect();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0], Match::new(3, "SongB", "Vijay Live"));
        assert_eq!(matches[1], Match::new(5, "SongA", "vijay hits"));
    }

    #[test]
    fn test_find_matches_with_fewer_rows_than_headers() {
        let rows = vec![row(&["SongA", "vijay"]), row(&["SongB", "vijay"])];
        assert_eq!(RowMatcher::new("vijay").find_matches(&rows, 3).count(), 0);
        assert_eq!(RowMatcher::new("vijay").find_matches(&rows, 0).count(), 2);
    }
}
