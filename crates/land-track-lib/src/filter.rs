//! Column filters and free-text search over record rows
//!
//! All matching is a case-insensitive substring test against the cell's
//! display value, so `"50"` matches a land size shown as `"50 acres"`.

use crate::{Column, LandRecord};
use std::collections::BTreeMap;

/// Filter state for one column
///
/// A filter only applies while `visible` is set; its value is kept when the
/// column is hidden so toggling it back restores the previous input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    pub visible: bool,
    pub value: String,
}

/// Filters keyed by column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: BTreeMap<Column, ColumnFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the column's filter with the given value
    pub fn set(&mut self, column: Column, value: impl Into<String>) -> &mut Self {
        self.filters.insert(
            column,
            ColumnFilter {
                visible: true,
                value: value.into(),
            },
        );
        self
    }

    /// Flip the column's visibility, keeping its value
    pub fn toggle(&mut self, column: Column) -> &mut Self {
        let filter = self.filters.entry(column).or_default();
        filter.visible = !filter.visible;
        self
    }

    pub fn get(&self, column: Column) -> Option<&ColumnFilter> {
        self.filters.get(&column)
    }

    /// Clear every filter
    pub fn reset(&mut self) {
        self.filters.clear();
    }

    /// Whether any filter currently restricts rows
    pub fn is_active(&self) -> bool {
        self.filters.values().any(|filter| filter.visible)
    }

    /// Whether a row passes every visible filter
    pub fn matches(&self, record: &LandRecord) -> bool {
        self.filters
            .iter()
            .filter(|(_, filter)| filter.visible)
            .all(|(column, filter)| contains_ignore_case(&record.cell(*column), &filter.value))
    }

    /// Rows passing every visible filter, in order
    pub fn apply<'a>(&self, rows: &'a [LandRecord]) -> Vec<&'a LandRecord> {
        rows.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Whether any column of the row contains the query; an empty query matches
pub fn matches_search(record: &LandRecord, query: &str) -> bool {
    let query = query.trim();
    query.is_empty()
        || Column::ALL
            .into_iter()
            .any(|column| contains_ignore_case(&record.cell(column), query))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordSource;

    fn rows() -> Vec<LandRecord> {
        vec![
            LandRecord {
                community_member: "John Doe".into(),
                land_size_acres: Some(50.0),
                location: "Loc A".into(),
                ..Default::default()
            },
            LandRecord {
                community_member: "Jane Roe".into(),
                land_size_acres: Some(30.0),
                location: "Loc B".into(),
                source: RecordSource::RepresentativeForm {
                    group_name: "River Group".into(),
                    members: Vec::new(),
                },
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_visible_filter_is_case_insensitive() {
        let rows = rows();
        let mut filters = FilterSet::new();
        filters.set(Column::CommunityMember, "JOHN");
        let matched = filters.apply(&rows);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].community_member, "John Doe");
    }

    #[test]
    fn test_hidden_filter_is_ignored() {
        let rows = rows();
        let mut filters = FilterSet::new();
        filters.set(Column::Location, "nowhere").toggle(Column::Location);
        assert!(!filters.is_active());
        assert_eq!(filters.apply(&rows).len(), 2);

        // Toggling back restores the stored value
        filters.toggle(Column::Location);
        assert_eq!(filters.get(Column::Location).unwrap().value, "nowhere");
        assert!(filters.apply(&rows).is_empty());
    }

    #[test]
    fn test_filters_combine() {
        let rows = rows();
        let mut filters = FilterSet::new();
        filters.set(Column::LandSize, "acres").set(Column::Location, "b");
        let matched = filters.apply(&rows);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].community_member, "Jane Roe");

        filters.reset();
        assert_eq!(filters.apply(&rows).len(), 2);
    }

    #[test]
    fn test_search_any_column() {
        let rows = rows();
        assert!(matches_search(&rows[1], "river"));
        assert!(!matches_search(&rows[0], "river"));
        assert!(matches_search(&rows[0], "50 ACRES"));
        assert!(rows.iter().all(|row| matches_search(row, "  ")));
    }
}
