//! RecordTable - in-memory registration rows with summary statistics
//!
//! Rows keep insertion order. Every insert and update is validated first,
//! so the table only ever holds submittable records.

use crate::{DataError, FilterSet, LandRecord, RecordId, Result, matches_search};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Figures behind the dashboard's overview cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Number of registered rows
    pub land_owners: usize,
    /// Sum of all known land sizes in acres
    pub registered_land_acres: f64,
    /// Distinct non-empty sublocations
    pub sublocations: usize,
    /// Distinct non-empty locations
    pub locations: usize,
    /// Rows filed through the representative form
    pub representative_groups: usize,
    /// Members across all groups
    pub group_members: usize,
}

/// Owner of all registration rows
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    rows: Vec<LandRecord>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from stored rows, trusting them as already validated
    ///
    /// Rows without an id get one assigned in order.
    pub fn from_rows(rows: Vec<LandRecord>) -> Self {
        let mut table = Self { rows };
        let mut next = table.next_id();
        for row in table.rows.iter_mut().filter(|row| row.id.is_none()) {
            row.id = Some(next);
            next = RecordId(next.0 + 1);
        }
        table
    }

    /// Id for the next inserted row: one past the largest, starting at 1
    fn next_id(&self) -> RecordId {
        let max = self.rows.iter().filter_map(|row| row.id).max();
        RecordId(max.map_or(1, |id| id.0 + 1))
    }

    /// Validate and append a row, assigning an id when it has none
    ///
    /// A row whose id is already taken is rejected; use [`RecordTable::update`].
    pub fn insert(&mut self, mut record: LandRecord) -> Result<RecordId> {
        record.validate()?;

        let id = match record.id {
            Some(id) if self.get(id).is_some() => return Err(DataError::DuplicateRecord(id)),
            Some(id) => id,
            None => self.next_id(),
        };
        record.id = Some(id);

        tracing::debug!("Inserting {} record {}", record.kind_label(), id);
        self.rows.push(record);
        Ok(id)
    }

    /// Validate and replace the row with the same id
    pub fn update(&mut self, record: LandRecord) -> Result<()> {
        let id = record.id.ok_or(DataError::Validation { missing: vec!["id"] })?;
        record.validate()?;

        let slot = self
            .rows
            .iter_mut()
            .find(|row| row.id == Some(id))
            .ok_or(DataError::RecordNotFound(id))?;
        *slot = record;

        tracing::debug!("Updated record {}", id);
        Ok(())
    }

    /// Remove and return a row
    pub fn remove(&mut self, id: RecordId) -> Result<LandRecord> {
        let index = self
            .rows
            .iter()
            .position(|row| row.id == Some(id))
            .ok_or(DataError::RecordNotFound(id))?;
        Ok(self.rows.remove(index))
    }

    pub fn get(&self, id: RecordId) -> Option<&LandRecord> {
        self.rows.iter().find(|row| row.id == Some(id))
    }

    #[inline]
    pub fn rows(&self) -> &[LandRecord] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows passing both the column filters and the search query
    pub fn visible_rows(&self, filters: &FilterSet, query: &str) -> Vec<&LandRecord> {
        self.rows
            .iter()
            .filter(|row| filters.matches(row) && matches_search(row, query))
            .collect()
    }

    /// Overview card figures
    pub fn summary(&self) -> TableSummary {
        let distinct = |field: fn(&LandRecord) -> &str| {
            self.rows
                .iter()
                .map(field)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .collect::<BTreeSet<_>>()
                .len()
        };

        let groups: Vec<&LandRecord> = self
            .rows
            .iter()
            .filter(|row| row.is_representative())
            .collect();

        TableSummary {
            land_owners: self.rows.len(),
            registered_land_acres: self.rows.iter().filter_map(|row| row.land_size_acres).sum(),
            sublocations: distinct(|row| row.sublocation.as_str()),
            locations: distinct(|row| row.location.as_str()),
            representative_groups: groups.len(),
            group_members: groups.iter().map(|row| row.members().len()).sum(),
        }
    }

    /// Registered acres per location, ordered by location name
    ///
    /// Rows with no location are grouped under `"N/A"`.
    pub fn land_by_location(&self) -> Vec<(String, f64)> {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for row in &self.rows {
            let location = match row.location.trim() {
                "" => "N/A",
                location => location,
            };
            *totals.entry(location.to_string()).or_default() += row.land_size_acres.unwrap_or(0.0);
        }
        totals.into_iter().collect()
    }
}
