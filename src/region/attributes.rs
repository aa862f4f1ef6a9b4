use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::error::{Error, Result};
use crate::region::{RegionId, RegionSet};

/// Named numeric columns keyed by region id, e.g. one row per country from
/// an indicator table. Absent cells are missing, never zero.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    columns: BTreeMap<String, AHashMap<RegionId, f64>>,
}

impl AttributeTable {
    pub fn new() -> Self { Self::default() }

    /// Set a single cell, replacing any previous value.
    pub fn insert(&mut self, column: &str, region: RegionId, value: f64) {
        self.columns.entry(column.to_string()).or_default().insert(region, value);
    }

    /// Get the names of all columns.
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    #[inline] pub fn has_column(&self, column: &str) -> bool { self.columns.contains_key(column) }

    /// Get a single cell.
    pub fn get(&self, column: &str, region: &str) -> Option<f64> {
        self.columns.get(column)?.get(region).copied()
    }

    /// Align a column to the order of `regions`.
    pub fn align(&self, column: &str, regions: &RegionSet) -> Result<Vec<Option<f64>>> {
        let values = self.columns.get(column).ok_or_else(|| Error::InvalidParameter {
            name: "column",
            value: column.to_string(),
            reason: "not present in attribute table".to_string(),
        })?;

        Ok(regions.ids().iter().map(|id| values.get(id).copied()).collect())
    }
}
