//! Pivot of per-prefecture series into one year-indexed table for charting.

use crate::models::SelectedSeries;
use ahash::AHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeSet;

/// One chart row: a year plus a value for every prefecture that has data that year.
///
/// Rows are sparse. A prefecture with no point for the year has no column at all,
/// which is what lets a renderer break its line instead of dropping to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub year: i32,
    /// `(prefecture name, value)` in selection order.
    pub values: Vec<(String, i64)>,
}

impl JoinedRow {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Serializes as a flat object: `{"year": 2015, "北海道": 5381733, ...}`.
impl Serialize for JoinedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("year", &self.year)?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Join the selection into rows ordered by ascending year.
///
/// One row per distinct year across all series; columns follow selection order.
/// Empty input gives no rows. If a series repeats a year, its first point wins.
pub fn join_series(selection: &[SelectedSeries]) -> Vec<JoinedRow> {
    let years: BTreeSet<i32> = selection
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.year))
        .collect();

    let lookups: Vec<AHashMap<i32, i64>> = selection
        .iter()
        .map(|s| {
            let mut by_year = AHashMap::with_capacity(s.points.len());
            for p in &s.points {
                by_year.entry(p.year).or_insert(p.value);
            }
            by_year
        })
        .collect();

    years
        .into_iter()
        .map(|year| JoinedRow {
            year,
            values: selection
                .iter()
                .zip(&lookups)
                .filter_map(|(s, by_year)| by_year.get(&year).map(|v| (s.name.clone(), *v)))
                .collect(),
        })
        .collect()
}

/// Column names of a joined table, in selection order.
pub fn columns(selection: &[SelectedSeries]) -> Vec<String> {
    selection.iter().map(|s| s.name.clone()).collect()
}
