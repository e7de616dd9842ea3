//! Brand filtering of the enriched trip table.

use std::collections::BTreeSet;

use carshare_core::error::Result;
use carshare_core::models::{Table, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::columns;

/// Set of brands a user selected. Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrandFilter {
    brands: BTreeSet<String>,
}

impl BrandFilter {
    pub fn new<I, S>(brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            brands: brands.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter that passes every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }

    pub fn contains(&self, brand: &str) -> bool {
        self.brands.contains(brand)
    }

    /// Add `brand` if absent, remove it otherwise. Returns whether it is now
    /// selected.
    pub fn toggle(&mut self, brand: &str) -> bool {
        if self.brands.remove(brand) {
            false
        } else {
            self.brands.insert(brand.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.brands.clear();
    }

    /// Selected brands in sorted order.
    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.brands.iter().map(String::as_str)
    }

    /// Keep rows whose `brand` is one of the selected brands.
    ///
    /// An empty filter returns the table unchanged, even if it has no `brand`
    /// column. Rows with a null brand never match a non-empty filter.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        if self.is_empty() {
            return Ok(table.clone());
        }
        let idx = table.require_column(columns::BRAND)?;
        let filtered = table.filter_rows(|row| match &row[idx] {
            Value::Null => false,
            value => self.brands.contains(&value.to_string()),
        });
        debug!(
            brands = ?self.brands,
            before = table.len(),
            after = filtered.len(),
            "applied brand filter"
        );
        Ok(filtered)
    }
}

/// Distinct non-null brands present in `table`, sorted.
///
/// Returns an empty list when the table has no `brand` column.
pub fn available_brands(table: &Table) -> Vec<String> {
    match table.column(columns::BRAND) {
        Ok(cells) => cells
            .filter_map(Value::group_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        Err(err) => {
            warn!(error = %err, "brand list unavailable");
            Vec::new()
        }
    }
}
