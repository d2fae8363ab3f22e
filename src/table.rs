// Per-authority tables: the pivoted survey figures each stream works from,
// and the five-column DRS tables each stream produces.

use crate::types::{DrsRecord, DrsValues, RawRecord};
use std::collections::BTreeMap;

/// Authority -> (column -> tonnage), summed over the reporting year.
///
/// A cell that was never reported is absent, which is not the same as zero:
/// the composition cascade falls back to a coarser figure only for absent
/// cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorityTable {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl AuthorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pivot records so each `RowText` becomes a column and each authority a
    /// row, summing quarters.
    pub fn pivot<'a>(records: impl IntoIterator<Item = &'a RawRecord>) -> Self {
        let mut table = Self::new();
        for r in records {
            table.add(&r.authority, &r.row_text, r.data);
        }
        table
    }

    /// Make sure an authority has a row, even an empty one.
    pub fn ensure_authority(&mut self, authority: &str) {
        self.rows.entry(authority.to_string()).or_default();
    }

    pub fn get(&self, authority: &str, column: &str) -> Option<f64> {
        self.rows.get(authority)?.get(column).copied()
    }

    pub fn set(&mut self, authority: &str, column: &str, value: f64) {
        self.rows
            .entry(authority.to_string())
            .or_default()
            .insert(column.to_string(), value);
    }

    /// Add to a cell, creating it if absent.
    pub fn add(&mut self, authority: &str, column: &str, value: f64) {
        *self
            .rows
            .entry(authority.to_string())
            .or_default()
            .entry(column.to_string())
            .or_insert(0.0) += value;
    }

    #[cfg(test)]
    pub fn contains(&self, authority: &str) -> bool {
        self.rows.contains_key(authority)
    }

    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn columns(&self) -> std::collections::BTreeSet<&str> {
        self.rows
            .values()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect()
    }

    pub fn drop_columns(&mut self, columns: &[&str]) {
        for row in self.rows.values_mut() {
            row.retain(|k, _| !columns.contains(&k.as_str()));
        }
    }

    pub fn keep_columns(&mut self, columns: &[&str]) {
        for row in self.rows.values_mut() {
            row.retain(|k, _| columns.contains(&k.as_str()));
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        for row in self.rows.values_mut() {
            if let Some(v) = row.remove(from) {
                row.insert(to.to_string(), v);
            }
        }
    }

    /// Store the sum of every populated cell of each row under `column`.
    /// A row with nothing populated stays empty.
    pub fn add_row_total(&mut self, column: &str) {
        for row in self.rows.values_mut().filter(|row| !row.is_empty()) {
            let total: f64 = row.values().sum();
            row.insert(column.to_string(), total);
        }
    }

    /// Outer join on authority, summing cells present on either side.
    ///
    /// An authority found on only one side keeps its values (the other side
    /// contributes zero); a cell absent on both sides stays absent.
    pub fn outer_join_sum(mut self, other: &AuthorityTable) -> AuthorityTable {
        for (authority, row) in &other.rows {
            self.ensure_authority(authority);
            for (column, value) in row {
                self.add(authority, column, *value);
            }
        }
        self
    }

    /// Left join a per-authority adjustment onto `column` and add it.
    /// Authorities without an adjustment get zero; adjustments for
    /// authorities not in this table are ignored.
    pub fn add_adjustment(&mut self, column: &str, adjustment: &BTreeMap<String, f64>) {
        for (authority, row) in self.rows.iter_mut() {
            let extra = adjustment.get(authority).copied().unwrap_or(0.0);
            match row.get_mut(column) {
                Some(v) => *v += extra,
                None if extra != 0.0 => {
                    row.insert(column.to_string(), extra);
                }
                None => {}
            }
        }
    }
}

/// Authority -> five DRS tonnages for one stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrsTable {
    rows: BTreeMap<String, DrsValues>,
}

impl DrsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, authority: &str, values: DrsValues) {
        self.rows.insert(authority.to_string(), values);
    }

    pub fn get(&self, authority: &str) -> Option<&DrsValues> {
        self.rows.get(authority)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DrsValues)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Column-wise sum over every authority, in tonnes.
    pub fn column_sums(&self) -> DrsValues {
        let mut sums = DrsValues::default();
        for v in self.rows.values() {
            sums.add_assign(v);
        }
        sums
    }

    /// Element-wise product with a per-material factor.
    pub fn scaled_by(&self, factors: &DrsValues) -> DrsTable {
        let rows = self
            .rows
            .iter()
            .map(|(a, v)| {
                let mut out = *v;
                for (x, f) in out.0.iter_mut().zip(factors.0.iter()) {
                    *x *= *f;
                }
                (a.clone(), out)
            })
            .collect();
        DrsTable { rows }
    }

    pub fn to_records(&self) -> Vec<DrsRecord> {
        self.iter().map(|(a, v)| DrsRecord::new(a, v)).collect()
    }
}
