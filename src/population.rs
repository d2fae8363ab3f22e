// Population per authority, and the per-capita interpolation used for
// authorities with no commercial return.

use crate::error::{MassFlowError, Result};
use crate::table::AuthorityTable;
use crate::util::{median, normalize_label, parse_f64_safe};
use csv::ReaderBuilder;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PopulationRow {
    #[serde(rename = "Authority")]
    authority: Option<String>,
    #[serde(rename = "Population")]
    population: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationTable {
    by_authority: BTreeMap<String, f64>,
}

impl PopulationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, authority: &str, population: f64) {
        self.by_authority.insert(normalize_label(authority), population);
    }

    pub fn get(&self, authority: &str) -> Option<f64> {
        self.by_authority.get(authority).copied()
    }

    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.by_authority.keys().map(String::as_str)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_authority.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_authority.is_empty()
    }
}

pub fn load_population(path: &Path) -> Result<PopulationTable> {
    if !path.exists() {
        return Err(MassFlowError::MissingSource {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path)?;
    load_population_from_reader(file)
}

/// Rows with a blank or non-positive population are skipped.
pub fn load_population_from_reader<R: Read>(reader: R) -> Result<PopulationTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut table = PopulationTable::new();
    for result in rdr.deserialize::<PopulationRow>() {
        let row = result?;
        let Some(authority) = row.authority.filter(|a| !a.trim().is_empty()) else {
            continue;
        };
        match parse_f64_safe(row.population.as_deref()) {
            Some(p) if p > 0.0 => table.insert(&authority, p),
            _ => warn!("no usable population for {}", authority.trim()),
        }
    }
    Ok(table)
}

/// Fill in authorities that have no figure at all in `columns`.
///
/// Every authority in `table` or `population` is considered. One with at
/// least one populated cell in `columns` is left untouched; one with none
/// gets, for each column, its population times the median of
/// `value / population` over the authorities that reported that column.
/// Authorities without a population, and columns nobody reported, stay
/// absent.
pub fn interpolate_per_capita(
    table: &AuthorityTable,
    population: &PopulationTable,
    columns: &[&str],
) -> AuthorityTable {
    let mut out = table.clone();

    let universe: BTreeSet<&str> = table.authorities().chain(population.authorities()).collect();
    let has_data = |authority: &str| columns.iter().any(|c| table.get(authority, c).is_some());

    let mut per_capita: BTreeMap<&str, f64> = BTreeMap::new();
    for &column in columns {
        let rates: Vec<f64> = table
            .authorities()
            .filter_map(|a| {
                let value = table.get(a, column)?;
                let pop = population.get(a)?;
                Some(value / pop)
            })
            .collect();
        if !rates.is_empty() {
            per_capita.insert(column, median(rates));
        }
    }

    for authority in universe {
        if has_data(authority) {
            continue;
        }
        out.ensure_authority(authority);
        let Some(pop) = population.get(authority) else {
            debug!("{} has no data and no population; left unestimated", authority);
            continue;
        };
        for (column, rate) in &per_capita {
            out.set(authority, column, pop * rate);
        }
        debug!("{} interpolated from population {}", authority, pop);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn population() -> PopulationTable {
        let mut p = PopulationTable::new();
        p.insert("A", 100_000.0);
        p.insert("B", 200_000.0);
        p.insert("C", 300_000.0);
        p.insert("D", 50_000.0);
        p
    }

    #[test]
    fn missing_authority_gets_population_times_median_rate() {
        let mut t = AuthorityTable::new();
        t.set("A", "Mixed glass", 100.0); // 0.001 per head
        t.set("B", "Mixed glass", 400.0); // 0.002
        t.set("C", "Mixed glass", 900.0); // 0.003
        let out = interpolate_per_capita(&t, &population(), &["Mixed glass"]);
        assert_relative_eq!(out.get("D", "Mixed glass").unwrap(), 100.0, epsilon = 1e-9);
        assert_eq!(out.get("A", "Mixed glass"), Some(100.0));
    }

    #[test]
    fn authority_with_some_data_is_not_interpolated() {
        let mut t = AuthorityTable::new();
        t.set("A", "Mixed glass", 100.0);
        t.set("B", "Plastics", 50.0);
        let out = interpolate_per_capita(&t, &population(), &["Mixed glass", "Plastics"]);
        assert_eq!(out.get("B", "Mixed glass"), None);
        assert_eq!(out.get("B", "Plastics"), Some(50.0));
        // C and D had nothing: both columns filled.
        assert_relative_eq!(out.get("C", "Mixed glass").unwrap(), 300.0, epsilon = 1e-9);
        assert_relative_eq!(out.get("D", "Plastics").unwrap(), 12.5, epsilon = 1e-9);
    }

    #[test]
    fn authority_without_population_stays_present_but_empty() {
        let mut t = AuthorityTable::new();
        t.set("A", "Mixed glass", 100.0);
        t.ensure_authority("Z");
        let out = interpolate_per_capita(&t, &population(), &["Mixed glass"]);
        assert!(out.contains("Z"));
        assert_eq!(out.get("Z", "Mixed glass"), None);
    }

    #[test]
    fn loads_population_csv() {
        let csv = "Authority,Population\nCity  and County of Swansea ,\"241,300\"\nPowys County Council,\nCardiff Council,357160\n";
        let p = load_population_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("City and County of Swansea"), Some(241_300.0));
        assert_eq!(p.get("Powys County Council"), None);
    }
}
