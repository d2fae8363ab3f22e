// National baseline: stream totals in thousand tonnes set against the
// reference weights, with Total and Percent Contribution rows.
use crate::reference::ReferenceWeights;
use crate::table::DrsTable;
use crate::types::{BaselineRow, DrsMaterial, DrsValues, Stream};
use log::warn;

pub const TOTAL_ROW: &str = "Total";
pub const PERCENT_ROW: &str = "Percent Contribution";

/// National total of one stream in thousand tonnes.
pub fn national_total(table: &DrsTable) -> DrsValues {
    table.column_sums().scaled(1.0 / 1000.0)
}

fn empty_row(material: &str) -> BaselineRow {
    BaselineRow {
        material: material.to_string(),
        reference_weight: 0.0,
        hh_kerbside_recycling: 0.0,
        hh_kerbside_residual: 0.0,
        hwrc_recycling: 0.0,
        hwrc_residual: 0.0,
        commercial_recycling: 0.0,
        commercial_residual: 0.0,
        litter: 0.0,
        remains_in_environment: 0.0,
    }
}

/// Assemble the baseline from each stream's national totals (thousand
/// tonnes).
///
/// Material rows carry the reference weight, the seven stream totals and
/// what remains in the environment (reference less every stream, signed).
/// The Total row sums the material rows column by column; the Percent
/// Contribution row expresses each column's total as a share of the
/// reference total. A stream missing from `totals` contributes zero.
pub fn build_baseline(totals: &[(Stream, DrsValues)], reference: &ReferenceWeights) -> Vec<BaselineRow> {
    let mut rows: Vec<BaselineRow> = DrsMaterial::ALL
        .iter()
        .map(|m| {
            let mut row = empty_row(m.label());
            row.reference_weight = reference.get(*m);
            for (stream, values) in totals {
                *row.stream_value_mut(*stream) += values[*m];
            }
            row.remains_in_environment = row.reference_weight - row.streams_sum();
            if row.remains_in_environment < 0.0 {
                warn!(
                    "{}: streams exceed the reference weight by {:.3} kt",
                    m.label(),
                    -row.remains_in_environment
                );
            }
            row
        })
        .collect();

    let mut total = empty_row(TOTAL_ROW);
    for row in &rows {
        total.reference_weight += row.reference_weight;
        for s in Stream::ALL {
            *total.stream_value_mut(s) += row.stream_value(s);
        }
        total.remains_in_environment += row.remains_in_environment;
    }

    let denom = total.reference_weight;
    let pct = |v: f64| if denom.abs() < f64::EPSILON { 0.0 } else { v / denom * 100.0 };
    let mut percent = empty_row(PERCENT_ROW);
    percent.reference_weight = pct(total.reference_weight);
    for s in Stream::ALL {
        *percent.stream_value_mut(s) = pct(total.stream_value(s));
    }
    percent.remains_in_environment = pct(total.remains_in_environment);

    rows.push(total);
    rows.push(percent);
    rows
}
