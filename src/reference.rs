// National reference weights: DRS material placed on the market, estimated
// from sales data independently of the waste survey. Used only as the
// denominator of the baseline.

use crate::error::{MassFlowError, Result};
use crate::types::{DrsMaterial, DrsValues};
use crate::util::parse_f64_safe;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Placed-on-market tonnage in thousand tonnes, in [`DrsMaterial::ALL`]
/// order.
const DEFAULT_WEIGHTS_KT: [f64; 5] = [94.62, 21.35, 3.91, 7.24, 4.83];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceWeights {
    values: DrsValues,
}

impl Default for ReferenceWeights {
    fn default() -> Self {
        Self {
            values: DrsValues(DEFAULT_WEIGHTS_KT),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "Material")]
    material: String,
    #[serde(rename = "Weight")]
    weight: Option<String>,
}

impl ReferenceWeights {
    pub fn new(values: DrsValues) -> Self {
        Self { values }
    }

    pub fn get(&self, material: DrsMaterial) -> f64 {
        self.values[material]
    }

    pub fn total(&self) -> f64 {
        self.values.total()
    }
}

pub fn load_reference(path: &Path) -> Result<ReferenceWeights> {
    if !path.exists() {
        return Err(MassFlowError::MissingSource {
            path: path.to_path_buf(),
        });
    }
    load_reference_from_reader(std::fs::File::open(path)?)
}

/// Read `Material,Weight` rows (thousand tonnes). Every one of the five
/// materials must be present exactly once.
pub fn load_reference_from_reader<R: Read>(reader: R) -> Result<ReferenceWeights> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut values: [Option<f64>; 5] = [None; 5];
    let mut seen = [false; 5];
    for result in rdr.deserialize::<ReferenceRow>() {
        let row = result?;
        let material = DrsMaterial::from_label(&row.material)
            .ok_or_else(|| MassFlowError::UnknownMaterial(row.material.clone()))?;
        if std::mem::replace(&mut seen[material.index()], true) {
            return Err(MassFlowError::DuplicateMaterial(material.label().to_string()));
        }
        values[material.index()] = parse_f64_safe(row.weight.as_deref());
    }
    let mut out = DrsValues::default();
    for m in DrsMaterial::ALL {
        out[m] = values[m.index()]
            .ok_or_else(|| MassFlowError::IncompleteReference(m.label().to_string()))?;
    }
    Ok(ReferenceWeights::new(out))
}
