// Core data types: survey rows, DRS materials and streams, and the rows
// written to the exports.
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use tabled::Tabled;

/// One row of the survey export as it appears on disk.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Authority")]
    pub authority: Option<String>,
    #[serde(rename = "Period")]
    pub period: Option<String>,
    #[serde(rename = "QuestionNumber")]
    pub question_number: Option<String>,
    #[serde(rename = "ColText")]
    pub col_text: Option<String>,
    #[serde(rename = "RowText")]
    pub row_text: Option<String>,
    #[serde(rename = "Data")]
    pub data: Option<String>,
}

/// A cleaned survey response: one tonnage (or population) figure for one
/// authority, quarter, question and category.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub authority: String,
    pub period: String,
    pub question_number: String,
    pub col_text: String,
    pub row_text: String,
    pub data: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrsMaterial {
    GlassBottles,
    PlasticBottles,
    FerrousCans,
    AluminiumCans,
    BeverageCartons,
}

impl DrsMaterial {
    pub const ALL: [DrsMaterial; 5] = [
        DrsMaterial::GlassBottles,
        DrsMaterial::PlasticBottles,
        DrsMaterial::FerrousCans,
        DrsMaterial::AluminiumCans,
        DrsMaterial::BeverageCartons,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            DrsMaterial::GlassBottles => "DRS Glass Bottles",
            DrsMaterial::PlasticBottles => "DRS Plastic Bottles",
            DrsMaterial::FerrousCans => "DRS Ferrous Cans",
            DrsMaterial::AluminiumCans => "DRS Aluminium Cans",
            DrsMaterial::BeverageCartons => "DRS Beverage Cartons",
        }
    }

    /// Accepts either the exported column label or the bare material name.
    pub fn from_label(s: &str) -> Option<DrsMaterial> {
        let s = s.trim();
        let bare = s.strip_prefix("DRS ").unwrap_or(s);
        DrsMaterial::ALL
            .into_iter()
            .find(|m| m.label().trim_start_matches("DRS ").eq_ignore_ascii_case(bare))
    }
}

/// The seven waste and recycling channels tracked by the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stream {
    HouseholdKerbsideRecycling,
    HouseholdKerbsideResidual,
    HwrcRecycling,
    HwrcResidual,
    CommercialRecycling,
    CommercialResidual,
    Litter,
}

impl Stream {
    pub const ALL: [Stream; 7] = [
        Stream::HouseholdKerbsideRecycling,
        Stream::HouseholdKerbsideResidual,
        Stream::HwrcRecycling,
        Stream::HwrcResidual,
        Stream::CommercialRecycling,
        Stream::CommercialResidual,
        Stream::Litter,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stream::HouseholdKerbsideRecycling => "Household Kerbside Recycling",
            Stream::HouseholdKerbsideResidual => "Household Kerbside Residual",
            Stream::HwrcRecycling => "HWRC Recycling",
            Stream::HwrcResidual => "HWRC Residual",
            Stream::CommercialRecycling => "Commercial Recycling",
            Stream::CommercialResidual => "Commercial Residual",
            Stream::Litter => "Litter",
        }
    }

    /// Stem used for the per-stream export file.
    pub fn file_stem(self) -> &'static str {
        match self {
            Stream::HouseholdKerbsideRecycling => "hhkerb_rec_ton_drs",
            Stream::HouseholdKerbsideResidual => "hhkerb_waste_ton_drs",
            Stream::HwrcRecycling => "hwrc_rec_ton_drs",
            Stream::HwrcResidual => "hwrc_waste_ton_drs",
            Stream::CommercialRecycling => "comm_rec_ton_drs",
            Stream::CommercialResidual => "comm_waste_ton_drs",
            Stream::Litter => "litter_ton_drs",
        }
    }
}

/// Five DRS tonnages, one per [`DrsMaterial`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrsValues(pub [f64; 5]);

impl DrsValues {
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn scaled(&self, factor: f64) -> DrsValues {
        DrsValues(self.0.map(|v| v * factor))
    }

    pub fn add_assign(&mut self, other: &DrsValues) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += *b;
        }
    }
}

impl Index<DrsMaterial> for DrsValues {
    type Output = f64;

    fn index(&self, m: DrsMaterial) -> &f64 {
        &self.0[m.index()]
    }
}

impl IndexMut<DrsMaterial> for DrsValues {
    fn index_mut(&mut self, m: DrsMaterial) -> &mut f64 {
        &mut self.0[m.index()]
    }
}

/// Exported row of a per-stream DRS table.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DrsRecord {
    #[serde(rename = "Authority")]
    #[tabled(rename = "Authority")]
    pub authority: String,
    #[serde(rename = "DRS Glass Bottles")]
    #[tabled(rename = "DRS Glass Bottles", display_with = "display_tonnes")]
    pub glass_bottles: f64,
    #[serde(rename = "DRS Plastic Bottles")]
    #[tabled(rename = "DRS Plastic Bottles", display_with = "display_tonnes")]
    pub plastic_bottles: f64,
    #[serde(rename = "DRS Ferrous Cans")]
    #[tabled(rename = "DRS Ferrous Cans", display_with = "display_tonnes")]
    pub ferrous_cans: f64,
    #[serde(rename = "DRS Aluminium Cans")]
    #[tabled(rename = "DRS Aluminium Cans", display_with = "display_tonnes")]
    pub aluminium_cans: f64,
    #[serde(rename = "DRS Beverage Cartons")]
    #[tabled(rename = "DRS Beverage Cartons", display_with = "display_tonnes")]
    pub beverage_cartons: f64,
}

impl DrsRecord {
    pub fn new(authority: &str, v: &DrsValues) -> Self {
        Self {
            authority: authority.to_string(),
            glass_bottles: v[DrsMaterial::GlassBottles],
            plastic_bottles: v[DrsMaterial::PlasticBottles],
            ferrous_cans: v[DrsMaterial::FerrousCans],
            aluminium_cans: v[DrsMaterial::AluminiumCans],
            beverage_cartons: v[DrsMaterial::BeverageCartons],
        }
    }
}

/// One row of the national baseline, in thousand tonnes (or percent for the
/// contribution row).
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct BaselineRow {
    #[serde(rename = "Material")]
    #[tabled(rename = "Material")]
    pub material: String,
    #[serde(rename = "Reference Weight")]
    #[tabled(rename = "Reference Weight", display_with = "display_kt")]
    pub reference_weight: f64,
    #[serde(rename = "Household Kerbside Recycling")]
    #[tabled(rename = "Household Kerbside Recycling", display_with = "display_kt")]
    pub hh_kerbside_recycling: f64,
    #[serde(rename = "Household Kerbside Residual")]
    #[tabled(rename = "Household Kerbside Residual", display_with = "display_kt")]
    pub hh_kerbside_residual: f64,
    #[serde(rename = "HWRC Recycling")]
    #[tabled(rename = "HWRC Recycling", display_with = "display_kt")]
    pub hwrc_recycling: f64,
    #[serde(rename = "HWRC Residual")]
    #[tabled(rename = "HWRC Residual", display_with = "display_kt")]
    pub hwrc_residual: f64,
    #[serde(rename = "Commercial Recycling")]
    #[tabled(rename = "Commercial Recycling", display_with = "display_kt")]
    pub commercial_recycling: f64,
    #[serde(rename = "Commercial Residual")]
    #[tabled(rename = "Commercial Residual", display_with = "display_kt")]
    pub commercial_residual: f64,
    #[serde(rename = "Litter")]
    #[tabled(rename = "Litter", display_with = "display_kt")]
    pub litter: f64,
    #[serde(rename = "Remains in Environment")]
    #[tabled(rename = "Remains in Environment", display_with = "display_kt")]
    pub remains_in_environment: f64,
}

impl BaselineRow {
    pub fn stream_value(&self, stream: Stream) -> f64 {
        match stream {
            Stream::HouseholdKerbsideRecycling => self.hh_kerbside_recycling,
            Stream::HouseholdKerbsideResidual => self.hh_kerbside_residual,
            Stream::HwrcRecycling => self.hwrc_recycling,
            Stream::HwrcResidual => self.hwrc_residual,
            Stream::CommercialRecycling => self.commercial_recycling,
            Stream::CommercialResidual => self.commercial_residual,
            Stream::Litter => self.litter,
        }
    }

    pub fn stream_value_mut(&mut self, stream: Stream) -> &mut f64 {
        match stream {
            Stream::HouseholdKerbsideRecycling => &mut self.hh_kerbside_recycling,
            Stream::HouseholdKerbsideResidual => &mut self.hh_kerbside_residual,
            Stream::HwrcRecycling => &mut self.hwrc_recycling,
            Stream::HwrcResidual => &mut self.hwrc_residual,
            Stream::CommercialRecycling => &mut self.commercial_recycling,
            Stream::CommercialResidual => &mut self.commercial_residual,
            Stream::Litter => &mut self.litter,
        }
    }

    pub fn streams_sum(&self) -> f64 {
        Stream::ALL.iter().map(|s| self.stream_value(*s)).sum()
    }
}

/// Run summary written next to the CSV exports.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_on: chrono::NaiveDate,
    pub configuration: String,
    pub authorities: usize,
    pub records_used: usize,
    pub stream_totals_kt: Vec<StreamTotal>,
    pub reference_total_kt: f64,
    pub remains_in_environment_kt: f64,
}

#[derive(Debug, Serialize)]
pub struct StreamTotal {
    pub stream: String,
    pub total_kt: f64,
    pub percent_contribution: f64,
}

fn display_tonnes(v: &f64) -> String {
    crate::util::format_number(*v, 2)
}

fn display_kt(v: &f64) -> String {
    crate::util::format_number(*v, 3)
}
