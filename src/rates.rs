// Composition ratios: the share of each survey category that is
// DRS-eligible container material, per stream and per source study.
//
// Each DRS material has a cascade of steps, finest category first. The
// coarsest step of every cascade reads a stream-wide figure (the dry
// recycling total or the stream total).

use crate::config::RatioSource;
use crate::extract::{
    ALUMINIUM_CANS, CARTONS, LITTER, MIXED_CANS, MIXED_GLASS, MIXED_PLASTIC_BOTTLES, PLASTICS,
    STEEL_CANS, SUM_RESIDUAL,
};
use crate::types::{DrsMaterial, DrsValues, Stream};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Where a cascade step reads its tonnage from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// A named column of the stream's authority table.
    Column(&'static str),
    /// The dry recycling denominator selected by
    /// [`DryRecyclingBasis`](crate::config::DryRecyclingBasis).
    DryRecycling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub source: Source,
    pub ratio: f64,
}

const fn col(name: &'static str, ratio: f64) -> Step {
    Step {
        source: Source::Column(name),
        ratio,
    }
}

const fn dry(ratio: f64) -> Step {
    Step {
        source: Source::DryRecycling,
        ratio,
    }
}

pub type Cascade = &'static [Step];

/// Cascades for the five DRS materials of one stream, in
/// [`DrsMaterial::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamRates {
    pub cascades: [Cascade; 5],
}

impl StreamRates {
    pub fn cascade(&self, material: DrsMaterial) -> Cascade {
        self.cascades[material.index()]
    }

    /// Every column the cascades read, with the dry recycling source
    /// resolved to `dry_column`. Order of first use, no repeats.
    pub fn columns(&self, dry_column: &'static str) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for step in self.cascades.iter().flat_map(|c| c.iter()) {
            let name = match step.source {
                Source::Column(c) => c,
                Source::DryRecycling => dry_column,
            };
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

// Mixed cans split 73% steel / 27% aluminium by weight; 18% of steel and
// 80% of aluminium cans are beverage containers.
const FERROUS_SHARE_OF_MIXED_CANS: f64 = 0.73;
const ALUMINIUM_SHARE_OF_MIXED_CANS: f64 = 0.27;
const BEVERAGE_SHARE_OF_STEEL_CANS: f64 = 0.18;
const BEVERAGE_SHARE_OF_ALUMINIUM_CANS: f64 = 0.80;

const MIXED_CANS_FERROUS: f64 = FERROUS_SHARE_OF_MIXED_CANS * BEVERAGE_SHARE_OF_STEEL_CANS;
const MIXED_CANS_ALUMINIUM: f64 = ALUMINIUM_SHARE_OF_MIXED_CANS * BEVERAGE_SHARE_OF_ALUMINIUM_CANS;

// ── Household kerbside recycling ────────────────────────────────────

const KERB_GLASS: Cascade = &[col(MIXED_GLASS, 0.66), dry(0.1599)];
// PET and HDPE make up 96% of mixed plastic bottles; "Plastics" is mostly
// dense plastic.
const KERB_PLASTIC_WRAP: Cascade = &[
    col(MIXED_PLASTIC_BOTTLES, 0.96),
    col(PLASTICS, 0.68),
    dry(0.0669),
];
const KERB_PLASTIC_EUNOMIA: Cascade = &[
    col(MIXED_PLASTIC_BOTTLES, 0.96),
    col(PLASTICS, 0.22),
    dry(0.0669),
];
const KERB_FERROUS: Cascade = &[
    col(MIXED_CANS, MIXED_CANS_FERROUS),
    col(STEEL_CANS, BEVERAGE_SHARE_OF_STEEL_CANS),
    dry(0.0101),
];
const KERB_ALUMINIUM: Cascade = &[
    col(MIXED_CANS, MIXED_CANS_ALUMINIUM),
    col(ALUMINIUM_CANS, BEVERAGE_SHARE_OF_ALUMINIUM_CANS),
    dry(0.01688),
];
const KERB_CARTONS: Cascade = &[col(CARTONS, 1.0), dry(0.0031)];

// ── HWRC recycling ──────────────────────────────────────────────────

const HWRC_GLASS: Cascade = &[col(MIXED_GLASS, 0.82), dry(0.0806)];
const HWRC_PLASTIC_WRAP: Cascade = &[
    col(MIXED_PLASTIC_BOTTLES, 0.96),
    col(PLASTICS, 0.45),
    dry(0.0121),
];
const HWRC_PLASTIC_EUNOMIA: Cascade = &[
    col(MIXED_PLASTIC_BOTTLES, 0.96),
    col(PLASTICS, 0.15),
    dry(0.0121),
];
const HWRC_FERROUS: Cascade = &[
    col(MIXED_CANS, MIXED_CANS_FERROUS),
    col(STEEL_CANS, BEVERAGE_SHARE_OF_STEEL_CANS),
    dry(0.0023),
];
const HWRC_ALUMINIUM: Cascade = &[
    col(MIXED_CANS, MIXED_CANS_ALUMINIUM),
    col(ALUMINIUM_CANS, BEVERAGE_SHARE_OF_ALUMINIUM_CANS),
    dry(0.0019),
];
const HWRC_CARTONS: Cascade = &[col(CARTONS, 1.0), dry(0.0006)];

// ── Commercial recycling ────────────────────────────────────────────

const COMM_GLASS: Cascade = &[col(MIXED_GLASS, 0.75), dry(0.2121)];
const COMM_PLASTIC_WRAP: Cascade = &[
    col(MIXED_PLASTIC_BOTTLES, 0.96),
    col(PLASTICS, 0.50),
    dry(0.0334),
];
const COMM_PLASTIC_EUNOMIA: Cascade = &[
    col(MIXED_PLASTIC_BOTTLES, 0.96),
    col(PLASTICS, 0.20),
    dry(0.0334),
];
const COMM_FERROUS: Cascade = &[
    col(MIXED_CANS, MIXED_CANS_FERROUS),
    col(STEEL_CANS, BEVERAGE_SHARE_OF_STEEL_CANS),
    dry(0.0057),
];
const COMM_ALUMINIUM: Cascade = &[
    col(MIXED_CANS, MIXED_CANS_ALUMINIUM),
    col(ALUMINIUM_CANS, BEVERAGE_SHARE_OF_ALUMINIUM_CANS),
    dry(0.0084),
];
const COMM_CARTONS: Cascade = &[col(CARTONS, 1.0), dry(0.0042)];

// ── Residual streams: one step each on the stream total ─────────────

const KERB_RESIDUAL: [Cascade; 5] = [
    &[col(SUM_RESIDUAL, 0.0204)],
    &[col(SUM_RESIDUAL, 0.0151)],
    &[col(SUM_RESIDUAL, 0.001554)],
    &[col(SUM_RESIDUAL, 0.003255)],
    &[col(SUM_RESIDUAL, 0.0037)],
];

const HWRC_RESIDUAL: [Cascade; 5] = [
    &[col(SUM_RESIDUAL, 0.0081)],
    &[col(SUM_RESIDUAL, 0.0062)],
    &[col(SUM_RESIDUAL, 0.0009)],
    &[col(SUM_RESIDUAL, 0.0011)],
    &[col(SUM_RESIDUAL, 0.0008)],
];

const COMM_RESIDUAL: [Cascade; 5] = [
    &[col(SUM_RESIDUAL, 0.0392)],
    &[col(SUM_RESIDUAL, 0.0224)],
    &[col(SUM_RESIDUAL, 0.0031)],
    &[col(SUM_RESIDUAL, 0.0049)],
    &[col(SUM_RESIDUAL, 0.0046)],
];

const LITTER_RATES: [Cascade; 5] = [
    &[col(LITTER, 0.0688)],
    &[col(LITTER, 0.0622)],
    &[col(LITTER, 0.0055)],
    &[col(LITTER, 0.0124)],
    &[col(LITTER, 0.0051)],
];

/// Commercial recycling as a multiple of commercial residual, per material,
/// for [`CommercialMethod::ResidualRatio`](crate::config::CommercialMethod).
pub const COMMERCIAL_RECYCLING_TO_RESIDUAL: DrsValues = DrsValues([0.90, 0.35, 0.40, 0.40, 0.10]);

/// Cascades for one stream under one source study.
pub fn stream_rates(source: RatioSource, stream: Stream) -> StreamRates {
    use RatioSource::{Eunomia, Wrap};
    let cascades = match (stream, source) {
        (Stream::HouseholdKerbsideRecycling, Wrap) => {
            [KERB_GLASS, KERB_PLASTIC_WRAP, KERB_FERROUS, KERB_ALUMINIUM, KERB_CARTONS]
        }
        (Stream::HouseholdKerbsideRecycling, Eunomia) => {
            [KERB_GLASS, KERB_PLASTIC_EUNOMIA, KERB_FERROUS, KERB_ALUMINIUM, KERB_CARTONS]
        }
        (Stream::HwrcRecycling, Wrap) => {
            [HWRC_GLASS, HWRC_PLASTIC_WRAP, HWRC_FERROUS, HWRC_ALUMINIUM, HWRC_CARTONS]
        }
        (Stream::HwrcRecycling, Eunomia) => {
            [HWRC_GLASS, HWRC_PLASTIC_EUNOMIA, HWRC_FERROUS, HWRC_ALUMINIUM, HWRC_CARTONS]
        }
        (Stream::CommercialRecycling, Wrap) => {
            [COMM_GLASS, COMM_PLASTIC_WRAP, COMM_FERROUS, COMM_ALUMINIUM, COMM_CARTONS]
        }
        (Stream::CommercialRecycling, Eunomia) => {
            [COMM_GLASS, COMM_PLASTIC_EUNOMIA, COMM_FERROUS, COMM_ALUMINIUM, COMM_CARTONS]
        }
        (Stream::HouseholdKerbsideResidual, _) => KERB_RESIDUAL,
        (Stream::HwrcResidual, _) => HWRC_RESIDUAL,
        (Stream::CommercialResidual, _) => COMM_RESIDUAL,
        (Stream::Litter, _) => LITTER_RATES,
    };
    StreamRates { cascades }
}

/// A per-authority exception to a stream's cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverrideRule {
    /// Use `ratio` instead of the table ratio on the step reading `column`
    /// for `material`.
    Ratio {
        material: DrsMaterial,
        column: &'static str,
        ratio: f64,
    },
    /// Treat `column` as unreported, for one material or for every
    /// material when `material` is `None`.
    SkipColumn {
        material: Option<DrsMaterial>,
        column: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthorityOverride {
    pub stream: Stream,
    pub rule: OverrideRule,
}

// Authority names as they are after label normalization.
pub const SWANSEA: &str = "City and County of Swansea";
pub const NEATH_PORT_TALBOT: &str = "Neath Port Talbot CBC";
pub const POWYS: &str = "Powys County Council";

static AUTHORITY_OVERRIDES: Lazy<HashMap<&'static str, Vec<AuthorityOverride>>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, Vec<AuthorityOverride>> = HashMap::new();
    // Swansea's "Plastics" is dense plastic plus film: 6.69 / 11.66. It
    // takes precedence over any mixed plastic bottles figure.
    let swansea = m.entry(SWANSEA).or_default();
    swansea.push(AuthorityOverride {
        stream: Stream::HouseholdKerbsideRecycling,
        rule: OverrideRule::SkipColumn {
            material: Some(DrsMaterial::PlasticBottles),
            column: MIXED_PLASTIC_BOTTLES,
        },
    });
    swansea.push(AuthorityOverride {
        stream: Stream::HouseholdKerbsideRecycling,
        rule: OverrideRule::Ratio {
            material: DrsMaterial::PlasticBottles,
            column: PLASTICS,
            ratio: 0.57,
        },
    });
    // Incomplete mixed cans returns.
    for authority in [NEATH_PORT_TALBOT, POWYS] {
        m.entry(authority).or_default().push(AuthorityOverride {
            stream: Stream::HouseholdKerbsideRecycling,
            rule: OverrideRule::SkipColumn {
                material: None,
                column: MIXED_CANS,
            },
        });
    }
    m
});

/// Overrides that apply to `authority` in `stream`.
pub fn overrides_for(authority: &str, stream: Stream) -> Vec<OverrideRule> {
    AUTHORITY_OVERRIDES
        .get(authority)
        .map(|list| {
            list.iter()
                .filter(|o| o.stream == stream)
                .map(|o| o.rule)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::SUM_DRY_REC;
    use approx::assert_relative_eq;

    #[test]
    fn kerbside_wrap_and_eunomia_differ_only_in_dense_plastics() {
        let wrap = stream_rates(RatioSource::Wrap, Stream::HouseholdKerbsideRecycling);
        let eunomia = stream_rates(RatioSource::Eunomia, Stream::HouseholdKerbsideRecycling);
        for m in DrsMaterial::ALL {
            if m != DrsMaterial::PlasticBottles {
                assert_eq!(wrap.cascade(m), eunomia.cascade(m));
            }
        }
        assert_eq!(wrap.cascade(DrsMaterial::PlasticBottles)[1].ratio, 0.68);
        assert_eq!(eunomia.cascade(DrsMaterial::PlasticBottles)[1].ratio, 0.22);
    }

    #[test]
    fn mixed_cans_split_matches_component_shares() {
        assert_relative_eq!(MIXED_CANS_FERROUS, 0.1314, epsilon = 1e-12);
        assert_relative_eq!(MIXED_CANS_ALUMINIUM, 0.216, epsilon = 1e-12);
    }

    #[test]
    fn every_cascade_ends_on_a_stream_wide_figure() {
        for source in [RatioSource::Wrap, RatioSource::Eunomia] {
            for stream in Stream::ALL {
                let rates = stream_rates(source, stream);
                for m in DrsMaterial::ALL {
                    let last = rates.cascade(m).last().expect("non-empty cascade");
                    let coarse = match last.source {
                        Source::DryRecycling => true,
                        Source::Column(c) => c == SUM_RESIDUAL || c == LITTER,
                    };
                    assert!(coarse, "{:?} {:?} ends on a category column", stream, m);
                    assert!(last.ratio > 0.0 && last.ratio < 1.0);
                }
            }
        }
    }

    #[test]
    fn columns_resolve_dry_source_once() {
        let rates = stream_rates(RatioSource::Wrap, Stream::HouseholdKerbsideRecycling);
        let cols = rates.columns(SUM_DRY_REC);
        assert_eq!(cols[0], MIXED_GLASS);
        assert_eq!(cols[1], SUM_DRY_REC);
        assert_eq!(cols.iter().filter(|c| **c == SUM_DRY_REC).count(), 1);
        assert!(cols.contains(&MIXED_CANS));
        assert!(cols.contains(&CARTONS));
    }

    #[test]
    fn override_table_is_scoped_by_stream() {
        let swansea = overrides_for(SWANSEA, Stream::HouseholdKerbsideRecycling);
        assert_eq!(swansea.len(), 2);
        assert!(overrides_for(SWANSEA, Stream::HwrcRecycling).is_empty());
        assert_eq!(
            overrides_for(POWYS, Stream::HouseholdKerbsideRecycling),
            vec![OverrideRule::SkipColumn {
                material: None,
                column: MIXED_CANS,
            }]
        );
        assert!(overrides_for("Cardiff Council", Stream::HouseholdKerbsideRecycling).is_empty());
    }
}
