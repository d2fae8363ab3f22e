// DRS composition estimation: turn a stream's per-authority category
// tonnages into the five DRS material tonnages.

use crate::config::{DryRecyclingBasis, FallbackTrigger};
use crate::extract::{CO_MINGLED, SUM_DRY_REC};
use crate::rates::{overrides_for, Cascade, OverrideRule, Source, StreamRates};
use crate::table::{AuthorityTable, DrsTable};
use crate::types::{DrsMaterial, DrsValues, Stream};
use log::debug;

/// Settings shared by every cascade walk in one estimator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeContext {
    pub trigger: FallbackTrigger,
    pub dry_column: &'static str,
}

impl CascadeContext {
    pub fn new(trigger: FallbackTrigger, basis: DryRecyclingBasis) -> Self {
        Self {
            trigger,
            dry_column: dry_column(basis),
        }
    }
}

pub fn dry_column(basis: DryRecyclingBasis) -> &'static str {
    match basis {
        DryRecyclingBasis::TotalDry => SUM_DRY_REC,
        DryRecyclingBasis::CoMingledOnly => CO_MINGLED,
    }
}

/// Walk one material's cascade for one authority.
///
/// The first step whose column is usable under the context's trigger
/// policy gives `value * ratio`. A `SkipColumn` override makes its column
/// unusable for the materials it names; a `Ratio` override replaces the ratio of the step reading its
/// column. Returns `None` when no step applies.
pub fn resolve(
    table: &AuthorityTable,
    authority: &str,
    material: DrsMaterial,
    cascade: Cascade,
    overrides: &[OverrideRule],
    ctx: &CascadeContext,
) -> Option<f64> {
    for step in cascade {
        let column = match step.source {
            Source::Column(c) => c,
            Source::DryRecycling => ctx.dry_column,
        };
        let skipped = overrides.iter().any(|o| {
            matches!(
                o,
                OverrideRule::SkipColumn { material: m, column: c }
                    if *c == column && m.map_or(true, |m| m == material)
            )
        });
        if skipped {
            continue;
        }
        let Some(value) = ctx.trigger.usable(table.get(authority, column)) else {
            continue;
        };
        let ratio = overrides
            .iter()
            .find_map(|o| match o {
                OverrideRule::Ratio {
                    material: m,
                    column: c,
                    ratio,
                } if *m == material && *c == column => Some(*ratio),
                _ => None,
            })
            .unwrap_or(step.ratio);
        return Some(value * ratio);
    }
    None
}

/// Apply a stream's cascades to every authority in `table`.
///
/// Every authority appears in the result with all five materials; an
/// exhausted cascade yields an explicit zero.
pub fn estimate_drs(
    table: &AuthorityTable,
    stream: Stream,
    rates: &StreamRates,
    ctx: &CascadeContext,
) -> DrsTable {
    let mut out = DrsTable::new();
    for authority in table.authorities() {
        let overrides = overrides_for(authority, stream);
        let mut values = DrsValues::default();
        for material in DrsMaterial::ALL {
            values[material] = resolve(
                table,
                authority,
                material,
                rates.cascade(material),
                &overrides,
                ctx,
            )
            .unwrap_or_else(|| {
                debug!(
                    "{}: no usable figure for {} in {}; using 0",
                    authority,
                    material.label(),
                    stream.label()
                );
                0.0
            });
        }
        out.insert(authority, values);
    }
    out
}
