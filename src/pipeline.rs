// The mass-flow pipeline: one parameterized run over an immutable survey
// export.
//
// Each estimator call re-derives its tables from the raw records. Nothing
// is cached between calls, so streams cannot drift out of step.

use crate::baseline::{build_baseline, national_total, PERCENT_ROW, TOTAL_ROW};
use crate::config::{CommercialMethod, PipelineConfig};
use crate::estimate::{estimate_drs, CascadeContext};
use crate::extract::extract;
use crate::loader::RawDataset;
use crate::population::{interpolate_per_capita, PopulationTable};
use crate::rates::{stream_rates, COMMERCIAL_RECYCLING_TO_RESIDUAL};
use crate::reference::ReferenceWeights;
use crate::table::{AuthorityTable, DrsTable};
use crate::types::{BaselineRow, RunSummary, Stream, StreamTotal};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeSet;

pub struct MassFlowPipeline<'a> {
    raw: &'a RawDataset,
    population: &'a PopulationTable,
    reference: ReferenceWeights,
    config: PipelineConfig,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct MassFlowRun {
    pub tables: Vec<(Stream, DrsTable)>,
    pub baseline: Vec<BaselineRow>,
}

impl MassFlowRun {
    pub fn table(&self, stream: Stream) -> Option<&DrsTable> {
        self.tables.iter().find(|(s, _)| *s == stream).map(|(_, t)| t)
    }

    pub fn total_row(&self) -> Option<&BaselineRow> {
        self.baseline.iter().find(|r| r.material == TOTAL_ROW)
    }

    pub fn percent_row(&self) -> Option<&BaselineRow> {
        self.baseline.iter().find(|r| r.material == PERCENT_ROW)
    }

    /// Distinct authorities across every stream table.
    pub fn authority_count(&self) -> usize {
        self.tables
            .iter()
            .flat_map(|(_, t)| t.iter().map(|(a, _)| a))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

impl<'a> MassFlowPipeline<'a> {
    pub fn new(
        raw: &'a RawDataset,
        population: &'a PopulationTable,
        reference: ReferenceWeights,
        config: PipelineConfig,
    ) -> Self {
        Self {
            raw,
            population,
            reference,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn cascade_context(&self) -> CascadeContext {
        CascadeContext::new(self.config.fallback_trigger, self.config.dry_recycling_basis)
    }

    /// The per-authority category table a stream's cascades run on.
    ///
    /// Commercial streams have patchy returns; authorities with no commercial
    /// figure at all are filled in per capita.
    pub fn authority_table(&self, stream: Stream) -> AuthorityTable {
        let table = extract(self.raw, stream, &self.config);
        match stream {
            Stream::CommercialRecycling | Stream::CommercialResidual => {
                let ctx = self.cascade_context();
                let rates = stream_rates(self.config.ratio_source, stream);
                let columns = rates.columns(ctx.dry_column);
                let filled = interpolate_per_capita(&table, self.population, &columns);
                debug!(
                    "{}: {} authorities reported, {} after interpolation",
                    stream.label(),
                    table.len(),
                    filled.len()
                );
                filled
            }
            _ => table,
        }
    }

    /// DRS tonnage per authority for one stream, in tonnes.
    pub fn estimate(&self, stream: Stream) -> DrsTable {
        if stream == Stream::CommercialRecycling
            && self.config.commercial_method == CommercialMethod::ResidualRatio
        {
            return self
                .estimate(Stream::CommercialResidual)
                .scaled_by(&COMMERCIAL_RECYCLING_TO_RESIDUAL);
        }
        let table = self.authority_table(stream);
        let rates = stream_rates(self.config.ratio_source, stream);
        estimate_drs(&table, stream, &rates, &self.cascade_context())
    }

    /// Estimate every stream and assemble the national baseline.
    pub fn run(&self) -> MassFlowRun {
        let tables: Vec<(Stream, DrsTable)> = Stream::ALL
            .iter()
            .map(|s| {
                let t = self.estimate(*s);
                info!("{}: {} authorities estimated", s.label(), t.len());
                (*s, t)
            })
            .collect();
        let totals: Vec<_> = tables.iter().map(|(s, t)| (*s, national_total(t))).collect();
        let baseline = build_baseline(&totals, &self.reference);
        MassFlowRun { tables, baseline }
    }

    pub fn summarize(&self, run: &MassFlowRun, generated_on: NaiveDate) -> RunSummary {
        let total = run.total_row();
        let percent = run.percent_row();
        let stream_totals_kt = Stream::ALL
            .iter()
            .map(|s| StreamTotal {
                stream: s.label().to_string(),
                total_kt: total.map(|r| r.stream_value(*s)).unwrap_or(0.0),
                percent_contribution: percent.map(|r| r.stream_value(*s)).unwrap_or(0.0),
            })
            .collect();
        RunSummary {
            generated_on,
            configuration: self.config.tag(),
            authorities: run.authority_count(),
            records_used: self.raw.len(),
            stream_totals_kt,
            reference_total_kt: self.reference.total(),
            remains_in_environment_kt: total.map(|r| r.remains_in_environment).unwrap_or(0.0),
        }
    }
}
