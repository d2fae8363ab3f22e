// Entry point and high-level CLI flow.
//
// One invocation loads the survey export, estimates DRS tonnage for all
// seven streams, exports the per-stream tables and the national baseline,
// and prints Markdown previews of the results.
mod baseline;
mod config;
mod error;
mod estimate;
mod extract;
mod loader;
mod output;
mod pipeline;
mod population;
mod rates;
mod reference;
mod table;
mod types;
mod util;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use config::{
    CommercialMethod, DryRecyclingBasis, FallbackTrigger, OutputConfig, PipelineConfig,
    RatioSource, DEFAULT_EXCLUDED_PERIOD,
};
use loader::RawDataset;
use log::{info, warn};
use pipeline::MassFlowPipeline;
use population::PopulationTable;
use reference::ReferenceWeights;
use std::path::PathBuf;

/// Estimate DRS-eligible container tonnage across local authority waste
/// streams and build the national mass-flow baseline.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Survey export (Authority, Period, QuestionNumber, ColText, RowText, Data)
    #[arg(long, default_value = "data/raw_jan14-sep15.csv")]
    data: PathBuf,

    /// Authority populations (Authority, Population)
    #[arg(long)]
    population: Option<PathBuf>,

    /// Reference weights (Material, Weight in thousand tonnes); built-in
    /// figures are used when omitted
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Directory the CSV and JSON exports are written to
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,

    /// Leave reuse tonnage out of the recycling streams
    #[arg(long)]
    no_reuse: bool,

    /// Leave rejected recycling out of the residual streams
    #[arg(long)]
    no_reject: bool,

    #[arg(long, value_enum, default_value_t = RatioSource::Wrap)]
    ratios: RatioSource,

    #[arg(long, value_enum, default_value_t = CommercialMethod::PerCapita)]
    commercial: CommercialMethod,

    #[arg(long, value_enum, default_value_t = DryRecyclingBasis::TotalDry)]
    dry_basis: DryRecyclingBasis,

    #[arg(long, value_enum, default_value_t = FallbackTrigger::Missing)]
    fallback: FallbackTrigger,

    /// Survey period to drop on load (repeatable)
    #[arg(long = "exclude-period", default_values_t = [DEFAULT_EXCLUDED_PERIOD.to_string()])]
    exclude_periods: Vec<String>,

    /// Date stamped into export file names (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Rows shown per table preview
    #[arg(long, default_value_t = 3)]
    preview_rows: usize,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            include_reuse: !self.no_reuse,
            include_reject: !self.no_reject,
            ratio_source: self.ratios,
            commercial_method: self.commercial,
            dry_recycling_basis: self.dry_basis,
            fallback_trigger: self.fallback,
            excluded_periods: self.exclude_periods.clone(),
        }
    }

    fn output_config(&self) -> OutputConfig {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        OutputConfig::new(&self.output_dir, date)
    }
}

/// Load the survey export and print a short summary of what was kept.
fn handle_load(cli: &Cli, config: &PipelineConfig) -> anyhow::Result<RawDataset> {
    let (data, report) = loader::load_raw(&cli.data, &config.excluded_periods)
        .with_context(|| format!("loading survey export {}", cli.data.display()))?;
    println!(
        "Processing dataset... ({} rows read, {} kept)",
        util::format_int(report.total_rows),
        util::format_int(report.kept_rows)
    );
    if report.excluded_period_rows > 0 {
        println!(
            "Note: {} rows dropped from excluded periods.",
            util::format_int(report.excluded_period_rows)
        );
    }
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse/validation errors.",
            util::format_int(report.parse_errors)
        );
    }
    if report.duplicate_rows > 0 {
        println!(
            "Note: {} duplicate responses ignored.",
            util::format_int(report.duplicate_rows)
        );
    }
    println!();
    Ok(data)
}

fn load_population(cli: &Cli) -> anyhow::Result<PopulationTable> {
    match &cli.population {
        Some(path) => {
            let table = population::load_population(path)
                .with_context(|| format!("loading population table {}", path.display()))?;
            if table.is_empty() {
                warn!("population table {} has no usable rows", path.display());
            }
            Ok(table)
        }
        None => {
            warn!("no population table given; commercial interpolation is disabled");
            Ok(PopulationTable::new())
        }
    }
}

fn load_reference(cli: &Cli) -> anyhow::Result<ReferenceWeights> {
    match &cli.reference {
        Some(path) => reference::load_reference(path)
            .with_context(|| format!("loading reference weights {}", path.display())),
        None => Ok(ReferenceWeights::default()),
    }
}

/// Run every estimator, export the results and print previews.
fn handle_generate(
    cli: &Cli,
    data: &RawDataset,
    population: &PopulationTable,
    reference: ReferenceWeights,
    config: PipelineConfig,
) -> anyhow::Result<()> {
    let out = cli.output_config();
    let pipeline = MassFlowPipeline::new(data, population, reference, config);

    println!("Generating mass-flow baseline ({})...", pipeline.config().tag());
    let run = pipeline.run();
    let summary = pipeline.summarize(&run, out.generated_on);
    let written = output::export_run(&run, &summary, pipeline.config(), &out)
        .context("writing exports")?;
    info!("{} files exported", written.len());

    for (stream, table) in &run.tables {
        output::preview_table(
            stream.label(),
            Some("tonnes per authority"),
            &table.to_records(),
            cli.preview_rows,
        );
    }
    output::preview_table(
        "Mass Flow Baseline",
        Some("thousand tonnes; last row in percent of reference"),
        &run.baseline,
        run.baseline.len(),
    );

    if let Some(first) = written.first() {
        println!("(Full baseline exported to {})", first.display());
    }
    println!(
        "Summary: {} authorities, remains in environment {} kt",
        util::format_int(summary.authorities),
        util::format_number(summary.remains_in_environment_kt, 3)
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.pipeline_config();

    let data = handle_load(&cli, &config)?;
    let population = load_population(&cli)?;
    let reference = load_reference(&cli)?;
    handle_generate(&cli, &data, &population, reference, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "drs_massflow",
            "--no-reuse",
            "--ratios",
            "eunomia",
            "--commercial",
            "residual-ratio",
            "--dry-basis",
            "co-mingled-only",
            "--fallback",
            "zero",
            "--date",
            "2026-10-16",
        ]);
        let cfg = cli.pipeline_config();
        assert!(!cfg.include_reuse);
        assert!(cfg.include_reject);
        assert_eq!(cfg.ratio_source, RatioSource::Eunomia);
        assert_eq!(cfg.commercial_method, CommercialMethod::ResidualRatio);
        assert_eq!(cfg.dry_recycling_basis, DryRecyclingBasis::CoMingledOnly);
        assert_eq!(cfg.fallback_trigger, FallbackTrigger::Zero);
        assert_eq!(cfg.excluded_periods, vec![DEFAULT_EXCLUDED_PERIOD.to_string()]);
        assert_eq!(
            cli.output_config().generated_on,
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
        );
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = Cli::parse_from(["drs_massflow"]);
        assert_eq!(cli.pipeline_config(), PipelineConfig::default());
    }
}
