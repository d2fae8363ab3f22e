// CSV/JSON export and console previews.
use crate::config::{OutputConfig, PipelineConfig};
use crate::error::Result;
use crate::pipeline::MassFlowRun;
use crate::types::RunSummary;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub const BASELINE_STEM: &str = "massflow_baseline";
pub const SUMMARY_STEM: &str = "massflow_summary";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write one CSV per stream, the baseline CSV and the JSON summary.
/// Returns the paths written, baseline first.
pub fn export_run(
    run: &MassFlowRun,
    summary: &RunSummary,
    pipeline: &PipelineConfig,
    output: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&output.output_dir)?;
    let tag = pipeline.tag();
    let mut written = Vec::new();

    let baseline_path = output.file_path(BASELINE_STEM, &tag, "csv");
    write_csv(&baseline_path, &run.baseline)?;
    written.push(baseline_path);

    for (stream, table) in &run.tables {
        let path = output.file_path(stream.file_stem(), &tag, "csv");
        write_csv(&path, &table.to_records())?;
        written.push(path);
    }

    let summary_path = output.file_path(SUMMARY_STEM, &tag, "json");
    write_json(&summary_path, summary)?;
    written.push(summary_path);

    for p in &written {
        info!("wrote {}", p.display());
    }
    Ok(written)
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::RawDataset;
    use crate::pipeline::MassFlowPipeline;
    use crate::population::PopulationTable;
    use crate::reference::ReferenceWeights;
    use chrono::NaiveDate;

    #[test]
    fn exports_every_stream_with_tagged_names() {
        let raw = RawDataset::default();
        let pop = PopulationTable::new();
        let cfg = PipelineConfig::default();
        let p = MassFlowPipeline::new(&raw, &pop, ReferenceWeights::default(), cfg.clone());
        let run = p.run();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let summary = p.summarize(&run, date);

        let dir = std::env::temp_dir().join(format!("drs_massflow_export_{}", std::process::id()));
        let out = OutputConfig::new(&dir, date);
        let written = export_run(&run, &summary, &cfg, &out).unwrap();

        assert_eq!(written.len(), 9);
        let first = written[0].file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(
            first,
            "massflow_baseline_2026-10-16_reuse-rej-wrap-percapita-totaldry-missing.csv"
        );
        let baseline = std::fs::read_to_string(&written[0]).unwrap();
        assert!(baseline.starts_with("Material,Reference Weight,Household Kerbside Recycling"));
        assert_eq!(baseline.lines().count(), 8);
        assert!(written.iter().all(|p| p.exists()));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
