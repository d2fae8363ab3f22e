// Run configuration.
//
// Every axis along which the baseline methodology varies is an explicit
// field here; nothing is read from process-wide state.

use chrono::NaiveDate;
use clap::ValueEnum;
use std::path::PathBuf;

/// The survey quarter excluded from every run; its returns are malformed in
/// the source export.
pub const DEFAULT_EXCLUDED_PERIOD: &str = "Jan 14 - Mar 14";

/// Which external study the composition ratios come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RatioSource {
    #[default]
    Wrap,
    Eunomia,
}

/// How commercial recycling tonnage is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CommercialMethod {
    /// Authorities with no commercial return get population x median
    /// per-capita tonnage.
    #[default]
    PerCapita,
    /// Commercial recycling DRS tonnage is the commercial residual DRS
    /// tonnage scaled by a fixed recycling/residual ratio per material.
    ResidualRatio,
}

/// Coarsest fallback denominator for recycling streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DryRecyclingBasis {
    /// Sum of every dry recycling category the authority reported.
    #[default]
    TotalDry,
    /// Only the "Co mingled materials" category.
    CoMingledOnly,
}

/// What makes a cascade step fall through to the next, coarser one.
///
/// The two policies give different answers for authorities that report an
/// explicit zero, so callers must pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FallbackTrigger {
    /// Only absent cells fall through; an explicit zero is kept.
    #[default]
    Missing,
    /// Absent cells and explicit zeros both fall through.
    Zero,
}

impl FallbackTrigger {
    /// Returns the value if this step should use it.
    pub fn usable(self, value: Option<f64>) -> Option<f64> {
        match (self, value) {
            (_, None) => None,
            (FallbackTrigger::Zero, Some(v)) if v == 0.0 => None,
            (_, Some(v)) => Some(v),
        }
    }
}

/// Methodology options for one baseline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Add reuse tonnage to the dry recycling total of recycling streams.
    pub include_reuse: bool,
    /// Add rejected/disposed recycling tonnage to residual streams.
    pub include_reject: bool,
    pub ratio_source: RatioSource,
    pub commercial_method: CommercialMethod,
    pub dry_recycling_basis: DryRecyclingBasis,
    pub fallback_trigger: FallbackTrigger,
    /// Survey periods dropped on load.
    pub excluded_periods: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            include_reuse: true,
            include_reject: true,
            ratio_source: RatioSource::Wrap,
            commercial_method: CommercialMethod::PerCapita,
            dry_recycling_basis: DryRecyclingBasis::TotalDry,
            fallback_trigger: FallbackTrigger::Missing,
            excluded_periods: vec![DEFAULT_EXCLUDED_PERIOD.to_string()],
        }
    }
}

impl PipelineConfig {
    /// Short tag naming every option, used in export file names so runs with
    /// different options do not overwrite each other.
    pub fn tag(&self) -> String {
        let reuse = if self.include_reuse { "reuse" } else { "noreuse" };
        let reject = if self.include_reject { "rej" } else { "norej" };
        let source = match self.ratio_source {
            RatioSource::Wrap => "wrap",
            RatioSource::Eunomia => "eunomia",
        };
        let commercial = match self.commercial_method {
            CommercialMethod::PerCapita => "percapita",
            CommercialMethod::ResidualRatio => "resratio",
        };
        let basis = match self.dry_recycling_basis {
            DryRecyclingBasis::TotalDry => "totaldry",
            DryRecyclingBasis::CoMingledOnly => "comingled",
        };
        let trigger = match self.fallback_trigger {
            FallbackTrigger::Missing => "missing",
            FallbackTrigger::Zero => "zero",
        };
        format!("{reuse}-{reject}-{source}-{commercial}-{basis}-{trigger}")
    }
}

/// Where and under which date exports are written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub generated_on: NaiveDate,
}

impl OutputConfig {
    pub fn new(output_dir: impl Into<PathBuf>, generated_on: NaiveDate) -> Self {
        Self {
            output_dir: output_dir.into(),
            generated_on,
        }
    }

    /// `<dir>/<stem>_<YYYY-MM-DD>_<tag>.<ext>`
    pub fn file_path(&self, stem: &str, tag: &str, ext: &str) -> PathBuf {
        let date = self.generated_on.format("%Y-%m-%d");
        self.output_dir.join(format!("{stem}_{date}_{tag}.{ext}"))
    }
}
