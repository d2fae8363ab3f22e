use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a mass-flow run.
///
/// Missing raw values, authorities that only appear in one sub-source and
/// negative "remains in environment" figures are not errors; they are handled
/// inside the estimators.
#[derive(Debug, Error)]
pub enum MassFlowError {
    #[error("source file not found: {}", path.display())]
    MissingSource { path: PathBuf },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed source: missing column(s) {}", .0.join(", "))]
    MalformedSource(Vec<String>),

    #[error("no usable survey rows: {total} read, none kept")]
    NoUsableRows { total: usize },

    #[error("unknown DRS material in reference weights: {0}")]
    UnknownMaterial(String),

    #[error("reference weights are missing a value for {0}")]
    IncompleteReference(String),

    #[error("reference weights list {0} more than once")]
    DuplicateMaterial(String),
}

pub type Result<T> = std::result::Result<T, MassFlowError>;
