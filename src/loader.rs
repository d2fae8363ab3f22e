// Survey export loading and cleaning.
//
// The export is read once; every stream works from the same immutable
// `RawDataset`.
use crate::error::{MassFlowError, Result};
use crate::types::{RawRecord, RawRow};
use crate::util::{normalize_label, parse_f64_safe};
use csv::ReaderBuilder;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Columns every survey export must carry; others are ignored.
pub const REQUIRED_COLUMNS: [&str; 6] =
    ["Authority", "Period", "QuestionNumber", "ColText", "RowText", "Data"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub excluded_period_rows: usize,
    pub parse_errors: usize,
    pub duplicate_rows: usize,
}

/// The survey export held in memory. Never mutated after load; every stream
/// extractor reads from the same instance.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    records: Vec<RawRecord>,
}

impl RawDataset {
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    #[cfg(test)]
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records for one question and response column.
    pub fn select<'a>(
        &'a self,
        question: &'a str,
        col_text: &'a str,
    ) -> impl Iterator<Item = &'a RawRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.question_number == question && r.col_text == col_text)
    }

    /// Distinct authorities that appear anywhere in the export.
    #[cfg(test)]
    pub fn authorities(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.authority.as_str()).collect()
    }
}

/// Load the survey export from a CSV file.
///
/// A missing file, a missing required column or an export with no usable
/// row is fatal. Rows whose `Data` cell cannot be parsed are skipped and
/// counted; rows in an excluded period are dropped.
pub fn load_raw(path: &Path, excluded_periods: &[String]) -> Result<(RawDataset, LoadReport)> {
    if !path.exists() {
        return Err(MassFlowError::MissingSource {
            path: path.to_path_buf(),
        });
    }
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    load_raw_from_csv(rdr, excluded_periods)
}

pub fn load_raw_from_reader<R: Read>(
    reader: R,
    excluded_periods: &[String],
) -> Result<(RawDataset, LoadReport)> {
    let rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    load_raw_from_csv(rdr, excluded_periods)
}

fn load_raw_from_csv<R: Read>(
    mut rdr: csv::Reader<R>,
    excluded_periods: &[String],
) -> Result<(RawDataset, LoadReport)> {
    let headers = rdr.headers()?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h.trim() == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(MassFlowError::MalformedSource(missing));
    }

    let excluded: HashSet<String> = excluded_periods.iter().map(|p| normalize_label(p)).collect();
    let mut report = LoadReport::default();
    let mut seen: HashSet<(String, String, String, String, String)> = HashSet::new();
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("skipping unreadable row {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let label = |s: Option<String>| s.as_deref().map(normalize_label).unwrap_or_default();
        let period = label(row.period);
        if excluded.contains(&period) {
            report.excluded_period_rows += 1;
            continue;
        }
        let authority = label(row.authority);
        let question_number = label(row.question_number);
        if authority.is_empty() || question_number.is_empty() {
            report.parse_errors += 1;
            continue;
        }
        let data = match parse_f64_safe(row.data.as_deref()) {
            Some(v) => v,
            None => {
                report.parse_errors += 1;
                continue;
            }
        };
        let col_text = label(row.col_text);
        let row_text = label(row.row_text);

        let key = (
            authority.clone(),
            period.clone(),
            question_number.clone(),
            col_text.clone(),
            row_text.clone(),
        );
        if !seen.insert(key) {
            warn!(
                "duplicate response for {} / {} / {} / {} / {}; keeping the first",
                authority, period, question_number, col_text, row_text
            );
            report.duplicate_rows += 1;
            continue;
        }

        records.push(RawRecord {
            authority,
            period,
            question_number,
            col_text,
            row_text,
            data,
        });
    }

    report.kept_rows = records.len();
    info!(
        "{} of {} survey rows kept ({} excluded period, {} unparseable, {} duplicate)",
        report.kept_rows,
        report.total_rows,
        report.excluded_period_rows,
        report.parse_errors,
        report.duplicate_rows
    );
    if records.is_empty() {
        return Err(MassFlowError::NoUsableRows {
            total: report.total_rows,
        });
    }
    Ok((RawDataset::from_records(records), report))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Authority,Period,QuestionNumber,ColText,RowText,Data,CollateText
City  and County of Swansea ,Jan 14 - Mar 14,Q010,Tonnage collected for recycling,Mixed glass,99,x
City  and County of Swansea ,Apr 14 - Jun 14,Q010,Tonnage collected for recycling,Mixed glass,\"1,200.5\",x
City and County of Swansea,Apr 14 - Jun 14,Q010,Tonnage collected for recycling,Mixed glass,5,x
Powys County Council,Apr 14 - Jun 14,Q010,Tonnage collected for recycling,Mixed cans,n/a,x
Powys County Council,Jul 14 - Sep 14,Q010,Tonnage collected for recycling,Mixed cans,0,x
";

    #[test]
    fn loads_and_cleans_sample() {
        let excluded = vec!["Jan 14 - Mar 14".to_string()];
        let (data, report) = load_raw_from_reader(SAMPLE.as_bytes(), &excluded).unwrap();

        assert_eq!(report.total_rows, 5);
        assert_eq!(report.excluded_period_rows, 1);
        assert_eq!(report.duplicate_rows, 1);
        assert_eq!(report.parse_errors, 1);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(data.len(), 2);

        let first = &data.records()[0];
        assert_eq!(first.authority, "City and County of Swansea");
        assert_eq!(first.data, 1200.5);
        // An explicit zero is a value, not a gap.
        assert_eq!(data.records()[1].data, 0.0);
    }

    #[test]
    fn renamed_headers_are_rejected() {
        let csv = "LA,Quarter,Question,Col,Row,Value\nX,Apr 14 - Jun 14,Q010,Tonnage collected for recycling,Mixed glass,5\n";
        let err = load_raw_from_reader(csv.as_bytes(), &[]).unwrap_err();
        match err {
            MassFlowError::MalformedSource(missing) => {
                assert_eq!(missing.len(), 6);
                assert_eq!(missing[0], "Authority");
            }
            other => panic!("unexpected error: {other}"),
        }

        let partial = "Authority,Period,QuestionNumber,ColText,RowText\nX,P,Q010,C,R\n";
        assert!(matches!(
            load_raw_from_reader(partial.as_bytes(), &[]),
            Err(MassFlowError::MalformedSource(ref m)) if m == &vec!["Data".to_string()]
        ));
    }

    #[test]
    fn export_with_no_usable_rows_is_fatal() {
        let csv = "Authority,Period,QuestionNumber,ColText,RowText,Data\nX,Jan 14 - Mar 14,Q010,C,R,5\nY,Apr 14 - Jun 14,Q010,C,R,n/a\n";
        let excluded = vec!["Jan 14 - Mar 14".to_string()];
        assert!(matches!(
            load_raw_from_reader(csv.as_bytes(), &excluded),
            Err(MassFlowError::NoUsableRows { total: 2 })
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = load_raw(Path::new("does/not/exist.csv"), &[]).unwrap_err();
        assert!(matches!(err, MassFlowError::MissingSource { .. }));
    }

    #[test]
    fn select_filters_question_and_column() {
        let (data, _) = load_raw_from_reader(SAMPLE.as_bytes(), &[]).unwrap();
        assert_eq!(data.select("Q010", "Tonnage collected for recycling").count(), 3);
        assert_eq!(data.select("Q023", "Tonnage collected for recycling").count(), 0);
        assert_eq!(data.authorities().len(), 2);
    }
}
