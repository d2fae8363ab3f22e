// Stream extractors: select one stream's questions from the survey export
// and pivot them into a per-authority table of annual tonnages.

use crate::config::PipelineConfig;
use crate::loader::RawDataset;
use crate::table::AuthorityTable;
use crate::types::Stream;
use std::collections::BTreeMap;

// WasteDataFlow question codes.
pub const Q_KERBSIDE: &str = "Q010";
pub const Q_COMMERCIAL: &str = "Q011";
pub const Q_BRING_SITES: &str = "Q014";
pub const Q_CA_SITES: &str = "Q016";
pub const Q_COLLECTED_WASTE: &str = "Q023";

// Response columns.
pub const COL_RECYCLING: &str = "Tonnage collected for recycling";
pub const COL_REUSE: &str = "Tonnage Collected for Reuse";
pub const COL_REJECTED: &str = "Tonnage collected for recycling but actually rejected/disposed";
pub const COL_TONNAGE: &str = "Tonnage";

// Q023 rows.
pub const ROW_REGULAR_COLLECTION: &str = "Collected household waste : Regular Collection";
pub const ROW_CA_SITES: &str = "Collected household waste : Civic Amenity Sites";
pub const ROW_STREET_CLEANSING: &str = "Collected household waste : Street Cleansing";
pub const ROW_FLY_TIPPING: &str = "Collected household waste : Fly tipping";
pub const ROW_COMMERCIAL: &str = "Collected non household waste : Commercial";

// Recycling material categories.
pub const MIXED_GLASS: &str = "Mixed glass";
pub const MIXED_PLASTIC_BOTTLES: &str = "Mixed Plastic Bottles";
pub const PLASTICS: &str = "Plastics";
pub const HDPE: &str = "HDPE [2]";
pub const STEEL_CANS: &str = "Steel cans";
pub const ALUMINIUM_CANS: &str = "Aluminium cans";
pub const MIXED_CANS: &str = "Mixed cans";
pub const CARTONS: &str = "Composite food and beverage cartons";
pub const CO_MINGLED: &str = "Co mingled materials";

// Columns derived by the extractors.
pub const SUM_DRY_REC: &str = "sum_dry_rec";
pub const SUM_RESIDUAL: &str = "sum_residual";
pub const LITTER: &str = "Litter";

/// Organic categories; they are not dry recycling and never count toward
/// the dry recycling total.
pub const GARDEN_AND_FOOD: [&str; 3] = [
    "Green garden waste only",
    "Mixed garden and food waste",
    "Waste food only",
];

/// Categories kept after the dry recycling total has been formed.
pub const DRS_COLUMNS: [&str; 10] = [
    MIXED_GLASS,
    MIXED_PLASTIC_BOTTLES,
    PLASTICS,
    HDPE,
    STEEL_CANS,
    ALUMINIUM_CANS,
    MIXED_CANS,
    CARTONS,
    CO_MINGLED,
    SUM_DRY_REC,
];

/// Survey questions that feed one recycling stream. Several questions are
/// outer-joined (CA sites and bring sites both feed HWRC recycling).
const KERBSIDE_QUESTIONS: &[&str] = &[Q_KERBSIDE];
const HWRC_QUESTIONS: &[&str] = &[Q_CA_SITES, Q_BRING_SITES];
const COMMERCIAL_QUESTIONS: &[&str] = &[Q_COMMERCIAL];

/// Pivot one question/column combination, optionally restricted to a set of
/// `RowText` categories.
pub fn pivot(raw: &RawDataset, question: &str, col_text: &str, rows: Option<&[&str]>) -> AuthorityTable {
    AuthorityTable::pivot(
        raw.select(question, col_text)
            .filter(|r| rows.map_or(true, |rows| rows.contains(&r.row_text.as_str()))),
    )
}

/// Per-authority total of strictly positive figures for an adjustment
/// column (reuse or rejected tonnage) across the given questions.
pub fn adjustment(raw: &RawDataset, questions: &[&str], col_text: &str) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for q in questions {
        for r in raw.select(q, col_text).filter(|r| r.data > 0.0) {
            *totals.entry(r.authority.clone()).or_insert(0.0) += r.data;
        }
    }
    totals
}

/// Dry recycling table for a recycling stream.
///
/// Sub-questions are outer-joined first so an authority reporting to only
/// one of them is kept. The dry total is formed after garden and food
/// waste are removed and before the other non-DRS categories are dropped.
/// An authority that reported only organics keeps an empty row.
pub fn recycling_table(raw: &RawDataset, questions: &[&str], include_reuse: bool) -> AuthorityTable {
    let mut table = questions
        .iter()
        .map(|q| pivot(raw, q, COL_RECYCLING, None))
        .fold(AuthorityTable::new(), |acc, t| acc.outer_join_sum(&t));

    table.drop_columns(&GARDEN_AND_FOOD);
    table.add_row_total(SUM_DRY_REC);
    table.keep_columns(&DRS_COLUMNS);

    if include_reuse {
        table.add_adjustment(SUM_DRY_REC, &adjustment(raw, questions, COL_REUSE));
    }
    table
}

/// Residual tonnage for one Q023 row, stored as `sum_residual`, with
/// rejected recycling from `reject_questions` folded in when asked.
pub fn residual_table(
    raw: &RawDataset,
    row_text: &str,
    reject_questions: &[&str],
    include_reject: bool,
) -> AuthorityTable {
    let mut table = pivot(raw, Q_COLLECTED_WASTE, COL_TONNAGE, Some(&[row_text][..]));
    table.rename_column(row_text, SUM_RESIDUAL);
    if include_reject {
        table.add_adjustment(SUM_RESIDUAL, &adjustment(raw, reject_questions, COL_REJECTED));
    }
    table
}

/// Litter tonnage: half of street cleansing (the rest is mechanical sweeping
/// residue) less fly-tipping clearance.
///
/// An authority without a street cleansing figure has no litter figure;
/// a missing fly-tipping figure counts as zero.
pub fn litter_table(raw: &RawDataset) -> AuthorityTable {
    let source = pivot(
        raw,
        Q_COLLECTED_WASTE,
        COL_TONNAGE,
        Some(&[ROW_STREET_CLEANSING, ROW_FLY_TIPPING][..]),
    );
    let mut table = AuthorityTable::new();
    for authority in source.authorities() {
        table.ensure_authority(authority);
        if let Some(street) = source.get(authority, ROW_STREET_CLEANSING) {
            let fly_tipping = source.get(authority, ROW_FLY_TIPPING).unwrap_or(0.0);
            table.set(authority, LITTER, street / 2.0 - fly_tipping);
        }
    }
    table
}

/// Raw per-authority table for a stream.
pub fn extract(raw: &RawDataset, stream: Stream, config: &PipelineConfig) -> AuthorityTable {
    match stream {
        Stream::HouseholdKerbsideRecycling => {
            recycling_table(raw, KERBSIDE_QUESTIONS, config.include_reuse)
        }
        Stream::HwrcRecycling => recycling_table(raw, HWRC_QUESTIONS, config.include_reuse),
        Stream::CommercialRecycling => {
            recycling_table(raw, COMMERCIAL_QUESTIONS, config.include_reuse)
        }
        Stream::HouseholdKerbsideResidual => residual_table(
            raw,
            ROW_REGULAR_COLLECTION,
            KERBSIDE_QUESTIONS,
            config.include_reject,
        ),
        Stream::HwrcResidual => {
            residual_table(raw, ROW_CA_SITES, HWRC_QUESTIONS, config.include_reject)
        }
        Stream::CommercialResidual => residual_table(
            raw,
            ROW_COMMERCIAL,
            COMMERCIAL_QUESTIONS,
            config.include_reject,
        ),
        Stream::Litter => litter_table(raw),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::RawRecord;

    pub(crate) fn rec(
        authority: &str,
        period: &str,
        question: &str,
        col_text: &str,
        row_text: &str,
        data: f64,
    ) -> RawRecord {
        RawRecord {
            authority: authority.to_string(),
            period: period.to_string(),
            question_number: question.to_string(),
            col_text: col_text.to_string(),
            row_text: row_text.to_string(),
            data,
        }
    }

    fn kerbside_sample() -> RawDataset {
        RawDataset::from_records(vec![
            rec("A", "Apr 14 - Jun 14", Q_KERBSIDE, COL_RECYCLING, MIXED_GLASS, 40.0),
            rec("A", "Jul 14 - Sep 14", Q_KERBSIDE, COL_RECYCLING, MIXED_GLASS, 60.0),
            rec("A", "Apr 14 - Jun 14", Q_KERBSIDE, COL_RECYCLING, "Paper", 50.0),
            rec("A", "Apr 14 - Jun 14", Q_KERBSIDE, COL_RECYCLING, "Waste food only", 500.0),
            rec("A", "Apr 14 - Jun 14", Q_KERBSIDE, COL_REUSE, "Furniture", 5.0),
            rec("A", "Apr 14 - Jun 14", Q_KERBSIDE, COL_REJECTED, MIXED_GLASS, 3.0),
            rec("A", "Jul 14 - Sep 14", Q_KERBSIDE, COL_REJECTED, MIXED_GLASS, -1.0),
            rec("B", "Apr 14 - Jun 14", Q_KERBSIDE, COL_RECYCLING, CO_MINGLED, 500.0),
            rec("A", "Apr 14 - Jun 14", Q_COLLECTED_WASTE, COL_TONNAGE, ROW_REGULAR_COLLECTION, 1000.0),
            rec("A", "Jul 14 - Sep 14", Q_COLLECTED_WASTE, COL_TONNAGE, ROW_REGULAR_COLLECTION, 1000.0),
            rec("B", "Apr 14 - Jun 14", Q_COLLECTED_WASTE, COL_TONNAGE, ROW_REGULAR_COLLECTION, 800.0),
        ])
    }

    #[test]
    fn kerbside_recycling_forms_dry_total_without_organics() {
        let raw = kerbside_sample();
        let t = recycling_table(&raw, KERBSIDE_QUESTIONS, false);
        assert_eq!(t.get("A", MIXED_GLASS), Some(100.0));
        assert_eq!(t.get("A", SUM_DRY_REC), Some(150.0));
        assert_eq!(t.get("A", "Paper"), None);
        assert_eq!(t.get("A", "Waste food only"), None);
        assert_eq!(t.get("B", SUM_DRY_REC), Some(500.0));
        assert_eq!(t.get("B", MIXED_GLASS), None);
    }

    #[test]
    fn reuse_is_added_to_dry_total_only_when_enabled() {
        let raw = kerbside_sample();
        let with = recycling_table(&raw, KERBSIDE_QUESTIONS, true);
        assert_eq!(with.get("A", SUM_DRY_REC), Some(155.0));
        assert_eq!(with.get("B", SUM_DRY_REC), Some(500.0));
    }

    #[test]
    fn residual_adds_positive_rejects() {
        let raw = kerbside_sample();
        let without = residual_table(&raw, ROW_REGULAR_COLLECTION, KERBSIDE_QUESTIONS, false);
        assert_eq!(without.get("A", SUM_RESIDUAL), Some(2000.0));
        let with = residual_table(&raw, ROW_REGULAR_COLLECTION, KERBSIDE_QUESTIONS, true);
        assert_eq!(with.get("A", SUM_RESIDUAL), Some(2003.0));
        assert_eq!(with.get("B", SUM_RESIDUAL), Some(800.0));
    }

    #[test]
    fn hwrc_keeps_authority_reporting_only_bring_sites() {
        let raw = RawDataset::from_records(vec![
            rec("A", "Apr 14 - Jun 14", Q_CA_SITES, COL_RECYCLING, MIXED_GLASS, 20.0),
            rec("A", "Apr 14 - Jun 14", Q_BRING_SITES, COL_RECYCLING, MIXED_GLASS, 30.0),
            rec("B", "Apr 14 - Jun 14", Q_BRING_SITES, COL_RECYCLING, MIXED_GLASS, 12.0),
            rec("C", "Apr 14 - Jun 14", Q_CA_SITES, COL_RECYCLING, STEEL_CANS, 8.0),
        ]);
        let t = extract(&raw, Stream::HwrcRecycling, &PipelineConfig::default());
        assert_eq!(t.len(), 3);
        assert_eq!(t.get("A", MIXED_GLASS), Some(50.0));
        assert_eq!(t.get("B", MIXED_GLASS), Some(12.0));
        assert_eq!(t.get("B", SUM_DRY_REC), Some(12.0));
        assert_eq!(t.get("C", MIXED_GLASS), None);
        assert_eq!(t.get("C", SUM_DRY_REC), Some(8.0));
    }

    fn hwrc_sample() -> RawDataset {
        let p = "Apr 14 - Jun 14";
        RawDataset::from_records(vec![
            rec("A", p, Q_CA_SITES, COL_RECYCLING, MIXED_GLASS, 20.0),
            rec("A", p, Q_BRING_SITES, COL_RECYCLING, STEEL_CANS, 10.0),
            rec("A", p, Q_CA_SITES, COL_REUSE, "Furniture", 4.0),
            rec("A", p, Q_BRING_SITES, COL_REUSE, "Textiles", 6.0),
            rec("A", p, Q_CA_SITES, COL_REJECTED, MIXED_GLASS, 2.0),
            rec("A", p, Q_BRING_SITES, COL_REJECTED, STEEL_CANS, 3.0),
            rec("A", p, Q_BRING_SITES, COL_REJECTED, MIXED_GLASS, -5.0),
            rec("B", p, Q_BRING_SITES, COL_REJECTED, MIXED_GLASS, 7.0),
            rec("A", p, Q_COLLECTED_WASTE, COL_TONNAGE, ROW_CA_SITES, 900.0),
            rec("B", p, Q_COLLECTED_WASTE, COL_TONNAGE, ROW_CA_SITES, 400.0),
            rec("A", p, Q_KERBSIDE, COL_REJECTED, MIXED_GLASS, 50.0),
        ])
    }

    #[test]
    fn hwrc_reuse_spans_ca_and_bring_sites() {
        let raw = hwrc_sample();
        let with = extract(&raw, Stream::HwrcRecycling, &PipelineConfig::default());
        assert_eq!(with.get("A", SUM_DRY_REC), Some(40.0));
        let cfg = PipelineConfig {
            include_reuse: false,
            ..PipelineConfig::default()
        };
        let without = extract(&raw, Stream::HwrcRecycling, &cfg);
        assert_eq!(without.get("A", SUM_DRY_REC), Some(30.0));
    }

    #[test]
    fn hwrc_residual_adds_rejects_from_both_site_questions() {
        let raw = hwrc_sample();
        let with = extract(&raw, Stream::HwrcResidual, &PipelineConfig::default());
        // 900 + 2 (CA sites) + 3 (bring sites); negatives and kerbside rejects ignored.
        assert_eq!(with.get("A", SUM_RESIDUAL), Some(905.0));
        assert_eq!(with.get("B", SUM_RESIDUAL), Some(407.0));

        let cfg = PipelineConfig {
            include_reject: false,
            ..PipelineConfig::default()
        };
        let without = extract(&raw, Stream::HwrcResidual, &cfg);
        assert_eq!(without.get("A", SUM_RESIDUAL), Some(900.0));
        assert_eq!(without.get("B", SUM_RESIDUAL), Some(400.0));
        assert_eq!(without.len(), 2);
    }

    #[test]
    fn organics_only_return_has_no_dry_total() {
        let raw = RawDataset::from_records(vec![
            rec("A", "Apr 14 - Jun 14", Q_COMMERCIAL, COL_RECYCLING, "Green garden waste only", 80.0),
            rec("B", "Apr 14 - Jun 14", Q_COMMERCIAL, COL_RECYCLING, MIXED_GLASS, 10.0),
        ]);
        let t = extract(&raw, Stream::CommercialRecycling, &PipelineConfig::default());
        assert!(t.contains("A"));
        assert_eq!(t.get("A", SUM_DRY_REC), None);
        assert_eq!(t.get("B", SUM_DRY_REC), Some(10.0));
    }

    #[test]
    fn litter_is_half_street_cleansing_less_fly_tipping() {
        let raw = RawDataset::from_records(vec![
            rec("A", "Apr 14 - Jun 14", Q_COLLECTED_WASTE, COL_TONNAGE, ROW_STREET_CLEANSING, 120.0),
            rec("A", "Jul 14 - Sep 14", Q_COLLECTED_WASTE, COL_TONNAGE, ROW_STREET_CLEANSING, 80.0),
            rec("A", "Apr 14 - Jun 14", Q_COLLECTED_WASTE, COL_TONNAGE, ROW_FLY_TIPPING, 30.0),
            rec("B", "Apr 14 - Jun 14", Q_COLLECTED_WASTE, COL_TONNAGE, ROW_STREET_CLEANSING, 50.0),
            rec("C", "Apr 14 - Jun 14", Q_COLLECTED_WASTE, COL_TONNAGE, ROW_FLY_TIPPING, 9.0),
        ]);
        let t = litter_table(&raw);
        assert_eq!(t.get("A", LITTER), Some(70.0));
        assert_eq!(t.get("B", LITTER), Some(25.0));
        assert!(t.contains("C"));
        assert_eq!(t.get("C", LITTER), None);
    }
}
