//! Seven-sheet workbook normalizer.
//!
//! The pipeline sheet is the spine: one record per pipeline row, left-joined
//! to candidate, requisition, cost, and posting indices, plus per-candidate
//! recruiter and interview/offer reductions built before the join.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use tracing::{info, warn};

use super::mapping::FactParts;
use super::row_view::{RawRow, RawTable};
use crate::coerce::{to_datetime, to_number, to_text};
use crate::config::EngineConfig;
use crate::constants::{headers, sheets};
use crate::data::{
    DatasetDiagnostics, DiagnosticSamples, FactRecord, InputKind, JoinCoverage,
    RecruiterInteraction, SheetStats,
};
use crate::errors::CockpitError;
use crate::types::{LogMessage, RecordKey};

/// Output of a workbook join.
#[derive(Clone, Debug)]
pub struct JoinedWorkbook {
    /// One record per pipeline row, in pipeline order.
    pub records: Vec<FactRecord>,
    /// Typed recruiter interactions with a candidate id.
    pub recruiter_interactions: Vec<RecruiterInteraction>,
    /// Sheet stats, join counters, samples, and warnings.
    pub diagnostics: DatasetDiagnostics,
}

/// Recruiter activity reduced to one entry per candidate.
#[derive(Clone, Debug, Default, PartialEq)]
struct RecruiterAggregate {
    recruiter_id: Option<String>,
    matching_hours: f64,
    last_interaction: Option<NaiveDateTime>,
}

/// Sheets resolved to their join roles.
#[derive(Default)]
struct WorkbookSheets<'a> {
    requisition: Option<&'a RawTable>,
    candidate: Option<&'a RawTable>,
    pipeline: Option<&'a RawTable>,
    recruiter_activity: Option<&'a RawTable>,
    interview_offer: Option<&'a RawTable>,
    hiring_cost: Option<&'a RawTable>,
    job_posting: Option<&'a RawTable>,
    parsed: Vec<&'a RawTable>,
    positional: bool,
}

impl<'a> WorkbookSheets<'a> {
    /// Match sheets by expected name; when none match, assign them by position.
    fn resolve(tables: &'a [RawTable]) -> Self {
        let named: Vec<&RawTable> = tables
            .iter()
            .filter(|table| sheets::ALL.contains(&table.name.trim()))
            .collect();
        let mut resolved = WorkbookSheets::default();
        if named.is_empty() {
            resolved.positional = !tables.is_empty();
            resolved.parsed = tables.iter().collect();
            for (slot, table) in tables.iter().take(sheets::ALL.len()).enumerate() {
                resolved.assign(sheets::ALL[slot], table);
            }
        } else {
            for table in named.iter().copied() {
                resolved.assign(table.name.trim(), table);
            }
            resolved.parsed = named;
        }
        resolved
    }

    fn assign(&mut self, role: &str, table: &'a RawTable) {
        let slot = match role {
            sheets::REQUISITION => &mut self.requisition,
            sheets::CANDIDATE => &mut self.candidate,
            sheets::APPLICATION_PIPELINE => &mut self.pipeline,
            sheets::RECRUITER_ACTIVITY => &mut self.recruiter_activity,
            sheets::INTERVIEW_OFFER => &mut self.interview_offer,
            sheets::HIRING_COST => &mut self.hiring_cost,
            sheets::JOB_POSTING_ANALYTICS => &mut self.job_posting,
            _ => return,
        };
        slot.get_or_insert(table);
    }
}

fn rows_of(table: Option<&RawTable>) -> &[RawRow] {
    table.map(|table| table.rows.as_slice()).unwrap_or_default()
}

/// Index rows by the trimmed value of `key_column`; later rows replace earlier ones.
fn index_by<'a>(rows: &'a [RawRow], key_column: &str) -> HashMap<RecordKey, &'a RawRow> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        if let Some(key) = to_text(row.get(key_column)) {
            index.insert(key, row);
        }
    }
    index
}

/// Sum matching hours per candidate and keep the recruiter of the latest interaction.
///
/// Interactions without a date never replace a dated one; equal dates keep the
/// first recruiter seen.
fn aggregate_recruiter_activity(
    rows: &[RawRow],
) -> (IndexMap<RecordKey, RecruiterAggregate>, Vec<RecruiterInteraction>) {
    let mut by_candidate: IndexMap<RecordKey, RecruiterAggregate> = IndexMap::new();
    let mut interactions = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(candidate_id) = to_text(row.get(headers::CANDIDATE_ID)) else {
            continue;
        };
        let recruiter_id = to_text(row.get(headers::RECRUITER_ID));
        let hours = to_number(row.get(headers::TIME_SPENT_MATCHING));
        let interaction_date = to_datetime(row.get(headers::INTERACTION_DATE));

        let entry = by_candidate.entry(candidate_id.clone()).or_default();
        entry.matching_hours += hours.unwrap_or(0.0);
        if let Some(date) = interaction_date
            && entry.last_interaction.is_none_or(|latest| date > latest)
        {
            entry.last_interaction = Some(date);
            entry.recruiter_id = recruiter_id.clone();
        }

        interactions.push(RecruiterInteraction {
            candidate_id,
            recruiter_id,
            interaction_type: to_text(row.get(headers::INTERACTION_TYPE)),
            interaction_date,
            matching_hours: hours,
        });
    }
    (by_candidate, interactions)
}

/// Latest of the interview, offer, and feedback dates on one event row.
fn interview_sort_date(row: &RawRow) -> Option<NaiveDateTime> {
    [
        headers::INTERVIEW_DATE,
        headers::OFFER_DATE,
        headers::FEEDBACK_DATE,
    ]
    .into_iter()
    .filter_map(|column| to_datetime(row.get(column)))
    .max()
}

/// Keep one interview/offer row per candidate: the one with the latest event date.
///
/// Rows with equal latest dates keep the first seen. This tie-break is
/// arbitrary; upstream data carries no sequence number to order such events.
fn latest_interview_by_candidate(rows: &[RawRow]) -> HashMap<RecordKey, &RawRow> {
    let mut selected: HashMap<RecordKey, (&RawRow, Option<NaiveDateTime>)> = HashMap::new();
    for row in rows {
        let Some(candidate_id) = to_text(row.get(headers::CANDIDATE_ID)) else {
            continue;
        };
        let sort_date = interview_sort_date(row);
        match selected.get_mut(&candidate_id) {
            None => {
                selected.insert(candidate_id, (row, sort_date));
            }
            Some(current) => {
                if sort_date > current.1 {
                    *current = (row, sort_date);
                }
            }
        }
    }
    selected
        .into_iter()
        .map(|(candidate_id, (row, _))| (candidate_id, row))
        .collect()
}

#[derive(Default)]
struct JoinCounters {
    coverage: JoinCoverage,
    fact_candidates: HashSet<RecordKey>,
    fact_requisitions: HashSet<RecordKey>,
    joined_candidates: HashSet<RecordKey>,
    joined_requisitions: HashSet<RecordKey>,
    cost_requisitions: HashSet<RecordKey>,
    posting_requisitions: HashSet<RecordKey>,
    recruiter_candidates: HashSet<RecordKey>,
    interview_candidates: HashSet<RecordKey>,
    missing_candidate_ids: Vec<RecordKey>,
    missing_requisition_ids: Vec<RecordKey>,
}

impl JoinCounters {
    fn finish(mut self, fact_rows: usize) -> (JoinCoverage, DiagnosticSamples) {
        let coverage = &mut self.coverage;
        coverage.fact_rows = fact_rows;
        coverage.unique_candidate_ids = self.fact_candidates.len();
        coverage.unique_requisition_ids = self.fact_requisitions.len();
        coverage.unique_candidates_joined = self.joined_candidates.len();
        coverage.unique_requisitions_joined = self.joined_requisitions.len();
        coverage.unique_requisitions_with_cost = self.cost_requisitions.len();
        coverage.unique_requisitions_with_posting = self.posting_requisitions.len();
        coverage.unique_candidates_with_recruiter_activity = self.recruiter_candidates.len();
        coverage.unique_candidates_with_interview_offer = self.interview_candidates.len();
        (
            self.coverage,
            DiagnosticSamples {
                missing_candidate_ids: self.missing_candidate_ids,
                missing_requisition_ids: self.missing_requisition_ids,
            },
        )
    }
}

fn push_sample(samples: &mut Vec<RecordKey>, id: &str, limit: usize) {
    if samples.len() < limit && !samples.iter().any(|existing| existing == id) {
        samples.push(id.to_string());
    }
}

/// Join workbook tables into canonical records plus diagnostics.
///
/// Fails only when the pipeline sheet exceeds `config.max_pipeline_rows`.
pub fn join_workbook(
    tables: &[RawTable],
    config: &EngineConfig,
) -> Result<JoinedWorkbook, CockpitError> {
    let resolved = WorkbookSheets::resolve(tables);
    let pipeline = rows_of(resolved.pipeline);
    if pipeline.len() > config.max_pipeline_rows {
        return Err(CockpitError::RowCeilingExceeded {
            rows: pipeline.len(),
            ceiling: config.max_pipeline_rows,
        });
    }

    let mut sheet_stats: Vec<SheetStats> = resolved
        .parsed
        .iter()
        .map(|table| SheetStats {
            name: table.name.clone(),
            row_count: table.len(),
            columns: table.sampled_columns(config.sheet_column_scan_rows),
        })
        .collect();
    sheet_stats.sort_by(|a, b| a.name.cmp(&b.name));

    let requisitions = index_by(rows_of(resolved.requisition), headers::REQUISITION_ID);
    let candidates = index_by(rows_of(resolved.candidate), headers::CANDIDATE_ID);
    let costs = index_by(rows_of(resolved.hiring_cost), headers::REQUISITION_ID);
    let postings = index_by(rows_of(resolved.job_posting), headers::JOB_ID);
    let (recruiters, recruiter_interactions) =
        aggregate_recruiter_activity(rows_of(resolved.recruiter_activity));
    let interviews = latest_interview_by_candidate(rows_of(resolved.interview_offer));

    let sample_limit = config.missing_id_sample_limit;
    let mut counters = JoinCounters::default();
    let mut records = Vec::with_capacity(pipeline.len());
    for row in pipeline {
        let candidate_id = to_text(row.get(headers::CANDIDATE_ID));
        let requisition_id = to_text(row.get(headers::REQUISITION_ID));
        let candidate = candidate_id.as_ref().and_then(|id| candidates.get(id).copied());
        let requisition = requisition_id
            .as_ref()
            .and_then(|id| requisitions.get(id).copied());
        let cost = requisition_id.as_ref().and_then(|id| costs.get(id).copied());
        let posting = requisition_id.as_ref().and_then(|id| postings.get(id).copied());
        let recruiter = candidate_id.as_ref().and_then(|id| recruiters.get(id));
        let interview = candidate_id.as_ref().and_then(|id| interviews.get(id).copied());

        if let Some(id) = &candidate_id {
            counters.fact_candidates.insert(id.clone());
        }
        if let Some(id) = &requisition_id {
            counters.fact_requisitions.insert(id.clone());
        }

        match (&candidate_id, candidate) {
            (Some(id), Some(_)) => {
                counters.coverage.with_candidate += 1;
                counters.joined_candidates.insert(id.clone());
            }
            (id, _) => {
                counters.coverage.missing_candidate_refs += 1;
                if let Some(id) = id {
                    push_sample(&mut counters.missing_candidate_ids, id, sample_limit);
                }
            }
        }
        match (&requisition_id, requisition) {
            (Some(id), Some(_)) => {
                counters.coverage.with_requisition += 1;
                counters.joined_requisitions.insert(id.clone());
            }
            (id, _) => {
                counters.coverage.missing_requisition_refs += 1;
                if let Some(id) = id {
                    push_sample(&mut counters.missing_requisition_ids, id, sample_limit);
                }
            }
        }
        if let (Some(id), Some(_)) = (&requisition_id, cost) {
            counters.coverage.with_cost += 1;
            counters.cost_requisitions.insert(id.clone());
        }
        if let (Some(id), Some(_)) = (&requisition_id, posting) {
            counters.coverage.with_posting += 1;
            counters.posting_requisitions.insert(id.clone());
        }
        if let (Some(id), Some(_)) = (&candidate_id, recruiter) {
            counters.coverage.with_recruiter_activity += 1;
            counters.recruiter_candidates.insert(id.clone());
        }
        if let (Some(id), Some(_)) = (&candidate_id, interview) {
            counters.coverage.with_interview_offer += 1;
            counters.interview_candidates.insert(id.clone());
        }

        records.push(
            FactParts {
                pipeline: row,
                candidate,
                requisition,
                interview,
                cost,
                posting,
                recruiter_id: recruiter.and_then(|agg| agg.recruiter_id.clone()),
                matching_hours_total: recruiter.map(|agg| agg.matching_hours),
            }
            .build(),
        );
    }

    let (joins, samples) = counters.finish(pipeline.len());
    let warnings = join_warnings(&joins, resolved.positional, config);
    for warning in &warnings {
        warn!("[cockpit:join] {warning}");
    }
    info!(
        "[cockpit:join] joined {} pipeline rows (candidate {:.1}%, requisition {:.1}%)",
        joins.fact_rows,
        joins.candidate_coverage() * 100.0,
        joins.requisition_coverage() * 100.0
    );

    Ok(JoinedWorkbook {
        records,
        recruiter_interactions,
        diagnostics: DatasetDiagnostics {
            input: InputKind::Xlsx,
            sheets: sheet_stats,
            joins: Some(joins),
            samples,
            warnings,
        },
    })
}

fn join_warnings(joins: &JoinCoverage, positional: bool, config: &EngineConfig) -> Vec<LogMessage> {
    let mut warnings = Vec::new();
    if positional {
        warnings.push("No expected sheet names found; sheets were matched by position.".to_string());
    }
    if joins.fact_rows == 0 {
        warnings.push(format!("Sheet {} has 0 rows.", sheets::APPLICATION_PIPELINE));
    }
    let threshold = config.join_coverage_warning_ratio;
    if joins.candidate_coverage() < threshold {
        warnings.push(format!(
            "Candidate join coverage is {:.1}%.",
            joins.candidate_coverage() * 100.0
        ));
    }
    if joins.requisition_coverage() < threshold {
        warnings.push(format!(
            "Requisition join coverage is {:.1}%.",
            joins.requisition_coverage() * 100.0
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::row_view::RawCell;

    fn table(name: &str, rows: Vec<Vec<(&str, &str)>>) -> RawTable {
        let mut table = RawTable::new(name, Vec::new());
        for row in rows {
            table.rows.push(RawRow::from_pairs(
                row.into_iter().map(|(column, value)| (column, RawCell::from(value))),
            ));
        }
        table
    }

    #[test]
    fn recruiter_id_comes_from_latest_interaction() {
        let activity = table(
            sheets::RECRUITER_ACTIVITY,
            vec![
                vec![
                    ("Candidate_ID", "C1"),
                    ("Recruiter_ID", "R-old"),
                    ("Interaction_Date", "2025-01-01"),
                    ("Time_Spent_Matching (hrs)", "2"),
                ],
                vec![
                    ("Candidate_ID", "C1"),
                    ("Recruiter_ID", "R-new"),
                    ("Interaction_Date", "2025-02-01"),
                    ("Time_Spent_Matching (hrs)", "3.5"),
                ],
                vec![
                    ("Candidate_ID", "C1"),
                    ("Recruiter_ID", "R-tie"),
                    ("Interaction_Date", "2025-02-01"),
                ],
                vec![("Candidate_ID", "C1"), ("Recruiter_ID", "R-undated")],
            ],
        );
        let (aggregates, interactions) = aggregate_recruiter_activity(&activity.rows);
        let c1 = &aggregates["C1"];
        assert_eq!(c1.recruiter_id.as_deref(), Some("R-new"));
        assert!((c1.matching_hours - 5.5).abs() < 1e-9);
        assert_eq!(interactions.len(), 4);
    }

    #[test]
    fn interview_reduction_prefers_latest_and_keeps_first_on_tie() {
        let events = table(
            sheets::INTERVIEW_OFFER,
            vec![
                vec![("Candidate_ID", "C1"), ("Interview_Date", "2025-01-05"), ("Offer_Made (Y/N)", "N")],
                vec![("Candidate_ID", "C1"), ("Interview_Date", "2025-01-02"), ("Offer_Date", "2025-01-20"), ("Offer_Made (Y/N)", "Y")],
                vec![("Candidate_ID", "C1"), ("Feedback_Date", "2025-01-20"), ("Offer_Made (Y/N)", "maybe")],
            ],
        );
        let selected = latest_interview_by_candidate(&events.rows);
        assert_eq!(selected["C1"].get("Offer_Made (Y/N)"), &RawCell::from("Y"));
    }

    #[test]
    fn join_counts_absent_ids_as_missing() {
        let tables = vec![
            table(sheets::CANDIDATE, vec![vec![("Candidate_ID", "C1")]]),
            table(
                sheets::APPLICATION_PIPELINE,
                vec![
                    vec![("Application_ID", "A1"), ("Candidate_ID", "C1")],
                    vec![("Application_ID", "A2"), ("Candidate_ID", "C404")],
                    vec![("Application_ID", "A3")],
                ],
            ),
        ];
        let joined = join_workbook(&tables, &EngineConfig::default()).unwrap();
        let joins = joined.diagnostics.joins.unwrap();
        assert_eq!(joins.with_candidate, 1);
        assert_eq!(joins.missing_candidate_refs, 2);
        assert_eq!(joins.with_candidate + joins.missing_candidate_refs, joins.fact_rows);
        assert_eq!(joined.diagnostics.samples.missing_candidate_ids, vec!["C404"]);
        assert_eq!(joins.missing_requisition_refs, 3);
    }

    #[test]
    fn unnamed_sheets_are_matched_by_position() {
        let tables = vec![
            table("Sheet1", vec![vec![("Requisition_ID", "R1"), ("Business_Unit", "Tech")]]),
            table("Sheet2", vec![]),
            table("Sheet3", vec![vec![("Application_ID", "A1"), ("Requisition_ID", "R1")]]),
        ];
        let joined = join_workbook(&tables, &EngineConfig::default()).unwrap();
        assert_eq!(joined.records.len(), 1);
        assert_eq!(joined.records[0].business_unit.as_deref(), Some("Tech"));
        assert!(joined.diagnostics.warnings[0].contains("matched by position"));
    }

    #[test]
    fn pipeline_over_ceiling_is_fatal() {
        let rows = (0..5)
            .map(|_| vec![("Application_ID", "A")])
            .collect::<Vec<_>>();
        let tables = vec![table(sheets::APPLICATION_PIPELINE, rows)];
        let config = EngineConfig {
            max_pipeline_rows: 4,
            ..EngineConfig::default()
        };
        let err = join_workbook(&tables, &config).unwrap_err();
        assert!(matches!(
            err,
            CockpitError::RowCeilingExceeded { rows: 5, ceiling: 4 }
        ));
    }
}
