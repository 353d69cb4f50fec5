use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::dataset_identity;
use crate::types::{ColumnName, LogMessage, RecordKey, SheetName};

/// Pipeline status of an application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStatus {
    /// Still in process.
    Active,
    /// Closed without hire.
    Rejected,
    /// Closed with hire.
    Hired,
}

impl PipelineStatus {
    /// All statuses in display order.
    pub const ALL: [PipelineStatus; 3] = [
        PipelineStatus::Active,
        PipelineStatus::Rejected,
        PipelineStatus::Hired,
    ];

    /// Display label as used in uploads.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStatus::Active => "Active",
            PipelineStatus::Rejected => "Rejected",
            PipelineStatus::Hired => "Hired",
        }
    }

    /// Case-insensitive match on the display label.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
    }
}

/// Internal mobility vs. external hire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CandidateType {
    /// Existing employee.
    Internal,
    /// Outside candidate.
    External,
}

impl CandidateType {
    /// Both candidate types in display order.
    pub const ALL: [CandidateType; 2] = [CandidateType::Internal, CandidateType::External];

    /// Display label.
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateType::Internal => "Internal",
            CandidateType::External => "External",
        }
    }

    /// Case-insensitive match on the display label.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }
}

/// One normalized application/pipeline event, fully joined.
///
/// Every field is either a validated value or `None`; identifiers are never
/// defaulted to an empty string and numerics are always finite.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FactRecord {
    /// Pipeline application id.
    pub application_id: Option<RecordKey>,
    /// Candidate id (join key into candidate, recruiter, interview tables).
    pub candidate_id: Option<RecordKey>,
    /// Requisition id (join key into requisition, cost, posting tables).
    pub requisition_id: Option<RecordKey>,

    /// Application date.
    pub application_date: Option<NaiveDateTime>,
    /// Current pipeline stage label.
    pub current_stage: Option<String>,
    /// Entry into the current stage.
    pub stage_enter_date: Option<NaiveDateTime>,
    /// Exit from the current stage.
    pub stage_exit_date: Option<NaiveDateTime>,
    /// Pipeline status.
    pub status: Option<PipelineStatus>,
    /// CV submission time, hours.
    pub cv_submission_time_hours: Option<f64>,
    /// Recruiter response time, hours.
    pub recruiter_response_time_hours: Option<f64>,

    /// Sourcing channel.
    pub source: Option<String>,
    /// Internal or external candidate.
    pub candidate_type: Option<CandidateType>,
    /// Diversity flag.
    pub diversity_flag: Option<bool>,
    /// Candidate currently employed by a competitor.
    pub is_competitor: Option<bool>,
    /// Application form start.
    pub application_start_time: Option<NaiveDateTime>,
    /// Application form submit.
    pub application_submit_time: Option<NaiveDateTime>,
    /// Application completed flag.
    pub application_completed: Option<bool>,
    /// Ease of applying rating (1-5).
    pub application_ease_rating: Option<f64>,
    /// Candidate NPS.
    pub candidate_nps: Option<f64>,
    /// Skill match percentage (0-100).
    pub skill_match_percentage: Option<f64>,

    /// Role name.
    pub role_name: Option<String>,
    /// Business unit.
    pub business_unit: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Critical skill requisition flag.
    pub critical_skill_flag: Option<bool>,
    /// Requisition open date.
    pub requisition_open_date: Option<NaiveDateTime>,
    /// Requisition close date.
    pub requisition_close_date: Option<NaiveDateTime>,
    /// Budgeted requisition cost.
    pub budgeted_cost: Option<f64>,

    /// Recruiter from the candidate's most recent interaction.
    pub recruiter_id: Option<String>,
    /// Summed matching hours across the candidate's interactions.
    pub matching_hours_total: Option<f64>,

    /// Interview date.
    pub interview_date: Option<NaiveDateTime>,
    /// Hiring manager feedback date.
    pub feedback_date: Option<NaiveDateTime>,
    /// Offer date.
    pub offer_date: Option<NaiveDateTime>,
    /// Offer made flag.
    pub offer_made: Option<bool>,
    /// Offer accepted flag.
    pub offer_accepted: Option<bool>,

    /// Total hiring cost of the requisition.
    pub total_hiring_cost: Option<f64>,
    /// Job posting views of the requisition.
    pub job_views: Option<f64>,
    /// Job posting applications received.
    pub job_applications_received: Option<f64>,
}

impl FactRecord {
    /// Canonical field names, used as the column list of workbook datasets.
    pub const FIELD_NAMES: [&'static str; 37] = [
        "applicationId",
        "candidateId",
        "requisitionId",
        "applicationDate",
        "currentStage",
        "stageEnterDate",
        "stageExitDate",
        "status",
        "cvSubmissionTimeHours",
        "recruiterResponseTimeHours",
        "source",
        "candidateType",
        "diversityFlag",
        "isCompetitor",
        "applicationStartTime",
        "applicationSubmitTime",
        "applicationCompleted",
        "applicationEaseRating",
        "candidateNps",
        "skillMatchPercentage",
        "roleName",
        "businessUnit",
        "location",
        "criticalSkillFlag",
        "requisitionOpenDate",
        "requisitionCloseDate",
        "budgetedCost",
        "recruiterId",
        "matchingHoursTotal",
        "interviewDate",
        "feedbackDate",
        "offerDate",
        "offerMade",
        "offerAccepted",
        "totalHiringCost",
        "jobViews",
        "jobApplicationsReceived",
    ];

    /// Date used for weekly bucketing: application, then stage entry, then interview.
    pub fn activity_date(&self) -> Option<NaiveDateTime> {
        self.application_date
            .or(self.stage_enter_date)
            .or(self.interview_date)
    }

    /// Application id, or a positional fallback key when absent.
    pub fn application_key(&self, index: usize) -> RecordKey {
        match &self.application_id {
            Some(id) => id.clone(),
            None => format!("row:{index}"),
        }
    }
}

/// One typed recruiter interaction, kept for quarter-level interaction splits.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecruiterInteraction {
    /// Candidate the interaction concerns.
    pub candidate_id: RecordKey,
    /// Recruiter who logged it.
    pub recruiter_id: Option<String>,
    /// Interaction type label.
    pub interaction_type: Option<String>,
    /// Interaction date.
    pub interaction_date: Option<NaiveDateTime>,
    /// Matching hours logged.
    pub matching_hours: Option<f64>,
}

/// Upload format that produced a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Multi-sheet workbook.
    Xlsx,
    /// Flat CSV fact table.
    Csv,
}

/// Per-sheet row and column statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SheetStats {
    /// Sheet name.
    pub name: SheetName,
    /// Data rows.
    pub row_count: usize,
    /// Sorted populated columns over the scanned rows.
    pub columns: Vec<ColumnName>,
}

/// Join coverage counters for a workbook upload.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct JoinCoverage {
    /// Pipeline rows (one fact record each).
    pub fact_rows: usize,
    /// Rows joined to a candidate.
    pub with_candidate: usize,
    /// Rows joined to a requisition.
    pub with_requisition: usize,
    /// Rows joined to a hiring cost entry.
    pub with_cost: usize,
    /// Rows joined to posting analytics.
    pub with_posting: usize,
    /// Rows joined to recruiter activity.
    pub with_recruiter_activity: usize,
    /// Rows joined to an interview/offer event.
    pub with_interview_offer: usize,
    /// Distinct candidate ids referenced by pipeline rows.
    pub unique_candidate_ids: usize,
    /// Distinct requisition ids referenced by pipeline rows.
    pub unique_requisition_ids: usize,
    /// Distinct candidate ids that joined.
    pub unique_candidates_joined: usize,
    /// Distinct requisition ids that joined.
    pub unique_requisitions_joined: usize,
    /// Distinct requisition ids with cost.
    pub unique_requisitions_with_cost: usize,
    /// Distinct requisition ids with posting analytics.
    pub unique_requisitions_with_posting: usize,
    /// Distinct candidate ids with recruiter activity.
    pub unique_candidates_with_recruiter_activity: usize,
    /// Distinct candidate ids with interview/offer events.
    pub unique_candidates_with_interview_offer: usize,
    /// Rows without a candidate join (absent or unknown id).
    pub missing_candidate_refs: usize,
    /// Rows without a requisition join (absent or unknown id).
    pub missing_requisition_refs: usize,
}

impl JoinCoverage {
    /// Share of pipeline rows joined to a candidate, in `[0, 1]`.
    pub fn candidate_coverage(&self) -> f64 {
        self.with_candidate as f64 / self.fact_rows.max(1) as f64
    }

    /// Share of pipeline rows joined to a requisition, in `[0, 1]`.
    pub fn requisition_coverage(&self) -> f64 {
        self.with_requisition as f64 / self.fact_rows.max(1) as f64
    }
}

/// Bounded samples of unmatched join keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiagnosticSamples {
    /// Candidate ids referenced by pipeline rows but absent from the candidate sheet.
    pub missing_candidate_ids: Vec<RecordKey>,
    /// Requisition ids referenced by pipeline rows but absent from the requisition sheet.
    pub missing_requisition_ids: Vec<RecordKey>,
}

/// Load diagnostics reported with every dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetDiagnostics {
    /// Upload format.
    pub input: InputKind,
    /// Per-sheet stats, sorted by name (empty for CSV).
    pub sheets: Vec<SheetStats>,
    /// Join counters (workbook uploads only).
    pub joins: Option<JoinCoverage>,
    /// Unmatched key samples.
    pub samples: DiagnosticSamples,
    /// Human-readable warnings.
    pub warnings: Vec<LogMessage>,
}

impl DatasetDiagnostics {
    /// Diagnostics for a flat CSV upload (no joins).
    pub fn for_csv() -> Self {
        Self {
            input: InputKind::Csv,
            sheets: Vec::new(),
            joins: None,
            samples: DiagnosticSamples::default(),
            warnings: Vec::new(),
        }
    }
}

/// One installed upload. Replaced wholesale by the next upload.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// File name of the upload.
    pub name: String,
    /// Load instant.
    pub loaded_at: DateTime<Utc>,
    /// Canonical records in pipeline order.
    pub records: Vec<FactRecord>,
    /// Column list (CSV headers, or canonical field names for workbooks).
    pub columns: Vec<ColumnName>,
    /// Typed recruiter interactions (workbook uploads only).
    pub recruiter_interactions: Vec<RecruiterInteraction>,
    /// Load diagnostics.
    pub diagnostics: DatasetDiagnostics,
    identity: u64,
}

impl Dataset {
    /// Assemble a dataset and derive its identity.
    pub fn new(
        name: impl Into<String>,
        loaded_at: DateTime<Utc>,
        records: Vec<FactRecord>,
        columns: Vec<ColumnName>,
        recruiter_interactions: Vec<RecruiterInteraction>,
        diagnostics: DatasetDiagnostics,
    ) -> Self {
        let name = name.into();
        let identity = dataset_identity(&name, &loaded_at, records.len());
        Self {
            name,
            loaded_at,
            records,
            columns,
            recruiter_interactions,
            diagnostics,
            identity,
        }
    }

    /// Identity used in memoization keys.
    pub fn identity(&self) -> u64 {
        self.identity
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Header label: `Dataset: <name> | Rows: <n> | Filtered: <m>`.
    pub fn label(&self, filtered_rows: usize) -> String {
        format!(
            "Dataset: {} | Rows: {} | Filtered: {}",
            self.name,
            crate::metrics::format::group_thousands(self.records.len() as f64, 0),
            crate::metrics::format::group_thousands(filtered_rows as f64, 0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn status_and_type_parse_case_insensitively() {
        assert_eq!(PipelineStatus::parse("hired"), Some(PipelineStatus::Hired));
        assert_eq!(PipelineStatus::parse("Withdrawn"), None);
        assert_eq!(CandidateType::parse("external"), Some(CandidateType::External));
    }

    #[test]
    fn activity_date_precedence() {
        let mut record = FactRecord {
            interview_date: Some(at(9)),
            ..FactRecord::default()
        };
        assert_eq!(record.activity_date(), Some(at(9)));
        record.stage_enter_date = Some(at(5));
        assert_eq!(record.activity_date(), Some(at(5)));
        record.application_date = Some(at(2));
        assert_eq!(record.activity_date(), Some(at(2)));
    }

    #[test]
    fn application_key_falls_back_to_position() {
        let record = FactRecord::default();
        assert_eq!(record.application_key(7), "row:7");
        let record = FactRecord {
            application_id: Some("A1".into()),
            ..FactRecord::default()
        };
        assert_eq!(record.application_key(7), "A1");
    }

    #[test]
    fn label_groups_thousands() {
        let dataset = Dataset::new(
            "ta.xlsx",
            Utc::now(),
            vec![FactRecord::default(); 1200],
            Vec::new(),
            Vec::new(),
            DatasetDiagnostics::for_csv(),
        );
        assert_eq!(dataset.label(15), "Dataset: ta.xlsx | Rows: 1,200 | Filtered: 15");
    }
}
