//! Header aliases and the row-to-record mapping shared by both input formats.

use crate::coerce::{to_candidate_type, to_datetime, to_number, to_status, to_text, to_yes_no};
use crate::constants::headers as h;
use crate::data::FactRecord;

use super::row_view::RawRow;

/// Application id headers, canonical first.
pub const APPLICATION_ID: &[&str] = &[h::APPLICATION_ID, "application_id", "ApplicationId"];
/// Candidate id headers.
pub const CANDIDATE_ID: &[&str] = &[h::CANDIDATE_ID, "candidate_id", "CandidateId"];
/// Requisition id headers.
pub const REQUISITION_ID: &[&str] = &[h::REQUISITION_ID, "requisition_id", "RequisitionId"];
/// Status headers.
pub const STATUS: &[&str] = &[h::STATUS, h::STATUS_LONG];
/// Application date headers.
pub const APPLICATION_DATE: &[&str] = &[h::APPLICATION_DATE, "application_date"];
/// Current stage headers.
pub const CURRENT_STAGE: &[&str] = &[h::CURRENT_STAGE, "current_stage"];
/// Stage entry headers.
pub const STAGE_ENTER_DATE: &[&str] = &[h::STAGE_ENTER_DATE, "stage_enter_date"];
/// Stage exit headers.
pub const STAGE_EXIT_DATE: &[&str] = &[h::STAGE_EXIT_DATE, "stage_exit_date"];
/// Candidate type headers.
pub const CANDIDATE_TYPE: &[&str] = &[h::CANDIDATE_TYPE_LONG, h::CANDIDATE_TYPE];

/// Rows contributing to one fact record.
///
/// For workbook uploads each side row comes from its own sheet; for flat CSV
/// uploads every side is the same row.
pub struct FactParts<'a> {
    /// Pipeline row (the spine).
    pub pipeline: &'a RawRow,
    /// Joined candidate row.
    pub candidate: Option<&'a RawRow>,
    /// Joined requisition row.
    pub requisition: Option<&'a RawRow>,
    /// Selected interview/offer row.
    pub interview: Option<&'a RawRow>,
    /// Joined hiring cost row.
    pub cost: Option<&'a RawRow>,
    /// Joined posting analytics row.
    pub posting: Option<&'a RawRow>,
    /// Recruiter resolved for the candidate.
    pub recruiter_id: Option<String>,
    /// Matching hours resolved for the candidate.
    pub matching_hours_total: Option<f64>,
}

impl<'a> FactParts<'a> {
    /// All sides read from one already-canonical row.
    pub fn flat(row: &'a RawRow) -> Self {
        Self {
            pipeline: row,
            candidate: Some(row),
            requisition: Some(row),
            interview: Some(row),
            cost: Some(row),
            posting: Some(row),
            recruiter_id: to_text(row.get(h::RECRUITER_ID)),
            matching_hours_total: to_number(row.get(h::TIME_SPENT_MATCHING)),
        }
    }

    /// Coerce every field into a canonical record.
    pub fn build(self) -> FactRecord {
        let pipeline = Some(self.pipeline);
        let candidate = self.candidate;
        let requisition = self.requisition;
        let interview = self.interview;
        FactRecord {
            application_id: text(pipeline, APPLICATION_ID),
            candidate_id: text(pipeline, CANDIDATE_ID),
            requisition_id: text(pipeline, REQUISITION_ID),

            application_date: date(pipeline, APPLICATION_DATE),
            current_stage: text(pipeline, CURRENT_STAGE),
            stage_enter_date: date(pipeline, STAGE_ENTER_DATE),
            stage_exit_date: date(pipeline, STAGE_EXIT_DATE),
            status: to_status(self.pipeline.first_present(STATUS)),
            cv_submission_time_hours: number(pipeline, &[h::CV_SUBMISSION_TIME]),
            recruiter_response_time_hours: number(pipeline, &[h::RECRUITER_RESPONSE_TIME]),

            source: text(candidate, &[h::SOURCE]),
            candidate_type: candidate
                .and_then(|row| to_candidate_type(row.first_present(CANDIDATE_TYPE))),
            diversity_flag: flag(candidate, &[h::DIVERSITY_FLAG]),
            is_competitor: flag(candidate, &[h::IS_COMPETITOR]),
            application_start_time: date(candidate, &[h::APPLICATION_START_TIME]),
            application_submit_time: date(candidate, &[h::APPLICATION_SUBMIT_TIME]),
            application_completed: flag(candidate, &[h::APPLICATION_COMPLETED]),
            application_ease_rating: number(candidate, &[h::APPLICATION_EASE_RATING]),
            candidate_nps: number(candidate, &[h::CANDIDATE_NPS]),
            skill_match_percentage: number(candidate, &[h::SKILL_MATCH_PERCENTAGE]),

            role_name: text(requisition, &[h::ROLE_NAME]),
            business_unit: text(requisition, &[h::BUSINESS_UNIT]),
            location: text(requisition, &[h::LOCATION]),
            critical_skill_flag: flag(requisition, &[h::CRITICAL_SKILL_FLAG]),
            requisition_open_date: date(requisition, &[h::OPEN_DATE]),
            requisition_close_date: date(requisition, &[h::CLOSE_DATE]),
            budgeted_cost: number(requisition, &[h::BUDGETED_COST]),

            recruiter_id: self.recruiter_id,
            matching_hours_total: self.matching_hours_total,

            interview_date: date(interview, &[h::INTERVIEW_DATE]),
            feedback_date: date(interview, &[h::FEEDBACK_DATE]),
            offer_date: date(interview, &[h::OFFER_DATE]),
            offer_made: flag(interview, &[h::OFFER_MADE]),
            offer_accepted: flag(interview, &[h::OFFER_ACCEPTED]),

            total_hiring_cost: number(self.cost, &[h::TOTAL_HIRING_COST]),
            job_views: number(self.posting, &[h::JOB_VIEWS]),
            job_applications_received: number(self.posting, &[h::APPLICATIONS_RECEIVED]),
        }
    }
}

fn text(row: Option<&RawRow>, aliases: &[&str]) -> Option<String> {
    row.and_then(|row| to_text(row.first_present(aliases)))
}

fn number(row: Option<&RawRow>, aliases: &[&str]) -> Option<f64> {
    row.and_then(|row| to_number(row.first_present(aliases)))
}

fn flag(row: Option<&RawRow>, aliases: &[&str]) -> Option<bool> {
    row.and_then(|row| to_yes_no(row.first_present(aliases)))
}

fn date(row: Option<&RawRow>, aliases: &[&str]) -> Option<chrono::NaiveDateTime> {
    row.and_then(|row| to_datetime(row.first_present(aliases)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CandidateType, PipelineStatus};
    use crate::source::row_view::RawCell;

    #[test]
    fn flat_row_uses_aliases() {
        let row = RawRow::from_pairs([
            ("application_id", RawCell::from("A1")),
            ("CandidateId", RawCell::from("C1")),
            ("Requisition_ID", RawCell::from("R1")),
            ("Status", RawCell::from("Hired")),
            ("CandidateType", RawCell::from("External")),
            ("Skill_Match_Percentage", RawCell::from("81.5")),
            ("Recruiter_ID", RawCell::from("REC-3")),
            ("Time_Spent_Matching (hrs)", RawCell::from("4")),
            ("Critical_Skill_Flag (Y/N)", RawCell::from("Y")),
        ]);
        let record = FactParts::flat(&row).build();
        assert_eq!(record.application_id.as_deref(), Some("A1"));
        assert_eq!(record.candidate_id.as_deref(), Some("C1"));
        assert_eq!(record.requisition_id.as_deref(), Some("R1"));
        assert_eq!(record.status, Some(PipelineStatus::Hired));
        assert_eq!(record.candidate_type, Some(CandidateType::External));
        assert_eq!(record.skill_match_percentage, Some(81.5));
        assert_eq!(record.recruiter_id.as_deref(), Some("REC-3"));
        assert_eq!(record.matching_hours_total, Some(4.0));
        assert_eq!(record.critical_skill_flag, Some(true));
        assert_eq!(record.location, None);
    }

    #[test]
    fn missing_sides_leave_fields_empty() {
        let pipeline = RawRow::from_pairs([
            ("Application_ID", RawCell::from("A1")),
            ("Status (Active/Rejected/Hired)", RawCell::from("Active")),
        ]);
        let record = FactParts {
            pipeline: &pipeline,
            candidate: None,
            requisition: None,
            interview: None,
            cost: None,
            posting: None,
            recruiter_id: None,
            matching_hours_total: None,
        }
        .build();
        assert_eq!(record.status, Some(PipelineStatus::Active));
        assert_eq!(record.source, None);
        assert_eq!(record.total_hiring_cost, None);
    }
}
