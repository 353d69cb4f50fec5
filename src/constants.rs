/// Worksheet names expected in a cockpit workbook, in join-role order.
pub mod sheets {
    /// Requisition master table.
    pub const REQUISITION: &str = "1_Requisition";
    /// Candidate master table.
    pub const CANDIDATE: &str = "2_Candidate";
    /// Application pipeline table (the join spine).
    pub const APPLICATION_PIPELINE: &str = "3_Application_Pipeline";
    /// Recruiter interaction log.
    pub const RECRUITER_ACTIVITY: &str = "4_Recruiter_Activity";
    /// Interview and offer events.
    pub const INTERVIEW_OFFER: &str = "5_Interview_Offer";
    /// Hiring cost per requisition.
    pub const HIRING_COST: &str = "6_Hiring_Cost";
    /// Job posting analytics per requisition.
    pub const JOB_POSTING_ANALYTICS: &str = "7_Job_Posting_Analytics";

    /// All expected sheets in workbook order.
    pub const ALL: [&str; 7] = [
        REQUISITION,
        CANDIDATE,
        APPLICATION_PIPELINE,
        RECRUITER_ACTIVITY,
        INTERVIEW_OFFER,
        HIRING_COST,
        JOB_POSTING_ANALYTICS,
    ];
}

/// Column headers used by the workbook sheets and as canonical CSV headers.
pub mod headers {
    /// Application identifier.
    pub const APPLICATION_ID: &str = "Application_ID";
    /// Candidate identifier.
    pub const CANDIDATE_ID: &str = "Candidate_ID";
    /// Requisition identifier.
    pub const REQUISITION_ID: &str = "Requisition_ID";
    /// Posting key in the job posting sheet; carries a requisition id.
    pub const JOB_ID: &str = "Job_ID";
    /// Pipeline status in workbook form.
    pub const STATUS_LONG: &str = "Status (Active/Rejected/Hired)";
    /// Pipeline status in flat form.
    pub const STATUS: &str = "Status";
    /// Application date.
    pub const APPLICATION_DATE: &str = "Application_Date";
    /// Current pipeline stage.
    pub const CURRENT_STAGE: &str = "Current_Stage";
    /// Stage entry date.
    pub const STAGE_ENTER_DATE: &str = "Stage_Enter_Date";
    /// Stage exit date.
    pub const STAGE_EXIT_DATE: &str = "Stage_Exit_Date";
    /// CV submission time in hours.
    pub const CV_SUBMISSION_TIME: &str = "CV_Submission_Time";
    /// Recruiter response time in hours.
    pub const RECRUITER_RESPONSE_TIME: &str = "Recruiter_Response_Time";
    /// Candidate source channel.
    pub const SOURCE: &str = "Source";
    /// Candidate type in workbook form.
    pub const CANDIDATE_TYPE_LONG: &str = "Candidate Type (Internal/External)";
    /// Candidate type in flat form.
    pub const CANDIDATE_TYPE: &str = "CandidateType";
    /// Diversity flag.
    pub const DIVERSITY_FLAG: &str = "Diversity_Flag";
    /// Competitor flag.
    pub const IS_COMPETITOR: &str = "Is_Competitor (Y/N)";
    /// Application start timestamp.
    pub const APPLICATION_START_TIME: &str = "Application_Start_Time";
    /// Application submit timestamp.
    pub const APPLICATION_SUBMIT_TIME: &str = "Application_Submit_Time";
    /// Application completion flag.
    pub const APPLICATION_COMPLETED: &str = "Application_Completed (Y/N)";
    /// Self-reported ease of applying (1-5).
    pub const APPLICATION_EASE_RATING: &str = "Application_Ease_Rating";
    /// Candidate NPS (5-10 in cockpit workbooks).
    pub const CANDIDATE_NPS: &str = "Candidate_NPS";
    /// Skill match percentage.
    pub const SKILL_MATCH_PERCENTAGE: &str = "Skill_Match_Percentage";
    /// Role name.
    pub const ROLE_NAME: &str = "Role_Name";
    /// Business unit.
    pub const BUSINESS_UNIT: &str = "Business_Unit";
    /// Location.
    pub const LOCATION: &str = "Location";
    /// Critical skill flag.
    pub const CRITICAL_SKILL_FLAG: &str = "Critical_Skill_Flag (Y/N)";
    /// Requisition open date.
    pub const OPEN_DATE: &str = "Open_Date";
    /// Requisition close date.
    pub const CLOSE_DATE: &str = "Close_Date";
    /// Budgeted cost.
    pub const BUDGETED_COST: &str = "Budgeted_Cost";
    /// Recruiter identifier.
    pub const RECRUITER_ID: &str = "Recruiter_ID";
    /// Matching hours logged per interaction.
    pub const TIME_SPENT_MATCHING: &str = "Time_Spent_Matching (hrs)";
    /// Interaction type label.
    pub const INTERACTION_TYPE: &str = "Interaction_Type";
    /// Interaction date.
    pub const INTERACTION_DATE: &str = "Interaction_Date";
    /// Interview date.
    pub const INTERVIEW_DATE: &str = "Interview_Date";
    /// Hiring manager feedback date.
    pub const FEEDBACK_DATE: &str = "Feedback_Date";
    /// Offer made flag.
    pub const OFFER_MADE: &str = "Offer_Made (Y/N)";
    /// Offer date.
    pub const OFFER_DATE: &str = "Offer_Date";
    /// Offer accepted flag.
    pub const OFFER_ACCEPTED: &str = "Offer_Accepted (Y/N)";
    /// Total hiring cost per requisition.
    pub const TOTAL_HIRING_COST: &str = "Total_Hiring_Cost";
    /// Job posting views.
    pub const JOB_VIEWS: &str = "Job_Views";
    /// Job posting applications received.
    pub const APPLICATIONS_RECEIVED: &str = "Applications_Received";
}

/// Constants used by upload ingestion and join diagnostics.
pub mod ingest {
    /// Maximum pipeline rows accepted in one upload.
    pub const MAX_PIPELINE_ROWS: usize = 200_000;
    /// Maximum unmatched ids sampled per join side.
    pub const MISSING_ID_SAMPLE_LIMIT: usize = 12;
    /// Join coverage ratio below which a warning is emitted.
    pub const JOIN_COVERAGE_WARNING_RATIO: f64 = 0.95;
    /// Rows scanned per sheet when collecting column names.
    pub const SHEET_COLUMN_SCAN_ROWS: usize = 200;
    /// Lowest Excel serial treated as a date in a date column.
    pub const EXCEL_SERIAL_MIN: f64 = 1.0;
    /// Highest Excel serial treated as a date (9999-12-31).
    pub const EXCEL_SERIAL_MAX: f64 = 2_958_465.0;
}

/// Constants used by the breakdown engine.
pub mod breakdowns {
    /// Maximum bars per dimension breakdown.
    pub const MAX_BARS: usize = 10;
    /// Maximum dimensions returned per metric.
    pub const MAX_BREAKDOWNS: usize = 3;
    /// Minimum distinct groups (and surviving bars) for a breakdown.
    pub const MIN_DISTINCT: usize = 2;
}

/// Constants used by weekly trends and trend summaries.
pub mod trends {
    /// Default number of most recent weeks kept in a trend.
    pub const DEFAULT_MAX_WEEKS: usize = 12;
    /// Points per comparison window in trend summaries.
    pub const SUMMARY_WINDOW: usize = 3;
    /// Relative change (percent) treated as stable.
    pub const STABLE_BAND_PCT: f64 = 5.0;
}

/// Constants used by the insight-context builder.
pub mod insights {
    /// Leading funnel stages included in the context.
    pub const TOP_FUNNEL_STAGES: usize = 6;
    /// Source channels included in the source mix.
    pub const TOP_SOURCES: usize = 5;
    /// Stages included in the stage-aging digest.
    pub const TOP_STAGE_AGING: usize = 5;
    /// Disclaimer attached to the stage distribution.
    pub const STAGE_DISTRIBUTION_NOTE: &str = "Current stage distribution across applications. This is not a stage-to-stage conversion funnel; do not infer conversion rates without stage history.";
    /// Note attached to the quarterly application-type split.
    pub const APPLICATION_TYPE_NOTE: &str = "Counts unique applications by quarter of Application_Date. Candidate type sourced from Candidate Type (Internal/External).";
    /// Note attached to the quarterly interaction-type split.
    pub const INTERACTION_TYPE_NOTE: &str = "Counts recruiter interactions by quarter of Interaction_Date, limited to candidates in the current filter scope.";
}

/// Narrative copy attached to catalog tiles before an external narrative is generated.
pub mod narrative {
    /// Alarm/insight/action text for computed tiles.
    pub const PENDING: &str = "AI narrative pending.";
    /// Alarm/insight/action text when no dataset is loaded.
    pub const UPLOAD_PROMPT: &str = "Upload a dataset to generate KPI insights.";
    /// Fact for metrics with no data in the current slice.
    pub const NOT_ENOUGH_DATA_FACT: &str =
        "Not enough data for this filter slice, or missing required fields.";
    /// Fact for metrics without a registered formula.
    pub const NOT_IMPLEMENTED_FACT: &str = "MVP: metric not implemented yet.";
    /// Alarm for metrics with no data in the current slice.
    pub const NOT_ENOUGH_DATA_ALARM: &str = "This KPI is unavailable for the current filter slice.";
    /// Insight for metrics with no data in the current slice.
    pub const NOT_ENOUGH_DATA_INSIGHT: &str =
        "Required data is missing or filtered out for this KPI in the current view.";
    /// Action for metrics with no data in the current slice.
    pub const NOT_ENOUGH_DATA_ACTION: &str =
        "Broaden filters or verify required source columns are present in the uploaded dataset.";
    /// Alarm for metrics without a registered formula.
    pub const NOT_IMPLEMENTED_ALARM: &str = "This KPI is not implemented yet in the current MVP.";
    /// Insight for metrics without a registered formula.
    pub const NOT_IMPLEMENTED_INSIGHT: &str =
        "This tile is visible for roadmap completeness, but no runtime formula is attached yet.";
    /// Action for metrics without a registered formula.
    pub const NOT_IMPLEMENTED_ACTION: &str =
        "Implement runtime computation logic for this KPI before relying on it for decisions.";
    /// Value text shown when a metric cannot be computed.
    pub const NOT_AVAILABLE: &str = "N/A";
    /// Value text shown when no dataset is loaded.
    pub const NO_DATASET: &str = "--";
}

/// Constants used by exports.
pub mod export {
    /// Worksheet name used for XLSX exports.
    pub const SHEET_NAME: &str = "TA Cockpit Metrics";
    /// Prefix of the context row written ahead of metric rows.
    pub const CONTEXT_PREFIX: &str = "TA Cockpit Export - ";
    /// Separator between supporting facts in a single cell.
    pub const FACT_SEPARATOR: &str = "; ";
    /// Export column headers in output order.
    pub const COLUMNS: [&str; 11] = [
        "cluster",
        "metricId",
        "title",
        "value",
        "rag",
        "threshold",
        "alarm",
        "insight",
        "action",
        "supportingFacts",
        "trendSummary",
    ];
}

/// Constants used by catalog-level summaries.
pub mod summary {
    /// Maximum key insights surfaced from a catalog.
    pub const MAX_KEY_INSIGHTS: usize = 4;
    /// Health score contribution of a green metric.
    pub const HEALTH_GREEN: f64 = 100.0;
    /// Health score contribution of an amber metric.
    pub const HEALTH_AMBER: f64 = 70.0;
    /// Health score contribution of a red metric.
    pub const HEALTH_RED: f64 = 40.0;
}

/// Constants used by the catalog memoization cache.
pub mod cache {
    /// Default number of memoized metric results kept.
    pub const DEFAULT_CAPACITY: usize = 512;
}
