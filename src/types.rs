/// Stable metric identifier in `metric.<cluster>.<name>` form.
/// Examples: `metric.readiness.skill_readiness`, `metric.economics.cost_per_acquisition`
pub type MetricId = String;
/// Identifier for a pipeline, candidate, or requisition row as it appears in the upload.
/// Examples: `APP-000123`, `CAND-0042`, `REQ-0007`
pub type RecordKey = String;
/// Worksheet name from an uploaded workbook.
/// Examples: `3_Application_Pipeline`, `Sheet1`
pub type SheetName = String;
/// Column header text as it appears in an upload.
/// Examples: `Requisition_ID`, `Critical_Skill_Flag (Y/N)`
pub type ColumnName = String;
/// ISO-8601 week bucket key.
/// Example: `2025-W07`
pub type WeekKey = String;
/// Monday-anchored calendar week start used by chart aggregates.
/// Example: `2025-02-10`
pub type WeekStart = String;
/// Calendar quarter bucket key.
/// Example: `2025-Q1`
pub type QuarterKey = String;
/// Categorical value of a breakdown dimension or filter field.
/// Examples: `Technology`, `Dubai`, `LinkedIn`
pub type DimensionValue = String;
/// Aggregate-only supporting fact attached to a computed metric.
/// Examples: `Critical-skill requisitions: 14`, `No negative deltas`
pub type FactText = String;
/// Warning/log message text.
/// Examples: `Candidate join coverage is 91.2%.`, `[cockpit:session] upload 3 superseded`
pub type LogMessage = String;
