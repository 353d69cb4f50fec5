//! Filter derivation and application.
//!
//! A [`FilterSpec`] is sparse: every categorical field is `Option<Vec<T>>`, and
//! both `None` and `Some(vec![])` mean "no constraint on this axis". A
//! non-empty selection is an inclusive set-membership test; a record whose
//! value is missing never matches a non-empty selection. Axes compose by AND.

use std::collections::BTreeSet;
use std::hash::Hash;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{CandidateType, FactRecord, PipelineStatus};
use crate::hash::stable_hash_with;

/// Sparse filter selection over the fact records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Inclusive lower bound on the application date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the application date (whole day).
    pub date_to: Option<NaiveDate>,
    /// Business units to keep.
    pub business_units: Option<Vec<String>>,
    /// Locations to keep.
    pub locations: Option<Vec<String>>,
    /// Role names to keep.
    pub roles: Option<Vec<String>>,
    /// Sourcing channels to keep.
    pub sources: Option<Vec<String>>,
    /// Candidate types to keep.
    pub candidate_types: Option<Vec<CandidateType>>,
    /// Diversity flag values to keep.
    pub diversity_flags: Option<Vec<bool>>,
    /// Current stages to keep.
    pub current_stages: Option<Vec<String>>,
    /// Statuses to keep.
    pub statuses: Option<Vec<PipelineStatus>>,
    /// Recruiters to keep.
    pub recruiters: Option<Vec<String>>,
    /// Critical-skill flag values to keep.
    pub critical_skill_flags: Option<Vec<bool>>,
}

/// Sorted distinct values available for each categorical filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Business units present.
    pub business_units: Vec<String>,
    /// Locations present.
    pub locations: Vec<String>,
    /// Role names present.
    pub roles: Vec<String>,
    /// Sources present.
    pub sources: Vec<String>,
    /// Candidate types present.
    pub candidate_types: Vec<CandidateType>,
    /// Diversity flag values present.
    pub diversity_flags: Vec<bool>,
    /// Current stages present.
    pub current_stages: Vec<String>,
    /// Statuses present.
    pub statuses: Vec<PipelineStatus>,
    /// Recruiters present.
    pub recruiters: Vec<String>,
    /// Critical-skill flag values present.
    pub critical_skill_flags: Vec<bool>,
}

fn selection<T>(values: &Option<Vec<T>>) -> Option<&[T]> {
    values.as_deref().filter(|values| !values.is_empty())
}

fn matches_text(selected: &Option<Vec<String>>, value: Option<&String>) -> bool {
    match selection(selected) {
        None => true,
        Some(selected) => value.is_some_and(|value| selected.iter().any(|s| s == value)),
    }
}

fn matches_value<T: PartialEq>(selected: &Option<Vec<T>>, value: Option<&T>) -> bool {
    match selection(selected) {
        None => true,
        Some(selected) => value.is_some_and(|value| selected.contains(value)),
    }
}

fn normalized_list<T: Ord + Clone>(values: &Option<Vec<T>>) -> Option<Vec<T>> {
    selection(values).map(|values| {
        values
            .iter()
            .cloned()
            .collect::<BTreeSet<T>>()
            .into_iter()
            .collect()
    })
}

fn flag_label(value: bool) -> &'static str {
    if value { "Y" } else { "N" }
}

impl FilterSpec {
    /// True when no axis is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.normalized() == FilterSpec::default()
    }

    /// Equivalent spec with empty selections dropped and values sorted/deduplicated.
    pub fn normalized(&self) -> FilterSpec {
        FilterSpec {
            date_from: self.date_from,
            date_to: self.date_to,
            business_units: normalized_list(&self.business_units),
            locations: normalized_list(&self.locations),
            roles: normalized_list(&self.roles),
            sources: normalized_list(&self.sources),
            candidate_types: normalized_list(&self.candidate_types),
            diversity_flags: normalized_list(&self.diversity_flags),
            current_stages: normalized_list(&self.current_stages),
            statuses: normalized_list(&self.statuses),
            recruiters: normalized_list(&self.recruiters),
            critical_skill_flags: normalized_list(&self.critical_skill_flags),
        }
    }

    /// Hash that is equal for specs selecting the same rows by construction.
    pub fn stable_hash(&self) -> u64 {
        let normalized = self.normalized();
        stable_hash_with(|hasher| normalized.hash(hasher))
    }

    /// True when `record` satisfies every constrained axis.
    pub fn matches(&self, record: &FactRecord) -> bool {
        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(date) = record.application_date.map(|value| value.date()) else {
                return false;
            };
            if self.date_from.is_some_and(|from| date < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| date > to) {
                return false;
            }
        }
        matches_text(&self.business_units, record.business_unit.as_ref())
            && matches_text(&self.locations, record.location.as_ref())
            && matches_text(&self.roles, record.role_name.as_ref())
            && matches_text(&self.sources, record.source.as_ref())
            && matches_value(&self.candidate_types, record.candidate_type.as_ref())
            && matches_value(&self.diversity_flags, record.diversity_flag.as_ref())
            && matches_text(&self.current_stages, record.current_stage.as_ref())
            && matches_value(&self.statuses, record.status.as_ref())
            && matches_text(&self.recruiters, record.recruiter_id.as_ref())
            && matches_value(&self.critical_skill_flags, record.critical_skill_flag.as_ref())
    }
}

/// Derive per-field sorted distinct values from `records`.
pub fn derive_filter_options(records: &[FactRecord]) -> FilterOptions {
    fn distinct<'a, T: Ord + Clone + 'a>(values: impl Iterator<Item = Option<&'a T>>) -> Vec<T> {
        values
            .flatten()
            .cloned()
            .collect::<BTreeSet<T>>()
            .into_iter()
            .collect()
    }

    FilterOptions {
        business_units: distinct(records.iter().map(|r| r.business_unit.as_ref())),
        locations: distinct(records.iter().map(|r| r.location.as_ref())),
        roles: distinct(records.iter().map(|r| r.role_name.as_ref())),
        sources: distinct(records.iter().map(|r| r.source.as_ref())),
        candidate_types: distinct(records.iter().map(|r| r.candidate_type.as_ref())),
        diversity_flags: distinct(records.iter().map(|r| r.diversity_flag.as_ref())),
        current_stages: distinct(records.iter().map(|r| r.current_stage.as_ref())),
        statuses: distinct(records.iter().map(|r| r.status.as_ref())),
        recruiters: distinct(records.iter().map(|r| r.recruiter_id.as_ref())),
        critical_skill_flags: distinct(records.iter().map(|r| r.critical_skill_flag.as_ref())),
    }
}

/// Records matching `spec`, in source order. The source slice is never mutated.
pub fn apply_filters<'a>(records: &'a [FactRecord], spec: &FilterSpec) -> Vec<&'a FactRecord> {
    if spec.is_unconstrained() {
        return records.iter().collect();
    }
    records.iter().filter(|record| spec.matches(record)).collect()
}

/// Human-readable summary of active filters, or `No filters applied`.
pub fn filter_summary(spec: &FilterSpec) -> String {
    fn push_list<T>(parts: &mut Vec<String>, label: &str, values: &Option<Vec<T>>, show: impl Fn(&T) -> String) {
        if let Some(values) = selection(values) {
            let joined = values.iter().map(show).collect::<Vec<_>>().join(", ");
            parts.push(format!("{label}: {joined}"));
        }
    }

    let mut parts = Vec::new();
    if let Some(from) = spec.date_from {
        parts.push(format!("From: {}", from.format("%Y-%m-%d")));
    }
    if let Some(to) = spec.date_to {
        parts.push(format!("To: {}", to.format("%Y-%m-%d")));
    }
    push_list(&mut parts, "BU", &spec.business_units, String::clone);
    push_list(&mut parts, "Location", &spec.locations, String::clone);
    push_list(&mut parts, "Role", &spec.roles, String::clone);
    push_list(&mut parts, "Source", &spec.sources, String::clone);
    push_list(&mut parts, "Candidate Type", &spec.candidate_types, |t| {
        t.as_str().to_string()
    });
    push_list(&mut parts, "Diversity", &spec.diversity_flags, |f| {
        flag_label(*f).to_string()
    });
    push_list(&mut parts, "Stage", &spec.current_stages, String::clone);
    push_list(&mut parts, "Status", &spec.statuses, |s| s.as_str().to_string());
    push_list(&mut parts, "Recruiter", &spec.recruiters, String::clone);
    push_list(&mut parts, "Critical Skill", &spec.critical_skill_flags, |f| {
        flag_label(*f).to_string()
    });
    if parts.is_empty() {
        "No filters applied".to_string()
    } else {
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bu: Option<&str>, day: Option<u32>, status: Option<PipelineStatus>) -> FactRecord {
        FactRecord {
            business_unit: bu.map(str::to_string),
            application_date: day.map(|d| {
                NaiveDate::from_ymd_opt(2025, 1, d)
                    .unwrap()
                    .and_hms_opt(23, 30, 0)
                    .unwrap()
            }),
            status,
            ..FactRecord::default()
        }
    }

    #[test]
    fn empty_selection_is_unconstrained() {
        let records = vec![record(Some("Tech"), None, None), record(None, None, None)];
        let spec = FilterSpec {
            business_units: Some(Vec::new()),
            ..FilterSpec::default()
        };
        assert!(spec.is_unconstrained());
        assert_eq!(apply_filters(&records, &spec).len(), 2);
    }

    #[test]
    fn missing_value_fails_non_empty_selection() {
        let records = vec![record(Some("Tech"), None, None), record(None, None, None)];
        let spec = FilterSpec {
            business_units: Some(vec!["Tech".into()]),
            ..FilterSpec::default()
        };
        let kept = apply_filters(&records, &spec);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].business_unit.as_deref(), Some("Tech"));
    }

    #[test]
    fn date_range_is_inclusive_and_requires_a_date() {
        let records = vec![
            record(None, Some(1), None),
            record(None, Some(5), None),
            record(None, Some(6), None),
            record(None, None, None),
        ];
        let spec = FilterSpec {
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 1, 5),
            ..FilterSpec::default()
        };
        assert_eq!(apply_filters(&records, &spec).len(), 2);

        let only_from = FilterSpec {
            date_from: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..FilterSpec::default()
        };
        assert_eq!(apply_filters(&records, &only_from).len(), 3);
    }

    #[test]
    fn axes_compose_with_and() {
        let records = vec![
            record(Some("Tech"), None, Some(PipelineStatus::Hired)),
            record(Some("Tech"), None, Some(PipelineStatus::Active)),
            record(Some("Ops"), None, Some(PipelineStatus::Hired)),
        ];
        let spec = FilterSpec {
            business_units: Some(vec!["Tech".into()]),
            statuses: Some(vec![PipelineStatus::Hired]),
            ..FilterSpec::default()
        };
        assert_eq!(apply_filters(&records, &spec).len(), 1);
    }

    #[test]
    fn options_are_sorted_and_distinct() {
        let records = vec![
            record(Some("Tech"), None, Some(PipelineStatus::Hired)),
            record(Some("Finance"), None, Some(PipelineStatus::Active)),
            record(Some("Tech"), None, None),
        ];
        let options = derive_filter_options(&records);
        assert_eq!(options.business_units, vec!["Finance", "Tech"]);
        assert_eq!(
            options.statuses,
            vec![PipelineStatus::Active, PipelineStatus::Hired]
        );
        assert!(options.locations.is_empty());
    }

    #[test]
    fn hash_ignores_selection_order_and_empty_lists() {
        let a = FilterSpec {
            locations: Some(vec!["Dubai".into(), "Abu Dhabi".into()]),
            roles: Some(Vec::new()),
            ..FilterSpec::default()
        };
        let b = FilterSpec {
            locations: Some(vec!["Abu Dhabi".into(), "Dubai".into(), "Dubai".into()]),
            ..FilterSpec::default()
        };
        assert_eq!(a.stable_hash(), b.stable_hash());
        assert_ne!(a.stable_hash(), FilterSpec::default().stable_hash());
    }

    #[test]
    fn summary_lists_active_axes() {
        assert_eq!(filter_summary(&FilterSpec::default()), "No filters applied");
        let spec = FilterSpec {
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            business_units: Some(vec!["Tech".into(), "Ops".into()]),
            diversity_flags: Some(vec![true]),
            ..FilterSpec::default()
        };
        assert_eq!(
            filter_summary(&spec),
            "From: 2025-01-01 | BU: Tech, Ops | Diversity: Y"
        );
    }
}
