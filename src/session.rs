//! The installed dataset and every query made against it.
//!
//! Uploads follow last-submitted-wins: each upload takes a monotonically
//! increasing ticket, and a parse result is only installed if its ticket is
//! still the most recent one issued. Older results are discarded whole.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::breakdowns::{DimensionBreakdown, compute_breakdowns};
use crate::cache::{CacheKey, MetricCache};
use crate::config::EngineConfig;
use crate::data::{Dataset, FactRecord};
use crate::errors::CockpitError;
use crate::export::{export_metrics_to_csv, export_metrics_to_xlsx};
use crate::filters::{FilterOptions, FilterSpec, apply_filters, derive_filter_options};
use crate::insights::{InsightContext, NarrativeRequest, build_insight_context};
use crate::metrics::catalog::{all_tiles, group_by_cluster};
use crate::metrics::{
    ClusterTiles, KeyInsight, MetricRegistry, MetricTile, health_score, summarize_key_insights,
};
use crate::source::{load_path, load_upload};
use crate::trends::{TrendPoint, TrendSeries, WeekBuckets, compute_all_metric_trends};
use crate::types::MetricId;

/// Claim on the next dataset install, issued by [`CockpitSession::begin_upload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct UploadTicket(u64);

impl UploadTicket {
    /// Sequence number; later uploads have larger numbers.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Owns the installed dataset, the metric registry, and the memoization cache.
///
/// All methods take `&self`; a session can be shared across threads.
pub struct CockpitSession {
    config: EngineConfig,
    registry: MetricRegistry,
    cache: MetricCache,
    dataset: RwLock<Option<Arc<Dataset>>>,
    latest_ticket: AtomicU64,
}

impl CockpitSession {
    /// Session with the standard registry and a cache sized from `config`.
    pub fn new(config: EngineConfig) -> Self {
        let cache = MetricCache::new(config.cache_capacity);
        Self::with_cache(config, cache)
    }

    /// Session sharing an existing cache.
    pub fn with_cache(config: EngineConfig, cache: MetricCache) -> Self {
        Self {
            config,
            registry: MetricRegistry::standard(),
            cache,
            dataset: RwLock::new(None),
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// Replace the metric registry.
    pub fn with_registry(mut self, registry: MetricRegistry) -> Self {
        self.registry = registry;
        self.cache.clear();
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Metric registry in use.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Memoization cache in use.
    pub fn cache(&self) -> &MetricCache {
        &self.cache
    }

    /// Issue a ticket for a new upload, superseding every earlier ticket.
    pub fn begin_upload(&self) -> UploadTicket {
        let ticket = UploadTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1);
        info!("[cockpit:session] upload ticket {} issued", ticket.id());
        ticket
    }

    /// Install `parsed` if `ticket` is still the latest issued.
    ///
    /// A superseded ticket returns [`CockpitError::StaleUpload`] and leaves the
    /// installed dataset untouched, whether `parsed` succeeded or failed.
    pub fn finish_upload(
        &self,
        ticket: UploadTicket,
        parsed: Result<Dataset, CockpitError>,
    ) -> Result<Arc<Dataset>, CockpitError> {
        let mut slot = self.dataset.write().expect("session dataset poisoned");
        let current = self.latest_ticket.load(Ordering::SeqCst);
        if ticket.id() != current {
            warn!(
                "[cockpit:session] discarding result of upload {} (latest is {})",
                ticket.id(),
                current
            );
            return Err(CockpitError::StaleUpload {
                ticket: ticket.id(),
                current,
            });
        }
        let dataset = Arc::new(parsed?);
        if let Some(previous) = slot.replace(Arc::clone(&dataset)) {
            self.cache.invalidate_dataset(previous.identity());
        }
        info!(
            "[cockpit:session] installed '{}' from upload {} ({} records)",
            dataset.name,
            ticket.id(),
            dataset.len()
        );
        Ok(dataset)
    }

    /// Parse `bytes` as file `name` and install the result.
    pub fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<Arc<Dataset>, CockpitError> {
        let ticket = self.begin_upload();
        let parsed = load_upload(name, &bytes, &self.config);
        self.finish_upload(ticket, parsed)
    }

    /// Read and install a file from disk.
    pub fn upload_path(&self, path: &Path) -> Result<Arc<Dataset>, CockpitError> {
        let ticket = self.begin_upload();
        let parsed = load_path(path, &self.config);
        self.finish_upload(ticket, parsed)
    }

    /// Installed dataset, if any.
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset
            .read()
            .expect("session dataset poisoned")
            .as_ref()
            .map(Arc::clone)
    }

    fn require_dataset(&self) -> Result<Arc<Dataset>, CockpitError> {
        self.dataset().ok_or(CockpitError::NoDataset)
    }

    /// Drop the installed dataset and its cached results.
    pub fn clear(&self) {
        let mut slot = self.dataset.write().expect("session dataset poisoned");
        if let Some(previous) = slot.take() {
            self.cache.invalidate_dataset(previous.identity());
            info!("[cockpit:session] cleared '{}'", previous.name);
        }
    }

    /// Filter choices present in the installed dataset.
    pub fn filter_options(&self) -> Result<FilterOptions, CockpitError> {
        Ok(derive_filter_options(&self.require_dataset()?.records))
    }

    /// `Dataset: <name> | Rows: <n> | Filtered: <m>` for the current selection.
    pub fn label(&self, filters: &FilterSpec) -> Result<String, CockpitError> {
        self.with_rows(filters, |dataset, rows| dataset.label(rows.len()))
    }

    /// Catalog tiles for `filters`; placeholder tiles when nothing is installed.
    pub fn catalog(&self, filters: &FilterSpec) -> Result<Vec<ClusterTiles>, CockpitError> {
        let Some(dataset) = self.dataset() else {
            return Ok(self.registry.evaluate_catalog(None));
        };
        let rows = apply_filters(&dataset.records, filters);
        let filters_hash = filters.stable_hash();
        let definitions: Vec<_> = self.registry.definitions().collect();
        let tiles: Vec<MetricTile> = definitions
            .par_iter()
            .map(|definition| {
                let key = CacheKey {
                    dataset: dataset.identity(),
                    filters: filters_hash,
                    metric_id: definition.id.to_string(),
                };
                self.cache.get_or_insert_with(key, || {
                    MetricTile::from_outcome(definition, definition.evaluate(&rows))
                })
            })
            .collect();
        Ok(group_by_cluster(tiles))
    }

    /// Key insights and health score for the current catalog.
    pub fn summary(&self, filters: &FilterSpec) -> Result<(Vec<KeyInsight>, f64), CockpitError> {
        let catalog = self.catalog(filters)?;
        Ok((
            summarize_key_insights(all_tiles(&catalog)),
            health_score(all_tiles(&catalog)),
        ))
    }

    fn with_rows<T>(
        &self,
        filters: &FilterSpec,
        f: impl FnOnce(&Dataset, &[&FactRecord]) -> T,
    ) -> Result<T, CockpitError> {
        let dataset = self.require_dataset()?;
        let rows = apply_filters(&dataset.records, filters);
        Ok(f(&dataset, &rows))
    }

    /// Dimension breakdowns of `metric_id`.
    pub fn breakdowns(
        &self,
        metric_id: &str,
        filters: &FilterSpec,
    ) -> Result<Vec<DimensionBreakdown>, CockpitError> {
        self.with_rows(filters, |_, rows| {
            compute_breakdowns(&self.registry, metric_id, rows, &self.config)
        })
    }

    /// Weekly trend of `metric_id` with its summary.
    pub fn trend(&self, metric_id: &str, filters: &FilterSpec) -> Result<TrendSeries, CockpitError> {
        self.with_rows(filters, |_, rows| {
            WeekBuckets::new(rows).series(&self.registry, metric_id, self.config.trend_max_weeks)
        })
    }

    /// Weekly trends of every registered metric.
    pub fn trends(
        &self,
        filters: &FilterSpec,
    ) -> Result<IndexMap<MetricId, Vec<TrendPoint>>, CockpitError> {
        self.with_rows(filters, |_, rows| {
            let ids: Vec<&str> = self.registry.ids().collect();
            compute_all_metric_trends(&self.registry, &ids, rows, self.config.trend_max_weeks)
        })
    }

    /// Aggregate-only digest of the current slice.
    pub fn insight_context(&self, filters: &FilterSpec) -> Result<InsightContext, CockpitError> {
        let catalog = self.catalog(filters)?;
        self.with_rows(filters, |dataset, rows| {
            build_insight_context(
                rows,
                &dataset.recruiter_interactions,
                all_tiles(&catalog),
                &self.config,
            )
        })
    }

    /// Payload for the narrative collaborator.
    pub fn narrative_request(&self, filters: &FilterSpec) -> Result<NarrativeRequest, CockpitError> {
        let context = self.insight_context(filters)?;
        let catalog = self.catalog(filters)?;
        Ok(NarrativeRequest::new(filters, all_tiles(&catalog), context))
    }

    /// CSV export of the current catalog.
    pub fn export_csv(&self, filters: &FilterSpec) -> Result<Vec<u8>, CockpitError> {
        let catalog = self.catalog(filters)?;
        let trends = self.trends(filters)?;
        export_metrics_to_csv(&catalog, &trends, filters)
    }

    /// XLSX export of the current catalog.
    pub fn export_xlsx(&self, filters: &FilterSpec) -> Result<Vec<u8>, CockpitError> {
        let catalog = self.catalog(filters)?;
        let trends = self.trends(filters)?;
        export_metrics_to_xlsx(&catalog, &trends, filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Rag;
    use crate::metrics::catalog::TileState;

    const CSV: &str = "\
Application_ID,Candidate_ID,Requisition_ID,Business_Unit,Skill_Match_Percentage,Application_Date
A1,C1,R1,Technology,80,2024-01-02
A2,C2,R1,Technology,60,2024-01-09
A3,C3,R2,Finance,40,2024-01-16
";

    fn loaded() -> CockpitSession {
        let session = CockpitSession::new(EngineConfig::default());
        session.upload("pipeline.csv", CSV.as_bytes().to_vec()).unwrap();
        session
    }

    fn skill_tile(catalog: &[ClusterTiles]) -> &MetricTile {
        all_tiles(catalog)
            .find(|tile| tile.id == "metric.readiness.skill_readiness")
            .unwrap()
    }

    #[test]
    fn catalog_without_dataset_is_placeholders() {
        let session = CockpitSession::new(EngineConfig::default());
        let catalog = session.catalog(&FilterSpec::default()).unwrap();
        assert!(all_tiles(&catalog).all(|tile| tile.state == TileState::NoDataset));
        assert!(matches!(
            session.breakdowns("metric.readiness.skill_readiness", &FilterSpec::default()),
            Err(CockpitError::NoDataset)
        ));
    }

    #[test]
    fn catalog_respects_filters_and_caches() {
        let session = loaded();
        let all = session.catalog(&FilterSpec::default()).unwrap();
        assert_eq!(skill_tile(&all).value_num, Some(60.0));
        assert_eq!(session.cache().len(), 23);

        let tech = FilterSpec {
            business_units: Some(vec!["Technology".into()]),
            ..FilterSpec::default()
        };
        let filtered = session.catalog(&tech).unwrap();
        assert_eq!(skill_tile(&filtered).value_num, Some(70.0));
        assert_eq!(skill_tile(&filtered).rag, Rag::Green);

        session.catalog(&tech).unwrap();
        assert_eq!(session.cache().stats().hits, 23);
        assert_eq!(session.label(&tech).unwrap(), "Dataset: pipeline.csv | Rows: 3 | Filtered: 2");
    }

    #[test]
    fn later_upload_wins() {
        let session = CockpitSession::new(EngineConfig::default());
        let first = session.begin_upload();
        let second = session.begin_upload();
        assert!(second > first);

        let newer = load_upload("new.csv", CSV.as_bytes(), session.config()).unwrap();
        session.finish_upload(second, Ok(newer)).unwrap();

        let older = load_upload("old.csv", CSV.as_bytes(), session.config()).unwrap();
        let err = session.finish_upload(first, Ok(older)).unwrap_err();
        assert!(matches!(err, CockpitError::StaleUpload { ticket: 1, current: 2 }));
        assert_eq!(session.dataset().unwrap().name, "new.csv");
    }

    #[test]
    fn failed_latest_upload_keeps_previous_dataset() {
        let session = loaded();
        let err = session.upload("notes.txt", b"x".to_vec()).unwrap_err();
        assert!(matches!(err, CockpitError::UnsupportedFileType { .. }));
        assert_eq!(session.dataset().unwrap().name, "pipeline.csv");
    }

    #[test]
    fn new_upload_invalidates_cached_tiles() {
        let session = loaded();
        session.catalog(&FilterSpec::default()).unwrap();
        assert_eq!(session.cache().len(), 23);
        session.upload("pipeline.csv", CSV.as_bytes().to_vec()).unwrap();
        assert_eq!(session.cache().len(), 0);
        session.clear();
        assert!(session.dataset().is_none());
    }

    #[test]
    fn exports_and_context_run_on_the_slice() {
        let session = loaded();
        let filters = FilterSpec::default();
        let csv = session.export_csv(&filters).unwrap();
        assert!(String::from_utf8(csv).unwrap().contains("metric.readiness.skill_readiness"));
        assert!(session.export_xlsx(&filters).unwrap().starts_with(b"PK"));
        let request = session.narrative_request(&filters).unwrap();
        assert_eq!(request.metrics.len(), 23);
        let trend = session.trend("metric.readiness.skill_readiness", &filters).unwrap();
        assert_eq!(trend.points.len(), 3);
        assert_eq!(trend.missing_dates, 0);
    }

    #[test]
    fn label_and_narrative_follow_the_filtered_slice() {
        let session = CockpitSession::new(EngineConfig::default());
        let csv = format!("{CSV}A4,C4,R2,Finance,50,\n");
        session.upload("pipeline.csv", csv.into_bytes()).unwrap();
        let january = FilterSpec {
            date_from: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            ..FilterSpec::default()
        };
        let slice = session.with_rows(&january, |_, rows| rows.len()).unwrap();
        assert_eq!(slice, 3);
        assert_eq!(
            session.label(&january).unwrap(),
            "Dataset: pipeline.csv | Rows: 4 | Filtered: 3"
        );

        let request = session.narrative_request(&january).unwrap();
        assert_eq!(request.context, session.insight_context(&january).unwrap());
        assert_eq!(request.context.stage_distribution.total_applications, 3);
    }
}
