//! Analytics facade: snapshot-in, results-out orchestration.
//!
//! Each operation fetches one snapshot through the store traits, runs
//! the pure engines on it, and returns owned results. The service holds
//! no mutable state, so concurrent calls with different inputs are
//! trivially safe.

use crate::aggregate;
use crate::cluster::{ClusterParams, dbscan};
use crate::error::Result;
use crate::index::SpatialIndex;
use crate::stats;
use crate::store::{PointFilter, PointStore, ZoneStore};
use crate::tessellate;
use crate::types::{
    AnalyticsConfig, ClusterResult, DistributionSummary, GridCell, NearestNeighbor, SurveyPoint,
    TrendSummary, ZoneStatistics,
};
use geojson::{Feature, FeatureCollection};

/// Facade over the analytics engines, bound to a point store and a
/// zone store.
///
/// # Example
///
/// ```rust
/// use geosurvey::{
///     AnalyticsService, MemoryStore, PointFilter, PointStatus, SurveyPoint,
/// };
/// use std::time::SystemTime;
///
/// let mut store = MemoryStore::new();
/// for i in 0..5 {
///     store.add_point(SurveyPoint {
///         id: i,
///         campaign_id: 1,
///         metric: "soil_ph".to_string(),
///         value: 6.0 + i as f64 * 0.1,
///         latitude: 55.67 + i as f64 * 0.001,
///         longitude: 12.56 + i as f64 * 0.001,
///         status: PointStatus::Approved,
///         collected_at: SystemTime::now(),
///     });
/// }
///
/// let service = AnalyticsService::new(store.clone(), store);
/// let neighbors = service
///     .k_nearest(&PointFilter::campaign(1), 55.67, 12.56, 3)
///     .unwrap();
/// assert_eq!(neighbors.len(), 3);
/// ```
pub struct AnalyticsService<P, Z> {
    points: P,
    zones: Z,
    config: AnalyticsConfig,
}

impl<P: PointStore, Z: ZoneStore> AnalyticsService<P, Z> {
    pub fn new(points: P, zones: Z) -> Self {
        Self {
            points,
            zones,
            config: AnalyticsConfig::default(),
        }
    }

    pub fn with_config(points: P, zones: Z, config: AnalyticsConfig) -> Self {
        Self {
            points,
            zones,
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Cluster parameters seeded from the service configuration.
    pub fn default_cluster_params(&self) -> ClusterParams {
        ClusterParams {
            epsilon: self.config.epsilon_degrees,
            min_points: self.config.min_points,
            ..ClusterParams::default()
        }
    }

    fn snapshot(&self, filter: &PointFilter) -> Result<Vec<SurveyPoint>> {
        let points = self.points.fetch_points(filter)?;
        log::debug!("snapshot: {} points for {:?}", points.len(), filter);
        Ok(points)
    }

    /// Per-zone, per-metric descriptive statistics for one campaign.
    /// Zones with no contained points are omitted.
    pub fn zone_statistics(
        &self,
        campaign_id: i64,
        filter: &PointFilter,
    ) -> Result<Vec<ZoneStatistics>> {
        let points = self.snapshot(filter)?;
        let zones = self.zones.fetch_zones(campaign_id)?;
        Ok(aggregate::zone_statistics(&points, &zones))
    }

    /// The K nearest points to a coordinate, ascending by distance.
    pub fn k_nearest(
        &self,
        filter: &PointFilter,
        latitude: f64,
        longitude: f64,
        k: usize,
    ) -> Result<Vec<NearestNeighbor>> {
        let points = self.snapshot(filter)?;
        let index = SpatialIndex::build(&points);

        Ok(index
            .k_nearest(latitude, longitude, k)
            .into_iter()
            .map(|n| {
                let p = &points[n.slot];
                NearestNeighbor {
                    id: p.id,
                    value: p.value,
                    metric_name: p.metric.clone(),
                    latitude: p.latitude,
                    longitude: p.longitude,
                    distance_meters: n.distance_meters,
                }
            })
            .collect())
    }

    /// DBSCAN clusters over the filtered snapshot.
    pub fn detect_clusters(
        &self,
        filter: &PointFilter,
        params: &ClusterParams,
    ) -> Result<Vec<ClusterResult>> {
        let points = self.snapshot(filter)?;
        dbscan(&points, params)
    }

    /// Grid heatmap cells over the filtered snapshot.
    pub fn grid_heatmap(
        &self,
        filter: &PointFilter,
        cell_size_degrees: f64,
    ) -> Result<Vec<GridCell>> {
        let points = self.snapshot(filter)?;
        aggregate::grid_heatmap(&points, cell_size_degrees)
    }

    /// Convex hull of the filtered snapshot as a GeoJSON feature.
    /// `None` when fewer than 3 distinct non-collinear points exist.
    pub fn convex_hull(&self, filter: &PointFilter) -> Result<Option<Feature>> {
        let points = self.snapshot(filter)?;
        Ok(tessellate::convex_hull_feature(&points))
    }

    /// Voronoi tessellation of the filtered snapshot. Always a
    /// `FeatureCollection`, empty below 3 distinct sites.
    pub fn voronoi(&self, filter: &PointFilter) -> Result<FeatureCollection> {
        let points = self.snapshot(filter)?;
        Ok(tessellate::voronoi_features(
            &points,
            self.config.voronoi_padding_fraction,
        ))
    }

    /// `[latitude, longitude, value]` triples for heat-layer rendering.
    ///
    /// Requires the filter to name a metric: mixing values with
    /// different units on one heat layer is meaningless, so a
    /// metric-less filter yields an empty result.
    pub fn heatmap_points(&self, filter: &PointFilter) -> Result<Vec<[f64; 3]>> {
        if filter.metric.is_none() {
            log::debug!("heatmap_points called without a metric filter; returning empty");
            return Ok(Vec::new());
        }
        let points = self.snapshot(filter)?;
        Ok(points
            .iter()
            .map(|p| [p.latitude, p.longitude, p.value])
            .collect())
    }

    /// Mean and 95% confidence interval of the filtered values, ordered
    /// by collection time. `None` for an empty snapshot.
    pub fn trend(&self, filter: &PointFilter) -> Result<Option<TrendSummary>> {
        let mut points = self.snapshot(filter)?;
        points.sort_by_key(|p| p.collected_at);
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        Ok(stats::mean_confidence_interval(&values))
    }

    /// Distribution analysis of the filtered values: summary stats,
    /// histogram (Freedman-Diaconis when `bins` is `None`), and outlier
    /// counts by both methods. `None` for an empty snapshot.
    pub fn distribution(
        &self,
        filter: &PointFilter,
        bins: Option<usize>,
    ) -> Result<Option<DistributionSummary>> {
        let points = self.snapshot(filter)?;
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();

        let Some(summary) = stats::summarize(&values) else {
            return Ok(None);
        };
        let Some(histogram) = stats::histogram(&values, bins) else {
            return Ok(None);
        };
        let iqr_outlier_count =
            stats::iqr_outlier_indices(&values, self.config.iqr_multiplier).len();
        let zscore_outlier_count =
            stats::zscore_outlier_indices(&values, self.config.zscore_threshold).len();

        Ok(Some(DistributionSummary {
            summary,
            histogram,
            iqr_outlier_count,
            zscore_outlier_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::PointStatus;
    use std::time::{Duration, UNIX_EPOCH};

    fn point(id: i64, latitude: f64, longitude: f64, value: f64) -> SurveyPoint {
        SurveyPoint {
            id,
            campaign_id: 1,
            metric: "soil_ph".to_string(),
            value,
            latitude,
            longitude,
            status: PointStatus::Approved,
            collected_at: UNIX_EPOCH + Duration::from_secs(id as u64),
        }
    }

    fn service_with(points: Vec<SurveyPoint>) -> AnalyticsService<MemoryStore, MemoryStore> {
        let store = MemoryStore::with_data(points, vec![]);
        AnalyticsService::new(store.clone(), store)
    }

    #[test]
    fn test_heatmap_points_requires_metric() {
        let service = service_with(vec![point(1, 55.0, 12.0, 1.0)]);

        let without_metric = service.heatmap_points(&PointFilter::campaign(1)).unwrap();
        assert!(without_metric.is_empty());

        let with_metric = service
            .heatmap_points(&PointFilter::campaign(1).with_metric("soil_ph"))
            .unwrap();
        assert_eq!(with_metric, vec![[55.0, 12.0, 1.0]]);
    }

    #[test]
    fn test_trend_small_series() {
        let service = service_with(vec![point(1, 55.0, 12.0, 10.0), point(2, 55.0, 12.0, 20.0)]);
        let trend = service.trend(&PointFilter::campaign(1)).unwrap().unwrap();
        assert_eq!(trend.mean, 15.0);
        assert_eq!(trend.ci_lower, trend.ci_upper);
        assert_eq!(trend.standard_error, 0.0);
    }

    #[test]
    fn test_trend_empty() {
        let service = service_with(vec![]);
        assert!(service.trend(&PointFilter::campaign(1)).unwrap().is_none());
    }

    #[test]
    fn test_distribution_counts() {
        let points = (0..20)
            .map(|i| point(i, 55.0, 12.0, (i % 5) as f64))
            .collect();
        let service = service_with(points);

        let dist = service
            .distribution(&PointFilter::campaign(1), None)
            .unwrap()
            .unwrap();
        assert_eq!(dist.summary.count, 20);
        assert_eq!(dist.histogram.total_count(), 20);
    }

    #[test]
    fn test_default_cluster_params_follow_config() {
        let service = service_with(vec![]);
        let params = service.default_cluster_params();
        assert_eq!(params.epsilon, service.config().epsilon_degrees);
        assert_eq!(params.min_points, service.config().min_points);
    }
}
