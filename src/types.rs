//! Core data types for survey points, zones, and analytics results.
//!
//! All records are explicit serde-serializable structs. Input types
//! (`SurveyPoint`, `Zone`) are immutable snapshots owned by the caller;
//! result types are computed fresh per analytics call and reference
//! input point ids only.

use geo::{LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Review status of a survey measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PointStatus {
    /// Captured in the field, not yet submitted
    Draft,
    /// Submitted, awaiting review
    #[default]
    Pending,
    /// Passed quality review
    Approved,
    /// Failed quality review
    Rejected,
}

/// A single georeferenced measurement.
///
/// The unit of input for every analytics operation. Analytics holds a
/// read-only snapshot of these for the duration of one call; the point
/// store owns the records.
///
/// # Example
///
/// ```rust
/// use geosurvey::{PointStatus, SurveyPoint};
/// use std::time::SystemTime;
///
/// let point = SurveyPoint {
///     id: 1,
///     campaign_id: 10,
///     metric: "soil_ph".to_string(),
///     value: 6.8,
///     latitude: 55.6761,
///     longitude: 12.5683,
///     status: PointStatus::Approved,
///     collected_at: SystemTime::now(),
/// };
/// assert_eq!(point.position().x(), 12.5683);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyPoint {
    pub id: i64,
    pub campaign_id: i64,
    /// Name of the measured metric (e.g. `soil_ph`, `ndvi`)
    pub metric: String,
    pub value: f64,
    /// Degrees, range [-90, 90]
    pub latitude: f64,
    /// Degrees, range [-180, 180]
    pub longitude: f64,
    pub status: PointStatus,
    pub collected_at: SystemTime,
}

impl SurveyPoint {
    /// Position as a `geo::Point` (x = longitude, y = latitude).
    pub fn position(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

/// A named survey zone bounded by a polygon ring.
///
/// The boundary is an ordered sequence of (lon, lat) pairs forming a
/// closed ring: at least 4 pairs with first == last. Invalid rings are
/// skipped by the aggregation engine with a logged warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub campaign_id: i64,
    pub name: String,
    /// Closed ring of (lon, lat) pairs
    pub boundary: Vec<(f64, f64)>,
}

impl Zone {
    /// Materialize the boundary as a `geo::Polygon`.
    ///
    /// Returns `None` if the ring is invalid: fewer than 4 coordinate
    /// pairs, not closed (first != last), or containing non-finite
    /// coordinates.
    pub fn to_polygon(&self) -> Option<Polygon> {
        if self.boundary.len() < 4 {
            return None;
        }
        if self.boundary.first() != self.boundary.last() {
            return None;
        }
        if self
            .boundary
            .iter()
            .any(|(lon, lat)| !lon.is_finite() || !lat.is_finite())
        {
            return None;
        }
        Some(Polygon::new(LineString::from(self.boundary.clone()), vec![]))
    }
}

/// One density cluster discovered by DBSCAN.
///
/// Transient: valid only for the snapshot that produced it. Noise
/// points are excluded, so the sum of `point_count` across all clusters
/// never exceeds the input size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    /// 0-based, assigned in discovery order within one call
    pub cluster_id: usize,
    /// Member point ids, ascending; serialized as `points` in the
    /// output contract
    #[serde(rename = "points")]
    pub point_ids: Vec<i64>,
    pub point_count: usize,
    pub avg_value: f64,
    /// Arithmetic mean of member latitudes
    pub center_latitude: f64,
    /// Arithmetic mean of member longitudes
    pub center_longitude: f64,
}

/// One grid-heatmap cell with at least the emission threshold of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Longitude of the cell's geometric center
    pub longitude: f64,
    /// Latitude of the cell's geometric center
    pub latitude: f64,
    /// Member point ids, ascending
    pub point_ids: Vec<i64>,
    pub point_count: usize,
    pub avg_value: f64,
    /// Population standard deviation of member values
    pub stddev_value: f64,
}

/// Descriptive statistics for the points of one metric inside one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatistics {
    pub zone_name: String,
    pub metric_name: String,
    pub point_count: usize,
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    /// Population standard deviation
    pub stddev_value: f64,
}

/// One row of a K-nearest-neighbors result, ascending by distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestNeighbor {
    pub id: i64,
    pub value: f64,
    pub metric_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_meters: f64,
}

/// Mean and 95% confidence interval of a trend series.
///
/// For fewer than 3 samples the interval collapses to the mean and the
/// standard error is reported as 0 rather than an unstable estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub point_count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub standard_error: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Distribution analysis of one metric: summary statistics, histogram,
/// and outlier counts by both detection methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub summary: crate::stats::SummaryStats,
    pub histogram: crate::stats::Histogram,
    pub iqr_outlier_count: usize,
    pub zscore_outlier_count: usize,
}

/// Default parameters for the analytics operations.
///
/// Loadable from JSON or built with `Default`. This is a defaults
/// container only: every engine still takes its parameters explicitly
/// per call, so the core stays free of global state.
///
/// # Example
///
/// ```rust
/// use geosurvey::AnalyticsConfig;
///
/// let json = r#"{
///     "epsilon_degrees": 0.02,
///     "min_points": 4
/// }"#;
/// let config: AnalyticsConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.min_points, 4);
/// assert_eq!(config.cell_size_degrees, 0.01);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// DBSCAN neighborhood radius in coordinate degrees
    #[serde(default = "AnalyticsConfig::default_epsilon_degrees")]
    pub epsilon_degrees: f64,

    /// DBSCAN minimum neighborhood size for a core point
    #[serde(default = "AnalyticsConfig::default_min_points")]
    pub min_points: usize,

    /// Heatmap grid cell edge length in degrees
    #[serde(default = "AnalyticsConfig::default_cell_size_degrees")]
    pub cell_size_degrees: f64,

    /// Default K for nearest-neighbor queries
    #[serde(default = "AnalyticsConfig::default_k")]
    pub default_k: usize,

    /// Multiplier for IQR outlier bounds
    #[serde(default = "AnalyticsConfig::default_iqr_multiplier")]
    pub iqr_multiplier: f64,

    /// Z-score threshold for outlier detection
    #[serde(default = "AnalyticsConfig::default_zscore_threshold")]
    pub zscore_threshold: f64,

    /// Fraction of the bounding-box extent used to pad the Voronoi
    /// clip region
    #[serde(default = "AnalyticsConfig::default_voronoi_padding")]
    pub voronoi_padding_fraction: f64,
}

impl AnalyticsConfig {
    const fn default_epsilon_degrees() -> f64 {
        0.01
    }

    const fn default_min_points() -> usize {
        5
    }

    const fn default_cell_size_degrees() -> f64 {
        0.01
    }

    const fn default_k() -> usize {
        5
    }

    const fn default_iqr_multiplier() -> f64 {
        1.5
    }

    const fn default_zscore_threshold() -> f64 {
        3.0
    }

    const fn default_voronoi_padding() -> f64 {
        0.1
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            epsilon_degrees: Self::default_epsilon_degrees(),
            min_points: Self::default_min_points(),
            cell_size_degrees: Self::default_cell_size_degrees(),
            default_k: Self::default_k(),
            iqr_multiplier: Self::default_iqr_multiplier(),
            zscore_threshold: Self::default_zscore_threshold(),
            voronoi_padding_fraction: Self::default_voronoi_padding(),
        }
    }
}
