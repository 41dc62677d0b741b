//! Geospatial analytics engine for environmental field surveys.
//!
//! ```rust
//! use geosurvey::{AnalyticsService, MemoryStore, PointFilter, PointStatus, SurveyPoint};
//! use std::time::SystemTime;
//!
//! let mut store = MemoryStore::new();
//! store.add_point(SurveyPoint {
//!     id: 1,
//!     campaign_id: 1,
//!     metric: "soil_ph".to_string(),
//!     value: 6.8,
//!     latitude: 55.6761,
//!     longitude: 12.5683,
//!     status: PointStatus::Approved,
//!     collected_at: SystemTime::now(),
//! });
//!
//! let service = AnalyticsService::new(store.clone(), store);
//! let nearest = service.k_nearest(&PointFilter::campaign(1), 55.6761, 12.5683, 5)?;
//! assert_eq!(nearest.len(), 1);
//! # Ok::<(), geosurvey::GeoSurveyError>(())
//! ```

pub mod aggregate;
pub mod analytics;
pub mod cluster;
pub mod error;
pub mod geometry;
pub mod index;
pub mod stats;
pub mod store;
pub mod tessellate;
pub mod types;

pub use analytics::AnalyticsService;
pub use error::{GeoSurveyError, Result};

pub use geo::{Point, Polygon, Rect};

pub use aggregate::{MIN_CELL_POINTS, grid_heatmap, zone_statistics};
pub use cluster::{ClusterParams, EpsilonMetric, dbscan};
pub use geometry::{EARTH_RADIUS_METERS, convex_hull, haversine_distance, point_in_polygon};
pub use index::{Neighbor, SpatialIndex};
pub use store::{MemoryStore, PointFilter, PointStore, ZoneStore};
pub use tessellate::{convex_hull_feature, voronoi_features};

pub use types::{
    AnalyticsConfig, ClusterResult, DistributionSummary, GridCell, NearestNeighbor, PointStatus,
    SurveyPoint, TrendSummary, Zone, ZoneStatistics,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{AnalyticsService, GeoSurveyError, Result};

    pub use geo::{Point, Polygon, Rect};

    pub use crate::cluster::{ClusterParams, EpsilonMetric};

    pub use crate::{AnalyticsConfig, PointStatus, SurveyPoint, Zone};

    pub use crate::{MemoryStore, PointFilter, PointStore, ZoneStore};

    pub use crate::geometry::haversine_distance;
}
