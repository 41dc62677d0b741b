//! Collaborator boundary: point and zone snapshot providers.
//!
//! The analytics core never performs I/O itself; it consumes snapshots
//! through these traits. A store is expected to apply soft-delete and
//! status filtering before handing points over — the engines do not
//! re-filter.

use crate::error::Result;
use crate::types::{PointStatus, SurveyPoint, Zone};
use serde::{Deserialize, Serialize};

/// Filter for a point snapshot request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointFilter {
    pub campaign_id: Option<i64>,
    pub metric: Option<String>,
    /// Restrict to these statuses; `None` means all
    pub status_in: Option<Vec<PointStatus>>,
}

impl PointFilter {
    /// Filter for one campaign, all metrics and statuses.
    pub fn campaign(campaign_id: i64) -> Self {
        Self {
            campaign_id: Some(campaign_id),
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    pub fn with_statuses(mut self, statuses: Vec<PointStatus>) -> Self {
        self.status_in = Some(statuses);
        self
    }

    /// Whether a point passes this filter.
    pub fn matches(&self, point: &SurveyPoint) -> bool {
        if let Some(campaign_id) = self.campaign_id
            && point.campaign_id != campaign_id
        {
            return false;
        }
        if let Some(ref metric) = self.metric
            && point.metric != *metric
        {
            return false;
        }
        if let Some(ref statuses) = self.status_in
            && !statuses.contains(&point.status)
        {
            return false;
        }
        true
    }
}

/// Source of point snapshots.
pub trait PointStore {
    fn fetch_points(&self, filter: &PointFilter) -> Result<Vec<SurveyPoint>>;
}

/// Source of zone snapshots, with polygon rings already materialized as
/// coordinate sequences.
pub trait ZoneStore {
    fn fetch_zones(&self, campaign_id: i64) -> Result<Vec<Zone>>;
}

/// In-memory store backing both traits.
///
/// Used by tests and benches, and as the snapshot container for
/// embedders that already hold their records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    points: Vec<SurveyPoint>,
    zones: Vec<Zone>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(points: Vec<SurveyPoint>, zones: Vec<Zone>) -> Self {
        Self { points, zones }
    }

    pub fn add_point(&mut self, point: SurveyPoint) {
        self.points.push(point);
    }

    pub fn add_zone(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

impl PointStore for MemoryStore {
    fn fetch_points(&self, filter: &PointFilter) -> Result<Vec<SurveyPoint>> {
        Ok(self
            .points
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }
}

impl ZoneStore for MemoryStore {
    fn fetch_zones(&self, campaign_id: i64) -> Result<Vec<Zone>> {
        Ok(self
            .zones
            .iter()
            .filter(|z| z.campaign_id == campaign_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn point(id: i64, campaign_id: i64, metric: &str, status: PointStatus) -> SurveyPoint {
        SurveyPoint {
            id,
            campaign_id,
            metric: metric.to_string(),
            value: 1.0,
            latitude: 55.0,
            longitude: 12.0,
            status,
            collected_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_filter_matching() {
        let store = MemoryStore::with_data(
            vec![
                point(1, 1, "soil_ph", PointStatus::Approved),
                point(2, 1, "soil_ph", PointStatus::Draft),
                point(3, 1, "ndvi", PointStatus::Approved),
                point(4, 2, "soil_ph", PointStatus::Approved),
            ],
            vec![],
        );

        let filter = PointFilter::campaign(1)
            .with_metric("soil_ph")
            .with_statuses(vec![PointStatus::Approved]);
        let points = store.fetch_points(&filter).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, 1);
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let store = MemoryStore::with_data(
            vec![
                point(1, 1, "soil_ph", PointStatus::Approved),
                point(2, 2, "ndvi", PointStatus::Draft),
            ],
            vec![],
        );
        let points = store.fetch_points(&PointFilter::default()).unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_zones_by_campaign() {
        let zone = |id, campaign_id| Zone {
            id,
            campaign_id,
            name: format!("zone-{}", id),
            boundary: vec![
                (12.0, 55.0),
                (12.1, 55.0),
                (12.1, 55.1),
                (12.0, 55.0),
            ],
        };
        let store = MemoryStore::with_data(vec![], vec![zone(1, 1), zone(2, 2)]);
        let zones = store.fetch_zones(1).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, 1);
    }
}
