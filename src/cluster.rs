//! Density-based clustering (DBSCAN) over a point snapshot.
//!
//! Epsilon is measured in raw coordinate degrees by default for
//! compatibility with callers whose epsilon values were tuned
//! empirically against that metric (0.01 degrees is roughly 1 km near
//! 55 degrees latitude, less toward the poles). The geodesic
//! alternative is available as an explicit opt-in.

use crate::error::{GeoSurveyError, Result};
use crate::index::SpatialIndex;
use crate::types::{ClusterResult, SurveyPoint};
use std::collections::VecDeque;

/// Distance semantics for the DBSCAN neighborhood radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpsilonMetric {
    /// Planar Euclidean distance in (lon, lat) degree space.
    /// Compatibility default; distorts at high latitude.
    #[default]
    Degrees,
    /// Great-circle haversine distance in meters
    Meters,
}

/// Parameters for one clustering call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Neighborhood radius, in the unit selected by `epsilon_metric`
    pub epsilon: f64,
    /// Minimum neighborhood size (including the point itself) for a
    /// core point
    pub min_points: usize,
    pub epsilon_metric: EpsilonMetric,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            min_points: 5,
            epsilon_metric: EpsilonMetric::Degrees,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Label {
    Unvisited,
    Noise,
    Cluster(usize),
}

/// Run DBSCAN over a snapshot.
///
/// Standard semantics: each unvisited point with at least `min_points`
/// neighbors within `epsilon` seeds a cluster, which expands
/// breadth-first through density-reachable points. Border points join
/// the cluster that reaches them first, including points previously
/// marked noise. Noise is excluded from the output, and only clusters
/// that still hold at least `min_points` members are returned, with
/// ids assigned in discovery order starting at 0.
///
/// Empty input or no dense region is a normal outcome and yields an
/// empty vector. Invalid parameters (`epsilon <= 0`, non-finite
/// epsilon, `min_points == 0`) are programmer errors.
pub fn dbscan(points: &[SurveyPoint], params: &ClusterParams) -> Result<Vec<ClusterResult>> {
    if !params.epsilon.is_finite() || params.epsilon <= 0.0 {
        return Err(GeoSurveyError::InvalidInput(format!(
            "epsilon must be positive and finite, got {}",
            params.epsilon
        )));
    }
    if params.min_points == 0 {
        return Err(GeoSurveyError::InvalidInput(
            "min_points must be at least 1".to_string(),
        ));
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let index = SpatialIndex::build(points);
    let neighbors_of = |slot: usize| -> Vec<usize> {
        let p = &points[slot];
        match params.epsilon_metric {
            EpsilonMetric::Degrees => index.within_degrees(p.longitude, p.latitude, params.epsilon),
            EpsilonMetric::Meters => {
                index.within_radius_meters(p.latitude, p.longitude, params.epsilon)
            }
        }
    };

    let mut labels = vec![Label::Unvisited; points.len()];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for seed in 0..points.len() {
        if labels[seed] != Label::Unvisited {
            continue;
        }
        let neighbors = neighbors_of(seed);
        if neighbors.len() < params.min_points {
            labels[seed] = Label::Noise;
            continue;
        }

        // Core point: start a cluster and expand breadth-first
        let cluster_id = clusters.len();
        labels[seed] = Label::Cluster(cluster_id);
        let mut members = vec![seed];
        let mut queue: VecDeque<usize> = neighbors.into_iter().filter(|&s| s != seed).collect();

        while let Some(slot) = queue.pop_front() {
            match labels[slot] {
                Label::Cluster(_) => continue,
                Label::Noise => {
                    // Border point absorbed from earlier noise
                    labels[slot] = Label::Cluster(cluster_id);
                    members.push(slot);
                }
                Label::Unvisited => {
                    labels[slot] = Label::Cluster(cluster_id);
                    members.push(slot);
                    let expansion = neighbors_of(slot);
                    if expansion.len() >= params.min_points {
                        queue.extend(expansion.into_iter().filter(|&s| {
                            matches!(labels[s], Label::Unvisited | Label::Noise)
                        }));
                    }
                }
            }
        }

        clusters.push(members);
    }

    // Border points claimed by earlier clusters can shrink a later
    // cluster below the threshold; such clusters are dropped.
    clusters.retain(|members| members.len() >= params.min_points);

    let results = clusters
        .into_iter()
        .enumerate()
        .map(|(cluster_id, members)| {
            let count = members.len() as f64;
            let mut point_ids: Vec<i64> = members.iter().map(|&s| points[s].id).collect();
            point_ids.sort_unstable();
            let avg_value = members.iter().map(|&s| points[s].value).sum::<f64>() / count;
            let center_latitude = members.iter().map(|&s| points[s].latitude).sum::<f64>() / count;
            let center_longitude =
                members.iter().map(|&s| points[s].longitude).sum::<f64>() / count;
            ClusterResult {
                cluster_id,
                point_count: point_ids.len(),
                point_ids,
                avg_value,
                center_latitude,
                center_longitude,
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "dbscan: {} points -> {} clusters (epsilon {}, min_points {})",
        points.len(),
        results.len(),
        params.epsilon,
        params.min_points
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointStatus;
    use std::time::SystemTime;

    fn point(id: i64, latitude: f64, longitude: f64, value: f64) -> SurveyPoint {
        SurveyPoint {
            id,
            campaign_id: 1,
            metric: "soil_ph".to_string(),
            value,
            latitude,
            longitude,
            status: PointStatus::Approved,
            collected_at: SystemTime::now(),
        }
    }

    /// Six points tightly packed around a center.
    fn dense_group(first_id: i64, latitude: f64, longitude: f64) -> Vec<SurveyPoint> {
        (0..6)
            .map(|i| {
                point(
                    first_id + i,
                    latitude + (i as f64) * 0.0005,
                    longitude + (i as f64) * 0.0005,
                    50.0 + i as f64,
                )
            })
            .collect()
    }

    #[test]
    fn test_two_separated_groups() {
        let mut points = dense_group(1, 55.67, 12.56);
        points.extend(dense_group(101, 56.67, 13.56));

        let params = ClusterParams {
            epsilon: 0.01,
            min_points: 5,
            epsilon_metric: EpsilonMetric::Degrees,
        };
        let clusters = dbscan(&points, &params).unwrap();

        assert_eq!(clusters.len(), 2);
        for cluster in &clusters {
            assert!(cluster.point_count >= 5);
        }
        let total: usize = clusters.iter().map(|c| c.point_count).sum();
        assert_eq!(total, 12, "all dense points should be clustered");
    }

    #[test]
    fn test_clusters_disjoint() {
        let mut points = dense_group(1, 55.67, 12.56);
        points.extend(dense_group(101, 55.68, 12.58));
        points.push(point(999, 60.0, 20.0, 1.0));

        let clusters = dbscan(&points, &ClusterParams::default()).unwrap();

        let mut seen = std::collections::HashSet::new();
        for cluster in &clusters {
            for id in &cluster.point_ids {
                assert!(seen.insert(*id), "point {} in more than one cluster", id);
            }
        }
        assert!(!seen.contains(&999), "isolated point must stay noise");
    }

    #[test]
    fn test_cluster_ids_sequential() {
        let mut points = dense_group(1, 55.0, 12.0);
        points.extend(dense_group(101, 56.0, 13.0));
        points.extend(dense_group(201, 57.0, 14.0));

        let clusters = dbscan(&points, &ClusterParams::default()).unwrap();
        let ids: Vec<usize> = clusters.iter().map(|c| c.cluster_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_centroid_is_arithmetic_mean() {
        let points = vec![
            point(1, 55.0, 12.0, 10.0),
            point(2, 55.002, 12.0, 20.0),
            point(3, 55.004, 12.0, 30.0),
        ];
        let params = ClusterParams {
            epsilon: 0.01,
            min_points: 2,
            epsilon_metric: EpsilonMetric::Degrees,
        };
        let clusters = dbscan(&points, &params).unwrap();
        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert!((cluster.center_latitude - 55.002).abs() < 1e-9);
        assert!((cluster.center_longitude - 12.0).abs() < 1e-9);
        assert_eq!(cluster.avg_value, 20.0);
        assert_eq!(cluster.point_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_all_noise() {
        let points = vec![
            point(1, 55.0, 12.0, 1.0),
            point(2, 56.0, 13.0, 2.0),
            point(3, 57.0, 14.0, 3.0),
        ];
        let clusters = dbscan(&points, &ClusterParams::default()).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let clusters = dbscan(&[], &ClusterParams::default()).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_invalid_params() {
        let points = dense_group(1, 55.0, 12.0);
        let bad_epsilon = ClusterParams {
            epsilon: 0.0,
            ..ClusterParams::default()
        };
        assert!(dbscan(&points, &bad_epsilon).is_err());

        let bad_min_points = ClusterParams {
            min_points: 0,
            ..ClusterParams::default()
        };
        assert!(dbscan(&points, &bad_min_points).is_err());
    }

    #[test]
    fn test_meter_epsilon_mode() {
        // Same two groups, with the radius given in meters
        let mut points = dense_group(1, 55.67, 12.56);
        points.extend(dense_group(101, 56.67, 13.56));

        let params = ClusterParams {
            epsilon: 1_000.0,
            min_points: 5,
            epsilon_metric: EpsilonMetric::Meters,
        };
        let clusters = dbscan(&points, &params).unwrap();
        assert_eq!(clusters.len(), 2);
    }
}
