//! Per-call spatial index over a point snapshot.
//!
//! Built once per analytics call from the input slice, backed by an
//! R-tree. Radius queries prune with a degree-space envelope before the
//! exact haversine filter; the degree-space neighborhood query serves
//! DBSCAN's coordinate-space epsilon semantics directly.

use crate::geometry::haversine_distance;
use crate::types::SurveyPoint;
use geo::Point;
use rstar::{AABB, Point as RstarPoint, RTree};
use std::cmp::Ordering;

/// A snapshot position wrapped for R-tree indexing.
///
/// Carries the position of the point in the snapshot slice so query
/// results can be mapped back to full records, and the point id for
/// deterministic tie-breaking.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndexedSample {
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    /// Position in the snapshot slice
    pub slot: usize,
    /// Point id, for tie-breaks
    pub id: i64,
}

impl RstarPoint for IndexedSample {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            x: generator(0),
            y: generator(1),
            slot: usize::MAX,
            id: -1,
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!(),
        }
    }
}

/// One K-nearest-neighbors hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the point in the snapshot slice
    pub slot: usize,
    pub distance_meters: f64,
}

/// Read-only spatial index over one point snapshot.
pub struct SpatialIndex {
    tree: RTree<IndexedSample>,
    len: usize,
}

impl SpatialIndex {
    /// Build the index from a snapshot. Points with non-finite
    /// coordinates are skipped with a warning.
    pub fn build(points: &[SurveyPoint]) -> Self {
        let samples: Vec<IndexedSample> = points
            .iter()
            .enumerate()
            .filter_map(|(slot, p)| {
                if !p.longitude.is_finite() || !p.latitude.is_finite() {
                    log::warn!("skipping point {} with non-finite coordinates", p.id);
                    return None;
                }
                Some(IndexedSample {
                    x: p.longitude,
                    y: p.latitude,
                    slot,
                    id: p.id,
                })
            })
            .collect();
        let len = samples.len();
        Self {
            tree: RTree::bulk_load(samples),
            len,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The K nearest points to a coordinate, ascending by haversine
    /// distance, ties broken by point id ascending.
    ///
    /// `k == 0` returns empty; `k` larger than the snapshot returns
    /// everything. Exhaustive scan: the R-tree's degree-space ordering
    /// is not a meter ordering, so all distances are computed exactly.
    pub fn k_nearest(&self, latitude: f64, longitude: f64, k: usize) -> Vec<Neighbor> {
        if k == 0 || !latitude.is_finite() || !longitude.is_finite() {
            return Vec::new();
        }
        let origin = Point::new(longitude, latitude);

        let mut hits: Vec<(Neighbor, i64)> = self
            .tree
            .iter()
            .map(|s| {
                let distance_meters = haversine_distance(&origin, &Point::new(s.x, s.y));
                (
                    Neighbor {
                        slot: s.slot,
                        distance_meters,
                    },
                    s.id,
                )
            })
            .collect();

        hits.sort_by(|a, b| {
            a.0.distance_meters
                .partial_cmp(&b.0.distance_meters)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        hits.truncate(k);
        hits.into_iter().map(|(n, _)| n).collect()
    }

    /// Snapshot slots of all points within `radius_meters` of a
    /// coordinate (boundary inclusive). Unordered.
    ///
    /// A degree-space envelope prunes the R-tree before the exact
    /// haversine filter. A negative or non-finite radius is rejected
    /// with a warning and yields no results.
    pub fn within_radius_meters(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Vec<usize> {
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            log::warn!("rejecting radius query with invalid radius {}", radius_meters);
            return Vec::new();
        }
        if !latitude.is_finite() || !longitude.is_finite() {
            log::warn!("rejecting radius query with non-finite center");
            return Vec::new();
        }

        // 1 degree of latitude is ~111km; longitude shrinks with cos(lat)
        let lat_offset = radius_meters / 111_000.0;
        let cos_lat = latitude.to_radians().cos().abs();
        let lon_offset = if cos_lat < 1e-6 {
            360.0
        } else {
            (radius_meters / (111_000.0 * cos_lat)).min(360.0)
        };

        let envelope = AABB::from_corners(
            IndexedSample {
                x: longitude - lon_offset,
                y: latitude - lat_offset,
                slot: usize::MAX,
                id: -1,
            },
            IndexedSample {
                x: longitude + lon_offset,
                y: latitude + lat_offset,
                slot: usize::MAX,
                id: -1,
            },
        );

        let origin = Point::new(longitude, latitude);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|s| haversine_distance(&origin, &Point::new(s.x, s.y)) <= radius_meters)
            .map(|s| s.slot)
            .collect()
    }

    /// Snapshot slots of all points within `epsilon` coordinate degrees
    /// of a coordinate, measured as planar Euclidean distance in
    /// (lon, lat) space. Unordered.
    ///
    /// This is the DBSCAN neighborhood primitive; the degree-space
    /// metric is deliberate (see `cluster::EpsilonMetric`).
    pub fn within_degrees(&self, longitude: f64, latitude: f64, epsilon: f64) -> Vec<usize> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Vec::new();
        }
        let query = IndexedSample {
            x: longitude,
            y: latitude,
            slot: usize::MAX,
            id: -1,
        };
        self.tree
            .locate_within_distance(query, epsilon * epsilon)
            .map(|s| s.slot)
            .collect()
    }
}
