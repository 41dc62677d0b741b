//! Geometric primitives used by every analytics engine.
//!
//! Distance is always great-circle (haversine) in meters; containment
//! and hull construction are planar in (lon, lat) space, an acceptable
//! approximation for the sub-degree extents of a survey campaign.

use geo::{BoundingRect, Contains, Coord, GeodesicArea, LineString, Point, Polygon, Rect, coord};
use std::cmp::Ordering;

/// Earth radius in meters for haversine distance calculations
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two (lon, lat) points in meters.
///
/// This is the canonical distance metric of the engine: planar
/// Euclidean distance distorts with latitude at city/country scale.
///
/// # Examples
///
/// ```rust
/// use geo::Point;
/// use geosurvey::geometry::haversine_distance;
///
/// let nyc = Point::new(-74.0060, 40.7128);
/// let la = Point::new(-118.2437, 34.0522);
/// let dist = haversine_distance(&nyc, &la);
/// assert!(dist > 3_900_000.0 && dist < 4_000_000.0);
/// ```
pub fn haversine_distance(p1: &Point, p2: &Point) -> f64 {
    let lat1_rad = p1.y().to_radians();
    let lat2_rad = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Check whether a point lies inside a polygon.
///
/// Winding-based test, planar in (lon, lat) space. Points exactly on
/// the boundary are treated as outside; the same convention applies
/// everywhere in the engine.
pub fn point_in_polygon(polygon: &Polygon, point: &Point) -> bool {
    polygon.contains(point)
}

/// Geodesic area of a polygon in square meters (Karney 2013).
pub fn polygon_area_square_meters(polygon: &Polygon) -> f64 {
    polygon.geodesic_area_unsigned()
}

/// Convex hull of a point set via monotone chain.
///
/// Input points are deduplicated and sorted lexicographically by
/// (lon, lat), which makes the result deterministic for coincident and
/// collinear inputs. The returned polygon's exterior ring is
/// counter-clockwise and closed.
///
/// Returns `None` for degenerate input: fewer than 3 distinct points,
/// or all points collinear. Callers must treat "no hull" as a valid
/// non-error result.
pub fn convex_hull(points: &[Point]) -> Option<Polygon> {
    let mut coords: Vec<Coord> = points.iter().map(|p| p.0).collect();
    coords.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    coords.dedup();
    if coords.len() < 3 {
        return None;
    }

    fn cross(o: Coord, a: Coord, b: Coord) -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    }

    let mut lower: Vec<Coord> = Vec::new();
    for &c in &coords {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], c) <= 0.0 {
            lower.pop();
        }
        lower.push(c);
    }

    let mut upper: Vec<Coord> = Vec::new();
    for &c in coords.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], c) <= 0.0 {
            upper.pop();
        }
        upper.push(c);
    }

    // Chain endpoints are shared; drop them before concatenating.
    lower.pop();
    upper.pop();
    lower.extend(upper);

    if lower.len() < 3 {
        // All input points collinear
        return None;
    }

    let first = lower[0];
    lower.push(first);
    Some(Polygon::new(LineString::from(lower), vec![]))
}

/// Bounding rectangle of a point set, `None` when empty.
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    if points.is_empty() {
        return None;
    }
    geo::MultiPoint::new(points.to_vec()).bounding_rect()
}

/// Expand a rectangle by a fraction of its larger extent on every side.
///
/// A floor of 0.01 degrees keeps the region two-dimensional even when
/// all inputs share a coordinate.
pub fn pad_rect(rect: &Rect, fraction: f64) -> Rect {
    let width = rect.max().x - rect.min().x;
    let height = rect.max().y - rect.min().y;
    let pad = (width.max(height) * fraction).max(0.01);

    Rect::new(
        coord! { x: rect.min().x - pad, y: rect.min().y - pad },
        coord! { x: rect.max().x + pad, y: rect.max().y + pad },
    )
}
