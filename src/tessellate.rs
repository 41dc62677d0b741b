//! Convex hull and Voronoi tessellation with GeoJSON output.
//!
//! The Voronoi construction clips each site's half-plane intersection
//! against a padded bounding box of the inputs. Exact for the bounded
//! snapshot sizes in scope, with no sweep-line event handling. Output
//! is always a `FeatureCollection` with one feature per site cell.

use crate::geometry::{self, convex_hull, polygon_area_square_meters};
use crate::types::SurveyPoint;
use geo::{Coord, Point, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use rustc_hash::FxHashSet;

/// Square meters per hectare
const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Convex hull of a snapshot as a GeoJSON `Feature`.
///
/// The geometry is a closed `Polygon` ring; properties carry
/// `area_square_meters` and `area_hectares`. Fewer than 3 distinct
/// points, or all points collinear, yield `None` — a valid "no hull"
/// outcome, not an error.
pub fn convex_hull_feature(points: &[SurveyPoint]) -> Option<Feature> {
    let positions: Vec<Point> = points.iter().map(|p| p.position()).collect();
    let hull = convex_hull(&positions)?;
    let area = polygon_area_square_meters(&hull);

    let ring: Vec<Vec<f64>> = hull.exterior().0.iter().map(|c| vec![c.x, c.y]).collect();

    let mut properties = JsonObject::new();
    properties.insert(
        "area_square_meters".to_string(),
        JsonValue::from(area),
    );
    properties.insert(
        "area_hectares".to_string(),
        JsonValue::from(area / SQUARE_METERS_PER_HECTARE),
    );

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Voronoi tessellation of a snapshot as a GeoJSON `FeatureCollection`.
///
/// One feature per distinct site, clipped to the input bounding box
/// padded by `padding_fraction` of its larger extent. Coincident sites
/// are deduplicated, keeping the first point in snapshot order. Fewer
/// than 3 distinct sites yield an empty collection.
///
/// Cell properties: `site_id`, `site_longitude`, `site_latitude`.
pub fn voronoi_features(points: &[SurveyPoint], padding_fraction: f64) -> FeatureCollection {
    let mut seen: FxHashSet<(u64, u64)> = FxHashSet::default();
    let mut sites: Vec<(Coord, i64)> = Vec::new();
    for p in points {
        if !p.longitude.is_finite() || !p.latitude.is_finite() {
            continue;
        }
        if seen.insert((p.longitude.to_bits(), p.latitude.to_bits())) {
            sites.push((Coord { x: p.longitude, y: p.latitude }, p.id));
        }
    }

    if sites.len() < 3 {
        return FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        };
    }

    let site_points: Vec<Point> = sites.iter().map(|(c, _)| Point::from(*c)).collect();
    // Non-empty input, so the bounding rect exists
    let clip = geometry::pad_rect(
        &geometry::bounding_rect(&site_points).expect("non-empty site set"),
        padding_fraction,
    );

    let features = sites
        .iter()
        .filter_map(|&(site, id)| {
            let cell = voronoi_cell(site, &sites, &clip);
            if cell.len() < 3 {
                log::warn!("voronoi cell for site {} collapsed during clipping", id);
                return None;
            }

            let mut ring: Vec<Vec<f64>> = cell.iter().map(|c| vec![c.x, c.y]).collect();
            ring.push(ring[0].clone());

            let mut properties = JsonObject::new();
            properties.insert("site_id".to_string(), JsonValue::from(id));
            properties.insert("site_longitude".to_string(), JsonValue::from(site.x));
            properties.insert("site_latitude".to_string(), JsonValue::from(site.y));

            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// A single Voronoi cell: the clip rectangle cut by the perpendicular
/// bisector of the site against every other site. The returned ring is
/// open (no repeated last vertex), counter-clockwise.
fn voronoi_cell(site: Coord, sites: &[(Coord, i64)], clip: &Rect) -> Vec<Coord> {
    let mut cell = vec![
        Coord { x: clip.min().x, y: clip.min().y },
        Coord { x: clip.max().x, y: clip.min().y },
        Coord { x: clip.max().x, y: clip.max().y },
        Coord { x: clip.min().x, y: clip.max().y },
    ];

    for &(other, _) in sites {
        if other == site {
            continue;
        }
        cell = clip_half_plane(&cell, site, other);
        if cell.len() < 3 {
            break;
        }
    }
    cell
}

/// Sutherland-Hodgman clip of an open ring against the half-plane of
/// points at least as close to `site` as to `other`.
fn clip_half_plane(ring: &[Coord], site: Coord, other: Coord) -> Vec<Coord> {
    let mid_x = (site.x + other.x) / 2.0;
    let mid_y = (site.y + other.y) / 2.0;
    let dx = other.x - site.x;
    let dy = other.y - site.y;
    // Negative on the site's side of the bisector
    let side = |p: &Coord| (p.x - mid_x) * dx + (p.y - mid_y) * dy;

    let mut out = Vec::with_capacity(ring.len() + 1);
    for i in 0..ring.len() {
        let current = ring[i];
        let next = ring[(i + 1) % ring.len()];
        let side_current = side(&current);
        let side_next = side(&next);

        if side_current <= 0.0 {
            out.push(current);
            if side_next > 0.0 {
                out.push(edge_intersection(current, next, side_current, side_next));
            }
        } else if side_next <= 0.0 {
            out.push(edge_intersection(current, next, side_current, side_next));
        }
    }
    out
}

/// Point where the segment from `a` to `b` crosses the bisector, given
/// their signed side values (opposite signs, so the denominator is
/// non-zero).
fn edge_intersection(a: Coord, b: Coord, side_a: f64, side_b: f64) -> Coord {
    let t = side_a / (side_a - side_b);
    Coord {
        x: a.x + t * (b.x - a.x),
        y: a.y + t * (b.y - a.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointStatus;
    use std::time::SystemTime;

    fn point(id: i64, latitude: f64, longitude: f64) -> SurveyPoint {
        SurveyPoint {
            id,
            campaign_id: 1,
            metric: "soil_ph".to_string(),
            value: 1.0,
            latitude,
            longitude,
            status: PointStatus::Approved,
            collected_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_hull_feature_triangle() {
        let points = vec![
            point(1, 55.67, 12.56),
            point(2, 55.67, 12.58),
            point(3, 55.69, 12.57),
        ];
        let feature = convex_hull_feature(&points).expect("triangle hull");

        let geometry = feature.geometry.expect("geometry");
        match geometry.value {
            Value::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            other => panic!("expected polygon, got {:?}", other),
        }

        let properties = feature.properties.expect("properties");
        let area = properties["area_square_meters"].as_f64().unwrap();
        assert!(area > 0.0);
        let hectares = properties["area_hectares"].as_f64().unwrap();
        assert!((hectares - area / 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_hull_feature_degenerate() {
        assert!(convex_hull_feature(&[]).is_none());
        assert!(convex_hull_feature(&[point(1, 55.0, 12.0)]).is_none());
        assert!(
            convex_hull_feature(&[
                point(1, 55.0, 12.0),
                point(2, 55.1, 12.1),
                point(3, 55.2, 12.2),
            ])
            .is_none(),
            "collinear points have no hull"
        );
    }

    #[test]
    fn test_voronoi_cell_count() {
        let points = vec![
            point(1, 55.67, 12.56),
            point(2, 55.67, 12.58),
            point(3, 55.69, 12.57),
            point(4, 55.68, 12.57),
        ];
        let collection = voronoi_features(&points, 0.1);
        assert_eq!(collection.features.len(), 4);
    }

    #[test]
    fn test_voronoi_too_few_sites() {
        let points = vec![point(1, 55.0, 12.0), point(2, 55.1, 12.1)];
        let collection = voronoi_features(&points, 0.1);
        assert!(collection.features.is_empty());
    }

    #[test]
    fn test_voronoi_coincident_sites_deduplicated() {
        let points = vec![
            point(1, 55.67, 12.56),
            point(99, 55.67, 12.56), // duplicate position
            point(2, 55.67, 12.58),
            point(3, 55.69, 12.57),
        ];
        let collection = voronoi_features(&points, 0.1);
        assert_eq!(collection.features.len(), 3);

        let ids: Vec<i64> = collection
            .features
            .iter()
            .map(|f| {
                f.properties.as_ref().unwrap()["site_id"]
                    .as_i64()
                    .unwrap()
            })
            .collect();
        assert!(ids.contains(&1), "first point in snapshot order wins");
        assert!(!ids.contains(&99));
    }

    #[test]
    fn test_voronoi_cells_contain_their_site() {
        use geo::{Contains, LineString, Polygon};

        let points = vec![
            point(1, 55.67, 12.56),
            point(2, 55.67, 12.58),
            point(3, 55.69, 12.57),
            point(4, 55.66, 12.60),
        ];
        let collection = voronoi_features(&points, 0.1);

        for feature in &collection.features {
            let properties = feature.properties.as_ref().unwrap();
            let site = Point::new(
                properties["site_longitude"].as_f64().unwrap(),
                properties["site_latitude"].as_f64().unwrap(),
            );
            let Value::Polygon(ref rings) = feature.geometry.as_ref().unwrap().value else {
                panic!("expected polygon cell");
            };
            let ring: Vec<(f64, f64)> = rings[0].iter().map(|p| (p[0], p[1])).collect();
            let cell = Polygon::new(LineString::from(ring), vec![]);
            assert!(cell.contains(&site), "cell must contain its own site");
        }
    }
}
