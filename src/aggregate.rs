//! Zone-bounded statistics and grid-heatmap aggregation.

use crate::error::{GeoSurveyError, Result};
use crate::geometry::point_in_polygon;
use crate::stats;
use crate::types::{GridCell, SurveyPoint, Zone, ZoneStatistics};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Cells with fewer points than this are suppressed from heatmap
/// output. Deliberate noise-reduction policy.
pub const MIN_CELL_POINTS: usize = 3;

/// Descriptive statistics per (zone, metric) pair.
///
/// Each point is tested against each zone's polygon; contained points
/// are grouped by metric and summarized. Pairs with zero contained
/// points are omitted rather than emitted with zero counts. Zones with
/// invalid rings are skipped with a warning, never fatally. The engine
/// is status-agnostic: any status filtering happens in the snapshot the
/// caller passes in.
///
/// Output is ordered by (zone name, metric name).
pub fn zone_statistics(points: &[SurveyPoint], zones: &[Zone]) -> Vec<ZoneStatistics> {
    let mut results = Vec::new();

    for zone in zones {
        let Some(polygon) = zone.to_polygon() else {
            log::warn!(
                "skipping zone {} ({:?}): boundary is not a closed ring of at least 4 points",
                zone.id,
                zone.name
            );
            continue;
        };

        // Group contained point values by metric, deterministically
        let mut by_metric: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for point in points {
            if point_in_polygon(&polygon, &point.position()) {
                by_metric.entry(&point.metric).or_default().push(point.value);
            }
        }

        for (metric, values) in by_metric {
            let Some(summary) = stats::summarize(&values) else {
                continue;
            };
            results.push(ZoneStatistics {
                zone_name: zone.name.clone(),
                metric_name: metric.to_string(),
                point_count: summary.count,
                avg_value: summary.mean,
                min_value: summary.min,
                max_value: summary.max,
                stddev_value: summary.std_dev,
            });
        }
    }

    results.sort_by(|a, b| {
        a.zone_name
            .cmp(&b.zone_name)
            .then_with(|| a.metric_name.cmp(&b.metric_name))
    });
    results
}

/// Aggregate points into a regular grid of `cell_size_degrees` cells.
///
/// Cells are aligned to a fixed global origin (integer multiples of the
/// cell size from (0, 0)), so identical cell boundaries are reproduced
/// across calls: a point lands in cell `(floor(lon / size),
/// floor(lat / size))`. Reported coordinates are the cell's geometric
/// center. Only cells holding at least [`MIN_CELL_POINTS`] points are
/// emitted; output is sorted by (cell latitude, cell longitude).
pub fn grid_heatmap(points: &[SurveyPoint], cell_size_degrees: f64) -> Result<Vec<GridCell>> {
    if !cell_size_degrees.is_finite() || cell_size_degrees <= 0.0 {
        return Err(GeoSurveyError::InvalidInput(format!(
            "cell size must be positive and finite, got {}",
            cell_size_degrees
        )));
    }

    let mut cells: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();
    for (slot, point) in points.iter().enumerate() {
        if !point.longitude.is_finite() || !point.latitude.is_finite() {
            log::warn!("skipping point {} with non-finite coordinates", point.id);
            continue;
        }
        let col = (point.longitude / cell_size_degrees).floor() as i64;
        let row = (point.latitude / cell_size_degrees).floor() as i64;
        cells.entry((col, row)).or_default().push(slot);
    }

    let mut results: Vec<GridCell> = cells
        .into_iter()
        .filter(|(_, slots)| slots.len() >= MIN_CELL_POINTS)
        .map(|((col, row), slots)| {
            let values: Vec<f64> = slots.iter().map(|&s| points[s].value).collect();
            let mut point_ids: Vec<i64> = slots.iter().map(|&s| points[s].id).collect();
            point_ids.sort_unstable();
            GridCell {
                longitude: (col as f64 + 0.5) * cell_size_degrees,
                latitude: (row as f64 + 0.5) * cell_size_degrees,
                point_count: point_ids.len(),
                point_ids,
                // Non-empty by the threshold filter
                avg_value: stats::mean(&values).unwrap_or(0.0),
                stddev_value: stats::population_std_dev(&values).unwrap_or(0.0),
            }
        })
        .collect();

    results.sort_by(|a, b| {
        a.latitude
            .partial_cmp(&b.latitude)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.longitude
                    .partial_cmp(&b.longitude)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    Ok(results)
}
