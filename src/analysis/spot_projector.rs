// src/analysis/spot_projector.rs
//
// Projects pixel-space stall detections into geocoordinates around a camera.
//
// The detector reports stalls against a fixed 400x287 reference image. Each
// stall id has a calibration polygon in that space; the centroid's
// normalized position plus the stall's row tag drive a depth and bearing
// estimate from the camera, which is converted to a lat/lng offset with
// flat-earth meter-per-degree constants for the deployment's latitude band.

use crate::geo;
use crate::types::{Camera, DetectionResult, LatLng, PolygonDatum, ProjectedSpot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Meters per degree of latitude.
const METERS_PER_DEG_LAT: f64 = 111_111.0;
/// Meters per degree of longitude at the deployment's ~37.7 N band.
const METERS_PER_DEG_LNG: f64 = 87_900.0;

// ============================================================================
// CONFIG
// ============================================================================

/// Ground geometry of one stall row as seen from the camera.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RowGeometry {
    /// Depth from the camera to the row's reference line, meters.
    pub base_depth_m: f64,
    /// Bearing of the row's left edge relative to true north, degrees.
    pub base_angle_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectorConfig {
    /// Reference image dimensions the polygons are calibrated against.
    pub image_width: f64,
    pub image_height: f64,
    /// Extra depth applied as a stall sits higher in the frame, meters.
    pub vertical_adjust_m: f64,
    /// Angular spread one row covers across the frame width, degrees.
    pub angle_spread_deg: f64,
    pub rows: HashMap<String, RowGeometry>,
    /// Geometry used when a detection names a row missing from `rows`.
    pub fallback_row: RowGeometry,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        let mut rows = HashMap::new();
        rows.insert(
            "A".to_string(),
            RowGeometry {
                base_depth_m: 6.0,
                base_angle_deg: -40.0,
            },
        );
        rows.insert(
            "B".to_string(),
            RowGeometry {
                base_depth_m: 12.0,
                base_angle_deg: -35.0,
            },
        );
        rows.insert(
            "C".to_string(),
            RowGeometry {
                base_depth_m: 18.0,
                base_angle_deg: -30.0,
            },
        );
        Self {
            image_width: 400.0,
            image_height: 287.0,
            vertical_adjust_m: 5.0,
            angle_spread_deg: 70.0,
            rows,
            fallback_row: RowGeometry {
                base_depth_m: 12.0,
                base_angle_deg: -35.0,
            },
        }
    }
}

// ============================================================================
// PROJECTOR
// ============================================================================

pub struct SpotProjector {
    config: ProjectorConfig,
}

impl SpotProjector {
    pub fn new(config: ProjectorConfig) -> Self {
        Self { config }
    }

    /// Geocodes every detection around the camera, order preserved.
    ///
    /// A detection whose stall id has no calibration polygon is projected
    /// from a zero centroid instead of being dropped.
    pub fn project(
        &self,
        camera: &Camera,
        detections: &[DetectionResult],
        polygons: &HashMap<String, PolygonDatum>,
    ) -> Vec<ProjectedSpot> {
        detections
            .iter()
            .map(|det| self.project_one(camera, det, polygons))
            .collect()
    }

    fn project_one(
        &self,
        camera: &Camera,
        det: &DetectionResult,
        polygons: &HashMap<String, PolygonDatum>,
    ) -> ProjectedSpot {
        let (centroid, norm) = match polygons.get(&det.id) {
            Some(poly) => {
                let c = polygon_centroid(&poly.points);
                (
                    c,
                    [c[0] / self.config.image_width, c[1] / self.config.image_height],
                )
            }
            None => {
                debug!("no calibration polygon for stall {}, using zero centroid", det.id);
                ([0.0, 0.0], [0.0, 0.0])
            }
        };

        let row = self
            .config
            .rows
            .get(&det.row)
            .copied()
            .unwrap_or(self.config.fallback_row);

        // Stalls higher in the frame sit deeper in the lot.
        let depth_m = row.base_depth_m + (1.0 - norm[1]) * self.config.vertical_adjust_m;
        let angle_rad = (row.base_angle_deg + norm[0] * self.config.angle_spread_deg).to_radians();

        let lat = camera.lat + depth_m * angle_rad.cos() / METERS_PER_DEG_LAT;
        let lng = camera.lng + depth_m * angle_rad.sin() / METERS_PER_DEG_LNG;
        let distance_from_camera_m = geo::distance_m(camera.position(), LatLng::new(lat, lng));

        ProjectedSpot {
            id: det.id.clone(),
            row: det.row.clone(),
            label: det.label,
            confidence: det.confidence,
            lat,
            lng,
            distance_from_camera_m,
            polygon_centroid: centroid,
        }
    }
}

fn polygon_centroid(points: &[[f64; 2]]) -> [f64; 2] {
    if points.is_empty() {
        return [0.0, 0.0];
    }
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p[0]).sum();
    let sum_y: f64 = points.iter().map(|p| p[1]).sum();
    [sum_x / n, sum_y / n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpotLabel;

    fn camera() -> Camera {
        Camera {
            id: "cam-01".to_string(),
            name: "Test Camera".to_string(),
            lot_name: "test_lot".to_string(),
            lat: 37.78241,
            lng: -122.40297,
        }
    }

    fn detection(id: &str, row: &str) -> DetectionResult {
        DetectionResult {
            id: id.to_string(),
            row: row.to_string(),
            label: SpotLabel::Empty,
            confidence: 0.9,
        }
    }

    fn square_polygon(id: &str, x: f64, y: f64) -> PolygonDatum {
        PolygonDatum {
            id: id.to_string(),
            points: vec![[x, y], [x + 20.0, y], [x + 20.0, y + 20.0], [x, y + 20.0]],
        }
    }

    #[test]
    fn test_centroid_of_square() {
        let poly = square_polygon("A1", 100.0, 200.0);
        assert_eq!(polygon_centroid(&poly.points), [110.0, 210.0]);
    }

    #[test]
    fn test_order_preserved_and_offset_applied() {
        let projector = SpotProjector::new(ProjectorConfig::default());
        let cam = camera();
        let mut polygons = HashMap::new();
        polygons.insert("A1".to_string(), square_polygon("A1", 40.0, 240.0));
        polygons.insert("A2".to_string(), square_polygon("A2", 120.0, 240.0));

        let detections = vec![detection("A1", "A"), detection("A2", "A")];
        let spots = projector.project(&cam, &detections, &polygons);

        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].id, "A1");
        assert_eq!(spots[1].id, "A2");
        for spot in &spots {
            assert!(spot.lat != cam.lat || spot.lng != cam.lng);
            assert!(spot.distance_from_camera_m > 0.0);
        }
    }

    #[test]
    fn test_missing_polygon_falls_back_to_zero_centroid() {
        let projector = SpotProjector::new(ProjectorConfig::default());
        let cam = camera();
        let polygons = HashMap::new();

        let spots = projector.project(&cam, &[detection("ghost", "A")], &polygons);
        assert_eq!(spots[0].polygon_centroid, [0.0, 0.0]);
        // Zero normalized y means the full vertical adjustment applies.
        let expected_depth = 6.0 + 5.0;
        assert!((spots[0].distance_from_camera_m - expected_depth).abs() < 0.5);
    }

    #[test]
    fn test_far_row_projects_deeper_than_near_row() {
        let projector = SpotProjector::new(ProjectorConfig::default());
        let cam = camera();
        let mut polygons = HashMap::new();
        polygons.insert("A1".to_string(), square_polygon("A1", 180.0, 140.0));
        polygons.insert("C1".to_string(), square_polygon("C1", 180.0, 140.0));

        let spots = projector.project(
            &cam,
            &[detection("A1", "A"), detection("C1", "C")],
            &polygons,
        );
        assert!(spots[1].distance_from_camera_m > spots[0].distance_from_camera_m);
    }

    #[test]
    fn test_unknown_row_uses_fallback_geometry() {
        let projector = SpotProjector::new(ProjectorConfig::default());
        let cam = camera();
        let mut polygons = HashMap::new();
        polygons.insert("X1".to_string(), square_polygon("X1", 180.0, 140.0));
        polygons.insert("B1".to_string(), square_polygon("B1", 180.0, 140.0));

        let spots = projector.project(
            &cam,
            &[detection("X1", "Z"), detection("B1", "B")],
            &polygons,
        );
        // Fallback geometry matches row B, so both stalls land together.
        assert!((spots[0].lat - spots[1].lat).abs() < 1e-9);
        assert!((spots[0].lng - spots[1].lng).abs() < 1e-9);
    }
}
