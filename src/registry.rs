// src/registry.rs
//
// Static registries: cameras, crowdsourced street spots, alternative lots.
// All of them are read-only after construction; the production datasets live
// behind `Default` so tests can inject fixtures instead.

use crate::geo;
use crate::types::{AlternativeLot, Camera, CrowdsourceSpot, LatLng};
use std::cmp::Ordering;

// ============================================================================
// CAMERAS
// ============================================================================

#[derive(Debug, Clone)]
pub struct CameraRegistry {
    cameras: Vec<Camera>,
}

impl CameraRegistry {
    pub fn new(cameras: Vec<Camera>) -> Self {
        Self { cameras }
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Nearest camera to a point, with its distance in meters.
    pub fn nearest(&self, point: LatLng) -> Option<(&Camera, f64)> {
        self.cameras
            .iter()
            .map(|c| (c, geo::distance_m(point, c.position())))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
    }
}

impl Default for CameraRegistry {
    fn default() -> Self {
        Self::new(vec![
            Camera {
                id: "cam-01".to_string(),
                name: "Harrison Street Lot North".to_string(),
                lot_name: "harrison_lot".to_string(),
                lat: 37.78241,
                lng: -122.40297,
            },
            Camera {
                id: "cam-02".to_string(),
                name: "Harrison Street Lot South".to_string(),
                lot_name: "harrison_lot".to_string(),
                lat: 37.78195,
                lng: -122.40334,
            },
            Camera {
                id: "cam-03".to_string(),
                name: "Folsom Street Lot".to_string(),
                lot_name: "folsom_lot".to_string(),
                lat: 37.78512,
                lng: -122.39874,
            },
        ])
    }
}

// ============================================================================
// CROWDSOURCED STREET SPOTS
// ============================================================================

#[derive(Debug, Clone)]
pub struct CrowdsourceRegistry {
    spots: Vec<CrowdsourceSpot>,
}

impl CrowdsourceRegistry {
    pub fn new(spots: Vec<CrowdsourceSpot>) -> Self {
        Self { spots }
    }

    /// Spots within `radius_m` of a point, nearest first.
    pub fn near(&self, point: LatLng, radius_m: f64) -> Vec<(&CrowdsourceSpot, f64)> {
        let mut hits: Vec<(&CrowdsourceSpot, f64)> = self
            .spots
            .iter()
            .map(|s| (s, geo::distance_m(point, s.position())))
            .filter(|(_, d)| *d <= radius_m)
            .collect();
        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        hits
    }
}

impl Default for CrowdsourceRegistry {
    fn default() -> Self {
        Self::new(vec![
            CrowdsourceSpot {
                id: "cs-101".to_string(),
                lat: 37.77996,
                lng: -122.40512,
                name: "Bryant at 5th curb".to_string(),
                neighborhood: "SoMa".to_string(),
            },
            CrowdsourceSpot {
                id: "cs-102".to_string(),
                lat: 37.77821,
                lng: -122.40784,
                name: "Folsom at 6th curb".to_string(),
                neighborhood: "SoMa".to_string(),
            },
            CrowdsourceSpot {
                id: "cs-103".to_string(),
                lat: 37.78321,
                lng: -122.40101,
                name: "Howard at 4th curb".to_string(),
                neighborhood: "SoMa".to_string(),
            },
            CrowdsourceSpot {
                id: "cs-104".to_string(),
                lat: 37.76142,
                lng: -122.42175,
                name: "Valencia at 18th curb".to_string(),
                neighborhood: "Mission".to_string(),
            },
        ])
    }
}

// ============================================================================
// ALTERNATIVE LOTS
// ============================================================================

#[derive(Debug, Clone)]
pub struct AlternativeLotRegistry {
    lots: Vec<AlternativeLot>,
}

impl AlternativeLotRegistry {
    pub fn new(lots: Vec<AlternativeLot>) -> Self {
        Self { lots }
    }

    pub fn lots(&self) -> &[AlternativeLot] {
        &self.lots
    }
}

impl Default for AlternativeLotRegistry {
    fn default() -> Self {
        Self::new(vec![
            AlternativeLot {
                id: "alt-01".to_string(),
                name: "5th and Mission Garage".to_string(),
                lat: 37.78215,
                lng: -122.40511,
                estimated_drive_minutes: 6.0,
                estimated_confidence: 0.85,
                total_spots: 2585,
                typical_open_spots: 240,
            },
            AlternativeLot {
                id: "alt-02".to_string(),
                name: "Moscone Center Garage".to_string(),
                lat: 37.78403,
                lng: -122.40175,
                estimated_drive_minutes: 9.0,
                estimated_confidence: 0.72,
                total_spots: 732,
                typical_open_spots: 60,
            },
            AlternativeLot {
                id: "alt-03".to_string(),
                name: "SoMa Grand Lot".to_string(),
                lat: 37.77905,
                lng: -122.40990,
                estimated_drive_minutes: 4.0,
                estimated_confidence: 0.55,
                total_spots: 140,
                typical_open_spots: 12,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_picks_closest_camera() {
        let registry = CameraRegistry::default();
        // Right next to cam-03.
        let (camera, distance) = registry.nearest(LatLng::new(37.78510, -122.39880)).unwrap();
        assert_eq!(camera.id, "cam-03");
        assert!(distance < 20.0, "distance {distance}");
    }

    #[test]
    fn test_empty_registry_has_no_nearest() {
        let registry = CameraRegistry::new(Vec::new());
        assert!(registry.nearest(LatLng::new(37.78, -122.40)).is_none());
    }

    #[test]
    fn test_crowdsource_radius_filters_and_sorts() {
        let registry = CrowdsourceRegistry::default();
        let hits = registry.near(LatLng::new(37.78150, -122.40388), 500.0);
        // The Mission spot sits kilometers away and must not appear.
        assert!(hits.iter().all(|(s, _)| s.id != "cs-104"));
        assert!(!hits.is_empty());
        for pair in hits.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }
}
