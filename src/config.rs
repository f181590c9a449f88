// src/config.rs

use crate::types::{AppConfig, DetectionResult, PolygonDatum};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;

impl AppConfig {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        let config: AppConfig =
            serde_yaml::from_str(&contents).with_context(|| format!("parsing {path}"))?;
        Ok(config)
    }
}

/// Loads the stall calibration polygons, shipped as a JSON array of
/// `{id, points: [[x, y], ...]}` records in the reference image space.
pub fn load_polygons(path: &str) -> Result<HashMap<String, PolygonDatum>> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let polygons: Vec<PolygonDatum> =
        serde_json::from_str(&contents).with_context(|| format!("parsing {path}"))?;
    Ok(polygons.into_iter().map(|p| (p.id.clone(), p)).collect())
}

/// Loads a detection snapshot for the demo binary.
pub fn load_detections(path: &str) -> Result<Vec<DetectionResult>> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let detections: Vec<DetectionResult> =
        serde_json::from_str(&contents).with_context(|| format!("parsing {path}"))?;
    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_artifact_round_trip() {
        let raw = r#"[{"id": "A1", "points": [[10.0, 250.0], [50.0, 250.0], [50.0, 280.0], [10.0, 280.0]]}]"#;
        let polygons: Vec<PolygonDatum> = serde_json::from_str(raw).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].id, "A1");
        assert_eq!(polygons[0].points.len(), 4);
        assert_eq!(polygons[0].points[2], [50.0, 280.0]);
    }

    #[test]
    fn test_detection_snapshot_parses() {
        let raw = r#"[{"id": "A1", "row": "A", "label": "empty", "confidence": 0.91}]"#;
        let detections: Vec<DetectionResult> = serde_json::from_str(raw).unwrap();
        assert_eq!(detections[0].row, "A");
        assert!(detections[0].label.is_empty());
    }
}
