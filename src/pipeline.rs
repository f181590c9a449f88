// src/pipeline.rs
//
// End-to-end recommendation pipeline.
//
// Wires the analysis stages together once per request. Every stage is a
// pure function of the request plus the injected registries, so concurrent
// requests share nothing mutable and the engine needs no locking.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{
    OccupancyVariator, RerouteDecisionMaker, SpotProjector, SpotRanker, TrafficSimulator,
};
use crate::geo::round1;
use crate::legality::{Classification, LegalEvaluator, LegalStatus, DEFAULT_PARKING_DURATION_MIN};
use crate::registry::{AlternativeLotRegistry, CameraRegistry, CrowdsourceRegistry};
use crate::types::{
    Camera, LatLng, LotSummary, PolygonDatum, ProjectedSpot, Recommendation,
    RecommendationRequest, RerouteDecision,
};

/// Crowdsourced spots further than this from the requester stay out of the
/// work-scenario legal context, meters.
const WORK_CONTEXT_RADIUS_M: f64 = 500.0;
/// How many ranked stalls get a work-scenario classification.
const WORK_CLASSIFIED_SPOTS: usize = 5;
/// Crowdsourced spots have no detector behind them; grade them at even odds.
const STREET_CONFIDENCE: f64 = 0.5;
/// Demo override values. Low rewrites every recommendation first; high then
/// rewrites only the first entry.
const FORCED_LOW_CONFIDENCE: f64 = 0.15;
const FORCED_HIGH_CONFIDENCE: f64 = 0.92;

// ============================================================================
// ERRORS
// ============================================================================

/// Request failures surfaced to the caller. Everything else in the core
/// degrades to a well-defined output instead of erroring.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotOrigin {
    CameraLot,
    Street,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalContextEntry {
    pub location_id: String,
    pub name: String,
    pub origin: SpotOrigin,
    pub distance_m: f64,
    pub legal: LegalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRecommendation {
    pub location_id: String,
    pub origin: SpotOrigin,
    pub confidence: f64,
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub camera: Camera,
    pub camera_distance_m: f64,
    pub lot_summary: LotSummary,
    pub recommendations: Vec<Recommendation>,
    /// Full annotated spot list, detection order, including occupied stalls.
    pub spots: Vec<ProjectedSpot>,
    pub reroute: RerouteDecision,
    pub simulated_user_count: usize,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_context: Option<Vec<LegalContextEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_recommendations: Option<Vec<WorkRecommendation>>,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct RecommendationEngine {
    projector: SpotProjector,
    traffic: TrafficSimulator,
    ranker: SpotRanker,
    reroute: RerouteDecisionMaker,
    legal: LegalEvaluator,
    cameras: CameraRegistry,
    crowdsource: CrowdsourceRegistry,
    alternatives: AlternativeLotRegistry,
    polygons: HashMap<String, PolygonDatum>,
}

impl RecommendationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        projector: SpotProjector,
        traffic: TrafficSimulator,
        ranker: SpotRanker,
        reroute: RerouteDecisionMaker,
        legal: LegalEvaluator,
        cameras: CameraRegistry,
        crowdsource: CrowdsourceRegistry,
        alternatives: AlternativeLotRegistry,
        polygons: HashMap<String, PolygonDatum>,
    ) -> Self {
        Self {
            projector,
            traffic,
            ranker,
            reroute,
            legal,
            cameras,
            crowdsource,
            alternatives,
            polygons,
        }
    }

    /// Production engine: default component configs and registries plus the
    /// supplied stall calibration polygons.
    pub fn with_defaults(polygons: HashMap<String, PolygonDatum>) -> Self {
        Self::new(
            SpotProjector::new(Default::default()),
            TrafficSimulator::default(),
            SpotRanker::new(Default::default()),
            RerouteDecisionMaker::new(Default::default()),
            LegalEvaluator::default(),
            CameraRegistry::default(),
            CrowdsourceRegistry::default(),
            AlternativeLotRegistry::default(),
            polygons,
        )
    }

    /// Runs one stateless pipeline pass over the request snapshot.
    pub fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, PipelineError> {
        validate(request)?;

        let (camera, camera_distance) = self
            .cameras
            .nearest(request.user)
            .ok_or_else(|| PipelineError::NotFound("no cameras registered".to_string()))?;
        if let Some(radius) = request.options.camera_search_radius_m {
            if camera_distance > radius {
                return Err(PipelineError::NotFound(format!(
                    "no camera within {radius:.0} m of the requested location"
                )));
            }
        }
        info!(
            "camera {} selected, {:.0} m from requester",
            camera.id, camera_distance
        );

        let projected = self
            .projector
            .project(camera, &request.detections, &self.polygons);

        let minute = request.now.minute();
        let mut spots = OccupancyVariator::seeded_variation(&projected, minute);
        if let Some(percent) = request.options.occupancy_target {
            spots = OccupancyVariator::with_occupancy_target(&spots, percent);
        }

        let competitors =
            self.traffic
                .competitors(request.options.traffic_level, minute, request.now.second());

        let ranked = self.ranker.rank(request.user, &spots, &competitors);
        let summary = ranked.summary;
        let mut recommendations = ranked.recommendations;

        // Demo overrides in fixed order: low rewrites every entry, then high
        // rewrites only the first. Ranking order is left alone.
        if request.options.force_low_confidence {
            debug!("forcing low confidence across {} recommendations", recommendations.len());
            for rec in recommendations.iter_mut() {
                rec.overall_confidence = FORCED_LOW_CONFIDENCE;
                rec.future_confidence = self.ranker.decay_horizons(FORCED_LOW_CONFIDENCE);
            }
        }
        if request.options.force_high_confidence {
            if let Some(first) = recommendations.first_mut() {
                first.overall_confidence = FORCED_HIGH_CONFIDENCE;
                first.future_confidence = self.ranker.decay_horizons(FORCED_HIGH_CONFIDENCE);
            }
        }

        let reroute = self
            .reroute
            .decide(&recommendations, self.alternatives.lots());

        let (legal_context, work_recommendations) = if request.options.work_scenario {
            let (context, work) =
                self.work_scenario(camera, camera_distance, &recommendations, request);
            (Some(context), Some(work))
        } else {
            (None, None)
        };

        Ok(RecommendationResponse {
            camera: camera.clone(),
            camera_distance_m: round1(camera_distance),
            lot_summary: summary,
            recommendations,
            spots,
            reroute,
            simulated_user_count: competitors.len(),
            timestamp: request.now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            legal_context,
            work_recommendations,
        })
    }

    /// Work-scenario annotations: legality for the camera lot and every
    /// crowdsourced spot near the requester, plus graded options.
    fn work_scenario(
        &self,
        camera: &Camera,
        camera_distance: f64,
        recommendations: &[Recommendation],
        request: &RecommendationRequest,
    ) -> (Vec<LegalContextEntry>, Vec<WorkRecommendation>) {
        let duration = request
            .options
            .parking_duration_minutes
            .unwrap_or(DEFAULT_PARKING_DURATION_MIN);

        let lot_status = self.legal.evaluate(&camera.lot_name, duration, request.now);
        let mut context = vec![LegalContextEntry {
            location_id: camera.lot_name.clone(),
            name: camera.name.clone(),
            origin: SpotOrigin::CameraLot,
            distance_m: round1(camera_distance),
            legal: lot_status.clone(),
        }];

        let nearby = self.crowdsource.near(request.user, WORK_CONTEXT_RADIUS_M);
        for (spot, distance) in &nearby {
            context.push(LegalContextEntry {
                location_id: spot.id.clone(),
                name: spot.name.clone(),
                origin: SpotOrigin::Street,
                distance_m: round1(*distance),
                legal: self.legal.evaluate(&spot.id, duration, request.now),
            });
        }

        let mut work = Vec::new();
        for rec in recommendations.iter().take(WORK_CLASSIFIED_SPOTS) {
            work.push(WorkRecommendation {
                location_id: rec.spot.id.clone(),
                origin: SpotOrigin::CameraLot,
                confidence: rec.overall_confidence,
                classification: LegalEvaluator::classify(&lot_status, rec.overall_confidence),
            });
        }
        for (spot, _) in &nearby {
            let status = self.legal.evaluate(&spot.id, duration, request.now);
            work.push(WorkRecommendation {
                location_id: spot.id.clone(),
                origin: SpotOrigin::Street,
                confidence: STREET_CONFIDENCE,
                classification: LegalEvaluator::classify(&status, STREET_CONFIDENCE),
            });
        }

        debug!(
            "work scenario: {} legal contexts, {} graded options",
            context.len(),
            work.len()
        );
        (context, work)
    }
}

fn validate(request: &RecommendationRequest) -> Result<(), PipelineError> {
    let LatLng { lat, lng } = request.user;
    if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        return Err(PipelineError::Validation(format!(
            "user location ({lat}, {lng}) is not a usable coordinate"
        )));
    }
    if let Some(percent) = request.options.occupancy_target {
        if !percent.is_finite() {
            return Err(PipelineError::Validation(
                "occupancy target must be a number".to_string(),
            ));
        }
    }
    if request.detections.is_empty() {
        return Err(PipelineError::NotFound("no detections available".to_string()));
    }
    for det in &request.detections {
        if det.id.trim().is_empty() {
            return Err(PipelineError::Validation(
                "detection with an empty stall id".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&det.confidence) {
            return Err(PipelineError::Validation(format!(
                "stall {}: confidence {} outside [0, 1]",
                det.id, det.confidence
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectionResult, PipelineOptions, SpotLabel};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn detection(id: &str, row: &str, label: SpotLabel) -> DetectionResult {
        DetectionResult {
            id: id.to_string(),
            row: row.to_string(),
            label,
            confidence: 0.9,
        }
    }

    fn detections() -> Vec<DetectionResult> {
        vec![
            detection("A1", "A", SpotLabel::Empty),
            detection("A2", "A", SpotLabel::Empty),
            detection("A3", "A", SpotLabel::Occupied),
            detection("B1", "B", SpotLabel::Empty),
            detection("B2", "B", SpotLabel::Occupied),
            detection("C1", "C", SpotLabel::Empty),
            detection("C2", "C", SpotLabel::Empty),
        ]
    }

    fn request(options: PipelineOptions) -> RecommendationRequest {
        RecommendationRequest {
            // Standing in the Harrison lot.
            user: LatLng::new(37.78220, -122.40310),
            detections: detections(),
            now: at(10, 30),
            options,
        }
    }

    fn engine() -> RecommendationEngine {
        RecommendationEngine::with_defaults(HashMap::new())
    }

    #[test]
    fn test_full_pipeline_response_shape() {
        let response = engine().recommend(&request(PipelineOptions::default())).unwrap();
        assert_eq!(response.camera.id, "cam-01");
        assert_eq!(response.spots.len(), 7);
        assert_eq!(response.lot_summary.total_spots, 7);
        assert_eq!(response.simulated_user_count, 3);
        assert!(response.legal_context.is_none());
        assert!(response.work_recommendations.is_none());
        assert_eq!(response.timestamp, "2026-08-10T10:30:00");
        // Recommendations cover exactly the open stalls.
        assert_eq!(
            response.recommendations.len(),
            response.lot_summary.open_spots
        );
        // Ranked non-increasing.
        for pair in response.recommendations.windows(2) {
            assert!(pair[0].overall_confidence >= pair[1].overall_confidence);
        }
    }

    #[test]
    fn test_same_minute_is_reproducible() {
        let eng = engine();
        let req = request(PipelineOptions::default());
        let a = eng.recommend(&req).unwrap();
        let b = eng.recommend(&req).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_empty_detections_not_found() {
        let mut req = request(PipelineOptions::default());
        req.detections.clear();
        match engine().recommend(&req) {
            Err(PipelineError::NotFound(msg)) => assert!(msg.contains("no detections")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_coordinates_rejected() {
        let mut req = request(PipelineOptions::default());
        req.user = LatLng::new(137.0, -122.40);
        assert!(matches!(
            engine().recommend(&req),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_stall_id_rejected() {
        let mut req = request(PipelineOptions::default());
        req.detections[0].id = "  ".to_string();
        assert!(matches!(
            engine().recommend(&req),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_camera_radius_not_found() {
        let mut req = request(PipelineOptions {
            camera_search_radius_m: Some(5.0),
            ..Default::default()
        });
        req.user = LatLng::new(37.70, -122.50);
        assert!(matches!(
            engine().recommend(&req),
            Err(PipelineError::NotFound(_))
        ));
    }

    #[test]
    fn test_no_cameras_registered_not_found() {
        let eng = RecommendationEngine::new(
            SpotProjector::new(Default::default()),
            TrafficSimulator::default(),
            SpotRanker::new(Default::default()),
            RerouteDecisionMaker::new(Default::default()),
            LegalEvaluator::default(),
            CameraRegistry::new(Vec::new()),
            CrowdsourceRegistry::default(),
            AlternativeLotRegistry::default(),
            HashMap::new(),
        );
        assert!(matches!(
            eng.recommend(&request(PipelineOptions::default())),
            Err(PipelineError::NotFound(_))
        ));
    }

    #[test]
    fn test_occupancy_target_dominates_seeded_variation() {
        let response = engine()
            .recommend(&request(PipelineOptions {
                occupancy_target: Some(100.0),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(response.lot_summary.open_spots, 0);
        assert!(response.recommendations.is_empty());
        // Nothing rankable: zero confidence, so the engine reroutes.
        assert!(response.reroute.should_reroute);
    }

    #[test]
    fn test_forced_low_confidence_triggers_reroute() {
        let response = engine()
            .recommend(&request(PipelineOptions {
                force_low_confidence: true,
                ..Default::default()
            }))
            .unwrap();
        assert!(response
            .recommendations
            .iter()
            .all(|r| r.overall_confidence == FORCED_LOW_CONFIDENCE));
        assert!(response.reroute.should_reroute);
        assert!(response.reroute.alternative.is_some());
    }

    #[test]
    fn test_both_overrides_apply_low_then_high() {
        let response = engine()
            .recommend(&request(PipelineOptions {
                force_low_confidence: true,
                force_high_confidence: true,
                ..Default::default()
            }))
            .unwrap();
        let recs = &response.recommendations;
        assert!(!recs.is_empty());
        assert_eq!(recs[0].overall_confidence, FORCED_HIGH_CONFIDENCE);
        for rec in &recs[1..] {
            assert_eq!(rec.overall_confidence, FORCED_LOW_CONFIDENCE);
        }
        // The high override on the first entry clears the reroute threshold.
        assert!(!response.reroute.should_reroute);
    }

    #[test]
    fn test_work_scenario_annotations() {
        let response = engine()
            .recommend(&request(PipelineOptions {
                work_scenario: true,
                ..Default::default()
            }))
            .unwrap();

        let context = response.legal_context.unwrap();
        // Camera lot first, then nearby crowdsourced spots; the Mission spot
        // is kilometers away and excluded.
        assert_eq!(context[0].origin, SpotOrigin::CameraLot);
        assert_eq!(context[0].location_id, "harrison_lot");
        assert!(context.iter().all(|e| e.location_id != "cs-104"));
        assert!(context.len() > 1);

        let work = response.work_recommendations.unwrap();
        let camera_graded = work
            .iter()
            .filter(|w| w.origin == SpotOrigin::CameraLot)
            .count();
        assert!(camera_graded <= 5);
        assert!(work
            .iter()
            .filter(|w| w.origin == SpotOrigin::Street)
            .all(|w| w.confidence == 0.5));
    }
}
