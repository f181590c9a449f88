// src/trace.rs
//
// Renders the fixed staged trace of a pipeline run: eight lines per request,
// ten when the work scenario adds legality and classification stages. Pure
// string building; the caller owns whatever sink the lines end up in.

use crate::pipeline::RecommendationResponse;

pub fn render_trace(response: &RecommendationResponse) -> Vec<String> {
    let total = if response.legal_context.is_some() { 10 } else { 8 };
    let mut lines: Vec<String> = Vec::with_capacity(total);
    let stage = |text: String, lines: &mut Vec<String>| {
        let n = lines.len() + 1;
        lines.push(format!("[{n}/{total}] {text}"));
    };

    stage(
        format!(
            "camera: {} ({}) selected, {:.1} m from requester",
            response.camera.name, response.camera.id, response.camera_distance_m
        ),
        &mut lines,
    );
    stage(
        format!(
            "projection: {} stalls geocoded around {}",
            response.spots.len(),
            response.camera.id
        ),
        &mut lines,
    );
    stage(
        format!(
            "occupancy: {} open / {} total ({}% occupied)",
            response.lot_summary.open_spots,
            response.lot_summary.total_spots,
            response.lot_summary.occupancy_rate
        ),
        &mut lines,
    );
    stage(
        format!(
            "traffic: {} competing users simulated",
            response.simulated_user_count
        ),
        &mut lines,
    );
    match response.recommendations.first() {
        Some(best) => {
            stage(
                format!(
                    "ranking: best stall {} at {:.2} overall confidence ({} candidates)",
                    best.spot.id,
                    best.overall_confidence,
                    response.recommendations.len()
                ),
                &mut lines,
            );
            stage(
                format!(
                    "decay: best stall forecast {:.2} now to {:.2} in 10 min",
                    best.overall_confidence, best.future_confidence.min_10
                ),
                &mut lines,
            );
        }
        None => {
            stage("ranking: no open stalls to rank".to_string(), &mut lines);
            stage("decay: nothing to forecast".to_string(), &mut lines);
        }
    }
    if response.reroute.should_reroute {
        stage(
            format!(
                "reroute: yes, {}",
                response.reroute.reason.as_deref().unwrap_or("no reason recorded")
            ),
            &mut lines,
        );
    } else {
        stage(
            format!(
                "reroute: no ({})",
                response
                    .reroute
                    .reason
                    .as_deref()
                    .unwrap_or("confidence sufficient")
            ),
            &mut lines,
        );
    }
    stage(
        format!(
            "done: {} recommendations at {}",
            response.recommendations.len(),
            response.timestamp
        ),
        &mut lines,
    );

    if let Some(context) = &response.legal_context {
        stage(
            format!("legality: {} locations evaluated", context.len()),
            &mut lines,
        );
        let graded = response
            .work_recommendations
            .as_ref()
            .map(|w| w.len())
            .unwrap_or(0);
        stage(format!("classification: {graded} graded options"), &mut lines);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RecommendationEngine;
    use crate::types::{DetectionResult, LatLng, PipelineOptions, RecommendationRequest, SpotLabel};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn response(work_scenario: bool) -> RecommendationResponse {
        let engine = RecommendationEngine::with_defaults(HashMap::new());
        let request = RecommendationRequest {
            user: LatLng::new(37.78220, -122.40310),
            detections: vec![
                DetectionResult {
                    id: "A1".to_string(),
                    row: "A".to_string(),
                    label: SpotLabel::Empty,
                    confidence: 0.9,
                },
                DetectionResult {
                    id: "A2".to_string(),
                    row: "A".to_string(),
                    label: SpotLabel::Occupied,
                    confidence: 0.8,
                },
            ],
            now: NaiveDate::from_ymd_opt(2026, 8, 10)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            options: PipelineOptions {
                work_scenario,
                ..Default::default()
            },
        };
        engine.recommend(&request).unwrap()
    }

    #[test]
    fn test_standard_trace_has_eight_stages() {
        let lines = render_trace(&response(false));
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("[1/8] camera:"));
        assert!(lines[7].starts_with("[8/8] done:"));
    }

    #[test]
    fn test_work_scenario_trace_has_ten_stages() {
        let lines = render_trace(&response(true));
        assert_eq!(lines.len(), 10);
        assert!(lines[0].starts_with("[1/10] camera:"));
        assert!(lines[8].starts_with("[9/10] legality:"));
        assert!(lines[9].starts_with("[10/10] classification:"));
    }

    #[test]
    fn test_trace_mentions_every_stage_value() {
        let resp = response(false);
        let joined = render_trace(&resp).join("\n");
        assert!(joined.contains(&resp.camera.id));
        assert!(joined.contains(&format!("{} competing users", resp.simulated_user_count)));
        assert!(joined.contains(&resp.timestamp));
    }
}
