// src/main.rs

use anyhow::{Context, Result};
use curbsight::config;
use curbsight::pipeline::RecommendationEngine;
use curbsight::trace;
use curbsight::types::{
    AppConfig, Clock, LatLng, PipelineOptions, RecommendationRequest, SystemClock,
};
use tracing::{debug, info};

fn main() -> Result<()> {
    let app = AppConfig::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("curbsight={}", app.logging.level))
        .init();

    info!("🅿️  curbsight recommendation engine starting");

    let polygons = config::load_polygons(&app.data.spot_polygons)?;
    info!("✓ {} stall calibration polygons loaded", polygons.len());

    let detections = config::load_detections(&app.data.detections)?;
    info!("✓ {} detections loaded", detections.len());

    let engine = RecommendationEngine::with_defaults(polygons);
    let request = RecommendationRequest {
        user: LatLng::new(app.scenario.user_lat, app.scenario.user_lng),
        detections,
        now: SystemClock.now(),
        options: PipelineOptions {
            occupancy_target: app.scenario.occupancy_target,
            traffic_level: app.scenario.traffic_level,
            force_low_confidence: app.scenario.force_low_confidence,
            force_high_confidence: app.scenario.force_high_confidence,
            work_scenario: app.scenario.work_scenario,
            camera_search_radius_m: None,
            parking_duration_minutes: app.scenario.parking_duration_minutes,
        },
    };

    let response = engine
        .recommend(&request)
        .context("recommendation pipeline failed")?;

    for line in trace::render_trace(&response) {
        info!("{line}");
    }

    match response.recommendations.first() {
        Some(best) => info!(
            "recommended stall: {} ({:.0}% confident, {:.1} min walk)",
            best.spot.id,
            best.overall_confidence * 100.0,
            best.walking_time_minutes
        ),
        None => info!("no open stalls in view"),
    }
    if response.reroute.should_reroute {
        if let Some(lot) = &response.reroute.alternative {
            info!(
                "⚠️  reroute suggested: {} ({:.0} min drive)",
                lot.name, lot.estimated_drive_minutes
            );
        }
    }

    debug!(
        "full response: {}",
        serde_json::to_string_pretty(&response)?
    );
    Ok(())
}
