// src/types.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// GEOGRAPHY
// ============================================================================

/// Geographic point in WGS84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// ============================================================================
// STATIC REGISTRY RECORDS
// ============================================================================

/// A fixed occupancy camera overlooking one lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    pub name: String,
    /// Regulation registry key for the lot this camera covers.
    pub lot_name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Camera {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Calibration polygon for one stall, in the 400x287 reference image space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonDatum {
    pub id: String,
    pub points: Vec<[f64; 2]>,
}

/// A crowdsourced street parking report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdsourceSpot {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub neighborhood: String,
}

impl CrowdsourceSpot {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// A lot the requester can be redirected to when local confidence is low.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeLot {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub estimated_drive_minutes: f64,
    pub estimated_confidence: f64,
    pub total_spots: u32,
    pub typical_open_spots: u32,
}

// ============================================================================
// DETECTIONS AND DERIVED SPOTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotLabel {
    Empty,
    Occupied,
}

impl SpotLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotLabel::Empty => "empty",
            SpotLabel::Occupied => "occupied",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SpotLabel::Empty)
    }
}

/// One labeled stall from the detector. The source of truth for occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub id: String,
    /// Stall row tag ("A" nearest the camera through "C" farthest).
    pub row: String,
    pub label: SpotLabel,
    /// Detector confidence in the label, [0, 1].
    pub confidence: f64,
}

/// A detection geocoded relative to its camera. Immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedSpot {
    pub id: String,
    pub row: String,
    pub label: SpotLabel,
    pub confidence: f64,
    pub lat: f64,
    pub lng: f64,
    pub distance_from_camera_m: f64,
    /// Stall centroid in reference image pixels.
    pub polygon_centroid: [f64; 2],
}

impl ProjectedSpot {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

// ============================================================================
// SIMULATED COMPETITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walking,
    Driving,
}

/// A competing user position, regenerated per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedUser {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub speed: TravelMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLevel {
    Light,
    Moderate,
    Heavy,
}

// ============================================================================
// RANKING OUTPUT
// ============================================================================

/// Confidence forecast at fixed minute horizons. Non-increasing by horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FutureConfidence {
    #[serde(rename = "1")]
    pub min_1: f64,
    #[serde(rename = "3")]
    pub min_3: f64,
    #[serde(rename = "5")]
    pub min_5: f64,
    #[serde(rename = "10")]
    pub min_10: f64,
}

/// One ranked open stall. All penalty and confidence fields sit in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub spot: ProjectedSpot,
    pub ml_confidence: f64,
    pub distance_m: f64,
    pub walking_time_minutes: f64,
    /// Simulated users strictly closer to the stall than the requester.
    pub queue_position: usize,
    pub distance_penalty: f64,
    pub queue_penalty: f64,
    pub overall_confidence: f64,
    pub future_confidence: FutureConfidence,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LotSummary {
    pub total_spots: usize,
    pub open_spots: usize,
    pub occupied_spots: usize,
    /// Whole-number percentage, 0 to 100.
    pub occupancy_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerouteDecision {
    pub should_reroute: bool,
    pub reason: Option<String>,
    pub current_confidence: f64,
    pub alternative: Option<AlternativeLot>,
}

// ============================================================================
// REQUEST SURFACE
// ============================================================================

/// Typed demo and scenario switches. When both confidence overrides are set
/// the low override is applied to every recommendation first and the high
/// override then rewrites only the first entry; that ordering is part of the
/// contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Force the lot toward this occupancy percentage, 0 to 100.
    pub occupancy_target: Option<f64>,
    pub traffic_level: Option<TrafficLevel>,
    #[serde(default)]
    pub force_low_confidence: bool,
    #[serde(default)]
    pub force_high_confidence: bool,
    #[serde(default)]
    pub work_scenario: bool,
    /// Reject the request when no camera sits within this radius, meters.
    pub camera_search_radius_m: Option<f64>,
    /// Intended parking duration for legality checks. Defaults to 120.
    pub parking_duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user: LatLng,
    pub detections: Vec<DetectionResult>,
    /// Explicit wall-clock moment; never read implicitly by the core.
    pub now: NaiveDateTime,
    #[serde(default)]
    pub options: PipelineOptions,
}

// ============================================================================
// CLOCK
// ============================================================================

/// Explicit time source so pipeline behavior is reproducible in tests.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the deployment's local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

// ============================================================================
// BINARY CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub data: DataConfig,
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub spot_polygons: String,
    pub detections: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub user_lat: f64,
    pub user_lng: f64,
    pub occupancy_target: Option<f64>,
    pub traffic_level: Option<TrafficLevel>,
    #[serde(default)]
    pub force_low_confidence: bool,
    #[serde(default)]
    pub force_high_confidence: bool,
    #[serde(default)]
    pub work_scenario: bool,
    pub parking_duration_minutes: Option<i64>,
}
