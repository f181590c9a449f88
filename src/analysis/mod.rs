// src/analysis/mod.rs
//
// Recommendation scoring pipeline stages.
//
// Signal flow:
//   DetectionResult + PolygonDatum → spot_projector ──┐
//   wall-clock minute → occupancy (seeded / target) ──┼→ spot_ranker → reroute
//   traffic level → traffic_sim ──────────────────────┘
//
// Orchestrated by pipeline::RecommendationEngine.

pub mod occupancy;
pub mod reroute;
pub mod spot_projector;
pub mod spot_ranker;
pub mod traffic_sim;

// Re-exports for ergonomic access from the pipeline.
pub use occupancy::{seed_for_minute, OccupancyVariator};
pub use reroute::{RerouteConfig, RerouteDecisionMaker};
pub use spot_projector::{ProjectorConfig, RowGeometry, SpotProjector};
pub use spot_ranker::{RankedSpots, RankerConfig, SpotRanker};
pub use traffic_sim::TrafficSimulator;
