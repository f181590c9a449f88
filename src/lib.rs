// src/lib.rs
//
// curbsight turns per-stall occupancy detections and crowdsourced spot
// reports into a ranked, time-decayed, legally annotated parking
// recommendation, and decides whether the requester should be redirected
// to an alternative lot instead.
//
// The whole crate is a pure computation over explicit inputs: registries
// are read-only after construction, the current time is always passed in,
// and no component owns a socket, file handle or console.

pub mod analysis;
pub mod config;
pub mod geo;
pub mod legality;
pub mod pipeline;
pub mod registry;
pub mod trace;
pub mod types;

pub use pipeline::{PipelineError, RecommendationEngine, RecommendationResponse};
pub use types::{DetectionResult, LatLng, PipelineOptions, RecommendationRequest};
