// src/analysis/traffic_sim.rs
//
// Competing-driver simulation. Two static pools of base users; the traffic
// level gates how many are returned, and each position gets a small
// oscillation derived from the wall-clock minute and a 15-second bucket so
// repeated calls inside the same window return identical positions.

use crate::types::{SimulatedUser, TrafficLevel, TravelMode};
use tracing::debug;

/// Oscillation amplitude in degrees, roughly 15 meters of drift.
const DRIFT_AMPLITUDE_DEG: f64 = 0.000_15;

#[derive(Debug, Clone)]
pub struct TrafficSimulator {
    base: Vec<SimulatedUser>,
    heavy_extension: Vec<SimulatedUser>,
}

impl TrafficSimulator {
    pub fn new(base: Vec<SimulatedUser>, heavy_extension: Vec<SimulatedUser>) -> Self {
        Self {
            base,
            heavy_extension,
        }
    }

    /// Competitor positions for the given traffic level and moment.
    ///
    /// Light traffic returns exactly the first base user; heavy returns the
    /// base pool plus the extension; anything else returns the base pool.
    pub fn competitors(
        &self,
        level: Option<TrafficLevel>,
        minute: u32,
        second: u32,
    ) -> Vec<SimulatedUser> {
        let pool: Vec<&SimulatedUser> = match level {
            Some(TrafficLevel::Light) => self.base.iter().take(1).collect(),
            Some(TrafficLevel::Heavy) => {
                self.base.iter().chain(self.heavy_extension.iter()).collect()
            }
            _ => self.base.iter().collect(),
        };

        let bucket = second / 15;
        let users: Vec<SimulatedUser> = pool
            .into_iter()
            .map(|user| {
                let phase =
                    f64::from(minute) * 0.7 + f64::from(bucket) * 0.25 + id_phase(&user.id);
                SimulatedUser {
                    id: user.id.clone(),
                    lat: user.lat + phase.sin() * DRIFT_AMPLITUDE_DEG,
                    lng: user.lng + (phase * 1.3).cos() * DRIFT_AMPLITUDE_DEG,
                    speed: user.speed,
                }
            })
            .collect();

        debug!("simulating {} competing users ({:?})", users.len(), level);
        users
    }
}

/// Per-user phase offset so the pool never drifts in lockstep.
fn id_phase(id: &str) -> f64 {
    id.bytes().map(f64::from).sum::<f64>() * 0.31
}

impl Default for TrafficSimulator {
    fn default() -> Self {
        Self::new(
            vec![
                SimulatedUser {
                    id: "sim-01".to_string(),
                    lat: 37.78305,
                    lng: -122.40421,
                    speed: TravelMode::Walking,
                },
                SimulatedUser {
                    id: "sim-02".to_string(),
                    lat: 37.78102,
                    lng: -122.40255,
                    speed: TravelMode::Driving,
                },
                SimulatedUser {
                    id: "sim-03".to_string(),
                    lat: 37.78270,
                    lng: -122.40168,
                    speed: TravelMode::Walking,
                },
            ],
            vec![
                SimulatedUser {
                    id: "sim-04".to_string(),
                    lat: 37.78188,
                    lng: -122.40492,
                    speed: TravelMode::Driving,
                },
                SimulatedUser {
                    id: "sim-05".to_string(),
                    lat: 37.78355,
                    lng: -122.40330,
                    speed: TravelMode::Driving,
                },
                SimulatedUser {
                    id: "sim-06".to_string(),
                    lat: 37.78079,
                    lng: -122.40411,
                    speed: TravelMode::Walking,
                },
                SimulatedUser {
                    id: "sim-07".to_string(),
                    lat: 37.78416,
                    lng: -122.40240,
                    speed: TravelMode::Driving,
                },
            ],
        )
    }
}
