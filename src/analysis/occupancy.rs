// src/analysis/occupancy.rs
//
// Deterministic occupancy perturbation for demo scenarios.
//
// Nothing here is random. The "variation" is seeded from the wall-clock
// minute, so repeated calls within the same minute return identical output,
// and the percentage override is a plain counting pass in input order.
// Both operations return a fresh vector and never touch the input.

use crate::types::{ProjectedSpot, SpotLabel};
use tracing::debug;

/// Confidence assigned when the target override closes a spot.
const OVERRIDE_OCCUPIED_CONFIDENCE: f64 = 0.85;
/// Confidence assigned when the target override opens a spot.
const OVERRIDE_EMPTY_CONFIDENCE: f64 = 0.90;

/// Seed derivation from the wall-clock minute.
pub fn seed_for_minute(minute: u32) -> u32 {
    minute * 7 + 13
}

pub struct OccupancyVariator;

impl OccupancyVariator {
    /// Minute-seeded label flipping.
    ///
    /// Flips `seed % 3 + 1` empty stalls to occupied, picking positions in
    /// the empty subset by `(seed + i*11) % empty_count`. On seeds divisible
    /// by four, one occupied stall is reopened at `seed % occupied_count`.
    /// The selection can land on the same stall twice for small lots; the
    /// second flip is a no-op and fewer stalls change.
    pub fn seeded_variation(spots: &[ProjectedSpot], minute: u32) -> Vec<ProjectedSpot> {
        let seed = seed_for_minute(minute);
        let mut out: Vec<ProjectedSpot> = spots.to_vec();

        let empty_idx: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, s)| s.label == SpotLabel::Empty)
            .map(|(i, _)| i)
            .collect();

        if !empty_idx.is_empty() {
            let flip_count = (seed % 3 + 1) as usize;
            for i in 0..flip_count {
                let pick = empty_idx[(seed as usize + i * 11) % empty_idx.len()];
                out[pick].label = SpotLabel::Occupied;
                out[pick].confidence = 0.65 + f64::from((seed + i as u32 * 17) % 30) / 100.0;
            }
            debug!("seed {}: flipped up to {} stalls to occupied", seed, flip_count);
        }

        if seed % 4 == 0 {
            let occupied_idx: Vec<usize> = out
                .iter()
                .enumerate()
                .filter(|(_, s)| s.label == SpotLabel::Occupied)
                .map(|(i, _)| i)
                .collect();
            if !occupied_idx.is_empty() {
                let pick = occupied_idx[seed as usize % occupied_idx.len()];
                out[pick].label = SpotLabel::Empty;
                out[pick].confidence = 0.72 + f64::from(seed % 20) / 100.0;
                debug!("seed {}: reopened stall {}", seed, out[pick].id);
            }
        }

        out
    }

    /// Drives the occupied count toward `percent` of the lot.
    ///
    /// Flips in input order until the rounded target is met or the relevant
    /// pool runs out; partial satisfaction on small pools is expected.
    /// Targets outside [0, 100] are clamped.
    pub fn with_occupancy_target(spots: &[ProjectedSpot], percent: f64) -> Vec<ProjectedSpot> {
        let mut out: Vec<ProjectedSpot> = spots.to_vec();
        if out.is_empty() {
            return out;
        }

        let percent = percent.clamp(0.0, 100.0);
        let target = (percent / 100.0 * out.len() as f64).round() as usize;
        let occupied = out.iter().filter(|s| s.label == SpotLabel::Occupied).count();

        if occupied < target {
            let mut need = target - occupied;
            for spot in out.iter_mut() {
                if need == 0 {
                    break;
                }
                if spot.label == SpotLabel::Empty {
                    spot.label = SpotLabel::Occupied;
                    spot.confidence = OVERRIDE_OCCUPIED_CONFIDENCE;
                    need -= 1;
                }
            }
        } else if occupied > target {
            let mut need = occupied - target;
            for spot in out.iter_mut() {
                if need == 0 {
                    break;
                }
                if spot.label == SpotLabel::Occupied {
                    spot.label = SpotLabel::Empty;
                    spot.confidence = OVERRIDE_EMPTY_CONFIDENCE;
                    need -= 1;
                }
            }
        }

        debug!(
            "occupancy target {:.0}%: {} of {} stalls occupied",
            percent,
            out.iter().filter(|s| s.label == SpotLabel::Occupied).count(),
            out.len()
        );
        out
    }
}
