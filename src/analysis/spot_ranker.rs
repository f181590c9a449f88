// src/analysis/spot_ranker.rs
//
// Confidence scoring and ranking of open stalls, plus the lot summary and
// the decayed forecast horizons.
//
// overall = detector confidence * distance penalty * queue penalty, except
// for far-row stalls with a calibrated confidence entry, which use the
// calibration value directly.

use crate::geo::{self, round1, round2};
use crate::types::{
    FutureConfidence, LatLng, LotSummary, ProjectedSpot, Recommendation, SimulatedUser, SpotLabel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Distance beyond which a stall contributes nothing, meters.
    pub max_useful_distance_m: f64,
    /// Confidence knocked off per competitor closer to the stall.
    pub queue_penalty_step: f64,
    /// Exponential decay rate per minute for the forecast horizons.
    pub decay_rate_per_min: f64,
    /// Walking speed for the time estimate, meters per minute.
    pub walking_speed_m_per_min: f64,
    /// Row whose stalls carry calibrated confidence values.
    pub far_row: String,
    /// Calibrated per-stall confidence for the far row. The camera's view of
    /// that row is too oblique for the geometric score to mean much.
    pub far_row_confidence: HashMap<String, f64>,
}

impl Default for RankerConfig {
    fn default() -> Self {
        let mut far_row_confidence = HashMap::new();
        far_row_confidence.insert("C1".to_string(), 0.88);
        far_row_confidence.insert("C2".to_string(), 0.42);
        far_row_confidence.insert("C3".to_string(), 0.67);
        Self {
            max_useful_distance_m: 200.0,
            queue_penalty_step: 0.25,
            decay_rate_per_min: 0.1,
            walking_speed_m_per_min: 80.0,
            far_row: "C".to_string(),
            far_row_confidence,
        }
    }
}

/// Ranked open stalls plus the whole-lot summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSpots {
    pub recommendations: Vec<Recommendation>,
    pub summary: LotSummary,
}

// ============================================================================
// RANKER
// ============================================================================

pub struct SpotRanker {
    config: RankerConfig,
}

impl SpotRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    /// Scores and ranks the open stalls; the summary covers the full set.
    ///
    /// Sorting is stable, so stalls with equal overall confidence keep
    /// their detection order.
    pub fn rank(
        &self,
        user: LatLng,
        spots: &[ProjectedSpot],
        competitors: &[SimulatedUser],
    ) -> RankedSpots {
        let total = spots.len();
        let occupied = spots
            .iter()
            .filter(|s| s.label == SpotLabel::Occupied)
            .count();
        let summary = LotSummary {
            total_spots: total,
            open_spots: total - occupied,
            occupied_spots: occupied,
            occupancy_rate: if total == 0 {
                0
            } else {
                (occupied as f64 / total as f64 * 100.0).round() as u32
            },
        };

        let mut recommendations: Vec<Recommendation> = spots
            .iter()
            .filter(|s| s.label == SpotLabel::Empty)
            .map(|spot| self.score(user, spot, competitors))
            .collect();

        recommendations.sort_by(|a, b| {
            b.overall_confidence
                .partial_cmp(&a.overall_confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            "ranked {} open stalls out of {} ({}% occupied)",
            recommendations.len(),
            total,
            summary.occupancy_rate
        );
        RankedSpots {
            recommendations,
            summary,
        }
    }

    fn score(
        &self,
        user: LatLng,
        spot: &ProjectedSpot,
        competitors: &[SimulatedUser],
    ) -> Recommendation {
        let spot_pos = spot.position();
        let distance = geo::distance_m(user, spot_pos);
        let distance_penalty = (1.0 - distance / self.config.max_useful_distance_m).max(0.0);

        let queue_position = competitors
            .iter()
            .filter(|u| geo::distance_m(LatLng::new(u.lat, u.lng), spot_pos) < distance)
            .count();
        let queue_penalty =
            (1.0 - queue_position as f64 * self.config.queue_penalty_step).max(0.0);

        let mut overall = spot.confidence * distance_penalty * queue_penalty;
        if spot.row == self.config.far_row {
            if let Some(&calibrated) = self.config.far_row_confidence.get(&spot.id) {
                overall = calibrated;
            }
        }
        let overall = round2(overall);

        Recommendation {
            spot: spot.clone(),
            ml_confidence: round2(spot.confidence),
            distance_m: round1(distance),
            walking_time_minutes: round1(distance / self.config.walking_speed_m_per_min),
            queue_position,
            distance_penalty: round2(distance_penalty),
            queue_penalty: round2(queue_penalty),
            overall_confidence: overall,
            future_confidence: self.decay_horizons(overall),
        }
    }

    /// Forecast of how trustworthy a score stays at the fixed horizons.
    pub fn decay_horizons(&self, confidence: f64) -> FutureConfidence {
        let at = |minutes: f64| {
            round2(confidence * (-self.config.decay_rate_per_min * minutes).exp())
        };
        FutureConfidence {
            min_1: at(1.0),
            min_3: at(3.0),
            min_5: at(5.0),
            min_10: at(10.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TravelMode;

    fn spot(id: &str, row: &str, lat: f64, lng: f64, confidence: f64) -> ProjectedSpot {
        ProjectedSpot {
            id: id.to_string(),
            row: row.to_string(),
            label: SpotLabel::Empty,
            confidence,
            lat,
            lng,
            distance_from_camera_m: 10.0,
            polygon_centroid: [0.0, 0.0],
        }
    }

    fn occupied(id: &str, lat: f64, lng: f64) -> ProjectedSpot {
        ProjectedSpot {
            label: SpotLabel::Occupied,
            ..spot(id, "A", lat, lng, 0.9)
        }
    }

    #[test]
    fn test_distance_penalty_profile() {
        // Three open stalls at roughly 0, 100 and 200 meters due north of
        // the user, perfect detector confidence, no competitors.
        let ranker = SpotRanker::new(RankerConfig::default());
        let user = LatLng::new(37.78, -122.40);
        let spots = vec![
            spot("s0", "A", 37.78, -122.40, 1.0),
            spot("s1", "A", 37.7809, -122.40, 1.0),
            spot("s2", "A", 37.7818, -122.40, 1.0),
        ];

        let ranked = ranker.rank(user, &spots, &[]);
        assert_eq!(ranked.recommendations.len(), 3);
        // Ranked order matches distance order.
        assert_eq!(ranked.recommendations[0].spot.id, "s0");
        assert_eq!(ranked.recommendations[1].spot.id, "s1");
        assert_eq!(ranked.recommendations[2].spot.id, "s2");
        assert_eq!(ranked.recommendations[0].distance_penalty, 1.0);
        assert_eq!(ranked.recommendations[1].distance_penalty, 0.5);
        assert_eq!(ranked.recommendations[2].distance_penalty, 0.0);
        assert_eq!(ranked.recommendations[0].overall_confidence, 1.0);
        assert_eq!(ranked.recommendations[1].overall_confidence, 0.5);
        assert_eq!(ranked.recommendations[2].overall_confidence, 0.0);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let ranker = SpotRanker::new(RankerConfig::default());
        let user = LatLng::new(37.78, -122.40);
        // Same position and confidence: identical scores.
        let spots = vec![
            spot("first", "A", 37.7804, -122.40, 0.8),
            spot("second", "A", 37.7804, -122.40, 0.8),
            spot("third", "A", 37.7804, -122.40, 0.8),
        ];
        let ranked = ranker.rank(user, &spots, &[]);
        let ids: Vec<&str> = ranked
            .recommendations
            .iter()
            .map(|r| r.spot.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_queue_penalty_counts_closer_competitors() {
        let ranker = SpotRanker::new(RankerConfig::default());
        let user = LatLng::new(37.78, -122.40);
        let spots = vec![spot("s1", "A", 37.7809, -122.40, 1.0)];
        // One competitor sits almost on the stall, one far away.
        let competitors = vec![
            SimulatedUser {
                id: "near".to_string(),
                lat: 37.78085,
                lng: -122.40,
                speed: TravelMode::Walking,
            },
            SimulatedUser {
                id: "far".to_string(),
                lat: 37.79,
                lng: -122.42,
                speed: TravelMode::Driving,
            },
        ];

        let ranked = ranker.rank(user, &spots, &competitors);
        let rec = &ranked.recommendations[0];
        assert_eq!(rec.queue_position, 1);
        assert_eq!(rec.queue_penalty, 0.75);
    }

    #[test]
    fn test_far_row_uses_calibrated_confidence() {
        let ranker = SpotRanker::new(RankerConfig::default());
        let user = LatLng::new(37.78, -122.40);
        let spots = vec![
            spot("C2", "C", 37.7801, -122.40, 0.99),
            // Same row but no calibration entry: geometric score applies.
            spot("C9", "C", 37.7801, -122.40, 0.99),
        ];
        let ranked = ranker.rank(user, &spots, &[]);
        let c2 = ranked
            .recommendations
            .iter()
            .find(|r| r.spot.id == "C2")
            .unwrap();
        let c9 = ranked
            .recommendations
            .iter()
            .find(|r| r.spot.id == "C9")
            .unwrap();
        assert_eq!(c2.overall_confidence, 0.42);
        assert_ne!(c9.overall_confidence, 0.42);
    }

    #[test]
    fn test_future_confidence_decays_monotonically() {
        let ranker = SpotRanker::new(RankerConfig::default());
        let f = ranker.decay_horizons(0.9);
        assert!(f.min_1 >= f.min_3);
        assert!(f.min_3 >= f.min_5);
        assert!(f.min_5 >= f.min_10);
        // Spot checks against the closed form, rounded to 2 decimals.
        assert_eq!(f.min_1, (0.9 * (-0.1f64).exp() * 100.0).round() / 100.0);
        assert_eq!(f.min_10, (0.9 * (-1.0f64).exp() * 100.0).round() / 100.0);
    }

    #[test]
    fn test_summary_covers_full_spot_set() {
        let ranker = SpotRanker::new(RankerConfig::default());
        let user = LatLng::new(37.78, -122.40);
        let spots = vec![
            spot("s1", "A", 37.7804, -122.40, 0.9),
            occupied("s2", 37.7804, -122.40),
            occupied("s3", 37.7804, -122.40),
        ];
        let ranked = ranker.rank(user, &spots, &[]);
        assert_eq!(ranked.summary.total_spots, 3);
        assert_eq!(ranked.summary.open_spots, 1);
        assert_eq!(ranked.summary.occupied_spots, 2);
        assert_eq!(ranked.summary.occupancy_rate, 67);
        assert_eq!(ranked.recommendations.len(), 1);
    }

    #[test]
    fn test_empty_spot_set_degrades_cleanly() {
        let ranker = SpotRanker::new(RankerConfig::default());
        let ranked = ranker.rank(LatLng::new(37.78, -122.40), &[], &[]);
        assert!(ranked.recommendations.is_empty());
        assert_eq!(ranked.summary.occupancy_rate, 0);
    }

    #[test]
    fn test_walking_time_from_distance() {
        let ranker = SpotRanker::new(RankerConfig::default());
        let user = LatLng::new(37.78, -122.40);
        // ~100 m north: 100 / 80 = 1.25, shown as 1.3 minutes.
        let spots = vec![spot("s1", "A", 37.7809, -122.40, 1.0)];
        let ranked = ranker.rank(user, &spots, &[]);
        assert_eq!(ranked.recommendations[0].walking_time_minutes, 1.3);
    }
}
