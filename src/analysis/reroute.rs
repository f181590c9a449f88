// src/analysis/reroute.rs
//
// Decides when the best local option is weak enough to send the driver to a
// different lot, and which lot to send them to.

use crate::types::{AlternativeLot, Recommendation, RerouteDecision};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RerouteConfig {
    /// Below this best-spot confidence a reroute is considered.
    pub min_confidence: f64,
    /// Drive-time normalizer for alternative scoring, minutes.
    pub drive_time_scale_min: f64,
}

impl Default for RerouteConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.35,
            drive_time_scale_min: 20.0,
        }
    }
}

pub struct RerouteDecisionMaker {
    config: RerouteConfig,
}

impl RerouteDecisionMaker {
    pub fn new(config: RerouteConfig) -> Self {
        Self { config }
    }

    /// Compares the best local confidence against the threshold and, when it
    /// falls short, picks the alternative maximizing
    /// `estimated_confidence * (1 - drive_minutes / scale)`. The strictly
    /// greater comparison means the first lot wins ties.
    pub fn decide(
        &self,
        recommendations: &[Recommendation],
        lots: &[AlternativeLot],
    ) -> RerouteDecision {
        let best = recommendations
            .first()
            .map(|r| r.overall_confidence)
            .unwrap_or(0.0);

        if best >= self.config.min_confidence {
            debug!("best confidence {:.2} clears the reroute threshold", best);
            return RerouteDecision {
                should_reroute: false,
                reason: None,
                current_confidence: best,
                alternative: None,
            };
        }

        let mut selected: Option<(&AlternativeLot, f64)> = None;
        for lot in lots {
            let score = lot.estimated_confidence
                * (1.0 - lot.estimated_drive_minutes / self.config.drive_time_scale_min);
            let better = match selected {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if better {
                selected = Some((lot, score));
            }
        }

        match selected {
            None => RerouteDecision {
                should_reroute: false,
                reason: Some(
                    "Best spot confidence is low but no alternative lots are registered"
                        .to_string(),
                ),
                current_confidence: best,
                alternative: None,
            },
            Some((lot, score)) => {
                info!(
                    "rerouting to {} (score {:.2}, best local {:.2})",
                    lot.name, score, best
                );
                RerouteDecision {
                    should_reroute: true,
                    reason: Some(format!(
                        "Best local spot is only {:.0}% likely to be free (target {:.0}%); {} is a {:.0} minute drive with around {} spots typically open",
                        best * 100.0,
                        self.config.min_confidence * 100.0,
                        lot.name,
                        lot.estimated_drive_minutes,
                        lot.typical_open_spots
                    )),
                    current_confidence: best,
                    alternative: Some(lot.clone()),
                }
            }
        }
    }
}
