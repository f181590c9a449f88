// src/legality.rs
//
// Day/time-scoped parking regulation evaluation and recommendation grading.
//
// Regulation records are keyed by location id (a camera lot name or a
// crowdsourced spot id). Evaluation is a pure function of the record, the
// intended parking duration and an explicit wall-clock moment:
//
//   1. Unknown location        -> legal, "no regulations on file"
//   2. Permit required         -> illegal at any time
//   3. Outside enforced window -> legal, "outside enforcement hours"
//   4. Over the time limit     -> illegal, shortfall named
//   5. Otherwise               -> legal, "within time limit" / "no time limit"
//
// Enforcement windows are half open [start, end) in fractional hours; a
// missing day or hour restriction counts as always enforced on that axis.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Assumed stay when the caller does not state one, minutes.
pub const DEFAULT_PARKING_DURATION_MIN: i64 = 120;

/// Hourly rate above which a spot stops being a top pick, dollars.
const PRICEY_RATE_PER_HOUR: f64 = 2.0;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Lot,
    Garage,
    Metered,
    Permit,
    Free,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Lot => "lot",
            ZoneType::Garage => "garage",
            ZoneType::Metered => "metered",
            ZoneType::Permit => "permit",
            ZoneType::Free => "free",
        }
    }
}

/// Daily enforcement window in fractional hours, half open [start, end).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnforcedHours {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Restrictions {
    pub time_limit_minutes: Option<i64>,
    pub enforced_hours: Option<EnforcedHours>,
    /// Lowercase weekday names; absent means every day.
    pub enforced_days: Option<Vec<String>>,
    #[serde(default)]
    pub permit_required: bool,
    pub rate_per_hour: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulationRecord {
    pub zone_name: String,
    pub zone_type: ZoneType,
    pub restrictions: Restrictions,
    pub special_rules: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalStatus {
    pub is_legal: bool,
    pub reason: String,
    pub description: String,
    /// Clock time the stay must end by, HH:MM.
    pub valid_until: Option<String>,
    pub time_remaining_minutes: Option<i64>,
    pub rate_per_hour: Option<f64>,
    pub zone_type: ZoneType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    NotRecommended,
    Risky,
    GoodOption,
    HighlyRecommended,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::NotRecommended => "NOT_RECOMMENDED",
            Grade::Risky => "RISKY",
            Grade::GoodOption => "GOOD_OPTION",
            Grade::HighlyRecommended => "HIGHLY_RECOMMENDED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub classification: Grade,
    pub rationale: String,
}

// ============================================================================
// EVALUATOR
// ============================================================================

pub struct LegalEvaluator {
    regulations: HashMap<String, RegulationRecord>,
}

impl LegalEvaluator {
    pub fn new(regulations: HashMap<String, RegulationRecord>) -> Self {
        Self { regulations }
    }

    /// Evaluates whether parking at `location_id` for `duration_minutes`
    /// starting at `now` is legal.
    pub fn evaluate(
        &self,
        location_id: &str,
        duration_minutes: i64,
        now: NaiveDateTime,
    ) -> LegalStatus {
        let record = match self.regulations.get(location_id) {
            Some(record) => record,
            None => {
                debug!("no regulation on file for {}, defaulting to legal", location_id);
                return LegalStatus {
                    is_legal: true,
                    reason: "No regulations on file".to_string(),
                    description: "Unregulated location".to_string(),
                    valid_until: None,
                    time_remaining_minutes: None,
                    rate_per_hour: None,
                    zone_type: ZoneType::Free,
                };
            }
        };
        let r = &record.restrictions;

        if r.permit_required {
            return LegalStatus {
                is_legal: false,
                reason: "Permit required".to_string(),
                description: record.zone_name.clone(),
                valid_until: None,
                time_remaining_minutes: None,
                rate_per_hour: r.rate_per_hour,
                zone_type: record.zone_type,
            };
        }

        let day_active = r
            .enforced_days
            .as_ref()
            .map(|days| {
                let today = weekday_name(now.weekday());
                days.iter().any(|d| d.eq_ignore_ascii_case(today))
            })
            .unwrap_or(true);
        let fractional_hour = f64::from(now.hour()) + f64::from(now.minute()) / 60.0;
        let hour_active = r
            .enforced_hours
            .map(|w| fractional_hour >= w.start && fractional_hour < w.end)
            .unwrap_or(true);
        let enforced_now = day_active && hour_active;
        let has_window = r.enforced_days.is_some() || r.enforced_hours.is_some();

        if let Some(limit) = r.time_limit_minutes {
            let valid_until = Some((now + Duration::minutes(limit)).format("%H:%M").to_string());
            let time_remaining = Some(limit);

            if enforced_now && duration_minutes > limit {
                return LegalStatus {
                    is_legal: false,
                    reason: format!(
                        "Time limit is {} minutes; staying {} minutes runs {} minutes over",
                        limit,
                        duration_minutes,
                        duration_minutes - limit
                    ),
                    description: record.zone_name.clone(),
                    valid_until,
                    time_remaining_minutes: time_remaining,
                    rate_per_hour: r.rate_per_hour,
                    zone_type: record.zone_type,
                };
            }

            let reason = if !enforced_now && has_window {
                "Outside enforcement hours".to_string()
            } else {
                format!("Within the {limit} minute time limit")
            };
            return LegalStatus {
                is_legal: true,
                reason,
                description: record.zone_name.clone(),
                valid_until,
                time_remaining_minutes: time_remaining,
                rate_per_hour: r.rate_per_hour,
                zone_type: record.zone_type,
            };
        }

        let reason = if !enforced_now && has_window {
            "Outside enforcement hours".to_string()
        } else {
            "No time limit".to_string()
        };
        LegalStatus {
            is_legal: true,
            reason,
            description: record.zone_name.clone(),
            valid_until: None,
            time_remaining_minutes: None,
            rate_per_hour: r.rate_per_hour,
            zone_type: record.zone_type,
        }
    }

    /// Grades a spot from its legal status and availability confidence.
    /// The rules are priority ordered; the first match wins.
    pub fn classify(status: &LegalStatus, confidence: f64) -> Classification {
        if !status.is_legal {
            return Classification {
                classification: Grade::NotRecommended,
                rationale: format!("Illegal to park here: {}", status.reason),
            };
        }
        if confidence < 0.25 {
            return Classification {
                classification: Grade::NotRecommended,
                rationale: format!("Only {:.0}% likely to be free", confidence * 100.0),
            };
        }
        if let Some(remaining) = status.time_remaining_minutes {
            if remaining <= 60 {
                return Classification {
                    classification: Grade::Risky,
                    rationale: format!("Only {remaining} minutes before the limit runs out"),
                };
            }
        }
        if confidence < 0.45 {
            return Classification {
                classification: Grade::Risky,
                rationale: format!(
                    "Moderate {:.0}% chance of finding it free",
                    confidence * 100.0
                ),
            };
        }
        let pricey = status
            .rate_per_hour
            .map(|rate| rate > PRICEY_RATE_PER_HOUR)
            .unwrap_or(false);
        if confidence < 0.75 || pricey {
            let rationale = if pricey && confidence >= 0.75 {
                format!(
                    "Good availability but ${:.2}/hr",
                    status.rate_per_hour.unwrap_or(0.0)
                )
            } else {
                format!("{:.0}% chance of finding it free", confidence * 100.0)
            };
            return Classification {
                classification: Grade::GoodOption,
                rationale,
            };
        }
        Classification {
            classification: Grade::HighlyRecommended,
            rationale: format!(
                "{:.0}% likely free with no major restrictions",
                confidence * 100.0
            ),
        }
    }
}

impl Default for LegalEvaluator {
    fn default() -> Self {
        Self::new(default_regulations())
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

fn weekdays() -> Vec<String> {
    ["monday", "tuesday", "wednesday", "thursday", "friday"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

/// Production regulation registry, keyed by location id.
pub fn default_regulations() -> HashMap<String, RegulationRecord> {
    let mut regulations = HashMap::new();
    regulations.insert(
        "harrison_lot".to_string(),
        RegulationRecord {
            zone_name: "Harrison Street Lot".to_string(),
            zone_type: ZoneType::Lot,
            restrictions: Restrictions {
                time_limit_minutes: Some(120),
                enforced_hours: Some(EnforcedHours {
                    start: 8.0,
                    end: 18.0,
                }),
                enforced_days: Some(weekdays()),
                permit_required: false,
                rate_per_hour: Some(2.50),
            },
            special_rules: Some("Pay station at the north entrance".to_string()),
        },
    );
    regulations.insert(
        "folsom_lot".to_string(),
        RegulationRecord {
            zone_name: "Folsom Street Lot".to_string(),
            zone_type: ZoneType::Garage,
            restrictions: Restrictions {
                time_limit_minutes: None,
                enforced_hours: Some(EnforcedHours {
                    start: 6.0,
                    end: 22.0,
                }),
                enforced_days: None,
                permit_required: false,
                rate_per_hour: Some(3.00),
            },
            special_rules: None,
        },
    );
    regulations.insert(
        "cs-101".to_string(),
        RegulationRecord {
            zone_name: "Bryant Street metered curb".to_string(),
            zone_type: ZoneType::Metered,
            restrictions: Restrictions {
                time_limit_minutes: Some(60),
                enforced_hours: Some(EnforcedHours {
                    start: 9.0,
                    end: 18.0,
                }),
                enforced_days: Some(
                    ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday"]
                        .iter()
                        .map(|d| d.to_string())
                        .collect(),
                ),
                permit_required: false,
                rate_per_hour: Some(2.25),
            },
            special_rules: None,
        },
    );
    regulations.insert(
        "cs-102".to_string(),
        RegulationRecord {
            zone_name: "Folsom Street residential zone".to_string(),
            zone_type: ZoneType::Permit,
            restrictions: Restrictions {
                time_limit_minutes: None,
                enforced_hours: None,
                enforced_days: None,
                permit_required: true,
                rate_per_hour: None,
            },
            special_rules: Some("Zone Q permit holders only".to_string()),
        },
    );
    regulations.insert(
        "cs-103".to_string(),
        RegulationRecord {
            zone_name: "Howard Street curb".to_string(),
            zone_type: ZoneType::Free,
            restrictions: Restrictions::default(),
            special_rules: None,
        },
    );
    regulations
}
