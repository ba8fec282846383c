//! Threshold evaluation for a single reading.
//!
//! Temperature and humidity are checked independently and both may fire.
//! Bounds are inclusive: a value equal to a limit is normal. There is no lower
//! humidity bound.

use rust_decimal::Decimal;

use crate::models::{ThresholdProfile, NO_ANOMALY};

// ---

/// Outcome of checking one reading against the active profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    // ---
    pub is_anomaly: bool,
    /// Violation descriptions in rule order, or `["No anomaly"]`.
    pub details: Vec<String>,
}

pub fn evaluate(
    temperature: Decimal,
    humidity: Decimal,
    thresholds: &ThresholdProfile,
) -> Evaluation {
    // ---
    let mut violations = Vec::new();

    if temperature < thresholds.min_temp || temperature > thresholds.max_temp {
        violations.push(format!(
            "Temperature {}°C is outside range ({}-{}°C).",
            temperature, thresholds.min_temp, thresholds.max_temp
        ));
    }

    if humidity > thresholds.max_humidity {
        violations.push(format!(
            "Humidity {}% is above limit ({}%).",
            humidity, thresholds.max_humidity
        ));
    }

    if violations.is_empty() {
        Evaluation {
            is_anomaly: false,
            details: vec![NO_ANOMALY.to_string()],
        }
    } else {
        Evaluation {
            is_anomaly: true,
            details: violations,
        }
    }
}
