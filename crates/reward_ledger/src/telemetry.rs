//! Device telemetry payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TelemetryBounds;
use crate::{LedgerError, Result};

/// One sensor reading as signed by the device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
}

impl Telemetry {
    /// Parse the signed payload text and check it against `bounds`
    ///
    /// Only a JSON object is accepted, never the `[temperature, humidity]`
    /// sequence form.
    pub fn parse(payload: &str, bounds: &TelemetryBounds) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| LedgerError::InvalidPayload(e.to_string()))?;
        if !value.is_object() {
            return Err(LedgerError::InvalidPayload(
                "telemetry must be a JSON object".to_string(),
            ));
        }

        let telemetry: Telemetry = serde_json::from_value(value)
            .map_err(|e| LedgerError::InvalidPayload(e.to_string()))?;
        telemetry.validate(bounds)?;
        Ok(telemetry)
    }

    /// Reject readings outside the plausible range
    pub fn validate(&self, bounds: &TelemetryBounds) -> Result<()> {
        check_range(
            "temperature",
            self.temperature,
            bounds.temperature_min,
            bounds.temperature_max,
        )?;
        check_range(
            "humidity",
            self.humidity,
            bounds.humidity_min,
            bounds.humidity_max,
        )
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    // NaN fails both comparisons, so it is rejected here too
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(LedgerError::InvalidPayload(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )))
    }
}

/// A reading as stored in the device's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub temperature: f64,
    pub humidity: f64,
    pub received_at: DateTime<Utc>,
}

impl TelemetrySample {
    pub fn new(telemetry: Telemetry, received_at: DateTime<Utc>) -> Self {
        Self {
            temperature: telemetry.temperature,
            humidity: telemetry.humidity,
            received_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_payload() {
        let telemetry =
            Telemetry::parse(r#"{"temperature":21.5,"humidity":40}"#, &TelemetryBounds::default())
                .unwrap();
        assert_eq!(telemetry.temperature, 21.5);
        assert_eq!(telemetry.humidity, 40.0);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = TelemetryBounds::default();
        assert!(Telemetry { temperature: -100.0, humidity: 0.0 }.validate(&bounds).is_ok());
        assert!(Telemetry { temperature: 80.0, humidity: 100.0 }.validate(&bounds).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let bounds = TelemetryBounds::default();
        let cases = [
            Telemetry { temperature: 80.1, humidity: 50.0 },
            Telemetry { temperature: -100.5, humidity: 50.0 },
            Telemetry { temperature: 20.0, humidity: -1.0 },
            Telemetry { temperature: 20.0, humidity: 100.01 },
            Telemetry { temperature: f64::NAN, humidity: 50.0 },
        ];
        for telemetry in cases {
            assert!(
                matches!(telemetry.validate(&bounds), Err(LedgerError::InvalidPayload(_))),
                "{:?} should be rejected",
                telemetry
            );
        }
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let bounds = TelemetryBounds::default();
        for payload in [
            "",
            "not json",
            r#"{"temperature":20}"#,
            r#"{"temperature":"20","humidity":40}"#,
            r#"[20, 40]"#,
            r#"[20.5, 40.0]"#,
            "20",
            "null",
        ] {
            assert!(
                matches!(Telemetry::parse(payload, &bounds), Err(LedgerError::InvalidPayload(_))),
                "{:?} should be rejected",
                payload
            );
        }
    }

    #[test]
    fn test_sample_serializes_received_at_camel_case() {
        let sample = TelemetrySample::new(
            Telemetry { temperature: 20.0, humidity: 40.0 },
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        );
        let json = serde_json::to_value(&sample).unwrap();
        assert!(json.get("receivedAt").is_some());
        assert_eq!(json["temperature"], 20.0);
    }
}
