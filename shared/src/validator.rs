// ============================================================================
// Payload Validation
// ============================================================================
//
// Parses raw textual payloads from the public broker into structured models.
// Malformed input is dropped silently; the gateway gives publishers no
// feedback.
//
// ============================================================================

use sensorgate_types::{
    DataPoint, Measurement, Message, ObjectId, RawMeasurement, RawMessage,
};
use tracing::debug;

/// Separator between payloads on the bulk topics.
pub const BULK_SEPARATOR: char = '\n';

/// Parses raw measurement payloads into validated models.
#[derive(Debug, Default, Clone)]
pub struct MeasurementValidator;

impl MeasurementValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a single raw payload. Returns `None` on any schema
    /// violation, missing required field, or unparseable sensor id.
    pub fn validate(&self, raw: &str) -> Option<Measurement> {
        let parsed: RawMeasurement = match serde_json::from_str(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(error = %err, "dropping malformed measurement");
                return None;
            }
        };

        let sensor_id = match ObjectId::parse(&parsed.created_by_id) {
            Ok(id) => id,
            Err(err) => {
                debug!(error = %err, "dropping measurement with invalid sensor id");
                return None;
            }
        };

        if parsed.created_by_secret.is_empty() || parsed.data.is_empty() {
            return None;
        }

        let datapoints = parsed
            .data
            .into_values()
            .map(|dp| DataPoint {
                value: dp.value,
                unit: dp.unit,
                accuracy: dp.accuracy,
                precision: dp.precision,
            })
            .collect();

        Some(Measurement {
            sensor_id,
            secret: parsed.created_by_secret,
            longitude: parsed.longitude,
            latitude: parsed.latitude,
            created_at: parsed.created_at.unwrap_or_default(),
            datapoints,
        })
    }

    /// Validate a bulk payload: one measurement per line, invalid lines
    /// dropped.
    pub fn validate_bulk(&self, raw: &str) -> Vec<(String, Measurement)> {
        raw.split(BULK_SEPARATOR)
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                self.validate(line)
                    .map(|model| (line.to_string(), model))
            })
            .collect()
    }
}

/// Parse a single raw device message.
pub fn parse_message(raw: &str) -> Option<Message> {
    let parsed: RawMessage = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "dropping malformed message");
            return None;
        }
    };

    let sensor_id = ObjectId::parse(&parsed.sensor_id).ok()?;

    if parsed.secret.is_empty() {
        return None;
    }

    Some(Message {
        sensor_id,
        secret: parsed.secret,
        data: parsed.data,
    })
}

/// Parse a bulk message payload, dropping invalid lines.
pub fn parse_messages(raw: &str) -> Vec<(String, Message)> {
    raw.split(BULK_SEPARATOR)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_message(line).map(|model| (line.to_string(), model)))
        .collect()
}
