use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::object_id::ObjectId;

/// Raw measurement payload as published by devices on the public broker.
///
/// Field names are PascalCase on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawMeasurement {
    pub created_by_id: String,
    pub created_by_secret: String,
    pub longitude: f64,
    pub latitude: f64,
    pub data: HashMap<String, RawDataPoint>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDataPoint {
    pub value: f64,
    pub unit: String,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub precision: Option<f64>,
}

/// A validated measurement ready for authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub sensor_id: ObjectId,
    pub secret: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Device-reported creation timestamp; empty means "unknown" and the
    /// platform time is substituted at serialization.
    pub created_at: String,
    pub datapoints: Vec<DataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub value: f64,
    pub unit: String,
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_measurement_wire_format() {
        let json = r#"{
            "CreatedById": "5c7c3bbd9019a1fb0a4567ef",
            "CreatedBySecret": "k1",
            "Longitude": 4.7749,
            "Latitude": 51.5877,
            "Data": {
                "Temperature": { "Value": 21.5, "Unit": "C", "Accuracy": 0.5 }
            },
            "CreatedAt": "2026-08-01T10:00:00Z"
        }"#;

        let raw: RawMeasurement = serde_json::from_str(json).unwrap();
        assert_eq!(raw.created_by_id, "5c7c3bbd9019a1fb0a4567ef");
        assert_eq!(raw.created_by_secret, "k1");
        assert_eq!(raw.data.len(), 1);

        let dp = &raw.data["Temperature"];
        assert_eq!(dp.unit, "C");
        assert_eq!(dp.accuracy, Some(0.5));
        assert_eq!(dp.precision, None);
    }

    #[test]
    fn test_raw_measurement_missing_required_field() {
        let json = r#"{ "CreatedById": "5c7c3bbd9019a1fb0a4567ef" }"#;
        assert!(serde_json::from_str::<RawMeasurement>(json).is_err());
    }

    #[test]
    fn test_created_at_defaults_to_none() {
        let json = r#"{
            "CreatedById": "5c7c3bbd9019a1fb0a4567ef",
            "CreatedBySecret": "k1",
            "Longitude": 0.0,
            "Latitude": 0.0,
            "Data": { "T": { "Value": 1.0, "Unit": "C" } }
        }"#;

        let raw: RawMeasurement = serde_json::from_str(json).unwrap();
        assert!(raw.created_at.is_none());
    }
}
