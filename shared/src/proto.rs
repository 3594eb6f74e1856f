// ============================================================================
// Outbound Protobuf Encoding
// ============================================================================
//
// Wire format of the internal bulk-measurement topic. The message types are
// written out by hand instead of generated so the build does not depend on
// protoc; the schema is:
//
//   message DataPoint {
//       double value = 1;
//       string unit = 2;
//       optional double accuracy = 3;
//       optional double precision = 4;
//   }
//   message Measurement {
//       repeated DataPoint datapoints = 1;
//       double latitude = 2;
//       double longitude = 3;
//       string timestamp = 4;
//       string platformtime = 5;
//   }
//   message MeasurementData {
//       repeated Measurement measurements = 1;
//   }
//
// ============================================================================

use chrono::{SecondsFormat, Utc};
use prost::Message as ProstMessage;

use sensorgate_types::Measurement;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDataPoint {
    #[prost(double, tag = "1")]
    pub value: f64,
    #[prost(string, tag = "2")]
    pub unit: ::prost::alloc::string::String,
    #[prost(double, optional, tag = "3")]
    pub accuracy: ::core::option::Option<f64>,
    #[prost(double, optional, tag = "4")]
    pub precision: ::core::option::Option<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMeasurement {
    #[prost(message, repeated, tag = "1")]
    pub datapoints: ::prost::alloc::vec::Vec<ProtoDataPoint>,
    #[prost(double, tag = "2")]
    pub latitude: f64,
    #[prost(double, tag = "3")]
    pub longitude: f64,
    #[prost(string, tag = "4")]
    pub timestamp: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub platformtime: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeasurementData {
    #[prost(message, repeated, tag = "1")]
    pub measurements: ::prost::alloc::vec::Vec<ProtoMeasurement>,
}

/// ISO-8601 wall-clock timestamp stamped into every outbound batch.
fn platform_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize a batch of authorized measurements.
///
/// The platform time is sampled once per batch. A measurement without a
/// device timestamp inherits the platform time.
pub fn to_protobuf(measurements: &[Measurement]) -> Vec<u8> {
    let now = platform_now();
    let mut data = MeasurementData::default();

    data.measurements.reserve(measurements.len());

    for entry in measurements {
        let datapoints = entry
            .datapoints
            .iter()
            .map(|dp| ProtoDataPoint {
                value: dp.value,
                unit: dp.unit.clone(),
                accuracy: dp.accuracy,
                precision: dp.precision,
            })
            .collect();

        let timestamp = if entry.created_at.is_empty() {
            now.clone()
        } else {
            entry.created_at.clone()
        };

        data.measurements.push(ProtoMeasurement {
            datapoints,
            latitude: entry.latitude,
            longitude: entry.longitude,
            timestamp,
            platformtime: now.clone(),
        });
    }

    data.encode_to_vec()
}
