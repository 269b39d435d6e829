//! Time utility functions

use chrono::{DateTime, SecondsFormat};

use crate::data::types::NanoTimestamp;

/// Convert nanoseconds since Unix epoch to ISO 8601 string, floored to milliseconds
pub fn nanos_to_iso_millis(nanos: u64) -> String {
    let millis = (nanos / 1_000_000) as i64;
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(|| {
            tracing::warn!(nanos, "Invalid timestamp, using epoch");
            DateTime::UNIX_EPOCH
        })
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reconstruct the unsigned nanosecond count from any wire encoding
pub fn nano_timestamp_to_u64(ts: &NanoTimestamp) -> u64 {
    match ts {
        NanoTimestamp::Split(bits) => bits.to_u64(),
        NanoTimestamp::Nanos(n) => *n,
        NanoTimestamp::Decimal(s) => s.trim().parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!(value = %s, "Invalid nanosecond string, using epoch");
            0
        }),
        NanoTimestamp::Approximate(f) if f.is_finite() && *f >= 0.0 => *f as u64,
        NanoTimestamp::Approximate(f) => {
            tracing::warn!(value = %f, "Invalid nanosecond number, using epoch");
            0
        }
    }
}

/// Decode an OTel nanosecond timestamp to an ISO 8601 string (millisecond precision)
pub fn decode_nano_timestamp(ts: &NanoTimestamp) -> String {
    nanos_to_iso_millis(nano_timestamp_to_u64(ts))
}
