//! Small helpers shared by the verification modules.

use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use der::asn1::{GeneralizedTime, UtcTime};
use x509_cert::time::Time;

use crate::error::{Error, Result};

/// Compare two byte strings without an early exit on the first difference.
///
/// The length check is not constant time; digests compared here have
/// public, fixed lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Convert an X.509 `Time` to a UTC instant.
pub fn time_to_date_time(time: &Time) -> Result<DateTime<Utc>> {
    duration_to_date_time(time.to_unix_duration())
}

/// Convert a `GeneralizedTime` to a UTC instant.
pub fn generalized_to_date_time(time: &GeneralizedTime) -> Result<DateTime<Utc>> {
    duration_to_date_time(time.to_unix_duration())
}

fn duration_to_date_time(duration: Duration) -> Result<DateTime<Utc>> {
    let secs = i64::try_from(duration.as_secs())
        .map_err(|_| Error::InvalidArgument("time out of range".to_string()))?;
    DateTime::from_timestamp(secs, duration.subsec_nanos())
        .ok_or_else(|| Error::InvalidArgument(format!("time out of range: {} s", secs)))
}

fn unix_duration(instant: &DateTime<Utc>) -> Result<Duration> {
    let secs = u64::try_from(instant.timestamp()).map_err(|_| {
        Error::InvalidArgument(format!("instant before 1970 not encodable: {}", instant))
    })?;
    Ok(Duration::from_secs(secs))
}

/// Encode an instant as `GeneralizedTime`, truncated to whole seconds.
pub fn to_generalized_time(instant: &DateTime<Utc>) -> Result<GeneralizedTime> {
    Ok(GeneralizedTime::from_unix_duration(unix_duration(instant)?)?)
}

/// Encode an instant as an X.509 `Time`.
///
/// Dates through 2049 use `UTCTime`, later ones `GeneralizedTime`
/// (RFC 5280 section 4.1.2.5).
pub fn to_x509_time(instant: &DateTime<Utc>) -> Result<Time> {
    let duration = unix_duration(instant)?;
    if instant.year() <= 2049 {
        Ok(Time::UtcTime(UtcTime::from_unix_duration(duration)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_unix_duration(
            duration,
        )?))
    }
}

/// Drop sub-second precision, matching what DER time types can carry.
pub fn truncate_to_seconds(instant: &DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(instant.timestamp(), 0).unwrap_or(*instant)
}
