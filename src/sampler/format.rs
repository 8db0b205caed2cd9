use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Decimal places kept for altitude and azimuth.
pub const ANGLE_DECIMALS: i32 = 6;

/// `YY/MM/DD-HH:MM:SS` in the station's civil time.
pub const TIMESTAMP_FORMAT: &str = "%y/%m/%d-%H:%M:%S";

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Rounded to [`ANGLE_DECIMALS`]; values that round to zero come out as `0.0`,
/// never `-0.0`.
pub fn round_angle(value: f64) -> f64 {
    let rounded = round_to(value, ANGLE_DECIMALS);
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Like [`round_angle`], kept in `[0, 360)` so that 359.9999999 reads as 0.0.
pub fn round_azimuth(value: f64) -> f64 {
    let wrapped = round_angle(value).rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest decimal that reads back as `value`, always with a fractional
/// part: `45.0`, `10.123457`.
pub fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

pub fn format_timestamp(timestamp: DateTime<Utc>, tz: &Tz) -> String {
    timestamp.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string()
}
