mod error;
mod format;
mod sink;

use chrono::{DateTime, Duration, Utc};

use crate::predict::{PositionSource, PredictError};

pub use error::SamplerError;
pub use format::{format_decimal, format_timestamp, round_angle, round_azimuth};
pub use sink::{export_pass, print_samples};

/// One sampled instant of a pass. Angles are already rounded for output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
}

/// Evenly spaced instants over the closed interval `[rise, set]`.
///
/// One instant per whole second of the pass, so a pass shorter than a
/// second has none. Both ends are included when there are two or more.
pub fn sample_instants(rise: DateTime<Utc>, set: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let span = set - rise;
    let Some(span_ns) = span.num_nanoseconds() else {
        return Vec::new();
    };
    if span_ns <= 0 {
        return Vec::new();
    }

    let count = span.num_seconds() as usize;
    match count {
        0 => Vec::new(),
        1 => vec![rise],
        _ => {
            let intervals = (count - 1) as i128;
            (0..count)
                .map(|i| {
                    let offset = span_ns as i128 * i as i128 / intervals;
                    rise + Duration::nanoseconds(offset as i64)
                })
                .collect()
        }
    }
}

/// Query `source` once per instant of the pass.
///
/// The first failed query aborts the whole pass.
pub fn sample_pass<P: PositionSource + ?Sized>(
    source: &P,
    rise: DateTime<Utc>,
    set: DateTime<Utc>,
) -> Result<Vec<Sample>, PredictError> {
    sample_instants(rise, set)
        .into_iter()
        .map(|timestamp| {
            let position = source.position_at(timestamp)?;
            Ok(Sample {
                timestamp,
                altitude_deg: round_angle(position.altitude_deg),
                azimuth_deg: round_azimuth(position.azimuth_deg),
                range_km: position.range_km,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::predict::Topocentric;
    use chrono::TimeZone;
    use std::cell::Cell;

    /// Hands out scripted altitudes in call order, failing once they run out.
    pub struct Scripted {
        pub altitudes: Vec<f64>,
        pub calls: Cell<usize>,
    }

    impl Scripted {
        pub fn new(altitudes: Vec<f64>) -> Self {
            Self {
                altitudes,
                calls: Cell::new(0),
            }
        }
    }

    impl PositionSource for Scripted {
        fn position_at(&self, _timestamp: DateTime<Utc>) -> Result<Topocentric, PredictError> {
            let i = self.calls.get();
            self.calls.set(i + 1);
            let altitude_deg = *self
                .altitudes
                .get(i)
                .ok_or_else(|| PredictError::Propagation(format!("no data for call {}", i)))?;
            Ok(Topocentric {
                altitude_deg,
                azimuth_deg: 120.0 + i as f64 + 0.0000004,
                range_km: 1234.56789,
                range_rate_km_s: -1.5,
            })
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 8, 3, 10, 0, 0).unwrap()
    }

    #[test]
    fn one_minute_pass_has_sixty_samples() {
        let rise = t0();
        let set = rise + Duration::seconds(60);
        let instants = sample_instants(rise, set);
        assert_eq!(instants.len(), 60);
        assert_eq!(instants[0], rise);
        assert_eq!(instants[59], set);
        for pair in instants.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn fractional_seconds_are_floored() {
        let rise = t0();
        let set = rise + Duration::milliseconds(2_900);
        let instants = sample_instants(rise, set);
        assert_eq!(instants, vec![rise, set]);
    }

    #[test]
    fn sub_second_pass_has_no_samples() {
        let set = t0();
        let rise = set - Duration::milliseconds(500);
        assert!(sample_instants(rise, set).is_empty());
        let source = Scripted::new(Vec::new());
        assert!(sample_pass(&source, rise, set).unwrap().is_empty());
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn one_second_pass_samples_only_the_rise() {
        let rise = t0();
        assert_eq!(sample_instants(rise, rise + Duration::seconds(1)), vec![rise]);
    }

    #[test]
    fn reversed_interval_has_no_samples() {
        assert!(sample_instants(t0(), t0() - Duration::seconds(30)).is_empty());
    }

    #[test]
    fn samples_round_angles_but_keep_range() {
        let source = Scripted::new(vec![10.123456789, 45.0]);
        let samples = sample_pass(&source, t0(), t0() + Duration::seconds(2)).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].altitude_deg, 10.123457);
        assert_eq!(samples[1].altitude_deg, 45.0);
        assert_eq!(samples[0].azimuth_deg, 120.0);
        assert_eq!(samples[0].range_km, 1234.56789);
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn failed_query_aborts_the_pass() {
        let source = Scripted::new(vec![5.0, 6.0]);
        let err = sample_pass(&source, t0(), t0() + Duration::seconds(10)).unwrap_err();
        assert!(matches!(err, PredictError::Propagation(_)));
        assert_eq!(source.calls.get(), 3);
    }
}
