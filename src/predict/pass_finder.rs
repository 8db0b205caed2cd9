use chrono::{DateTime, Duration, Utc};

use crate::predict::error::PredictError;
use crate::predict::propagation::PositionSource;
use crate::predict::types::{Event, EventKind, OrbitalPass};

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement

#[derive(Debug, Clone, Copy)]
struct AltitudeAt {
    time: DateTime<Utc>,
    altitude_deg: f64,
}

/// Find rise, culmination and set events within `[start, end]`, in time order.
///
/// Altitude maxima are located first from a coarse scan and refined; a
/// maximum at or above `min_elevation` is a culmination. Rise and set are
/// then crossings of `min_elevation` between consecutive extrema, so a pass
/// that clears the threshold for less than one scan step is still found.
/// A pass already above the threshold at `start` has no rise, one still
/// above it at `end` has no set, and a maximum that falls on either edge of
/// the window is not reported as a culmination.
pub fn find_events<P: PositionSource + ?Sized>(
    source: &P,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_elevation: f64,
) -> Result<Vec<Event>, PredictError> {
    let mut events = Vec::new();
    if end <= start {
        return Ok(events);
    }

    let coarse = coarse_scan(source, start, end)?;

    // Window edges and refined extrema; altitude is monotonic between neighbours.
    let mut key_points = vec![coarse[0]];
    for triple in coarse.windows(3) {
        let (before, here, after) = (triple[0], triple[1], triple[2]);

        if here.altitude_deg >= before.altitude_deg && here.altitude_deg > after.altitude_deg {
            let peak = refine_extremum(source, before.time, after.time, true)?;
            let peak = if peak.altitude_deg >= here.altitude_deg { peak } else { here };
            if peak.altitude_deg >= min_elevation && peak.time > start && peak.time < end {
                events.push(Event {
                    time: peak.time,
                    kind: EventKind::Culminate,
                    altitude_deg: peak.altitude_deg,
                });
            }
            key_points.push(peak);
        } else if here.altitude_deg <= before.altitude_deg && here.altitude_deg < after.altitude_deg
        {
            let trough = refine_extremum(source, before.time, after.time, false)?;
            let trough = if trough.altitude_deg <= here.altitude_deg { trough } else { here };
            key_points.push(trough);
        }
    }
    key_points.push(coarse[coarse.len() - 1]);
    key_points.sort_by_key(|p| p.time);

    for pair in key_points.windows(2) {
        let was_visible = pair[0].altitude_deg >= min_elevation;
        let visible = pair[1].altitude_deg >= min_elevation;

        if visible && !was_visible {
            let time = refine_crossing(source, pair[0].time, pair[1].time, true, min_elevation)?;
            events.push(event_at(source, time, EventKind::Rise)?);
        } else if was_visible && !visible {
            let time = refine_crossing(source, pair[0].time, pair[1].time, false, min_elevation)?;
            events.push(event_at(source, time, EventKind::Set)?);
        }
    }

    events.sort_by_key(|e| e.time);
    Ok(events)
}

/// Altitude every coarse step from `start`, always ending exactly at `end`.
fn coarse_scan<P: PositionSource + ?Sized>(
    source: &P,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<AltitudeAt>, PredictError> {
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
    let mut scan = vec![sample_at(source, start)?];
    let mut cursor = start;

    while cursor < end {
        cursor = (cursor + coarse_step).min(end);
        scan.push(sample_at(source, cursor)?);
    }

    Ok(scan)
}

fn sample_at<P: PositionSource + ?Sized>(
    source: &P,
    time: DateTime<Utc>,
) -> Result<AltitudeAt, PredictError> {
    Ok(AltitudeAt {
        time,
        altitude_deg: source.position_at(time)?.altitude_deg,
    })
}

/// Collect complete rise ... set sequences into passes.
pub fn group_passes(events: &[Event]) -> Vec<OrbitalPass> {
    let mut passes = Vec::new();
    let mut pending: Option<OrbitalPass> = None;

    for event in events {
        match event.kind {
            EventKind::Rise => {
                pending = Some(OrbitalPass {
                    rise: event.time,
                    culminate: None,
                    set: event.time,
                    max_altitude_deg: event.altitude_deg,
                });
            }
            EventKind::Culminate => {
                if let Some(pass) = pending.as_mut() {
                    if pass.culminate.is_none() || event.altitude_deg > pass.max_altitude_deg {
                        pass.culminate = Some(event.time);
                        pass.max_altitude_deg = event.altitude_deg;
                    }
                }
            }
            EventKind::Set => {
                if let Some(mut pass) = pending.take() {
                    pass.set = event.time;
                    if pass.rise < pass.set {
                        passes.push(pass);
                    }
                }
            }
        }
    }

    passes
}

fn event_at<P: PositionSource + ?Sized>(
    source: &P,
    time: DateTime<Utc>,
    kind: EventKind,
) -> Result<Event, PredictError> {
    Ok(Event {
        time,
        kind,
        altitude_deg: source.position_at(time)?.altitude_deg,
    })
}

/// Binary search to find exact threshold crossing time
fn refine_crossing<P: PositionSource + ?Sized>(
    source: &P,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    rising: bool,
    min_elevation: f64,
) -> Result<DateTime<Utc>, PredictError> {
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = source.position_at(mid)?.altitude_deg >= min_elevation;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    Ok(high)
}

/// Ternary search for the highest (or lowest) point between `low` and `high`.
fn refine_extremum<P: PositionSource + ?Sized>(
    source: &P,
    low: DateTime<Utc>,
    high: DateTime<Utc>,
    maximum: bool,
) -> Result<AltitudeAt, PredictError> {
    let mut low = low;
    let mut high = high;

    while (high - low).num_seconds() > 2 * FINE_STEP_SECONDS {
        let third = (high - low) / 3;
        let m1 = low + third;
        let m2 = high - third;
        let a1 = source.position_at(m1)?.altitude_deg;
        let a2 = source.position_at(m2)?.altitude_deg;
        if (a1 < a2) == maximum {
            low = m1;
        } else {
            high = m2;
        }
    }

    sample_at(source, low + (high - low) / 2)
}
