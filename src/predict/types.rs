use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Rise,
    Culminate,
    Set,
}

impl EventKind {
    /// Human-readable label, naming the threshold for horizon crossings.
    pub fn describe(&self, min_elevation_deg: f64) -> String {
        match self {
            EventKind::Rise => format!("rise above {}°", min_elevation_deg),
            EventKind::Culminate => "culminate".to_string(),
            EventKind::Set => format!("set below {}°", min_elevation_deg),
        }
    }
}

/// A horizon crossing or culmination found by the pass finder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub kind: EventKind,
    pub altitude_deg: f64,
}

/// One complete pass over the station
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalPass {
    pub rise: DateTime<Utc>,
    pub culminate: Option<DateTime<Utc>>,
    pub set: DateTime<Utc>,
    pub max_altitude_deg: f64,
}

impl OrbitalPass {
    pub fn duration(&self) -> Duration {
        self.set - self.rise
    }
}
