mod error;
mod live;

pub use error::TrackerError;
pub use live::{LiveTracker, Reading, TrackedSatellite};
