mod celestrak;
mod error;
mod ground_station;
mod pass_finder;
mod propagation;
mod satellite_id;
mod tle_loader;
mod types;

pub use celestrak::{select, ElementCache, Origin, DEFAULT_BASE_URL};
pub use error::PredictError;
pub use ground_station::GroundStation;
pub use pass_finder::{find_events, group_passes};
pub use propagation::{position_at, Observation, PositionSource, Topocentric};
pub use satellite_id::SatelliteId;
pub use tle_loader::Satellite;
pub use types::OrbitalPass;

#[cfg(test)]
pub(crate) use tle_loader::tests as fixtures;
