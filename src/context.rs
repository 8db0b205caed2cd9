use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::{Config, ConfigError};
use crate::predict::{
    select, ElementCache, GroundStation, Observation, Origin, PredictError, Satellite, SatelliteId,
};

/// Station settings given on the command line; each one wins over the config.
#[derive(Debug, Clone, Default)]
pub struct StationOverrides {
    pub latitude_deg: Option<f64>,
    pub longitude_deg: Option<f64>,
    pub altitude_m: Option<f64>,
    pub timezone: Option<String>,
}

/// Everything an invocation works against, built once at startup.
pub struct Context {
    pub config: Config,
    pub station: GroundStation,
    /// Configured station name, unless the command line moved the station.
    pub station_name: Option<String>,
    pub timezone: Tz,
    pub elements: ElementCache,
}

impl Context {
    pub fn new(config: Config, overrides: &StationOverrides) -> Result<Self, ConfigError> {
        let (station, from_config) = resolve_station(&config, overrides)?;
        let station_name = config
            .station
            .as_ref()
            .and_then(|s| s.name.clone())
            .filter(|_| from_config);

        let zone = overrides
            .timezone
            .clone()
            .or_else(|| config.station.as_ref().and_then(|s| s.timezone.clone()))
            .ok_or(ConfigError::MissingTimeZone)?;
        let timezone: Tz = zone
            .parse()
            .map_err(|_| ConfigError::InvalidTimeZone(zone.clone()))?;

        let elements = ElementCache::new(config.tle.cache_dir.clone(), config.tle.base_url.clone());

        Ok(Self {
            config,
            station,
            station_name,
            timezone,
            elements,
        })
    }

    /// Load the satellite `id` names, refreshing elements that are too far
    /// from `now` to be trusted.
    pub fn load_satellite(
        &self,
        id: &SatelliteId,
        reload: bool,
        now: DateTime<Utc>,
    ) -> Result<Satellite, PredictError> {
        let (satellites, origin) = self.elements.load_elements(id, reload)?;
        let mut satellite = select(satellites, id)?;

        if self.is_stale(&satellite, now) && origin == Origin::Cache && self.config.tle.refresh_stale
        {
            log::info!(
                "Cached elements for {} are {:.1} days from now, downloading again",
                id,
                satellite.age_days(now).abs()
            );
            let (satellites, _) = self.elements.load_elements(id, true)?;
            satellite = select(satellites, id)?;
        }

        if self.is_stale(&satellite, now) {
            log::warn!(
                "Elements for {} ({}) have epoch {}, {:.1} days from now; predictions may be inaccurate",
                satellite.name,
                id,
                satellite.epoch().format("%Y-%m-%d %H:%M:%S UTC"),
                satellite.age_days(now).abs()
            );
        }

        Ok(satellite)
    }

    pub fn is_stale(&self, satellite: &Satellite, now: DateTime<Utc>) -> bool {
        satellite.age_days(now).abs() > self.config.tle.stale_after_days
    }

    pub fn observe<'a>(&'a self, satellite: &'a Satellite) -> Observation<'a> {
        Observation::new(satellite, &self.station)
    }
}

/// The station to observe from, and whether its position is the configured one.
fn resolve_station(
    config: &Config,
    overrides: &StationOverrides,
) -> Result<(GroundStation, bool), ConfigError> {
    let configured = match &config.station {
        Some(station) => Some(
            GroundStation::from_coordinates(&station.coordinates, Some(station.altitude_m))
                .ok_or_else(|| ConfigError::InvalidCoordinates(station.coordinates.clone()))?,
        ),
        None => None,
    };

    let (mut station, from_config) = match (overrides.latitude_deg, overrides.longitude_deg) {
        (Some(lat), Some(lon)) => {
            let coordinates = format!("{}, {}", lat, lon);
            let altitude = configured.map(|s| s.altitude_m);
            let station = GroundStation::from_coordinates(&coordinates, altitude)
                .ok_or(ConfigError::InvalidCoordinates(coordinates))?;
            (station, false)
        }
        (None, None) => (configured.ok_or(ConfigError::MissingStation)?, true),
        _ => return Err(ConfigError::MissingStation),
    };

    if let Some(altitude_m) = overrides.altitude_m {
        station.altitude_m = altitude_m;
    }
    Ok((station, from_config))
}
