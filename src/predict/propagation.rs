use chrono::{DateTime, Utc};

use crate::predict::error::PredictError;
use crate::predict::ground_station::{GroundStation, EARTH_ROTATION_RAD_S};
use crate::predict::tle_loader::Satellite;

/// Position of a satellite as seen from a ground station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Topocentric {
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,
}

/// Anything that can say where one satellite is, from one station, at a
/// given instant.
pub trait PositionSource {
    fn position_at(&self, timestamp: DateTime<Utc>) -> Result<Topocentric, PredictError>;
}

/// A satellite bound to the station it is observed from.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub satellite: &'a Satellite,
    pub station: &'a GroundStation,
}

impl<'a> Observation<'a> {
    pub fn new(satellite: &'a Satellite, station: &'a GroundStation) -> Self {
        Self { satellite, station }
    }
}

impl PositionSource for Observation<'_> {
    fn position_at(&self, timestamp: DateTime<Utc>) -> Result<Topocentric, PredictError> {
        position_at(self.satellite, self.station, timestamp)
    }
}

pub fn position_at(
    satellite: &Satellite,
    station: &GroundStation,
    timestamp: DateTime<Utc>,
) -> Result<Topocentric, PredictError> {
    let minutes = satellite
        .elements
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let prediction = satellite
        .constants
        .propagate(minutes)
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let sidereal =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));

    let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);
    // Earth-fixed: the station is at rest in this frame.
    let sat_vel_ecef = teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal);

    let sta_ecef = station.position_ecef_km();

    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
    if range_km <= 0.0 {
        return Err(PredictError::Propagation(format!(
            "satellite coincides with the station at {}",
            timestamp
        )));
    }

    let (east, north, up) = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
    let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
    let altitude_deg = (up / range_km).clamp(-1.0, 1.0).asin().to_degrees();

    let range_rate_km_s =
        (sat_vel_ecef[0] * dr[0] + sat_vel_ecef[1] * dr[1] + sat_vel_ecef[2] * dr[2]) / range_km;

    Ok(Topocentric {
        altitude_deg,
        azimuth_deg,
        range_km,
        range_rate_km_s,
    })
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = [
        vel_teme[0] * cos_gmst + vel_teme[1] * sin_gmst,
        -vel_teme[0] * sin_gmst + vel_teme[1] * cos_gmst,
        vel_teme[2],
    ];
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::tle_loader::tests::iss;
    use approx::assert_relative_eq;
    use chrono::Duration;

    #[test]
    fn enu_of_local_zenith_is_up() {
        let station = GroundStation::new(-37.814, 144.96332, 0.0);
        let pos = station.position_ecef_km();
        let norm = (pos[0] * pos[0] + pos[1] * pos[1] + pos[2] * pos[2]).sqrt();
        let lat = station.lat_rad();
        let lon = station.lon_rad();
        // geodetic normal, not the geocentric direction
        let normal = [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()];
        let (e, n, u) = ecef_to_enu([normal[0] * norm, normal[1] * norm, normal[2] * norm], lat, lon);
        assert_relative_eq!(e, 0.0, epsilon = 1e-9);
        assert_relative_eq!(n, 0.0, epsilon = 1e-9);
        assert_relative_eq!(u, norm, epsilon = 1e-9);
    }

    #[test]
    fn teme_rotation_preserves_length() {
        let v = [1000.0, -2000.0, 3000.0];
        let r = teme_to_ecef_position(v, 1.234);
        let len = |a: [f64; 3]| (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
        assert_relative_eq!(len(v), len(r), epsilon = 1e-9);
        assert_eq!(r[2], v[2]);
    }

    #[test]
    fn iss_position_is_physical() {
        let sat = iss();
        let station = GroundStation::new(-37.814, 144.96332, 0.0);
        let observation = Observation::new(&sat, &station);
        let position = observation.position_at(sat.epoch()).unwrap();
        assert!((-90.0..=90.0).contains(&position.altitude_deg));
        assert!((0.0..360.0).contains(&position.azimuth_deg));
        // low earth orbit: between overhead altitude and the far side of the Earth
        assert!(position.range_km > 300.0 && position.range_km < 14_000.0);
        assert!(position.range_rate_km_s.abs() < 10.0);
    }

    #[test]
    fn range_rate_matches_the_change_in_range() {
        let sat = iss();
        let station = GroundStation::new(0.0, 0.0, 0.0);
        let half_step = Duration::milliseconds(500);

        for k in 0..200 {
            let t = sat.epoch() + Duration::minutes(7 * k);
            let rate = position_at(&sat, &station, t).unwrap().range_rate_km_s;
            let ahead = position_at(&sat, &station, t + half_step).unwrap().range_km;
            let behind = position_at(&sat, &station, t - half_step).unwrap().range_km;
            let finite_difference = ahead - behind;
            assert!(
                (finite_difference - rate).abs() < 0.01,
                "at {}: range changed {:.4} km/s, reported {:.4} km/s",
                t,
                finite_difference,
                rate
            );
        }
    }
}
