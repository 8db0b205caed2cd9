pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

// WGS-84
const EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const ECCENTRICITY_SQUARED: f64 = 0.00669437999014;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl GroundStation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    /// Parses `"lat, lon"` as written in the station config.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lon: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=360.0).contains(&lon) {
            return None;
        }
        Some(Self::new(lat, lon, altitude_m.unwrap_or(0.0)))
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = EQUATORIAL_RADIUS_KM / (1.0 - ECCENTRICITY_SQUARED * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - ECCENTRICITY_SQUARED) + alt_km) * sin_lat,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_config_coordinates() {
        let station = GroundStation::from_coordinates("-37.814, 144.96332", Some(35.0)).unwrap();
        assert_eq!(station.latitude_deg, -37.814);
        assert_eq!(station.longitude_deg, 144.96332);
        assert_eq!(station.altitude_m, 35.0);
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(GroundStation::from_coordinates("-37.814", None).is_none());
        assert!(GroundStation::from_coordinates("north, east", None).is_none());
        assert!(GroundStation::from_coordinates("95.0, 10.0", None).is_none());
        assert!(GroundStation::from_coordinates("1, 2, 3", None).is_none());
    }

    #[test]
    fn equator_station_sits_on_the_x_axis() {
        let pos = GroundStation::new(0.0, 0.0, 0.0).position_ecef_km();
        assert_relative_eq!(pos[0], EQUATORIAL_RADIUS_KM, epsilon = 1e-9);
        assert_relative_eq!(pos[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(pos[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn pole_station_uses_polar_radius() {
        let pos = GroundStation::new(90.0, 0.0, 0.0).position_ecef_km();
        assert_relative_eq!(pos[2], 6356.752, epsilon = 1e-3);
    }
}
