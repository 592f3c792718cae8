use std::f64::consts::PI;

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use super::ellipsoid::{Ellipsoid, ProjectionError, TransverseMercatorParams};
use super::geocentric::{geocentric_to_geodetic, geodetic_to_geocentric};
use super::rotation::{eulers_to_matrix, hpr_to_matrix, matrix_to_eulers, matrix_to_hpr, zflop};
use super::tranmerc::TransverseMercator;

pub const UTM_SCALE_FACTOR: f64 = 0.9996;
pub const UTM_FALSE_EASTING: f64 = 500_000.0;
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

pub const MIN_EASTING: f64 = 100_000.0;
pub const MAX_EASTING: f64 = 900_000.0;
pub const MIN_NORTHING: f64 = 0.0;
pub const MAX_NORTHING: f64 = 10_000_000.0;

// UTM latitude domain, matching the projection origin bounds.
const MIN_UTM_LAT: f64 = -80.5 * PI / 180.0;
const MAX_UTM_LAT: f64 = 84.5 * PI / 180.0;

/// How externally received world coordinates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IncomingCoordinateType {
    /// ECEF XYZ meters.
    #[default]
    Geocentric,
    /// Latitude (rad), longitude (rad), elevation (m).
    Geodetic,
    /// Easting, northing, elevation in the configured zone.
    Utm,
}

/// How local coordinates wrap around the simulated terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocalCoordinateType {
    /// Flat plate: origin offset plus rotation.
    #[default]
    Cartesian,
    /// Spherical wrap scaled to `globe_radius`.
    Globe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmCoord {
    pub zone: u8,
    pub hemisphere: Hemisphere,
    pub easting: f64,
    pub northing: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("easting {0} outside [{MIN_EASTING}, {MAX_EASTING}]")]
    Easting(f64),
    #[error("northing {0} outside [{MIN_NORTHING}, {MAX_NORTHING}]")]
    Northing(f64),
    #[error("latitude {0} rad outside the UTM domain (-80.5, 84.5) degrees")]
    Latitude(f64),
    #[error("longitude {0} rad outside [-pi, pi]")]
    Longitude(f64),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Process-wide geospatial configuration, set once at scenario load and
/// injected into the converter. No implicit global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    pub ellipsoid: Ellipsoid,
    pub incoming: IncomingCoordinateType,
    pub local: LocalCoordinateType,
    /// Origin of the local frame, geocentric meters.
    pub origin: DVec3,
    /// Origin rotation as heading/pitch/roll degrees.
    pub origin_rotation: DVec3,
    /// Zone incoming UTM coordinates are expressed in. Always held in [1, 60].
    pub utm_zone: u8,
    /// Hemisphere incoming UTM northings are relative to.
    pub utm_hemisphere: Hemisphere,
    /// Render-space radius used by the GLOBE local mode.
    pub globe_radius: f64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            ellipsoid: Ellipsoid::WGS84,
            incoming: IncomingCoordinateType::Geocentric,
            local: LocalCoordinateType::Cartesian,
            origin: DVec3::ZERO,
            origin_rotation: DVec3::ZERO,
            utm_zone: 1,
            utm_hemisphere: Hemisphere::North,
            globe_radius: Ellipsoid::WGS84.semi_major,
        }
    }
}

/// Maps between external world coordinates (geocentric, geodetic or UTM)
/// and the local simulation frame. All conversions are pure functions of
/// the input plus the injected configuration.
#[derive(Debug, Clone)]
pub struct CoordinateConverter {
    config: GeoConfig,
    rotation: DMat3,
    rotation_inverse: DMat3,
    tranmerc: TransverseMercator,
}

impl CoordinateConverter {
    pub fn new(mut config: GeoConfig) -> Result<Self, ProjectionError> {
        config.utm_zone = clamp_zone(config.utm_zone);
        let rotation = hpr_to_matrix(config.origin_rotation);
        let tranmerc =
            TransverseMercator::new(&config.ellipsoid, &TransverseMercatorParams::default())?;
        Ok(Self {
            config,
            rotation,
            rotation_inverse: rotation.transpose(),
            tranmerc,
        })
    }

    pub fn with_defaults() -> Self {
        // The default parameter set always validates.
        match Self::new(GeoConfig::default()) {
            Ok(c) => c,
            Err(_) => unreachable!("default geo configuration is valid"),
        }
    }

    pub fn config(&self) -> &GeoConfig {
        &self.config
    }

    pub fn set_incoming_coordinate_type(&mut self, incoming: IncomingCoordinateType) {
        self.config.incoming = incoming;
    }

    pub fn set_local_coordinate_type(&mut self, local: LocalCoordinateType) {
        self.config.local = local;
    }

    pub fn set_origin(&mut self, origin: DVec3) {
        self.config.origin = origin;
    }

    pub fn set_origin_rotation(&mut self, hpr_deg: DVec3) {
        self.config.origin_rotation = hpr_deg;
        self.rotation = hpr_to_matrix(hpr_deg);
        self.rotation_inverse = self.rotation.transpose();
    }

    /// Sets the zone incoming UTM coordinates are interpreted in. Values
    /// outside [1, 60] are clamped, not rejected; the clamp is logged.
    pub fn set_utm_zone(&mut self, zone: u8) {
        let clamped = clamp_zone(zone);
        if clamped != zone {
            log::warn!("UTM zone {zone} out of range, clamped to {clamped}");
        }
        self.config.utm_zone = clamped;
    }

    pub fn set_utm_hemisphere(&mut self, hemisphere: Hemisphere) {
        self.config.utm_hemisphere = hemisphere;
    }

    pub fn set_globe_radius(&mut self, radius: f64) {
        self.config.globe_radius = radius;
    }

    /// Replaces the Transverse Mercator parameter set used by the plain
    /// projection entry points. UTM conversions derive their own per-zone
    /// parameters and are unaffected.
    pub fn set_transverse_mercator_parameters(
        &mut self,
        params: TransverseMercatorParams,
    ) -> Result<(), ProjectionError> {
        self.tranmerc = TransverseMercator::new(&self.config.ellipsoid, &params)?;
        Ok(())
    }

    pub fn transverse_mercator(&self) -> &TransverseMercator {
        &self.tranmerc
    }

    /// Geocentric ECEF meters to geodetic (lat rad, lon rad, elevation m).
    pub fn geocentric_to_geodetic(&self, pos: DVec3) -> (f64, f64, f64) {
        geocentric_to_geodetic(&self.config.ellipsoid, pos)
    }

    /// Geodetic (lat rad, lon rad, elevation m) to geocentric ECEF meters.
    pub fn geodetic_to_geocentric(&self, latitude: f64, longitude: f64, elevation: f64) -> DVec3 {
        geodetic_to_geocentric(&self.config.ellipsoid, latitude, longitude, elevation)
    }

    /// Derives the UTM zone number and latitude band letter for a geodetic
    /// position in degrees, including the Norway and Svalbard exceptions.
    pub fn calculate_utm_zone(lat_deg: f64, lon_deg: f64) -> (u8, char) {
        let mut zone = (((lon_deg + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60);

        // Norway: 32V is widened westward.
        if (56.0..64.0).contains(&lat_deg) && (3.0..12.0).contains(&lon_deg) {
            zone = 32;
        }
        // Svalbard: zones 32, 34, 36 are unused.
        if (72.0..84.0).contains(&lat_deg) {
            if (0.0..9.0).contains(&lon_deg) {
                zone = 31;
            } else if (9.0..21.0).contains(&lon_deg) {
                zone = 33;
            } else if (21.0..33.0).contains(&lon_deg) {
                zone = 35;
            } else if (33.0..42.0).contains(&lon_deg) {
                zone = 37;
            }
        }

        const BANDS: &[u8] = b"CDEFGHJKLMNPQRSTUVWX";
        let band_index = (((lat_deg + 80.0) / 8.0).floor() as i32).clamp(0, 19) as usize;
        (zone as u8, BANDS[band_index] as char)
    }

    /// Geodetic (lat rad, lon rad) to UTM zone/hemisphere/easting/northing.
    pub fn convert_geodetic_to_utm(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<UtmCoord, ConversionError> {
        if !(MIN_UTM_LAT..=MAX_UTM_LAT).contains(&latitude) {
            return Err(ConversionError::Latitude(latitude));
        }
        if longitude.abs() > PI {
            return Err(ConversionError::Longitude(longitude));
        }

        let (zone, _band) =
            Self::calculate_utm_zone(latitude.to_degrees(), longitude.to_degrees());
        let hemisphere = if latitude < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        };
        let tm = self.utm_projection(zone, hemisphere)?;
        let (easting, northing) = tm.forward(latitude, longitude);
        Ok(UtmCoord {
            zone,
            hemisphere,
            easting,
            northing,
        })
    }

    /// UTM zone/hemisphere/easting/northing to geodetic (lat rad, lon rad).
    /// Out-of-domain easting or northing is a reported error, never clamped.
    pub fn convert_utm_to_geodetic(
        &self,
        zone: u8,
        hemisphere: Hemisphere,
        easting: f64,
        northing: f64,
    ) -> Result<(f64, f64), ConversionError> {
        if !(MIN_EASTING..=MAX_EASTING).contains(&easting) {
            return Err(ConversionError::Easting(easting));
        }
        if !(MIN_NORTHING..=MAX_NORTHING).contains(&northing) {
            return Err(ConversionError::Northing(northing));
        }
        let tm = self.utm_projection(clamp_zone(zone), hemisphere)?;
        Ok(tm.inverse(easting, northing))
    }

    fn utm_projection(
        &self,
        zone: u8,
        hemisphere: Hemisphere,
    ) -> Result<TransverseMercator, ProjectionError> {
        let central_meridian = (f64::from(zone) * 6.0 - 183.0).to_radians();
        let params = TransverseMercatorParams {
            origin_latitude: 0.0,
            central_meridian,
            false_easting: UTM_FALSE_EASTING,
            false_northing: match hemisphere {
                Hemisphere::North => 0.0,
                Hemisphere::South => UTM_FALSE_NORTHING_SOUTH,
            },
            scale_factor: UTM_SCALE_FACTOR,
        };
        TransverseMercator::new(&self.config.ellipsoid, &params)
    }

    /// Maps an incoming world-space position to the local simulation frame.
    /// The vector is interpreted per the configured incoming type:
    /// geocentric XYZ, geodetic (lat rad, lon rad, elevation), or UTM
    /// (easting, northing, elevation) in the configured zone/hemisphere.
    pub fn convert_to_local_translation(&self, world: DVec3) -> Result<DVec3, ConversionError> {
        let ecef = match self.config.incoming {
            IncomingCoordinateType::Geocentric => world,
            IncomingCoordinateType::Geodetic => {
                self.geodetic_to_geocentric(world.x, world.y, world.z)
            }
            IncomingCoordinateType::Utm => {
                let (lat, lon) = self.convert_utm_to_geodetic(
                    self.config.utm_zone,
                    self.config.utm_hemisphere,
                    world.x,
                    world.y,
                )?;
                self.geodetic_to_geocentric(lat, lon, world.z)
            }
        };
        Ok(match self.config.local {
            LocalCoordinateType::Globe => {
                ecef * (self.config.globe_radius / self.config.ellipsoid.semi_major)
            }
            LocalCoordinateType::Cartesian => self.rotation * (ecef - self.config.origin),
        })
    }

    /// Inverse of [`convert_to_local_translation`].
    pub fn convert_to_remote_translation(&self, local: DVec3) -> Result<DVec3, ConversionError> {
        let ecef = match self.config.local {
            LocalCoordinateType::Globe => {
                local * (self.config.ellipsoid.semi_major / self.config.globe_radius)
            }
            LocalCoordinateType::Cartesian => self.rotation_inverse * local + self.config.origin,
        };
        Ok(match self.config.incoming {
            IncomingCoordinateType::Geocentric => ecef,
            IncomingCoordinateType::Geodetic => {
                let (lat, lon, elev) = self.geocentric_to_geodetic(ecef);
                DVec3::new(lat, lon, elev)
            }
            IncomingCoordinateType::Utm => {
                let (lat, lon, elev) = self.geocentric_to_geodetic(ecef);
                let utm = self.convert_geodetic_to_utm(lat, lon)?;
                DVec3::new(utm.easting, utm.northing, elev)
            }
        })
    }

    /// DIS psi-theta-phi (radians) to local heading-pitch-roll (degrees),
    /// composed with the origin rotation offset.
    pub fn convert_to_local_rotation(&self, psi: f64, theta: f64, phi: f64) -> DVec3 {
        let m = eulers_to_matrix(psi, theta, phi);
        let m = self.rotation * zflop(&m);
        matrix_to_hpr(&m)
    }

    /// Inverse of [`convert_to_local_rotation`].
    pub fn convert_to_remote_rotation(&self, hpr_deg: DVec3) -> (f64, f64, f64) {
        let m = hpr_to_matrix(hpr_deg);
        let m = zflop(&(self.rotation_inverse * m));
        matrix_to_eulers(&m)
    }
}

fn clamp_zone(zone: u8) -> u8 {
    zone.clamp(1, 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utm_zone_setter_clamps() {
        let mut conv = CoordinateConverter::with_defaults();
        conv.set_utm_zone(0);
        assert_eq!(conv.config().utm_zone, 1);
        conv.set_utm_zone(61);
        assert_eq!(conv.config().utm_zone, 60);
        conv.set_utm_zone(30);
        assert_eq!(conv.config().utm_zone, 30);
    }

    #[test]
    fn utm_zone_derivation() {
        assert_eq!(CoordinateConverter::calculate_utm_zone(37.77, -122.42).0, 10);
        assert_eq!(CoordinateConverter::calculate_utm_zone(51.48, 0.0).0, 31);
        assert_eq!(CoordinateConverter::calculate_utm_zone(35.68, 139.69).0, 54);
        // Band letters.
        assert_eq!(CoordinateConverter::calculate_utm_zone(37.77, -122.42).1, 'S');
        assert_eq!(CoordinateConverter::calculate_utm_zone(-33.86, 151.22).1, 'H');
        // Norway exception.
        assert_eq!(CoordinateConverter::calculate_utm_zone(60.0, 5.0).0, 32);
        // Svalbard exception.
        assert_eq!(CoordinateConverter::calculate_utm_zone(78.0, 20.0).0, 33);
    }

    #[test]
    fn utm_round_trip() {
        let conv = CoordinateConverter::with_defaults();
        for (lat_deg, lon_deg) in [
            (37.7749, -122.4194),
            (-33.8568, 151.2153),
            (51.4778, -0.0015),
            (1.25, 103.8),
            (-54.8, -68.3),
        ] {
            let lat = (lat_deg as f64).to_radians();
            let lon = (lon_deg as f64).to_radians();
            let utm = conv.convert_geodetic_to_utm(lat, lon).unwrap();
            let (lat2, lon2) = conv
                .convert_utm_to_geodetic(utm.zone, utm.hemisphere, utm.easting, utm.northing)
                .unwrap();
            let tol = 0.01 / 6_378_137.0;
            assert!((lat - lat2).abs() < tol, "lat at ({lat_deg}, {lon_deg})");
            assert!((lon - lon2).abs() < tol, "lon at ({lat_deg}, {lon_deg})");
        }
    }

    #[test]
    fn utm_domain_is_validated() {
        let conv = CoordinateConverter::with_defaults();
        assert!(matches!(
            conv.convert_utm_to_geodetic(10, Hemisphere::North, 50_000.0, 4_000_000.0),
            Err(ConversionError::Easting(_))
        ));
        assert!(matches!(
            conv.convert_utm_to_geodetic(10, Hemisphere::North, 500_000.0, 11_000_000.0),
            Err(ConversionError::Northing(_))
        ));
        assert!(matches!(
            conv.convert_geodetic_to_utm(86.0_f64.to_radians(), 0.0),
            Err(ConversionError::Latitude(_))
        ));
    }

    #[test]
    fn cartesian_local_translation_round_trip() {
        let mut config = GeoConfig::default();
        // Origin near San Francisco, rotated local frame.
        config.origin = geodetic_to_geocentric(
            &Ellipsoid::WGS84,
            37.7749_f64.to_radians(),
            (-122.4194_f64).to_radians(),
            0.0,
        );
        config.origin_rotation = DVec3::new(32.0, 0.0, 0.0);
        let conv = CoordinateConverter::new(config).unwrap();

        let world = conv.config().origin + DVec3::new(150.0, -75.0, 30.0);
        let local = conv.convert_to_local_translation(world).unwrap();
        let back = conv.convert_to_remote_translation(local).unwrap();
        assert!((world - back).length() < 1e-6);
    }

    #[test]
    fn geodetic_incoming_translation() {
        let mut config = GeoConfig::default();
        config.incoming = IncomingCoordinateType::Geodetic;
        config.origin = geodetic_to_geocentric(
            &Ellipsoid::WGS84,
            45.0_f64.to_radians(),
            7.0_f64.to_radians(),
            0.0,
        );
        let conv = CoordinateConverter::new(config).unwrap();

        let world = DVec3::new(45.0_f64.to_radians(), 7.0_f64.to_radians(), 0.0);
        let local = conv.convert_to_local_translation(world).unwrap();
        assert!(local.length() < 1e-6, "origin maps to local zero");

        let back = conv.convert_to_remote_translation(local).unwrap();
        assert!((world.x - back.x).abs() < 1e-9);
        assert!((world.y - back.y).abs() < 1e-9);
        assert!((world.z - back.z).abs() < 1e-6);
    }

    #[test]
    fn globe_local_translation_scales() {
        let mut config = GeoConfig::default();
        config.local = LocalCoordinateType::Globe;
        config.globe_radius = 100.0;
        let conv = CoordinateConverter::new(config).unwrap();

        let world = DVec3::new(Ellipsoid::WGS84.semi_major, 0.0, 0.0);
        let local = conv.convert_to_local_translation(world).unwrap();
        assert!((local - DVec3::new(100.0, 0.0, 0.0)).length() < 1e-9);
        let back = conv.convert_to_remote_translation(local).unwrap();
        assert!((world - back).length() < 1e-6);
    }

    #[test]
    fn rotation_conversion_round_trip() {
        let mut config = GeoConfig::default();
        config.origin_rotation = DVec3::new(12.0, -4.0, 30.0);
        let conv = CoordinateConverter::new(config).unwrap();

        let (psi, theta, phi) = (0.8, -0.4, 1.2);
        let hpr = conv.convert_to_local_rotation(psi, theta, phi);
        let (psi2, theta2, phi2) = conv.convert_to_remote_rotation(hpr);
        // Compare through the matrix; the angle triple is not unique.
        let m1 = eulers_to_matrix(psi, theta, phi);
        let m2 = eulers_to_matrix(psi2, theta2, phi2);
        for i in 0..3 {
            assert!((m1.row(i) - m2.row(i)).length() < 1e-9);
        }
    }
}
