use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Lowest projection origin latitude the Transverse Mercator series stays
/// well-conditioned at (-80.5 degrees).
pub(crate) const MIN_TM_ORIGIN_LAT: f64 = -80.5 * PI / 180.0;
/// Highest projection origin latitude (84.5 degrees).
pub(crate) const MAX_TM_ORIGIN_LAT: f64 = 84.5 * PI / 180.0;

const MIN_SCALE_FACTOR: f64 = 0.3;
const MAX_SCALE_FACTOR: f64 = 3.0;

/// Reference ellipsoid, stored as the two defining parameters. Everything
/// else (eccentricities, semi-minor axis) is derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Semi-major axis in meters.
    pub semi_major: f64,
    /// Flattening (dimensionless).
    pub flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Self = Self {
        semi_major: 6_378_137.0,
        flattening: 1.0 / 298.257223563,
    };

    pub fn semi_minor(&self) -> f64 {
        self.semi_major * (1.0 - self.flattening)
    }

    /// First eccentricity squared.
    pub fn eccentricity_squared(&self) -> f64 {
        2.0 * self.flattening - self.flattening * self.flattening
    }

    /// Second eccentricity squared.
    pub fn second_eccentricity_squared(&self) -> f64 {
        let e2 = self.eccentricity_squared();
        e2 / (1.0 - e2)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("scale factor {0} outside [{MIN_SCALE_FACTOR}, {MAX_SCALE_FACTOR}]")]
    ScaleFactor(f64),
    #[error("projection origin latitude {0} rad outside (-80.5, 84.5) degrees")]
    OriginLatitude(f64),
    #[error("central meridian {0} rad outside [-pi, pi]")]
    CentralMeridian(f64),
}

/// Transverse Mercator projection parameter set. Defaults describe an
/// unshifted projection at the equator/prime meridian with unit scale; the
/// UTM wrappers substitute the standard UTM constants per zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransverseMercatorParams {
    /// Projection origin latitude in radians.
    pub origin_latitude: f64,
    /// Central meridian in radians.
    pub central_meridian: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    pub scale_factor: f64,
}

impl Default for TransverseMercatorParams {
    fn default() -> Self {
        Self {
            origin_latitude: 0.0,
            central_meridian: 0.0,
            false_easting: 0.0,
            false_northing: 0.0,
            scale_factor: 1.0,
        }
    }
}

impl TransverseMercatorParams {
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if !(MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).contains(&self.scale_factor) {
            return Err(ProjectionError::ScaleFactor(self.scale_factor));
        }
        if self.origin_latitude <= MIN_TM_ORIGIN_LAT || self.origin_latitude >= MAX_TM_ORIGIN_LAT {
            return Err(ProjectionError::OriginLatitude(self.origin_latitude));
        }
        if self.central_meridian.abs() > PI {
            return Err(ProjectionError::CentralMeridian(self.central_meridian));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgs84_derived_parameters() {
        let e = Ellipsoid::WGS84;
        assert!((e.semi_minor() - 6_356_752.314245).abs() < 1e-6);
        assert!((e.eccentricity_squared() - 0.00669437999014).abs() < 1e-12);
        assert!((e.second_eccentricity_squared() - 0.00673949674228).abs() < 1e-12);
    }

    #[test]
    fn scale_factor_bounds() {
        let mut p = TransverseMercatorParams::default();
        assert!(p.validate().is_ok());
        p.scale_factor = 0.29;
        assert!(matches!(p.validate(), Err(ProjectionError::ScaleFactor(_))));
        p.scale_factor = 3.01;
        assert!(matches!(p.validate(), Err(ProjectionError::ScaleFactor(_))));
    }

    #[test]
    fn origin_latitude_bounds() {
        let mut p = TransverseMercatorParams::default();
        p.origin_latitude = 85.0_f64.to_radians();
        assert!(matches!(p.validate(), Err(ProjectionError::OriginLatitude(_))));
        p.origin_latitude = -81.0_f64.to_radians();
        assert!(matches!(p.validate(), Err(ProjectionError::OriginLatitude(_))));
        p.origin_latitude = 45.0_f64.to_radians();
        assert!(p.validate().is_ok());
    }
}
