use std::f64::consts::FRAC_PI_2;

use glam::DVec3;

use super::ellipsoid::Ellipsoid;

/// Toms region 1 constant from the closed-form geocentric-to-geodetic
/// approximation (Toms 1996).
const AD_C: f64 = 1.0026;
/// cos(67.5 degrees), the region boundary for the height formula.
const COS_67P5: f64 = 0.382_683_432_365_089_77;

/// asin with the argument clamped to [-1, 1]. Floating-point overshoot in
/// the conversion chain would otherwise produce NaN; clamping saturates to
/// +-pi/2 instead.
pub fn safe_asin(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

/// Converts a geocentric (ECEF, meters) position to geodetic
/// (latitude rad, longitude rad, elevation m). The Toms 1996 closed form
/// seeds the latitude, which is then refined to machine precision so the
/// round trip with [`geodetic_to_geocentric`] holds below a micrometer.
///
/// The degenerate input x == y == z == 0 has no physical meaning; the
/// algorithm resolves it as the north pole at elevation -semi_minor, which
/// callers should not rely on.
pub fn geocentric_to_geodetic(ellipsoid: &Ellipsoid, pos: DVec3) -> (f64, f64, f64) {
    let a = ellipsoid.semi_major;
    let b = ellipsoid.semi_minor();
    let e2 = ellipsoid.eccentricity_squared();
    let ep2 = ellipsoid.second_eccentricity_squared();
    let (x, y, z) = (pos.x, pos.y, pos.z);

    let mut at_pole = false;
    let mut latitude = 0.0;
    let longitude;
    if x != 0.0 {
        longitude = y.atan2(x);
    } else if y > 0.0 {
        longitude = FRAC_PI_2;
    } else if y < 0.0 {
        longitude = -FRAC_PI_2;
    } else {
        at_pole = true;
        longitude = 0.0;
        if z > 0.0 {
            latitude = FRAC_PI_2;
        } else if z < 0.0 {
            latitude = -FRAC_PI_2;
        } else {
            return (FRAC_PI_2, 0.0, -b);
        }
    }

    let w2 = x * x + y * y;
    let w = w2.sqrt();
    let t0 = z * AD_C;
    let s0 = (t0 * t0 + w2).sqrt();
    let sin_b0 = t0 / s0;
    let cos_b0 = w / s0;
    let sin3_b0 = sin_b0 * sin_b0 * sin_b0;
    let t1 = z + b * ep2 * sin3_b0;
    let sum = w - a * e2 * cos_b0 * cos_b0 * cos_b0;
    let s1 = (t1 * t1 + sum * sum).sqrt();
    let sin_p1 = t1 / s1;
    let cos_p1 = sum / s1;

    if !at_pole {
        latitude = (sin_p1 / cos_p1).atan();
        // The closed-form estimate is good to about 1e-9 rad, which still
        // leaves millimeters of height error at mid latitudes. A few
        // fixed-point passes on tan(lat) = (z + e2*Rn*sin(lat)) / w
        // converge it to machine precision (contraction ~e2 per pass).
        for _ in 0..3 {
            let s = latitude.sin();
            let rn = a / (1.0 - e2 * s * s).sqrt();
            latitude = (z + rn * e2 * s).atan2(w);
        }
    }

    let (sin_lat, cos_lat) = latitude.sin_cos();
    let rn = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let elevation = if cos_lat >= COS_67P5 {
        w / cos_lat - rn
    } else {
        z / sin_lat + rn * (e2 - 1.0)
    };

    (latitude, longitude, elevation)
}

/// Converts geodetic (latitude rad, longitude rad, elevation m) to
/// geocentric (ECEF, meters). Direct closed-form ellipsoid projection, the
/// algebraic inverse of [`geocentric_to_geodetic`] to within floating-point
/// round-trip tolerance.
pub fn geodetic_to_geocentric(
    ellipsoid: &Ellipsoid,
    latitude: f64,
    longitude: f64,
    elevation: f64,
) -> DVec3 {
    let e2 = ellipsoid.eccentricity_squared();
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let rn = ellipsoid.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    DVec3::new(
        (rn + elevation) * cos_lat * longitude.cos(),
        (rn + elevation) * cos_lat * longitude.sin(),
        (rn * (1.0 - e2) + elevation) * sin_lat,
    )
}
