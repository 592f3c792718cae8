use std::f64::consts::{PI, TAU};

use super::ellipsoid::Ellipsoid;
use super::ellipsoid::{ProjectionError, TransverseMercatorParams};

// Longitude deltas below this are treated as exactly on the central meridian.
const DLAM_EPSILON: f64 = 2.0e-10;

/// Transverse Mercator projection with precomputed fourth-order series
/// coefficients for the configured ellipsoid and parameter set.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    a: f64,
    es: f64,
    ebs: f64,
    origin_latitude: f64,
    central_meridian: f64,
    false_easting: f64,
    false_northing: f64,
    scale: f64,
    // True-meridional-distance series coefficients.
    ap: f64,
    bp: f64,
    cp: f64,
    dp: f64,
    ep: f64,
    tmd_origin: f64,
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: &Ellipsoid,
        params: &TransverseMercatorParams,
    ) -> Result<Self, ProjectionError> {
        params.validate()?;

        let a = ellipsoid.semi_major;
        let b = ellipsoid.semi_minor();
        let es = ellipsoid.eccentricity_squared();
        let ebs = ellipsoid.second_eccentricity_squared();

        let tn = (a - b) / (a + b);
        let tn2 = tn * tn;
        let tn3 = tn2 * tn;
        let tn4 = tn3 * tn;
        let tn5 = tn4 * tn;

        let mut tm = Self {
            a,
            es,
            ebs,
            origin_latitude: params.origin_latitude,
            central_meridian: params.central_meridian,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
            scale: params.scale_factor,
            ap: a * (1.0 - tn + 5.0 * (tn2 - tn3) / 4.0 + 81.0 * (tn4 - tn5) / 64.0),
            bp: 3.0 * a * (tn - tn2 + 7.0 * (tn3 - tn4) / 8.0 + 55.0 * tn5 / 64.0) / 2.0,
            cp: 15.0 * a * (tn2 - tn3 + 3.0 * (tn4 - tn5) / 4.0) / 16.0,
            dp: 35.0 * a * (tn3 - tn4 + 11.0 * tn5 / 16.0) / 48.0,
            ep: 315.0 * a * (tn4 - tn5) / 512.0,
            tmd_origin: 0.0,
        };
        tm.tmd_origin = tm.sphtmd(params.origin_latitude);
        Ok(tm)
    }

    /// True meridional distance from the equator to `latitude`.
    fn sphtmd(&self, latitude: f64) -> f64 {
        self.ap * latitude - self.bp * (2.0 * latitude).sin() + self.cp * (4.0 * latitude).sin()
            - self.dp * (6.0 * latitude).sin()
            + self.ep * (8.0 * latitude).sin()
    }

    /// Radius of curvature in the prime vertical.
    fn sphsn(&self, latitude: f64) -> f64 {
        let s = latitude.sin();
        self.a / (1.0 - self.es * s * s).sqrt()
    }

    /// Radius of curvature in the meridian.
    fn sphsr(&self, latitude: f64) -> f64 {
        let s = latitude.sin();
        let denom = (1.0 - self.es * s * s).powf(1.5);
        self.a * (1.0 - self.es) / denom
    }

    /// Projects geodetic (latitude rad, longitude rad) to (easting, northing).
    pub fn forward(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let mut lon = longitude;
        if lon > PI {
            lon -= TAU;
        }
        let mut dlam = lon - self.central_meridian;
        if dlam > PI {
            dlam -= TAU;
        }
        if dlam < -PI {
            dlam += TAU;
        }
        if dlam.abs() < DLAM_EPSILON {
            dlam = 0.0;
        }

        let s = latitude.sin();
        let c = latitude.cos();
        let c2 = c * c;
        let c3 = c2 * c;
        let c5 = c3 * c2;
        let c7 = c5 * c2;
        let t = latitude.tan();
        let tan2 = t * t;
        let tan4 = tan2 * tan2;
        let tan6 = tan4 * tan2;
        let eta = self.ebs * c2;
        let eta2 = eta * eta;
        let eta3 = eta2 * eta;
        let eta4 = eta3 * eta;

        let sn = self.sphsn(latitude);
        let tmd = self.sphtmd(latitude);

        let t1 = (tmd - self.tmd_origin) * self.scale;
        let t2 = sn * s * c * self.scale / 2.0;
        let t3 = sn * s * c3 * self.scale * (5.0 - tan2 + 9.0 * eta + 4.0 * eta2) / 24.0;
        let t4 = sn
            * s
            * c5
            * self.scale
            * (61.0 - 58.0 * tan2 + tan4 + 270.0 * eta - 330.0 * tan2 * eta + 445.0 * eta2
                + 324.0 * eta3
                - 680.0 * tan2 * eta2
                + 88.0 * eta4
                - 600.0 * tan2 * eta3
                - 192.0 * tan2 * eta4)
            / 720.0;
        let t5 = sn * s * c7 * self.scale * (1385.0 - 3111.0 * tan2 + 543.0 * tan4 - tan6)
            / 40320.0;

        let dlam2 = dlam * dlam;
        let northing = self.false_northing
            + t1
            + dlam2 * t2
            + dlam2 * dlam2 * t3
            + dlam2 * dlam2 * dlam2 * t4
            + dlam2 * dlam2 * dlam2 * dlam2 * t5;

        let t6 = sn * c * self.scale;
        let t7 = sn * c3 * self.scale * (1.0 - tan2 + eta) / 6.0;
        let t8 = sn
            * c5
            * self.scale
            * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta - 58.0 * tan2 * eta + 13.0 * eta2
                + 4.0 * eta3
                - 64.0 * tan2 * eta2
                - 24.0 * tan2 * eta3)
            / 120.0;
        let t9 = sn * c7 * self.scale * (61.0 - 479.0 * tan2 + 179.0 * tan4 - tan6) / 5040.0;

        let easting = self.false_easting
            + dlam * t6
            + dlam * dlam2 * t7
            + dlam * dlam2 * dlam2 * t8
            + dlam * dlam2 * dlam2 * dlam2 * t9;

        (easting, northing)
    }

    /// Inverse projection: (easting, northing) to geodetic (latitude rad,
    /// longitude rad). The footpoint latitude is refined iteratively; five
    /// passes are enough for double precision over the valid domain.
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let tmd = self.tmd_origin + (northing - self.false_northing) / self.scale;

        let mut sr = self.sphsr(0.0);
        let mut ftphi = tmd / sr;
        for _ in 0..5 {
            let t10 = self.sphtmd(ftphi);
            sr = self.sphsr(ftphi);
            ftphi += (tmd - t10) / sr;
        }
        sr = self.sphsr(ftphi);
        let sn = self.sphsn(ftphi);

        let c = ftphi.cos();
        let t = ftphi.tan();
        let tan2 = t * t;
        let tan4 = tan2 * tan2;
        let tan6 = tan4 * tan2;
        let eta = self.ebs * c * c;
        let eta2 = eta * eta;
        let eta3 = eta2 * eta;
        let eta4 = eta3 * eta;

        let mut de = easting - self.false_easting;
        if de.abs() < 0.0001 {
            de = 0.0;
        }

        let scale2 = self.scale * self.scale;
        let sn3 = sn * sn * sn;
        let sn5 = sn3 * sn * sn;
        let sn7 = sn5 * sn * sn;

        let t10 = t / (2.0 * sr * sn * scale2);
        let t11 = t * (5.0 + 3.0 * tan2 + eta - 4.0 * eta * eta - 9.0 * tan2 * eta)
            / (24.0 * sr * sn3 * scale2 * scale2);
        let t12 = t
            * (61.0 + 90.0 * tan2 + 46.0 * eta + 45.0 * tan4
                - 252.0 * tan2 * eta
                - 3.0 * eta2
                + 100.0 * eta3
                - 66.0 * tan2 * eta2
                - 90.0 * tan4 * eta
                + 88.0 * eta4
                + 225.0 * tan4 * eta2
                + 84.0 * tan2 * eta3
                - 192.0 * tan2 * eta4)
            / (720.0 * sr * sn5 * scale2 * scale2 * scale2);
        let t13 = t * (1385.0 + 3633.0 * tan2 + 4095.0 * tan4 + 1575.0 * tan6)
            / (40320.0 * sr * sn7 * scale2 * scale2 * scale2 * scale2);

        let de2 = de * de;
        let latitude =
            ftphi - de2 * t10 + de2 * de2 * t11 - de2 * de2 * de2 * t12 + de2 * de2 * de2 * de2 * t13;

        let t14 = 1.0 / (sn * c * self.scale);
        let t15 = (1.0 + 2.0 * tan2 + eta) / (6.0 * sn3 * c * self.scale * scale2);
        let t16 = (5.0 + 6.0 * eta + 28.0 * tan2 - 3.0 * eta2 + 8.0 * tan2 * eta + 24.0 * tan4
            - 4.0 * eta3
            + 4.0 * tan2 * eta2
            + 24.0 * tan2 * eta3)
            / (120.0 * sn5 * c * self.scale * scale2 * scale2);
        let t17 = (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6)
            / (5040.0 * sn7 * c * self.scale * scale2 * scale2 * scale2);

        let dlam = de * t14 - de * de2 * t15 + de * de2 * de2 * t16 - de * de2 * de2 * de2 * t17;
        let longitude = self.central_meridian + dlam;

        (latitude, longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utm_params(central_meridian_deg: f64, southern: bool) -> TransverseMercatorParams {
        TransverseMercatorParams {
            origin_latitude: 0.0,
            central_meridian: central_meridian_deg.to_radians(),
            false_easting: 500_000.0,
            false_northing: if southern { 10_000_000.0 } else { 0.0 },
            scale_factor: 0.9996,
        }
    }

    #[test]
    fn central_meridian_maps_to_false_easting() {
        let tm = TransverseMercator::new(&Ellipsoid::WGS84, &utm_params(9.0, false)).unwrap();
        let (easting, northing) = tm.forward(0.0, 9.0_f64.to_radians());
        assert!((easting - 500_000.0).abs() < 1e-6);
        assert!(northing.abs() < 1e-6);
    }

    #[test]
    fn meridian_arc_at_45_degrees() {
        // WGS84 meridian arc from the equator to 45N is 4984944.4 m; on the
        // central meridian the northing is that arc scaled by k0.
        let tm = TransverseMercator::new(&Ellipsoid::WGS84, &utm_params(0.0, false)).unwrap();
        let (easting, northing) = tm.forward(45.0_f64.to_radians(), 0.0);
        assert!((easting - 500_000.0).abs() < 1e-6);
        assert!((northing - 0.9996 * 4_984_944.4).abs() < 1.0, "northing {northing}");
    }

    #[test]
    fn southern_hemisphere_offsets_from_false_northing() {
        let tm = TransverseMercator::new(&Ellipsoid::WGS84, &utm_params(153.0, true)).unwrap();
        let (easting, northing) = tm.forward((-33.8568_f64).to_radians(), 151.2153_f64.to_radians());
        // West of the central meridian, below the false northing.
        assert!(easting < 500_000.0);
        assert!(northing < 10_000_000.0);
        let (lat, lon) = tm.inverse(easting, northing);
        assert!((lat.to_degrees() + 33.8568).abs() < 1e-7);
        assert!((lon.to_degrees() - 151.2153).abs() < 1e-7);
    }

    #[test]
    fn round_trip_within_a_zone() {
        let tm = TransverseMercator::new(&Ellipsoid::WGS84, &utm_params(-123.0, false)).unwrap();
        for lat_deg in [8.0, 24.0, 37.7749, 49.0, 63.0, 79.0] {
            for lon_deg in [-125.9, -124.0, -123.0, -121.5, -120.1] {
                let lat = (lat_deg as f64).to_radians();
                let lon = (lon_deg as f64).to_radians();
                let (e, n) = tm.forward(lat, lon);
                let (lat2, lon2) = tm.inverse(e, n);
                // 1 cm equivalent at the surface.
                let tol = 0.01 / 6_378_137.0;
                assert!((lat - lat2).abs() < tol, "lat at ({lat_deg}, {lon_deg})");
                assert!((lon - lon2).abs() < tol, "lon at ({lat_deg}, {lon_deg})");
            }
        }
    }
}
