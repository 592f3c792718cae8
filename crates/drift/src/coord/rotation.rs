use glam::{DMat3, DVec3};

use super::geocentric::safe_asin;

fn mat3_from_rows(r0: DVec3, r1: DVec3, r2: DVec3) -> DMat3 {
    DMat3::from_cols(r0, r1, r2).transpose()
}

/// Builds the rotation matrix for the DIS/RPR-FOM psi-theta-phi convention
/// (yaw about Z, then pitch about Y, then roll about X; radians).
pub fn eulers_to_matrix(psi: f64, theta: f64, phi: f64) -> DMat3 {
    let (sp, cp) = psi.sin_cos();
    let (st, ct) = theta.sin_cos();
    let (sr, cr) = phi.sin_cos();
    mat3_from_rows(
        DVec3::new(cp * ct, sp * ct, -st),
        DVec3::new(cp * st * sr - sp * cr, sp * st * sr + cp * cr, ct * sr),
        DVec3::new(cp * st * cr + sp * sr, sp * st * cr - cp * sr, ct * cr),
    )
}

/// Decomposes a rotation matrix back into DIS psi-theta-phi (radians).
/// Inverse-trig steps are saturated via [`safe_asin`]; at theta = +-pi/2 the
/// psi/phi split is not unique and the decomposition returns one valid pair.
pub fn matrix_to_eulers(m: &DMat3) -> (f64, f64, f64) {
    let r0 = m.row(0);
    let r1 = m.row(1);
    let r2 = m.row(2);
    let psi = r0.y.atan2(r0.x);
    let theta = safe_asin(-r0.z);
    let phi = r1.z.atan2(r2.z);
    (psi, theta, phi)
}

/// Builds the rotation matrix for local heading-pitch-roll in degrees
/// (heading about +Z, pitch about +X, roll about +Y).
pub fn hpr_to_matrix(hpr_deg: DVec3) -> DMat3 {
    let (sh, ch) = hpr_deg.x.to_radians().sin_cos();
    let (sp, cp) = hpr_deg.y.to_radians().sin_cos();
    let (sr, cr) = hpr_deg.z.to_radians().sin_cos();
    mat3_from_rows(
        DVec3::new(ch * cr - sh * sp * sr, -sh * cp, ch * sr + sh * sp * cr),
        DVec3::new(sh * cr + ch * sp * sr, ch * cp, sh * sr - ch * sp * cr),
        DVec3::new(-cp * sr, sp, cp * cr),
    )
}

/// Decomposes a rotation matrix into heading-pitch-roll degrees.
pub fn matrix_to_hpr(m: &DMat3) -> DVec3 {
    let r0 = m.row(0);
    let r1 = m.row(1);
    let r2 = m.row(2);
    let pitch = safe_asin(r2.y);
    let heading = (-r0.y).atan2(r1.y);
    let roll = (-r2.x).atan2(r2.z);
    DVec3::new(heading.to_degrees(), pitch.to_degrees(), roll.to_degrees())
}

/// Flops the Z axis of a rotation matrix (swaps the X/Y rows and negates Z),
/// reconciling the right-handed DIS frame with the local frame convention.
/// Involutive: `zflop(zflop(m)) == m`.
pub fn zflop(m: &DMat3) -> DMat3 {
    mat3_from_rows(m.row(1), m.row(0), -m.row(2))
}
