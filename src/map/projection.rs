use glam::DVec3;
use std::f64::consts::PI;

/// Divisor applied to the radius in flat mode so the plane spans roughly the
/// same screen size as the sphere of that radius.
pub const FLAT_SCALE_DIVISOR: f64 = 50.0;

/// Which surface geographic coordinates are mapped onto
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectionMode {
    /// 3D globe
    Spherical,
    /// 2D equirectangular plane at z = 0
    Flat,
}

/// Project a geographic coordinate (degrees) to a 3D position.
///
/// Spherical output keeps the renderer's orientation convention: longitude is
/// offset by 180° and x is sign-flipped, so (0°, 0°) lands on +X and the
/// north pole on +Y. Out-of-range input is not validated.
#[inline(always)]
pub fn project(lat: f64, lon: f64, radius: f64, mode: ProjectionMode) -> DVec3 {
    match mode {
        ProjectionMode::Spherical => {
            let phi = (90.0 - lat) * (PI / 180.0);
            let theta = (lon + 180.0) * (PI / 180.0);

            DVec3::new(
                -(radius * phi.sin() * theta.cos()),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            )
        }
        ProjectionMode::Flat => {
            let scale = radius / FLAT_SCALE_DIVISOR;
            DVec3::new(lon * scale, lat * scale, 0.0)
        }
    }
}
