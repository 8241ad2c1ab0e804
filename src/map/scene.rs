use glam::DVec3;

use crate::map::assembly::PrimitiveSet;
use crate::map::projection::{project, ProjectionMode};
use crate::map::ring::Outline;

/// Density of the exp2 depth fog used on the globe
pub const GLOBE_FOG_DENSITY: f64 = 0.3;
/// Globe radius the fog density and camera distances are tuned for
pub const REFERENCE_RADIUS: f64 = 2.0;
/// Wireframe spacing, 32 meridians by 16 bands
pub const GRATICULE_STEP: f64 = 11.25;

/// Half extent of the cube the starfield is scattered in
const STAR_SPREAD: f64 = 300.0;
const STAR_SEED: u64 = 0x5eed;

/// Exponential-squared distance fog
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub density: f64,
}

impl Fog {
    pub fn exp2(density: f64) -> Self {
        Self { density }
    }

    /// Globe fog for a sphere of `radius`, thinned so it fades the same
    /// fraction of the globe at any size
    pub fn globe(radius: f64) -> Self {
        Self::exp2(GLOBE_FOG_DENSITY * REFERENCE_RADIUS / radius)
    }

    /// Fraction of the original color left at `distance` (1 = unfogged)
    #[inline]
    pub fn visibility(&self, distance: f64) -> f64 {
        let d = self.density * distance;
        (-(d * d)).exp()
    }
}

/// Background points, drawn only with the globe
pub struct Starfield {
    pub points: Vec<DVec3>,
}

impl Starfield {
    pub fn new(count: usize) -> Self {
        let points = (0..count as u64)
            .map(|i| {
                let coord = |axis: u64| unit_noise(STAR_SEED, i * 3 + axis) * 2.0 * STAR_SPREAD - STAR_SPREAD;
                DVec3::new(coord(0), coord(1), coord(2))
            })
            .collect();
        Self { points }
    }
}

/// splitmix64 of (seed, index) mapped to [0, 1)
#[inline(always)]
fn unit_noise(seed: u64, index: u64) -> f64 {
    let mut x = seed ^ index.wrapping_mul(0x9e3779b97f4a7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    (x >> 11) as f64 / 9007199254740992.0
}

/// Latitude/longitude wireframe on the globe, every `step` degrees
pub fn graticule(radius: f64, step: f64) -> Vec<Outline> {
    let mut lines = Vec::new();
    let sample = 5.0;

    let mut lon = -180.0;
    while lon < 180.0 {
        let points = (0..=(180.0 / sample) as usize)
            .map(|i| project(-90.0 + i as f64 * sample, lon, radius, ProjectionMode::Spherical))
            .collect();
        lines.push(Outline { points });
        lon += step;
    }

    let mut lat = -90.0 + step;
    while lat < 90.0 {
        let points = (0..=(360.0 / sample) as usize)
            .map(|i| project(lat, -180.0 + i as f64 * sample, radius, ProjectionMode::Spherical))
            .collect();
        lines.push(Outline { points });
        lat += step;
    }

    lines
}

/// Everything the renderer draws, with per-group visibility
pub struct Scene {
    pub globe: PrimitiveSet,
    pub flat: PrimitiveSet,
    pub globe_visible: bool,
    pub flat_visible: bool,
    pub graticule: Vec<Outline>,
    pub stars: Starfield,
    pub stars_visible: bool,
    pub fog: Option<Fog>,
    pub radius: f64,
    /// True once the GeoJSON has been loaded and assembled
    pub loaded: bool,
}

impl Scene {
    /// Empty scene in globe mode
    pub fn new(radius: f64, star_count: usize) -> Self {
        Self {
            globe: PrimitiveSet::empty(ProjectionMode::Spherical),
            flat: PrimitiveSet::empty(ProjectionMode::Flat),
            globe_visible: true,
            flat_visible: false,
            graticule: graticule(radius, GRATICULE_STEP),
            stars: Starfield::new(star_count),
            stars_visible: true,
            fog: Some(Fog::globe(radius)),
            radius,
            loaded: false,
        }
    }

    /// Install freshly built sets. Visibility flags are left as they are.
    pub fn install(&mut self, globe: PrimitiveSet, flat: PrimitiveSet) {
        self.globe = globe;
        self.flat = flat;
        self.loaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fog_visibility() {
        let fog = Fog::exp2(0.3);
        assert_eq!(fog.visibility(0.0), 1.0);
        assert!(fog.visibility(3.0) > fog.visibility(7.0));
        assert!(fog.visibility(7.0) < 0.05);
    }

    #[test]
    fn test_starfield_deterministic_and_bounded() {
        let a = Starfield::new(200);
        let b = Starfield::new(200);
        assert_eq!(a.points, b.points);
        assert_eq!(a.points.len(), 200);
        for p in &a.points {
            assert!(p.abs().max_element() <= STAR_SPREAD);
        }
        assert_ne!(a.points[0], a.points[1]);
    }

    #[test]
    fn test_graticule_on_sphere() {
        let lines = graticule(2.0, GRATICULE_STEP);
        // 32 meridians + 15 parallels between the poles
        assert_eq!(lines.len(), 47);
        for p in lines.iter().flat_map(|l| l.points.iter()) {
            assert!((p.length() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_new_scene_starts_on_globe() {
        let scene = Scene::new(2.0, 10);
        assert!(scene.globe_visible && !scene.flat_visible);
        assert!(scene.stars_visible);
        assert_eq!(scene.fog, Some(Fog::exp2(GLOBE_FOG_DENSITY)));
        assert!(!scene.loaded);
    }

    #[test]
    fn test_globe_fog_scales_with_radius() {
        // Same fade at the same fraction of the radius
        let small = Fog::globe(2.0);
        let large = Fog::globe(6.0);
        assert!((small.visibility(3.0) - large.visibility(9.0)).abs() < 1e-12);
        assert_eq!(Scene::new(6.0, 0).fog, Some(large));
    }
}
