use earcutr::earcut;
use glam::{DAffine3, DMat3, DVec3};

use crate::map::projection::{project, ProjectionMode};

/// A ring boundary as a connected line strip
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    pub points: Vec<DVec3>,
}

/// Axis-aligned bounds in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    fn from_points<'a>(points: impl Iterator<Item = &'a DVec3>) -> Self {
        let mut min = DVec3::splat(f64::MAX);
        let mut max = DVec3::splat(f64::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }
}

/// Invisible, hit-testable planar fill of one ring.
///
/// The shape is triangulated in its local plane (projected x/y, z ignored) and
/// placed in the world by `transform`. World-space triangles are cached since
/// geometry never changes after load.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pub transform: DAffine3,
    pub triangles: Vec<[DVec3; 3]>,
    pub bounds: Aabb,
}

impl Surface {
    /// Place local triangles in the world
    pub fn new(transform: DAffine3, local: &[[DVec3; 3]]) -> Self {
        let triangles: Vec<[DVec3; 3]> = local
            .iter()
            .map(|t| t.map(|p| transform.transform_point3(p)))
            .collect();
        let bounds = Aabb::from_points(triangles.iter().flatten());
        Self { transform, triangles, bounds }
    }
}

/// Primitives produced from a single ring
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuiltRing {
    pub outline: Option<Outline>,
    pub surface: Option<Surface>,
}

impl BuiltRing {
    pub fn is_empty(&self) -> bool {
        self.outline.is_none() && self.surface.is_none()
    }
}

/// Build the outline (and, when `interactive`, the pick surface) for one ring
/// of GeoJSON `[lon, lat]` positions.
pub fn build_ring(ring: &[Vec<f64>], radius: f64, mode: ProjectionMode, interactive: bool) -> BuiltRing {
    let points: Vec<DVec3> = ring
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| project(c[1], c[0], radius, mode))
        .collect();

    let mut built = BuiltRing::default();

    if points.len() >= 2 {
        built.outline = Some(Outline { points: points.clone() });
    }

    if interactive && points.len() >= 3 {
        match build_surface(&points, mode) {
            Ok(surface) => built.surface = Some(surface),
            Err(reason) => log::debug!("skipping pick surface for {}-point ring: {}", points.len(), reason),
        }
    }

    built
}

fn build_surface(points: &[DVec3], mode: ProjectionMode) -> Result<Surface, &'static str> {
    let mut shape: Vec<DVec3> = points.iter().map(|p| DVec3::new(p.x, p.y, 0.0)).collect();
    drop_closing_duplicate(&mut shape);
    if shape.len() < 3 {
        return Err("fewer than 3 distinct vertices");
    }
    if shape.iter().any(|p| !p.is_finite()) {
        return Err("non-finite vertex");
    }

    let flat: Vec<f64> = shape.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcut(&flat, &[], 2).map_err(|_| "triangulation failed")?;
    if indices.len() < 3 {
        return Err("triangulation produced no triangles");
    }

    let transform = match mode {
        ProjectionMode::Spherical => facing_center(points[0]),
        ProjectionMode::Flat => DAffine3::IDENTITY,
    };

    let mut local = Vec::with_capacity(indices.len() / 3);
    for tri in indices.chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (shape.get(tri[0]), shape.get(tri[1]), shape.get(tri[2])) else {
            return Err("triangulation index out of range");
        };
        local.push([*a, *b, *c]);
    }

    Ok(Surface::new(transform, &local))
}

/// Place an object at `position` with its local +Z axis pointing at the origin
/// (world +Y stays up where possible).
fn facing_center(position: DVec3) -> DAffine3 {
    let z = (-position).normalize_or_zero();
    if z == DVec3::ZERO {
        return DAffine3::from_translation(position);
    }
    let x = DVec3::Y.cross(z);
    let x = if x.length_squared() < 1e-12 { DVec3::X } else { x.normalize() };
    let y = z.cross(x);
    DAffine3::from_mat3_translation(DMat3::from_cols(x, y, z), position)
}

fn drop_closing_duplicate(points: &mut Vec<DVec3>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = points[points.len() - 1];
        if first.abs_diff_eq(last, 1e-12) {
            points.pop();
        }
    }
}
