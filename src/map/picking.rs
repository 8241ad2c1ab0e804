use glam::DVec3;

use crate::map::assembly::{GroupId, PrimitiveId, PrimitiveSet};
use crate::map::camera::{Camera, Ray, Viewport};
use crate::map::ring::Aabb;

const PARALLEL_EPS: f64 = 1e-14;
const MIN_DISTANCE: f64 = 1e-9;

/// Nearest surface intersection along a ray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub primitive: PrimitiveId,
    pub distance: f64,
}

/// Resolve a pointer position (dots, y down) to the country under it.
///
/// Only surfaces of `set` are tested, so callers pass the set of the active
/// projection. Returns `None` on a miss or when the hit primitive's owner
/// cannot be resolved.
pub fn pick(pointer_x: f64, pointer_y: f64, viewport: &Viewport, camera: &Camera, set: &PrimitiveSet) -> Option<GroupId> {
    let ndc = viewport.to_ndc(pointer_x, pointer_y)?;
    let ray = camera.ray(ndc);
    let hit = nearest_hit(&ray, set)?;
    owner_of(set, hit.primitive)
}

/// Closest surface hit. Equal distances keep the first primitive found.
pub fn nearest_hit(ray: &Ray, set: &PrimitiveSet) -> Option<Hit> {
    let mut best: Option<Hit> = None;

    for (id, surface) in set.surfaces() {
        let limit = best.map_or(f64::INFINITY, |h| h.distance);
        if !ray_intersects_aabb(ray, &surface.bounds, limit) {
            continue;
        }
        for tri in &surface.triangles {
            if let Some(t) = intersect_triangle(ray, tri) {
                if best.map_or(true, |h| t < h.distance) {
                    best = Some(Hit { primitive: id, distance: t });
                }
            }
        }
    }

    best
}

/// Walk from a primitive to the country group that owns it
pub fn owner_of(set: &PrimitiveSet, primitive: PrimitiveId) -> Option<GroupId> {
    let owner = set.primitive(primitive)?.owner;
    set.group(owner).map(|g| g.id)
}

/// Möller–Trumbore, double sided. Returns the ray distance.
pub fn intersect_triangle(ray: &Ray, tri: &[DVec3; 3]) -> Option<f64> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = ray.dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < PARALLEL_EPS {
        return None;
    }

    let inv = 1.0 / det;
    let s = ray.origin - tri[0];
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = ray.dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv;
    (t > MIN_DISTANCE).then_some(t)
}

fn ray_intersects_aabb(ray: &Ray, aabb: &Aabb, t_max: f64) -> bool {
    let mut t_min = 0.0_f64;
    let mut t_max = t_max;

    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.dir[axis];
        let min = aabb.min[axis];
        let max = aabb.max[axis];

        if d.abs() < 1e-12 {
            if o < min || o > max {
                return false;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (min - o) * inv;
        let mut t2 = (max - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_max < t_min {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::assembly::{assemble_json, PrimitiveKind};
    use crate::map::ring::Surface;
    use glam::{DAffine3, DVec2};
    use crate::map::projection::{project, ProjectionMode};
    use serde_json::json;

    fn flat_world() -> PrimitiveSet {
        let doc = json!({ "features": [
            {
                "properties": { "NAME": "West" },
                "geometry": { "type": "Polygon", "coordinates": [[[-40.0, -20.0], [-5.0, -20.0], [-5.0, 20.0], [-40.0, 20.0], [-40.0, -20.0]]] }
            },
            {
                "properties": { "NAME": "East" },
                "geometry": { "type": "MultiPolygon", "coordinates": [
                    [[[5.0, -20.0], [40.0, -20.0], [40.0, 20.0], [5.0, 20.0], [5.0, -20.0]]],
                    [[[60.0, 30.0], [70.0, 30.0], [70.0, 40.0], [60.0, 30.0]]]
                ] }
            }
        ]});
        assemble_json(&doc, 2.0, ProjectionMode::Flat, true)
    }

    fn screen_of(camera: &Camera, viewport: &Viewport, lon: f64, lat: f64) -> (f64, f64) {
        let (ndc, _) = camera
            .world_to_ndc(project(lat, lon, 2.0, ProjectionMode::Flat))
            .expect("visible");
        let p = viewport.from_ndc(ndc);
        (p.x, p.y)
    }

    #[test]
    fn test_triangle_hit_and_miss() {
        let tri = [DVec3::new(-1.0, -1.0, 0.0), DVec3::new(1.0, -1.0, 0.0), DVec3::new(0.0, 1.0, 0.0)];
        let ray = Ray { origin: DVec3::new(0.0, 0.0, 3.0), dir: DVec3::NEG_Z };
        assert_eq!(intersect_triangle(&ray, &tri), Some(3.0));

        let away = Ray { origin: DVec3::new(0.0, 0.0, 3.0), dir: DVec3::Z };
        assert_eq!(intersect_triangle(&away, &tri), None);

        let outside = Ray { origin: DVec3::new(2.0, 0.0, 3.0), dir: DVec3::NEG_Z };
        assert_eq!(intersect_triangle(&outside, &tri), None);

        let grazing = Ray { origin: DVec3::new(0.0, 0.0, 3.0), dir: DVec3::X };
        assert_eq!(intersect_triangle(&grazing, &tri), None);
    }

    #[test]
    fn test_pick_resolves_country() {
        let set = flat_world();
        let camera = Camera::new(10.0, 2.0);
        let viewport = Viewport::new(400, 200);

        let (x, y) = screen_of(&camera, &viewport, -20.0, 0.0);
        assert_eq!(pick(x, y, &viewport, &camera, &set), set.id_of("West"));

        // Second polygon of a multipolygon resolves to the same identity
        let (x, y) = screen_of(&camera, &viewport, 66.0, 33.0);
        assert_eq!(pick(x, y, &viewport, &camera, &set), set.id_of("East"));
    }

    #[test]
    fn test_pick_miss() {
        let set = flat_world();
        let camera = Camera::new(10.0, 2.0);
        let viewport = Viewport::new(400, 200);

        let (x, y) = screen_of(&camera, &viewport, 0.0, 0.0);
        assert_eq!(pick(x, y, &viewport, &camera, &set), None);
        assert_eq!(pick(-5.0, 10.0, &viewport, &camera, &set), None);
    }

    #[test]
    fn test_empty_set_is_noop() {
        let set = PrimitiveSet::empty(ProjectionMode::Spherical);
        let camera = Camera::new(5.0, 1.0);
        let viewport = Viewport::new(100, 100);
        assert_eq!(pick(50.0, 50.0, &viewport, &camera, &set), None);
    }

    fn quad_at(z: f64) -> PrimitiveKind {
        let a = DVec3::new(-1.0, -1.0, z);
        let b = DVec3::new(1.0, -1.0, z);
        let c = DVec3::new(1.0, 1.0, z);
        let d = DVec3::new(-1.0, 1.0, z);
        PrimitiveKind::Surface(Surface::new(DAffine3::IDENTITY, &[[a, b, c], [a, c, d]]))
    }

    #[test]
    fn test_nearest_surface_wins() {
        let mut set = PrimitiveSet::empty(ProjectionMode::Spherical);
        set.insert_group("Far".into(), String::new(), Default::default(), vec![quad_at(-1.0)]);
        set.insert_group("Near".into(), String::new(), Default::default(), vec![quad_at(1.0)]);
        set.insert_group("Behind".into(), String::new(), Default::default(), vec![quad_at(8.0)]);

        let camera = Camera::new(5.0, 1.0);
        let viewport = Viewport::new(100, 100);
        assert_eq!(pick(50.0, 50.0, &viewport, &camera, &set), set.id_of("Near"));

        let hit = nearest_hit(&camera.ray(DVec2::ZERO), &set).expect("hit");
        assert!((hit.distance - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_coplanar_tie_keeps_first() {
        let square = |lon: f64| json!([[[lon, 0.0], [lon + 10.0, 0.0], [lon + 10.0, 10.0], [lon, 10.0], [lon, 0.0]]]);
        let doc = json!({ "features": [
            { "properties": { "NAME": "Back" }, "geometry": { "type": "Polygon", "coordinates": square(-5.0) } },
            { "properties": { "NAME": "Front" }, "geometry": { "type": "Polygon", "coordinates": square(-5.0) } }
        ]});
        let set = assemble_json(&doc, 2.0, ProjectionMode::Flat, true);
        let camera = Camera::new(10.0, 1.0);
        let ray = camera.ray(camera.world_to_ndc(DVec3::new(0.0, 0.1, 0.0)).expect("visible").0);

        // Coplanar: equal distance, first found wins
        let hit = nearest_hit(&ray, &set).expect("hit");
        assert_eq!(owner_of(&set, hit.primitive), Some(0));
        assert!((hit.distance - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_pick_on_globe_far_side() {
        let doc = json!({ "features": [
            {
                "properties": { "NAME": "Backside" },
                "geometry": { "type": "Polygon", "coordinates": [[[85.0, -5.0], [95.0, -5.0], [95.0, 5.0], [85.0, 5.0], [85.0, -5.0]]] }
            }
        ]});
        let set = assemble_json(&doc, 2.0, ProjectionMode::Spherical, true);
        let (_, surface) = set.surfaces().next().expect("surface");
        let tri = surface.triangles[0];
        let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;

        // Surfaces are tested without occlusion, so the far hemisphere is pickable
        let camera = Camera::new(5.0, 1.0);
        let viewport = Viewport::new(1000, 1000);
        let (ndc, _) = camera.world_to_ndc(centroid).expect("visible");
        let p = viewport.from_ndc(ndc);

        assert_eq!(pick(p.x, p.y, &viewport, &camera, &set), set.id_of("Backside"));
    }

    #[test]
    fn test_dangling_owner_is_none() {
        let set = flat_world();
        assert_eq!(owner_of(&set, 999), None);
    }
}
