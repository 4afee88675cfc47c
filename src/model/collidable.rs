use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glam::Vec3;

const EPSILON: f32 = 1e-7;

/// A probe ray. Fields are overwritten in place every frame, never rebuilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, near: f32, far: f32) -> Self {
        Self { origin, direction, near, far }
    }

    /// Unbounded ray (far = infinity)
    pub fn unbounded(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0, f32::INFINITY)
    }

    /// Nearest hit against `objects`, children are not descended into.
    /// Distances are euclidean regardless of the direction's length.
    pub fn cast(&self, objects: &[Rc<Collidable>]) -> Option<RayHit> {
        let dir = self.direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut nearest: Option<RayHit> = None;
        for (index, object) in objects.iter().enumerate() {
            let Some(distance) = object.intersect(self.origin, dir, self.near, self.far) else {
                continue;
            };
            if nearest.as_ref().map_or(true, |hit| distance < hit.distance) {
                nearest = Some(RayHit {
                    distance,
                    point: self.origin + dir * distance,
                    index,
                    object: Rc::clone(object),
                });
            }
        }
        nearest
    }
}

#[derive(Debug, Clone)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    /// Position of the hit object in the set it was cast against
    pub index: usize,
    pub object: Rc<Collidable>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        points.into_iter().fold(
            Aabb { min: Vec3::splat(f32::INFINITY), max: Vec3::splat(f32::NEG_INFINITY) },
            |acc, p| Aabb { min: acc.min.min(*p), max: acc.max.max(*p) },
        )
    }

    /// Slab test of the segment [near, far] along a unit direction
    pub fn overlaps_segment(&self, origin: Vec3, dir: Vec3, near: f32, far: f32) -> bool {
        let mut t_min = near;
        let mut t_max = far;

        for axis in 0..3 {
            let (o, d, lo, hi) = (origin[axis], dir[axis], self.min[axis], self.max[axis]);
            if d.abs() < EPSILON {
                if o < lo || o > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t1, t2) = ((lo - o) * inv, (hi - o) * inv);
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

/// Möller–Trumbore. With `cull_back`, only triangles wound CCW towards the ray count.
pub fn intersect_triangle(origin: Vec3, dir: Vec3, tri: &[Vec3; 3], cull_back: bool) -> Option<f32> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let p = dir.cross(edge2);
    let det = edge1.dot(p);

    // det > 0 <=> the ray travels against the face normal
    if cull_back {
        if det < EPSILON {
            return None;
        }
    } else if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// World-space triangle soup a probe can hit
#[derive(Debug)]
pub struct Collidable {
    pub name: String,
    /// Ground geometry never counts as a step-up surface
    pub is_ground_plane: bool,
    pub double_sided: bool,
    triangles: Vec<[Vec3; 3]>,
    bounds: Aabb,
}

impl Collidable {
    pub fn new(name: impl Into<String>, is_ground_plane: bool, double_sided: bool, triangles: Vec<[Vec3; 3]>) -> Self {
        let bounds = Aabb::from_points(triangles.iter().flatten());
        Self {
            name: name.into(),
            is_ground_plane,
            double_sided,
            triangles,
            bounds,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Nearest distance along a unit `dir` within [near, far]
    pub fn intersect(&self, origin: Vec3, dir: Vec3, near: f32, far: f32) -> Option<f32> {
        if self.triangles.is_empty() || !self.bounds.overlaps_segment(origin, dir, near, far) {
            return None;
        }

        self.triangles
            .iter()
            .filter_map(|tri| intersect_triangle(origin, dir, tri, !self.double_sided))
            .filter(|t| *t >= near && *t <= far)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Shared, growable list of collidables.
///
/// The host appends to it (possibly long after the controller was built), the
/// controller reads it fresh every frame.
#[derive(Debug, Clone, Default)]
pub struct CollidableSet {
    inner: Rc<RefCell<Vec<Rc<Collidable>>>>,
}

impl CollidableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, object: Collidable) {
        self.inner.borrow_mut().push(Rc::new(object));
    }

    pub fn extend(&self, objects: impl IntoIterator<Item = Collidable>) {
        self.inner.borrow_mut().extend(objects.into_iter().map(Rc::new));
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn objects(&self) -> Ref<'_, Vec<Rc<Collidable>>> {
        self.inner.borrow()
    }

    pub fn cast(&self, ray: &Ray) -> Option<RayHit> {
        ray.cast(&self.inner.borrow())
    }

    pub fn hits(&self, ray: &Ray) -> bool {
        self.cast(ray).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Mesh;
    use glam::Quat;

    fn unit_box_at(name: &str, center: Vec3) -> Collidable {
        let mut mesh = Mesh::cuboid(Vec3::ONE, [1.0; 4]);
        mesh.transform(Quat::IDENTITY, center);
        Collidable::new(name, false, false, mesh.triangles())
    }

    #[test]
    fn test_raycast_hit_distance() {
        let set = CollidableSet::new();
        set.push(unit_box_at("crate", Vec3::new(5.0, 0.0, 0.0)));

        let origin = Vec3::new(0.0, 0.1, 0.2);
        let hit = set.cast(&Ray::unbounded(origin, Vec3::X)).expect("should hit the box");
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert!((hit.point - Vec3::new(4.5, 0.1, 0.2)).length() < 1e-5);
        assert_eq!(hit.object.name, "crate");
    }

    #[test]
    fn test_raycast_respects_far() {
        let set = CollidableSet::new();
        set.push(unit_box_at("crate", Vec3::new(5.0, 0.0, 0.0)));

        let origin = Vec3::new(0.0, 0.1, 0.2);
        assert!(!set.hits(&Ray::new(origin, Vec3::X, 0.0, 4.0)));
        assert!(set.hits(&Ray::new(origin, Vec3::X, 0.0, 4.6)));
    }

    #[test]
    fn test_raycast_miss_behind() {
        let set = CollidableSet::new();
        set.push(unit_box_at("crate", Vec3::new(5.0, 0.0, 0.0)));
        assert!(set.cast(&Ray::unbounded(Vec3::ZERO, Vec3::NEG_X)).is_none());
    }

    #[test]
    fn test_raycast_nearest_of_many() {
        let set = CollidableSet::new();
        set.push(unit_box_at("far", Vec3::new(10.0, 0.0, 0.0)));
        set.push(unit_box_at("near", Vec3::new(3.0, 0.0, 0.0)));

        let hit = set.cast(&Ray::unbounded(Vec3::new(0.0, 0.1, 0.2), Vec3::X)).unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(hit.object.name, "near");
    }

    #[test]
    fn test_backfaces_are_culled() {
        // From inside a single sided box nothing is hit
        let set = CollidableSet::new();
        set.push(unit_box_at("shell", Vec3::ZERO));
        assert!(set.cast(&Ray::unbounded(Vec3::ZERO, Vec3::X)).is_none());
    }

    #[test]
    fn test_double_sided_plane_hit_from_below() {
        let plane = Mesh::plane(10.0, 10.0, [1.0; 4]);
        let set = CollidableSet::new();
        set.push(Collidable::new("floor", true, true, plane.triangles()));

        let up = set.cast(&Ray::unbounded(Vec3::new(0.3, -2.0, 0.1), Vec3::Y)).unwrap();
        assert!((up.distance - 2.0).abs() < 1e-5);
        let down = set.cast(&Ray::unbounded(Vec3::new(1.0, 3.0, -2.0), Vec3::NEG_Y)).unwrap();
        assert!((down.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_unnormalized_direction_distance_is_euclidean() {
        let plane = Mesh::plane(10.0, 10.0, [1.0; 4]);
        let set = CollidableSet::new();
        set.push(Collidable::new("floor", true, true, plane.triangles()));

        let hit = set.cast(&Ray::unbounded(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0))).unwrap();
        assert!((hit.distance - 2f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_empty_set_never_hits() {
        let set = CollidableSet::new();
        assert!(set.is_empty());
        assert!(set.cast(&Ray::unbounded(Vec3::ZERO, Vec3::NEG_Y)).is_none());
    }

    #[test]
    fn test_clones_share_objects() {
        let set = CollidableSet::new();
        let handle = set.clone();
        handle.push(unit_box_at("late", Vec3::new(0.0, -3.0, 0.0)));
        assert_eq!(set.len(), 1);
        assert!(set.hits(&Ray::unbounded(Vec3::new(0.1, 0.0, 0.2), Vec3::NEG_Y)));
    }

    #[test]
    fn test_aabb_segment_overlap() {
        let aabb = Aabb { min: Vec3::splat(-1.0), max: Vec3::splat(1.0) };
        assert!(aabb.overlaps_segment(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 0.0, 10.0));
        assert!(!aabb.overlaps_segment(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 0.0, 3.0));
        assert!(!aabb.overlaps_segment(Vec3::new(-5.0, 2.0, 0.0), Vec3::X, 0.0, 10.0));
    }
}
