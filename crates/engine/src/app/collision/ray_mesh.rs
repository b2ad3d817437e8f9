use super::Space;
use crate::app::entity::Entity;
use crate::math::{Vec3, Vector};

const EPSILON: f32 = 0.000001;

/// Local-space triangle mesh with its model transform. Triangles are indices
/// into `vertices`, wound counter-clockwise when seen from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[usize; 3]>,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Mesh {
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            rotation: Vec3::ZERO,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// Axis-aligned box centred on the local origin.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size.scaled(0.5);
        let vertices = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        let triangles = vec![
            [4, 5, 6],
            [4, 6, 7],
            [0, 2, 1],
            [0, 3, 2],
            [1, 2, 6],
            [1, 6, 5],
            [0, 4, 7],
            [0, 7, 3],
            [3, 7, 6],
            [3, 6, 2],
            [0, 1, 5],
            [0, 5, 4],
        ];
        Self::new(vertices, triangles)
    }

    /// Model-to-world: scale, then rotate, then translate to `origin`.
    pub fn world_vertex(&self, origin: Vec3, local: Vec3) -> Vec3 {
        local.mul_elements(self.scale).rotated(self.rotation) + origin
    }

    pub fn world_vertices(&self, origin: Vec3) -> Vec<Vec3> {
        self.vertices
            .iter()
            .map(|vertex| self.world_vertex(origin, *vertex))
            .collect()
    }

    /// Triangles with out-of-range indices are skipped.
    pub fn world_triangles(&self, origin: Vec3) -> Vec<Triangle> {
        let world = self.world_vertices(origin);
        self.triangles
            .iter()
            .filter_map(|[a, b, c]| {
                Some(Triangle::new(
                    *world.get(*a)?,
                    *world.get(*b)?,
                    *world.get(*c)?,
                ))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// `None` for a zero-length direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            direction: direction.normalized()?,
        })
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction.scaled(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Möller-Trumbore with back-face culling: only faces whose normal
    /// opposes the ray register. Returns the distance along the ray.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let h = ray.direction.cross(edge2);
        let det = edge1.dot(h);
        if det < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self.v0;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = inv_det * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(q);
        (t > EPSILON).then_some(t)
    }
}

fn nearest_hit(ray: &Ray, triangles: &[Triangle]) -> Option<f32> {
    triangles
        .iter()
        .filter_map(|triangle| triangle.intersect_ray(ray))
        .min_by(f32::total_cmp)
}

/// Casts from the subject's origin toward each of its world-space vertices;
/// a hit on a target triangle nearer than the vertex means the subject's
/// geometry reaches into a target.
fn rays_hit(subject: &dyn Entity<Vec3>, targets: &[Triangle]) -> bool {
    let Some(mesh) = subject.mesh() else {
        return false;
    };
    if targets.is_empty() {
        return false;
    }
    let origin = subject.position();
    mesh.world_vertices(origin).into_iter().any(|vertex| {
        let offset = vertex - origin;
        let Some(ray) = Ray::new(origin, offset) else {
            return false;
        };
        nearest_hit(&ray, targets).is_some_and(|distance| distance < offset.length())
    })
}

fn triangles_of(entity: &dyn Entity<Vec3>) -> Vec<Triangle> {
    entity
        .mesh()
        .map(|mesh| mesh.world_triangles(entity.position()))
        .unwrap_or_default()
}

impl Space for Vec3 {
    fn overlaps(subject: &dyn Entity<Self>, candidate: &dyn Entity<Self>) -> bool {
        is_colliding_3d(subject, candidate)
    }

    fn overlaps_any(subject: &dyn Entity<Self>, candidates: &[&dyn Entity<Self>]) -> bool {
        let targets: Vec<Triangle> = candidates
            .iter()
            .flat_map(|candidate| triangles_of(*candidate))
            .collect();
        rays_hit(subject, &targets)
    }
}

/// Entities without a mesh never collide.
pub fn is_colliding_3d(subject: &dyn Entity<Vec3>, other: &dyn Entity<Vec3>) -> bool {
    rays_hit(subject, &triangles_of(other))
}

pub fn colliding_entities_3d<'a>(
    subject: &dyn Entity<Vec3>,
    others: &[&'a dyn Entity<Vec3>],
) -> Vec<&'a dyn Entity<Vec3>> {
    others
        .iter()
        .copied()
        .filter(|other| is_colliding_3d(subject, *other))
        .collect()
}
