/*
 * Obstacle Module
 *
 * This module defines the ObstacleField capability the steering core reads
 * obstacle geometry through: per-obstacle world-space surface samples and a
 * nearest-hit raycast against the whole field. Any renderer or physics layer
 * can adapt its own geometry to this trait.
 *
 * ShapeField is the built-in implementation, covering flat quads, spheres,
 * bare sample clouds and the six-walled box that keeps a flock contained.
 */

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::params::DEFAULT_REPULSION_STRENGTH;

const RAY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub usize);

/// Handle to one obstacle together with its avoidance scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub repulsion_strength: f64,
}

/// Nearest intersection of a ray with the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub obstacle: ObstacleId,
    pub distance: f64,
    pub point: DVec3,
    /// Surface normal in world space. Not guaranteed to be unit length.
    pub normal: DVec3,
}

/// Read-only obstacle geometry consumed by the avoidance behavior.
pub trait ObstacleField {
    fn obstacles(&self) -> &[Obstacle];

    /// World-space surface points of `id`; empty when the obstacle has no sample data.
    fn surface_samples(&self, id: ObstacleId) -> &[DVec3];

    /// Nearest hit along `origin + t * direction`, `t >= 0`, across all obstacles.
    fn raycast(&self, origin: DVec3, direction: DVec3) -> Option<RayHit>;
}

/// An empty field, for flocks with nothing to avoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl ObstacleField for NoObstacles {
    fn obstacles(&self) -> &[Obstacle] {
        &[]
    }

    fn surface_samples(&self, _id: ObstacleId) -> &[DVec3] {
        &[]
    }

    fn raycast(&self, _origin: DVec3, _direction: DVec3) -> Option<RayHit> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Single-sided rectangle facing along `normal`.
    Quad {
        center: DVec3,
        normal: DVec3,
        /// In-plane axis for the first half extent.
        u_axis: DVec3,
        half_extents: [f64; 2],
    },
    Sphere { center: DVec3, radius: f64 },
    /// Point cloud without ray geometry; raycasts never hit it.
    Samples,
}

impl Shape {
    fn intersect(&self, origin: DVec3, direction: DVec3) -> Option<(f64, DVec3)> {
        match *self {
            Shape::Quad {
                center,
                normal,
                u_axis,
                half_extents,
            } => {
                let denom = direction.dot(normal);
                if denom.abs() < RAY_EPSILON {
                    return None;
                }
                let t = (center - origin).dot(normal) / denom;
                if t < 0.0 {
                    return None;
                }
                let point = origin + direction * t;
                let v_axis = normal.cross(u_axis);
                let local = point - center;
                let tolerance = 1e-9 * half_extents[0].max(half_extents[1]).max(1.0);
                if local.dot(u_axis).abs() > half_extents[0] + tolerance
                    || local.dot(v_axis).abs() > half_extents[1] + tolerance
                {
                    return None;
                }
                Some((t, normal))
            }
            Shape::Sphere { center, radius } => {
                let oc = origin - center;
                let b = oc.dot(direction);
                let c = oc.length_squared() - radius * radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                // Nearest non-negative root; the far root covers origins inside the sphere.
                let t = if -b - root >= 0.0 { -b - root } else { -b + root };
                if t < 0.0 {
                    return None;
                }
                let point = origin + direction * t;
                Some((t, point - center))
            }
            Shape::Samples => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    obstacle: Obstacle,
    shape: Shape,
    samples: Vec<DVec3>,
}

/// Obstacle field built from simple analytic shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeField {
    entries: Vec<Entry>,
    // Mirrors entries[i].obstacle so obstacles() can hand out a slice.
    obstacles: Vec<Obstacle>,
}

impl ShapeField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ObstacleId, &Shape)> + '_ {
        self.entries.iter().map(|entry| (entry.obstacle.id, &entry.shape))
    }

    fn push(&mut self, shape: Shape, samples: Vec<DVec3>, repulsion_strength: f64) -> ObstacleId {
        let id = ObstacleId(self.entries.len());
        let obstacle = Obstacle { id, repulsion_strength };
        self.entries.push(Entry { obstacle, shape, samples });
        self.obstacles.push(obstacle);
        id
    }

    /// Adds a rectangle sampled on a grid no coarser than `spacing`, edges included.
    pub fn add_quad(
        &mut self,
        center: DVec3,
        normal: DVec3,
        u_axis: DVec3,
        half_extents: [f64; 2],
        spacing: f64,
        repulsion_strength: f64,
    ) -> ObstacleId {
        let normal = normal.normalize_or(DVec3::Z);
        // Project u onto the plane so the quad's frame stays orthonormal.
        let u_axis = (u_axis - normal * u_axis.dot(normal)).normalize_or(normal.any_orthonormal_vector());
        let v_axis = normal.cross(u_axis);

        let steps = |half: f64| ((2.0 * half / spacing.max(f64::EPSILON)).ceil() as usize).max(1);
        let (nu, nv) = (steps(half_extents[0]), steps(half_extents[1]));
        let mut samples = Vec::with_capacity((nu + 1) * (nv + 1));
        for i in 0..=nu {
            let a = -half_extents[0] + 2.0 * half_extents[0] * i as f64 / nu as f64;
            for j in 0..=nv {
                let b = -half_extents[1] + 2.0 * half_extents[1] * j as f64 / nv as f64;
                samples.push(center + u_axis * a + v_axis * b);
            }
        }

        self.push(
            Shape::Quad {
                center,
                normal,
                u_axis,
                half_extents,
            },
            samples,
            repulsion_strength,
        )
    }

    /// Adds a sphere with `sample_count` points on a Fibonacci lattice.
    pub fn add_sphere(&mut self, center: DVec3, radius: f64, sample_count: usize, repulsion_strength: f64) -> ObstacleId {
        let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
        let n = sample_count.max(1);
        let samples = (0..n)
            .map(|i| {
                let y = if n == 1 { 0.0 } else { 1.0 - 2.0 * i as f64 / (n - 1) as f64 };
                let ring = (1.0 - y * y).max(0.0).sqrt();
                let theta = golden_angle * i as f64;
                center + DVec3::new(ring * theta.cos(), y, ring * theta.sin()) * radius
            })
            .collect();
        self.push(Shape::Sphere { center, radius }, samples, repulsion_strength)
    }

    /// Adds a bare sample cloud. It influences nearest-point search but never blocks rays.
    pub fn add_samples(&mut self, samples: Vec<DVec3>, repulsion_strength: f64) -> ObstacleId {
        self.push(Shape::Samples, samples, repulsion_strength)
    }

    /// Six inward-facing walls of a cube centered on the origin.
    pub fn boundary_box(half_size: f64, spacing: f64, repulsion_strength: f64) -> Self {
        let mut field = Self::new();
        let walls = [
            (DVec3::NEG_Y, DVec3::Y, DVec3::X),
            (DVec3::Y, DVec3::NEG_Y, DVec3::X),
            (DVec3::NEG_X, DVec3::X, DVec3::Z),
            (DVec3::X, DVec3::NEG_X, DVec3::Z),
            (DVec3::Z, DVec3::NEG_Z, DVec3::X),
            (DVec3::NEG_Z, DVec3::Z, DVec3::X),
        ];
        for (side, inward, u_axis) in walls {
            field.add_quad(
                side * half_size,
                inward,
                u_axis,
                [half_size, half_size],
                spacing,
                repulsion_strength,
            );
        }
        field
    }

    /// Boundary box with the default repulsion strength.
    pub fn default_box(half_size: f64) -> Self {
        Self::boundary_box(half_size, half_size / 8.0, DEFAULT_REPULSION_STRENGTH)
    }
}

impl ObstacleField for ShapeField {
    fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    fn surface_samples(&self, id: ObstacleId) -> &[DVec3] {
        self.entries
            .get(id.0)
            .map(|entry| entry.samples.as_slice())
            .unwrap_or(&[])
    }

    fn raycast(&self, origin: DVec3, direction: DVec3) -> Option<RayHit> {
        let len = direction.length();
        if len < RAY_EPSILON || !len.is_finite() {
            return None;
        }
        let direction = direction / len;

        let mut best: Option<RayHit> = None;
        for entry in &self.entries {
            let Some((distance, normal)) = entry.shape.intersect(origin, direction) else {
                continue;
            };
            // Entries are scanned in id order, so ties keep the lower id.
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(RayHit {
                    obstacle: entry.obstacle.id,
                    distance,
                    point: origin + direction * distance,
                    normal,
                });
            }
        }
        best
    }
}
