//! Collision primitives and wrap-aware shape queries
//!
//! Every narrow-phase test reduces to casting a ray against a convex shape:
//! - a swept circle is a ray cast against the target grown by the circle radius
//! - a capsule overlaps a polygon when its core segment hits the polygon
//!   grown by the capsule radius
//!
//! [`Torus`] repeats any of these queries across the 3x3 tile replicas of the
//! wrapping world and keeps the nearest result.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::wrap_position;

const EPSILON: f32 = 1e-6;

/// A parametric ray `origin + dir * t` for `t` in `[0, max_t]`
///
/// `dir` need not be unit length; sweeps use the full per-tick displacement
/// with `max_t = 1` so that `t` is the time of impact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec2,
    pub dir: Vec2,
    pub max_t: f32,
}

impl Ray {
    pub fn new(origin: Vec2, dir: Vec2, max_t: f32) -> Self {
        Self { origin, dir, max_t }
    }

    /// Ray covering the segment `start -> end`, parametrized over [0, 1]
    pub fn segment(start: Vec2, end: Vec2) -> Self {
        Self::new(start, end - start, 1.0)
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec2 {
        self.origin + self.dir * t
    }

    #[inline]
    fn shifted(&self, offset: Vec2) -> Self {
        Self {
            origin: self.origin + offset,
            ..*self
        }
    }
}

/// A convex shape that can be ray cast
pub trait Shape {
    /// Smallest `t` in `[0, ray.max_t]` where the ray touches the shape.
    /// A ray starting inside the shape reports `0`.
    fn raycast(&self, ray: &Ray) -> Option<f32>;
}

/// Nearest of two optional hits
#[inline]
pub fn nearest(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Clip a ray against an intersection of half-planes `normal . (x - point) <= 0`
/// (Cyrus-Beck). Returns the entry parameter.
fn clip_ray(ray: &Ray, planes: impl IntoIterator<Item = (Vec2, Vec2)>) -> Option<f32> {
    let mut t_enter = 0.0f32;
    let mut t_exit = ray.max_t;

    for (point, normal) in planes {
        let num = normal.dot(point - ray.origin);
        let den = normal.dot(ray.dir);

        if den.abs() < EPSILON {
            // Parallel to this edge: either always inside or never
            if num < 0.0 {
                return None;
            }
            continue;
        }

        let t = num / den;
        if den < 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

/// A solid circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Shape for Circle {
    fn raycast(&self, ray: &Ray) -> Option<f32> {
        let m = ray.origin - self.center;
        let c = m.length_squared() - self.radius * self.radius;
        if c <= 0.0 {
            return Some(0.0);
        }

        let a = ray.dir.length_squared();
        if a < EPSILON {
            return None;
        }
        let b = m.dot(ray.dir);
        if b >= 0.0 {
            // Outside and moving away
            return None;
        }
        let disc = b * b - a * c;
        if disc < 0.0 {
            return None;
        }

        let t = (-b - disc.sqrt()) / a;
        (t <= ray.max_t).then_some(t.max(0.0))
    }
}

/// A segment `a -> b` thickened by `radius` (stadium shape)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub a: Vec2,
    pub b: Vec2,
    pub radius: f32,
}

impl Capsule {
    pub fn new(a: Vec2, b: Vec2, radius: f32) -> Self {
        Self { a, b, radius }
    }

    /// Same core segment with a larger radius (Minkowski sum with a circle)
    pub fn inflated(&self, extra: f32) -> Self {
        Self {
            radius: self.radius + extra,
            ..*self
        }
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            a: self.a + offset,
            b: self.b + offset,
            radius: self.radius,
        }
    }

    /// Whether the capsule touches a convex polygon
    pub fn overlaps_polygon(&self, polygon: &ConvexPolygon) -> bool {
        let core = Ray::segment(self.a, self.b);
        RoundedPolygon::new(polygon, self.radius)
            .raycast(&core)
            .is_some()
    }
}

impl Shape for Capsule {
    fn raycast(&self, ray: &Ray) -> Option<f32> {
        let ends = nearest(
            Circle::new(self.a, self.radius).raycast(ray),
            Circle::new(self.b, self.radius).raycast(ray),
        );

        let axis = self.b - self.a;
        let len = axis.length();
        if len < EPSILON {
            return ends;
        }

        // Rectangle between the two end caps
        let u = axis / len;
        let n = u.perp();
        let r = self.radius;
        let body = clip_ray(
            ray,
            [
                (self.a + n * r, n),
                (self.a - n * r, -n),
                (self.b, u),
                (self.a, -u),
            ],
        );

        nearest(ends, body)
    }
}

/// A convex polygon with counter-clockwise vertices and outward edge normals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexPolygon {
    verts: Vec<Vec2>,
    normals: Vec<Vec2>,
}

impl ConvexPolygon {
    /// Build the convex hull of a point cloud. `None` if the points are
    /// degenerate (fewer than three hull vertices).
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let hull = convex_hull(points);
        (hull.len() >= 3).then(|| Self::from_ccw(hull))
    }

    /// Regular polygon centered on the origin, first vertex on +x
    pub fn regular(sides: usize, radius: f32) -> Self {
        let sides = sides.max(3);
        let verts = (0..sides)
            .map(|i| {
                let theta = i as f32 / sides as f32 * std::f32::consts::TAU;
                crate::polar_to_cartesian(radius, theta)
            })
            .collect();
        Self::from_ccw(verts)
    }

    fn from_ccw(verts: Vec<Vec2>) -> Self {
        let n = verts.len();
        let normals = (0..n)
            .map(|i| {
                let e = verts[(i + 1) % n] - verts[i];
                Vec2::new(e.y, -e.x).normalize_or_zero()
            })
            .collect();
        Self { verts, normals }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.verts
    }

    /// Edges as `(start, end)` pairs, closing back to the first vertex
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.verts.len();
        (0..n).map(move |i| (self.verts[i], self.verts[(i + 1) % n]))
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.verts
            .iter()
            .zip(&self.normals)
            .all(|(&v, &n)| n.dot(p - v) <= 0.0)
    }

    /// Distance from the local origin to the farthest vertex
    pub fn bounding_radius(&self) -> f32 {
        self.verts.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    /// Twice the signed area (positive for counter-clockwise winding)
    pub fn doubled_area(&self) -> f32 {
        self.edges().map(|(a, b)| a.perp_dot(b)).sum()
    }
}

impl Shape for ConvexPolygon {
    fn raycast(&self, ray: &Ray) -> Option<f32> {
        clip_ray(ray, self.verts.iter().copied().zip(self.normals.iter().copied()))
    }
}

/// A convex polygon grown by `radius` on every side
#[derive(Debug, Clone, Copy)]
pub struct RoundedPolygon<'a> {
    pub polygon: &'a ConvexPolygon,
    pub radius: f32,
}

impl<'a> RoundedPolygon<'a> {
    pub fn new(polygon: &'a ConvexPolygon, radius: f32) -> Self {
        Self { polygon, radius }
    }
}

impl Shape for RoundedPolygon<'_> {
    fn raycast(&self, ray: &Ray) -> Option<f32> {
        let core = self.polygon.raycast(ray);
        if self.radius <= 0.0 {
            return core;
        }
        // The rounded shape is the polygon plus a capsule along every edge
        self.polygon.edges().fold(core, |best, (a, b)| {
            nearest(best, Capsule::new(a, b, self.radius).raycast(ray))
        })
    }
}

/// Andrew's monotone chain; output is counter-clockwise without repeats
fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| (*a - *b).length_squared() < EPSILON);
    if pts.len() < 3 {
        return pts;
    }

    let turn = |o: Vec2, a: Vec2, b: Vec2| (a - o).perp_dot(b - o);
    let mut lower: Vec<Vec2> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Vec2> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// The wrapping world. Shapes near a seam also exist, translated by one world
/// size, on the far side; queries check all nine tile replicas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torus {
    pub size: Vec2,
}

impl Torus {
    pub fn new(size: Vec2) -> Self {
        Self { size }
    }

    #[inline]
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        wrap_position(p, self.size)
    }

    /// Offsets of the 3x3 tile block, row by row from (-w, -h) to (w, h)
    pub fn replica_offsets(&self) -> [Vec2; 9] {
        let mut out = [Vec2::ZERO; 9];
        let mut i = 0;
        for oy in -1..=1 {
            for ox in -1..=1 {
                out[i] = Vec2::new(ox as f32 * self.size.x, oy as f32 * self.size.y);
                i += 1;
            }
        }
        out
    }

    /// Cast against `shape` placed at `anchor` and at each tile replica;
    /// the nearest hit wins
    pub fn raycast<S: Shape + ?Sized>(&self, shape: &S, anchor: Vec2, ray: &Ray) -> Option<f32> {
        self.replica_offsets()
            .into_iter()
            .fold(None, |best, offset| {
                nearest(best, shape.raycast(&ray.shifted(-(anchor + offset))))
            })
    }

    /// Whether the capsule touches `polygon` placed at `anchor` in any replica
    pub fn capsule_overlaps_polygon(
        &self,
        capsule: &Capsule,
        polygon: &ConvexPolygon,
        anchor: Vec2,
    ) -> bool {
        self.replica_offsets()
            .into_iter()
            .any(|offset| capsule.translated(-(anchor + offset)).overlaps_polygon(polygon))
    }
}
