//! Sequential-impulse contact solver and semi-implicit Euler integration.
//!
//! A step runs `integrate_velocities`, then `solve_contacts`, then
//! `integrate_positions`. Only dynamic bodies move; static and kinematic bodies
//! enter the solver with zero inverse mass.

use glam::{Quat, Vec3};

use crate::body::{BodySet, MotionKind, RigidBody};
use crate::types::{ContactPoint, WorldConfig};

/// Contact points of one body pair for the current step. `a < b` are slot
/// indices; normals point from `b` into `a`.
#[derive(Clone, Debug)]
pub(crate) struct Manifold {
    pub a: usize,
    pub b: usize,
    pub points: Vec<ContactPoint>,
}

/// Per-step solver parameters pulled out of the world config.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SolverParams {
    pub h: f32,
    pub iterations: u32,
    pub baumgarte: f32,
    pub slop: f32,
    pub restitution_threshold: f32,
}

impl SolverParams {
    pub fn from_config(cfg: &WorldConfig, h: f32) -> Self {
        Self {
            h,
            iterations: cfg.solver_iterations,
            baumgarte: cfg.baumgarte,
            slop: cfg.penetration_slop,
            restitution_threshold: cfg.restitution_threshold,
        }
    }
}

struct Constraint {
    a: usize,
    b: usize,
    ra: Vec3,
    rb: Vec3,
    normal: Vec3,
    tangents: [Vec3; 2],
    normal_mass: f32,
    tangent_mass: [f32; 2],
    /// Minimum relative normal velocity the solve drives toward.
    target: f32,
    friction: f32,
    normal_impulse: f32,
    tangent_impulse: [f32; 2],
}

fn effective_mass(a: &RigidBody, b: &RigidBody, ra: Vec3, rb: Vec3, dir: Vec3) -> f32 {
    let ang_a = (a.inv_inertia_world * ra.cross(dir)).cross(ra);
    let ang_b = (b.inv_inertia_world * rb.cross(dir)).cross(rb);
    let k = a.inv_mass + b.inv_mass + dir.dot(ang_a + ang_b);
    if k > f32::EPSILON { 1.0 / k } else { 0.0 }
}

fn build_constraints(bodies: &BodySet, manifolds: &[Manifold], p: &SolverParams) -> Vec<Constraint> {
    let mut out = Vec::new();
    for m in manifolds {
        let (Some(a), Some(b)) = (bodies.by_index(m.a), bodies.by_index(m.b)) else {
            continue;
        };
        if !a.responds() || !b.responds() {
            continue;
        }
        let friction = a.friction * b.friction;
        let restitution = a.restitution * b.restitution;
        for c in &m.points {
            let ra = c.point - a.placement.position;
            let rb = c.point - b.placement.position;
            let n = c.normal;
            let vn = (a.velocity_at(ra) - b.velocity_at(rb)).dot(n);

            let mut target = if c.depth < 0.0 {
                // Speculative: allow closing the gap, no more.
                c.depth / p.h
            } else {
                p.baumgarte / p.h * (c.depth - p.slop).max(0.0)
            };
            if vn < -p.restitution_threshold {
                target = target.max(-restitution * vn);
            }

            let (t1, t2) = n.any_orthonormal_pair();
            out.push(Constraint {
                a: m.a,
                b: m.b,
                ra,
                rb,
                normal: n,
                tangents: [t1, t2],
                normal_mass: effective_mass(a, b, ra, rb, n),
                tangent_mass: [effective_mass(a, b, ra, rb, t1), effective_mass(a, b, ra, rb, t2)],
                target,
                friction,
                normal_impulse: 0.0,
                tangent_impulse: [0.0; 2],
            });
        }
    }
    out
}

/// Resolve every manifold in place. Ghost pairs are skipped.
pub(crate) fn solve_contacts(bodies: &mut BodySet, manifolds: &[Manifold], p: &SolverParams) {
    let mut constraints = build_constraints(bodies, manifolds, p);
    if constraints.is_empty() {
        return;
    }
    for _ in 0..p.iterations.max(1) {
        for c in &mut constraints {
            let Some((a, b)) = bodies.pair_mut(c.a, c.b) else {
                continue;
            };

            // Friction first, bounded by the previous normal impulse.
            let limit = c.friction * c.normal_impulse;
            for k in 0..2 {
                let t = c.tangents[k];
                let vt = (a.velocity_at(c.ra) - b.velocity_at(c.rb)).dot(t);
                let old = c.tangent_impulse[k];
                c.tangent_impulse[k] = (old - vt * c.tangent_mass[k]).clamp(-limit, limit);
                let impulse = t * (c.tangent_impulse[k] - old);
                a.apply_impulse(impulse, c.ra);
                b.apply_impulse(-impulse, c.rb);
            }

            let vn = (a.velocity_at(c.ra) - b.velocity_at(c.rb)).dot(c.normal);
            let old = c.normal_impulse;
            c.normal_impulse = (old + (c.target - vn) * c.normal_mass).max(0.0);
            let impulse = c.normal * (c.normal_impulse - old);
            a.apply_impulse(impulse, c.ra);
            b.apply_impulse(-impulse, c.rb);
        }
    }
}

/// Gravity, accumulated forces and damping.
pub(crate) fn integrate_velocities(bodies: &mut BodySet, cfg: &WorldConfig, h: f32) {
    let lin_keep = (1.0 - cfg.linear_damping).clamp(0.0, 1.0).powf(h);
    let ang_keep = (1.0 - cfg.angular_damping).clamp(0.0, 1.0).powf(h);
    for (_, body) in bodies.iter_mut() {
        if body.motion != MotionKind::Dynamic {
            continue;
        }
        body.linear_velocity += (cfg.gravity + body.force * body.inv_mass) * h;
        body.linear_velocity *= lin_keep;
        body.angular_velocity *= ang_keep;
    }
}

/// Advance placements of dynamic bodies by their velocities.
pub(crate) fn integrate_positions(bodies: &mut BodySet, h: f32) {
    for (_, body) in bodies.iter_mut() {
        if body.motion != MotionKind::Dynamic {
            continue;
        }
        body.prev_position = body.placement.position;
        body.placement.position += body.linear_velocity * h;
        let w = body.angular_velocity;
        if w != Vec3::ZERO {
            let q = body.placement.rotation;
            let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * q * (0.5 * h);
            body.set_rotation(q + spin);
        }
    }
}
