use glam::{Mat3, Quat, Vec3};

/// Opaque 64-bit key supplied by the host for every body (e.g., an entity id).
pub type OwnerTag = u64;

/// Handle addressing one world slot. Slots are append-only and never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorldHandle(pub u64);

impl WorldHandle {
    /// Sentinel meaning "no world".
    pub const INVALID: WorldHandle = WorldHandle(u64::MAX);

    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

/// Handle to a shape registered with one world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeHandle {
    pub world: WorldHandle,
    pub index: u32,
}

/// Handle to a body. `generation` detects use after `destroy_body`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    pub world: WorldHandle,
    pub index: u32,
    pub generation: u32,
}

/// How the body was asked to behave by its creator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BodyKind {
    /// Solver-driven. With `mass == 0` the body is static.
    #[default]
    Dynamic,
    /// Driven externally through `set_position` or the transform store.
    Kinematic,
    /// Reports contacts but never pushes or gets pushed.
    Ghost,
}

/// Position + orientation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Placement {
    pub const IDENTITY: Placement = Placement {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Map a point from local space into world space.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.position + self.rotation * p
    }

    /// Map a world-space point into local space.
    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.inverse() * (p - self.position)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Creation parameters for a body.
#[derive(Copy, Clone, Debug)]
pub struct BodyInfo {
    pub shape: ShapeHandle,
    /// `0` means static (for `Dynamic`) or immovable (for `Ghost`).
    pub mass: f32,
    pub restitution: f32,
    pub friction: f32,
    pub kind: BodyKind,
    pub placement: Placement,
}

impl BodyInfo {
    /// Default friction, matching Bullet's rigid-body construction info.
    pub const DEFAULT_FRICTION: f32 = 0.5;

    pub fn new(shape: ShapeHandle, mass: f32, kind: BodyKind) -> Self {
        Self {
            shape,
            mass,
            restitution: 0.0,
            friction: Self::DEFAULT_FRICTION,
            kind,
            placement: Placement::IDENTITY,
        }
    }

    pub fn dynamic(shape: ShapeHandle, mass: f32) -> Self {
        Self::new(shape, mass, BodyKind::Dynamic)
    }

    pub fn fixed(shape: ShapeHandle) -> Self {
        Self::new(shape, 0.0, BodyKind::Dynamic)
    }

    pub fn kinematic(shape: ShapeHandle) -> Self {
        Self::new(shape, 0.0, BodyKind::Kinematic)
    }

    pub fn ghost(shape: ShapeHandle) -> Self {
        Self::new(shape, 0.0, BodyKind::Ghost)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.placement.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.placement.rotation = rotation;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }
}

/// Result of `ray_test`. A miss has `hit == false` and `owner == 0`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub owner: OwnerTag,
    pub hit: bool,
}

impl RayHit {
    pub const MISS: RayHit = RayHit {
        point: Vec3::ZERO,
        normal: Vec3::ZERO,
        owner: 0,
        hit: false,
    };
}

/// Axis-aligned box in world (or shape-local) space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        points.iter().fold(Self::EMPTY, |acc, &p| acc.include(p))
    }

    pub fn include(self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn merge(self, other: Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn expand(self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Inclusive overlap (touching faces count).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Bounds of this box after rotating and translating it.
    pub fn transformed(&self, placement: &Placement) -> Aabb {
        let rot = Mat3::from_quat(placement.rotation);
        let abs = Mat3::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
        let center = placement.transform_point(self.center());
        let half = abs * self.half_extents();
        Aabb::from_center_half(center, half)
    }

    /// Slab test; returns the entry parameter clipped to `[0, max_t]`.
    pub fn ray_entry(&self, origin: Vec3, dir: Vec3, max_t: f32) -> Option<f32> {
        self.ray_span(origin, dir, max_t).map(|(t, _)| t)
    }

    /// Entry and exit parameters of the ray inside this box, clipped to `[0, max_t]`.
    pub fn ray_span(&self, origin: Vec3, dir: Vec3, max_t: f32) -> Option<(f32, f32)> {
        let mut tmin = 0.0f32;
        let mut tmax = max_t;
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            if d.abs() < f32::EPSILON {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let mut t1 = (self.min[axis] - o) * inv;
                let mut t2 = (self.max[axis] - o) * inv;
                if t1 > t2 {
                    core::mem::swap(&mut t1, &mut t2);
                }
                tmin = tmin.max(t1);
                tmax = tmax.min(t2);
                if tmin > tmax {
                    return None;
                }
            }
        }
        Some((tmin, tmax))
    }
}

/// One contact point between a pair. `normal` points from B into A.
#[derive(Copy, Clone, Debug)]
pub struct ContactPoint {
    /// World-space point on the surface of B.
    pub point: Vec3,
    pub normal: Vec3,
    /// Penetration depth; negative means a speculative gap within the margin.
    pub depth: f32,
}

/// Ray intersection against one shape.
#[derive(Copy, Clone, Debug)]
pub struct RayIntersection {
    /// Distance along the normalized ray direction.
    pub toi: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// RGB color in `[0, 1]` for debug lines.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DebugColor(pub Vec3);

impl DebugColor {
    pub const WIREFRAME_ACTIVE: DebugColor = DebugColor(Vec3::new(1.0, 1.0, 1.0));
    pub const WIREFRAME_STATIC: DebugColor = DebugColor(Vec3::new(0.0, 1.0, 0.0));
    pub const WIREFRAME_KINEMATIC: DebugColor = DebugColor(Vec3::new(0.0, 0.5, 1.0));
    pub const WIREFRAME_GHOST: DebugColor = DebugColor(Vec3::new(1.0, 0.0, 1.0));
    pub const AABB: DebugColor = DebugColor(Vec3::new(1.0, 0.0, 0.0));
}

/// Per-world simulation configuration.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub gravity: Vec3,
    /// Constraint solver passes per step.
    pub solver_iterations: u32,
    /// `None`: integrate the caller's `dt` as one step. `Some(h)`: accumulate
    /// `dt` and run up to `max_substeps` steps of exactly `h`.
    pub fixed_timestep: Option<f32>,
    pub max_substeps: u32,
    /// Broadphase grid cell size in world units.
    pub cell_size: f32,
    /// Separation below which a pair is considered touching.
    pub contact_margin: f32,
    /// Fraction of penetration corrected per step.
    pub baumgarte: f32,
    pub penetration_slop: f32,
    /// Closing speeds below this do not bounce.
    pub restitution_threshold: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            solver_iterations: 10,
            fixed_timestep: None,
            max_substeps: 10,
            cell_size: 4.0,
            contact_margin: 0.02,
            baumgarte: 0.2,
            penetration_slop: 0.005,
            restitution_threshold: 0.5,
            linear_damping: 0.0,
            angular_damping: 0.0,
            enable_timing: false,
        }
    }
}

/// Engine-wide configuration.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    /// Template for every world created by `new_world`.
    pub world: WorldConfig,
    /// Attach a debug sink to every world from the start.
    pub visualize: bool,
}

/// Counters for the last completed step.
#[derive(Copy, Clone, Debug, Default)]
pub struct StepStats {
    pub bodies: usize,
    pub cells: usize,
    /// Unique broadphase pairs after filtering.
    pub candidate_pairs: usize,
    /// Pairs with at least one contact point.
    pub touching_pairs: usize,
    pub contact_points: usize,
    pub enter_events: usize,
    pub leave_events: usize,
    pub substeps: u32,
}

/// Timing breakdown for the last `progress` call.
#[derive(Copy, Clone, Debug, Default)]
pub struct StepTiming {
    pub progress_ms: f64,
    pub broadphase_ms: f64,
    pub narrowphase_ms: f64,
    pub solver_ms: f64,
    pub debug_draw_ms: f64,
}
