use std::sync::Arc;
use std::time::Instant;

use glam::{EulerRot, Quat, Vec3};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::body::{BodySet, MotionKind, MotionState, RigidBody, SyncDirection};
use crate::broadphase::UniformGrid;
use crate::debug_draw;
use crate::error::{PhysicsError, Result, ensure_finite, ensure_non_negative, ensure_positive};
use crate::events::ContactTracker;
use crate::host::{DebugDraw, HostBindings};
use crate::narrowphase::Narrowphase;
use crate::shape::{Shape, ShapeRegistry};
use crate::solver::{self, Manifold, SolverParams};
use crate::types::*;

/// Reject configurations the step pipeline cannot run with.
pub(crate) fn validate_config(cfg: &WorldConfig) -> Result<()> {
    ensure_finite("gravity", cfg.gravity)?;
    ensure_positive("cell size", cfg.cell_size)?;
    ensure_non_negative("contact margin", cfg.contact_margin)?;
    ensure_non_negative("baumgarte", cfg.baumgarte)?;
    ensure_non_negative("penetration slop", cfg.penetration_slop)?;
    ensure_non_negative("restitution threshold", cfg.restitution_threshold)?;
    ensure_non_negative("linear damping", cfg.linear_damping)?;
    ensure_non_negative("angular damping", cfg.angular_damping)?;
    if let Some(h) = cfg.fixed_timestep {
        ensure_positive("fixed timestep", h)?;
    }
    Ok(())
}

fn elapsed_ms(t: Option<Instant>) -> f64 {
    t.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0)
}

/// One world slot of the engine arena.
///
/// The simulation lock covers bodies, broadphase, contact tracking and the
/// step; the shape lock covers only the registry, so geometry can be added
/// from another thread while a step runs. `None` in either means destroyed.
pub(crate) struct World {
    handle: WorldHandle,
    sim: Mutex<Option<Simulation>>,
    shapes: Mutex<Option<ShapeRegistry>>,
}

struct Simulation {
    handle: WorldHandle,
    cfg: WorldConfig,
    bindings: HostBindings,
    debug: Option<Arc<dyn DebugDraw>>,
    bodies: BodySet,
    grid: UniformGrid,
    /// Grid no longer matches body placements.
    grid_dirty: bool,
    tracker: ContactTracker,
    manifolds: Vec<Manifold>,
    /// Unsimulated time carried between calls in fixed-timestep mode.
    accumulator: f32,
    stats: StepStats,
    timing: Option<StepTiming>,
}

impl World {
    pub fn new(
        handle: WorldHandle,
        cfg: WorldConfig,
        bindings: HostBindings,
        debug_sink: Option<Arc<dyn DebugDraw>>,
    ) -> Self {
        let visualize = debug_sink.is_some();
        debug!(world = handle.0, visualize, "created world");
        let sim = Simulation {
            handle,
            grid: UniformGrid::new(cfg.cell_size),
            cfg,
            bindings,
            debug: debug_sink,
            bodies: BodySet::default(),
            grid_dirty: false,
            tracker: ContactTracker::default(),
            manifolds: Vec::new(),
            accumulator: 0.0,
            stats: StepStats::default(),
            timing: None,
        };
        Self {
            handle,
            sim: Mutex::new(Some(sim)),
            shapes: Mutex::new(Some(ShapeRegistry::default())),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.sim.lock().is_some()
    }

    fn with_sim<T>(&self, f: impl FnOnce(&mut Simulation) -> Result<T>) -> Result<T> {
        let mut guard = self.sim.lock();
        let sim = guard.as_mut().ok_or(PhysicsError::WorldNotFound(self.handle))?;
        f(sim)
    }

    /// Free every body and shape. Returns false if already destroyed.
    pub fn destroy(&self) -> bool {
        let mut guard = self.sim.lock();
        let Some(mut sim) = guard.take() else {
            return false;
        };
        let bodies = sim.bodies.clear();
        sim.tracker.clear();
        sim.grid.clear();
        let shapes = self.shapes.lock().take().map_or(0, |r| r.len());
        debug!(world = self.handle.0, bodies, shapes, "destroyed world");
        true
    }

    pub fn set_debug_sink(&self, sink: Option<Arc<dyn DebugDraw>>) {
        if let Some(sim) = self.sim.lock().as_mut() {
            sim.debug = sink;
        }
    }

    // --- Shapes ------------------------------------------------------------

    pub fn add_shape(&self, shape: Shape) -> Result<ShapeHandle> {
        let mut guard = self.shapes.lock();
        let registry = guard.as_mut().ok_or(PhysicsError::WorldNotFound(self.handle))?;
        let index = registry.push(shape);
        Ok(ShapeHandle { world: self.handle, index })
    }

    fn shape(&self, handle: ShapeHandle) -> Result<Arc<Shape>> {
        let missing = PhysicsError::ShapeNotFound(handle, self.handle);
        if handle.world != self.handle {
            return Err(missing);
        }
        let guard = self.shapes.lock();
        let registry = guard.as_ref().ok_or(PhysicsError::WorldNotFound(self.handle))?;
        registry.get(handle.index).ok_or(missing)
    }

    // --- Bodies ------------------------------------------------------------

    pub fn new_body(&self, owner: OwnerTag, info: BodyInfo) -> Result<BodyHandle> {
        ensure_non_negative("mass", info.mass)?;
        ensure_non_negative("restitution", info.restitution)?;
        ensure_non_negative("friction", info.friction)?;
        ensure_finite("position", info.placement.position)?;
        let rotation = info.placement.rotation;
        if !rotation.is_finite() || rotation.length_squared() < 1e-12 {
            return Err(PhysicsError::InvalidParameter(format!(
                "rotation must be a finite non-zero quaternion, got {rotation}"
            )));
        }
        // Resolve the shape before taking the simulation lock.
        let shape = self.shape(info.shape)?;
        if info.kind == BodyKind::Dynamic && info.mass > 0.0 && !shape.is_dynamic_capable() {
            return Err(PhysicsError::Unsupported("dynamic body with mass on a triangle mesh"));
        }
        let placement = Placement { position: info.placement.position, rotation: rotation.normalize() };

        self.with_sim(|sim| {
            let mut body = RigidBody::new(shape, info.kind, info.mass, info.restitution, info.friction, placement);
            let direction = if info.kind == BodyKind::Kinematic { SyncDirection::Pull } else { SyncDirection::Publish };
            body.motion_state = Some(MotionState { owner, scene: self.handle, direction });
            let motion = body.motion();
            let (index, generation) = sim.bodies.insert(body, (owner, self.handle));
            sim.grid_dirty = true;
            debug!(world = self.handle.0, owner, index, ?motion, bodies = sim.bodies.len(), "created body");
            Ok(BodyHandle { world: self.handle, index, generation })
        })
    }

    pub fn destroy_body(&self, handle: BodyHandle) -> Result<()> {
        self.with_sim(|sim| {
            if handle.world != self.handle {
                return Err(PhysicsError::BodyNotFound(handle));
            }
            sim.bodies
                .remove(handle.index, handle.generation)
                .ok_or(PhysicsError::BodyNotFound(handle))?;
            sim.tracker.forget(handle.index as usize);
            sim.grid_dirty = true;
            debug!(world = self.handle.0, index = handle.index, bodies = sim.bodies.len(), "destroyed body");
            Ok(())
        })
    }

    fn with_body<T>(&self, handle: BodyHandle, f: impl FnOnce(&RigidBody) -> T) -> Result<T> {
        self.with_sim(|sim| {
            sim.bodies
                .get(handle.index, handle.generation)
                .filter(|_| handle.world == self.handle)
                .map(f)
                .ok_or(PhysicsError::BodyNotFound(handle))
        })
    }

    fn with_body_mut<T>(&self, handle: BodyHandle, f: impl FnOnce(&mut RigidBody) -> T) -> Result<T> {
        self.with_sim(|sim| {
            if handle.world != self.handle {
                return Err(PhysicsError::BodyNotFound(handle));
            }
            let body = sim
                .bodies
                .get_mut(handle.index, handle.generation)
                .ok_or(PhysicsError::BodyNotFound(handle))?;
            let out = f(body);
            sim.grid_dirty = true;
            Ok(out)
        })
    }

    /// Teleport. Kinematic bodies keep their previous position so the move
    /// shows up as velocity on the next step.
    pub fn set_position(&self, handle: BodyHandle, position: Vec3) -> Result<()> {
        ensure_finite("position", position)?;
        self.with_body_mut(handle, |body| {
            body.placement.position = position;
            if body.motion != MotionKind::Kinematic {
                body.prev_position = position;
            }
        })
    }

    pub fn position(&self, handle: BodyHandle) -> Result<Vec3> {
        self.with_body(handle, |body| body.placement.position)
    }

    pub fn rotation(&self, handle: BodyHandle) -> Result<Quat> {
        self.with_body(handle, |body| body.placement.rotation)
    }

    pub fn set_velocity(&self, handle: BodyHandle, velocity: Vec3) -> Result<()> {
        ensure_finite("velocity", velocity)?;
        self.with_body_mut(handle, |body| body.linear_velocity = velocity)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Result<Vec3> {
        self.with_body(handle, |body| body.linear_velocity)
    }

    pub fn set_rotation_euler(&self, handle: BodyHandle, rot: Vec3) -> Result<()> {
        ensure_finite("rotation", rot)?;
        let q = Quat::from_euler(EulerRot::YXZ, rot.y, rot.x, rot.z);
        self.with_body_mut(handle, |body| body.set_rotation(q))
    }

    pub fn add_force(&self, handle: BodyHandle, force: Vec3) -> Result<()> {
        ensure_finite("force", force)?;
        self.with_body_mut(handle, |body| body.force += force)
    }

    pub fn owner_of(&self, handle: BodyHandle) -> Result<OwnerTag> {
        self.with_sim(|sim| {
            if handle.world != self.handle || sim.bodies.get(handle.index, handle.generation).is_none() {
                return Err(PhysicsError::BodyNotFound(handle));
            }
            sim.bodies
                .record(handle.index as usize)
                .map(|(owner, _)| owner)
                .ok_or(PhysicsError::BodyNotFound(handle))
        })
    }

    pub fn body_count(&self) -> Result<usize> {
        self.with_sim(|sim| Ok(sim.bodies.len()))
    }

    // --- Stepping and queries ----------------------------------------------

    pub fn progress(&self, dt: f32) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidParameter(format!("dt must be finite and >= 0, got {dt}")));
        }
        self.with_sim(|sim| {
            sim.progress(dt);
            Ok(())
        })
    }

    pub fn ray_test(&self, origin: Vec3, dir: Vec3, len: f32) -> Result<RayHit> {
        ensure_finite("ray origin", origin)?;
        ensure_finite("ray direction", dir)?;
        if !len.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!("ray length must be finite, got {len}")));
        }
        self.with_sim(|sim| Ok(sim.ray_test(origin, dir, len)))
    }

    pub fn stats(&self) -> Result<StepStats> {
        self.with_sim(|sim| Ok(sim.stats))
    }

    pub fn timing(&self) -> Result<Option<StepTiming>> {
        self.with_sim(|sim| Ok(sim.timing))
    }
}

impl Simulation {
    fn progress(&mut self, dt: f32) {
        let t_all = self.cfg.enable_timing.then(Instant::now);
        self.stats = StepStats::default();
        let mut timing = StepTiming::default();

        let (h, steps) = match self.cfg.fixed_timestep {
            None => (dt, u32::from(dt > 0.0)),
            Some(h) => {
                self.accumulator += dt;
                let n = (self.accumulator / h).floor() as u32;
                self.accumulator -= n as f32 * h;
                // Steps beyond the cap are dropped, not carried over.
                (h, n.min(self.cfg.max_substeps))
            }
        };
        for _ in 0..steps {
            self.step(h, &mut timing);
        }
        for (_, body) in self.bodies.iter_mut() {
            body.force = Vec3::ZERO;
        }
        self.stats.substeps = steps;
        self.stats.bodies = self.bodies.len();

        let t_draw = self.cfg.enable_timing.then(Instant::now);
        self.draw_debug();
        timing.debug_draw_ms = elapsed_ms(t_draw);

        if let Some(t) = t_all {
            timing.progress_ms = elapsed_ms(Some(t));
            self.timing = Some(timing);
        }
        trace!(
            world = self.handle.0,
            dt,
            substeps = steps,
            touching = self.stats.touching_pairs,
            "progress"
        );
    }

    fn step(&mut self, h: f32, timing: &mut StepTiming) {
        let timed = self.cfg.enable_timing;
        self.pull_kinematic(h);
        solver::integrate_velocities(&mut self.bodies, &self.cfg, h);

        let t0 = timed.then(Instant::now);
        self.rebuild_grid();
        let pairs: Vec<(usize, usize)> = self
            .grid
            .pairs()
            .into_iter()
            .filter(|&(a, b)| self.wants_pair(a, b))
            .collect();
        timing.broadphase_ms += elapsed_ms(t0);

        let t1 = timed.then(Instant::now);
        self.manifolds.clear();
        let margin = self.cfg.contact_margin;
        for &(a, b) in &pairs {
            let (Some(ba), Some(bb)) = (self.bodies.by_index(a), self.bodies.by_index(b)) else {
                continue;
            };
            let mut points = Vec::new();
            Narrowphase::collide(&ba.shape, &ba.placement, &bb.shape, &bb.placement, margin, &mut points);
            if !points.is_empty() {
                self.manifolds.push(Manifold { a, b, points });
            }
        }
        let touching: Vec<(usize, usize)> = self.manifolds.iter().map(|m| (m.a, m.b)).collect();
        let (enter, leave) =
            self.tracker
                .update(&touching, &self.bodies, self.handle, self.bindings.contacts.as_deref());
        timing.narrowphase_ms += elapsed_ms(t1);

        let t2 = timed.then(Instant::now);
        let params = SolverParams::from_config(&self.cfg, h);
        solver::solve_contacts(&mut self.bodies, &self.manifolds, &params);
        solver::integrate_positions(&mut self.bodies, h);
        self.grid_dirty = true;
        timing.solver_ms += elapsed_ms(t2);

        self.publish();

        self.stats.cells = self.grid.cell_count();
        self.stats.candidate_pairs = pairs.len();
        self.stats.touching_pairs = touching.len();
        self.stats.contact_points = self.manifolds.iter().map(|m| m.points.len()).sum();
        self.stats.enter_events += enter;
        self.stats.leave_events += leave;
    }

    /// Pairs where neither side can move never produce contacts.
    fn wants_pair(&self, a: usize, b: usize) -> bool {
        match (self.bodies.by_index(a), self.bodies.by_index(b)) {
            (Some(x), Some(y)) => x.is_dynamic() || y.is_dynamic(),
            _ => false,
        }
    }

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        let margin = self.cfg.contact_margin;
        for (i, body) in self.bodies.iter() {
            self.grid.insert(i, body.world_aabb().expand(margin));
        }
        self.grid_dirty = false;
    }

    /// Kinematic bodies take their placement from the host store and derive
    /// velocity from how far they moved since the last step.
    fn pull_kinematic(&mut self, h: f32) {
        let store = self.bindings.transforms.as_deref();
        for (_, body) in self.bodies.iter_mut() {
            if body.motion != MotionKind::Kinematic {
                continue;
            }
            if let (Some(store), Some(ms)) = (store, body.motion_state) {
                if ms.direction == SyncDirection::Pull {
                    if let Some((p, q)) = store.pull(ms.scene, ms.owner) {
                        if p.is_finite() && q.is_finite() && q.length_squared() > 1e-12 {
                            body.placement.position = p;
                            body.set_rotation(q);
                        }
                    }
                }
            }
            body.linear_velocity = (body.placement.position - body.prev_position) / h;
            body.prev_position = body.placement.position;
        }
    }

    fn publish(&self) {
        let Some(store) = self.bindings.transforms.as_deref() else {
            return;
        };
        for (_, body) in self.bodies.iter() {
            if body.motion != MotionKind::Dynamic {
                continue;
            }
            if let Some(ms) = body.motion_state.filter(|m| m.direction == SyncDirection::Publish) {
                store.publish(ms.scene, ms.owner, body.placement.position, body.placement.rotation);
            }
        }
    }

    fn draw_debug(&mut self) {
        let Some(sink) = self.debug.clone() else {
            return;
        };
        if !sink.is_alive() {
            warn!(world = self.handle.0, "debug sink closed; detaching");
            self.debug = None;
            return;
        }
        let lines = debug_draw::draw_world(&self.bodies, sink.as_ref());
        trace!(world = self.handle.0, lines, "debug frame");
    }

    fn ray_test(&mut self, origin: Vec3, dir: Vec3, len: f32) -> RayHit {
        if len <= 0.0 || dir.length_squared() <= f32::EPSILON * f32::EPSILON {
            return RayHit::MISS;
        }
        let dir = dir.normalize();
        if self.grid_dirty {
            self.rebuild_grid();
        }

        let bodies = &self.bodies;
        let grid = &self.grid;
        let mut best: Option<(usize, RayIntersection)> = None;
        grid.walk_ray(origin, dir, len, |id| {
            grid.aabb(id)?.ray_entry(origin, dir, len)?;
            let body = bodies.by_index(id)?;
            let hit = Narrowphase::ray_shape(&body.shape, &body.placement, origin, dir, len)?;
            if best.as_ref().is_none_or(|(_, b)| hit.toi < b.toi) {
                best = Some((id, hit));
            }
            Some(hit.toi)
        });

        match best {
            Some((id, hit)) => RayHit {
                point: hit.point,
                normal: hit.normal,
                owner: bodies.record(id).map_or(0, |(owner, _)| owner),
                hit: true,
            },
            None => RayHit::MISS,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::host::{MeshData, TransformStore};

    fn world(cfg: WorldConfig) -> World {
        World::new(WorldHandle(0), cfg, HostBindings::default(), None)
    }

    #[test]
    fn test_destroyed_world_rejects_everything() {
        let w = world(WorldConfig::default());
        let s = w.add_shape(Shape::sphere(1.0).unwrap()).unwrap();
        w.new_body(1, BodyInfo::dynamic(s, 1.0)).unwrap();
        assert!(w.destroy());
        assert!(!w.destroy());
        assert_eq!(w.progress(0.016), Err(PhysicsError::WorldNotFound(WorldHandle(0))));
        assert_eq!(
            w.add_shape(Shape::sphere(1.0).unwrap()),
            Err(PhysicsError::WorldNotFound(WorldHandle(0)))
        );
    }

    #[test]
    fn test_fixed_timestep_accumulates() {
        let cfg = WorldConfig { fixed_timestep: Some(0.01), max_substeps: 3, ..Default::default() };
        let w = world(cfg);
        w.progress(0.025).unwrap();
        assert_eq!(w.stats().unwrap().substeps, 2);
        w.progress(0.006).unwrap();
        assert_eq!(w.stats().unwrap().substeps, 1);
        w.progress(1.0).unwrap();
        assert_eq!(w.stats().unwrap().substeps, 3);
    }

    #[test]
    fn test_zero_dt_does_not_step() {
        let w = world(WorldConfig::default());
        let s = w.add_shape(Shape::sphere(1.0).unwrap()).unwrap();
        let b = w.new_body(1, BodyInfo::dynamic(s, 1.0).with_position(Vec3::new(0.0, 5.0, 0.0))).unwrap();
        w.progress(0.0).unwrap();
        assert_eq!(w.position(b).unwrap(), Vec3::new(0.0, 5.0, 0.0));
        assert!(w.progress(-1.0).is_err());
        assert!(w.progress(f32::NAN).is_err());
    }

    #[test]
    fn test_forces_last_one_call() {
        let cfg = WorldConfig { gravity: Vec3::ZERO, ..Default::default() };
        let w = world(cfg);
        let s = w.add_shape(Shape::sphere(1.0).unwrap()).unwrap();
        let b = w.new_body(1, BodyInfo::dynamic(s, 2.0)).unwrap();
        w.add_force(b, Vec3::new(4.0, 0.0, 0.0)).unwrap();
        w.progress(0.5).unwrap();
        assert!((w.velocity(b).unwrap().x - 1.0).abs() < 1e-6);
        w.progress(0.5).unwrap();
        assert!((w.velocity(b).unwrap().x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dynamic_mesh_is_unsupported() {
        let w = world(WorldConfig::default());
        let mesh = Shape::mesh(MeshData {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            indices: vec![0, 1, 2],
        })
        .unwrap();
        let s = w.add_shape(mesh).unwrap();
        assert!(matches!(w.new_body(1, BodyInfo::dynamic(s, 1.0)), Err(PhysicsError::Unsupported(_))));
        assert!(w.new_body(2, BodyInfo::fixed(s)).is_ok());
    }

    #[test]
    fn test_foreign_shape_is_rejected() {
        let w = world(WorldConfig::default());
        let foreign = ShapeHandle { world: WorldHandle(7), index: 0 };
        assert!(matches!(
            w.new_body(1, BodyInfo::dynamic(foreign, 1.0)),
            Err(PhysicsError::ShapeNotFound(..))
        ));
    }

    #[test]
    fn test_ray_sees_teleported_body() {
        let w = world(WorldConfig::default());
        let s = w.add_shape(Shape::sphere(1.0).unwrap()).unwrap();
        let b = w.new_body(9, BodyInfo::fixed(s)).unwrap();
        w.progress(0.016).unwrap();
        w.set_position(b, Vec3::new(20.0, 0.0, 0.0)).unwrap();
        let hit = w.ray_test(Vec3::new(10.0, 0.0, 0.0), Vec3::X, 100.0).unwrap();
        assert!(hit.hit);
        assert_eq!(hit.owner, 9);
        assert!((hit.point.x - 19.0).abs() < 1e-4);
        assert_eq!(w.ray_test(Vec3::ZERO, Vec3::ZERO, 10.0).unwrap(), RayHit::MISS);
        assert!(w.ray_test(Vec3::ZERO, Vec3::X, f32::INFINITY).is_err());
    }

    struct Scripted {
        position: Vec3,
        published: AtomicUsize,
    }

    impl TransformStore for Scripted {
        fn publish(&self, _world: WorldHandle, _owner: OwnerTag, _position: Vec3, _rotation: Quat) {
            self.published.fetch_add(1, Ordering::Relaxed);
        }
        fn pull(&self, _world: WorldHandle, owner: OwnerTag) -> Option<(Vec3, Quat)> {
            (owner == 2).then_some((self.position, Quat::IDENTITY))
        }
    }

    #[test]
    fn test_transform_bridge_directions() {
        let store = Arc::new(Scripted { position: Vec3::new(3.0, 0.0, 0.0), published: AtomicUsize::new(0) });
        let bindings = HostBindings::default().with_transforms(store.clone());
        let w = World::new(WorldHandle(0), WorldConfig::default(), bindings, None);
        let s = w.add_shape(Shape::sphere(0.5).unwrap()).unwrap();
        w.new_body(1, BodyInfo::dynamic(s, 1.0).with_position(Vec3::new(0.0, 10.0, 0.0))).unwrap();
        let k = w.new_body(2, BodyInfo::kinematic(s)).unwrap();
        w.progress(0.5).unwrap();
        assert_eq!(w.position(k).unwrap(), Vec3::new(3.0, 0.0, 0.0));
        assert!((w.velocity(k).unwrap() - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(store.published.load(Ordering::Relaxed), 1);
    }

    struct Flaky {
        alive: AtomicBool,
        lines: AtomicUsize,
    }

    impl DebugDraw for Flaky {
        fn start_frame(&self) {}
        fn draw_line(&self, _from: Vec3, _to: Vec3, _color: DebugColor) {
            self.lines.fetch_add(1, Ordering::Relaxed);
        }
        fn end_frame(&self) {}
        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn test_closed_debug_sink_is_dropped() {
        let sink = Arc::new(Flaky { alive: AtomicBool::new(true), lines: AtomicUsize::new(0) });
        let w = World::new(WorldHandle(0), WorldConfig::default(), HostBindings::default(), Some(sink.clone() as Arc<dyn DebugDraw>));
        let s = w.add_shape(Shape::cuboid(Vec3::ONE).unwrap()).unwrap();
        w.new_body(1, BodyInfo::fixed(s)).unwrap();
        w.progress(0.016).unwrap();
        let drawn = sink.lines.load(Ordering::Relaxed);
        assert_eq!(drawn, 24);
        sink.alive.store(false, Ordering::Relaxed);
        w.progress(0.016).unwrap();
        sink.alive.store(true, Ordering::Relaxed);
        w.progress(0.016).unwrap();
        assert_eq!(sink.lines.load(Ordering::Relaxed), drawn);
    }

    #[test]
    fn test_config_validation() {
        assert!(validate_config(&WorldConfig::default()).is_ok());
        let bad = WorldConfig { fixed_timestep: Some(0.0), ..Default::default() };
        assert!(validate_config(&bad).is_err());
        let bad = WorldConfig { cell_size: -1.0, ..Default::default() };
        assert!(validate_config(&bad).is_err());
    }
}
