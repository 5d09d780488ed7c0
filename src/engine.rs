use std::sync::Arc;

use glam::{Quat, Vec3};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::api::PhysicsApi;
use crate::error::{PhysicsError, Result};
use crate::host::{DebugDraw, HostBindings, MeshData};
use crate::shape::Shape;
use crate::types::*;
use crate::world::{World, validate_config};

/// Registry of isolated worlds.
///
/// Worlds live in an append-only arena: a handle's index is never reused, and
/// a destroyed world keeps its (empty) slot. Every world has its own locks, so
/// stepping one world never waits on another.
pub struct PhysicsEngine {
    config: EngineConfig,
    bindings: HostBindings,
    worlds: RwLock<Vec<Arc<World>>>,
    /// Shared debug sink, attached to every world while visualization is on.
    debug: Mutex<Option<Arc<dyn DebugDraw>>>,
}

impl PhysicsEngine {
    pub fn init(config: EngineConfig, bindings: HostBindings) -> Result<Self> {
        validate_config(&config.world)?;
        debug!(?bindings, visualize = config.visualize, "physics engine init");
        let engine = Self {
            config,
            bindings,
            worlds: RwLock::new(Vec::new()),
            debug: Mutex::new(None),
        };
        if engine.config.visualize {
            engine.enable_visualization(true);
        }
        Ok(engine)
    }

    /// Destroy every live world and drop the debug sink.
    pub fn deinit(self) -> Result<()> {
        let destroyed = self.worlds.read().iter().filter(|w| w.destroy()).count();
        *self.debug.lock() = None;
        debug!(destroyed, "physics engine deinit");
        Ok(())
    }

    fn world(&self, handle: WorldHandle) -> Result<Arc<World>> {
        if handle.is_invalid() {
            return Err(PhysicsError::WorldNotFound(handle));
        }
        let worlds = self.worlds.read();
        usize::try_from(handle.0)
            .ok()
            .and_then(|i| worlds.get(i).cloned())
            .ok_or(PhysicsError::WorldNotFound(handle))
    }

    fn push_world(&self, cfg: WorldConfig) -> WorldHandle {
        // Debug lock first, then the arena: same order as enable_visualization.
        let sink = self.debug.lock();
        let mut worlds = self.worlds.write();
        let handle = WorldHandle(worlds.len() as u64);
        worlds.push(Arc::new(World::new(handle, cfg, self.bindings.clone(), sink.clone())));
        handle
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True for a handle that names a world that has not been destroyed.
    pub fn is_valid_world(&self, handle: WorldHandle) -> bool {
        self.world(handle).is_ok_and(|w| w.is_alive())
    }

    /// Number of world slots ever allocated, destroyed ones included.
    pub fn world_slots(&self) -> usize {
        self.worlds.read().len()
    }

    pub fn get_rotation(&self, body: BodyHandle) -> Result<Quat> {
        self.world(body.world)?.rotation(body)
    }

    pub fn owner_of(&self, body: BodyHandle) -> Result<OwnerTag> {
        self.world(body.world)?.owner_of(body)
    }

    pub fn body_count(&self, world: WorldHandle) -> Result<usize> {
        self.world(world)?.body_count()
    }

    /// Counters from the last `progress` call on `world`.
    pub fn step_stats(&self, world: WorldHandle) -> Result<StepStats> {
        self.world(world)?.stats()
    }

    /// Timing of the last `progress` call; `None` unless the world was
    /// created with `enable_timing`.
    pub fn step_timing(&self, world: WorldHandle) -> Result<Option<StepTiming>> {
        self.world(world)?.timing()
    }
}

impl PhysicsApi for PhysicsEngine {
    fn new_world(&self) -> WorldHandle {
        self.push_world(self.config.world.clone())
    }

    fn new_world_with(&self, cfg: WorldConfig) -> Result<WorldHandle> {
        validate_config(&cfg)?;
        Ok(self.push_world(cfg))
    }

    fn destroy_world(&self, world: WorldHandle) {
        if let Ok(w) = self.world(world) {
            w.destroy();
        }
    }

    fn progress(&self, world: WorldHandle, dt: f32) -> Result<()> {
        self.world(world)?.progress(dt)
    }

    fn new_box_shape(&self, world: WorldHandle, half_extents: Vec3) -> Result<ShapeHandle> {
        let w = self.world(world)?;
        w.add_shape(Shape::cuboid(half_extents)?)
    }

    fn new_sphere_shape(&self, world: WorldHandle, radius: f32) -> Result<ShapeHandle> {
        let w = self.world(world)?;
        w.add_shape(Shape::sphere(radius)?)
    }

    fn new_capsule_shape(&self, world: WorldHandle, radius: f32, height: f32) -> Result<ShapeHandle> {
        let w = self.world(world)?;
        w.add_shape(Shape::capsule(radius, height)?)
    }

    fn new_mesh_shape(&self, world: WorldHandle, path: &str) -> Result<ShapeHandle> {
        let w = self.world(world)?;
        let loader = self.bindings.meshes.as_ref().ok_or(PhysicsError::NoMeshLoader)?;
        let data = loader.load_mesh(path).map_err(PhysicsError::MeshLoad)?;
        w.add_shape(Shape::mesh(data)?)
    }

    fn new_mesh_shape_from(&self, world: WorldHandle, mesh: MeshData) -> Result<ShapeHandle> {
        let w = self.world(world)?;
        w.add_shape(Shape::mesh(mesh)?)
    }

    fn new_body(&self, world: WorldHandle, owner: OwnerTag, info: BodyInfo) -> Result<BodyHandle> {
        self.world(world)?.new_body(owner, info)
    }

    fn destroy_body(&self, world: WorldHandle, body: BodyHandle) -> Result<()> {
        if body.world != world {
            return Err(PhysicsError::BodyNotFound(body));
        }
        self.world(world)?.destroy_body(body)
    }

    fn set_position(&self, body: BodyHandle, position: Vec3) -> Result<()> {
        self.world(body.world)?.set_position(body, position)
    }

    fn get_position(&self, body: BodyHandle) -> Result<Vec3> {
        self.world(body.world)?.position(body)
    }

    fn set_velocity(&self, body: BodyHandle, velocity: Vec3) -> Result<()> {
        self.world(body.world)?.set_velocity(body, velocity)
    }

    fn get_velocity(&self, body: BodyHandle) -> Result<Vec3> {
        self.world(body.world)?.velocity(body)
    }

    fn set_rotation_euler(&self, body: BodyHandle, rot: Vec3) -> Result<()> {
        self.world(body.world)?.set_rotation_euler(body, rot)
    }

    fn add_force(&self, body: BodyHandle, force: Vec3) -> Result<()> {
        self.world(body.world)?.add_force(body, force)
    }

    fn ray_test(&self, world: WorldHandle, origin: Vec3, dir: Vec3, len: f32) -> Result<RayHit> {
        self.world(world)?.ray_test(origin, dir, len)
    }

    fn enable_visualization(&self, enable: bool) {
        let (sink, worlds) = {
            let mut sink = self.debug.lock();
            if enable {
                if sink.as_ref().is_none_or(|s| !s.is_alive()) {
                    let Some(factory) = &self.bindings.debug_draw else {
                        warn!("visualization requested but no debug draw factory is bound");
                        return;
                    };
                    *sink = Some(factory.create());
                }
            } else {
                *sink = None;
            }
            (sink.clone(), self.worlds.read().clone())
        };
        // Engine locks are released; each world may be mid-step.
        for w in &worlds {
            w.set_debug_sink(sink.clone());
        }
    }
}
