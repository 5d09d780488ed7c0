//! Collaborators the host injects into the engine.
//!
//! The engine never discovers these globally; every world receives a clone of
//! the engine's [`HostBindings`] when it is created.

use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::types::{DebugColor, OwnerTag, WorldHandle};

/// Receives collision notifications. Called synchronously from inside
/// `progress`, on the stepping thread, while the world lock is held: it must
/// not block and must not call back into the same world.
pub trait ContactSink: Send + Sync {
    fn on_collision_enter(&self, world: WorldHandle, a: OwnerTag, b: OwnerTag);
    fn on_collision_leave(&self, world: WorldHandle, a: OwnerTag, b: OwnerTag);
}

/// Host-side object transforms keyed by `(world, owner)`.
pub trait TransformStore: Send + Sync {
    /// Solver → host, for dynamic bodies after each step.
    fn publish(&self, world: WorldHandle, owner: OwnerTag, position: Vec3, rotation: Quat);

    /// Host → solver, for kinematic bodies before each step. `None` keeps the
    /// body's current placement.
    fn pull(&self, world: WorldHandle, owner: OwnerTag) -> Option<(Vec3, Quat)>;
}

/// Triangle-list geometry handed over by the asset layer.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
}

/// Asset-loading collaborator used by `new_mesh_shape`.
pub trait MeshLoader: Send + Sync {
    fn load_mesh(&self, path: &str) -> Result<MeshData, String>;
}

/// Line sink for diagnostics. The display behind it may go away at any time;
/// the world checks [`DebugDraw::is_alive`] before every frame.
pub trait DebugDraw: Send + Sync {
    fn start_frame(&self);
    fn draw_line(&self, from: Vec3, to: Vec3, color: DebugColor);
    fn end_frame(&self);
    fn is_alive(&self) -> bool;
}

/// Builds a fresh debug sink when visualization is switched on.
pub trait DebugDrawFactory: Send + Sync {
    fn create(&self) -> Arc<dyn DebugDraw>;
}

/// Bundle of optional collaborators.
#[derive(Clone, Default)]
pub struct HostBindings {
    pub contacts: Option<Arc<dyn ContactSink>>,
    pub transforms: Option<Arc<dyn TransformStore>>,
    pub meshes: Option<Arc<dyn MeshLoader>>,
    pub debug_draw: Option<Arc<dyn DebugDrawFactory>>,
}

impl HostBindings {
    pub fn with_contacts(mut self, sink: Arc<dyn ContactSink>) -> Self {
        self.contacts = Some(sink);
        self
    }

    pub fn with_transforms(mut self, store: Arc<dyn TransformStore>) -> Self {
        self.transforms = Some(store);
        self
    }

    pub fn with_meshes(mut self, loader: Arc<dyn MeshLoader>) -> Self {
        self.meshes = Some(loader);
        self
    }

    pub fn with_debug_draw(mut self, factory: Arc<dyn DebugDrawFactory>) -> Self {
        self.debug_draw = Some(factory);
        self
    }
}

impl std::fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBindings")
            .field("contacts", &self.contacts.is_some())
            .field("transforms", &self.transforms.is_some())
            .field("meshes", &self.meshes.is_some())
            .field("debug_draw", &self.debug_draw.is_some())
            .finish()
    }
}
