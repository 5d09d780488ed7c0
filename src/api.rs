use glam::Vec3;

use crate::error::Result;
use crate::host::MeshData;
use crate::types::*;

/// Public contract of the engine: a registry of isolated worlds addressed by
/// handles, plus the body, shape and query operations on them.
pub trait PhysicsApi {
    // --- Worlds ------------------------------------------------------------

    /// Allocate a world with the engine's default configuration.
    fn new_world(&self) -> WorldHandle;

    /// Allocate a world with an explicit configuration.
    fn new_world_with(&self, cfg: WorldConfig) -> Result<WorldHandle>;

    /// Free every body and shape of the world. No-op on the sentinel or an
    /// already destroyed handle.
    fn destroy_world(&self, world: WorldHandle);

    /// The sentinel meaning "no world".
    fn invalid_world_handle(&self) -> WorldHandle {
        WorldHandle::INVALID
    }

    /// Advance the world by `dt` seconds. Contact notifications are delivered
    /// before this returns.
    fn progress(&self, world: WorldHandle, dt: f32) -> Result<()>;

    // --- Shapes ------------------------------------------------------------

    fn new_box_shape(&self, world: WorldHandle, half_extents: Vec3) -> Result<ShapeHandle>;
    fn new_sphere_shape(&self, world: WorldHandle, radius: f32) -> Result<ShapeHandle>;
    fn new_capsule_shape(&self, world: WorldHandle, radius: f32, height: f32) -> Result<ShapeHandle>;

    /// Load a static triangle mesh through the bound mesh loader.
    fn new_mesh_shape(&self, world: WorldHandle, path: &str) -> Result<ShapeHandle>;

    /// Build a static triangle mesh from buffers already in memory.
    fn new_mesh_shape_from(&self, world: WorldHandle, mesh: MeshData) -> Result<ShapeHandle>;

    // --- Bodies ------------------------------------------------------------

    fn new_body(&self, world: WorldHandle, owner: OwnerTag, info: BodyInfo) -> Result<BodyHandle>;

    /// Remove and free a body. A second call on the same handle reports
    /// `BodyNotFound`.
    fn destroy_body(&self, world: WorldHandle, body: BodyHandle) -> Result<()>;

    fn set_position(&self, body: BodyHandle, position: Vec3) -> Result<()>;
    fn get_position(&self, body: BodyHandle) -> Result<Vec3>;
    fn set_velocity(&self, body: BodyHandle, velocity: Vec3) -> Result<()>;
    fn get_velocity(&self, body: BodyHandle) -> Result<Vec3>;

    /// Set orientation from Euler angles: yaw `rot.y` about +Y, pitch `rot.x`
    /// about +X, roll `rot.z` about +Z, composed as `Ry * Rx * Rz`.
    fn set_rotation_euler(&self, body: BodyHandle, rot: Vec3) -> Result<()>;

    /// Linear force through the center of mass, consumed by the next `progress`.
    fn add_force(&self, body: BodyHandle, force: Vec3) -> Result<()>;

    // --- Queries -----------------------------------------------------------

    /// Closest hit along `origin + dir.normalize() * t`, `t ∈ [0, len]`.
    fn ray_test(&self, world: WorldHandle, origin: Vec3, dir: Vec3, len: f32) -> Result<RayHit>;

    // --- Diagnostics -------------------------------------------------------

    /// Attach (or detach) the debug sink on every world.
    fn enable_visualization(&self, enable: bool);
}

/// Primitive intersection signatures. Contact normals point from B into A;
/// ray directions are normalized and `toi` is a distance.
pub trait NarrowphaseApi {
    // Rays -------------------------------------------------------------------

    fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, r: f32) -> Option<RayIntersection>;
    fn ray_box(origin: Vec3, dir: Vec3, placement: &Placement, half: Vec3) -> Option<RayIntersection>;
    fn ray_capsule(
        origin: Vec3,
        dir: Vec3,
        placement: &Placement,
        radius: f32,
        height: f32,
    ) -> Option<RayIntersection>;
    fn ray_triangle(origin: Vec3, dir: Vec3, tri: &[Vec3; 3]) -> Option<RayIntersection>;

    // Contacts ---------------------------------------------------------------

    fn contact_sphere_sphere(c0: Vec3, r0: f32, c1: Vec3, r1: f32, margin: f32) -> Option<ContactPoint>;
    fn contact_sphere_box(c: Vec3, r: f32, box_at: &Placement, half: Vec3, margin: f32) -> Option<ContactPoint>;
    fn contact_sphere_triangle(c: Vec3, r: f32, tri: &[Vec3; 3], margin: f32) -> Option<ContactPoint>;
    fn contact_box_box(
        a_at: &Placement,
        ha: Vec3,
        b_at: &Placement,
        hb: Vec3,
        margin: f32,
        out: &mut Vec<ContactPoint>,
    );
    fn contact_box_triangle(
        box_at: &Placement,
        half: Vec3,
        tri: &[Vec3; 3],
        margin: f32,
        out: &mut Vec<ContactPoint>,
    );
}
