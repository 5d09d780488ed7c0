use std::sync::Arc;

use glam::{Mat3, Quat, Vec3};

use crate::shape::Shape;
use crate::types::{Aabb, BodyKind, OwnerTag, Placement, WorldHandle};

/// How the solver treats a body. Fixed at creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionKind {
    /// Integrated by the solver.
    Dynamic,
    /// Never moves unless placed explicitly.
    Static,
    /// Placed by the host; infinite mass for the solver.
    Kinematic,
}

/// Activation policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Activation {
    /// Default for static bodies.
    Active,
    /// Never put to sleep; forces may arrive on any frame.
    AlwaysActive,
}

/// Collision-response flags.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    pub kinematic: bool,
    /// Detect and report, but do not push.
    pub no_contact_response: bool,
    /// Route contacts through the owner-tag dispatcher.
    pub custom_contact_callback: bool,
}

/// Which way the placement bridge flows for a body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SyncDirection {
    /// Solver writes the transform out to the host store.
    Publish,
    /// Host store drives the transform.
    Pull,
}

/// Placement-bridge record: who to publish to, or pull from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MotionState {
    pub owner: OwnerTag,
    pub scene: WorldHandle,
    pub direction: SyncDirection,
}

/// A simulated rigid object.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub(crate) kind: BodyKind,
    pub(crate) motion: MotionKind,
    pub(crate) flags: CollisionFlags,
    pub(crate) activation: Activation,
    pub(crate) shape: Arc<Shape>,
    pub(crate) placement: Placement,
    /// Placement at the end of the previous step (kinematic velocity source).
    pub(crate) prev_position: Vec3,
    pub(crate) linear_velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
    pub(crate) inv_mass: f32,
    pub(crate) inv_inertia_local: Vec3,
    pub(crate) inv_inertia_world: Mat3,
    pub(crate) restitution: f32,
    pub(crate) friction: f32,
    pub(crate) force: Vec3,
    pub(crate) motion_state: Option<MotionState>,
}

impl RigidBody {
    pub(crate) fn new(
        shape: Arc<Shape>,
        kind: BodyKind,
        mass: f32,
        restitution: f32,
        friction: f32,
        placement: Placement,
    ) -> Self {
        let moves = mass > 0.0;
        let motion = match kind {
            BodyKind::Kinematic => MotionKind::Kinematic,
            BodyKind::Dynamic | BodyKind::Ghost if moves => MotionKind::Dynamic,
            BodyKind::Dynamic | BodyKind::Ghost => MotionKind::Static,
        };
        // Ghosts get mass but no inertia: they translate, never spin.
        let local_inertia = if kind == BodyKind::Dynamic && moves {
            shape.local_inertia(mass)
        } else {
            Vec3::ZERO
        };
        let inv = |v: f32| if v > 0.0 { 1.0 / v } else { 0.0 };
        let inv_inertia_local = Vec3::new(inv(local_inertia.x), inv(local_inertia.y), inv(local_inertia.z));
        let inv_mass = if motion == MotionKind::Dynamic { 1.0 / mass } else { 0.0 };

        let flags = CollisionFlags {
            kinematic: kind == BodyKind::Kinematic,
            no_contact_response: kind == BodyKind::Ghost,
            custom_contact_callback: true,
        };
        let activation = match motion {
            MotionKind::Static => Activation::Active,
            MotionKind::Dynamic | MotionKind::Kinematic => Activation::AlwaysActive,
        };

        let mut body = Self {
            kind,
            motion,
            flags,
            activation,
            shape,
            placement,
            prev_position: placement.position,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            inv_mass,
            inv_inertia_local,
            inv_inertia_world: Mat3::ZERO,
            restitution,
            friction,
            force: Vec3::ZERO,
            motion_state: None,
        };
        body.update_inertia();
        body
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn motion(&self) -> MotionKind {
        self.motion
    }

    pub fn flags(&self) -> CollisionFlags {
        self.flags
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_dynamic(&self) -> bool {
        self.motion == MotionKind::Dynamic
    }

    /// Bodies that take part in impulse resolution as movable mass.
    pub(crate) fn responds(&self) -> bool {
        !self.flags.no_contact_response
    }

    pub(crate) fn world_aabb(&self) -> Aabb {
        self.shape.local_aabb().transformed(&self.placement)
    }

    pub(crate) fn update_inertia(&mut self) {
        let r = Mat3::from_quat(self.placement.rotation);
        self.inv_inertia_world = r * Mat3::from_diagonal(self.inv_inertia_local) * r.transpose();
    }

    pub(crate) fn velocity_at(&self, offset: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(offset)
    }

    pub(crate) fn apply_impulse(&mut self, impulse: Vec3, offset: Vec3) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia_world * offset.cross(impulse);
    }

    pub(crate) fn set_rotation(&mut self, rotation: Quat) {
        self.placement.rotation = rotation.normalize();
        self.update_inertia();
    }
}

struct Slot {
    generation: u32,
    body: Option<RigidBody>,
    /// Owner-tag side table entry; cleared before the body is dropped.
    record: Option<(OwnerTag, WorldHandle)>,
}

/// Generational slot storage for the bodies of one world.
#[derive(Default)]
pub(crate) struct BodySet {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl BodySet {
    pub fn insert(&mut self, body: RigidBody, record: (OwnerTag, WorldHandle)) -> (u32, u32) {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.body = Some(body);
            slot.record = Some(record);
            (index, slot.generation)
        } else {
            self.slots.push(Slot { generation: 0, body: Some(body), record: Some(record) });
            ((self.slots.len() - 1) as u32, 0)
        }
    }

    pub fn get(&self, index: u32, generation: u32) -> Option<&RigidBody> {
        let slot = self.slots.get(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.body.as_ref()
    }

    pub fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut RigidBody> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.body.as_mut()
    }

    /// Drop the owner record first, then the body.
    pub fn remove(&mut self, index: u32, generation: u32) -> Option<RigidBody> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation || slot.body.is_none() {
            return None;
        }
        slot.record = None;
        let body = slot.body.take();
        self.free.push(index);
        self.live -= 1;
        body
    }

    pub fn record(&self, index: usize) -> Option<(OwnerTag, WorldHandle)> {
        self.slots.get(index).and_then(|s| s.record)
    }

    pub fn by_index(&self, index: usize) -> Option<&RigidBody> {
        self.slots.get(index).and_then(|s| s.body.as_ref())
    }

    #[cfg(test)]
    pub fn by_index_mut(&mut self, index: usize) -> Option<&mut RigidBody> {
        self.slots.get_mut(index).and_then(|s| s.body.as_mut())
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RigidBody)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.body.as_ref().map(|b| (i, b)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut RigidBody)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.body.as_mut().map(|b| (i, b)))
    }

    /// Two distinct bodies by slot index.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut RigidBody, &mut RigidBody)> {
        if a == b {
            return None;
        }
        let (lo, hi, swapped) = if a < b { (a, b, false) } else { (b, a, true) };
        let (head, tail) = self.slots.split_at_mut(hi);
        let first = head.get_mut(lo)?.body.as_mut()?;
        let second = tail.first_mut()?.body.as_mut()?;
        if swapped { Some((second, first)) } else { Some((first, second)) }
    }

    /// Remove every body and record.
    pub fn clear(&mut self) -> usize {
        let n = self.live;
        for slot in &mut self.slots {
            slot.record = None;
            slot.body = None;
        }
        self.free.clear();
        self.live = 0;
        n
    }
}
