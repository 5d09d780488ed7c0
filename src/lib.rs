//! bonk3d: rigid-body physics core with isolated worlds, contact enter/leave
//! notifications and ray queries.
//!
//! The host creates a [`PhysicsEngine`], allocates worlds, registers shapes,
//! adds bodies and calls [`PhysicsApi::progress`] once per frame. Collaborators
//! (contact sink, transform store, mesh loader, debug draw) are injected via
//! [`HostBindings`].

pub mod types;
pub mod error;
pub mod api;
pub mod host;
pub mod shape;
pub mod body;
mod broadphase;
pub mod narrowphase;
mod solver;
mod events;
mod debug_draw;
mod world;
pub mod engine;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{PhysicsError, Result};
pub use crate::host::*;
pub use crate::engine::PhysicsEngine;
