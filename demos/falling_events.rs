use std::sync::Arc;

use bonk3d::*;
use glam::Vec3;
use tracing_subscriber::EnvFilter;

struct PrintContacts;

impl ContactSink for PrintContacts {
    fn on_collision_enter(&self, world: WorldHandle, a: OwnerTag, b: OwnerTag) {
        println!("enter: world={} {} <-> {}", world.0, a, b);
    }

    fn on_collision_leave(&self, world: WorldHandle, a: OwnerTag, b: OwnerTag) {
        println!("leave: world={} {} <-> {}", world.0, a, b);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let bindings = HostBindings::default().with_contacts(Arc::new(PrintContacts));
    let engine = PhysicsEngine::init(EngineConfig::default(), bindings)?;
    let world = engine.new_world_with(WorldConfig { enable_timing: true, ..Default::default() })?;

    let ground = engine.new_box_shape(world, Vec3::new(10.0, 0.5, 10.0))?;
    let ball = engine.new_sphere_shape(world, 0.5)?;
    engine.new_body(world, 1, BodyInfo::fixed(ground).with_position(Vec3::new(0.0, -0.5, 0.0)))?;
    let body = engine.new_body(
        world,
        2,
        BodyInfo::dynamic(ball, 1.0).with_position(Vec3::new(0.0, 3.0, 0.0)).with_restitution(0.8),
    )?;

    for frame in 0..180 {
        if frame == 120 {
            // Kick the ball up and away from the ground.
            engine.set_velocity(body, Vec3::new(0.0, 8.0, 0.0))?;
        }
        engine.progress(world, 1.0 / 60.0)?;
        if frame % 30 == 0 {
            let p = engine.get_position(body)?;
            let stats = engine.step_stats(world)?;
            println!(
                "frame {frame:3}: y={:.3} touching={} points={}",
                p.y, stats.touching_pairs, stats.contact_points
            );
        }
    }
    if let Some(t) = engine.step_timing(world)? {
        println!(
            "last step: {:.3}ms (broad={:.3}ms narrow={:.3}ms solve={:.3}ms)",
            t.progress_ms, t.broadphase_ms, t.narrowphase_ms, t.solver_ms
        );
    }

    engine.deinit()
}
