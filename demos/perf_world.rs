use std::time::Instant;

use bonk3d::*;
use glam::Vec3;
use tracing_subscriber::EnvFilter;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default())?;
    let world = engine.new_world_with(WorldConfig { cell_size: 2.0, enable_timing: true, ..Default::default() })?;

    let ground = engine.new_box_shape(world, Vec3::new(60.0, 1.0, 60.0))?;
    let cube = engine.new_box_shape(world, Vec3::splat(0.5))?;
    let ball = engine.new_sphere_shape(world, 0.5)?;
    let pill = engine.new_capsule_shape(world, 0.3, 0.8)?;
    engine.new_body(world, 0, BodyInfo::fixed(ground).with_position(Vec3::new(0.0, -1.0, 0.0)))?;

    let n = 2_000usize; // number of dynamic bodies
    let mut seed = 1u32;
    for i in 0..n {
        let p = Vec3::new(unit(&mut seed) * 100.0 - 50.0, 1.0 + unit(&mut seed) * 40.0, unit(&mut seed) * 100.0 - 50.0);
        let shape = match i % 3 {
            0 => cube,
            1 => ball,
            _ => pill,
        };
        engine.new_body(world, i as u64 + 1, BodyInfo::dynamic(shape, 1.0).with_position(p))?;
    }

    let frames = 240;
    let t0 = Instant::now();
    for frame in 0..frames {
        engine.progress(world, 1.0 / 60.0)?;
        if frame % 60 == 0 {
            let s = engine.step_stats(world)?;
            if let Some(t) = engine.step_timing(world)? {
                println!(
                    "frame {frame}: bodies={} cells={} pairs={} touching={} points={} step={:.3}ms (broad={:.3} narrow={:.3} solve={:.3})",
                    s.bodies,
                    s.cells,
                    s.candidate_pairs,
                    s.touching_pairs,
                    s.contact_points,
                    t.progress_ms,
                    t.broadphase_ms,
                    t.narrowphase_ms,
                    t.solver_ms
                );
            }
        }
    }
    println!("N={} frames={} total={:?}", n, frames, t0.elapsed());

    engine.deinit()
}
