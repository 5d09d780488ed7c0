use bonk3d::*;
use glam::Vec3;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default())?;
    let world = engine.new_world();

    let cube = engine.new_box_shape(world, Vec3::splat(0.5))?;
    let ball = engine.new_sphere_shape(world, 0.5)?;
    engine.new_body(world, 10, BodyInfo::fixed(cube).with_position(Vec3::new(2.0, 0.0, 0.0)))?;
    engine.new_body(world, 20, BodyInfo::fixed(ball).with_position(Vec3::new(4.0, 0.0, 0.0)))?;

    let hit = engine.ray_test(world, Vec3::ZERO, Vec3::X, 100.0)?;
    if hit.hit {
        println!(
            "Ray hit owner={} p=({:.2},{:.2},{:.2}) n=({:.2},{:.2},{:.2})",
            hit.owner, hit.point.x, hit.point.y, hit.point.z, hit.normal.x, hit.normal.y, hit.normal.z
        );
    } else {
        println!("No hit");
    }

    engine.deinit()
}
