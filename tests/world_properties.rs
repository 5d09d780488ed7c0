use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use bonk3d::*;
use glam::Vec3;
use parking_lot::Mutex;
use proptest::prelude::*;

const DT: f32 = 1.0 / 60.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Contact {
    Enter,
    Leave,
}

#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<(Contact, WorldHandle, OwnerTag, OwnerTag)>>,
}

impl Recorder {
    fn count(&self, kind: Contact, a: OwnerTag, b: OwnerTag) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|(k, _, x, y)| *k == kind && ((*x, *y) == (a, b) || (*x, *y) == (b, a)))
            .count()
    }
}

impl ContactSink for Recorder {
    fn on_collision_enter(&self, world: WorldHandle, a: OwnerTag, b: OwnerTag) {
        self.log.lock().push((Contact::Enter, world, a, b));
    }
    fn on_collision_leave(&self, world: WorldHandle, a: OwnerTag, b: OwnerTag) {
        self.log.lock().push((Contact::Leave, world, a, b));
    }
}

fn engine_with(sink: Arc<Recorder>) -> PhysicsEngine {
    PhysicsEngine::init(EngineConfig::default(), HostBindings::default().with_contacts(sink)).unwrap()
}

fn zero_g() -> WorldConfig {
    WorldConfig { gravity: Vec3::ZERO, ..Default::default() }
}

// --- Isolation -------------------------------------------------------------

/// Blocks inside the contact callback of world 0 until released.
struct Gate {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ContactSink for Gate {
    fn on_collision_enter(&self, world: WorldHandle, _a: OwnerTag, _b: OwnerTag) {
        if world == WorldHandle(0) {
            let _ = self.entered.lock().send(());
            let _ = self.release.lock().recv();
        }
    }
    fn on_collision_leave(&self, _world: WorldHandle, _a: OwnerTag, _b: OwnerTag) {}
}

fn overlapping_pair(engine: &PhysicsEngine, world: WorldHandle) {
    let s = engine.new_sphere_shape(world, 0.5).unwrap();
    engine.new_body(world, 1, BodyInfo::dynamic(s, 1.0)).unwrap();
    engine.new_body(world, 2, BodyInfo::dynamic(s, 1.0).with_position(Vec3::new(0.8, 0.0, 0.0))).unwrap();
}

#[test]
fn busy_world_does_not_block_another() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Arc::new(Gate { entered: Mutex::new(entered_tx), release: Mutex::new(release_rx) });
    let engine = Arc::new(
        PhysicsEngine::init(EngineConfig::default(), HostBindings::default().with_contacts(gate)).unwrap(),
    );
    let w1 = engine.new_world();
    let w2 = engine.new_world();
    assert_eq!(w1, WorldHandle(0));
    overlapping_pair(&engine, w1);
    overlapping_pair(&engine, w2);

    let e1 = engine.clone();
    let stuck = thread::spawn(move || e1.progress(w1, DT));
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("world 1 should reach its contact callback");

    // World 1 is now mid-step with its lock held.
    let (done_tx, done_rx) = mpsc::channel();
    let e2 = engine.clone();
    thread::spawn(move || {
        for _ in 0..10 {
            e2.progress(w2, DT).unwrap();
        }
        let hit = e2.ray_test(w2, Vec3::new(0.0, 10.0, 0.0), -Vec3::Y, 20.0).unwrap();
        let _ = done_tx.send(hit.hit);
    });
    let hit = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("world 2 must progress while world 1 is busy");
    assert!(hit);

    release_tx.send(()).unwrap();
    stuck.join().unwrap().unwrap();
}

struct NullDraw;

impl DebugDraw for NullDraw {
    fn start_frame(&self) {}
    fn draw_line(&self, _from: Vec3, _to: Vec3, _color: DebugColor) {}
    fn end_frame(&self) {}
    fn is_alive(&self) -> bool {
        true
    }
}

struct NullDrawFactory;

impl DebugDrawFactory for NullDrawFactory {
    fn create(&self) -> Arc<dyn DebugDraw> {
        Arc::new(NullDraw)
    }
}

#[test]
fn shapes_and_worlds_are_created_while_a_world_is_mid_step() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Arc::new(Gate { entered: Mutex::new(entered_tx), release: Mutex::new(release_rx) });
    let bindings = HostBindings::default().with_contacts(gate).with_debug_draw(Arc::new(NullDrawFactory));
    let engine = Arc::new(PhysicsEngine::init(EngineConfig::default(), bindings).unwrap());
    let w1 = engine.new_world();
    assert_eq!(w1, WorldHandle(0));
    overlapping_pair(&engine, w1);

    let e1 = engine.clone();
    let stuck = thread::spawn(move || e1.progress(w1, DT));
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("world 1 should reach its contact callback");

    // Waits on world 1 to attach the sink, holding no engine lock meanwhile.
    let e2 = engine.clone();
    let toggler = thread::spawn(move || e2.enable_visualization(true));
    thread::sleep(Duration::from_millis(50));

    let (done_tx, done_rx) = mpsc::channel();
    let e3 = engine.clone();
    thread::spawn(move || {
        let shape = e3.new_box_shape(w1, Vec3::ONE);
        let fresh = e3.new_world();
        let _ = done_tx.send((shape.is_ok(), e3.is_valid_world(fresh)));
    });
    let (shape_ok, world_ok) = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("shape registration and new_world must not wait for the step");
    assert!(shape_ok);
    assert!(world_ok);

    release_tx.send(()).unwrap();
    stuck.join().unwrap().unwrap();
    toggler.join().unwrap();
    engine.progress(w1, DT).unwrap();
}

#[test]
fn worlds_do_not_share_bodies() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w1 = engine.new_world();
    let w2 = engine.new_world();
    let s = engine.new_sphere_shape(w1, 1.0).unwrap();
    engine.new_body(w1, 5, BodyInfo::fixed(s)).unwrap();
    assert_eq!(engine.body_count(w1).unwrap(), 1);
    assert_eq!(engine.body_count(w2).unwrap(), 0);
    assert!(!engine.ray_test(w2, Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 10.0).unwrap().hit);
}

// --- Motion ----------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn static_body_never_moves(
        x in -20.0f32..20.0,
        y in -20.0f32..20.0,
        z in -20.0f32..20.0,
        dts in proptest::collection::vec(0.0f32..0.05, 1..40),
    ) {
        let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
        let w = engine.new_world();
        let cube = engine.new_box_shape(w, Vec3::new(2.0, 0.5, 2.0)).unwrap();
        let ball = engine.new_sphere_shape(w, 0.5).unwrap();
        let p = Vec3::new(x, y, z);
        let fixed = engine.new_body(w, 1, BodyInfo::fixed(cube).with_position(p)).unwrap();
        engine.new_body(w, 2, BodyInfo::dynamic(ball, 3.0).with_position(p + Vec3::new(0.0, 1.5, 0.0))).unwrap();
        for dt in dts {
            engine.progress(w, dt).unwrap();
        }
        prop_assert_eq!(engine.get_position(fixed).unwrap(), p);
        prop_assert_eq!(engine.get_velocity(fixed).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn ray_hits_sphere_at_analytic_point(
        theta in 0.0f32..std::f32::consts::TAU,
        phi in 0.1f32..3.0,
        dist in 2.0f32..50.0,
        radius in 0.2f32..1.9,
        owner in 1u64..u64::MAX,
    ) {
        let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
        let w = engine.new_world();
        let s = engine.new_sphere_shape(w, radius).unwrap();
        engine.new_body(w, owner, BodyInfo::fixed(s)).unwrap();

        let u = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
        let hit = engine.ray_test(w, u * dist, -u, dist * 2.0).unwrap();
        prop_assert!(hit.hit);
        prop_assert_eq!(hit.owner, owner);
        prop_assert!((hit.point - u * radius).length() < 1e-3, "point {} expected {}", hit.point, u * radius);
        prop_assert!((hit.normal - u).length() < 1e-3);
    }
}

#[test]
fn free_fall_matches_semi_implicit_euler() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let s = engine.new_sphere_shape(w, 0.5).unwrap();
    let y0 = 100.0;
    let b = engine.new_body(w, 1, BodyInfo::dynamic(s, 2.0).with_position(Vec3::new(0.0, y0, 0.0))).unwrap();
    let g = WorldConfig::default().gravity.y;

    let mut last = y0;
    for n in 1..=60u32 {
        engine.progress(w, DT).unwrap();
        let y = engine.get_position(b).unwrap().y;
        assert!(y < last, "step {n}: {y} !< {last}");
        let expected = y0 + g * DT * DT * (n * (n + 1)) as f32 / 2.0;
        assert!((y - expected).abs() < 1e-3, "step {n}: {y} vs {expected}");
        last = y;
    }
}

#[test]
fn set_position_round_trips_exactly() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let s = engine.new_capsule_shape(w, 0.3, 1.0).unwrap();
    let b = engine.new_body(w, 1, BodyInfo::dynamic(s, 1.0)).unwrap();
    for p in [Vec3::new(1.25, -3.5, 7.0), Vec3::new(1e6, 0.1, -1e-6), Vec3::ZERO] {
        engine.set_position(b, p).unwrap();
        assert_eq!(engine.get_position(b).unwrap(), p);
    }
    engine.set_velocity(b, Vec3::new(0.0, 2.0, 0.0)).unwrap();
    assert_eq!(engine.get_velocity(b).unwrap(), Vec3::new(0.0, 2.0, 0.0));
}

#[test]
fn kinematic_body_stays_where_it_was_put() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let paddle = engine.new_box_shape(w, Vec3::new(1.0, 0.25, 1.0)).unwrap();
    let ball = engine.new_sphere_shape(w, 0.5).unwrap();
    let k = engine.new_body(w, 1, BodyInfo::kinematic(paddle)).unwrap();
    engine.new_body(w, 2, BodyInfo::dynamic(ball, 5.0).with_position(Vec3::new(0.0, 2.0, 0.0))).unwrap();

    let target = Vec3::new(0.0, 0.5, 0.0);
    engine.set_position(k, target).unwrap();
    for _ in 0..120 {
        engine.progress(w, DT).unwrap();
        assert_eq!(engine.get_position(k).unwrap(), target);
    }
}

#[test]
fn box_comes_to_rest_on_ground() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let ground = engine.new_box_shape(w, Vec3::new(20.0, 1.0, 20.0)).unwrap();
    let cube = engine.new_box_shape(w, Vec3::splat(0.5)).unwrap();
    engine.new_body(w, 1, BodyInfo::fixed(ground).with_position(Vec3::new(0.0, -1.0, 0.0))).unwrap();
    let b = engine.new_body(w, 2, BodyInfo::dynamic(cube, 1.0).with_position(Vec3::new(0.0, 2.0, 0.0))).unwrap();
    for _ in 0..300 {
        engine.progress(w, DT).unwrap();
    }
    let p = engine.get_position(b).unwrap();
    assert!((p.y - 0.5).abs() < 0.05, "resting height {}", p.y);
    assert!(p.x.abs() < 0.05 && p.z.abs() < 0.05);
    assert!(engine.get_velocity(b).unwrap().length() < 0.1);
}

#[test]
fn sphere_rests_on_mesh_floor() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let floor = engine
        .new_mesh_shape_from(
            w,
            MeshData {
                vertices: vec![
                    Vec3::new(-10.0, 0.0, -10.0),
                    Vec3::new(10.0, 0.0, -10.0),
                    Vec3::new(10.0, 0.0, 10.0),
                    Vec3::new(-10.0, 0.0, 10.0),
                ],
                indices: vec![0, 2, 1, 0, 3, 2],
            },
        )
        .unwrap();
    let ball = engine.new_sphere_shape(w, 0.5).unwrap();
    engine.new_body(w, 1, BodyInfo::fixed(floor)).unwrap();
    let b = engine.new_body(w, 2, BodyInfo::dynamic(ball, 1.0).with_position(Vec3::new(1.0, 3.0, 2.0))).unwrap();
    for _ in 0..240 {
        engine.progress(w, DT).unwrap();
    }
    let p = engine.get_position(b).unwrap();
    assert!((p.y - 0.5).abs() < 0.05, "resting height {}", p.y);
}

// --- Contact events ----------------------------------------------------------

#[test]
fn bouncing_pair_enters_and_leaves_once() {
    let rec = Arc::new(Recorder::default());
    let engine = engine_with(rec.clone());
    let w = engine.new_world_with(zero_g()).unwrap();
    let s = engine.new_sphere_shape(w, 0.5).unwrap();
    let a = engine
        .new_body(w, 1, BodyInfo::dynamic(s, 1.0).with_position(Vec3::new(-2.0, 0.0, 0.0)).with_restitution(1.0))
        .unwrap();
    let b = engine
        .new_body(w, 2, BodyInfo::dynamic(s, 1.0).with_position(Vec3::new(2.0, 0.0, 0.0)).with_restitution(1.0))
        .unwrap();
    engine.set_velocity(a, Vec3::new(2.0, 0.0, 0.0)).unwrap();
    engine.set_velocity(b, Vec3::new(-2.0, 0.0, 0.0)).unwrap();

    for _ in 0..120 {
        engine.progress(w, DT).unwrap();
    }
    assert_eq!(rec.count(Contact::Enter, 1, 2), 1);
    assert_eq!(rec.count(Contact::Leave, 1, 2), 1);
    assert!(engine.get_velocity(a).unwrap().x < 0.0);
    assert!(engine.get_velocity(b).unwrap().x > 0.0);
    assert!(rec.log.lock().iter().all(|(_, world, _, _)| *world == w));
}

#[test]
fn lasting_overlap_enters_once() {
    let rec = Arc::new(Recorder::default());
    let engine = engine_with(rec.clone());
    let w = engine.new_world_with(zero_g()).unwrap();
    let zone = engine.new_box_shape(w, Vec3::splat(2.0)).unwrap();
    let ball = engine.new_sphere_shape(w, 0.5).unwrap();
    engine.new_body(w, 10, BodyInfo::ghost(zone)).unwrap();
    let b = engine.new_body(w, 20, BodyInfo::dynamic(ball, 1.0)).unwrap();

    for _ in 0..60 {
        engine.progress(w, DT).unwrap();
    }
    assert_eq!(rec.count(Contact::Enter, 10, 20), 1);
    assert_eq!(rec.count(Contact::Leave, 10, 20), 0);
    // Ghosts never push.
    assert_eq!(engine.get_position(b).unwrap(), Vec3::ZERO);

    engine.set_position(b, Vec3::new(10.0, 0.0, 0.0)).unwrap();
    engine.progress(w, DT).unwrap();
    assert_eq!(rec.count(Contact::Leave, 10, 20), 1);
}

#[test]
fn destroying_a_touching_body_drops_its_leave() {
    let rec = Arc::new(Recorder::default());
    let engine = engine_with(rec.clone());
    let w = engine.new_world_with(zero_g()).unwrap();
    let zone = engine.new_box_shape(w, Vec3::splat(2.0)).unwrap();
    let ball = engine.new_sphere_shape(w, 0.5).unwrap();
    engine.new_body(w, 10, BodyInfo::ghost(zone)).unwrap();
    let b = engine.new_body(w, 20, BodyInfo::dynamic(ball, 1.0)).unwrap();
    engine.progress(w, DT).unwrap();
    assert_eq!(rec.count(Contact::Enter, 10, 20), 1);

    engine.destroy_body(w, b).unwrap();
    engine.progress(w, DT).unwrap();
    assert_eq!(rec.count(Contact::Leave, 10, 20), 0);

    // A new body in the recycled slot starts a fresh pair.
    let c = engine.new_body(w, 30, BodyInfo::dynamic(ball, 1.0)).unwrap();
    assert_eq!(c.index, b.index);
    engine.progress(w, DT).unwrap();
    assert_eq!(rec.count(Contact::Enter, 10, 30), 1);
}

#[test]
fn static_pairs_produce_no_events() {
    let rec = Arc::new(Recorder::default());
    let engine = engine_with(rec.clone());
    let w = engine.new_world();
    let cube = engine.new_box_shape(w, Vec3::ONE).unwrap();
    engine.new_body(w, 1, BodyInfo::fixed(cube)).unwrap();
    engine.new_body(w, 2, BodyInfo::fixed(cube).with_position(Vec3::new(0.5, 0.0, 0.0))).unwrap();
    engine.new_body(w, 3, BodyInfo::kinematic(cube).with_position(Vec3::new(0.0, 0.5, 0.0))).unwrap();
    for _ in 0..10 {
        engine.progress(w, DT).unwrap();
    }
    assert!(rec.log.lock().is_empty());
}

// --- Queries and lifecycle -----------------------------------------------------

#[test]
fn empty_world_ray_misses() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let hit = engine.ray_test(w, Vec3::ZERO, Vec3::new(0.3, -1.0, 0.2), 1000.0).unwrap();
    assert!(!hit.hit);
    assert_eq!(hit.owner, 0);
}

#[test]
fn ray_returns_nearest_and_ignores_enclosing_shape() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let room = engine.new_sphere_shape(w, 50.0).unwrap();
    let cube = engine.new_box_shape(w, Vec3::splat(0.5)).unwrap();
    let ball = engine.new_sphere_shape(w, 0.5).unwrap();
    engine.new_body(w, 1, BodyInfo::ghost(room)).unwrap();
    engine.new_body(w, 2, BodyInfo::fixed(cube).with_position(Vec3::new(6.0, 0.0, 0.0))).unwrap();
    engine.new_body(w, 3, BodyInfo::fixed(ball).with_position(Vec3::new(3.0, 0.0, 0.0))).unwrap();

    let hit = engine.ray_test(w, Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), 100.0).unwrap();
    assert!(hit.hit);
    assert_eq!(hit.owner, 3);
    assert!((hit.point - Vec3::new(2.5, 0.0, 0.0)).length() < 1e-4);

    // Too short to reach anything.
    assert!(!engine.ray_test(w, Vec3::ZERO, Vec3::X, 2.0).unwrap().hit);
}

#[test]
fn far_body_is_hit_by_a_long_ray() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let ball = engine.new_sphere_shape(w, 1.0).unwrap();
    engine.new_body(w, 9, BodyInfo::fixed(ball).with_position(Vec3::new(50_000.0, 0.0, 0.0))).unwrap();

    let hit = engine.ray_test(w, Vec3::ZERO, Vec3::X, 100_000.0).unwrap();
    assert!(hit.hit);
    assert_eq!(hit.owner, 9);
    assert!((hit.point.x - 49_999.0).abs() < 0.05);
    assert!(!engine.ray_test(w, Vec3::ZERO, Vec3::X, 40_000.0).unwrap().hit);
}

#[test]
fn huge_static_box_does_not_stall_the_step() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let slab = engine.new_box_shape(w, Vec3::splat(1.0e7)).unwrap();
    let ball = engine.new_sphere_shape(w, 0.5).unwrap();
    // Top face at y = -1000.
    engine.new_body(w, 1, BodyInfo::fixed(slab).with_position(Vec3::new(0.0, -10_001_000.0, 0.0))).unwrap();
    let b = engine.new_body(w, 2, BodyInfo::dynamic(ball, 1.0)).unwrap();
    for _ in 0..30 {
        engine.progress(w, DT).unwrap();
    }
    assert!(engine.get_position(b).unwrap().y < 0.0);

    let hit = engine.ray_test(w, Vec3::new(3.0, 10.0, 0.0), -Vec3::Y, 5000.0).unwrap();
    assert!(hit.hit);
    assert_eq!(hit.owner, 1);
}

#[test]
fn destroy_world_is_idempotent() {
    let engine = PhysicsEngine::init(EngineConfig::default(), HostBindings::default()).unwrap();
    let w = engine.new_world();
    let s = engine.new_sphere_shape(w, 1.0).unwrap();
    let b = engine.new_body(w, 1, BodyInfo::dynamic(s, 1.0)).unwrap();
    engine.destroy_world(w);
    engine.destroy_world(w);
    engine.destroy_world(engine.invalid_world_handle());
    assert_eq!(engine.get_position(b), Err(PhysicsError::WorldNotFound(w)));
    assert_eq!(engine.progress(w, DT), Err(PhysicsError::WorldNotFound(w)));
    engine.deinit().unwrap();
}
