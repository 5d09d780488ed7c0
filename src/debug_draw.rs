use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::body::{BodySet, MotionKind, RigidBody};
use crate::host::DebugDraw;
use crate::shape::Shape;
use crate::types::{Aabb, BodyKind, DebugColor, Placement};

/// Segments per full circle.
const CIRCLE_SEGMENTS: usize = 16;

struct Lines<'a> {
    sink: &'a dyn DebugDraw,
    count: usize,
}

impl Lines<'_> {
    fn line(&mut self, from: Vec3, to: Vec3, color: DebugColor) {
        self.sink.draw_line(from, to, color);
        self.count += 1;
    }

    /// Arc in the plane spanned by `u` and `v` around `center`.
    fn arc(&mut self, center: Vec3, u: Vec3, v: Vec3, radius: f32, from: f32, sweep: f32, color: DebugColor) {
        let steps = ((sweep / TAU) * CIRCLE_SEGMENTS as f32).ceil().max(1.0) as usize;
        let at = |a: f32| center + (u * a.cos() + v * a.sin()) * radius;
        let mut prev = at(from);
        for i in 1..=steps {
            let next = at(from + sweep * i as f32 / steps as f32);
            self.line(prev, next, color);
            prev = next;
        }
    }

    fn aabb(&mut self, b: &Aabb, color: DebugColor) {
        let at = Placement::at(b.center());
        self.cuboid(&at, b.half_extents(), color);
    }

    fn cuboid(&mut self, at: &Placement, half: Vec3, color: DebugColor) {
        let corner = |i: usize| {
            let s = Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { -1.0 } else { 1.0 },
            );
            at.transform_point(half * s)
        };
        // Corners differing in exactly one bit share an edge.
        for i in 0..8 {
            for bit in [1, 2, 4] {
                if i & bit == 0 {
                    self.line(corner(i), corner(i | bit), color);
                }
            }
        }
    }
}

fn wireframe_color(body: &RigidBody) -> DebugColor {
    match (body.kind(), body.motion()) {
        (BodyKind::Ghost, _) => DebugColor::WIREFRAME_GHOST,
        (_, MotionKind::Kinematic) => DebugColor::WIREFRAME_KINEMATIC,
        (_, MotionKind::Static) => DebugColor::WIREFRAME_STATIC,
        (_, MotionKind::Dynamic) => DebugColor::WIREFRAME_ACTIVE,
    }
}

fn draw_shape(lines: &mut Lines<'_>, shape: &Shape, at: &Placement, color: DebugColor) {
    let [x, y, z] = [at.rotation * Vec3::X, at.rotation * Vec3::Y, at.rotation * Vec3::Z];
    match shape {
        Shape::Box { half_extents } => lines.cuboid(at, *half_extents, color),
        Shape::Sphere { radius } => {
            lines.arc(at.position, x, y, *radius, 0.0, TAU, color);
            lines.arc(at.position, y, z, *radius, 0.0, TAU, color);
            lines.arc(at.position, z, x, *radius, 0.0, TAU, color);
        }
        Shape::Capsule { radius, height } => {
            let top = at.position + y * (height * 0.5);
            let bottom = at.position - y * (height * 0.5);
            lines.arc(top, x, z, *radius, 0.0, TAU, color);
            lines.arc(bottom, x, z, *radius, 0.0, TAU, color);
            for side in [x, -x, z, -z] {
                lines.line(bottom + side * *radius, top + side * *radius, color);
            }
            for u in [x, z] {
                lines.arc(top, u, y, *radius, 0.0, PI, color);
                lines.arc(bottom, u, -y, *radius, 0.0, PI, color);
            }
        }
        Shape::TriangleMesh(mesh) => {
            for t in 0..mesh.triangle_count() {
                let [a, b, c] = mesh.triangle(t).map(|v| at.transform_point(v));
                lines.line(a, b, color);
                lines.line(b, c, color);
                lines.line(c, a, color);
            }
        }
    }
}

/// Emit one frame of wireframes and bounds into `sink`. Returns the number of
/// lines drawn; nothing is drawn once the sink reports itself dead.
pub(crate) fn draw_world(bodies: &BodySet, sink: &dyn DebugDraw) -> usize {
    if !sink.is_alive() {
        return 0;
    }
    sink.start_frame();
    let mut lines = Lines { sink, count: 0 };
    for (_, body) in bodies.iter() {
        draw_shape(&mut lines, body.shape(), &body.placement, wireframe_color(body));
        lines.aabb(&body.world_aabb(), DebugColor::AABB);
    }
    sink.end_frame();
    lines.count
}
