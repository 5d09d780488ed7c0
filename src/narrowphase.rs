use glam::{Mat3, Vec3};

use crate::api::NarrowphaseApi;
use crate::shape::{Shape, TriangleMesh};
use crate::types::*;

/// Contacts kept per convex-vs-mesh pair.
const MAX_MESH_CONTACTS: usize = 8;

/// Points closer than this are treated as the same contact.
const DUPLICATE_EPS: f32 = 1e-4;

/// Narrowphase primitive tests.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, r: f32) -> Option<RayIntersection> {
        // Solve |origin + t*dir - center|^2 = r^2 with |dir| = 1
        let m = origin - center;
        let b = m.dot(dir);
        let c = m.length_squared() - r * r;
        if c <= 0.0 {
            // Origin inside: not reported.
            return None;
        }
        if b > 0.0 {
            return None;
        }
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let t = -b - disc.sqrt();
        let point = origin + dir * t;
        let normal = (point - center) / r;
        Some(RayIntersection { toi: t.max(0.0), point, normal })
    }

    fn ray_box(origin: Vec3, dir: Vec3, placement: &Placement, half: Vec3) -> Option<RayIntersection> {
        // Slab method in box space with entry-normal tracking.
        let lo = placement.inverse_transform_point(origin);
        let ld = placement.rotation.inverse() * dir;
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;
        let mut n_enter = Vec3::ZERO;

        for axis in 0..3 {
            if ld[axis].abs() < f32::EPSILON {
                if lo[axis] < -half[axis] || lo[axis] > half[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / ld[axis];
            let mut t1 = (-half[axis] - lo[axis]) * inv;
            let mut t2 = (half[axis] - lo[axis]) * inv;
            let mut sign = -1.0;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
                sign = 1.0;
            }
            if t1 > tmin {
                tmin = t1;
                n_enter = Vec3::ZERO;
                n_enter[axis] = sign;
            }
            tmax = tmax.min(t2);
            if tmin > tmax {
                return None;
            }
        }

        // Behind the origin, or origin inside the box.
        if tmin < 0.0 {
            return None;
        }
        Some(RayIntersection {
            toi: tmin,
            point: origin + dir * tmin,
            normal: placement.rotation * n_enter,
        })
    }

    fn ray_capsule(
        origin: Vec3,
        dir: Vec3,
        placement: &Placement,
        radius: f32,
        height: f32,
    ) -> Option<RayIntersection> {
        let lo = placement.inverse_transform_point(origin);
        let ld = placement.rotation.inverse() * dir;
        let (s0, s1) = Shape::capsule_segment(height);
        let (_, closest) = closest_point_on_segment(lo, s0, s1);
        if (lo - closest).length_squared() <= radius * radius {
            return None;
        }

        let mut best: Option<(f32, Vec3)> = None;

        // Cylinder body around Y.
        let a = ld.x * ld.x + ld.z * ld.z;
        if a > f32::EPSILON {
            let b = lo.x * ld.x + lo.z * ld.z;
            let c = lo.x * lo.x + lo.z * lo.z - radius * radius;
            let disc = b * b - a * c;
            if disc >= 0.0 {
                let t = (-b - disc.sqrt()) / a;
                let y = lo.y + t * ld.y;
                if t >= 0.0 && y.abs() <= height * 0.5 {
                    let p = lo + ld * t;
                    best = Some((t, Vec3::new(p.x, 0.0, p.z) / radius));
                }
            }
        }

        // Hemispherical caps.
        for cap in [s0, s1] {
            if let Some(h) = Self::ray_sphere(lo, ld, cap, radius) {
                if best.is_none_or(|(t, _)| h.toi < t) {
                    best = Some((h.toi, h.normal));
                }
            }
        }

        best.map(|(t, n)| RayIntersection {
            toi: t,
            point: origin + dir * t,
            normal: placement.rotation * n,
        })
    }

    fn ray_triangle(origin: Vec3, dir: Vec3, tri: &[Vec3; 3]) -> Option<RayIntersection> {
        // Möller–Trumbore, double sided.
        let [a, b, c] = *tri;
        let e1 = b - a;
        let e2 = c - a;
        let p = dir.cross(e2);
        let det = e1.dot(p);
        if det.abs() < 1e-9 {
            return None;
        }
        let inv = 1.0 / det;
        let s = origin - a;
        let u = s.dot(p) * inv;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = dir.dot(q) * inv;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv;
        if t < 0.0 {
            return None;
        }
        let mut normal = e1.cross(e2).normalize_or_zero();
        if normal.dot(dir) > 0.0 {
            normal = -normal;
        }
        Some(RayIntersection { toi: t, point: origin + dir * t, normal })
    }

    fn contact_sphere_sphere(c0: Vec3, r0: f32, c1: Vec3, r1: f32, margin: f32) -> Option<ContactPoint> {
        let delta = c0 - c1;
        let dist2 = delta.length_squared();
        let rsum = r0 + r1;
        if dist2 > (rsum + margin) * (rsum + margin) {
            return None;
        }
        let dist = dist2.sqrt();
        // Coincident centers: pick +Y.
        let normal = if dist > f32::EPSILON { delta / dist } else { Vec3::Y };
        Some(ContactPoint {
            point: c1 + normal * r1,
            normal,
            depth: rsum - dist,
        })
    }

    fn contact_sphere_box(c: Vec3, r: f32, box_at: &Placement, half: Vec3, margin: f32) -> Option<ContactPoint> {
        let local = box_at.inverse_transform_point(c);
        let closest = local.clamp(-half, half);
        let d = local - closest;
        let dist2 = d.length_squared();

        if dist2 > f32::EPSILON * f32::EPSILON {
            if dist2 > (r + margin) * (r + margin) {
                return None;
            }
            let dist = dist2.sqrt();
            let n = d / dist;
            return Some(ContactPoint {
                point: box_at.transform_point(closest),
                normal: box_at.rotation * n,
                depth: r - dist,
            });
        }

        // Center inside the box: push out through the nearest face.
        let gap = half - local.abs();
        let axis = if gap.x <= gap.y && gap.x <= gap.z {
            0
        } else if gap.y <= gap.z {
            1
        } else {
            2
        };
        let sign = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
        let mut n = Vec3::ZERO;
        n[axis] = sign;
        let mut surface = local;
        surface[axis] = sign * half[axis];
        Some(ContactPoint {
            point: box_at.transform_point(surface),
            normal: box_at.rotation * n,
            depth: r + gap[axis],
        })
    }

    fn contact_sphere_triangle(c: Vec3, r: f32, tri: &[Vec3; 3], margin: f32) -> Option<ContactPoint> {
        let q = closest_point_on_triangle(c, tri);
        let d = c - q;
        let dist2 = d.length_squared();
        if dist2 > (r + margin) * (r + margin) {
            return None;
        }
        let dist = dist2.sqrt();
        let normal = if dist > f32::EPSILON {
            d / dist
        } else {
            (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or(Vec3::Y)
        };
        Some(ContactPoint { point: q, normal, depth: r - dist })
    }

    fn contact_box_box(
        a_at: &Placement,
        ha: Vec3,
        b_at: &Placement,
        hb: Vec3,
        margin: f32,
        out: &mut Vec<ContactPoint>,
    ) {
        let axes_a = box_axes(a_at);
        let axes_b = box_axes(b_at);
        let delta = a_at.position - b_at.position;

        // Separating axis test over 3 + 3 + 9 axes.
        let mut best: Option<SatAxis> = None;
        let mut test = |l: Vec3, edge: Option<(usize, usize)>| -> bool {
            let len2 = l.length_squared();
            if len2 < 1e-8 {
                return true;
            }
            let l = l / len2.sqrt();
            let overlap = projected_radius(&axes_a, ha, l) + projected_radius(&axes_b, hb, l) - delta.dot(l).abs();
            if overlap < -margin {
                return false;
            }
            // Prefer face axes for stable resting contact.
            let score = if edge.is_some() { overlap * 1.05 + 1e-3 } else { overlap };
            if best.as_ref().is_none_or(|b| score < b.score) {
                let normal = if delta.dot(l) >= 0.0 { l } else { -l };
                best = Some(SatAxis { normal, overlap, score, edge });
            }
            true
        };

        for axis in axes_a.iter().chain(axes_b.iter()) {
            if !test(*axis, None) {
                return;
            }
        }
        for i in 0..3 {
            for j in 0..3 {
                if !test(axes_a[i].cross(axes_b[j]), Some((i, j))) {
                    return;
                }
            }
        }
        let Some(sat) = best else { return };
        let n = sat.normal;

        let start = out.len();
        let a_low = a_at.position.dot(n) - projected_radius(&axes_a, ha, n);
        let b_high = b_at.position.dot(n) + projected_radius(&axes_b, hb, n);
        for p in box_vertices(b_at, hb) {
            if point_in_box(a_at, ha, p, margin) {
                let depth = p.dot(n) - a_low;
                if depth > -margin {
                    out.push(ContactPoint { point: p, normal: n, depth });
                }
            }
        }
        for q in box_vertices(a_at, ha) {
            if point_in_box(b_at, hb, q, margin) {
                let depth = b_high - q.dot(n);
                if depth > -margin {
                    out.push(ContactPoint { point: q - n * depth, normal: n, depth });
                }
            }
        }
        if out.len() > start {
            return;
        }

        // No vertex inside the other box: edge-edge, or a face-edge graze.
        let point = match sat.edge {
            Some((i, j)) => {
                let (a0, a1) = support_edge(a_at, &axes_a, ha, i, -n);
                let (b0, b1) = support_edge(b_at, &axes_b, hb, j, n);
                closest_points_segments(a0, a1, b0, b1).1
            }
            None => support_point(b_at, &axes_b, hb, n),
        };
        out.push(ContactPoint { point, normal: n, depth: sat.overlap });
    }

    fn contact_box_triangle(
        box_at: &Placement,
        half: Vec3,
        tri: &[Vec3; 3],
        margin: f32,
        out: &mut Vec<ContactPoint>,
    ) {
        let [a, b, c] = *tri;
        let face = (b - a).cross(c - a);
        let len = face.length();
        if len < 1e-12 {
            return;
        }
        let face_n = face / len;
        // Orient toward the box so either winding works.
        let n = if (box_at.position - a).dot(face_n) >= 0.0 { face_n } else { -face_n };
        let axes = box_axes(box_at);
        let r = projected_radius(&axes, half, n);
        if (box_at.position - a).dot(n) - r > margin {
            return;
        }

        for p in box_vertices(box_at, half) {
            let s = (p - a).dot(n);
            if s < margin && s > -2.0 * r && point_in_triangle(p, tri, face_n) {
                out.push(ContactPoint { point: p - n * s, normal: n, depth: -s });
            }
        }
        let low = box_at.position.dot(n) - r;
        for v in [a, b, c] {
            if point_in_box(box_at, half, v, margin) {
                let depth = v.dot(n) - low;
                if depth > -margin {
                    out.push(ContactPoint { point: v, normal: n, depth });
                }
            }
        }
    }
}

struct SatAxis {
    normal: Vec3,
    overlap: f32,
    score: f32,
    edge: Option<(usize, usize)>,
}

impl Narrowphase {
    /// Contact points between two placed shapes, normals from B into A.
    /// Appends to `out`; nothing is appended when the shapes are apart.
    pub fn collide(
        a: &Shape,
        a_at: &Placement,
        b: &Shape,
        b_at: &Placement,
        margin: f32,
        out: &mut Vec<ContactPoint>,
    ) {
        use Shape::*;
        match (a, b) {
            (Sphere { radius: r0 }, Sphere { radius: r1 }) => {
                out.extend(Self::contact_sphere_sphere(a_at.position, *r0, b_at.position, *r1, margin));
            }
            (Sphere { radius }, Box { half_extents }) => {
                out.extend(Self::contact_sphere_box(a_at.position, *radius, b_at, *half_extents, margin));
            }
            (Sphere { radius: r0 }, Capsule { radius: r1, height }) => {
                let (s0, s1) = capsule_world_segment(b_at, *height);
                let (_, q) = closest_point_on_segment(a_at.position, s0, s1);
                out.extend(Self::contact_sphere_sphere(a_at.position, *r0, q, *r1, margin));
            }
            (Capsule { radius: r0, height: h0 }, Capsule { radius: r1, height: h1 }) => {
                let (p0, p1) = capsule_world_segment(a_at, *h0);
                let (q0, q1) = capsule_world_segment(b_at, *h1);
                let (pa, pb) = closest_points_segments(p0, p1, q0, q1);
                out.extend(Self::contact_sphere_sphere(pa, *r0, pb, *r1, margin));
                // Parallel capsules rest on two points.
                for end in [p0, p1] {
                    let (_, q) = closest_point_on_segment(end, q0, q1);
                    if end.distance(pa) > DUPLICATE_EPS {
                        out.extend(Self::contact_sphere_sphere(end, *r0, q, *r1, margin));
                    }
                }
            }
            (Capsule { radius, height }, Box { half_extents }) => {
                let (p0, p1) = capsule_world_segment(a_at, *height);
                let deepest = segment_point_nearest_box(p0, p1, b_at, *half_extents);
                for q in dedup_points([p0, p1, deepest]) {
                    out.extend(Self::contact_sphere_box(q, *radius, b_at, *half_extents, margin));
                }
            }
            (Box { half_extents: ha }, Box { half_extents: hb }) => {
                Self::contact_box_box(a_at, *ha, b_at, *hb, margin, out);
            }
            (TriangleMesh(_), TriangleMesh(_)) => {}
            (_, TriangleMesh(mesh)) => collide_convex_mesh(a, a_at, mesh, b_at, margin, out),
            // Remaining orders are the mirrored cases above.
            _ => {
                let start = out.len();
                Self::collide(b, b_at, a, a_at, margin, out);
                for c in &mut out[start..] {
                    c.normal = -c.normal;
                    c.point += c.normal * c.depth;
                }
            }
        }
    }

    /// Closest ray hit against one placed shape within `max_t`.
    pub fn ray_shape(shape: &Shape, at: &Placement, origin: Vec3, dir: Vec3, max_t: f32) -> Option<RayIntersection> {
        let hit = match shape {
            Shape::Sphere { radius } => Self::ray_sphere(origin, dir, at.position, *radius),
            Shape::Box { half_extents } => Self::ray_box(origin, dir, at, *half_extents),
            Shape::Capsule { radius, height } => Self::ray_capsule(origin, dir, at, *radius, *height),
            Shape::TriangleMesh(mesh) => ray_mesh(origin, dir, at, mesh, max_t),
        }?;
        (hit.toi <= max_t).then_some(hit)
    }
}

fn collide_convex_mesh(
    convex: &Shape,
    convex_at: &Placement,
    mesh: &TriangleMesh,
    mesh_at: &Placement,
    margin: f32,
    out: &mut Vec<ContactPoint>,
) {
    let world_box = convex.local_aabb().transformed(convex_at).expand(margin);
    let inv_rot = mesh_at.rotation.inverse();
    let to_mesh = Placement { position: inv_rot * -mesh_at.position, rotation: inv_rot };
    let query = world_box.transformed(&to_mesh);

    let mut found: Vec<ContactPoint> = Vec::new();
    mesh.for_each_overlapping(&query, |t| {
        let tri = mesh.triangle(t).map(|v| mesh_at.transform_point(v));
        match convex {
            Shape::Sphere { radius } => {
                found.extend(Narrowphase::contact_sphere_triangle(convex_at.position, *radius, &tri, margin));
            }
            Shape::Box { half_extents } => {
                Narrowphase::contact_box_triangle(convex_at, *half_extents, &tri, margin, &mut found);
            }
            Shape::Capsule { radius, height } => {
                let (p0, p1) = capsule_world_segment(convex_at, *height);
                let nearest = segment_point_nearest_triangle(p0, p1, &tri);
                for q in dedup_points([p0, p1, nearest]) {
                    found.extend(Narrowphase::contact_sphere_triangle(q, *radius, &tri, margin));
                }
            }
            Shape::TriangleMesh(_) => {}
        }
    });

    found.sort_by(|x, y| y.depth.total_cmp(&x.depth));
    let mut kept: Vec<ContactPoint> = Vec::new();
    for c in found {
        if kept.len() == MAX_MESH_CONTACTS {
            break;
        }
        if kept.iter().all(|k| k.point.distance(c.point) > DUPLICATE_EPS) {
            kept.push(c);
        }
    }
    out.extend(kept);
}

fn ray_mesh(origin: Vec3, dir: Vec3, at: &Placement, mesh: &TriangleMesh, max_t: f32) -> Option<RayIntersection> {
    let lo = at.inverse_transform_point(origin);
    let ld = at.rotation.inverse() * dir;
    let mut best: Option<RayIntersection> = None;
    mesh.for_each_on_ray(lo, ld, max_t, |t, limit| {
        let hit = Narrowphase::ray_triangle(lo, ld, &mesh.triangle(t))?;
        if hit.toi > limit {
            return None;
        }
        if best.is_none_or(|b| hit.toi < b.toi) {
            best = Some(hit);
        }
        Some(hit.toi)
    });
    best.map(|h| RayIntersection {
        toi: h.toi,
        point: at.transform_point(h.point),
        normal: at.rotation * h.normal,
    })
}

// --- Geometry helpers ------------------------------------------------------

fn box_axes(at: &Placement) -> [Vec3; 3] {
    let m = Mat3::from_quat(at.rotation);
    [m.x_axis, m.y_axis, m.z_axis]
}

fn projected_radius(axes: &[Vec3; 3], half: Vec3, l: Vec3) -> f32 {
    half.x * axes[0].dot(l).abs() + half.y * axes[1].dot(l).abs() + half.z * axes[2].dot(l).abs()
}

fn box_vertices(at: &Placement, half: Vec3) -> [Vec3; 8] {
    let mut out = [Vec3::ZERO; 8];
    for (i, v) in out.iter_mut().enumerate() {
        let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
        let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
        let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
        *v = at.transform_point(half * Vec3::new(sx, sy, sz));
    }
    out
}

fn point_in_box(at: &Placement, half: Vec3, p: Vec3, margin: f32) -> bool {
    let local = at.inverse_transform_point(p);
    local.abs().cmple(half + Vec3::splat(margin)).all()
}

fn support_point(at: &Placement, axes: &[Vec3; 3], half: Vec3, dir: Vec3) -> Vec3 {
    let mut p = at.position;
    for k in 0..3 {
        let s = if axes[k].dot(dir) >= 0.0 { 1.0 } else { -1.0 };
        p += axes[k] * half[k] * s;
    }
    p
}

/// Edge of the box parallel to `axes[along]` that lies furthest toward `dir`.
fn support_edge(at: &Placement, axes: &[Vec3; 3], half: Vec3, along: usize, dir: Vec3) -> (Vec3, Vec3) {
    let mut center = at.position;
    for k in 0..3 {
        if k != along {
            let s = if axes[k].dot(dir) >= 0.0 { 1.0 } else { -1.0 };
            center += axes[k] * half[k] * s;
        }
    }
    let e = axes[along] * half[along];
    (center - e, center + e)
}

fn capsule_world_segment(at: &Placement, height: f32) -> (Vec3, Vec3) {
    let (a, b) = Shape::capsule_segment(height);
    (at.transform_point(a), at.transform_point(b))
}

fn dedup_points<const N: usize>(points: [Vec3; N]) -> Vec<Vec3> {
    let mut out: Vec<Vec3> = Vec::with_capacity(N);
    for p in points {
        if out.iter().all(|q| q.distance(p) > DUPLICATE_EPS) {
            out.push(p);
        }
    }
    out
}

/// Parameter in `[0, 1]` and point on segment `ab` closest to `p`.
pub(crate) fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> (f32, Vec3) {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return (0.0, a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (t, a + ab * t)
}

/// Closest points between segments `p1q1` and `p2q2`.
pub(crate) fn closest_points_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);
    let eps = f32::EPSILON;

    let (s, t) = if a <= eps && e <= eps {
        (0.0, 0.0)
    } else if a <= eps {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= eps {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom.abs() > eps { ((b * f - c * e) / denom).clamp(0.0, 1.0) } else { 0.0 };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };
    (p1 + d1 * s, p2 + d2 * t)
}

/// Closest point on triangle `abc` to `p` (Voronoi region walk).
pub(crate) fn closest_point_on_triangle(p: Vec3, tri: &[Vec3; 3]) -> Vec3 {
    let [a, b, c] = *tri;
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }
    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }
    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }
    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

/// Whether `p` projects inside the triangle along `face_n`.
fn point_in_triangle(p: Vec3, tri: &[Vec3; 3], face_n: Vec3) -> bool {
    let [a, b, c] = *tri;
    let eps = -1e-6;
    (b - a).cross(p - a).dot(face_n) >= eps
        && (c - b).cross(p - b).dot(face_n) >= eps
        && (a - c).cross(p - c).dot(face_n) >= eps
}

/// Point of segment `p0p1` nearest to the box (alternating projection).
fn segment_point_nearest_box(p0: Vec3, p1: Vec3, box_at: &Placement, half: Vec3) -> Vec3 {
    let l0 = box_at.inverse_transform_point(p0);
    let l1 = box_at.inverse_transform_point(p1);
    let mut t = 0.5;
    for _ in 0..8 {
        let q = l0.lerp(l1, t);
        let on_box = q.clamp(-half, half);
        t = closest_point_on_segment(on_box, l0, l1).0;
    }
    p0.lerp(p1, t)
}

/// Point of segment `p0p1` nearest to the triangle.
fn segment_point_nearest_triangle(p0: Vec3, p1: Vec3, tri: &[Vec3; 3]) -> Vec3 {
    let [a, b, c] = *tri;
    let face_n = (b - a).cross(c - a).normalize_or_zero();
    let d0 = (p0 - a).dot(face_n);
    let d1 = (p1 - a).dot(face_n);
    if d0 * d1 <= 0.0 && d0 != d1 {
        let x = p0.lerp(p1, d0 / (d0 - d1));
        if point_in_triangle(x, tri, face_n) {
            return x;
        }
    }

    let mut best = p0;
    let mut best_d2 = p0.distance_squared(closest_point_on_triangle(p0, tri));
    let d2 = p1.distance_squared(closest_point_on_triangle(p1, tri));
    if d2 < best_d2 {
        best = p1;
        best_d2 = d2;
    }
    for (e0, e1) in [(a, b), (b, c), (c, a)] {
        let (on_seg, on_edge) = closest_points_segments(p0, p1, e0, e1);
        let d2 = on_seg.distance_squared(on_edge);
        if d2 < best_d2 {
            best = on_seg;
            best_d2 = d2;
        }
    }
    best
}
