use std::sync::Arc;

use glam::Vec3;

use crate::error::{PhysicsError, Result, ensure_finite, ensure_positive};
use crate::host::MeshData;
use crate::types::Aabb;

/// Immutable collision geometry. Bodies share shapes through `Arc`, so a
/// shape outlives every body that references it.
#[derive(Clone, Debug)]
pub enum Shape {
    /// Centered box.
    Box { half_extents: Vec3 },
    /// Centered sphere.
    Sphere { radius: f32 },
    /// Y-aligned capsule; `height` is the distance between the cap centers.
    Capsule { radius: f32, height: f32 },
    /// Static triangle soup.
    TriangleMesh(TriangleMesh),
}

impl Shape {
    pub fn cuboid(half_extents: Vec3) -> Result<Self> {
        ensure_finite("box half extents", half_extents)?;
        if half_extents.cmple(Vec3::ZERO).any() {
            return Err(PhysicsError::InvalidParameter(format!(
                "box half extents must be > 0, got {half_extents}"
            )));
        }
        Ok(Shape::Box { half_extents })
    }

    pub fn sphere(radius: f32) -> Result<Self> {
        ensure_positive("sphere radius", radius)?;
        Ok(Shape::Sphere { radius })
    }

    pub fn capsule(radius: f32, height: f32) -> Result<Self> {
        ensure_positive("capsule radius", radius)?;
        if !height.is_finite() || height < 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "capsule height must be finite and >= 0, got {height}"
            )));
        }
        Ok(Shape::Capsule { radius, height })
    }

    pub fn mesh(data: MeshData) -> Result<Self> {
        Ok(Shape::TriangleMesh(TriangleMesh::new(data)?))
    }

    /// Meshes carry no inertia and may only back non-moving bodies.
    pub fn is_dynamic_capable(&self) -> bool {
        !matches!(self, Shape::TriangleMesh(_))
    }

    pub fn local_aabb(&self) -> Aabb {
        match self {
            Shape::Box { half_extents } => Aabb::from_center_half(Vec3::ZERO, *half_extents),
            Shape::Sphere { radius } => Aabb::from_center_half(Vec3::ZERO, Vec3::splat(*radius)),
            Shape::Capsule { radius, height } => Aabb::from_center_half(
                Vec3::ZERO,
                Vec3::new(*radius, radius + height * 0.5, *radius),
            ),
            Shape::TriangleMesh(mesh) => mesh.bounds,
        }
    }

    /// Diagonal of the local inertia tensor for the given mass.
    pub fn local_inertia(&self, mass: f32) -> Vec3 {
        let box_inertia = |half: Vec3| {
            let l = half * 2.0;
            let l2 = l * l;
            Vec3::new(l2.y + l2.z, l2.x + l2.z, l2.x + l2.y) * (mass / 12.0)
        };
        match self {
            Shape::Box { half_extents } => box_inertia(*half_extents),
            Shape::Sphere { radius } => Vec3::splat(0.4 * mass * radius * radius),
            // Bounding-box approximation, as Bullet does for capsules.
            Shape::Capsule { radius, height } => {
                box_inertia(Vec3::new(*radius, radius + height * 0.5, *radius))
            }
            Shape::TriangleMesh(_) => Vec3::ZERO,
        }
    }

    /// Local endpoints of the capsule core segment.
    pub(crate) fn capsule_segment(height: f32) -> (Vec3, Vec3) {
        let h = Vec3::new(0.0, height * 0.5, 0.0);
        (-h, h)
    }
}

/// Indexed triangle mesh with a bounding volume hierarchy over its triangles.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    nodes: Vec<BvhNode>,
    /// Triangle indices referenced by leaf ranges.
    order: Vec<u32>,
    pub bounds: Aabb,
}

#[derive(Clone, Debug)]
struct BvhNode {
    bounds: Aabb,
    /// Leaf: `count > 0`, range `[first, first + count)` in `order`.
    /// Inner: `count == 0`, children at `first` and `first + 1`.
    first: u32,
    count: u32,
}

const BVH_LEAF_SIZE: usize = 4;

impl TriangleMesh {
    pub fn new(data: MeshData) -> Result<Self> {
        let MeshData { vertices, indices } = data;
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "mesh index count must be a non-zero multiple of 3, got {}",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(PhysicsError::InvalidParameter(format!(
                "mesh index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        if let Some(v) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(PhysicsError::InvalidParameter(format!("mesh vertex {v} is not finite")));
        }

        let triangles: Vec<[u32; 3]> = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        let mut mesh = TriangleMesh {
            bounds: Aabb::from_points(&vertices),
            vertices,
            order: (0..triangles.len() as u32).collect(),
            triangles,
            nodes: Vec::new(),
        };
        mesh.build_bvh();
        Ok(mesh)
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    fn triangle_bounds(&self, index: usize) -> Aabb {
        Aabb::from_points(&self.triangle(index))
    }

    fn build_bvh(&mut self) {
        let tri_bounds: Vec<Aabb> = (0..self.triangles.len()).map(|i| self.triangle_bounds(i)).collect();
        let centroids: Vec<Vec3> = tri_bounds.iter().map(Aabb::center).collect();
        self.nodes.push(BvhNode { bounds: Aabb::EMPTY, first: 0, count: 0 });
        let len = self.order.len();
        self.build_node(0, 0, len, &tri_bounds, &centroids);
    }

    fn build_node(&mut self, node: usize, start: usize, end: usize, tri_bounds: &[Aabb], centroids: &[Vec3]) {
        let slice = &mut self.order[start..end];
        let bounds = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, &t| acc.merge(tri_bounds[t as usize]));
        if end - start <= BVH_LEAF_SIZE {
            self.nodes[node] = BvhNode { bounds, first: start as u32, count: (end - start) as u32 };
            return;
        }

        let centroid_bounds = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, &t| acc.include(centroids[t as usize]));
        let extent = centroid_bounds.max - centroid_bounds.min;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };
        let mid = (end - start) / 2;
        slice.select_nth_unstable_by(mid, |&a, &b| {
            centroids[a as usize][axis].total_cmp(&centroids[b as usize][axis])
        });

        let left = self.nodes.len();
        self.nodes.push(BvhNode { bounds: Aabb::EMPTY, first: 0, count: 0 });
        self.nodes.push(BvhNode { bounds: Aabb::EMPTY, first: 0, count: 0 });
        self.nodes[node] = BvhNode { bounds, first: left as u32, count: 0 };
        self.build_node(left, start, start + mid, tri_bounds, centroids);
        self.build_node(left + 1, start + mid, end, tri_bounds, centroids);
    }

    /// Visit every triangle whose bounds overlap `query` (mesh-local space).
    pub fn for_each_overlapping(&self, query: &Aabb, mut visit: impl FnMut(usize)) {
        let mut stack = vec![0usize];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.bounds.overlaps(query) {
                continue;
            }
            if node.count > 0 {
                let range = node.first as usize..(node.first + node.count) as usize;
                for &t in &self.order[range] {
                    if self.triangle_bounds(t as usize).overlaps(query) {
                        visit(t as usize);
                    }
                }
            } else {
                stack.push(node.first as usize);
                stack.push(node.first as usize + 1);
            }
        }
    }

    /// Visit triangles whose node bounds the ray `[0, max_t]` enters. `visit`
    /// returns a hit distance, which tightens the search.
    pub fn for_each_on_ray(
        &self,
        origin: Vec3,
        dir: Vec3,
        mut max_t: f32,
        mut visit: impl FnMut(usize, f32) -> Option<f32>,
    ) {
        let mut stack = vec![0usize];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if node.bounds.ray_entry(origin, dir, max_t).is_none() {
                continue;
            }
            if node.count > 0 {
                let range = node.first as usize..(node.first + node.count) as usize;
                for &t in &self.order[range] {
                    if let Some(toi) = visit(t as usize, max_t) {
                        max_t = max_t.min(toi);
                    }
                }
            } else {
                stack.push(node.first as usize);
                stack.push(node.first as usize + 1);
            }
        }
    }
}

/// Shapes owned by one world. Guarded by its own lock in the world so asset
/// threads can register geometry while a step is running.
#[derive(Default)]
pub(crate) struct ShapeRegistry {
    shapes: Vec<Arc<Shape>>,
}

impl ShapeRegistry {
    pub fn push(&mut self, shape: Shape) -> u32 {
        self.shapes.push(Arc::new(shape));
        (self.shapes.len() - 1) as u32
    }

    pub fn get(&self, index: u32) -> Option<Arc<Shape>> {
        self.shapes.get(index as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}
