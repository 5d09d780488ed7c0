use std::collections::{HashMap, HashSet};

use glam::Vec3;

use crate::types::Aabb;

type Cell = (i32, i32, i32);

/// Proxies spanning more cells than this skip the grid and are paired with
/// everything (large static ground meshes).
const MAX_CELLS_PER_PROXY: i64 = 512;

/// Uniform hash grid over body AABBs, rebuilt from scratch every step.
pub(crate) struct UniformGrid {
    cell_size: f32,
    /// Proxy id (body slot) → bounds.
    aabbs: HashMap<usize, Aabb>,
    grid: HashMap<Cell, Vec<usize>>,
    oversized: Vec<usize>,
    /// Union of the gridded proxies; rays are clipped to it.
    bounds: Aabb,
}

impl UniformGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1e-5),
            aabbs: HashMap::new(),
            grid: HashMap::new(),
            oversized: Vec::new(),
            bounds: Aabb::EMPTY,
        }
    }

    pub fn clear(&mut self) {
        self.aabbs.clear();
        self.grid.clear();
        self.oversized.clear();
        self.bounds = Aabb::EMPTY;
    }

    pub fn cell_count(&self) -> usize {
        self.grid.len()
    }

    pub fn aabb(&self, id: usize) -> Option<&Aabb> {
        self.aabbs.get(&id)
    }

    pub fn insert(&mut self, id: usize, aabb: Aabb) {
        let (c0, c1) = (self.world_to_cell(aabb.min), self.world_to_cell(aabb.max));
        // Clamped so the product stays small for huge bounds.
        let span = |a: i32, b: i32| (b as i64 - a as i64 + 1).clamp(1, MAX_CELLS_PER_PROXY + 1);
        let cells = span(c0.0, c1.0) * span(c0.1, c1.1) * span(c0.2, c1.2);
        self.aabbs.insert(id, aabb);
        if cells > MAX_CELLS_PER_PROXY {
            self.oversized.push(id);
            return;
        }
        self.bounds = self.bounds.merge(aabb);
        for iz in c0.2..=c1.2 {
            for iy in c0.1..=c1.1 {
                for ix in c0.0..=c1.0 {
                    self.grid.entry((ix, iy, iz)).or_default().push(id);
                }
            }
        }
    }

    fn world_to_cell(&self, p: Vec3) -> Cell {
        let cs = self.cell_size;
        (
            (p.x / cs).floor() as i32,
            (p.y / cs).floor() as i32,
            (p.z / cs).floor() as i32,
        )
    }

    /// Unique overlapping pairs `(a, b)` with `a < b`, sorted.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut out = Vec::new();
        let mut consider = |a: usize, b: usize, out: &mut Vec<(usize, usize)>| {
            if a == b {
                return;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            if !seen.insert(key) {
                return;
            }
            if let (Some(ba), Some(bb)) = (self.aabbs.get(&key.0), self.aabbs.get(&key.1)) {
                if ba.overlaps(bb) {
                    out.push(key);
                }
            }
        };

        for indices in self.grid.values() {
            for i0 in 0..indices.len() {
                for i1 in (i0 + 1)..indices.len() {
                    consider(indices[i0], indices[i1], &mut out);
                }
            }
        }
        for &big in &self.oversized {
            for &other in self.aabbs.keys() {
                consider(big, other, &mut out);
            }
        }
        out.sort_unstable();
        out
    }

    /// Visit proxies near the ray `origin + t * dir`, `t ∈ [0, max_t]`, cell by
    /// cell (3-D DDA). `dir` must be normalized. `visit` returns the distance
    /// of a confirmed hit, which ends the walk once no nearer cell remains.
    pub fn walk_ray(&self, origin: Vec3, dir: Vec3, max_t: f32, mut visit: impl FnMut(usize) -> Option<f32>) {
        let mut tested: HashSet<usize> = HashSet::new();
        let mut best = f32::INFINITY;
        for &id in &self.oversized {
            tested.insert(id);
            if let Some(t) = visit(id) {
                best = best.min(t);
            }
        }

        if self.grid.is_empty() {
            return;
        }
        let Some((t_enter, t_exit)) = self.bounds.expand(self.cell_size).ray_span(origin, dir, max_t) else {
            return;
        };

        let cs = self.cell_size;
        let mut cell = self.world_to_cell(origin + dir * t_enter);
        let step = |d: f32| if d > 0.0 { 1 } else if d < 0.0 { -1 } else { 0 };
        let steps = [step(dir.x), step(dir.y), step(dir.z)];
        let cell_arr = |c: Cell| [c.0, c.1, c.2];
        let mut t_max = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];
        for axis in 0..3 {
            if steps[axis] != 0 {
                let c = cell_arr(cell)[axis];
                let boundary = if steps[axis] > 0 { (c as f32 + 1.0) * cs } else { c as f32 * cs };
                t_max[axis] = (boundary - origin[axis]) / dir[axis];
                t_delta[axis] = cs / dir[axis].abs();
            }
        }

        let mut t_curr = t_enter;
        loop {
            if t_curr > t_exit || t_curr > best {
                break;
            }
            if let Some(list) = self.grid.get(&cell) {
                for &id in list {
                    if !tested.insert(id) {
                        continue;
                    }
                    if let Some(t) = visit(id) {
                        best = best.min(t);
                    }
                }
            }

            // Step along the axis whose boundary is nearest.
            let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
                0
            } else if t_max[1] <= t_max[2] {
                1
            } else {
                2
            };
            if t_max[axis].is_infinite() {
                break;
            }
            match axis {
                0 => cell.0 += steps[0],
                1 => cell.1 += steps[1],
                _ => cell.2 += steps[2],
            }
            t_curr = t_max[axis];
            t_max[axis] += t_delta[axis];
        }
    }
}
