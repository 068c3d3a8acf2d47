//! Uniform-grid broad phase.
//!
//! Rebuilt from scratch every physics step. Each object is listed in every
//! cell its AABB overlaps; pairs are emitted once per step no matter how
//! many cells two objects share.

use std::collections::{HashMap, HashSet};

use glam::Vec2;

use crate::api::types::ObjectId;
use crate::components::object::GameObject;
use crate::core::math::Aabb;
use crate::physics::layers::CollisionLayers;

type CellKey = (i32, i32);

/// Snapshot of one object as seen by the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridEntry {
    /// Index into the object slice the grid was built from.
    pub index: usize,
    pub id: ObjectId,
    pub bounds: Aabb,
    pub layers: CollisionLayers,
    pub solid: bool,
    pub trigger: bool,
}

/// Uniform spatial grid keyed by integer cell coordinates.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    entries: Vec<GridEntry>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 64.0 },
            cells: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn clear(&mut self) {
        // Keep the cell vectors' capacity between steps.
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.entries.clear();
    }

    /// Clear and insert every live object.
    pub fn rebuild(&mut self, objects: &[GameObject]) {
        self.clear();
        self.add_objects(objects);
    }

    /// Insert every live object. Indices refer to `objects`.
    pub fn add_objects(&mut self, objects: &[GameObject]) {
        for (index, obj) in objects.iter().enumerate() {
            if !obj.is_alive() {
                continue;
            }
            self.insert(GridEntry {
                index,
                id: obj.id,
                bounds: obj.bounds(),
                layers: obj.body.layers,
                solid: obj.body.solid,
                trigger: obj.body.trigger,
            });
        }
    }

    pub fn insert(&mut self, entry: GridEntry) {
        let slot = self.entries.len();
        let (min, max) = self.cell_range(&entry.bounds);
        for cy in min.1..=max.1 {
            for cx in min.0..=max.0 {
                self.cells.entry((cx, cy)).or_default().push(slot);
            }
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[GridEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|b| !b.is_empty()).count()
    }

    fn cell_of(&self, p: Vec2) -> CellKey {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    fn cell_range(&self, bounds: &Aabb) -> (CellKey, CellKey) {
        (self.cell_of(bounds.min), self.cell_of(bounds.max))
    }

    /// Every unordered pair of entries sharing at least one cell, exactly
    /// once, as object-slice indices with the lower id first. Sorted, so
    /// resolution order does not depend on hash iteration order.
    pub fn potential_pairs(&self) -> Vec<(usize, usize)> {
        let mut seen: HashSet<(ObjectId, ObjectId)> = HashSet::new();
        let mut pairs = Vec::new();
        for bucket in self.cells.values() {
            for (i, &sa) in bucket.iter().enumerate() {
                for &sb in &bucket[i + 1..] {
                    let (a, b) = (&self.entries[sa], &self.entries[sb]);
                    if a.id == b.id {
                        continue;
                    }
                    let (first, second) = if a.id < b.id { (a, b) } else { (b, a) };
                    if seen.insert((first.id, second.id)) {
                        pairs.push((first.index, second.index));
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }

    /// Entries whose bounds overlap `area` (strictly).
    pub fn query_aabb(&self, area: &Aabb) -> Vec<&GridEntry> {
        let (min, max) = self.cell_range(area);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for cy in min.1..=max.1 {
            for cx in min.0..=max.0 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &slot in bucket {
                    let entry = &self.entries[slot];
                    if entry.bounds.overlaps(area) && seen.insert(slot) {
                        out.push(entry);
                    }
                }
            }
        }
        out
    }

    /// Entries in every cell the ray passes through, in traversal order,
    /// each at most once. Exact cell walk (Amanatides-Woo), so thin
    /// objects between samples cannot be skipped.
    pub fn objects_in_ray(&self, origin: Vec2, dir: Vec2, max_distance: f32) -> Vec<&GridEntry> {
        let dir = dir.normalize_or_zero();
        if dir == Vec2::ZERO || max_distance <= 0.0 || !max_distance.is_finite() {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut cell = self.cell_of(origin);
        let end_cell = self.cell_of(origin + dir * max_distance);

        let step_x = if dir.x > 0.0 { 1 } else if dir.x < 0.0 { -1 } else { 0 };
        let step_y = if dir.y > 0.0 { 1 } else if dir.y < 0.0 { -1 } else { 0 };

        // Ray distance to the first vertical / horizontal cell boundary,
        // and between successive ones. Parallel axes never cross.
        let boundary = |c: i32, step: i32| -> f32 {
            let edge = if step > 0 { c + 1 } else { c };
            edge as f32 * self.cell_size
        };
        let mut t_max_x = if step_x != 0 {
            (boundary(cell.0, step_x) - origin.x) / dir.x
        } else {
            f32::INFINITY
        };
        let mut t_max_y = if step_y != 0 {
            (boundary(cell.1, step_y) - origin.y) / dir.y
        } else {
            f32::INFINITY
        };
        let t_delta_x = if step_x != 0 { self.cell_size / dir.x.abs() } else { f32::INFINITY };
        let t_delta_y = if step_y != 0 { self.cell_size / dir.y.abs() } else { f32::INFINITY };

        // Bounded by the Manhattan cell distance; guards float edge cases.
        let max_visits = (end_cell.0 - cell.0).abs() + (end_cell.1 - cell.1).abs() + 2;
        for _ in 0..max_visits {
            if let Some(bucket) = self.cells.get(&cell) {
                for &slot in bucket {
                    if seen.insert(slot) {
                        out.push(&self.entries[slot]);
                    }
                }
            }
            if cell == end_cell {
                break;
            }
            if t_max_x < t_max_y {
                if t_max_x > max_distance {
                    break;
                }
                cell.0 += step_x;
                t_max_x += t_delta_x;
            } else {
                if t_max_y > max_distance {
                    break;
                }
                cell.1 += step_y;
                t_max_y += t_delta_y;
            }
        }
        out
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(64.0)
    }
}
