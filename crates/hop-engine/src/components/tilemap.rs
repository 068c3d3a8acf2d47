//! Tile layers: flat row-major grids of tile ids (0 = empty).
//!
//! The collision layer becomes solid colliders when a level loads; the
//! background and foreground layers are kept for rendering lookups.
//! Out-of-range queries return the empty tile rather than failing.

use glam::Vec2;

use crate::core::math::Aabb;

/// Tile id meaning "nothing here".
pub const EMPTY_TILE: u32 = 0;

/// A rectangle of solid tiles, in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub col: u32,
    pub row: u32,
    pub cols: u32,
    pub rows: u32,
}

/// One grid of tile ids. Stored row-major: index = row * width + col.
/// Origin is the world origin; tile (0, 0) covers [0, tile_size)².
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub width: u32,
    pub height: u32,
    pub tile_size: f32,
    tiles: Vec<u32>,
}

impl TileLayer {
    /// Create an empty layer.
    pub fn new(width: u32, height: u32, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![EMPTY_TILE; (width as usize) * (height as usize)],
        }
    }

    /// Build from a flat array. A short array is padded with empty tiles and
    /// a long one truncated; returns the layer and whether the size matched.
    pub fn from_tiles(width: u32, height: u32, tile_size: f32, mut tiles: Vec<u32>) -> (Self, bool) {
        let expected = (width as usize) * (height as usize);
        let matched = tiles.len() == expected;
        tiles.resize(expected, EMPTY_TILE);
        (
            Self {
                width,
                height,
                tile_size,
                tiles,
            },
            matched,
        )
    }

    /// Tile id at grid position, or `EMPTY_TILE` outside the grid.
    pub fn tile_at(&self, col: i32, row: i32) -> u32 {
        if col < 0 || row < 0 || col as u32 >= self.width || row as u32 >= self.height {
            return EMPTY_TILE;
        }
        self.tiles[(row as u32 * self.width + col as u32) as usize]
    }

    /// Set a tile. Out-of-range writes are ignored.
    pub fn set(&mut self, col: u32, row: u32, tile: u32) {
        if col < self.width && row < self.height {
            self.tiles[(row * self.width + col) as usize] = tile;
        }
    }

    /// Fill a rectangular region with a tile id.
    pub fn fill_rect(&mut self, col: u32, row: u32, cols: u32, rows: u32, tile: u32) {
        for r in row..(row + rows).min(self.height) {
            for c in col..(col + cols).min(self.width) {
                self.set(c, r, tile);
            }
        }
    }

    /// Grid coordinates of a world position (may be out of range).
    pub fn world_to_tile(&self, pos: Vec2) -> (i32, i32) {
        if self.tile_size <= 0.0 {
            return (-1, -1);
        }
        (
            (pos.x / self.tile_size).floor() as i32,
            (pos.y / self.tile_size).floor() as i32,
        )
    }

    /// World-space top-left corner of a tile.
    pub fn tile_to_world(&self, col: u32, row: u32) -> Vec2 {
        Vec2::new(col as f32 * self.tile_size, row as f32 * self.tile_size)
    }

    pub fn is_solid_at(&self, pos: Vec2) -> bool {
        let (c, r) = self.world_to_tile(pos);
        self.tile_at(c, r) != EMPTY_TILE
    }

    /// World-space size of the whole grid.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * self.tile_size
    }

    /// Count of non-empty tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.iter().filter(|&&t| t != EMPTY_TILE).count()
    }

    /// Rectangles covering every non-empty tile.
    ///
    /// With `merge`, runs are grown greedily (right first, then down) so a
    /// floor strip becomes a single rectangle and bodies sliding along it
    /// never catch on internal tile edges. Without it, one rect per tile.
    pub fn solid_rects(&self, merge: bool) -> Vec<TileRect> {
        let mut rects = Vec::new();
        if !merge {
            for row in 0..self.height {
                for col in 0..self.width {
                    if self.tile_at(col as i32, row as i32) != EMPTY_TILE {
                        rects.push(TileRect { col, row, cols: 1, rows: 1 });
                    }
                }
            }
            return rects;
        }

        let w = self.width as usize;
        let mut used = vec![false; self.tiles.len()];
        let free = |used: &[bool], c: u32, r: u32| {
            let i = r as usize * w + c as usize;
            self.tiles[i] != EMPTY_TILE && !used[i]
        };

        for row in 0..self.height {
            for col in 0..self.width {
                if !free(&used, col, row) {
                    continue;
                }
                let mut cols = 1;
                while col + cols < self.width && free(&used, col + cols, row) {
                    cols += 1;
                }
                let mut rows = 1;
                while row + rows < self.height
                    && (col..col + cols).all(|c| free(&used, c, row + rows))
                {
                    rows += 1;
                }
                for r in row..row + rows {
                    for c in col..col + cols {
                        used[r as usize * w + c as usize] = true;
                    }
                }
                rects.push(TileRect { col, row, cols, rows });
            }
        }
        rects
    }

    /// World-space box of a tile rectangle.
    pub fn rect_bounds(&self, rect: &TileRect) -> Aabb {
        Aabb::from_pos_size(
            self.tile_to_world(rect.col, rect.row),
            Vec2::new(rect.cols as f32, rect.rows as f32) * self.tile_size,
        )
    }

    /// Non-empty tiles overlapping `view`: (col, row, tile id).
    pub fn visible_tiles(&self, view: &Aabb) -> Vec<(u32, u32, u32)> {
        if self.tile_size <= 0.0 {
            return Vec::new();
        }
        let min_c = ((view.min.x / self.tile_size).floor() as i32).max(0) as u32;
        let min_r = ((view.min.y / self.tile_size).floor() as i32).max(0) as u32;
        let max_c = ((view.max.x / self.tile_size).ceil() as i32).max(0) as u32;
        let max_r = ((view.max.y / self.tile_size).ceil() as i32).max(0) as u32;

        let mut out = Vec::new();
        for row in min_r..max_r.min(self.height) {
            for col in min_c..max_c.min(self.width) {
                let id = self.tile_at(col as i32, row as i32);
                if id != EMPTY_TILE {
                    out.push((col, row, id));
                }
            }
        }
        out
    }
}
