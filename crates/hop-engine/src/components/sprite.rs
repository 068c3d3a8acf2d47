use serde::{Deserialize, Serialize};

/// Identifies which texture atlas a sprite belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AtlasId(pub u32);

/// What the renderer should paint for an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Visual {
    /// Nothing (collision-only objects such as tile colliders).
    None,
    /// A cell of a sprite atlas.
    Sprite { atlas: AtlasId, col: f32, row: f32 },
    /// A flat RGBA rectangle.
    Color([f32; 4]),
}

/// Appearance component: how an object looks, independent of its physics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub visual: Visual,
    /// Rotation in radians.
    pub rotation: f32,
    /// Scale multiplier on the object's size.
    pub scale: f32,
    /// Opacity (0.0 = invisible, 1.0 = opaque).
    pub opacity: f32,
    /// Mirror horizontally (objects facing left).
    pub flip_x: bool,
    /// Temporary tint color and seconds left on it (damage flash).
    pub flash: Option<([f32; 4], f32)>,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            visual: Visual::None,
            rotation: 0.0,
            scale: 1.0,
            opacity: 1.0,
            flip_x: false,
            flash: None,
        }
    }
}

impl Appearance {
    pub fn color(rgba: [f32; 4]) -> Self {
        Self {
            visual: Visual::Color(rgba),
            ..Default::default()
        }
    }

    pub fn sprite(atlas: AtlasId, col: f32, row: f32) -> Self {
        Self {
            visual: Visual::Sprite { atlas, col, row },
            ..Default::default()
        }
    }

    /// Tint for `duration` seconds. Replaces any running flash.
    pub fn flash(&mut self, rgba: [f32; 4], duration: f32) {
        self.flash = Some((rgba, duration));
    }

    /// Count down the flash timer; the tint reverts when it runs out.
    pub fn tick(&mut self, dt: f32) {
        if let Some((color, remaining)) = self.flash {
            let left = remaining - dt;
            self.flash = if left > 0.0 { Some((color, left)) } else { None };
        }
    }

    /// Point a sprite at a new atlas cell. No-op for non-sprite visuals.
    pub fn set_frame(&mut self, frame: (f32, f32)) {
        if let Visual::Sprite { col, row, .. } = &mut self.visual {
            *col = frame.0;
            *row = frame.1;
        }
    }

    pub fn is_drawable(&self) -> bool {
        !matches!(self.visual, Visual::None) && self.opacity > 0.0
    }
}
