use bytemuck::{Pod, Zeroable};

use crate::components::layer::WorldLayer;

/// Per-instance draw data handed to a renderer backend.
/// 16 floats = 64 bytes stride, so a GPU backend can upload the list as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// Top-left X in world space.
    pub x: f32,
    /// Top-left Y in world space (y down).
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation in radians about the center.
    pub rotation: f32,
    /// Opacity (0.0 = invisible, 1.0 = opaque).
    pub alpha: f32,
    /// 1.0 samples the atlas, 0.0 draws a flat `tint` rectangle.
    pub textured: f32,
    pub atlas: f32,
    pub sprite_col: f32,
    pub sprite_row: f32,
    /// 1.0 when mirrored horizontally.
    pub flip_x: f32,
    pub _pad: f32,
    /// Flat color, or multiply tint for sprites.
    pub tint: [f32; 4],
}

impl RenderInstance {
    pub const FLOATS: usize = 16;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// A contiguous run of instances belonging to one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerBatch {
    pub layer: WorldLayer,
    /// Start index in the instance array
    pub start: u32,
    /// End index (exclusive) in the instance array
    pub end: u32,
}

impl LayerBatch {
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Instances for one frame, grouped into per-layer batches in paint order.
pub struct RenderBuffer {
    pub instances: Vec<RenderInstance>,
    pub batches: Vec<LayerBatch>,
    open: Option<(WorldLayer, u32)>,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(512),
            batches: Vec::with_capacity(WorldLayer::COUNT),
            open: None,
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.batches.clear();
        self.open = None;
    }

    /// Start collecting instances for `layer`, closing any open layer.
    pub fn begin_layer(&mut self, layer: WorldLayer) {
        self.end_layer();
        self.open = Some((layer, self.instance_count()));
    }

    /// Close the open layer. Empty layers produce no batch.
    pub fn end_layer(&mut self) {
        if let Some((layer, start)) = self.open.take() {
            let end = self.instance_count();
            if end > start {
                self.batches.push(LayerBatch { layer, start, end });
            }
        }
    }

    pub fn push(&mut self, instance: RenderInstance) {
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn batch(&self, layer: WorldLayer) -> Option<&LayerBatch> {
        self.batches.iter().find(|b| b.layer == layer)
    }

    /// Instances of one batch.
    pub fn slice(&self, batch: &LayerBatch) -> &[RenderInstance] {
        &self.instances[batch.start as usize..batch.end as usize]
    }

    /// Instance data as raw bytes for buffer uploads.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_instance_is_16_floats() {
        assert_eq!(std::mem::size_of::<RenderInstance>(), RenderInstance::STRIDE_BYTES);
        assert_eq!(RenderInstance::FLOATS, 16);
    }

    #[test]
    fn layers_become_batches() {
        let mut buf = RenderBuffer::new();
        buf.begin_layer(WorldLayer::Tiles);
        buf.push(RenderInstance::default());
        buf.push(RenderInstance::default());
        buf.begin_layer(WorldLayer::Entities);
        buf.begin_layer(WorldLayer::Player);
        buf.push(RenderInstance::default());
        buf.end_layer();

        assert_eq!(buf.batches.len(), 2);
        assert_eq!(buf.batches[0], LayerBatch { layer: WorldLayer::Tiles, start: 0, end: 2 });
        assert_eq!(buf.batch(WorldLayer::Player).map(LayerBatch::len), Some(1));
        assert!(buf.batch(WorldLayer::Entities).is_none());
        assert_eq!(buf.as_bytes().len(), 3 * RenderInstance::STRIDE_BYTES);
    }
}
