//! Contract for drawing backends.
//!
//! The simulation never produces pixels. Each frame it hands a backend the
//! culled draw list, one batch per non-empty layer in paint order.

use super::camera::CameraUniform;
use super::instance::{LayerBatch, RenderInstance};
use crate::core::math::Aabb;

/// Everything a backend needs to draw one frame.
pub struct FrameData<'a> {
    /// Instances sorted by layer, then z-index within the layer.
    pub instances: &'a [RenderInstance],
    /// One entry per non-empty layer, back to front.
    pub batches: &'a [LayerBatch],
    /// World-space rectangle the camera sees, shake included.
    pub view: Aabb,
    /// Clear color.
    pub background: [f32; 4],
    pub projection: CameraUniform,
}

/// Drawing backend.
///
/// ```ignore
/// struct CanvasRenderer { /* ... */ }
///
/// impl Renderer for CanvasRenderer {
///     fn backend(&self) -> &'static str { "canvas2d" }
///
///     fn draw_frame(&mut self, frame: &FrameData<'_>) {
///         for batch in frame.batches {
///             // Draw frame.instances[batch.start..batch.end]...
///         }
///     }
/// }
/// ```
pub trait Renderer {
    /// Backend identifier (e.g. "canvas2d", "webgpu", "headless").
    fn backend(&self) -> &'static str;

    fn draw_frame(&mut self, frame: &FrameData<'_>);

    /// Output surface changed size.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Renderer that draws nothing and remembers the last frame's shape.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub last_instances: usize,
    pub last_batches: Vec<LayerBatch>,
}

impl Renderer for HeadlessRenderer {
    fn backend(&self) -> &'static str {
        "headless"
    }

    fn draw_frame(&mut self, frame: &FrameData<'_>) {
        self.frames += 1;
        self.last_instances = frame.instances.len();
        self.last_batches = frame.batches.to_vec();
    }
}
