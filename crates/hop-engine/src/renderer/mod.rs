pub mod camera;
pub mod instance;
pub mod traits;

// Re-export key types for convenient access
pub use camera::{Camera, CameraUniform};
pub use instance::{LayerBatch, RenderBuffer, RenderInstance};
pub use traits::{FrameData, HeadlessRenderer, Renderer};
