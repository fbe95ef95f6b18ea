//! Render-facing export of flip frames.

#[cfg(feature = "gpu")]
pub mod vertex;

#[cfg(feature = "gpu")]
pub use vertex::{FlipVertex, FrameVertices, VertexAttribute};
