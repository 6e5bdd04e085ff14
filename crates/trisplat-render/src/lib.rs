//! wgpu forward rendering for triangle splat scenes.
//!
//! The geometry built by `trisplat-core` is uploaded once; every frame the
//! driver refreshes uniforms, keeps the index buffer depth-sorted through
//! `trisplat-sort`, and records a single alpha-blended indexed draw.

pub mod driver;
pub mod gpu_types;
pub mod mesh;
pub mod pipeline;

pub use driver::{FrameInput, SplatRenderer};
pub use gpu_types::SplatUniforms;
pub use mesh::SplatMesh;
pub use pipeline::SplatPipeline;
