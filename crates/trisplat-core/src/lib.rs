//! Scene model and CPU-side math for the triangle splat renderer.
//!
//! A splat scene is a set of tiny screen-space triangles with per-vertex
//! opacity and view-dependent color. This crate owns everything that runs
//! on the CPU: input validation, spherical-harmonic evaluation, unrolling
//! indexed triangles into GPU-ready corner records, and the conformance
//! mirror of the GPU culling chain.

pub mod analyzer;
pub mod constants;
pub mod geometry;
pub mod raster;
pub mod scene;
pub mod sh;

pub use analyzer::{analyze, CullReport};
pub use geometry::{ShTable, SplatGeometry, SplatVertex, SH_TABLE_WIDTH, SH_TEXELS_PER_VERTEX};
pub use raster::RasterParams;
pub use scene::{SceneError, ShCoefficients, TriangleScene};
pub use sh::eval_sh;
