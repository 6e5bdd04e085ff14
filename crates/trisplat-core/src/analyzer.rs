//! CPU conformance mirror of the GPU culling pipeline.
//!
//! Runs sampled triangles through the same gate chain as the vertex stage
//! plus the fragment alpha test, and tallies where each one died. Produces
//! statistics only, never frames.

use glam::Vec2;

use crate::geometry::SplatGeometry;
use crate::raster::{self, CullStage, RasterParams};

/// Footprint radius histogram boundaries in pixels.
const RADIUS_BUCKET_EDGES: [f32; 4] = [0.5, 1.0, 100.0, 1600.0];

/// Per-gate tallies for one analysis pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CullReport {
    /// Triangles examined.
    pub sampled: u32,
    pub min_weight_filtered: u32,
    pub edge_on_filtered: u32,
    pub behind_camera_filtered: u32,
    pub perimeter_filtered: u32,
    pub size_filtered: u32,
    /// Survived every geometric gate but fell below the alpha cutoff at the
    /// incenter.
    pub alpha_filtered: u32,
    pub drawn: u32,
    /// Footprint radius distribution: <0.5, 0.5-1, 1-100, 100-1600, >1600.
    pub radius_buckets: [u32; 5],
}

impl CullReport {
    pub fn filtered(&self) -> u32 {
        self.min_weight_filtered
            + self.edge_on_filtered
            + self.behind_camera_filtered
            + self.perimeter_filtered
            + self.size_filtered
            + self.alpha_filtered
    }

    /// Share of sampled triangles that contribute nothing, in percent.
    pub fn filter_percentage(&self) -> f32 {
        if self.sampled == 0 {
            0.0
        } else {
            self.filtered() as f32 * 100.0 / self.sampled as f32
        }
    }

    fn bucket_radius(&mut self, radius: f32) {
        let bucket = RADIUS_BUCKET_EDGES
            .iter()
            .position(|&edge| radius < edge)
            .unwrap_or(RADIUS_BUCKET_EDGES.len());
        self.radius_buckets[bucket] += 1;
    }
}

/// Analyze every `stride`-th triangle of the geometry under one camera pose.
///
/// A `stride` of 1 examines the whole scene; larger strides trade accuracy
/// for time on heavy scenes.
pub fn analyze(geometry: &SplatGeometry, params: &RasterParams, stride: usize) -> CullReport {
    let stride = stride.max(1);
    let mut report = CullReport::default();

    for triangle in geometry.vertices.chunks_exact(3).step_by(stride) {
        report.sampled += 1;
        let record = &triangle[0];
        let world = [
            record.corner_a.into(),
            record.corner_b.into(),
            record.corner_c.into(),
        ];
        let m = record.opacity[3];

        match raster::prepare_triangle(world, m, params) {
            Err(rejection) => {
                if let Some(radius) = rejection.radius {
                    report.bucket_radius(radius);
                }
                match rejection.stage {
                    CullStage::MinOpacity => report.min_weight_filtered += 1,
                    CullStage::EdgeOn => report.edge_on_filtered += 1,
                    CullStage::BehindCamera => report.behind_camera_filtered += 1,
                    CullStage::Perimeter => report.perimeter_filtered += 1,
                    CullStage::Size => report.size_filtered += 1,
                }
            }
            Ok(prepared) => {
                report.bucket_radius(prepared.radius);
                let alpha = raster::soft_alpha(
                    prepared.incenter,
                    &prepared.edges,
                    prepared.m,
                    params.sigma,
                );
                if alpha.is_some() {
                    report.drawn += 1;
                } else {
                    report.alpha_filtered += 1;
                }
            }
        }
    }

    report
}

/// Convenience wrapper building the camera parameters from raw frame state.
pub fn frame_params(
    model_view: glam::Mat4,
    projection: glam::Mat4,
    resolution: (u32, u32),
    sigma: f32,
) -> RasterParams {
    RasterParams {
        model_view,
        projection,
        resolution: Vec2::new(resolution.0 as f32, resolution.1 as f32),
        sigma,
    }
}
