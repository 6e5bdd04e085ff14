//! GPU-compatible uniform layout and the vertex buffer description.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use trisplat_core::SplatVertex;

/// Per-frame shader uniforms.
///
/// Field order matches the WGSL `Uniforms` struct; the trailing scalars pack
/// into the 16-byte slot after `camera_pos`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SplatUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub sigma: f32,
    pub resolution: [f32; 2],
    pub sh_degree: u32,
    pub flags: u32,
}

impl SplatUniforms {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub const FLAG_USE_SH: u32 = 1;
    pub const FLAG_DEBUG: u32 = 2;

    pub fn new(
        model_view: Mat4,
        projection: Mat4,
        camera_pos: Vec3,
        resolution: [f32; 2],
        sigma: f32,
        sh_degree: u32,
        flags: u32,
    ) -> Self {
        Self {
            model_view: model_view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            sigma,
            resolution,
            sh_degree,
            flags,
        }
    }
}

/// Vertex buffer layout matching `SplatVertex`.
const SPLAT_VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 10] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Float32x3, // barycentric selector
    2 => Float32x3, // corner a
    3 => Float32x3, // corner b
    4 => Float32x3, // corner c
    5 => Float32x4, // opacities + minimum
    6 => Float32x3, // color a
    7 => Float32x3, // color b
    8 => Float32x3, // color c
    9 => Uint32x4,  // vertex ids
];

pub fn splat_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: SplatVertex::SIZE as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &SPLAT_VERTEX_ATTRIBUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_tightly_packed() {
        // Two mat4s, a vec3 + f32, a vec2 + two u32s: 160 bytes, a multiple
        // of the 16-byte uniform alignment.
        assert_eq!(SplatUniforms::SIZE, 160);
        assert_eq!(SplatUniforms::SIZE % 16, 0);
    }

    #[test]
    fn vertex_layout_covers_the_record() {
        let layout = splat_vertex_layout();
        assert_eq!(layout.array_stride, 128);
        assert_eq!(layout.attributes.len(), 10);

        let last = layout.attributes.last().unwrap();
        assert_eq!(last.offset, 112);
        assert_eq!(last.format, wgpu::VertexFormat::Uint32x4);
    }
}
