//! GPU resources for one splat scene.

use trisplat_core::{ShTable, SplatGeometry};
use wgpu::util::DeviceExt;

/// Immutable geometry plus the mutable index buffer the sorter rewrites.
pub struct SplatMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    pub sh_texture: wgpu::Texture,
    pub sh_view: wgpu::TextureView,
    pub sh_degree: Option<u32>,
}

impl SplatMesh {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, geometry: &SplatGeometry) -> Self {
        // Zero-length buffers are not bindable; an empty scene keeps one
        // zeroed record and draws nothing.
        let vertex_contents: &[u8] = if geometry.vertices.is_empty() {
            &[0u8; trisplat_core::SplatVertex::SIZE]
        } else {
            bytemuck::cast_slice(&geometry.vertices)
        };
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Splat Vertex Buffer"),
            contents: vertex_contents,
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_contents: &[u8] = if geometry.indices.is_empty() {
            &[0u8; 4]
        } else {
            bytemuck::cast_slice(&geometry.indices)
        };
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Splat Index Buffer"),
            contents: index_contents,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        });

        let (sh_texture, sh_view) = match &geometry.sh_table {
            Some(table) => upload_sh_table(device, queue, table),
            None => placeholder_sh_texture(device),
        };

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices.len() as u32,
            sh_texture,
            sh_view,
            sh_degree: geometry.sh_table.as_ref().map(|table| table.degree as u32),
        }
    }

    /// Install a freshly sorted permutation produced by the sort worker.
    pub fn install_indices(&self, queue: &wgpu::Queue, indices: &[u32]) {
        debug_assert_eq!(indices.len() as u32, self.num_indices);
        if !indices.is_empty() {
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(indices));
        }
    }
}

fn upload_sh_table(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    table: &ShTable,
) -> (wgpu::Texture, wgpu::TextureView) {
    let size = wgpu::Extent3d {
        width: table.width,
        height: table.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("SH Table"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&table.data),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(table.width * 16),
            rows_per_image: Some(table.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// A 1x1 stand-in so scenes without SH still satisfy the bind group layout.
fn placeholder_sh_texture(device: &wgpu::Device) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("SH Table (empty)"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
