//! Per-frame orchestration: uniforms, sort throttling, result installation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use glam::{Mat4, Vec3};

use trisplat_core::constants::SORT_THROTTLE_MS;
use trisplat_core::SplatGeometry;
use trisplat_sort::{SortRequest, SortWorker};

use crate::gpu_types::SplatUniforms;
use crate::mesh::SplatMesh;
use crate::pipeline::SplatPipeline;

/// Camera state for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    pub camera_pos: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    /// Drawing-buffer size in pixels.
    pub resolution: [u32; 2],
}

/// Owns one scene's GPU state and keeps its draw order fresh.
///
/// Depth sorting runs on the worker thread at most once per
/// `SORT_THROTTLE_MS` and only while the camera moves; the render loop never
/// waits for it. A stale or failed sort leaves the last installed
/// permutation in place, so a frame always completes.
pub struct SplatRenderer {
    pipeline: SplatPipeline,
    mesh: SplatMesh,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    sorter: SortWorker,
    centroids: Arc<[f32]>,
    num_triangles: u32,

    sigma: f32,
    debug: bool,

    prev_view: Option<Mat4>,
    last_sort: Option<Instant>,
    sort_in_flight: bool,
    request_id: u32,
}

impl SplatRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        geometry: &SplatGeometry,
    ) -> Result<Self> {
        let pipeline = SplatPipeline::new(device, surface_format);
        let mesh = SplatMesh::new(device, queue, geometry);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Splat Uniform Buffer"),
            size: SplatUniforms::SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Splat Bind Group"),
            layout: &pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&mesh.sh_view),
                },
            ],
        });

        let sorter = SortWorker::spawn()?;
        let num_triangles = geometry.num_triangles();

        tracing::info!(
            triangles = num_triangles,
            sh = mesh.sh_degree.is_some(),
            "splat renderer ready"
        );

        Ok(Self {
            pipeline,
            mesh,
            uniform_buffer,
            bind_group,
            sorter,
            centroids: Arc::from(geometry.centroids.as_slice()),
            num_triangles,
            sigma: geometry.sigma,
            debug: false,
            prev_view: None,
            last_sort: None,
            sort_in_flight: false,
            request_id: 0,
        })
    }

    /// Edge softness exponent; takes effect next frame.
    pub fn set_sigma(&mut self, sigma: f32) {
        self.sigma = sigma;
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// Toggle the barycentric debug view.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn num_triangles(&self) -> u32 {
        self.num_triangles
    }

    /// Install finished sorts, refresh uniforms, and maybe kick off a new
    /// sort. Call once per frame before encoding the draw.
    pub fn prepare(&mut self, queue: &wgpu::Queue, frame: &FrameInput) {
        self.collect_sorts(queue);

        let mut flags = 0;
        if self.mesh.sh_degree.is_some() {
            flags |= SplatUniforms::FLAG_USE_SH;
        }
        if self.debug {
            flags |= SplatUniforms::FLAG_DEBUG;
        }
        let uniforms = SplatUniforms::new(
            frame.view,
            frame.projection,
            frame.camera_pos,
            [frame.resolution[0] as f32, frame.resolution[1] as f32],
            self.sigma,
            self.mesh.sh_degree.unwrap_or(0),
            flags,
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.maybe_request_sort(frame.view);
    }

    fn collect_sorts(&mut self, queue: &wgpu::Queue) {
        while let Some(response) = self.sorter.try_result() {
            self.sort_in_flight = false;
            if response.request_id != self.request_id {
                tracing::debug!(
                    id = response.request_id,
                    current = self.request_id,
                    "dropping superseded sort result"
                );
                continue;
            }
            match response.result {
                Ok(indices) => {
                    self.mesh.install_indices(queue, &indices);
                    self.last_sort = Some(Instant::now());
                }
                Err(error) => {
                    tracing::warn!(%error, "depth sort failed; keeping previous order");
                }
            }
        }
    }

    fn maybe_request_sort(&mut self, view: Mat4) {
        if self.num_triangles == 0 || self.sort_in_flight {
            return;
        }
        if self.prev_view == Some(view) {
            return;
        }
        let throttled = self
            .last_sort
            .is_some_and(|at| at.elapsed() < Duration::from_millis(SORT_THROTTLE_MS));
        if throttled {
            return;
        }

        self.request_id = self.request_id.wrapping_add(1);
        self.prev_view = Some(view);
        let request = SortRequest {
            num_triangles: self.num_triangles,
            centers: Arc::clone(&self.centroids),
            view_matrix: view.to_cols_array(),
            request_id: self.request_id,
        };
        if self.sorter.submit(request) {
            self.sort_in_flight = true;
        } else {
            tracing::warn!("sorter thread is gone; draw order frozen");
        }
    }

    /// Record the splat draw into an open render pass.
    pub fn draw<'pass>(&'pass self, pass: &mut wgpu::RenderPass<'pass>) {
        if self.mesh.num_indices == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.mesh.num_indices, 0, 0..1);
    }
}
