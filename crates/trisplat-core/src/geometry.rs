//! Unrolls an indexed triangle scene into GPU-ready splat geometry.
//!
//! Each triangle becomes three corner records that duplicate every
//! triangle-wide attribute, so the vertex stage never has to chase indices
//! across the primitive. Spherical harmonics stay per original vertex in a
//! packed side table to avoid tripling their memory.

use bytemuck::{Pod, Zeroable};

use crate::scene::{SceneError, TriangleScene};

/// Width in texels of the packed SH lookup table.
pub const SH_TABLE_WIDTH: u32 = 1024;

/// RGBA texels per vertex slot: 16 coefficient triples = 48 scalars.
pub const SH_TEXELS_PER_VERTEX: u32 = 12;

/// One corner record of the unrolled geometry buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SplatVertex {
    /// This corner's position.
    pub position: [f32; 3],
    /// Corner selector: (1,0,0), (0,1,0) or (0,0,1).
    pub barycentric: [f32; 3],
    /// The triangle's three corner positions, duplicated per record.
    pub corner_a: [f32; 3],
    pub corner_b: [f32; 3],
    pub corner_c: [f32; 3],
    /// w0, w1, w2 and their minimum m.
    pub opacity: [f32; 4],
    /// Direct RGB per corner, in [0, 1]; all ones when colors are absent.
    pub color_a: [f32; 3],
    pub color_b: [f32; 3],
    pub color_c: [f32; 3],
    /// Originating vertex ids: this corner's own, then all three corners'.
    pub vertex_ids: [u32; 4],
}

impl SplatVertex {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// SH coefficients packed for a fixed-width float table.
///
/// Vertex `i` occupies texels `i*12 .. i*12+12` in row-major order; each
/// texel holds four consecutive scalars of the 48-scalar slot (16 RGB
/// triples, DC first, then the rest coefficients in basis order; unused
/// trailing coefficients are zero).
#[derive(Clone, Debug)]
pub struct ShTable {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` scalars.
    pub data: Vec<f32>,
    pub degree: u8,
}

/// Everything the renderer uploads for one scene.
#[derive(Clone, Debug)]
pub struct SplatGeometry {
    /// `3T` corner records.
    pub vertices: Vec<SplatVertex>,
    /// `3T` corner indices; identity permutation at build time.
    pub indices: Vec<u32>,
    /// `3T` scalars, one centroid per triangle.
    pub centroids: Vec<f32>,
    pub sh_table: Option<ShTable>,
    pub sigma: f32,
}

impl SplatGeometry {
    /// Validate the scene and unroll it. Fails without partial state.
    pub fn build(scene: &TriangleScene) -> Result<Self, SceneError> {
        scene.validate()?;

        let num_triangles = scene.num_triangles();
        let mut vertices = Vec::with_capacity(num_triangles * 3);
        let mut centroids = Vec::with_capacity(num_triangles * 3);

        const SELECTORS: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

        for corners in scene.triangle_indices.chunks_exact(3) {
            let ids = [corners[0], corners[1], corners[2]];
            let p = [
                scene.vertices[ids[0] as usize],
                scene.vertices[ids[1] as usize],
                scene.vertices[ids[2] as usize],
            ];
            let w = [
                scene.opacities[ids[0] as usize],
                scene.opacities[ids[1] as usize],
                scene.opacities[ids[2] as usize],
            ];
            let m = w[0].min(w[1]).min(w[2]);

            let color = match &scene.colors {
                Some(colors) => [
                    unpack_rgb(colors[ids[0] as usize]),
                    unpack_rgb(colors[ids[1] as usize]),
                    unpack_rgb(colors[ids[2] as usize]),
                ],
                None => [[1.0; 3]; 3],
            };

            for corner in 0..3 {
                vertices.push(SplatVertex {
                    position: p[corner],
                    barycentric: SELECTORS[corner],
                    corner_a: p[0],
                    corner_b: p[1],
                    corner_c: p[2],
                    opacity: [w[0], w[1], w[2], m],
                    color_a: color[0],
                    color_b: color[1],
                    color_c: color[2],
                    vertex_ids: [ids[corner], ids[0], ids[1], ids[2]],
                });
            }

            for axis in 0..3 {
                centroids.push((p[0][axis] + p[1][axis] + p[2][axis]) / 3.0);
            }
        }

        let indices = (0..vertices.len() as u32).collect();
        let sh_table = scene.sh.as_ref().map(|sh| {
            let mut table = ShTable::sized_for(scene.num_vertices(), sh.degree);
            let rest_per_vertex = sh.rest_per_vertex();
            for v in 0..scene.num_vertices() {
                let base = v * SH_TEXELS_PER_VERTEX as usize * 4;
                table.data[base..base + 3].copy_from_slice(&sh.dc[v]);
                for (k, triple) in sh.rest[v * rest_per_vertex..(v + 1) * rest_per_vertex]
                    .iter()
                    .enumerate()
                {
                    let at = base + 3 * (k + 1);
                    table.data[at..at + 3].copy_from_slice(triple);
                }
            }
            table
        });

        Ok(Self {
            vertices,
            indices,
            centroids,
            sh_table,
            sigma: scene.sigma,
        })
    }

    pub fn num_triangles(&self) -> u32 {
        (self.vertices.len() / 3) as u32
    }
}

impl ShTable {
    fn sized_for(num_vertices: usize, degree: u8) -> Self {
        let texels = num_vertices as u32 * SH_TEXELS_PER_VERTEX;
        let height = texels.div_ceil(SH_TABLE_WIDTH).max(1);
        Self {
            width: SH_TABLE_WIDTH,
            height,
            data: vec![0.0; (SH_TABLE_WIDTH * height * 4) as usize],
            degree,
        }
    }

    /// Fetch the 48-scalar slot of one vertex (test and analyzer path).
    pub fn slot(&self, vertex: usize) -> &[f32] {
        let base = vertex * SH_TEXELS_PER_VERTEX as usize * 4;
        &self.data[base..base + 48]
    }
}

fn unpack_rgb(rgb: [u8; 3]) -> [f32; 3] {
    [
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    ]
}
