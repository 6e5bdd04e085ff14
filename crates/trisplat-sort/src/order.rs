//! Back-to-front triangle ordering by bucketed counting sort.

use rayon::prelude::*;
use thiserror::Error;

use trisplat_core::constants::DEPTH_RANGE_EPS;

/// 16-bit depth buckets bound the sort at O(T + 65536) regardless of scene
/// size.
const NUM_BUCKETS: usize = 1 << 16;

/// Errors a sort job can report back to the driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    #[error("centroid buffer holds {actual} floats, expected {expected}")]
    CentroidCountMismatch { expected: usize, actual: usize },
}

/// Produce a back-to-front corner index array for one view.
///
/// `centers` holds `3 * num_triangles` floats; `view` is a 4x4 model-view
/// matrix in column-major order. Triangles are bucketed by camera-space
/// depth and emitted farthest first; ties keep their input order, so
/// identical inputs always produce identical permutations.
pub fn sort_by_depth(
    num_triangles: u32,
    centers: &[f32],
    view: &[f32; 16],
) -> Result<Vec<u32>, SortError> {
    let t = num_triangles as usize;
    if centers.len() != t * 3 {
        return Err(SortError::CentroidCountMismatch {
            expected: t * 3,
            actual: centers.len(),
        });
    }
    if t == 0 {
        return Ok(Vec::new());
    }

    // Camera-space z of every centroid: the view matrix's third row.
    let depths: Vec<f32> = centers
        .par_chunks_exact(3)
        .map(|c| view[2] * c[0] + view[6] * c[1] + view[10] * c[2] + view[14])
        .collect();

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &z in &depths {
        min = min.min(z);
        max = max.max(z);
    }

    let mut indices = Vec::with_capacity(t * 3);

    // A flat depth range carries no ordering information.
    if max - min <= DEPTH_RANGE_EPS {
        for i in 0..t as u32 {
            indices.extend_from_slice(&[i * 3, i * 3 + 1, i * 3 + 2]);
        }
        return Ok(indices);
    }

    let scale = 65535.0 / (max - min);
    let buckets: Vec<u16> = depths.iter().map(|&z| ((z - min) * scale) as u16).collect();

    let mut offsets = vec![0u32; NUM_BUCKETS];
    for &b in &buckets {
        offsets[b as usize] += 1;
    }
    let mut running = 0u32;
    for slot in offsets.iter_mut() {
        let count = *slot;
        *slot = running;
        running += count;
    }

    // Stable scatter: smallest bucket (farthest) first.
    let mut order = vec![0u32; t];
    for (triangle, &b) in buckets.iter().enumerate() {
        order[offsets[b as usize] as usize] = triangle as u32;
        offsets[b as usize] += 1;
    }

    for &triangle in &order {
        indices.extend_from_slice(&[triangle * 3, triangle * 3 + 1, triangle * 3 + 2]);
    }
    Ok(indices)
}
