use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use trisplat_core::{ShCoefficients, TriangleScene};

#[derive(Deserialize)]
struct SceneMeta {
    vertex_count: u32,
    triangle_count: u32,
    #[serde(default)]
    sh_degree: Option<u8>,
    #[serde(default)]
    has_colors: bool,
    #[serde(default = "default_sigma")]
    sigma: f32,
}

fn default_sigma() -> f32 {
    1.0
}

/// Load a splat scene from a `<base>.json` + `<base>.bin` pair.
///
/// The binary file holds little-endian buffers back to back: positions,
/// triangle indices, opacities, then optional colors and SH coefficients,
/// with counts taken from the JSON metadata.
pub fn load_scene(base: &Path) -> Result<TriangleScene> {
    let json_path = base.with_extension("json");
    let file = File::open(&json_path)
        .with_context(|| format!("Failed to open scene metadata {json_path:?}"))?;
    let meta: SceneMeta = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse scene metadata {json_path:?}"))?;

    if let Some(degree) = meta.sh_degree {
        ensure!(degree <= 3, "sh_degree {degree} out of range (max 3)");
    }

    let bin_path = base.with_extension("bin");
    let file = File::open(&bin_path)
        .with_context(|| format!("Failed to open scene buffers {bin_path:?}"))?;
    let mut reader = BufReader::new(file);

    let v = meta.vertex_count as usize;
    let t = meta.triangle_count as usize;

    let vertices: Vec<[f32; 3]> = read_f32_triples(&mut reader, v).context("positions")?;
    let triangle_indices: Vec<u32> = read_u32s(&mut reader, t * 3).context("triangle indices")?;
    let opacities: Vec<f32> = read_f32s(&mut reader, v).context("opacities")?;

    let colors = if meta.has_colors {
        let mut raw = vec![0u8; v * 3];
        reader.read_exact(&mut raw).context("colors")?;
        Some(raw.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
    } else {
        None
    };

    let sh = match meta.sh_degree {
        Some(degree) => {
            let rest_per_vertex = (degree as usize + 1).pow(2) - 1;
            Some(ShCoefficients {
                degree,
                dc: read_f32_triples(&mut reader, v).context("sh dc")?,
                rest: read_f32_triples(&mut reader, v * rest_per_vertex).context("sh rest")?,
            })
        }
        None => None,
    };

    let mut trailing = [0u8; 1];
    ensure!(
        reader.read(&mut trailing).context("trailing check")? == 0,
        "scene buffers {bin_path:?} are longer than the metadata describes"
    );

    let mut scene = TriangleScene::new(vertices, triangle_indices, opacities);
    scene.colors = colors;
    scene.sh = sh;
    scene.sigma = meta.sigma;

    scene
        .validate()
        .with_context(|| format!("scene {base:?} failed validation"))?;
    Ok(scene)
}

fn read_f32s(reader: &mut impl Read, count: usize) -> Result<Vec<f32>> {
    let mut values = vec![0.0f32; count];
    reader.read_exact(bytemuck::cast_slice_mut(&mut values))?;

    // Buffers are written little-endian.
    if cfg!(target_endian = "big") {
        for value in &mut values {
            *value = f32::from_bits(u32::from_le(value.to_bits()));
        }
    }
    Ok(values)
}

fn read_f32_triples(reader: &mut impl Read, count: usize) -> Result<Vec<[f32; 3]>> {
    let flat = read_f32s(reader, count * 3)?;
    Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn read_u32s(reader: &mut impl Read, count: usize) -> Result<Vec<u32>> {
    let mut values = vec![0u32; count];
    reader.read_exact(bytemuck::cast_slice_mut(&mut values))?;

    if cfg!(target_endian = "big") {
        for value in &mut values {
            *value = u32::from_le(*value);
        }
    }
    Ok(values)
}
