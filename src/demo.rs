use glam::{Quat, Vec3};
use rand::prelude::*;
use rand::rngs::StdRng;

use trisplat_core::{ShCoefficients, TriangleScene};

/// Build a procedural cloud of triangle splats for trying out the renderer
/// without a dataset.
///
/// Splats are scattered in a ball of radius two with random orientation and
/// size; colors shade from the center outwards. With `sh_degree` set, the DC
/// term carries the base color and the higher orders get mild noise so the
/// view dependence is visible.
pub fn generate(num_triangles: usize, sh_degree: Option<u8>, sigma: f32) -> TriangleScene {
    let mut rng = StdRng::seed_from_u64(42);

    let mut vertices = Vec::with_capacity(num_triangles * 3);
    let mut triangle_indices = Vec::with_capacity(num_triangles * 3);
    let mut opacities = Vec::with_capacity(num_triangles * 3);
    let mut base_colors = Vec::with_capacity(num_triangles * 3);

    for i in 0..num_triangles {
        let center = Vec3::new(
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
        ) * 2.0;
        let axis = Vec3::new(
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
            rng.gen_range(-1.0f32..1.0),
        )
        .try_normalize()
        .unwrap_or(Vec3::Z);
        let orientation = Quat::from_axis_angle(axis, rng.gen_range(0.0..std::f32::consts::TAU));
        let size = rng.gen_range(0.02f32..0.08);

        let base = (i * 3) as u32;
        for corner in 0..3 {
            let angle = std::f32::consts::TAU * corner as f32 / 3.0;
            let local = Vec3::new(angle.cos(), angle.sin(), 0.0) * size;
            let position = center + orientation * local;
            vertices.push(position.to_array());
            triangle_indices.push(base + corner as u32);
            opacities.push(rng.gen_range(0.3f32..1.0));

            let tint = (center.length() / 3.5).clamp(0.0, 1.0);
            base_colors.push(Vec3::new(1.0 - tint, 0.4 + 0.3 * tint, tint));
        }
    }

    let mut scene = TriangleScene::new(vertices, triangle_indices, opacities);
    scene.sigma = sigma;

    match sh_degree {
        Some(degree) => {
            let rest_per_vertex = (degree as usize + 1).pow(2) - 1;
            let sh_c0 = trisplat_core::constants::SH_C0;
            let dc = base_colors
                .iter()
                .map(|color| ((*color - 0.5) / sh_c0).to_array())
                .collect();
            let rest = (0..scene.num_vertices() * rest_per_vertex)
                .map(|_| {
                    [
                        rng.gen_range(-0.1f32..0.1),
                        rng.gen_range(-0.1f32..0.1),
                        rng.gen_range(-0.1f32..0.1),
                    ]
                })
                .collect();
            scene.sh = Some(ShCoefficients { degree, dc, rest });
        }
        None => {
            scene.colors = Some(
                base_colors
                    .iter()
                    .map(|color| {
                        [
                            (color.x.clamp(0.0, 1.0) * 255.0) as u8,
                            (color.y.clamp(0.0, 1.0) * 255.0) as u8,
                            (color.z.clamp(0.0, 1.0) * 255.0) as u8,
                        ]
                    })
                    .collect(),
            );
        }
    }

    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_scene_validates() {
        let scene = generate(100, None, 1.0);
        assert!(scene.validate().is_ok());
        assert_eq!(scene.num_triangles(), 100);
        assert_eq!(scene.num_vertices(), 300);
    }

    #[test]
    fn sh_variant_validates_for_every_degree() {
        for degree in 0..=3 {
            let scene = generate(10, Some(degree), 1.0);
            assert!(scene.validate().is_ok(), "degree {degree}");
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(20, None, 1.0);
        let b = generate(20, None, 1.0);
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.opacities, b.opacities);
    }
}
