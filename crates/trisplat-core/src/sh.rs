//! Spherical-harmonic color evaluation.
//!
//! Mirrors the WGSL evaluator in `trisplat-render`; the 3D-GS basis ordering
//! and the `+0.5` DC offset are shared by both.

use glam::Vec3;

use crate::constants::{SH_C0, SH_C1, SH_C2, SH_C3};

/// Evaluate view-dependent RGB from SH coefficients.
///
/// `rest` holds `(degree + 1)^2 - 1` higher-order triples; `dir` is the unit
/// vector from the camera toward the shaded point, in world space. The result
/// carries the conventional `+0.5` offset and is clamped to be non-negative
/// per channel.
pub fn eval_sh(degree: u8, dc: [f32; 3], rest: &[[f32; 3]], dir: Vec3) -> Vec3 {
    let mut color = SH_C0 * Vec3::from(dc);

    if degree >= 1 {
        let (x, y, z) = (dir.x, dir.y, dir.z);
        color += SH_C1
            * (-y * Vec3::from(rest[0]) + z * Vec3::from(rest[1]) - x * Vec3::from(rest[2]));

        if degree >= 2 {
            let (xx, yy, zz) = (x * x, y * y, z * z);
            let (xy, yz, xz) = (x * y, y * z, x * z);
            color += SH_C2[0] * xy * Vec3::from(rest[3])
                + SH_C2[1] * yz * Vec3::from(rest[4])
                + SH_C2[2] * (2.0 * zz - xx - yy) * Vec3::from(rest[5])
                + SH_C2[3] * xz * Vec3::from(rest[6])
                + SH_C2[4] * (xx - yy) * Vec3::from(rest[7]);

            if degree >= 3 {
                color += SH_C3[0] * y * (3.0 * xx - yy) * Vec3::from(rest[8])
                    + SH_C3[1] * xy * z * Vec3::from(rest[9])
                    + SH_C3[2] * y * (4.0 * zz - xx - yy) * Vec3::from(rest[10])
                    + SH_C3[3] * z * (2.0 * zz - 3.0 * xx - 3.0 * yy) * Vec3::from(rest[11])
                    + SH_C3[4] * x * (4.0 * zz - xx - yy) * Vec3::from(rest[12])
                    + SH_C3[5] * z * (xx - yy) * Vec3::from(rest[13])
                    + SH_C3[6] * x * (xx - 3.0 * yy) * Vec3::from(rest[14]);
            }
        }
    }

    (color + 0.5).max(Vec3::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn degree_zero_is_view_independent() {
        let dc = [1.0, 0.5, 0.2];
        let a = eval_sh(0, dc, &[], Vec3::X);
        let b = eval_sh(0, dc, &[], Vec3::new(0.3, -0.8, 0.52).normalize());

        assert_relative_eq!(a.x, b.x, epsilon = 1e-6);
        assert_relative_eq!(a.x, SH_C0 * 1.0 + 0.5, epsilon = 1e-6);
        assert_relative_eq!(a.y, SH_C0 * 0.5 + 0.5, epsilon = 1e-6);
    }

    #[test]
    fn negative_channels_clamp_to_zero() {
        let color = eval_sh(0, [-10.0, 0.0, 0.0], &[], Vec3::Z);
        assert_eq!(color.x, 0.0);
        assert_relative_eq!(color.y, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn degree_one_z_lobe_flips_with_direction() {
        // Only the z-aligned degree-1 coefficient is set; the response must
        // be +C1 along +z and -C1 along -z on the red channel.
        let rest = [[0.0; 3], [1.0, 0.0, 0.0], [0.0; 3]];
        let up = eval_sh(1, [0.0; 3], &rest, Vec3::Z);
        let down = eval_sh(1, [0.0; 3], &rest, -Vec3::Z);

        assert_relative_eq!(up.x, 0.5 + SH_C1, epsilon = 1e-6);
        assert_relative_eq!(down.x, 0.5 - SH_C1, epsilon = 1e-6);
    }

    #[test]
    fn degree_one_sign_convention() {
        // The y and x lobes enter negated in the 3D-GS basis.
        let rest_y = [[1.0, 0.0, 0.0], [0.0; 3], [0.0; 3]];
        let along_y = eval_sh(1, [0.0; 3], &rest_y, Vec3::Y);
        assert_relative_eq!(along_y.x, 0.5 - SH_C1, epsilon = 1e-6);

        let rest_x = [[0.0; 3], [0.0; 3], [1.0, 0.0, 0.0]];
        let along_x = eval_sh(1, [0.0; 3], &rest_x, Vec3::X);
        assert_relative_eq!(along_x.x, 0.5 - SH_C1, epsilon = 1e-6);
    }

    #[test]
    fn degree_two_polar_lobe() {
        // rest[5] weights 2z^2 - x^2 - y^2, which is 2 at the poles.
        let mut rest = [[0.0; 3]; 8];
        rest[5] = [0.25, 0.0, 0.0];
        let polar = eval_sh(2, [0.0; 3], &rest, Vec3::Z);
        assert_relative_eq!(polar.x, 0.5 + SH_C2[2] * 2.0 * 0.25, epsilon = 1e-6);
    }

    #[test]
    fn degree_three_uses_all_fifteen_rest_terms() {
        // A full coefficient set evaluated off-axis must differ between two
        // directions; this guards against dropped terms.
        let rest: Vec<[f32; 3]> = (0..15).map(|i| [0.01 * i as f32, 0.0, 0.0]).collect();
        let a = eval_sh(3, [0.2; 3], &rest, Vec3::new(0.6, 0.48, 0.64).normalize());
        let b = eval_sh(3, [0.2; 3], &rest, Vec3::new(-0.6, 0.48, -0.64).normalize());
        assert!((a.x - b.x).abs() > 1e-4);
    }
}
