//! Input scene model and validation.

use thiserror::Error;

/// Errors detected while validating a scene before geometry construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("{field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("triangle index count {0} is not a multiple of 3")]
    IndexCountNotTriples(usize),

    #[error("triangle {triangle} references vertex {index}, scene has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("spherical-harmonic degree {0} out of range (max 3)")]
    DegreeOutOfRange(u8),
}

/// Spherical-harmonic color coefficients, one slot per vertex.
#[derive(Clone, Debug)]
pub struct ShCoefficients {
    /// Active degree, 0 through 3.
    pub degree: u8,
    /// DC triple per vertex.
    pub dc: Vec<[f32; 3]>,
    /// Higher-order triples, `(degree + 1)^2 - 1` per vertex, flat in
    /// vertex order.
    pub rest: Vec<[f32; 3]>,
}

impl ShCoefficients {
    /// Number of higher-order coefficient triples per vertex.
    pub fn rest_per_vertex(&self) -> usize {
        (self.degree as usize + 1).pow(2) - 1
    }
}

/// An immutable triangle splat scene, as handed to the renderer.
///
/// Opacities are sigmoid-activated values in `[0, 1]`; raw pre-activation
/// weights never enter this structure.
#[derive(Clone, Debug)]
pub struct TriangleScene {
    /// Vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Flat corner indices, three per triangle.
    pub triangle_indices: Vec<u32>,
    /// Per-vertex opacity in `[0, 1]`.
    pub opacities: Vec<f32>,
    /// Direct per-vertex colors, used when no SH is present.
    pub colors: Option<Vec<[u8; 3]>>,
    /// View-dependent color coefficients, preferred over `colors`.
    pub sh: Option<ShCoefficients>,
    /// Edge softness exponent.
    pub sigma: f32,
}

impl TriangleScene {
    /// A scene with flat white splats and default softness.
    pub fn new(vertices: Vec<[f32; 3]>, triangle_indices: Vec<u32>, opacities: Vec<f32>) -> Self {
        Self {
            vertices,
            triangle_indices,
            opacities,
            colors: None,
            sh: None,
            sigma: 1.0,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangle_indices.len() / 3
    }

    /// Check every shape constraint. An empty scene is valid.
    pub fn validate(&self) -> Result<(), SceneError> {
        let v = self.vertices.len();

        if self.triangle_indices.len() % 3 != 0 {
            return Err(SceneError::IndexCountNotTriples(self.triangle_indices.len()));
        }

        if self.opacities.len() != v {
            return Err(SceneError::LengthMismatch {
                field: "opacities",
                expected: v,
                actual: self.opacities.len(),
            });
        }

        if let Some(colors) = &self.colors {
            if colors.len() != v {
                return Err(SceneError::LengthMismatch {
                    field: "colors",
                    expected: v,
                    actual: colors.len(),
                });
            }
        }

        if let Some(sh) = &self.sh {
            if sh.degree > 3 {
                return Err(SceneError::DegreeOutOfRange(sh.degree));
            }
            if sh.dc.len() != v {
                return Err(SceneError::LengthMismatch {
                    field: "sh.dc",
                    expected: v,
                    actual: sh.dc.len(),
                });
            }
            let expected_rest = v * sh.rest_per_vertex();
            if sh.rest.len() != expected_rest {
                return Err(SceneError::LengthMismatch {
                    field: "sh.rest",
                    expected: expected_rest,
                    actual: sh.rest.len(),
                });
            }
        }

        for (t, corners) in self.triangle_indices.chunks_exact(3).enumerate() {
            for &index in corners {
                if index as usize >= v {
                    return Err(SceneError::IndexOutOfRange {
                        triangle: t,
                        index,
                        vertex_count: v,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleScene {
        TriangleScene::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![0, 1, 2, 0, 2, 3],
            vec![0.5; 4],
        )
    }

    #[test]
    fn valid_scene_passes() {
        assert!(quad().validate().is_ok());
    }

    #[test]
    fn empty_scene_is_valid() {
        let scene = TriangleScene::new(Vec::new(), Vec::new(), Vec::new());
        assert!(scene.validate().is_ok());
        assert_eq!(scene.num_triangles(), 0);
    }

    #[test]
    fn odd_index_count_rejected() {
        let mut scene = quad();
        scene.triangle_indices.pop();
        assert_eq!(
            scene.validate(),
            Err(SceneError::IndexCountNotTriples(5))
        );
    }

    #[test]
    fn opacity_length_mismatch_rejected() {
        let mut scene = quad();
        scene.opacities.pop();
        assert!(matches!(
            scene.validate(),
            Err(SceneError::LengthMismatch { field: "opacities", .. })
        ));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut scene = quad();
        scene.triangle_indices[4] = 7;
        assert_eq!(
            scene.validate(),
            Err(SceneError::IndexOutOfRange {
                triangle: 1,
                index: 7,
                vertex_count: 4,
            })
        );
    }

    #[test]
    fn sh_shape_checked() {
        let mut scene = quad();
        scene.sh = Some(ShCoefficients {
            degree: 1,
            dc: vec![[0.0; 3]; 4],
            rest: vec![[0.0; 3]; 4 * 3 - 1],
        });
        assert!(matches!(
            scene.validate(),
            Err(SceneError::LengthMismatch { field: "sh.rest", .. })
        ));

        scene.sh = Some(ShCoefficients {
            degree: 4,
            dc: vec![[0.0; 3]; 4],
            rest: Vec::new(),
        });
        assert_eq!(scene.validate(), Err(SceneError::DegreeOutOfRange(4)));
    }
}
