//! Screen-space rasterization math.
//!
//! These kernels are the CPU twin of the WGSL vertex/fragment stages in
//! `trisplat-render`; the diagnostic analyzer runs the same chain over
//! sampled triangles, so any change here must be mirrored in the shader.

use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::constants::{
    ALPHA_THRESHOLD, BACKFACE_THRESHOLD, DEGENERATE_EPS, DISTANCE_MAX, DISTANCE_MIN,
    PERIMETER_THRESHOLD, SAFE_DIST_EPS, STOPPING_INFLUENCE,
};

/// Gate at which the cull chain rejected a triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CullStage {
    MinOpacity,
    EdgeOn,
    BehindCamera,
    Perimeter,
    Size,
}

/// A rejection, carrying the footprint radius when the chain got that far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CullRejection {
    pub stage: CullStage,
    pub radius: Option<f32>,
}

impl CullRejection {
    fn at(stage: CullStage) -> Self {
        Self {
            stage,
            radius: None,
        }
    }
}

/// Camera state shared by every triangle of one pass.
#[derive(Clone, Copy, Debug)]
pub struct RasterParams {
    pub model_view: Mat4,
    pub projection: Mat4,
    /// Drawing-buffer size in pixels.
    pub resolution: Vec2,
    pub sigma: f32,
}

/// Shrunken half-plane set of one triangle footprint.
#[derive(Clone, Copy, Debug)]
pub struct ShrunkEdges {
    pub normals: [Vec2; 3],
    /// Offsets after the sigma-controlled shrink.
    pub offsets: [f32; 3],
    /// Negative reciprocal of the clamped incenter-to-edge distance.
    pub phi_scale: f32,
}

/// A triangle that survived the cull chain, ready for per-pixel evaluation.
#[derive(Clone, Copy, Debug)]
pub struct PreparedTriangle {
    pub pixels: [Vec2; 3],
    pub incenter: Vec2,
    pub radius: f32,
    pub edges: ShrunkEdges,
    /// Minimum corner opacity.
    pub m: f32,
}

/// NDC to pixel coordinates with the reference half-pixel shift.
#[inline]
pub fn ndc_to_pix(ndc: f32, size: f32) -> f32 {
    ((ndc + 1.0) * size - 1.0) * 0.5
}

/// Incenter and perimeter of a pixel-space triangle.
///
/// The incenter weights each corner by the length of the opposite side,
/// guaranteeing an interior reference point for the shrink.
pub fn incenter_of(p: [Vec2; 3]) -> (Vec2, f32) {
    let a = (p[1] - p[2]).length();
    let b = (p[2] - p[0]).length();
    let c = (p[0] - p[1]).length();
    let perimeter = a + b + c;
    ((a * p[0] + b * p[1] + c * p[2]) / perimeter, perimeter)
}

/// Screen-space barycentric coordinates of `p`; degenerate triangles
/// collapse to equal weights.
pub fn barycentric(p: Vec2, tri: [Vec2; 3]) -> Vec3 {
    let v0 = tri[1] - tri[0];
    let v1 = tri[2] - tri[0];
    let v2 = p - tri[0];

    let denom = v0.x * v1.y - v1.x * v0.y;
    if denom.abs() < DEGENERATE_EPS {
        return Vec3::splat(1.0 / 3.0);
    }

    let inv = 1.0 / denom;
    let b1 = (v2.x * v1.y - v1.x * v2.y) * inv;
    let b2 = (v0.x * v2.y - v2.x * v0.y) * inv;
    Vec3::new(1.0 - b1 - b2, b1, b2)
}

/// Build the shrunken edge set for a footprint.
///
/// Each edge half-plane is oriented so the incenter lies on the non-positive
/// side, then pushed inward by `s = d0 * (0.01 / m)^(1/sigma)`, which places
/// the alpha-zero boundary where the splat's contribution falls below its
/// stopping influence.
pub fn shrink_edges(pixels: [Vec2; 3], incenter: Vec2, m: f32, sigma: f32) -> ShrunkEdges {
    let mut normals = [Vec2::ZERO; 3];
    let mut offsets = [0.0f32; 3];
    let mut shrink = 0.0;
    let mut d_last = 0.0;

    for k in 0..3 {
        let pa = pixels[k];
        let pb = pixels[(k + 1) % 3];
        let e = pb - pa;
        let mut n = Vec2::new(e.y, -e.x).normalize();
        let mut o = -n.dot(pa);
        let mut d = n.dot(incenter) + o;
        if d > 0.0 {
            n = -n;
            o = -o;
            d = -d;
        }
        if k == 0 {
            shrink = d * (STOPPING_INFLUENCE / m).powf(1.0 / sigma);
        }
        d_last = d;
        normals[k] = n;
        offsets[k] = o - shrink;
    }

    ShrunkEdges {
        normals,
        offsets,
        phi_scale: 1.0 / d_last.min(-SAFE_DIST_EPS),
    }
}

/// Soft alpha at pixel `p`, or `None` where the fragment is discarded.
pub fn soft_alpha(p: Vec2, edges: &ShrunkEdges, m: f32, sigma: f32) -> Option<f32> {
    let mut max_d = f32::NEG_INFINITY;
    for k in 0..3 {
        let d = edges.normals[k].dot(p) + edges.offsets[k];
        if d > 0.0 {
            return None;
        }
        max_d = max_d.max(d);
    }

    let cx = (max_d * edges.phi_scale).max(0.0).powf(sigma);
    let alpha = (m * cx).min(0.99);
    if alpha >= ALPHA_THRESHOLD {
        Some(alpha)
    } else {
        None
    }
}

/// Run one triangle through the full cull chain.
///
/// Mirrors the vertex stage exactly: min-opacity gate, edge-on rejection,
/// behind-camera rejection, pixel projection, perimeter gate, incenter and
/// footprint-size gates, then the edge shrink.
pub fn prepare_triangle(
    world: [Vec3; 3],
    m: f32,
    params: &RasterParams,
) -> Result<PreparedTriangle, CullRejection> {
    if m < STOPPING_INFLUENCE {
        return Err(CullRejection::at(CullStage::MinOpacity));
    }

    // Edge-on test against the normalized view-space normal; a zero-length
    // normal (collapsed triangle) counts as edge-on.
    let normal = (world[1] - world[0]).cross(world[2] - world[0]);
    let view_normal = Mat3::from_mat4(params.model_view) * normal;
    let centroid = (world[0] + world[1] + world[2]) / 3.0;
    let centroid_view = params.model_view.transform_point3(centroid);
    let n_len = view_normal.length();
    let v_len = centroid_view.length();
    if n_len < f32::MIN_POSITIVE || v_len < f32::MIN_POSITIVE {
        return Err(CullRejection::at(CullStage::EdgeOn));
    }
    let mut cos = (view_normal / n_len).dot(-centroid_view / v_len);
    if cos > 0.0 {
        cos = -cos;
    }
    if cos.abs() < BACKFACE_THRESHOLD {
        return Err(CullRejection::at(CullStage::EdgeOn));
    }

    let mvp = params.projection * params.model_view;
    let clip = world.map(|corner| mvp * corner.extend(1.0));
    if clip.iter().all(|c| c.w <= 0.0) {
        return Err(CullRejection::at(CullStage::BehindCamera));
    }

    let pixels = clip.map(|c| {
        Vec2::new(
            ndc_to_pix(c.x / c.w, params.resolution.x),
            ndc_to_pix(c.y / c.w, params.resolution.y),
        )
    });

    let (incenter, perimeter) = incenter_of(pixels);
    if perimeter < PERIMETER_THRESHOLD {
        return Err(CullRejection::at(CullStage::Perimeter));
    }

    let radius = pixels
        .iter()
        .map(|p| (*p - incenter).length())
        .fold(0.0f32, f32::max);
    if radius > DISTANCE_MAX || radius < DISTANCE_MIN {
        return Err(CullRejection {
            stage: CullStage::Size,
            radius: Some(radius),
        });
    }

    let edges = shrink_edges(pixels, incenter, m, params.sigma);

    Ok(PreparedTriangle {
        pixels,
        incenter,
        radius,
        edges,
        m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight_on_params(resolution: Vec2) -> RasterParams {
        // Identity view and projection: world xy land on NDC directly and
        // triangles in a z < 0 plane face the camera at the origin.
        RasterParams {
            model_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            resolution,
            sigma: 1.0,
        }
    }

    /// Equilateral triangle around `center` with max corner distance `r`,
    /// lying in the z = -5 plane.
    fn equilateral(center: Vec2, r: f32) -> [Vec3; 3] {
        let mut corners = [Vec3::ZERO; 3];
        for (k, corner) in corners.iter_mut().enumerate() {
            let angle = std::f32::consts::TAU * k as f32 / 3.0;
            *corner = Vec3::new(
                center.x + r * angle.cos(),
                center.y + r * angle.sin(),
                -5.0,
            );
        }
        corners
    }

    #[test]
    fn pixel_formula_matches_reference() {
        for (ndc, expected) in [(-1.0, -0.5), (0.0, 959.5), (1.0, 1919.5)] {
            assert_relative_eq!(ndc_to_pix(ndc, 1920.0), expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn incenter_of_equilateral_equals_centroid() {
        let p = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(1.0, 3.0f32.sqrt()),
        ];
        let (incenter, _) = incenter_of(p);
        let centroid = (p[0] + p[1] + p[2]) / 3.0;
        assert_relative_eq!(incenter.x, centroid.x, epsilon = 1e-5);
        assert_relative_eq!(incenter.y, centroid.y, epsilon = 1e-5);
    }

    #[test]
    fn incenter_of_right_triangle() {
        let p = [Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, 4.0)];
        let (incenter, perimeter) = incenter_of(p);
        assert_relative_eq!(perimeter, 12.0, epsilon = 1e-5);
        assert_relative_eq!(incenter.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(incenter.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn barycentric_at_corners_and_center() {
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0)];
        let at_b = barycentric(tri[1], tri);
        assert_relative_eq!(at_b.y, 1.0, epsilon = 1e-5);

        let center = (tri[0] + tri[1] + tri[2]) / 3.0;
        let at_center = barycentric(center, tri);
        for weight in [at_center.x, at_center.y, at_center.z] {
            assert_relative_eq!(weight, 1.0 / 3.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn degenerate_barycentric_collapses_to_thirds() {
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
        let b = barycentric(Vec2::new(0.5, 0.5), tri);
        assert_eq!(b, Vec3::splat(1.0 / 3.0));
    }

    #[test]
    fn min_opacity_gate() {
        let params = straight_on_params(Vec2::new(800.0, 600.0));
        let tri = equilateral(Vec2::ZERO, 0.1);
        let rejection = prepare_triangle(tri, 0.009, &params).unwrap_err();
        assert_eq!(rejection.stage, CullStage::MinOpacity);

        assert!(prepare_triangle(tri, 0.011, &params).is_ok());
    }

    #[test]
    fn edge_on_threshold() {
        // Triangle at distance 5 whose plane is tilted so the normal makes
        // a known cosine with the view direction.
        let params = straight_on_params(Vec2::new(800.0, 600.0));
        let build = |cos: f32| {
            let n = Vec3::new((1.0 - cos * cos).sqrt(), 0.0, cos);
            let t1 = n.cross(Vec3::Y).normalize();
            let t2 = n.cross(t1);
            let c = Vec3::new(0.0, 0.0, -5.0);
            [c, c + 0.1 * t1, c + 0.1 * t2]
        };

        let grazing = prepare_triangle(build(0.0009), 1.0, &params).unwrap_err();
        assert_eq!(grazing.stage, CullStage::EdgeOn);

        assert!(prepare_triangle(build(0.0011), 1.0, &params).is_ok());
    }

    #[test]
    fn fully_behind_camera_rejected() {
        // A perspective projection makes clip w proportional to -z; all
        // corners behind the camera leave every w negative.
        let params = RasterParams {
            model_view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
            resolution: Vec2::new(800.0, 600.0),
            sigma: 1.0,
        };
        let tri = [
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(1.0, 0.0, 5.0),
            Vec3::new(0.0, 1.0, 5.0),
        ];
        let rejection = prepare_triangle(tri, 1.0, &params).unwrap_err();
        assert_eq!(rejection.stage, CullStage::BehindCamera);
    }

    #[test]
    fn perimeter_gate() {
        // Resolution 2x2 keeps pixel coordinates equal to world xy plus a
        // constant, so footprint sizes can be dialed in directly.
        let params = straight_on_params(Vec2::new(2.0, 2.0));
        let tiny = equilateral(Vec2::ZERO, 0.05);
        let rejection = prepare_triangle(tiny, 1.0, &params).unwrap_err();
        assert_eq!(rejection.stage, CullStage::Perimeter);
    }

    #[test]
    fn footprint_size_gates() {
        let params = straight_on_params(Vec2::new(2.0, 2.0));

        let small = prepare_triangle(equilateral(Vec2::ZERO, 0.995), 1.0, &params).unwrap_err();
        assert_eq!(small.stage, CullStage::Size);
        assert!(small.radius.unwrap() < DISTANCE_MIN);

        let fits = prepare_triangle(equilateral(Vec2::ZERO, 1.005), 1.0, &params).unwrap();
        assert!(fits.radius >= DISTANCE_MIN);

        let large = prepare_triangle(equilateral(Vec2::ZERO, 1601.0), 1.0, &params).unwrap_err();
        assert_eq!(large.stage, CullStage::Size);
        assert!(large.radius.unwrap() > DISTANCE_MAX);

        assert!(prepare_triangle(equilateral(Vec2::ZERO, 1599.0), 1.0, &params).is_ok());
    }

    #[test]
    fn shrunken_edges_keep_incenter_inside() {
        let params = straight_on_params(Vec2::new(2.0, 2.0));
        let prepared = prepare_triangle(equilateral(Vec2::ZERO, 100.0), 0.8, &params).unwrap();

        for k in 0..3 {
            let d = prepared.edges.normals[k].dot(prepared.incenter) + prepared.edges.offsets[k];
            assert!(d <= 0.0, "incenter outside shrunken edge {k}: {d}");
        }
        assert!(prepared.edges.phi_scale < 0.0);
    }

    #[test]
    fn alpha_peaks_inside_and_dies_at_the_shrunken_edge() {
        let params = straight_on_params(Vec2::new(2.0, 2.0));
        let prepared = prepare_triangle(equilateral(Vec2::ZERO, 200.0), 0.9, &params).unwrap();

        let at_center = soft_alpha(prepared.incenter, &prepared.edges, prepared.m, 1.0).unwrap();
        assert!(at_center > 0.5, "expected strong alpha at incenter, got {at_center}");

        // Just outside the first shrunken edge the fragment is discarded.
        let n = prepared.edges.normals[0];
        let boundary = prepared.incenter
            - n * (n.dot(prepared.incenter) + prepared.edges.offsets[0]) / n.length_squared();
        let outside = boundary + n * 0.5;
        assert_eq!(soft_alpha(outside, &prepared.edges, prepared.m, 1.0), None);
    }

    #[test]
    fn alpha_threshold_boundary() {
        // Hand-built half-planes around the origin: max signed distance at
        // the probe point is -0.5, and phi_scale -1 makes Cx = 0.5.
        let edges = ShrunkEdges {
            normals: [Vec2::new(0.0, -1.0), Vec2::new(-1.0, 0.0), Vec2::new(1.0, 1.0).normalize()],
            offsets: [-0.5, -2.0, -4.0],
            phi_scale: -1.0,
        };
        let p = Vec2::ZERO;

        let just_above = (2.0 / 255.0) + 1e-4;
        let alpha = soft_alpha(p, &edges, just_above, 1.0).unwrap();
        assert!(alpha >= ALPHA_THRESHOLD);

        let just_below = (2.0 / 255.0) - 1e-4;
        assert_eq!(soft_alpha(p, &edges, just_below, 1.0), None);
    }

    #[test]
    fn phi_scale_clamps_when_incenter_touches_an_edge() {
        // Colinear-ish footprint: the incenter sits on the last edge, so the
        // raw distance rounds to zero and the clamp must keep phi finite.
        let pixels = [
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(50.0, 1e-6),
        ];
        let (incenter, _) = incenter_of(pixels);
        let edges = shrink_edges(pixels, incenter, 1.0, 1.0);
        assert!(edges.phi_scale.is_finite());
        assert!(edges.phi_scale <= -1.0 / SAFE_DIST_EPS * 0.99);
    }
}
