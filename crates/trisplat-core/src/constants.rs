//! Fixed numerical constants of the splat pipeline.

/// Triangles whose minimum corner opacity falls below this are invisible.
pub const STOPPING_INFLUENCE: f32 = 0.01;

/// |cos| threshold below which a triangle counts as edge-on.
pub const BACKFACE_THRESHOLD: f32 = 0.001;

/// Minimum screen-space perimeter in pixels.
pub const PERIMETER_THRESHOLD: f32 = 1.0;

/// Footprint radius gates in pixels.
pub const DISTANCE_MIN: f32 = 1.0;
pub const DISTANCE_MAX: f32 = 1600.0;

/// Fragments below this alpha contribute nothing and are discarded.
pub const ALPHA_THRESHOLD: f32 = 1.0 / 255.0;

/// Floor for the incenter-to-edge distance entering the phi denominator.
pub const SAFE_DIST_EPS: f32 = 1e-4;

/// Barycentric denominators below this are treated as degenerate.
pub const DEGENERATE_EPS: f32 = 1e-6;

/// Depth spans at or below this sort to the identity permutation.
pub const DEPTH_RANGE_EPS: f32 = 1e-7;

/// Minimum interval between depth sorts per scene instance.
pub const SORT_THROTTLE_MS: u64 = 100;

/// Real spherical-harmonic basis constants, 3D-GS ordering.
pub const SH_C0: f32 = 0.282_094_791_773_878_14;
pub const SH_C1: f32 = 0.488_602_511_902_919_9;
pub const SH_C2: [f32; 5] = [
    1.092_548_430_592_079_2,
    -1.092_548_430_592_079_2,
    0.315_391_565_252_520_05,
    -1.092_548_430_592_079_2,
    0.546_274_215_296_039_6,
];
pub const SH_C3: [f32; 7] = [
    -0.590_043_589_926_643_5,
    2.890_611_442_640_554,
    -0.457_045_799_464_465_8,
    0.373_176_332_590_115_4,
    -0.457_045_799_464_465_8,
    1.445_305_721_320_277,
    -0.590_043_589_926_643_5,
];
