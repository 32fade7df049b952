//! Math utilities and types
//!
//! Provides the vector, matrix and rectangle types used by sprites and tile sheets.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Axis-aligned rectangle in texel or world units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width of the rectangle
    pub width: f32,
    /// Height of the rectangle
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from its position and size
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rectangle at the origin with the given size
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// The empty rectangle
    pub const fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// True when every component is zero
    pub fn is_empty(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.width == 0.0 && self.height == 0.0
    }

    /// Components in `x, y, width, height` order
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Build a rectangle from `x, y, width, height` components
    pub const fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Blend every component toward `target`
    pub fn lerp(&self, target: &Self, t: f32) -> Self {
        Self {
            x: lerp(self.x, target.x, t),
            y: lerp(self.y, target.y, t),
            width: lerp(self.width, target.width, t),
            height: lerp(self.height, target.height, t),
        }
    }
}

/// Linear interpolation: `from + t * (to - from)`
///
/// Exact at both endpoints, so `t == 0` yields `from` and `t == 1` yields `to`.
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    if t == 1.0 {
        return to;
    }
    from + t * (to - from)
}

/// Angle of a rotation projected onto the XY plane
///
/// Only the rotation about Z is extracted; sprites are billboards facing the camera
/// so any other rotation component yields an approximate angle.
pub fn planar_angle(rotation: &Quat) -> f32 {
    let q = rotation.quaternion();
    let (x, y, z, w) = (q.i, q.j, q.k, q.w);
    if x == 0.0 && y == 0.0 && z == 0.0 {
        return 0.0;
    }
    (2.0 * x * y + 2.0 * z * w).atan2(1.0 - 2.0 * (y * y + z * z))
}
