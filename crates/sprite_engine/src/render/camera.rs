//! # Scene Camera
//!
//! Supplies the view-projection matrix sprites draw with when isolated, and the
//! frustum sprite groups cull their cells against.
//!
//! ## Coordinate System
//! Right-handed, Y-up view space with clip depth in `[-1, 1]`, matching the
//! conventions of `nalgebra`'s matrix constructors.

use nalgebra::Point3;

use super::frustum::Frustum;
use crate::foundation::math::{Mat4, Vec3};

/// Projection parameters of a camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in radians
        fov: f32,
        /// Aspect ratio (width / height)
        aspect: f32,
        /// Near clipping distance
        near: f32,
        /// Far clipping distance
        far: f32,
    },
    /// Orthographic projection centered on the view axis
    Orthographic {
        /// Width of the view volume
        width: f32,
        /// Height of the view volume
        height: f32,
        /// Near clipping distance
        near: f32,
        /// Far clipping distance
        far: f32,
    },
}

impl Projection {
    /// Projection matrix for these parameters
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective { fov, aspect, near, far } => {
                Mat4::new_perspective(aspect, fov, near, far)
            }
            Self::Orthographic { width, height, near, far } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                Mat4::new_orthographic(-hw, hw, -hh, hh, near, far)
            }
        }
    }
}

/// Camera for perspective and orthographic projections
///
/// Matrices are computed on demand from the position, target and up vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Projection parameters
    pub projection: Projection,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Example
    /// ```rust,ignore
    /// let camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 16.0 / 9.0, 0.1, 100.0);
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Perspective {
                fov: fov_degrees.to_radians(),
                aspect,
                near,
                far,
            },
        }
    }

    /// Create an orthographic camera looking down -Z from `position`
    ///
    /// This is the usual camera for 2D sprite scenes: one world unit per pixel when
    /// `width`/`height` match the viewport.
    pub fn orthographic(position: Vec3, width: f32, height: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: position - Vec3::new(0.0, 0.0, 1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Orthographic { width, height, near, far },
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Point the camera at `target` with a custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(self.position), &Point3::from(self.target), &self.up)
    }

    /// Camera-to-clip transform
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Combined world-to-clip transform
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// View frustum in world space
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.view_projection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::frustum::AABB;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    #[test]
    fn test_orthographic_view_projection_maps_to_ndc() {
        let camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 200.0, 100.0, 0.1, 100.0);
        let clip = camera.view_projection() * Vec4::new(100.0, 50.0, 0.0, 1.0);

        assert_relative_eq!(clip.x / clip.w, 1.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_camera_frustum_follows_position() {
        let mut camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 100.0, 100.0, 0.1, 100.0);
        let cell = AABB::new(Vec3::new(200.0, 0.0, 0.0), Vec3::new(216.0, 16.0, 0.0));
        assert!(!camera.frustum().intersects_aabb(&cell));

        camera.set_position(Vec3::new(200.0, 0.0, 10.0));
        camera.look_at(Vec3::new(200.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert!(camera.frustum().intersects_aabb(&cell));
    }

    #[test]
    fn test_perspective_frustum_rejects_objects_behind() {
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 0.1, 100.0);
        let frustum = camera.frustum();

        let in_front = AABB::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let behind = AABB::new(Vec3::new(-1.0, -1.0, 20.0), Vec3::new(1.0, 1.0, 21.0));
        assert!(frustum.intersects_aabb(&in_front));
        assert!(!frustum.intersects_aabb(&behind));
    }
}
