//! Display transform applied to the whole model.

use cgmath::{Deg, Matrix4};

/// A single rotation about the X axis applied to the whole mesh.
///
/// Independent of the camera; the identity transform is a rotation of `0°`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelTransform {
    rotation_x: Deg<f32>,
}

impl ModelTransform {
    pub const MIN_ROTATION: Deg<f32> = Deg(0.0);
    pub const MAX_ROTATION: Deg<f32> = Deg(90.0);

    pub fn identity() -> Self {
        Self {
            rotation_x: Deg(0.0),
        }
    }

    pub fn rotation(&self) -> Deg<f32> {
        self.rotation_x
    }

    /// Sets the rotation, clamped to `[MIN_ROTATION, MAX_ROTATION]`.
    pub fn set_rotation(&mut self, rotation: Deg<f32>) {
        self.rotation_x = Deg(rotation
            .0
            .clamp(Self::MIN_ROTATION.0, Self::MAX_ROTATION.0));
    }

    pub fn rotate_by(&mut self, delta: Deg<f32>) {
        self.set_rotation(self.rotation_x + delta);
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(self.rotation_x)
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::SquareMatrix;

    use super::*;

    #[test]
    fn identity_has_identity_matrix() {
        assert_eq!(ModelTransform::identity().matrix(), Matrix4::identity());
    }

    #[test]
    fn rotation_stays_within_slider_range() {
        let mut transform = ModelTransform::identity();
        transform.rotate_by(Deg(-10.0));
        assert_eq!(transform.rotation(), Deg(0.0));
        transform.rotate_by(Deg(500.0));
        assert_eq!(transform.rotation(), Deg(90.0));
        transform.set_rotation(Deg(45.0));
        assert_eq!(transform.rotation(), Deg(45.0));
    }

    #[test]
    fn quarter_turn_maps_y_to_z() {
        let mut transform = ModelTransform::identity();
        transform.set_rotation(Deg(90.0));
        let rotated = transform.matrix() * cgmath::Vector4::new(0.0, 1.0, 0.0, 0.0);
        approx::assert_abs_diff_eq!(rotated.x, 0.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(rotated.y, 0.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(rotated.z, 1.0, epsilon = 1e-6);
    }
}
