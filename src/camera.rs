//! Free-fly camera driven by accumulated input deltas.
//!
//! The camera stores yaw/pitch in degrees and recomputes an orthonormal
//! `forward`/`right`/`up` basis after every rotation. World-up (+Y) is only the
//! reference for the cross products; `up` itself tilts with the pitch.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3};
use thiserror::Error;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Units per second.
pub const DEFAULT_SPEED: f32 = 2.5;
/// Degrees per unit of cursor movement.
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
pub const PITCH_LIMIT: f32 = 89.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CameraError {
    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspectRatio(f32),
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: Deg<f32>,
    pitch: Deg<f32>,
    fovy: Deg<f32>,
    forward: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    view_locked: bool,
}

impl Camera {
    /// Camera at `position` looking down -Z (yaw -90°, pitch 0°) with an 80° field of view.
    pub fn new<P: Into<Point3<f32>>>(position: P) -> Self {
        Self::with_orientation(position, Deg(-90.0), Deg(0.0), Deg(80.0))
    }

    pub fn with_orientation<P: Into<Point3<f32>>>(
        position: P,
        yaw: Deg<f32>,
        pitch: Deg<f32>,
        fovy: Deg<f32>,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw,
            pitch: Deg(pitch.0.clamp(-PITCH_LIMIT, PITCH_LIMIT)),
            fovy,
            forward: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: WORLD_UP,
            view_locked: false,
        };
        camera.update_vectors();
        camera
    }

    pub fn yaw(&self) -> Deg<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Deg<f32> {
        self.pitch
    }

    pub fn fovy(&self) -> Deg<f32> {
        self.fovy
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn is_view_locked(&self) -> bool {
        self.view_locked
    }

    /// While locked, [`Camera::rotate`] absorbs its input without effect.
    pub fn set_view_locked(&mut self, locked: bool) {
        self.view_locked = locked;
    }

    /// Translate by `direction * speed * elapsed_secs`. The world is unbounded.
    ///
    /// `direction` is used as given; callers combining several inputs should
    /// normalise the sum first.
    pub fn move_by(&mut self, direction: Vector3<f32>, elapsed_secs: f32, speed: f32) {
        self.position += direction * speed * elapsed_secs;
    }

    /// Apply a cursor delta. Moving the cursor down (positive `delta_y`) lowers the pitch.
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32, sensitivity: f32) {
        if self.view_locked {
            return;
        }
        self.yaw += Deg(delta_x * sensitivity);
        self.pitch -= Deg(delta_y * sensitivity);
        self.pitch = Deg(self.pitch.0.clamp(-PITCH_LIMIT, PITCH_LIMIT));
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (sin_pitch, cos_pitch) = Rad::from(self.pitch).0.sin_cos();
        let (sin_yaw, cos_yaw) = Rad::from(self.yaw).0.sin_cos();

        self.forward =
            Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize();
        self.right = self.forward.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }

    /// Right-handed look-to matrix from `position` along `forward`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward, self.up)
    }

    /// OpenGL-convention perspective projection with near 0.1 and far 100.
    pub fn projection_matrix(&self, aspect: f32) -> Result<Matrix4<f32>, CameraError> {
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(CameraError::InvalidAspectRatio(aspect));
        }
        Ok(cgmath::perspective(self.fovy, aspect, Z_NEAR, Z_FAR))
    }
}
