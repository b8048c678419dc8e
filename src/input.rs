//! Keyboard and mouse state accumulated from winit events.
//!
//! The event loop feeds every window/device event into an [`InputState`];
//! the update hook reads key-down state and the cursor delta gathered since
//! the previous frame. Nothing here talks to hardware directly.

use std::collections::HashSet;

use cgmath::{InnerSpace, Vector3, Zero};
use winit::{
    event::{DeviceEvent, ElementState, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::camera::Camera;

#[derive(Debug, Default, Clone)]
pub struct InputState {
    pressed: HashSet<KeyCode>,
    mouse_delta: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.set_key(code, event.state == ElementState::Pressed);
                }
            }
            // Keys released while unfocused never report a release.
            WindowEvent::Focused(false) => self.pressed.clear(),
            _ => {}
        }
    }

    /// Raw mouse motion keeps reporting while the cursor is grabbed.
    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.add_mouse_delta(*dx as f32, *dy as f32);
        }
    }

    pub fn set_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(code);
        } else {
            self.pressed.remove(&code);
        }
    }

    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub fn is_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }

    /// Cursor movement accumulated since the last [`InputState::end_frame`].
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    /// Reset per-frame state. Key-down state persists.
    pub fn end_frame(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }

    /// Combined movement direction relative to the camera basis.
    ///
    /// Every held key adds a unit vector (W/S forward, A/D strafe, Space/LeftShift
    /// up/down); the sum is normalised so diagonals are no faster than a single
    /// axis. Opposing keys cancel out to zero.
    pub fn movement_direction(&self, camera: &Camera) -> Vector3<f32> {
        let strafe = camera.forward().cross(camera.up()).normalize();
        let bindings = [
            (KeyCode::KeyW, camera.forward()),
            (KeyCode::KeyS, -camera.forward()),
            (KeyCode::KeyD, strafe),
            (KeyCode::KeyA, -strafe),
            (KeyCode::Space, camera.up()),
            (KeyCode::ShiftLeft, -camera.up()),
        ];

        let direction = bindings
            .iter()
            .filter(|(code, _)| self.is_pressed(*code))
            .fold(Vector3::zero(), |sum, (_, unit)| sum + *unit);

        if direction.magnitude2() > f32::EPSILON {
            direction.normalize()
        } else {
            Vector3::zero()
        }
    }
}
