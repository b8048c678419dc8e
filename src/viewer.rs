//! The glTF viewer application.
//!
//! Imports one model at startup, uploads it once and then renders it every
//! frame under a free-fly camera with a fixed directional light.
//!
//! Controls: W/S/A/D/Space/LeftShift fly, mouse looks around, R/F tilt the
//! model about X, holding LeftAlt locks the view and frees the cursor, Escape quits.

use std::path::PathBuf;

use anyhow::Context as _;
use cgmath::{Deg, Point3};
use instant::Duration;
use winit::{
    keyboard::KeyCode,
    window::{CursorGrabMode, Window},
};

use crate::{
    camera::{Camera, DEFAULT_SENSITIVITY, DEFAULT_SPEED},
    context::Context,
    data_structures::{mesh::GpuMesh, transform::ModelTransform},
    flow::{self, Control, Hooks, WindowSettings},
    input::InputState,
    pipelines::basic::mk_mesh_pipeline,
    render::{FrameUniform, LightConstants, draw_mesh},
    resources,
};

/// Environment variable naming the model file to open.
pub const MODEL_PATH_VAR: &str = "GLB_VIEWER_MODEL";
pub const DEFAULT_MODEL_PATH: &str = "assets/model.glb";
/// Degrees per second while R or F is held.
pub const MODEL_ROTATION_SPEED: f32 = 45.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub model_path: PathBuf,
    pub window: WindowSettings,
    pub camera_start: Point3<f32>,
    pub light: LightConstants,
    pub speed: f32,
    pub sensitivity: f32,
}

impl ViewerConfig {
    pub fn with_model_path(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            window: WindowSettings::default(),
            camera_start: Point3::new(0.0, 0.0, 3.0),
            light: LightConstants::SUNLIGHT,
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl Default for ViewerConfig {
    /// Reads the model path from `GLB_VIEWER_MODEL`, falling back to `assets/model.glb`.
    fn default() -> Self {
        let model_path = std::env::var_os(MODEL_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
        Self::with_model_path(model_path)
    }
}

#[derive(Debug)]
struct LoadedModel {
    mesh: GpuMesh,
    pipeline: wgpu::RenderPipeline,
}

/// What the event loop has to do after an input step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) control: Control,
    /// `Some(locked)` when the view-lock changed this frame.
    pub(crate) view_lock_changed: Option<bool>,
}

#[derive(Debug)]
pub struct Viewer {
    model_path: PathBuf,
    camera: Camera,
    model: ModelTransform,
    light: LightConstants,
    speed: f32,
    sensitivity: f32,
    loaded: Option<LoadedModel>,
}

impl Viewer {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            camera: Camera::new(config.camera_start),
            model: ModelTransform::identity(),
            light: config.light,
            speed: config.speed,
            sensitivity: config.sensitivity,
            loaded: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn model_transform(&self) -> &ModelTransform {
        &self.model
    }

    pub fn hooks() -> Hooks<Viewer> {
        Hooks {
            on_load: Box::new(|ctx: &mut Context, viewer: &mut Viewer| viewer.load(ctx)),
            on_update: Box::new(
                |ctx: &mut Context, viewer: &mut Viewer, dt: Duration, input: &InputState| {
                    let step = viewer.apply_input(input, dt);
                    if let Some(locked) = step.view_lock_changed {
                        grab_cursor(ctx.window(), !locked);
                    }
                    step.control
                },
            ),
            on_render: Box::new(
                |ctx: &Context, viewer: &mut Viewer, render_pass: &mut wgpu::RenderPass<'_>| {
                    viewer.render(ctx, render_pass)
                },
            ),
            on_resize: Box::new(|_: &mut Context, _: &mut Viewer, width: u32, height: u32| {
                log::debug!("Surface resized to {}x{}", width, height);
            }),
            on_unload: Box::new(|_: &mut Context, viewer: &mut Viewer| {
                if let Some(loaded) = viewer.loaded.take() {
                    log::info!("Releasing {}", loaded.mesh.name);
                }
            }),
        }
    }

    fn load(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        let flat = resources::import_model(&self.model_path)
            .with_context(|| format!("Cannot load model {}", self.model_path.display()))?;

        if flat.is_empty() {
            log::warn!(
                "{} contains no triangles, nothing will be drawn",
                self.model_path.display()
            );
        } else {
            let name = self.model_path.display().to_string();
            let mesh = GpuMesh::upload(&ctx.device, &name, &flat);
            let pipeline = mk_mesh_pipeline(
                &ctx.device,
                &ctx.config,
                &ctx.frame.bind_group_layout,
                flat.layout(),
            );
            self.loaded = Some(LoadedModel { mesh, pipeline });
        }

        grab_cursor(ctx.window(), true);
        Ok(())
    }

    /// Fold one frame of input into the camera and model transform.
    pub(crate) fn apply_input(&mut self, input: &InputState, dt: Duration) -> Step {
        if input.is_pressed(KeyCode::Escape) {
            return Step {
                control: Control::Exit,
                view_lock_changed: None,
            };
        }
        let secs = dt.as_secs_f32();

        let locked = input.is_pressed(KeyCode::AltLeft);
        let view_lock_changed = (locked != self.camera.is_view_locked()).then(|| {
            self.camera.set_view_locked(locked);
            locked
        });

        let direction = input.movement_direction(&self.camera);
        self.camera.move_by(direction, secs, self.speed);

        let (dx, dy) = input.mouse_delta();
        self.camera.rotate(dx, dy, self.sensitivity);

        let tilt = match (input.is_pressed(KeyCode::KeyR), input.is_pressed(KeyCode::KeyF)) {
            (true, false) => MODEL_ROTATION_SPEED,
            (false, true) => -MODEL_ROTATION_SPEED,
            _ => 0.0,
        };
        if tilt != 0.0 {
            self.model.rotate_by(Deg(tilt * secs));
        }

        Step {
            control: Control::Continue,
            view_lock_changed,
        }
    }

    fn render(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        let uniform =
            match FrameUniform::new(&self.camera, &self.model, &self.light, ctx.aspect_ratio()) {
                Ok(uniform) => uniform,
                Err(e) => {
                    log::warn!("Skipping frame: {}", e);
                    return;
                }
            };
        ctx.frame.write(&ctx.queue, &uniform);
        draw_mesh(render_pass, &loaded.pipeline, &ctx.frame, &loaded.mesh);
    }
}

/// Grab and hide the cursor for mouse-look, or hand it back.
fn grab_cursor(window: &Window, grab: bool) {
    let result = if grab {
        // Not every platform supports both modes.
        window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
    } else {
        window.set_cursor_grab(CursorGrabMode::None)
    };
    if let Err(e) = result {
        log::warn!("Cannot change the cursor grab: {}", e);
    }
    window.set_cursor_visible(!grab);
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    log::info!("Opening {}", config.model_path.display());
    let viewer = Viewer::new(&config);
    flow::run(config.window.clone(), Viewer::hooks(), viewer)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn viewer() -> Viewer {
        Viewer::new(&ViewerConfig::with_model_path("unused.glb"))
    }

    const FRAME: Duration = Duration::from_millis(500);

    #[test]
    fn config_defaults() {
        let config = ViewerConfig::with_model_path("scene.glb");
        assert_eq!(config.model_path, PathBuf::from("scene.glb"));
        assert_eq!(config.camera_start, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(config.light, LightConstants::SUNLIGHT);
        assert_eq!(config.speed, 2.5);
        assert_eq!(config.sensitivity, 0.1);
    }

    #[test]
    fn escape_exits() {
        let mut viewer = viewer();
        let mut input = InputState::new();
        input.set_key(KeyCode::Escape, true);
        assert_eq!(viewer.apply_input(&input, FRAME).control, Control::Exit);
    }

    #[test]
    fn forward_key_moves_along_view_direction() {
        let mut viewer = viewer();
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        let step = viewer.apply_input(&input, FRAME);
        assert_eq!(step.control, Control::Continue);
        // 2.5 units/s for half a second down -Z.
        let position = viewer.camera().position;
        assert_abs_diff_eq!(position.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(position.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(position.z, 1.75, epsilon = 1e-5);
    }

    #[test]
    fn mouse_delta_rotates_camera() {
        let mut viewer = viewer();
        let mut input = InputState::new();
        input.add_mouse_delta(100.0, 50.0);
        viewer.apply_input(&input, FRAME);
        assert_abs_diff_eq!(viewer.camera().yaw().0, -80.0, epsilon = 1e-4);
        assert_abs_diff_eq!(viewer.camera().pitch().0, -5.0, epsilon = 1e-4);
    }

    #[test]
    fn alt_locks_view_and_reports_changes_once() {
        let mut viewer = viewer();
        let mut input = InputState::new();
        input.set_key(KeyCode::AltLeft, true);
        input.add_mouse_delta(40.0, 40.0);

        assert_eq!(viewer.apply_input(&input, FRAME).view_lock_changed, Some(true));
        assert_eq!(viewer.camera().yaw(), Deg(-90.0));
        assert_eq!(viewer.camera().pitch(), Deg(0.0));
        assert_eq!(viewer.apply_input(&input, FRAME).view_lock_changed, None);

        input.set_key(KeyCode::AltLeft, false);
        input.end_frame();
        assert_eq!(viewer.apply_input(&input, FRAME).view_lock_changed, Some(false));
        assert_eq!(viewer.camera().yaw(), Deg(-90.0));
    }

    #[test]
    fn r_and_f_tilt_model_within_range() {
        let mut viewer = viewer();
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyR, true);
        viewer.apply_input(&input, FRAME);
        assert_abs_diff_eq!(viewer.model_transform().rotation().0, 22.5, epsilon = 1e-4);

        for _ in 0..10 {
            viewer.apply_input(&input, FRAME);
        }
        assert_eq!(viewer.model_transform().rotation(), ModelTransform::MAX_ROTATION);

        input.set_key(KeyCode::KeyR, false);
        input.set_key(KeyCode::KeyF, true);
        for _ in 0..10 {
            viewer.apply_input(&input, FRAME);
        }
        assert_eq!(viewer.model_transform().rotation(), ModelTransform::MIN_ROTATION);
    }
}
