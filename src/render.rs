//! Per-frame matrix and lighting glue.
//!
//! Every frame the camera and model transform are folded into a single
//! [`FrameUniform`] together with fixed directional-light constants. The uniform
//! is written to the GPU and the uploaded [`GpuMesh`] is drawn with one indexed
//! draw call.
//!
//! # Key types
//!
//! - [`LightConstants`] describes the directional light and the object colour
//! - [`FrameUniform`] is the `#[repr(C)]` block mirrored by the WGSL `Frame` struct
//! - [`FrameResources`] owns the uniform buffer and its bind group
//!

use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, CameraError, OPENGL_TO_WGPU_MATRIX},
    data_structures::{mesh::GpuMesh, transform::ModelTransform},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightConstants {
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub object_color: [f32; 3],
}

impl LightConstants {
    /// White sunlight from above onto a light grey object.
    pub const SUNLIGHT: LightConstants = LightConstants {
        direction: [-0.3, -1.0, -0.5],
        color: [1.0, 1.0, 1.0],
        object_color: [0.7, 0.7, 0.7],
    };
}

impl Default for LightConstants {
    fn default() -> Self {
        Self::SUNLIGHT
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    pub light_color: [f32; 3],
    _padding2: u32,
    pub object_color: [f32; 3],
    _padding3: u32,
}

impl FrameUniform {
    /// Matrices for the current camera state, with wgpu's depth range folded
    /// into the projection.
    pub fn new(
        camera: &Camera,
        model: &ModelTransform,
        light: &LightConstants,
        aspect: f32,
    ) -> Result<Self, CameraError> {
        let projection = OPENGL_TO_WGPU_MATRIX * camera.projection_matrix(aspect)?;
        Ok(Self {
            model: model.matrix().into(),
            view: camera.view_matrix().into(),
            projection: projection.into(),
            light_dir: light.direction,
            _padding: 0,
            light_color: light.color,
            _padding2: 0,
            object_color: light.object_color,
            _padding3: 0,
        })
    }
}

impl Default for FrameUniform {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// GPU side of [`FrameUniform`]: buffer, bind group and its layout.
#[derive(Debug)]
pub struct FrameResources {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl FrameResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Buffer"),
            contents: bytemuck::cast_slice(&[FrameUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("frame_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("frame_bind_group"),
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }
}

/// Issue the single indexed triangle draw for `mesh`.
pub fn draw_mesh(
    render_pass: &mut wgpu::RenderPass<'_>,
    pipeline: &wgpu::RenderPipeline,
    frame: &FrameResources,
    mesh: &GpuMesh,
) {
    if mesh.num_elements == 0 {
        log::warn!("you attempted to render {:?} without any indices", mesh.name);
        return;
    }
    render_pass.set_pipeline(pipeline);
    render_pass.set_bind_group(0, &frame.bind_group, &[]);
    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    render_pass.draw_indexed(0..mesh.num_elements, 0, 0..1);
}
