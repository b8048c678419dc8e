//! Flattened geometry and its GPU counterpart.
//!
//! [`FlatMesh`] is the output of the importer: one interleaved vertex buffer and
//! one index buffer whose indices are global across every merged primitive.
//! [`GpuMesh`] is the same data uploaded once to the device.

use wgpu::util::DeviceExt;

/// Per-vertex record layout of a [`FlatMesh`]. Fixed for the whole buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// `px, py, pz`
    Position,
    /// `px, py, pz, nx, ny, nz`
    PositionNormal,
}

impl VertexLayout {
    pub const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![0 => Float32x3];
    pub const POSITION_NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn stride_floats(self) -> usize {
        match self {
            VertexLayout::Position => 3,
            VertexLayout::PositionNormal => 6,
        }
    }

    pub fn stride_bytes(self) -> wgpu::BufferAddress {
        (self.stride_floats() * std::mem::size_of::<f32>()) as wgpu::BufferAddress
    }

    pub fn has_normals(self) -> bool {
        matches!(self, VertexLayout::PositionNormal)
    }

    /// Vertex buffer layout: position at offset 0, normal at offset 12 when present.
    pub fn desc(self) -> wgpu::VertexBufferLayout<'static> {
        let attributes: &'static [wgpu::VertexAttribute] = match self {
            VertexLayout::Position => &Self::POSITION_ATTRIBUTES,
            VertexLayout::PositionNormal => &Self::POSITION_NORMAL_ATTRIBUTES,
        };
        wgpu::VertexBufferLayout {
            array_stride: self.stride_bytes(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Interleaved vertex floats plus offset-corrected triangle indices.
///
/// Immutable once built: the importer is the only producer.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatMesh {
    vertices: Vec<f32>,
    indices: Vec<u32>,
    layout: VertexLayout,
}

impl FlatMesh {
    pub(crate) fn from_parts(vertices: Vec<f32>, indices: Vec<u32>, layout: VertexLayout) -> Self {
        debug_assert_eq!(vertices.len() % layout.stride_floats(), 0);
        Self {
            vertices,
            indices,
            layout,
        }
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn stride_floats(&self) -> usize {
        self.layout.stride_floats()
    }

    pub fn stride_bytes(&self) -> wgpu::BufferAddress {
        self.layout.stride_bytes()
    }

    /// Number of vertex records (not floats).
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.stride_floats()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Index count as a draw range. `flatten` rejects meshes past `u32::MAX`
    /// indices, so the saturation never triggers for imported meshes.
    pub fn draw_count(&self) -> u32 {
        u32::try_from(self.indices.len()).unwrap_or(u32::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The `i`-th vertex record, `None` past the end.
    pub fn vertex(&self, i: usize) -> Option<&[f32]> {
        let stride = self.stride_floats();
        self.vertices.get(i * stride..(i + 1) * stride)
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// A [`FlatMesh`] uploaded to the GPU. Created once at load time.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub layout: VertexLayout,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, name: &str, mesh: &FlatMesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: mesh.bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: mesh.draw_count(),
            layout: mesh.layout(),
        }
    }
}
