//! In-memory binary glTF builder for the integration tests.
//!
//! Only the subset the viewer reads is supported: float VEC3 positions and
//! normals, u32 indices, meshes, nodes and a single default scene.

#![allow(dead_code)]

use std::path::PathBuf;

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;

#[derive(Clone, Copy, Debug, Default)]
pub struct PrimitiveSpec {
    pub positions: usize,
    pub normals: Option<usize>,
    pub indices: Option<usize>,
}

impl PrimitiveSpec {
    pub fn indexed(positions: usize, indices: usize) -> Self {
        Self {
            positions,
            normals: None,
            indices: Some(indices),
        }
    }

    pub fn with_normals(mut self, normals: usize) -> Self {
        self.normals = Some(normals);
        self
    }
}

#[derive(Debug, Default)]
pub struct GlbBuilder {
    bin: Vec<u8>,
    buffer_views: Vec<String>,
    accessors: Vec<String>,
    meshes: Vec<String>,
    nodes: Vec<String>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_view(&mut self, bytes: &[u8]) -> usize {
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.buffer_views.push(format!(
            r#"{{"buffer":0,"byteOffset":{},"byteLength":{}}}"#,
            offset,
            bytes.len()
        ));
        self.buffer_views.len() - 1
    }

    fn push_vec3(&mut self, values: &[[f32; 3]], bounds: bool) -> usize {
        let bytes: Vec<u8> = values
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let view = self.push_view(&bytes);

        let mut accessor = format!(
            r#"{{"bufferView":{},"componentType":{},"count":{},"type":"VEC3""#,
            view,
            FLOAT,
            values.len()
        );
        if bounds {
            let mut min = [f32::MAX; 3];
            let mut max = [f32::MIN; 3];
            for v in values {
                for axis in 0..3 {
                    min[axis] = min[axis].min(v[axis]);
                    max[axis] = max[axis].max(v[axis]);
                }
            }
            accessor.push_str(&format!(
                r#","min":[{:?},{:?},{:?}],"max":[{:?},{:?},{:?}]"#,
                min[0], min[1], min[2], max[0], max[1], max[2]
            ));
        }
        accessor.push('}');
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    /// Returns the accessor index.
    pub fn positions(&mut self, values: &[[f32; 3]]) -> usize {
        self.push_vec3(values, true)
    }

    pub fn normals(&mut self, values: &[[f32; 3]]) -> usize {
        self.push_vec3(values, false)
    }

    pub fn indices(&mut self, values: &[u32]) -> usize {
        self.indices_with_count(values, values.len())
    }

    /// Index accessor claiming `count` entries while its view only holds `values`.
    pub fn indices_with_count(&mut self, values: &[u32], count: usize) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.push_view(&bytes);
        self.accessors.push(format!(
            r#"{{"bufferView":{},"componentType":{},"count":{},"type":"SCALAR"}}"#,
            view, UNSIGNED_INT, count
        ));
        self.accessors.len() - 1
    }

    pub fn mesh(&mut self, name: &str, primitives: &[PrimitiveSpec]) -> usize {
        let primitives: Vec<String> = primitives
            .iter()
            .map(|p| {
                let mut attributes = format!(r#""POSITION":{}"#, p.positions);
                if let Some(normals) = p.normals {
                    attributes.push_str(&format!(r#","NORMAL":{}"#, normals));
                }
                let indices = p
                    .indices
                    .map(|i| format!(r#","indices":{}"#, i))
                    .unwrap_or_default();
                format!(r#"{{"attributes":{{{}}}{},"mode":4}}"#, attributes, indices)
            })
            .collect();
        self.meshes.push(format!(
            r#"{{"name":"{}","primitives":[{}]}}"#,
            name,
            primitives.join(",")
        ));
        self.meshes.len() - 1
    }

    pub fn node(&mut self, mesh: Option<usize>, children: &[usize]) -> usize {
        let mut fields = Vec::new();
        if let Some(mesh) = mesh {
            fields.push(format!(r#""mesh":{}"#, mesh));
        }
        if !children.is_empty() {
            let children: Vec<String> = children.iter().map(usize::to_string).collect();
            fields.push(format!(r#""children":[{}]"#, children.join(",")));
        }
        self.nodes.push(format!("{{{}}}", fields.join(",")));
        self.nodes.len() - 1
    }

    fn json(&self, roots: &[usize]) -> String {
        let list = |items: &[String]| items.join(",");
        let roots: Vec<String> = roots.iter().map(usize::to_string).collect();

        let mut fields = vec![
            r#""asset":{"version":"2.0"}"#.to_string(),
            r#""scene":0"#.to_string(),
            format!(r#""scenes":[{{"nodes":[{}]}}]"#, roots.join(",")),
        ];
        if !self.nodes.is_empty() {
            fields.push(format!(r#""nodes":[{}]"#, list(&self.nodes)));
        }
        if !self.meshes.is_empty() {
            fields.push(format!(r#""meshes":[{}]"#, list(&self.meshes)));
        }
        if !self.accessors.is_empty() {
            fields.push(format!(r#""accessors":[{}]"#, list(&self.accessors)));
            fields.push(format!(r#""bufferViews":[{}]"#, list(&self.buffer_views)));
            fields.push(format!(r#""buffers":[{{"byteLength":{}}}]"#, self.bin.len()));
        }
        format!("{{{}}}", fields.join(","))
    }

    /// Serialise to a `.glb` container with `roots` as the default scene.
    pub fn build(&self, roots: &[usize]) -> Vec<u8> {
        let mut json = self.json(roots).into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = self.bin.clone();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let mut total = 12 + 8 + json.len();
        if !bin.is_empty() {
            total += 8 + bin.len();
        }

        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());

        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        glb.extend_from_slice(&json);

        if !bin.is_empty() {
            glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
            glb.extend_from_slice(&bin);
        }
        glb
    }
}

/// Unit square in the XY plane, two triangles.
pub const QUAD: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

pub const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]];
pub const TRIANGLE_INDICES: [u32; 3] = [0, 1, 2];

/// Write `bytes` to a uniquely named file in the system temp directory.
pub fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "glb_viewer_{}_{}.glb",
        name,
        std::process::id()
    ));
    std::fs::write(&path, bytes).expect("failed to write temporary model");
    path
}
