//! Transient scene tree produced while importing a model.
//!
//! A [`SceneNode`] forest mirrors the node hierarchy of the asset's default
//! scene. Only the parts needed for flattening survive: the optional mesh of a
//! node and its children. The tree lives for the duration of an import and is
//! dropped once [`crate::resources::flatten`] has produced a
//! [`FlatMesh`](crate::data_structures::mesh::FlatMesh).

/// A drawable unit of a mesh.
///
/// `positions` is optional so that an asset without a position stream can be
/// represented and rejected during flattening instead of during parsing.
/// `indices` is optional because non-indexed triangle lists are valid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Primitive {
    pub positions: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Option<Vec<u32>>,
}

impl Primitive {
    /// Indexed primitive with positions only.
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions: Some(positions),
            normals: None,
            indices: Some(indices),
        }
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Number of vertices in the position stream, zero if it is missing.
    pub fn vertex_count(&self) -> usize {
        self.positions.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self {
            name: None,
            primitives,
        }
    }

    pub(crate) fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("mesh #{}", index))
    }
}

/// A node of the imported hierarchy. The tree is acyclic by construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub mesh: Option<Mesh>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// A node without a mesh that only groups its children.
    pub fn group(children: Vec<SceneNode>) -> Self {
        Self {
            mesh: None,
            children,
        }
    }

    pub fn with_mesh(mesh: Mesh) -> Self {
        Self {
            mesh: Some(mesh),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Depth-first, pre-order walk over this node and all of its descendants.
    ///
    /// Sibling order is the declaration order of the asset.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
