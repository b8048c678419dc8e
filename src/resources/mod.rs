use std::{borrow::Cow, path::Path};

use thiserror::Error;

use crate::data_structures::{
    mesh::{FlatMesh, VertexLayout},
    scene::{Primitive, SceneNode},
};

/**
 * This module contains all logic for loading geometry from external files and
 * flattening it into a single vertex/index buffer pair.
 */
pub mod gltf;
pub mod mesh;

/// Reasons a single primitive cannot be flattened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("primitive has no position accessor")]
    MissingPositions,
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("{normals} normals do not match {positions} positions")]
    NormalCountMismatch { normals: usize, positions: usize },
    #[error("the merged vertex count exceeds the 32-bit index range")]
    VertexOverflow,
    #[error("the merged index count exceeds the 32-bit draw range")]
    IndexOverflow,
    #[error("the index accessor cannot be read from its buffer")]
    UnreadableIndices,
}

#[derive(Error, Debug)]
pub enum ImportError {
    /// The file is missing, unreadable or not a valid asset.
    #[error("failed to load asset {path}: {source}")]
    AssetLoad {
        path: String,
        #[source]
        source: ::gltf::Error,
    },
    /// A primitive cannot be flattened. The whole import is aborted.
    #[error("malformed primitive {primitive} of {mesh}: {reason}")]
    MalformedMesh {
        mesh: String,
        primitive: usize,
        reason: MalformedReason,
    },
}

/// Import the asset at `path` and flatten its default scene.
///
/// Importing the same file twice yields identical buffers; nothing outside
/// the asset influences the result.
pub fn import_model(path: impl AsRef<Path>) -> Result<FlatMesh, ImportError> {
    let path = path.as_ref();
    let asset_err = |source| ImportError::AssetLoad {
        path: path.display().to_string(),
        source,
    };
    let ::gltf::Gltf { document, blob } = ::gltf::Gltf::open(path).map_err(asset_err)?;
    let buffers = ::gltf::import_buffers(&document, path.parent(), blob).map_err(asset_err)?;

    let roots = gltf::scene_roots(&document, &buffers)?;
    let mesh = flatten(&roots)?;
    log::info!(
        "Imported {:?}: {} vertices, {} indices ({:?})",
        path,
        mesh.vertex_count(),
        mesh.index_count(),
        mesh.layout()
    );
    Ok(mesh)
}

/// Import an asset held in memory. External buffer URIs cannot be resolved.
pub fn import_model_from_slice(bytes: &[u8]) -> Result<FlatMesh, ImportError> {
    let asset_err = |source| ImportError::AssetLoad {
        path: "<memory>".to_string(),
        source,
    };
    let ::gltf::Gltf { document, blob } = ::gltf::Gltf::from_slice(bytes).map_err(asset_err)?;
    let buffers = ::gltf::import_buffers(&document, None, blob).map_err(asset_err)?;

    let roots = gltf::scene_roots(&document, &buffers)?;
    flatten(&roots)
}

/// A primitive together with where it was found, in traversal order.
struct Located<'a> {
    mesh: String,
    index: usize,
    primitive: &'a Primitive,
}

impl Located<'_> {
    fn malformed(&self, reason: MalformedReason) -> ImportError {
        ImportError::MalformedMesh {
            mesh: self.mesh.clone(),
            primitive: self.index,
            reason,
        }
    }
}

/// Flatten a forest of scene nodes into one interleaved buffer pair.
///
/// Nodes are visited depth-first in pre-order with siblings in declaration
/// order; each node's mesh is emitted before its children. Every local index
/// is rebased by the number of vertices emitted before its primitive.
///
/// If any primitive carries normals the output has six floats per vertex and
/// primitives without normals get smooth normals derived from their triangles.
/// Otherwise the output has three floats per vertex.
pub fn flatten(roots: &[SceneNode]) -> Result<FlatMesh, ImportError> {
    let mut located = Vec::new();
    let mut mesh_count = 0;
    for root in roots {
        root.walk(&mut |node| {
            if let Some(mesh) = &node.mesh {
                let label = mesh.label(mesh_count);
                mesh_count += 1;
                located.extend(mesh.primitives.iter().enumerate().map(
                    |(index, primitive)| Located {
                        mesh: label.clone(),
                        index,
                        primitive,
                    },
                ));
            }
        });
    }
    log::debug!(
        "Flattening {} primitives from {} meshes",
        located.len(),
        mesh_count
    );

    let mut total_vertices: u32 = 0;
    let mut total_indices: u32 = 0;
    for item in &located {
        let count = validate(item)?;
        total_vertices = add_count(total_vertices, count)
            .ok_or_else(|| item.malformed(MalformedReason::VertexOverflow))?;
        let index_count = item.primitive.indices.as_ref().map_or(count, Vec::len);
        total_indices = add_count(total_indices, index_count)
            .ok_or_else(|| item.malformed(MalformedReason::IndexOverflow))?;
    }

    let layout = if located.iter().any(|item| item.primitive.normals.is_some()) {
        VertexLayout::PositionNormal
    } else {
        VertexLayout::Position
    };

    let mut vertices = Vec::with_capacity(total_vertices as usize * layout.stride_floats());
    let mut indices = Vec::new();
    let mut vertex_offset: u32 = 0;

    for item in &located {
        let primitive = item.primitive;
        let positions = primitive.positions.as_deref().unwrap_or_default();
        let local_indices: Cow<[u32]> = match &primitive.indices {
            Some(indices) => Cow::Borrowed(indices.as_slice()),
            None => {
                log::debug!(
                    "Primitive {} of {} has no indices, treating it as a triangle list",
                    item.index,
                    item.mesh
                );
                Cow::Owned((0..positions.len() as u32).collect())
            }
        };

        match layout {
            VertexLayout::Position => {
                vertices.extend(positions.iter().flatten().copied());
            }
            VertexLayout::PositionNormal => {
                let normals: Cow<[[f32; 3]]> = match &primitive.normals {
                    Some(normals) => Cow::Borrowed(normals.as_slice()),
                    None => {
                        log::warn!(
                            "Primitive {} of {} has no normals, deriving them from its triangles",
                            item.index,
                            item.mesh
                        );
                        Cow::Owned(mesh::smooth_normals(positions, &local_indices))
                    }
                };
                for (position, normal) in positions.iter().zip(normals.iter()) {
                    vertices.extend_from_slice(position);
                    vertices.extend_from_slice(normal);
                }
            }
        }

        indices.extend(local_indices.iter().map(|i| vertex_offset + i));
        vertex_offset += positions.len() as u32;
    }

    Ok(FlatMesh::from_parts(vertices, indices, layout))
}

/// `total + count`, or `None` once the sum leaves the u32 range.
fn add_count(total: u32, count: usize) -> Option<u32> {
    u32::try_from(count)
        .ok()
        .and_then(|count| total.checked_add(count))
}

/// Check one primitive and return its vertex count.
fn validate(item: &Located) -> Result<usize, ImportError> {
    let primitive = item.primitive;
    let positions = primitive
        .positions
        .as_ref()
        .ok_or_else(|| item.malformed(MalformedReason::MissingPositions))?;
    let vertex_count = positions.len();

    if let Some(normals) = &primitive.normals {
        if normals.len() != vertex_count {
            return Err(item.malformed(MalformedReason::NormalCountMismatch {
                normals: normals.len(),
                positions: vertex_count,
            }));
        }
    }

    if let Some(indices) = &primitive.indices {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(item.malformed(MalformedReason::IndexOutOfRange {
                index,
                vertex_count,
            }));
        }
    }

    Ok(vertex_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::scene::Mesh;

    fn quad() -> Primitive {
        Primitive::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    fn hexagon_fan() -> Primitive {
        Primitive::new(
            (0..6).map(|i| [i as f32, 2.0, 0.0]).collect(),
            vec![0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 5],
        )
    }

    #[test]
    fn second_primitive_is_rebased_by_first_vertex_count() {
        let roots = vec![SceneNode::with_mesh(Mesh::new(vec![quad(), hexagon_fan()]))];

        let mesh = flatten(&roots).unwrap();

        assert_eq!(mesh.vertex_count(), 10);
        assert_eq!(&mesh.indices()[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.indices()[6], 4);
        assert_eq!(
            &mesh.indices()[6..],
            &[4, 5, 6, 4, 6, 7, 4, 7, 8, 4, 8, 9]
        );
    }

    #[test]
    fn offset_is_global_across_subtrees() {
        let mut left = SceneNode::group(Vec::new());
        left.add_child(SceneNode::with_mesh(Mesh::new(vec![quad()])));
        let right = SceneNode::with_mesh(Mesh::new(vec![hexagon_fan()]));
        let roots = vec![left, right];

        let mesh = flatten(&roots).unwrap();

        assert_eq!(mesh.indices()[6], 4);
        assert_eq!(mesh.vertex(4), Some(&[0.0, 2.0, 0.0][..]));
    }

    #[test]
    fn parent_mesh_is_emitted_before_children() {
        let mut parent = SceneNode::with_mesh(Mesh::new(vec![hexagon_fan()]));
        parent.add_child(SceneNode::with_mesh(Mesh::new(vec![quad()])));

        let mesh = flatten(&[parent]).unwrap();

        assert_eq!(mesh.vertex(0), Some(&[0.0, 2.0, 0.0][..]));
        assert_eq!(mesh.vertex(6), Some(&[0.0, 0.0, 0.0][..]));
        assert_eq!(mesh.indices()[12], 6);
    }

    #[test]
    fn empty_node_contributes_nothing() {
        let roots = vec![
            SceneNode::with_mesh(Mesh::new(vec![quad()])),
            SceneNode::default(),
            SceneNode::with_mesh(Mesh::new(vec![quad()])),
        ];

        let mesh = flatten(&roots).unwrap();

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.indices()[6], 4);
    }

    #[test]
    fn no_roots_yield_an_empty_mesh() {
        let mesh = flatten(&[]).unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.layout(), VertexLayout::Position);
    }

    #[test]
    fn normals_are_interleaved_after_positions() {
        let primitive = quad().with_normals(vec![[0.0, 0.0, 1.0]; 4]);
        let roots = vec![SceneNode::with_mesh(Mesh::new(vec![primitive]))];

        let mesh = flatten(&roots).unwrap();

        assert_eq!(mesh.layout(), VertexLayout::PositionNormal);
        assert_eq!(mesh.vertices().len(), 4 * 6);
        assert_eq!(mesh.vertex(1), Some(&[1.0, 0.0, 0.0, 0.0, 0.0, 1.0][..]));
    }

    #[test]
    fn mixed_normals_are_synthesised_for_the_missing_primitive() {
        let with = hexagon_fan().with_normals(vec![[0.0, 1.0, 0.0]; 6]);
        let roots = vec![SceneNode::with_mesh(Mesh::new(vec![quad(), with]))];

        let mesh = flatten(&roots).unwrap();

        assert_eq!(mesh.stride_floats(), 6);
        assert_eq!(mesh.vertices().len(), 10 * 6);
        // The quad lies in the XY plane with counter-clockwise winding.
        let first = mesh.vertex(0).unwrap();
        approx::assert_abs_diff_eq!(first[5], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn missing_positions_abort_the_import() {
        let roots = vec![SceneNode::with_mesh(Mesh {
            name: Some("hull".to_string()),
            primitives: vec![quad(), Primitive::default()],
        })];

        let err = flatten(&roots).unwrap_err();

        match err {
            ImportError::MalformedMesh {
                mesh,
                primitive,
                reason,
            } => {
                assert_eq!(mesh, "hull");
                assert_eq!(primitive, 1);
                assert_eq!(reason, MalformedReason::MissingPositions);
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let broken = Primitive::new(vec![[0.0; 3]; 3], vec![0, 1, 3]);
        let roots = vec![SceneNode::with_mesh(Mesh::new(vec![broken]))];

        let err = flatten(&roots).unwrap_err();

        assert!(matches!(
            err,
            ImportError::MalformedMesh {
                reason: MalformedReason::IndexOutOfRange {
                    index: 3,
                    vertex_count: 3
                },
                ..
            }
        ));
    }

    #[test]
    fn short_normal_stream_is_rejected() {
        let broken = quad().with_normals(vec![[0.0, 0.0, 1.0]; 3]);
        let roots = vec![SceneNode::with_mesh(Mesh::new(vec![broken]))];

        let err = flatten(&roots).unwrap_err();

        assert!(matches!(
            err,
            ImportError::MalformedMesh {
                reason: MalformedReason::NormalCountMismatch {
                    normals: 3,
                    positions: 4
                },
                ..
            }
        ));
    }

    #[test]
    fn non_indexed_primitive_is_a_triangle_list() {
        let triangles = Primitive {
            positions: Some(vec![[0.0; 3]; 6]),
            normals: None,
            indices: None,
        };
        let roots = vec![SceneNode::with_mesh(Mesh::new(vec![quad(), triangles]))];

        let mesh = flatten(&roots).unwrap();

        assert_eq!(&mesh.indices()[6..], &[4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn counts_past_the_u32_range_are_rejected() {
        assert_eq!(add_count(4, 6), Some(10));
        assert_eq!(add_count(u32::MAX - 1, 1), Some(u32::MAX));
        assert_eq!(add_count(u32::MAX, 1), None);
        assert_eq!(add_count(0, u32::MAX as usize + 1), None);
    }

    #[test]
    fn flattening_twice_is_identical() {
        let mut root = SceneNode::with_mesh(Mesh::new(vec![quad()]));
        root.add_child(SceneNode::with_mesh(Mesh::new(vec![hexagon_fan()])));
        let roots = vec![root];

        let first = flatten(&roots).unwrap();
        let second = flatten(&roots).unwrap();

        assert_eq!(first.bytes(), second.bytes());
        assert_eq!(first.index_bytes(), second.index_bytes());
    }
}
