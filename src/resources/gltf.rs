//! Conversion of a parsed glTF document into the transient [`SceneNode`] tree.

use crate::{
    data_structures::scene::{Mesh, Primitive, SceneNode},
    resources::{ImportError, MalformedReason},
};

/// Root nodes of the asset's default scene, falling back to the first scene.
///
/// An asset without any scene yields no roots and therefore an empty mesh.
/// A primitive whose declared index accessor cannot be read fails the import.
pub fn scene_roots(
    document: &::gltf::Document,
    buffers: &[::gltf::buffer::Data],
) -> Result<Vec<SceneNode>, ImportError> {
    log::debug!(
        "glTF document: {} scenes, {} nodes, {} meshes",
        document.scenes().count(),
        document.nodes().count(),
        document.meshes().count()
    );
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    match scene {
        Some(scene) => scene
            .nodes()
            .map(|node| to_scene_node(node, buffers))
            .collect(),
        None => {
            log::warn!("Asset does not contain a scene");
            Ok(Vec::new())
        }
    }
}

fn to_scene_node(
    node: ::gltf::Node,
    buffers: &[::gltf::buffer::Data],
) -> Result<SceneNode, ImportError> {
    let mesh = match node.mesh() {
        Some(mesh) => Some(to_mesh(&mesh, buffers)?),
        None => None,
    };

    Ok(SceneNode {
        mesh,
        children: node
            .children()
            .map(|child| to_scene_node(child, buffers))
            .collect::<Result<_, _>>()?,
    })
}

fn to_mesh(mesh: &::gltf::Mesh, buffers: &[::gltf::buffer::Data]) -> Result<Mesh, ImportError> {
    let mut converted = Mesh {
        name: mesh.name().map(str::to_string),
        primitives: Vec::new(),
    };
    for primitive in mesh.primitives() {
        if primitive.mode() != ::gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping primitive {} of mesh {:?}: {:?} is not a triangle list",
                primitive.index(),
                mesh.name(),
                primitive.mode()
            );
            continue;
        }
        let read = read_primitive(&primitive, buffers).map_err(|reason| {
            ImportError::MalformedMesh {
                mesh: converted.label(mesh.index()),
                primitive: primitive.index(),
                reason,
            }
        })?;
        converted.primitives.push(read);
    }
    Ok(converted)
}

fn read_primitive(
    primitive: &::gltf::Primitive,
    buffers: &[::gltf::buffer::Data],
) -> Result<Primitive, MalformedReason> {
    let reader =
        primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    // A declared accessor that yields nothing must not turn into a triangle list.
    let indices = match (primitive.indices(), reader.read_indices()) {
        (Some(_), None) => return Err(MalformedReason::UnreadableIndices),
        (_, indices) => indices.map(|indices| indices.into_u32().collect()),
    };

    Ok(Primitive {
        positions: reader.read_positions().map(|positions| positions.collect()),
        normals: reader.read_normals().map(|normals| normals.collect()),
        indices,
    })
}
