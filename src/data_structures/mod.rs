//! Viewer data structures: the transient import tree, flattened geometry and transforms.
//!
//! - `scene` holds the node/mesh/primitive tree that only exists during import
//! - `mesh` holds the flattened vertex/index buffers and their GPU upload
//! - `transform` is the display rotation applied to the whole model
//! - `texture` wraps the depth texture of the render pass

pub mod mesh;
pub mod scene;
pub mod texture;
pub mod transform;
