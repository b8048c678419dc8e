//! Render pipeline definitions.
//!
//! The viewer draws exactly one mesh, so there is a single pipeline whose
//! vertex layout and shader follow the mesh's
//! [`VertexLayout`](crate::data_structures::mesh::VertexLayout).

pub mod basic;
