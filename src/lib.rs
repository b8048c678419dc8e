//! glb-viewer
//!
//! A minimal real-time viewer for binary glTF models. The model's node tree is
//! flattened once into an interleaved vertex buffer plus a rebased index
//! buffer, uploaded to the GPU and drawn every frame under a free-fly camera
//! with a single directional light.
//!
//! High-level modules
//! - `camera`: free-fly camera, view and projection matrices
//! - `context`: GPU and window context that owns surface, device and queue
//! - `data_structures`: import tree, flat and uploaded meshes, model transform
//! - `flow`: event loop driving the lifecycle hooks
//! - `input`: keyboard and mouse state collected from window events
//! - `pipelines`: the mesh render pipeline and its shaders
//! - `resources`: glTF import and scene flattening
//! - `render`: per-frame uniform and the indexed draw
//! - `viewer`: the application wiring all of the above together
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;
