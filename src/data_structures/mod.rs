//! Engine data structures: attribute buffers, GPU wrappers and scene nodes.
//!
//! - `buffer` holds CPU attribute buffers tagged with their semantic kind
//! - `layout` describes attribute shapes and turns them into wgpu layouts
//! - `vertex_array` owns the uploaded vertex and index buffers of a node
//! - `texture` contains the GPU texture wrappers and creation utilities
//! - `transform` holds the node transform and the per-node uniform
//! - `material` is the Phong material of untextured nodes
//! - `geometry` composes attribute buffers and synthesizes missing ones
//! - `mesh` and `plane` are the drawable nodes
//! - `scene_graph` is the common node interface and its GPU state

pub mod buffer;
pub mod geometry;
pub mod layout;
pub mod material;
pub mod mesh;
pub mod plane;
pub mod scene_graph;
pub mod texture;
pub mod transform;
pub mod vertex_array;
