//! Render composition.
//!
//! Flows describe what to draw each frame with a [`Render`]. The frame loop
//! flattens every flow's render into one list of nodes, writes their
//! uniforms and draws them in the shadow and scene passes.

use crate::data_structures::scene_graph::SceneNode;

/// Specifies what a flow draws this frame.
///
/// - `None` renders nothing
/// - `Node` renders a single node (and its children)
/// - `Nodes` renders a batch of nodes
/// - `Composed` renders a composition of renders
pub enum Render<'a> {
    None,
    Node(&'a dyn SceneNode),
    Nodes(Vec<&'a dyn SceneNode>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Appends the nodes of this render in drawing order.
    pub fn collect(self, nodes: &mut Vec<&'a dyn SceneNode>) {
        match self {
            Render::None => (),
            Render::Node(node) => nodes.push(node),
            Render::Nodes(mut vec) => nodes.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.collect(nodes)),
        }
    }

    pub fn into_nodes(self) -> Vec<&'a dyn SceneNode> {
        let mut nodes = Vec::new();
        self.collect(&mut nodes);
        nodes
    }
}

impl<'a, N: SceneNode> From<&'a N> for Render<'a> {
    fn from(node: &'a N) -> Self {
        Render::Node(node)
    }
}

impl<'a, N: SceneNode> From<&'a [N]> for Render<'a> {
    fn from(nodes: &'a [N]) -> Self {
        Render::Nodes(nodes.iter().map(|n| n as &dyn SceneNode).collect())
    }
}

impl<'a> From<Vec<Render<'a>>> for Render<'a> {
    fn from(renders: Vec<Render<'a>>) -> Self {
        Render::Composed(renders)
    }
}
