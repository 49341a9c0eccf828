//! Scene-graph walks used when an avatar is installed.

use crate::error::{ControllerError, Result};
use crate::host::SceneGraph;
use crate::types::NodeId;

/// Top of the hierarchy containing `node`.
pub fn find_root(graph: &dyn SceneGraph, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(parent) = graph.parent(current) {
        current = parent;
    }
    current
}

/// First node carrying a skeleton: the root itself, else its descendants in depth-first
/// pre-order.
pub fn find_skeleton(graph: &dyn SceneGraph, root: NodeId) -> Option<NodeId> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if graph.is_mesh(node) && graph.has_skeleton(node) {
            return Some(node);
        }
        let children = graph.children(node);
        stack.extend(children.into_iter().rev());
    }
    None
}

/// The movable root of an avatar and the node owning its skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AvatarRig {
    pub root: NodeId,
    pub skeleton: Option<NodeId>,
}

impl AvatarRig {
    pub fn resolve(graph: &dyn SceneGraph, node: NodeId) -> Result<Self> {
        let root = find_root(graph, node);
        if !graph.is_mesh(root) {
            return Err(ControllerError::InvalidAvatar { node, root });
        }
        Ok(Self {
            root,
            skeleton: find_skeleton(graph, root),
        })
    }
}
