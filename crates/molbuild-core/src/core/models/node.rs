use super::ids::{NodeId, PortId};
use nalgebra::Point3;
use std::collections::HashMap;

/// The closed set of shapes a structural node can take.
///
/// A node is either a leaf particle carrying geometry, or a composite that only
/// owns other nodes (and the ports anchored on its direct particle children).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A single atom or coarse-grained bead.
    Particle {
        /// The 3D coordinates of the particle in Angstroms.
        position: Point3<f64>,
        /// The element or bead type tag (e.g., "C", "H", "_CH3").
        element: String,
    },
    /// An ordered, label-addressable container of child nodes.
    Composite {
        children: Vec<NodeId>,
        child_label_map: HashMap<String, NodeId>,
    },
}

/// A structural node in the containment tree.
///
/// Nodes are stored in the [`MolecularSystem`](super::system::MolecularSystem) arena and
/// are always referred to through their [`NodeId`] handle. Labels are unique within the
/// scope of the parent; the root of a tree keeps whatever label it was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The label of this node inside its parent's scope.
    pub label: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    /// Ports owned by this node, in registration order.
    pub(crate) ports: Vec<PortId>,
}

impl Node {
    pub(crate) fn particle(label: &str, position: Point3<f64>, element: &str) -> Self {
        Self {
            label: label.to_string(),
            parent: None,
            kind: NodeKind::Particle {
                position,
                element: element.to_string(),
            },
            ports: Vec::new(),
        }
    }

    pub(crate) fn composite(label: &str) -> Self {
        Self {
            label: label.to_string(),
            parent: None,
            kind: NodeKind::Composite {
                children: Vec::new(),
                child_label_map: HashMap::new(),
            },
            ports: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_particle(&self) -> bool {
        matches!(self.kind, NodeKind::Particle { .. })
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, NodeKind::Composite { .. })
    }

    /// Returns the position of a particle, or `None` for composites.
    pub fn position(&self) -> Option<Point3<f64>> {
        match &self.kind {
            NodeKind::Particle { position, .. } => Some(*position),
            NodeKind::Composite { .. } => None,
        }
    }

    /// Returns the element tag of a particle, or `None` for composites.
    pub fn element(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Particle { element, .. } => Some(element.as_str()),
            NodeKind::Composite { .. } => None,
        }
    }

    /// Returns the children in insertion order. Particles have none.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Composite { children, .. } => children,
            NodeKind::Particle { .. } => &[],
        }
    }

    pub fn child_by_label(&self, label: &str) -> Option<NodeId> {
        match &self.kind {
            NodeKind::Composite {
                child_label_map, ..
            } => child_label_map.get(label).copied(),
            NodeKind::Particle { .. } => None,
        }
    }

    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    pub(crate) fn set_position(&mut self, new_position: Point3<f64>) {
        if let NodeKind::Particle { position, .. } = &mut self.kind {
            *position = new_position;
        }
    }

    pub(crate) fn insert_child(&mut self, label: &str, child: NodeId) {
        if let NodeKind::Composite {
            children,
            child_label_map,
        } = &mut self.kind
        {
            children.push(child);
            child_label_map.insert(label.to_string(), child);
        }
    }

    pub(crate) fn take_child(&mut self, label: &str) -> Option<NodeId> {
        match &mut self.kind {
            NodeKind::Composite {
                children,
                child_label_map,
            } => {
                let child = child_label_map.remove(label)?;
                children.retain(|&id| id != child);
                Some(child)
            }
            NodeKind::Particle { .. } => None,
        }
    }
}
