use super::ids::NodeId;
use slotmap::Key;

/// An undirected bond between two particles.
///
/// The endpoints are stored in a canonical order so that `Bond::new(a, b)` and
/// `Bond::new(b, a)` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub a: NodeId, // Endpoint with the smaller key
    pub b: NodeId, // Endpoint with the larger key
}

impl Bond {
    pub fn new(first: NodeId, second: NodeId) -> Self {
        if first.data().as_ffi() <= second.data().as_ffi() {
            Self {
                a: first,
                b: second,
            }
        } else {
            Self {
                a: second,
                b: first,
            }
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.a == node || self.b == node
    }

    /// Returns the endpoint opposite to `node`, if `node` is part of this bond.
    pub fn partner(&self, node: NodeId) -> Option<NodeId> {
        if self.a == node {
            Some(self.b)
        } else if self.b == node {
            Some(self.a)
        } else {
            None
        }
    }
}
