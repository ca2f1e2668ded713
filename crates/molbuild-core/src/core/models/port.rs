use super::ids::NodeId;
use nalgebra::{Point3, Unit, Vector3};

/// An open valence: a registered site where a bond to another fragment may be formed.
///
/// The `direction` points from the vacant site toward the anchor, i.e. along the path an
/// incoming bond travels. The vacant site itself lies `separation` Angstroms away from the
/// anchor, against the direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    /// The label of the port inside its owner's scope (e.g., "up", "down").
    pub label: String,
    /// The particle this port is anchored on.
    pub anchor: NodeId,
    /// The node that owns this port; the anchor's parent at registration time.
    pub owner: NodeId,
    /// Unit vector from the vacant site toward the anchor.
    pub direction: Unit<Vector3<f64>>,
    /// Distance from the anchor to the vacant site, in Angstroms.
    pub separation: f64,
}

impl Port {
    pub(crate) fn new(
        label: &str,
        anchor: NodeId,
        owner: NodeId,
        direction: Unit<Vector3<f64>>,
        separation: f64,
    ) -> Self {
        Self {
            label: label.to_string(),
            anchor,
            owner,
            direction,
            separation,
        }
    }

    /// Location of the vacant site for a given anchor position.
    pub fn site(&self, anchor_position: &Point3<f64>) -> Point3<f64> {
        anchor_position - self.direction.into_inner() * self.separation
    }
}

/// How the separation of a port created by particle removal is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SeparationPolicy {
    /// Always use the given separation, in Angstroms.
    Fixed(f64),
    /// Use the full length of the removed bond.
    BondLength,
    /// Use half the removed bond length, so that two such ports rebuild the original bond.
    #[default]
    HalfBondLength,
}

impl SeparationPolicy {
    pub fn separation_for(&self, bond_length: f64) -> f64 {
        match self {
            Self::Fixed(value) => *value,
            Self::BondLength => bond_length,
            Self::HalfBondLength => bond_length / 2.0,
        }
    }
}
