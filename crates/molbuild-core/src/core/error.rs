use super::models::ids::{NodeId, PortId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructuralError {
    #[error("Label '{label}' already exists in the scope of node {parent:?}")]
    DuplicateLabel { parent: NodeId, label: String },

    #[error("Invalid ownership for node {node:?}: {reason}")]
    InvalidOwnership { node: NodeId, reason: String },

    #[error("No entry named '{key}' was found")]
    KeyNotFound { key: String },

    #[error("Particle {particle:?} is not part of the assembly")]
    ForeignParticle { particle: NodeId },

    #[error("Node handle {0:?} does not refer to a live node")]
    StaleNode(NodeId),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BondError {
    #[error("A particle cannot be bonded to itself ({0:?})")]
    SelfBond(NodeId),

    #[error("A bond between {a:?} and {b:?} already exists")]
    DuplicateBond { a: NodeId, b: NodeId },

    #[error("No bond between {a:?} and {b:?}")]
    BondNotFound { a: NodeId, b: NodeId },

    #[error(
        "Cannot remove particle {particle:?}: it has {bond_count} bonds, so the vacancy direction is undefined"
    )]
    AmbiguousRemoval { particle: NodeId, bond_count: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PortError {
    #[error("Port {0:?} is not registered (already consumed or never created)")]
    StalePort(PortId),

    #[error("Ports {from:?} and {to:?} belong to the same assembly and cannot be joined")]
    SelfOverlap { from: PortId, to: PortId },
}

/// The error type of every mutating operation on a [`MolecularSystem`](super::models::system::MolecularSystem).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssemblyError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Bond(#[from] BondError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}
