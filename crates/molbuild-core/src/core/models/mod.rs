//! # Core Models Module
//!
//! Data structures for hierarchical molecular assemblies.
//!
//! ## Overview
//!
//! Every structure, from a single atom to a bulk system, is a tree of [`node::Node`]s held
//! in the [`system::MolecularSystem`] arena. Leaves are particles with positions and element
//! tags; inner nodes are composites with label-addressable children. Bonds connect
//! particles of the same tree, and ports mark open valences where another fragment may be
//! joined.
//!
//! ## Key Components
//!
//! - [`ids`] - Stable handle types for nodes and ports
//! - [`node`] - The structural node and its closed `Particle`/`Composite` variant
//! - [`port`] - Open-valence markers and the separation policy for vacancy ports
//! - [`topology`] - Undirected bonds
//! - [`system`] - The arena: structure tree, bond graph, and port registry
//! - [`exchange`] - Flattened views and loader/minimizer data contracts
//!
//! ## Usage
//!
//! ```ignore
//! use molbuild::core::models::system::MolecularSystem;
//! use nalgebra::{Point3, Vector3};
//!
//! let mut system = MolecularSystem::new();
//! let methyl = system.create_composite("methyl");
//! let carbon = system.create_particle("C", Point3::origin(), "C");
//! system.add_child(methyl, carbon, "C")?;
//! system.add_port(carbon, "up", Vector3::new(0.0, -1.0, 0.0), 0.77)?;
//! ```

pub mod exchange;
pub mod ids;
pub mod node;
pub mod port;
pub mod system;
pub mod topology;
