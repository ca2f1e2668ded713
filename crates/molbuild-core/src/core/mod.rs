//! # Core Module
//!
//! The foundation of molbuild: the stateless data model for hierarchical assemblies and
//! the small set of helpers every higher layer relies on.
//!
//! ## Architecture
//!
//! - **Structural Model** ([`models`]) - Nodes, bonds, ports, and the `MolecularSystem` arena
//! - **Error Taxonomy** ([`error`]) - Structural, bond, and port errors of every mutation
//! - **Fragment Library** ([`library`]) - Reusable fragment templates loaded from TOML
//! - **Geometry** ([`utils`]) - Rotation helpers with deterministic degenerate cases
//!
//! ## Guarantees
//!
//! - Every non-root node has exactly one parent, and labels are unique per parent scope
//! - Bonds never join a particle to itself, never repeat, and never span two trees
//! - Mutating operations validate fully before committing; on error, state is unchanged

pub mod error;
pub mod library;
pub mod models;
pub mod utils;
