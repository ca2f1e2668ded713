//! # molbuild Core Library
//!
//! A library for assembling molecular structures from reusable fragments: hierarchical
//! particle trees, bond graphs, and port-driven alignment of fragments onto one another.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that each layer can be tested
//! on its own.
//!
//! - **[`core`]: The Foundation.** The `MolecularSystem` arena holding structure trees,
//!   bonds and ports, the error types, the fragment library, and geometry utilities.
//!
//! - **[`engine`]: The Assembly Core.** Port alignment (`join`), point patterns applied to
//!   a host's ports, and lattice tiling. Every engine operation validates and plans first,
//!   then commits in one step.
//!
//! - **[`workflows`]: The Public API.** Recipes such as polymer chains and substituent
//!   replacement that tie `engine` and `core` together into finished structures.

pub mod core;
pub mod engine;
pub mod workflows;
