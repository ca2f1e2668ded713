//! # Engine Module
//!
//! The assembly engines that turn fragments into larger structures.
//!
//! ## Overview
//!
//! Everything here operates on a [`MolecularSystem`](crate::core::models::system::MolecularSystem)
//! through its public and crate-internal operations, and follows the same discipline: every
//! precondition is checked against the current state first, and only a fully planned change
//! is committed.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Engine tolerances, separation policy, and the input
//!   specifications for guests and polymers
//! - **Alignment** ([`alignment`]) - Joining two trees through a pair of ports
//! - **Patterns** ([`pattern`]) - Point patterns and their application to a host's ports
//! - **Tiling** ([`tiling`]) - Periodic replication of a unit cell

pub mod alignment;
pub mod config;
pub mod pattern;
pub mod tiling;
