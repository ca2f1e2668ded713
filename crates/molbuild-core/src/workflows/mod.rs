//! # Workflows Module
//!
//! High-level recipes built from the assembly engines.
//!
//! ## Overview
//!
//! Workflows are the top-level entry points of the library. Each one validates its inputs
//! against the system, then drives [`join`](crate::engine::alignment::join) and friends to
//! produce a finished tree, logging a summary of what it built.
//!
//! ## Architecture
//!
//! - **Polymer Workflow** ([`polymer`]) - Linear chains of monomer copies with optional
//!   end caps
//! - **Substitution Workflow** ([`substitute`]) - Swapping a terminal particle for a
//!   fragment

pub mod polymer;
pub mod substitute;
