//! Narrow data contracts shared with external collaborators.
//!
//! Structure loaders hand particles and bonds in through [`MolecularSystem::load_fragment`];
//! force-field typing and file writers read a [`FlatView`]; minimizers hand updated
//! coordinates back through [`MolecularSystem::update_positions`] without touching topology.

use super::ids::NodeId;
use super::system::MolecularSystem;
use crate::core::error::{AssemblyError, BondError, StructuralError};
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};

/// A particle as delivered by a structure loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRecord {
    pub name: String,
    pub element: String,
    pub position: Point3<f64>,
}

impl ParticleRecord {
    pub fn new(name: &str, element: &str, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element: element.to_string(),
            position,
        }
    }
}

/// A particle in a [`FlatView`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlatParticle {
    pub id: NodeId,
    /// Label path relative to the viewed root.
    pub path: String,
    pub element: String,
    pub position: Point3<f64>,
}

/// Read-only flattened view of a tree: particles in depth-first order and bonds as index
/// pairs into that list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatView {
    pub particles: Vec<FlatParticle>,
    pub bonds: Vec<(usize, usize)>,
}

impl MolecularSystem {
    /// Builds a detached composite from loader output.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::DuplicateLabel`] for repeated particle names,
    /// [`StructuralError::KeyNotFound`] for out-of-range bond indices, and the usual
    /// [`BondError`]s for self or duplicate bonds. Nothing is created on error.
    pub fn load_fragment(
        &mut self,
        label: &str,
        particles: &[ParticleRecord],
        bonds: &[(usize, usize)],
    ) -> Result<NodeId, AssemblyError> {
        let mut names = HashSet::new();
        for record in particles {
            if !names.insert(record.name.as_str()) {
                return Err(StructuralError::DuplicateLabel {
                    parent: NodeId::default(),
                    label: record.name.clone(),
                }
                .into());
            }
        }
        let mut seen = HashSet::new();
        for &(i, j) in bonds {
            for index in [i, j] {
                if index >= particles.len() {
                    return Err(StructuralError::KeyNotFound {
                        key: format!("particle index {}", index),
                    }
                    .into());
                }
            }
            if i == j {
                return Err(BondError::SelfBond(NodeId::default()).into());
            }
            if !seen.insert((i.min(j), i.max(j))) {
                return Err(BondError::DuplicateBond {
                    a: NodeId::default(),
                    b: NodeId::default(),
                }
                .into());
            }
        }

        let root = self.create_composite(label);
        let ids: Vec<NodeId> = particles
            .iter()
            .map(|record| {
                let id = self.create_particle(&record.name, record.position, &record.element);
                self.graft(root, id, &record.name);
                id
            })
            .collect();
        for &(i, j) in bonds {
            self.link(ids[i], ids[j]);
        }
        Ok(root)
    }

    /// Flattens the tree under `root` for consumption by external collaborators.
    pub fn flat_view(&self, root: NodeId) -> FlatView {
        let mut index_of = HashMap::new();
        let mut particles = Vec::new();
        let root_path = self.path_of(root);

        for id in self.particles(root) {
            let Some(node) = self.node(id) else {
                continue;
            };
            let full_path = self.path_of(id);
            let path = full_path
                .strip_prefix(&root_path)
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(&full_path)
                .to_string();
            index_of.insert(id, particles.len());
            particles.push(FlatParticle {
                id,
                path,
                element: node.element().unwrap_or_default().to_string(),
                position: node.position().unwrap_or_else(Point3::origin),
            });
        }

        let bonds = self
            .bonds()
            .filter_map(|bond| Some((*index_of.get(&bond.a)?, *index_of.get(&bond.b)?)))
            .collect();

        FlatView { particles, bonds }
    }

    /// Replaces the positions of the particles under `root`, given in
    /// [`particles`](Self::particles) order. Topology is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidGeometry`] if the number of positions does not match
    /// the number of particles.
    pub fn update_positions(
        &mut self,
        root: NodeId,
        positions: &[Point3<f64>],
    ) -> Result<(), AssemblyError> {
        self.live(root)?;
        let ids: Vec<NodeId> = self.particles(root).collect();
        if ids.len() != positions.len() {
            return Err(AssemblyError::InvalidGeometry(format!(
                "expected {} positions, got {}",
                ids.len(),
                positions.len()
            )));
        }
        for (id, position) in ids.into_iter().zip(positions) {
            self.set_particle_position(id, *position);
        }
        Ok(())
    }
}
