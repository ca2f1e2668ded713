use super::error::AssemblyError;
use super::models::exchange::ParticleRecord;
use super::models::ids::NodeId;
use super::models::system::MolecularSystem;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParticleTemplate {
    pub label: String,
    pub element: String,
    pub position: [f64; 3],
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PortTemplate {
    pub label: String,
    /// Index into the fragment's particle list.
    pub anchor: usize,
    pub direction: [f64; 3],
    pub separation: f64,
}

/// A reusable fragment: particles, bonds between them, and the ports it exposes.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FragmentTemplate {
    pub particles: Vec<ParticleTemplate>,
    #[serde(default)]
    pub bonds: Vec<[usize; 2]>,
    #[serde(default)]
    pub ports: Vec<PortTemplate>,
}

impl FragmentTemplate {
    fn validate(&self, name: &str) -> Result<(), FragmentLoadError> {
        let count = self.particles.len();
        let out_of_range = self
            .bonds
            .iter()
            .flatten()
            .chain(self.ports.iter().map(|port| &port.anchor))
            .find(|&&index| index >= count);
        if let Some(index) = out_of_range {
            return Err(FragmentLoadError::Invalid {
                fragment: name.to_string(),
                message: format!(
                    "particle index {} is out of range for {} particle(s)",
                    index, count
                ),
            });
        }
        Ok(())
    }
}

/// A named collection of fragment templates, usually loaded from a TOML file whose
/// top-level tables are fragment names.
#[derive(Debug, Clone, Default)]
pub struct FragmentLibrary {
    fragments: BTreeMap<String, FragmentTemplate>,
}

impl FragmentLibrary {
    pub fn load(path: &Path) -> Result<Self, FragmentLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| FragmentLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            FragmentLoadError::Toml { source, .. } => FragmentLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, FragmentLoadError> {
        let fragments: BTreeMap<String, FragmentTemplate> =
            toml::from_str(content).map_err(|e| FragmentLoadError::Toml {
                path: "<inline>".to_string(),
                source: e,
            })?;
        Self::from_templates(fragments)
    }

    pub fn from_templates(
        fragments: BTreeMap<String, FragmentTemplate>,
    ) -> Result<Self, FragmentLoadError> {
        for (name, template) in &fragments {
            template.validate(name)?;
        }
        Ok(Self { fragments })
    }

    pub fn get(&self, name: &str) -> Option<&FragmentTemplate> {
        self.fragments.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Builds a detached composite labeled `name` from the named template.
    ///
    /// # Errors
    ///
    /// Returns [`InstantiateError::UnknownFragment`] for unknown names, or the assembly
    /// error raised while building. A partially built fragment is discarded.
    pub fn instantiate(
        &self,
        system: &mut MolecularSystem,
        name: &str,
    ) -> Result<NodeId, InstantiateError> {
        let template = self
            .get(name)
            .ok_or_else(|| InstantiateError::UnknownFragment(name.to_string()))?;

        let records: Vec<ParticleRecord> = template
            .particles
            .iter()
            .map(|p| ParticleRecord::new(&p.label, &p.element, Point3::from(p.position)))
            .collect();
        let bonds: Vec<(usize, usize)> = template.bonds.iter().map(|&[i, j]| (i, j)).collect();
        let root = system.load_fragment(name, &records, &bonds)?;

        let anchors: Vec<NodeId> = system.children(root).to_vec();
        for port in &template.ports {
            let result = system.add_port(
                anchors[port.anchor],
                &port.label,
                Vector3::from(port.direction),
                port.separation,
            );
            if let Err(e) = result {
                system.discard(root)?;
                return Err(e.into());
            }
        }
        Ok(root)
    }
}

#[derive(Debug, Error)]
pub enum FragmentLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid fragment '{fragment}': {message}")]
    Invalid { fragment: String, message: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum InstantiateError {
    #[error("Fragment '{0}' is not defined in the library")]
    UnknownFragment(String),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}
