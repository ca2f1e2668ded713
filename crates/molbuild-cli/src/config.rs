use crate::cli::BuildArgs;
use crate::error::{CliError, Result};
use molbuild::core::library::{FragmentLibrary, FragmentTemplate};
use molbuild::core::models::port::SeparationPolicy;
use molbuild::engine::config::{EngineConfig, EngineConfigBuilder};
use molbuild::engine::pattern::{self, Domain, Pattern};
use molbuild::engine::tiling::Lattice;
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "policy")]
enum PartialSeparation {
    Fixed { value: f64 },
    BondLength,
    HalfBondLength,
}

impl From<PartialSeparation> for SeparationPolicy {
    fn from(p: PartialSeparation) -> Self {
        match p {
            PartialSeparation::Fixed { value } => SeparationPolicy::Fixed(value),
            PartialSeparation::BondLength => SeparationPolicy::BondLength,
            PartialSeparation::HalfBondLength => SeparationPolicy::HalfBondLength,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialEngineConfig {
    separation: Option<PartialSeparation>,
    #[serde(rename = "alignment-tolerance")]
    alignment_tolerance: Option<f64>,
}

/// A fragment from the library together with the port used to attach it.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FragmentRef {
    pub fragment: String,
    pub port: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum BuildSection {
    Fragment {
        name: String,
    },
    #[serde(rename_all = "kebab-case")]
    Polymer {
        label: Option<String>,
        monomer: String,
        head_port: String,
        tail_port: String,
        count: Option<usize>,
        head_cap: Option<FragmentRef>,
        tail_cap: Option<FragmentRef>,
    },
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum PointsSection {
    Random {
        count: usize,
        seed: Option<u64>,
        width: f64,
        height: f64,
        depth: Option<f64>,
    },
    Grid {
        nx: usize,
        ny: usize,
        width: f64,
        height: f64,
    },
    Sphere {
        count: usize,
        radius: f64,
    },
}

impl PointsSection {
    pub fn generate(&self) -> Pattern {
        match *self {
            Self::Random {
                count,
                seed,
                width,
                height,
                depth: None,
            } => pattern::generate(count, seed, &Domain::Rectangle { width, height }),
            Self::Random {
                count,
                seed,
                width,
                height,
                depth: Some(depth),
            } => pattern::generate(
                count,
                seed,
                &Domain::Cuboid {
                    extent: Vector3::new(width, height, depth),
                },
            ),
            Self::Grid {
                nx,
                ny,
                width,
                height,
            } => pattern::grid_2d(nx, ny, width, height),
            Self::Sphere { count, radius } => pattern::sphere(count, radius),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatternSection {
    pub points: PointsSection,
    pub guest: FragmentRef,
    pub backfill: Option<FragmentRef>,
    pub offset: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TileSection {
    pub counts: [usize; 3],
    /// Edge lengths of a box-shaped cell.
    pub cell: Option<[f64; 3]>,
    /// Full lattice vectors; takes precedence over `cell`.
    pub vectors: Option<[[f64; 3]; 3]>,
}

impl TileSection {
    pub fn lattice(&self) -> Result<Lattice> {
        match (self.vectors, self.cell) {
            (Some([a, b, c]), _) => Ok(Lattice::new(a.into(), b.into(), c.into())),
            (None, Some([a, b, c])) => Ok(Lattice::orthorhombic(a, b, c)),
            (None, None) => Err(CliError::Config(
                "`tile` requires either `cell` or `vectors`.".to_string(),
            )),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct PartialRecipe {
    engine: Option<PartialEngineConfig>,
    library: Option<PathBuf>,
    #[serde(default)]
    fragments: BTreeMap<String, FragmentTemplate>,
    build: BuildSection,
    pattern: Option<PatternSection>,
    tile: Option<TileSection>,
}

/// A recipe with every reference resolved and every override applied.
#[derive(Debug)]
pub struct Recipe {
    pub engine: EngineConfig,
    pub library: FragmentLibrary,
    pub build: BuildSection,
    pub pattern: Option<PatternSection>,
    pub tile: Option<TileSection>,
}

impl PartialRecipe {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading recipe from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut recipe: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        if let (Some(library), Some(dir)) = (recipe.library.as_mut(), path.parent()) {
            if library.is_relative() {
                *library = dir.join(&*library);
            }
        }
        Ok(recipe)
    }

    pub fn merge_with_cli(self, args: &BuildArgs) -> Result<Recipe> {
        let engine_config = self.engine.unwrap_or_default();
        let mut builder = EngineConfigBuilder::new();
        if let Some(separation) = engine_config.separation {
            builder = builder.separation(separation.into());
        }
        if let Some(tolerance) = engine_config.alignment_tolerance {
            builder = builder.alignment_tolerance(tolerance);
        }
        let engine = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mut fragments: BTreeMap<String, FragmentTemplate> = match &self.library {
            Some(path) => {
                debug!("Loading fragment library from {:?}", path);
                let library = FragmentLibrary::load(path)?;
                library
                    .names()
                    .filter_map(|name| Some((name.to_string(), library.get(name)?.clone())))
                    .collect()
            }
            None => BTreeMap::new(),
        };
        fragments.extend(self.fragments);
        let library = FragmentLibrary::from_templates(fragments)?;

        let mut build = self.build;
        if let Some(new_count) = args.count {
            match &mut build {
                BuildSection::Polymer { count, .. } => *count = Some(new_count),
                BuildSection::Fragment { .. } => {
                    return Err(CliError::Config(
                        "`--count` only applies to polymer builds.".to_string(),
                    ));
                }
            }
        }

        let mut pattern = self.pattern;
        if let Some(new_seed) = args.seed {
            match pattern.as_mut().map(|p| &mut p.points) {
                Some(PointsSection::Random { seed, .. }) => *seed = Some(new_seed),
                _ => {
                    return Err(CliError::Config(
                        "`--seed` requires a pattern with `type = \"random\"` points.".to_string(),
                    ));
                }
            }
        }

        Ok(Recipe {
            engine,
            library,
            build,
            pattern,
            tile: self.tile,
        })
    }
}
