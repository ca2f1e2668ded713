use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "molbuild CLI - Assemble molecular structures from reusable fragments described in TOML recipes.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a structure from a recipe file and write it as XYZ.
    Build(BuildArgs),
    /// List the fragments defined in a fragment library.
    Inspect(InspectArgs),
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the recipe file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub recipe: PathBuf,

    /// Path for the output XYZ file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Override the seed of a random pattern from the recipe.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the repeat count of the build (e.g., the number of monomers).
    #[arg(short = 'n', long, value_name = "INT")]
    pub count: Option<usize>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to a fragment library in TOML format.
    #[arg(value_name = "PATH")]
    pub library: PathBuf,
}
