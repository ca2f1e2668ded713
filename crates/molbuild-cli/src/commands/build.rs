use crate::cli::BuildArgs;
use crate::config::{BuildSection, FragmentRef, PartialRecipe, Recipe};
use crate::error::{CliError, Result};
use crate::output::write_xyz_file;
use molbuild::core::library::FragmentLibrary;
use molbuild::core::models::ids::NodeId;
use molbuild::core::models::system::MolecularSystem;
use molbuild::engine::config::{GuestSpec, PolymerSpecBuilder};
use molbuild::engine::pattern::{self, PatternDiscrepancy};
use molbuild::engine::tiling;
use molbuild::workflows::polymer;
use nalgebra::Vector3;
use tracing::{info, info_span};

pub fn run(args: BuildArgs) -> Result<()> {
    let span = info_span!("build", recipe = %args.recipe.display());
    let _guard = span.enter();

    let partial_recipe = PartialRecipe::from_file(&args.recipe)?;
    info!("Merging recipe with CLI arguments...");
    let recipe = partial_recipe.merge_with_cli(&args)?;
    info!(
        "Recipe ready with {} fragment(s) in the library.",
        recipe.library.len()
    );

    let mut system = MolecularSystem::with_separation_policy(recipe.engine.separation);
    let root = assemble(&mut system, &recipe)?;

    let view = system.flat_view(root);
    let label = system
        .node(root)
        .map(|node| node.label.clone())
        .unwrap_or_default();
    write_xyz_file(&args.output, &view, &format!("{} (molbuild)", label))?;

    info!("Wrote structure to {:?}", &args.output);
    println!(
        "Built '{}': {} particle(s), {} bond(s), {} open port(s) -> {}",
        label,
        view.particles.len(),
        view.bonds.len(),
        system.open_ports(root).len(),
        args.output.display()
    );
    Ok(())
}

/// Runs the build, pattern and tile stages of a recipe and returns the final root.
/// Templates instantiated along the way are discarded.
pub fn assemble(system: &mut MolecularSystem, recipe: &Recipe) -> Result<NodeId> {
    let mut root = match &recipe.build {
        BuildSection::Fragment { name } => recipe.library.instantiate(system, name)?,
        BuildSection::Polymer {
            label,
            monomer,
            head_port,
            tail_port,
            count,
            head_cap,
            tail_cap,
        } => {
            let mut templates = Vec::new();
            let monomer_root = recipe.library.instantiate(system, monomer)?;
            templates.push(monomer_root);

            let mut builder = PolymerSpecBuilder::new()
                .label(label.as_deref().unwrap_or(monomer))
                .monomer(monomer_root)
                .ports(head_port, tail_port);
            if let Some(count) = count {
                builder = builder.count(*count);
            }
            if let Some(cap) = head_cap {
                let spec = instantiate_guest(system, &recipe.library, cap)?;
                templates.push(spec.template);
                builder = builder.head_cap(spec);
            }
            if let Some(cap) = tail_cap {
                let spec = instantiate_guest(system, &recipe.library, cap)?;
                templates.push(spec.template);
                builder = builder.tail_cap(spec);
            }
            let spec = builder
                .build()
                .map_err(|e| CliError::Config(e.to_string()))?;

            let chain = polymer::build(system, &spec, &recipe.engine)?;
            discard_all(system, &templates)?;
            chain
        }
    };

    if let Some(section) = &recipe.pattern {
        let mut points = section.points.generate();
        if let Some(offset) = section.offset {
            points = points.translate(&Vector3::from(offset));
        }
        let guest = instantiate_guest(system, &recipe.library, &section.guest)?;
        let backfill = section
            .backfill
            .as_ref()
            .map(|fragment| instantiate_guest(system, &recipe.library, fragment))
            .transpose()?;

        let outcome = pattern::apply_to_host(
            system,
            &points,
            root,
            &guest,
            backfill.as_ref(),
            &recipe.engine,
        )?;
        if let Some(PatternDiscrepancy::InsufficientPorts { points, ports }) = outcome.discrepancy
        {
            println!(
                "Warning: pattern has {} points but only {} open ports; the extra points were skipped.",
                points, ports
            );
        }

        let mut templates = vec![guest.template];
        templates.extend(backfill.map(|spec| spec.template));
        discard_all(system, &templates)?;
    }

    if let Some(section) = &recipe.tile {
        let lattice = section.lattice()?;
        let tiled = tiling::tile(system, root, section.counts, &lattice)?;
        system.discard(root)?;
        root = tiled;
    }

    Ok(root)
}

fn instantiate_guest(
    system: &mut MolecularSystem,
    library: &FragmentLibrary,
    fragment: &FragmentRef,
) -> Result<GuestSpec> {
    let template = library.instantiate(system, &fragment.fragment)?;
    Ok(GuestSpec::new(template, &fragment.port))
}

fn discard_all(system: &mut MolecularSystem, templates: &[NodeId]) -> Result<()> {
    for &template in templates {
        system.discard(template)?;
    }
    Ok(())
}
