use crate::core::error::{AssemblyError, StructuralError};
use crate::core::models::ids::{NodeId, PortId};
use crate::core::models::system::MolecularSystem;
use crate::engine::config::{EngineConfig, GuestSpec, PolymerSpec};
use crate::engine::pattern::{join_copy, validate_guest};
use tracing::{info, instrument};

/// Builds a linear chain of `spec.count` monomer copies.
///
/// Copy `i` is joined through its head port onto the tail port of copy `i - 1`. The
/// optional caps are joined onto the head port of the first copy and the tail port of the
/// last. The result is a new detached composite labeled `spec.label` with children
/// `monomer[i]`, `cap-head` and `cap-tail`; the monomer and cap templates are unchanged.
///
/// # Errors
///
/// Returns [`StructuralError::KeyNotFound`] if a template lacks a requested port, and
/// [`StructuralError::InvalidOwnership`] if a template is not a detached root. Nothing is
/// left behind on error.
#[instrument(skip_all, name = "polymer_workflow", fields(label = %spec.label, count = spec.count))]
pub fn build(
    system: &mut MolecularSystem,
    spec: &PolymerSpec,
    config: &EngineConfig,
) -> Result<NodeId, AssemblyError> {
    let monomer = system.live(spec.monomer)?;
    if monomer.parent().is_some() {
        return Err(StructuralError::InvalidOwnership {
            node: spec.monomer,
            reason: "a monomer template must be a detached root".to_string(),
        }
        .into());
    }
    let head = monomer_port(system, spec.monomer, &spec.head_port)?;
    let tail = monomer_port(system, spec.monomer, &spec.tail_port)?;
    let head_cap = spec
        .head_cap
        .as_ref()
        .map(|cap| validate_guest(system, spec.monomer, cap).map(|port| (cap, port)))
        .transpose()?;
    let tail_cap = spec
        .tail_cap
        .as_ref()
        .map(|cap| validate_guest(system, spec.monomer, cap).map(|port| (cap, port)))
        .transpose()?;

    let polymer = system.transaction(|system| {
        let polymer = system.create_composite(&spec.label);
        grow(system, polymer, spec, head, tail, head_cap, tail_cap, config)?;
        Ok::<_, AssemblyError>(polymer)
    })?;

    info!(
        "Built polymer '{}' with {} monomer(s) and {} particle(s)",
        spec.label,
        spec.count,
        system.particle_count(polymer)
    );
    Ok(polymer)
}

fn monomer_port(
    system: &MolecularSystem,
    monomer: NodeId,
    label: &str,
) -> Result<PortId, AssemblyError> {
    system.find_port(monomer, label).ok_or_else(|| {
        StructuralError::KeyNotFound {
            key: label.to_string(),
        }
        .into()
    })
}

#[allow(clippy::too_many_arguments)]
fn grow(
    system: &mut MolecularSystem,
    polymer: NodeId,
    spec: &PolymerSpec,
    head: PortId,
    tail: PortId,
    head_cap: Option<(&GuestSpec, PortId)>,
    tail_cap: Option<(&GuestSpec, PortId)>,
    config: &EngineConfig,
) -> Result<(), AssemblyError> {
    let first = system.deep_copy(spec.monomer)?;
    system.add_child(polymer, first.root, "monomer[0]")?;
    let head_end = first.ports.get(&head).copied();
    let mut tail_end = first.ports.get(&tail).copied();

    let unit = GuestSpec::new(spec.monomer, &spec.head_port);
    for i in 1..spec.count {
        let Some(target) = tail_end else { break };
        let copy = join_copy(
            system,
            polymer,
            &unit,
            head,
            target,
            &format!("monomer[{}]", i),
            config,
        )?;
        tail_end = copy.ports.get(&tail).copied();
    }

    if let (Some((cap, port)), Some(target)) = (head_cap, head_end) {
        join_copy(system, polymer, cap, port, target, "cap-head", config)?;
    }
    if let (Some((cap, port)), Some(target)) = (tail_cap, tail_end) {
        join_copy(system, polymer, cap, port, target, "cap-tail", config)?;
    }
    Ok(())
}
