use crate::core::error::{AssemblyError, BondError, StructuralError};
use crate::core::models::ids::NodeId;
use crate::core::models::system::MolecularSystem;
use crate::engine::config::{EngineConfig, GuestSpec};
use crate::engine::pattern::{join_copy, validate_guest};
use tracing::{info, instrument};

/// Replaces a singly bonded particle with a copy of a fragment.
///
/// The particle is removed, which leaves a port on its former neighbor sized by
/// `config.separation`, and a copy of `guest` is joined into that vacancy and grafted as
/// `label` beside the neighbor.
///
/// # Errors
///
/// Returns [`BondError::AmbiguousRemoval`] unless the particle has exactly one bond,
/// [`StructuralError::DuplicateLabel`] if `label` is taken next to the neighbor (including
/// by the vacancy port itself), and the guest validation errors of
/// [`apply_to_host`](crate::engine::pattern::apply_to_host). The system is unchanged on
/// error.
#[instrument(skip_all, name = "substitute_workflow", fields(label = %label))]
pub fn replace(
    system: &mut MolecularSystem,
    particle: NodeId,
    guest: &GuestSpec,
    label: &str,
    config: &EngineConfig,
) -> Result<NodeId, AssemblyError> {
    let node = system.live_particle(particle)?;
    let (particle_parent, particle_label) = (node.parent(), node.label.clone());
    let neighbors = system.bonded_neighbors(particle).unwrap_or(&[]);
    let &[neighbor] = neighbors else {
        return Err(BondError::AmbiguousRemoval {
            particle,
            bond_count: neighbors.len(),
        }
        .into());
    };
    let owner = system
        .parent(neighbor)
        .ok_or_else(|| StructuralError::InvalidOwnership {
            node: neighbor,
            reason: "the remaining neighbor has no parent to hold the substituent".to_string(),
        })?;
    let freed = particle_parent == Some(owner) && particle_label == label;
    if system.label_in_use(owner, label) && !freed {
        return Err(StructuralError::DuplicateLabel {
            parent: owner,
            label: label.to_string(),
        }
        .into());
    }
    let template_port = validate_guest(system, particle, guest)?;

    // The vacancy port joins the owner's label scope, so the graft can still collide.
    let copy = system.transaction(|system| {
        let vacancy = system
            .remove_particle_with_policy(particle, config.separation)?
            .ok_or(BondError::AmbiguousRemoval {
                particle,
                bond_count: 0,
            })?;
        join_copy(system, owner, guest, template_port, vacancy, label, config)
    })?;

    info!("Replaced '{}' with a copy of the guest", particle_label);
    Ok(copy.root)
}
