use super::config::EngineConfig;
use crate::core::error::{AssemblyError, PortError, StructuralError};
use crate::core::models::ids::{NodeId, PortId};
use crate::core::models::system::MolecularSystem;
use crate::core::models::topology::Bond;
use crate::core::utils::geometry::minimal_rotation;
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use tracing::{debug, instrument};

/// What a successful [`join`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinOutcome {
    pub bond: Bond,
    /// The moving root, now grafted into the target tree.
    pub grafted: NodeId,
}

/// A fully validated join, ready to be committed without further checks.
#[derive(Debug, Clone)]
struct JoinPlan {
    moving_root: NodeId,
    from_port: PortId,
    to_port: PortId,
    from_anchor: NodeId,
    to_anchor: NodeId,
    rotation: Rotation3<f64>,
    translation: Vector3<f64>,
    attach_parent: NodeId,
    label: String,
}

/// Rotation of minimal angle that turns a port direction `from` to face `to` head-on,
/// i.e. maps `from` onto `-to`.
pub fn rotation_for_ports(
    from: &Unit<Vector3<f64>>,
    to: &Unit<Vector3<f64>>,
    tolerance: f64,
) -> Rotation3<f64> {
    minimal_rotation(from, &Unit::new_unchecked(-to.into_inner()), tolerance)
}

/// Joins the tree rooted at `moving_root` onto another tree through a pair of ports.
///
/// The moving tree is rotated so that `from_port` faces `to_port`, translated so the two
/// anchors sit `sep(from) + sep(to)` apart along the target port's axis, bonded anchor to
/// anchor, and grafted under `attach_parent` as `label`. Both ports are consumed. The
/// target tree's coordinates are never modified.
///
/// # Errors
///
/// * [`PortError::StalePort`] if either port is not registered.
/// * [`PortError::SelfOverlap`] if both ports share an anchor or a maximal assembly.
/// * [`StructuralError::ForeignParticle`] if `from_port` is not under `moving_root`, or
///   `attach_parent` is not in the target tree.
/// * [`StructuralError::InvalidOwnership`] if `moving_root` is not detached or
///   `attach_parent` is not a composite.
/// * [`StructuralError::DuplicateLabel`] if `label` is taken under `attach_parent`.
///
/// The system is unchanged on error.
#[instrument(skip_all, name = "join", fields(label = %label))]
pub fn join(
    system: &mut MolecularSystem,
    moving_root: NodeId,
    from_port: PortId,
    to_port: PortId,
    attach_parent: NodeId,
    label: &str,
    config: &EngineConfig,
) -> Result<JoinOutcome, AssemblyError> {
    let plan = plan_join(
        system,
        moving_root,
        from_port,
        to_port,
        attach_parent,
        label,
        config,
    )?;
    Ok(commit(system, plan))
}

fn plan_join(
    system: &MolecularSystem,
    moving_root: NodeId,
    from_port: PortId,
    to_port: PortId,
    attach_parent: NodeId,
    label: &str,
    config: &EngineConfig,
) -> Result<JoinPlan, AssemblyError> {
    let from = system.live_port(from_port)?;
    let to = system.live_port(to_port)?;
    system.live(moving_root)?;

    if from.anchor == to.anchor || system.root_of(from.anchor) == system.root_of(to.anchor) {
        return Err(PortError::SelfOverlap {
            from: from_port,
            to: to_port,
        }
        .into());
    }
    if !system.contains(moving_root, from.anchor) {
        return Err(StructuralError::ForeignParticle {
            particle: from.anchor,
        }
        .into());
    }
    if system.parent(moving_root).is_some() {
        return Err(StructuralError::InvalidOwnership {
            node: moving_root,
            reason: "only a detached root can be moved by a join".to_string(),
        }
        .into());
    }
    system.live(attach_parent)?;
    if system.root_of(attach_parent) != system.root_of(to.anchor) {
        return Err(StructuralError::ForeignParticle {
            particle: attach_parent,
        }
        .into());
    }
    system.validate_graft(attach_parent, moving_root, label)?;

    let from_position = anchor_position(system, from.anchor)?;
    let to_position = anchor_position(system, to.anchor)?;

    let rotation = rotation_for_ports(&from.direction, &to.direction, config.alignment_tolerance);
    let target = to_position - to.direction.into_inner() * (from.separation + to.separation);
    let translation = target - rotation * from_position;

    Ok(JoinPlan {
        moving_root,
        from_port,
        to_port,
        from_anchor: from.anchor,
        to_anchor: to.anchor,
        rotation,
        translation,
        attach_parent,
        label: label.to_string(),
    })
}

fn anchor_position(system: &MolecularSystem, anchor: NodeId) -> Result<Point3<f64>, AssemblyError> {
    system
        .live_particle(anchor)?
        .position()
        .ok_or_else(|| StructuralError::ForeignParticle { particle: anchor }.into())
}

fn commit(system: &mut MolecularSystem, plan: JoinPlan) -> JoinOutcome {
    system.transform(plan.moving_root, &plan.rotation, &plan.translation);
    let bond = system.link(plan.from_anchor, plan.to_anchor);
    system.unregister_port(plan.from_port);
    system.unregister_port(plan.to_port);
    system.graft(plan.attach_parent, plan.moving_root, &plan.label);

    debug!(
        "Joined '{}' under {:?} (rotation angle {:.4} rad)",
        plan.label,
        plan.attach_parent,
        plan.rotation.angle()
    );
    JoinOutcome {
        bond,
        grafted: plan.moving_root,
    }
}
