use super::alignment::join;
use super::config::{EngineConfig, GuestSpec};
use crate::core::error::{AssemblyError, StructuralError};
use crate::core::models::ids::{NodeId, PortId};
use crate::core::models::system::{CopyMap, MolecularSystem};
use nalgebra::{Point3, Vector3};
use rand::prelude::*;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// The region random patterns are drawn from, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Points in `[0, width) x [0, height)` on the z = 0 plane.
    Rectangle { width: f64, height: f64 },
    /// Points in the box `[0, extent.x) x [0, extent.y) x [0, extent.z)`.
    Cuboid { extent: Vector3<f64> },
}

/// An ordered set of points at which guests are attached to a host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pattern {
    points: Vec<Point3<f64>>,
}

impl Pattern {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Scales each coordinate axis independently about the origin.
    pub fn scale(mut self, factors: &Vector3<f64>) -> Self {
        for point in &mut self.points {
            point.coords.component_mul_assign(factors);
        }
        self
    }

    pub fn translate(mut self, offset: &Vector3<f64>) -> Self {
        for point in &mut self.points {
            *point += *offset;
        }
        self
    }
}

/// Draws `count` uniformly distributed points from `domain`.
///
/// The same `seed` always yields the same pattern. With `None` the generator is seeded
/// from the operating system and the result is not reproducible.
pub fn generate(count: usize, seed: Option<u64>, domain: &Domain) -> Pattern {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let points = (0..count)
        .map(|_| match domain {
            Domain::Rectangle { width, height } => {
                Point3::new(rng.r#gen::<f64>() * width, rng.r#gen::<f64>() * height, 0.0)
            }
            Domain::Cuboid { extent } => Point3::new(
                rng.r#gen::<f64>() * extent.x,
                rng.r#gen::<f64>() * extent.y,
                rng.r#gen::<f64>() * extent.z,
            ),
        })
        .collect();
    Pattern { points }
}

/// A regular `nx` by `ny` grid on the z = 0 plane, starting at the origin with spacing
/// `width / nx` and `height / ny`.
pub fn grid_2d(nx: usize, ny: usize, width: f64, height: f64) -> Pattern {
    let mut points = Vec::with_capacity(nx * ny);
    for i in 0..nx {
        for j in 0..ny {
            points.push(Point3::new(
                i as f64 * width / nx as f64,
                j as f64 * height / ny as f64,
                0.0,
            ));
        }
    }
    Pattern { points }
}

/// `count` nearly evenly spaced points on a sphere of `radius` centered at the origin
/// (Fibonacci lattice).
pub fn sphere(count: usize, radius: f64) -> Pattern {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    let points = (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / count as f64;
            let ring = (1.0 - y * y).max(0.0).sqrt();
            let phi = i as f64 * golden_angle;
            Point3::new(phi.cos() * ring, y, phi.sin() * ring) * radius
        })
        .collect();
    Pattern { points }
}

/// A mismatch between a pattern and its host that was resolved by dropping points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternDiscrepancy {
    InsufficientPorts { points: usize, ports: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternOutcome {
    /// Guest copies placed at pattern points, in point order.
    pub placed: Vec<NodeId>,
    /// Backfill copies placed on the ports left over.
    pub backfilled: Vec<NodeId>,
    pub discrepancy: Option<PatternDiscrepancy>,
}

/// Pairs pattern points with ports, in point order.
///
/// Each point takes the nearest port not yet taken, measured to the port's vacant site.
/// Equidistant ports resolve to the lowest index in `ports`. Points left over once every
/// port is taken are not returned.
pub fn assign_points(
    system: &MolecularSystem,
    points: &[Point3<f64>],
    ports: &[PortId],
) -> Vec<(usize, PortId)> {
    let sites: Vec<Option<Point3<f64>>> = ports.iter().map(|&id| system.port_site(id)).collect();
    let mut taken = vec![false; ports.len()];
    let mut assignments = Vec::new();

    for (point_index, point) in points.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;
        for (port_index, site) in sites.iter().enumerate() {
            let Some(site) = site else {
                continue;
            };
            if taken[port_index] {
                continue;
            }
            let distance = (site - point).norm_squared();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((port_index, distance));
            }
        }
        let Some((port_index, _)) = best else {
            break;
        };
        taken[port_index] = true;
        assignments.push((point_index, ports[port_index]));
    }
    assignments
}

/// Decorates `host` with copies of a guest at the pattern points, then fills every port
/// left over with copies of `backfill`.
///
/// Guest copies are grafted under `host` as `"{template label}[k]"`. When the pattern has
/// more points than the host has open ports, the surplus points are dropped and reported
/// in [`PatternOutcome::discrepancy`].
///
/// # Errors
///
/// Templates are validated before anything is copied: each must be a live, detached root
/// outside the host tree ([`StructuralError::InvalidOwnership`]) exposing a port with the
/// requested label ([`StructuralError::KeyNotFound`]). The host must be a composite, and
/// every open port under it must be anchored on a live particle of the host's tree
/// ([`StructuralError::ForeignParticle`]). The system is unchanged on error.
#[instrument(skip_all, name = "apply_pattern", fields(points = pattern.len()))]
pub fn apply_to_host(
    system: &mut MolecularSystem,
    pattern: &Pattern,
    host: NodeId,
    guest: &GuestSpec,
    backfill: Option<&GuestSpec>,
    config: &EngineConfig,
) -> Result<PatternOutcome, AssemblyError> {
    if !system.live(host)?.is_composite() {
        return Err(StructuralError::InvalidOwnership {
            node: host,
            reason: "a pattern host must be a composite".to_string(),
        }
        .into());
    }
    let guest_port = validate_guest(system, host, guest)?;
    let backfill_port = backfill
        .map(|spec| validate_guest(system, host, spec).map(|port| (spec, port)))
        .transpose()?;

    let host_ports = system.open_ports(host);
    let host_root = system.root_of(host);
    for &port in &host_ports {
        let anchor = system.live_port(port)?.anchor;
        system.live_particle(anchor)?;
        if system.root_of(anchor) != host_root {
            return Err(StructuralError::ForeignParticle { particle: anchor }.into());
        }
    }
    let assignments = assign_points(system, pattern.points(), &host_ports);

    let mut outcome = PatternOutcome::default();
    if pattern.len() > host_ports.len() {
        let discrepancy = PatternDiscrepancy::InsufficientPorts {
            points: pattern.len(),
            ports: host_ports.len(),
        };
        warn!(
            "Pattern has {} points but host has only {} open ports; {} points dropped",
            pattern.len(),
            host_ports.len(),
            pattern.len() - host_ports.len()
        );
        outcome.discrepancy = Some(discrepancy);
    }

    let (placed, backfilled) = system.transaction(|system| {
        let mut placed = Vec::with_capacity(assignments.len());
        let mut index = 0;
        for &(_, target) in &assignments {
            placed.push(attach_copy(
                system,
                host,
                guest,
                guest_port,
                target,
                &mut index,
                config,
            )?);
        }

        let mut backfilled = Vec::new();
        if let Some((spec, template_port)) = backfill_port {
            let used: HashSet<PortId> = assignments.iter().map(|&(_, port)| port).collect();
            let mut index = 0;
            for &target in host_ports.iter().filter(|port| !used.contains(port)) {
                backfilled.push(attach_copy(
                    system,
                    host,
                    spec,
                    template_port,
                    target,
                    &mut index,
                    config,
                )?);
            }
        }
        Ok::<_, AssemblyError>((placed, backfilled))
    })?;
    outcome.placed = placed;
    outcome.backfilled = backfilled;

    info!(
        "Placed {} guest(s) and {} backfill(s) on host",
        outcome.placed.len(),
        outcome.backfilled.len()
    );
    Ok(outcome)
}

/// Checks a guest template and returns its attachment port.
pub(crate) fn validate_guest(
    system: &MolecularSystem,
    host: NodeId,
    spec: &GuestSpec,
) -> Result<PortId, AssemblyError> {
    let template = system.live(spec.template)?;
    if template.parent().is_some() {
        return Err(StructuralError::InvalidOwnership {
            node: spec.template,
            reason: "a guest template must be a detached root".to_string(),
        }
        .into());
    }
    if system.root_of(host) == spec.template {
        return Err(StructuralError::InvalidOwnership {
            node: spec.template,
            reason: "a guest template cannot contain its host".to_string(),
        }
        .into());
    }
    system.find_port(spec.template, &spec.port).ok_or_else(|| {
        StructuralError::KeyNotFound {
            key: spec.port.clone(),
        }
        .into()
    })
}

/// Copies a guest template and joins the copy onto `target`, grafting it under `parent`
/// with the next free `"{template label}[k]"` label.
fn attach_copy(
    system: &mut MolecularSystem,
    parent: NodeId,
    spec: &GuestSpec,
    template_port: PortId,
    target: PortId,
    index: &mut usize,
    config: &EngineConfig,
) -> Result<NodeId, AssemblyError> {
    let base = system
        .node(spec.template)
        .map(|node| node.label.clone())
        .unwrap_or_default();
    let label = loop {
        let candidate = format!("{}[{}]", base, index);
        *index += 1;
        if !system.label_in_use(parent, &candidate) {
            break candidate;
        }
    };
    let copy = join_copy(system, parent, spec, template_port, target, &label, config)?;
    Ok(copy.root)
}

/// Deep-copies `spec.template` and joins the copy's `template_port` onto `target`,
/// grafting the copy under `parent` as `label`. The copy is discarded if the join fails.
///
/// The returned [`CopyMap`] maps template handles to the grafted copy's handles.
pub(crate) fn join_copy(
    system: &mut MolecularSystem,
    parent: NodeId,
    spec: &GuestSpec,
    template_port: PortId,
    target: PortId,
    label: &str,
    config: &EngineConfig,
) -> Result<CopyMap, AssemblyError> {
    let copy = system.deep_copy(spec.template)?;
    let Some(&from) = copy.ports.get(&template_port) else {
        system.discard(copy.root)?;
        return Err(StructuralError::KeyNotFound {
            key: spec.port.clone(),
        }
        .into());
    };
    if let Err(e) = join(system, copy.root, from, target, parent, label, config) {
        system.discard(copy.root)?;
        return Err(e);
    }
    Ok(copy)
}
