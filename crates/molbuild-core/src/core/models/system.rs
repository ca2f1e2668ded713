use super::ids::{NodeId, PortId};
use super::node::{Node, NodeKind};
use super::port::{Port, SeparationPolicy};
use super::topology::Bond;
use crate::core::error::{AssemblyError, BondError, PortError, StructuralError};
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const MIN_DIRECTION_NORM: f64 = 1e-12;
const AUTO_PORT_LABEL: &str = "port";

/// The arena holding every structural tree, bond and port of a modeling session.
///
/// Several independent trees may live in one system at once: fragments under
/// construction, templates to be copied, and the assemblies built from them. All
/// cross-references (parents, bond endpoints, port anchors) are stable [`NodeId`] and
/// [`PortId`] handles, so grafting or copying a subtree never leaves a dangling alias.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for structural nodes.
    nodes: SlotMap<NodeId, Node>,
    /// Registry of open ports. Consumed ports are removed, which invalidates their keys.
    ports: SlotMap<PortId, Port>,
    /// List of all bonds in the system, in insertion order.
    bonds: Vec<Bond>,
    /// Cached adjacency list for bond connectivity, indexed by particle ID.
    bond_adjacency: SecondaryMap<NodeId, Vec<NodeId>>,
    /// How the separation of ports created by particle removal is chosen.
    separation_policy: SeparationPolicy,
}

/// The result of [`MolecularSystem::deep_copy`]: the new root plus old-to-new handle maps.
#[derive(Debug, Clone, Default)]
pub struct CopyMap {
    pub root: NodeId,
    pub nodes: HashMap<NodeId, NodeId>,
    pub ports: HashMap<PortId, PortId>,
}

impl MolecularSystem {
    /// Creates a new, empty system with the default separation policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty system using `policy` for ports created by particle removal.
    pub fn with_separation_policy(policy: SeparationPolicy) -> Self {
        Self {
            separation_policy: policy,
            ..Self::default()
        }
    }

    pub fn separation_policy(&self) -> SeparationPolicy {
        self.separation_policy
    }

    pub fn set_separation_policy(&mut self, policy: SeparationPolicy) {
        self.separation_policy = policy;
    }

    /// Runs `action` against the system and restores the prior state if it fails.
    ///
    /// Multi-step edits (a removal followed by a join, a chain of joins) use this so that
    /// a failure part way through leaves nothing behind. Handles issued before the call
    /// remain valid after a rollback.
    pub fn transaction<F, R, E>(&mut self, action: F) -> Result<R, E>
    where
        F: FnOnce(&mut Self) -> Result<R, E>,
    {
        let snapshot = self.clone();
        let result = action(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    // --- Structure tree ---

    /// Retrieves an immutable reference to a node by its ID.
    ///
    /// # Return
    ///
    /// Returns `Some(&Node)` if the node exists, otherwise `None`.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn live(&self, id: NodeId) -> Result<&Node, StructuralError> {
        self.nodes.get(id).ok_or(StructuralError::StaleNode(id))
    }

    pub(crate) fn live_particle(&self, id: NodeId) -> Result<&Node, StructuralError> {
        match self.nodes.get(id) {
            Some(node) if node.is_particle() => Ok(node),
            _ => Err(StructuralError::ForeignParticle { particle: id }),
        }
    }

    /// Returns the number of live nodes across every tree in the system.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Creates a detached particle. It becomes the root of its own single-node tree.
    pub fn create_particle(&mut self, label: &str, position: Point3<f64>, element: &str) -> NodeId {
        let id = self.nodes.insert(Node::particle(label, position, element));
        self.bond_adjacency.insert(id, Vec::new());
        id
    }

    /// Creates a detached, empty composite.
    pub fn create_composite(&mut self, label: &str) -> NodeId {
        self.nodes.insert(Node::composite(label))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Returns the children of a node in insertion order; empty for particles and unknown IDs.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|node| node.children()).unwrap_or(&[])
    }

    pub fn child(&self, parent: NodeId, label: &str) -> Option<NodeId> {
        self.nodes.get(parent)?.child_by_label(label)
    }

    /// Walks up the parent chain to the root of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Returns `true` if `node` is `ancestor` itself or lies anywhere beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Returns `true` if `label` names a child or a port in the scope of `parent`.
    pub fn label_in_use(&self, parent: NodeId, label: &str) -> bool {
        let Some(node) = self.nodes.get(parent) else {
            return false;
        };
        node.child_by_label(label).is_some()
            || node
                .ports
                .iter()
                .any(|&port_id| self.ports.get(port_id).is_some_and(|p| p.label == label))
    }

    /// Returns `base` if it is free in `parent`'s scope, otherwise the first free `base[k]`.
    pub fn unique_label(&self, parent: NodeId, base: &str) -> String {
        if !self.label_in_use(parent, base) {
            return base.to_string();
        }
        (1..)
            .map(|k| format!("{}[{}]", base, k))
            .find(|candidate| !self.label_in_use(parent, candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Adds a detached node as a child of `parent` under `label`.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::DuplicateLabel`] if the label is taken in the parent's
    /// scope, and [`StructuralError::InvalidOwnership`] if `node` already has a parent, if
    /// `parent` is a particle, or if the insertion would create a cycle.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        node: NodeId,
        label: &str,
    ) -> Result<(), AssemblyError> {
        self.validate_graft(parent, node, label)?;
        self.graft(parent, node, label);
        Ok(())
    }

    pub(crate) fn validate_graft(
        &self,
        parent: NodeId,
        node: NodeId,
        label: &str,
    ) -> Result<(), StructuralError> {
        let parent_node = self.live(parent)?;
        let child_node = self.live(node)?;

        if !parent_node.is_composite() {
            return Err(StructuralError::InvalidOwnership {
                node: parent,
                reason: "a particle cannot own children".to_string(),
            });
        }
        if child_node.parent.is_some() {
            return Err(StructuralError::InvalidOwnership {
                node,
                reason: "node already has a parent".to_string(),
            });
        }
        if self.contains(node, parent) {
            return Err(StructuralError::InvalidOwnership {
                node,
                reason: "node is an ancestor of the requested parent".to_string(),
            });
        }
        if self.label_in_use(parent, label) {
            return Err(StructuralError::DuplicateLabel {
                parent,
                label: label.to_string(),
            });
        }
        Ok(())
    }

    /// Infallible half of [`add_child`](Self::add_child); callers validate first.
    pub(crate) fn graft(&mut self, parent: NodeId, node: NodeId, label: &str) {
        if let Some(child) = self.nodes.get_mut(node) {
            child.parent = Some(parent);
            child.label = label.to_string();
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.insert_child(label, node);
        }
    }

    /// Detaches the child labeled `label` from `parent`; the subtree becomes a new root.
    ///
    /// Bonds that cross the cut are dropped so that every bond stays within one tree, and
    /// ports whose anchor and owner end up in different trees are unregistered.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::KeyNotFound`] if `parent` has no such child.
    pub fn remove_child(&mut self, parent: NodeId, label: &str) -> Result<NodeId, AssemblyError> {
        let child = self
            .live(parent)?
            .child_by_label(label)
            .ok_or_else(|| StructuralError::KeyNotFound {
                key: label.to_string(),
            })?;

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.take_child(label);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }

        let inside: HashSet<NodeId> = self.descendants(child).collect();
        let severed: Vec<Bond> = self
            .bonds
            .iter()
            .filter(|bond| inside.contains(&bond.a) != inside.contains(&bond.b))
            .copied()
            .collect();
        for bond in &severed {
            self.unlink(bond);
        }
        let stranded: Vec<PortId> = self
            .ports
            .iter()
            .filter(|(_, port)| inside.contains(&port.anchor) != inside.contains(&port.owner))
            .map(|(id, _)| id)
            .collect();
        for &id in &stranded {
            self.unregister_port(id);
        }
        if !severed.is_empty() || !stranded.is_empty() {
            debug!(
                "Detaching '{}' severed {} bond(s) and {} port(s) crossing the cut.",
                label,
                severed.len(),
                stranded.len()
            );
        }

        Ok(child)
    }

    /// Returns a lazy pre-order iterator over `root` and every node beneath it.
    ///
    /// The iterator is finite and can be restarted by calling this method again.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let stack = if self.nodes.contains_key(root) {
            vec![root]
        } else {
            Vec::new()
        };
        Descendants {
            system: self,
            stack,
        }
    }

    /// Returns a lazy depth-first iterator over the particles (leaves) under `root`.
    pub fn particles(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(root)
            .filter(move |&id| self.nodes.get(id).is_some_and(Node::is_particle))
    }

    pub fn particle_count(&self, root: NodeId) -> usize {
        self.particles(root).count()
    }

    /// Resolves a `/`-separated label path relative to `root` (e.g., `"monomer[2]/C"`).
    ///
    /// Empty segments are ignored, so `""` resolves to `root` itself.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::KeyNotFound`] naming the path up to the first missing segment.
    pub fn find(&self, root: NodeId, path: &str) -> Result<NodeId, StructuralError> {
        let mut current = self.live(root).map(|_| root)?;
        let mut walked: Vec<&str> = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            walked.push(segment);
            current = self
                .child(current, segment)
                .ok_or_else(|| StructuralError::KeyNotFound {
                    key: walked.join("/"),
                })?;
        }
        Ok(current)
    }

    /// Returns the label path of `id` relative to its root, such that
    /// `find(root_of(id), &path_of(id)) == id`.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut labels = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if let Some(node) = self.nodes.get(current) {
                labels.push(node.label.as_str());
            }
            current = parent;
        }
        labels.reverse();
        labels.join("/")
    }

    /// Removes a detached tree from the system together with its bonds and ports.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::InvalidOwnership`] if `root` still has a parent.
    pub fn discard(&mut self, root: NodeId) -> Result<(), AssemblyError> {
        if self.live(root)?.parent.is_some() {
            return Err(StructuralError::InvalidOwnership {
                node: root,
                reason: "only detached trees can be discarded".to_string(),
            }
            .into());
        }

        let doomed: HashSet<NodeId> = self.descendants(root).collect();
        self.bonds
            .retain(|bond| !doomed.contains(&bond.a) && !doomed.contains(&bond.b));
        self.ports
            .retain(|_, port| !doomed.contains(&port.owner) && !doomed.contains(&port.anchor));
        for id in doomed {
            self.nodes.remove(id);
            self.bond_adjacency.remove(id);
        }
        Ok(())
    }

    // --- Bond graph ---

    /// Adds a bond between two particles of the same tree.
    ///
    /// # Errors
    ///
    /// Returns [`BondError::SelfBond`] if `a == b`, [`StructuralError::ForeignParticle`] if
    /// an endpoint is not a live particle or the endpoints belong to different trees, and
    /// [`BondError::DuplicateBond`] if the bond already exists.
    pub fn add_bond(&mut self, a: NodeId, b: NodeId) -> Result<(), AssemblyError> {
        if a == b {
            return Err(BondError::SelfBond(a).into());
        }
        self.live_particle(a)?;
        self.live_particle(b)?;
        if self.root_of(a) != self.root_of(b) {
            return Err(StructuralError::ForeignParticle { particle: b }.into());
        }
        if self.has_bond(a, b) {
            return Err(BondError::DuplicateBond { a, b }.into());
        }
        self.link(a, b);
        Ok(())
    }

    /// Infallible bond insertion; callers validate first.
    pub(crate) fn link(&mut self, a: NodeId, b: NodeId) -> Bond {
        let bond = Bond::new(a, b);
        self.bonds.push(bond);
        if let Some(adjacency) = self.bond_adjacency.get_mut(a) {
            adjacency.push(b);
        }
        if let Some(adjacency) = self.bond_adjacency.get_mut(b) {
            adjacency.push(a);
        }
        bond
    }

    fn unlink(&mut self, bond: &Bond) {
        if let Some(index) = self.bonds.iter().position(|existing| existing == bond) {
            self.bonds.remove(index);
        }
        if let Some(adjacency) = self.bond_adjacency.get_mut(bond.a) {
            adjacency.retain(|&id| id != bond.b);
        }
        if let Some(adjacency) = self.bond_adjacency.get_mut(bond.b) {
            adjacency.retain(|&id| id != bond.a);
        }
    }

    /// Removes the bond between `a` and `b`, preserving the order of the remaining bonds.
    ///
    /// # Errors
    ///
    /// Returns [`BondError::BondNotFound`] if the particles are not bonded.
    pub fn remove_bond(&mut self, a: NodeId, b: NodeId) -> Result<(), AssemblyError> {
        if !self.has_bond(a, b) {
            return Err(BondError::BondNotFound { a, b }.into());
        }
        self.unlink(&Bond::new(a, b));
        Ok(())
    }

    pub fn has_bond(&self, a: NodeId, b: NodeId) -> bool {
        self.bond_adjacency
            .get(a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }

    /// Returns a lazy iterator over every bond in the system, in insertion order.
    pub fn bonds(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.iter()
    }

    /// Returns the bonds whose endpoints both lie under `root`.
    pub fn bonds_under(&self, root: NodeId) -> impl Iterator<Item = &Bond> {
        self.bonds
            .iter()
            .filter(move |bond| self.contains(root, bond.a) && self.contains(root, bond.b))
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Retrieves the bonded neighbors of a particle, in bonding order.
    ///
    /// # Return
    ///
    /// Returns `Some(&[NodeId])` if the particle exists, otherwise `None`.
    pub fn bonded_neighbors(&self, particle: NodeId) -> Option<&[NodeId]> {
        self.bond_adjacency.get(particle).map(|v| v.as_slice())
    }

    /// Returns the set of particles bonded to `particle` (empty for unknown handles).
    pub fn neighbors(&self, particle: NodeId) -> HashSet<NodeId> {
        self.bonded_neighbors(particle)
            .map(|neighbors| neighbors.iter().copied().collect())
            .unwrap_or_default()
    }

    // --- Port registry ---

    /// Registers a port anchored on `anchor`, owned by the anchor's parent.
    ///
    /// # Arguments
    ///
    /// * `anchor` - The particle carrying the open valence.
    /// * `label` - Label of the port, unique within the owner's scope.
    /// * `direction` - Vector from the vacant site toward the anchor; normalized here.
    /// * `separation` - Distance from the anchor to the vacant site, in Angstroms.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::InvalidOwnership`] if the anchor has no parent,
    /// [`StructuralError::DuplicateLabel`] on a scope collision, and
    /// [`AssemblyError::InvalidGeometry`] for a zero direction or non-positive separation.
    pub fn add_port(
        &mut self,
        anchor: NodeId,
        label: &str,
        direction: Vector3<f64>,
        separation: f64,
    ) -> Result<PortId, AssemblyError> {
        let owner = self
            .live_particle(anchor)?
            .parent
            .ok_or_else(|| StructuralError::InvalidOwnership {
                node: anchor,
                reason: "a port anchor must have a parent to own the port".to_string(),
            })?;
        let direction = validate_port_geometry(&direction, separation)?;
        if self.label_in_use(owner, label) {
            return Err(StructuralError::DuplicateLabel {
                parent: owner,
                label: label.to_string(),
            }
            .into());
        }
        Ok(self.register_port(Port::new(label, anchor, owner, direction, separation)))
    }

    fn register_port(&mut self, port: Port) -> PortId {
        let owner = port.owner;
        let id = self.ports.insert(port);
        if let Some(node) = self.nodes.get_mut(owner) {
            node.ports.push(id);
        }
        id
    }

    /// Retrieves a registered port by its ID.
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id)
    }

    pub(crate) fn live_port(&self, id: PortId) -> Result<&Port, PortError> {
        self.ports.get(id).ok_or(PortError::StalePort(id))
    }

    /// Finds a port by label among the ports owned directly by `owner`.
    pub fn port_by_label(&self, owner: NodeId, label: &str) -> Option<PortId> {
        self.nodes.get(owner)?.ports.iter().copied().find(|&id| {
            self.ports
                .get(id)
                .is_some_and(|port| port.label == label)
        })
    }

    /// Finds the first port labeled `label` anywhere under `root`, in [`open_ports`](Self::open_ports) order.
    pub fn find_port(&self, root: NodeId, label: &str) -> Option<PortId> {
        self.open_ports(root).into_iter().find(|&id| {
            self.ports
                .get(id)
                .is_some_and(|port| port.label == label)
        })
    }

    /// Collects the open ports under `root`: owners in pre-order, then registration order.
    ///
    /// This order defines the port index used for deterministic tie-breaking.
    pub fn open_ports(&self, root: NodeId) -> Vec<PortId> {
        self.descendants(root)
            .filter_map(|id| self.nodes.get(id))
            .flat_map(|node| node.ports.iter().copied())
            .filter(|&id| self.ports.contains_key(id))
            .collect()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Returns the location of a port's vacant site.
    pub fn port_site(&self, id: PortId) -> Option<Point3<f64>> {
        let port = self.ports.get(id)?;
        let anchor = self.nodes.get(port.anchor)?.position()?;
        Some(port.site(&anchor))
    }

    /// Unregisters a port.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::StalePort`] if the port is not registered.
    pub fn remove_port(&mut self, id: PortId) -> Result<Port, AssemblyError> {
        Ok(self.unregister_port(id).ok_or(PortError::StalePort(id))?)
    }

    /// Infallible half of [`remove_port`](Self::remove_port); `None` if already gone.
    pub(crate) fn unregister_port(&mut self, id: PortId) -> Option<Port> {
        let port = self.ports.remove(id)?;
        if let Some(owner) = self.nodes.get_mut(port.owner) {
            owner.ports.retain(|&existing| existing != id);
        }
        Some(port)
    }

    /// Removes a particle, leaving a port on its neighbor if it was singly bonded.
    ///
    /// 1. More than one bond: fails, because the vacancy direction is undefined.
    /// 2. Exactly one bond to `n`: the bond is removed and a port anchored on `n` is
    ///    registered under `n`'s parent, pointing from the removed particle toward `n`,
    ///    with a separation chosen by the system's [`SeparationPolicy`].
    /// 3. No bonds: no port is created.
    /// 4. The particle is detached and freed, along with any port anchored on it.
    ///
    /// # Return
    ///
    /// The port left behind, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BondError::AmbiguousRemoval`] for multiply-bonded particles and
    /// [`StructuralError::ForeignParticle`] if `particle` is not a live particle. The system
    /// is unchanged on error.
    pub fn remove_particle(&mut self, particle: NodeId) -> Result<Option<PortId>, AssemblyError> {
        self.remove_particle_with_policy(particle, self.separation_policy)
    }

    /// [`remove_particle`](Self::remove_particle) with an explicit separation policy in
    /// place of the system's own.
    pub fn remove_particle_with_policy(
        &mut self,
        particle: NodeId,
        policy: SeparationPolicy,
    ) -> Result<Option<PortId>, AssemblyError> {
        let node = self.live_particle(particle)?;
        let removed_position = node.position().unwrap_or_else(Point3::origin);
        let parent = node.parent;
        let label = node.label.clone();

        let neighbors = self.bonded_neighbors(particle).unwrap_or(&[]).to_vec();
        if neighbors.len() > 1 {
            return Err(BondError::AmbiguousRemoval {
                particle,
                bond_count: neighbors.len(),
            }
            .into());
        }

        // Plan the replacement port before touching any state.
        let planned_port = match neighbors.first() {
            Some(&neighbor) => {
                let neighbor_node = self.live_particle(neighbor)?;
                let owner =
                    neighbor_node
                        .parent
                        .ok_or_else(|| StructuralError::InvalidOwnership {
                            node: neighbor,
                            reason: "the remaining neighbor has no parent to own the port"
                                .to_string(),
                        })?;
                let neighbor_position = neighbor_node.position().unwrap_or_else(Point3::origin);
                let bond_vector = neighbor_position - removed_position;
                let separation = policy.separation_for(bond_vector.norm());
                let direction = validate_port_geometry(&bond_vector, separation)?;
                Some((neighbor, owner, direction, separation))
            }
            None => None,
        };

        // --- Commit ---
        if let Some(&neighbor) = neighbors.first() {
            self.unlink(&Bond::new(particle, neighbor));
        }
        if let Some(parent) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.take_child(&label);
            }
        }
        let orphaned: Vec<PortId> = self
            .ports
            .iter()
            .filter(|(_, port)| port.anchor == particle || port.owner == particle)
            .map(|(id, _)| id)
            .collect();
        for id in orphaned {
            self.unregister_port(id);
        }
        self.nodes.remove(particle);
        self.bond_adjacency.remove(particle);

        let created = planned_port.map(|(neighbor, owner, direction, separation)| {
            let port_label = self.unique_label(owner, AUTO_PORT_LABEL);
            self.register_port(Port::new(
                &port_label,
                neighbor,
                owner,
                direction,
                separation,
            ))
        });

        debug!(
            "Removed particle '{}'; vacancy port created: {}",
            label,
            created.is_some()
        );
        Ok(created)
    }

    // --- Copying and rigid motion ---

    /// Copies the tree rooted at `root` into a new detached tree.
    ///
    /// Nodes, positions, the bonds internal to the subtree, and the ports owned within it
    /// are all duplicated. Bonds leaving the subtree are not.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::StaleNode`] if `root` does not exist.
    pub fn deep_copy(&mut self, root: NodeId) -> Result<CopyMap, AssemblyError> {
        self.live(root)?;
        let originals: Vec<NodeId> = self.descendants(root).collect();
        let mut copy = CopyMap::default();

        for &old_id in &originals {
            let Some(old) = self.nodes.get(old_id) else {
                continue;
            };
            let mut fresh = match &old.kind {
                NodeKind::Particle { position, element } => {
                    Node::particle(&old.label, *position, element)
                }
                NodeKind::Composite { .. } => Node::composite(&old.label),
            };
            let new_parent = if old_id == root {
                None
            } else {
                old.parent.and_then(|p| copy.nodes.get(&p).copied())
            };
            fresh.parent = new_parent;
            let label = fresh.label.clone();
            let is_particle = fresh.is_particle();

            let new_id = self.nodes.insert(fresh);
            if is_particle {
                self.bond_adjacency.insert(new_id, Vec::new());
            }
            if let Some(parent_id) = new_parent {
                if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                    parent_node.insert_child(&label, new_id);
                }
            }
            copy.nodes.insert(old_id, new_id);
        }
        copy.root = copy.nodes.get(&root).copied().unwrap_or(root);

        let internal_bonds: Vec<(NodeId, NodeId)> = self
            .bonds
            .iter()
            .filter_map(|bond| Some((*copy.nodes.get(&bond.a)?, *copy.nodes.get(&bond.b)?)))
            .collect();
        for (a, b) in internal_bonds {
            self.link(a, b);
        }

        let owned_ports: Vec<(PortId, Port)> = originals
            .iter()
            .filter_map(|id| self.nodes.get(*id))
            .flat_map(|node| node.ports.iter().copied())
            .filter_map(|id| self.ports.get(id).map(|port| (id, port.clone())))
            .collect();
        for (old_port_id, port) in owned_ports {
            let (Some(&anchor), Some(&owner)) =
                (copy.nodes.get(&port.anchor), copy.nodes.get(&port.owner))
            else {
                continue;
            };
            let new_port_id = self.register_port(Port {
                anchor,
                owner,
                ..port
            });
            copy.ports.insert(old_port_id, new_port_id);
        }

        Ok(copy)
    }

    /// Translates every particle under `root` by `offset`.
    pub fn translate(&mut self, root: NodeId, offset: &Vector3<f64>) {
        self.transform(root, &Rotation3::identity(), offset);
    }

    /// Applies `x -> rotation * x + translation` to every particle under `root`, and the
    /// rotation to the directions of every port owned under `root`.
    pub fn transform(
        &mut self,
        root: NodeId,
        rotation: &Rotation3<f64>,
        translation: &Vector3<f64>,
    ) {
        let members: Vec<NodeId> = self.descendants(root).collect();
        let mut port_ids = Vec::new();
        for id in members {
            if let Some(node) = self.nodes.get_mut(id) {
                if let Some(position) = node.position() {
                    node.set_position(rotation * position + *translation);
                }
                port_ids.extend(node.ports.iter().copied());
            }
        }
        for id in port_ids {
            if let Some(port) = self.ports.get_mut(id) {
                port.direction = Unit::new_normalize(rotation * port.direction.into_inner());
            }
        }
    }

    /// Returns the unweighted mean position of the particles under `root`.
    pub fn centroid(&self, root: NodeId) -> Option<Point3<f64>> {
        let positions: Vec<Point3<f64>> = self
            .particles(root)
            .filter_map(|id| self.nodes.get(id)?.position())
            .collect();
        if positions.is_empty() {
            return None;
        }
        let sum = positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / positions.len() as f64))
    }

    pub(crate) fn set_particle_position(&mut self, id: NodeId, position: Point3<f64>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_position(position);
        }
    }
}

/// Lazy pre-order walk over a subtree. See [`MolecularSystem::descendants`].
pub struct Descendants<'a> {
    system: &'a MolecularSystem,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let Some(node) = self.system.nodes.get(id) {
            self.stack.extend(node.children().iter().rev().copied());
        }
        Some(id)
    }
}

fn validate_port_geometry(
    direction: &Vector3<f64>,
    separation: f64,
) -> Result<Unit<Vector3<f64>>, AssemblyError> {
    if !separation.is_finite() || separation <= 0.0 {
        return Err(AssemblyError::InvalidGeometry(format!(
            "port separation must be positive, got {}",
            separation
        )));
    }
    Unit::try_new(*direction, MIN_DIRECTION_NORM).ok_or_else(|| {
        AssemblyError::InvalidGeometry("port direction must be a non-zero vector".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ethane {
        system: MolecularSystem,
        root: NodeId,
        c1: NodeId,
        c2: NodeId,
        h1: NodeId,
    }

    fn create_ethane_fragment() -> Ethane {
        let mut system = MolecularSystem::new();
        let root = system.create_composite("ethane");
        let c1 = system.create_particle("C1", Point3::new(0.0, 0.0, 0.0), "C");
        let c2 = system.create_particle("C2", Point3::new(1.54, 0.0, 0.0), "C");
        let h1 = system.create_particle("H1", Point3::new(-1.09, 0.0, 0.0), "H");
        system.add_child(root, c1, "C1").unwrap();
        system.add_child(root, c2, "C2").unwrap();
        system.add_child(root, h1, "H1").unwrap();
        system.add_bond(c1, c2).unwrap();
        system.add_bond(c1, h1).unwrap();
        Ethane {
            system,
            root,
            c1,
            c2,
            h1,
        }
    }

    fn assert_parent_links_consistent(system: &MolecularSystem, root: NodeId) {
        for id in system.descendants(root) {
            for &child in system.children(id) {
                assert_eq!(system.parent(child), Some(id));
            }
        }
    }

    mod structure_tree {
        use super::*;

        #[test]
        fn failed_transaction_restores_every_change() {
            let Ethane {
                mut system,
                root,
                c1,
                c2,
                h1,
            } = create_ethane_fragment();
            system
                .add_port(c2, "east", Vector3::new(-1.0, 0.0, 0.0), 0.77)
                .unwrap();
            let (nodes, bonds, ports) = (system.node_count(), system.bond_count(), system.port_count());

            let result: Result<(), AssemblyError> = system.transaction(|system| {
                system.remove_particle(h1)?;
                system.translate(root, &Vector3::new(5.0, 0.0, 0.0));
                let extra = system.create_particle("X", Point3::origin(), "C");
                system.add_child(root, extra, "C1")
            });

            assert!(matches!(
                result,
                Err(AssemblyError::Structural(StructuralError::DuplicateLabel { .. }))
            ));
            assert_eq!(system.node_count(), nodes);
            assert_eq!(system.bond_count(), bonds);
            assert_eq!(system.port_count(), ports);
            assert!(system.has_bond(c1, h1));
            assert_eq!(system.find(root, "H1"), Ok(h1));
            assert_eq!(system.node(c1).unwrap().position(), Some(Point3::origin()));
        }

        #[test]
        fn successful_transaction_keeps_its_changes() {
            let Ethane {
                mut system, root, h1, ..
            } = create_ethane_fragment();
            let port = system
                .transaction(|system| system.remove_particle(h1))
                .unwrap();
            assert!(port.is_some());
            assert!(system.node(h1).is_none());
            assert_eq!(system.open_ports(root).len(), 1);
        }

        #[test]
        fn add_child_sets_parent_and_label() {
            let mut system = MolecularSystem::new();
            let root = system.create_composite("root");
            let atom = system.create_particle("tmp", Point3::origin(), "C");
            system.add_child(root, atom, "C").unwrap();

            assert_eq!(system.parent(atom), Some(root));
            assert_eq!(system.node(atom).unwrap().label, "C");
            assert_eq!(system.child(root, "C"), Some(atom));
            assert_eq!(system.root_of(atom), root);
        }

        #[test]
        fn add_child_rejects_duplicate_label() {
            let Ethane {
                mut system, root, ..
            } = create_ethane_fragment();
            let extra = system.create_particle("C1", Point3::origin(), "C");
            let err = system.add_child(root, extra, "C1").unwrap_err();
            assert_eq!(
                err,
                AssemblyError::Structural(StructuralError::DuplicateLabel {
                    parent: root,
                    label: "C1".to_string()
                })
            );
            assert_eq!(system.parent(extra), None);
        }

        #[test]
        fn add_child_rejects_node_with_parent() {
            let Ethane {
                mut system, c1, ..
            } = create_ethane_fragment();
            let other = system.create_composite("other");
            let err = system.add_child(other, c1, "C").unwrap_err();
            assert!(matches!(
                err,
                AssemblyError::Structural(StructuralError::InvalidOwnership { .. })
            ));
        }

        #[test]
        fn add_child_rejects_cycles_and_particle_parents() {
            let mut system = MolecularSystem::new();
            let outer = system.create_composite("outer");
            let inner = system.create_composite("inner");
            system.add_child(outer, inner, "inner").unwrap();
            assert!(system.add_child(inner, outer, "outer").is_err());
            assert!(system.add_child(outer, outer, "self").is_err());

            let atom = system.create_particle("C", Point3::origin(), "C");
            let lonely = system.create_particle("H", Point3::origin(), "H");
            assert!(matches!(
                system.add_child(atom, lonely, "H"),
                Err(AssemblyError::Structural(
                    StructuralError::InvalidOwnership { .. }
                ))
            ));
        }

        #[test]
        fn remove_child_detaches_and_drops_crossing_bonds() {
            let Ethane {
                mut system,
                root,
                c1,
                h1,
                ..
            } = create_ethane_fragment();
            let detached = system.remove_child(root, "H1").unwrap();

            assert_eq!(detached, h1);
            assert_eq!(system.parent(h1), None);
            assert_eq!(system.child(root, "H1"), None);
            assert!(!system.has_bond(c1, h1));
            assert_eq!(system.bond_count(), 1);
        }

        #[test]
        fn remove_child_unregisters_ports_anchored_across_the_cut() {
            let Ethane {
                mut system,
                root,
                c1,
                c2,
                ..
            } = create_ethane_fragment();
            let on_c2 = system
                .add_port(c2, "p-c2", Vector3::new(-1.0, 0.0, 0.0), 0.77)
                .unwrap();
            let on_c1 = system
                .add_port(c1, "p-c1", Vector3::new(0.0, 1.0, 0.0), 0.77)
                .unwrap();

            system.remove_child(root, "C2").unwrap();

            assert!(system.port(on_c2).is_none());
            assert_eq!(system.open_ports(root), vec![on_c1]);
            assert_eq!(system.open_ports(c2), Vec::<PortId>::new());
            assert!(system.label_in_use(root, "p-c1"));
            assert!(!system.label_in_use(root, "p-c2"));
            for id in system.open_ports(root) {
                let port = system.port(id).unwrap();
                assert_eq!(system.parent(port.anchor), Some(port.owner));
                assert_eq!(system.root_of(port.anchor), root);
            }
        }

        #[test]
        fn remove_child_keeps_ports_inside_a_detached_composite() {
            let mut system = MolecularSystem::new();
            let root = system.create_composite("root");
            let group = system.create_composite("group");
            let atom = system.create_particle("C", Point3::origin(), "C");
            system.add_child(root, group, "group").unwrap();
            system.add_child(group, atom, "C").unwrap();
            let port = system
                .add_port(atom, "bond", Vector3::new(0.0, 0.0, 1.0), 0.77)
                .unwrap();

            let detached = system.remove_child(root, "group").unwrap();

            assert_eq!(system.open_ports(detached), vec![port]);
            assert!(system.open_ports(root).is_empty());
        }

        #[test]
        fn remove_child_reports_missing_label() {
            let Ethane {
                mut system, root, ..
            } = create_ethane_fragment();
            let err = system.remove_child(root, "O1").unwrap_err();
            assert_eq!(
                err,
                AssemblyError::Structural(StructuralError::KeyNotFound {
                    key: "O1".to_string()
                })
            );
        }

        #[test]
        fn particles_are_visited_depth_first_and_restartable() {
            let mut system = MolecularSystem::new();
            let root = system.create_composite("root");
            let group = system.create_composite("group");
            let a = system.create_particle("a", Point3::origin(), "C");
            let b = system.create_particle("b", Point3::origin(), "C");
            let c = system.create_particle("c", Point3::origin(), "C");
            system.add_child(root, a, "a").unwrap();
            system.add_child(group, b, "b").unwrap();
            system.add_child(root, group, "group").unwrap();
            system.add_child(root, c, "c").unwrap();

            let first: Vec<NodeId> = system.particles(root).collect();
            let second: Vec<NodeId> = system.particles(root).collect();
            assert_eq!(first, vec![a, b, c]);
            assert_eq!(first, second);
            assert_parent_links_consistent(&system, root);
        }

        #[test]
        fn leaf_count_matches_flat_particle_count() {
            let Ethane { system, root, .. } = create_ethane_fragment();
            let flat = system
                .descendants(root)
                .filter(|&id| system.node(id).unwrap().is_particle())
                .count();
            assert_eq!(system.particle_count(root), flat);
            assert_eq!(flat, 3);
        }

        #[test]
        fn find_resolves_paths_and_path_of_inverts_it() {
            let mut system = MolecularSystem::new();
            let root = system.create_composite("root");
            let group = system.create_composite("group");
            let atom = system.create_particle("C", Point3::origin(), "C");
            system.add_child(group, atom, "C").unwrap();
            system.add_child(root, group, "methyl").unwrap();

            assert_eq!(system.find(root, "methyl/C"), Ok(atom));
            assert_eq!(system.find(root, ""), Ok(root));
            assert_eq!(system.path_of(atom), "methyl/C");
            assert_eq!(
                system.find(root, "methyl/H"),
                Err(StructuralError::KeyNotFound {
                    key: "methyl/H".to_string()
                })
            );
        }

        #[test]
        fn unique_label_skips_taken_names() {
            let Ethane {
                mut system, root, ..
            } = create_ethane_fragment();
            assert_eq!(system.unique_label(root, "C3"), "C3");
            assert_eq!(system.unique_label(root, "C1"), "C1[1]");
            let extra = system.create_particle("x", Point3::origin(), "C");
            system.add_child(root, extra, "C1[1]").unwrap();
            assert_eq!(system.unique_label(root, "C1"), "C1[2]");
        }

        #[test]
        fn discard_frees_nodes_bonds_and_ports() {
            let Ethane {
                mut system,
                root,
                c2,
                ..
            } = create_ethane_fragment();
            system
                .add_port(c2, "tail", Vector3::new(-1.0, 0.0, 0.0), 0.77)
                .unwrap();
            system.discard(root).unwrap();

            assert_eq!(system.node_count(), 0);
            assert_eq!(system.bond_count(), 0);
            assert_eq!(system.port_count(), 0);
        }

        #[test]
        fn discard_rejects_attached_nodes() {
            let Ethane {
                mut system, c1, ..
            } = create_ethane_fragment();
            assert!(system.discard(c1).is_err());
        }
    }

    mod bond_graph {
        use super::*;

        #[test]
        fn add_then_remove_restores_edge_set() {
            let Ethane {
                mut system,
                c2,
                h1,
                ..
            } = create_ethane_fragment();
            let before: Vec<Bond> = system.bonds().copied().collect();

            system.add_bond(c2, h1).unwrap();
            assert_eq!(system.bond_count(), 3);
            system.remove_bond(h1, c2).unwrap();

            let after: Vec<Bond> = system.bonds().copied().collect();
            assert_eq!(before, after);
            assert!(!system.has_bond(c2, h1));
        }

        #[test]
        fn add_bond_rejects_self_duplicate_and_foreign() {
            let Ethane {
                mut system,
                c1,
                c2,
                ..
            } = create_ethane_fragment();
            assert_eq!(
                system.add_bond(c1, c1),
                Err(AssemblyError::Bond(BondError::SelfBond(c1)))
            );
            assert_eq!(
                system.add_bond(c2, c1),
                Err(AssemblyError::Bond(BondError::DuplicateBond { a: c2, b: c1 }))
            );

            let stranger = system.create_particle("X", Point3::origin(), "C");
            assert_eq!(
                system.add_bond(c1, stranger),
                Err(AssemblyError::Structural(
                    StructuralError::ForeignParticle { particle: stranger }
                ))
            );
            assert_eq!(system.bond_count(), 2);
        }

        #[test]
        fn add_bond_rejects_composites() {
            let Ethane {
                mut system,
                root,
                c1,
                ..
            } = create_ethane_fragment();
            assert!(matches!(
                system.add_bond(root, c1),
                Err(AssemblyError::Structural(
                    StructuralError::ForeignParticle { .. }
                ))
            ));
        }

        #[test]
        fn remove_missing_bond_fails() {
            let Ethane {
                mut system,
                c2,
                h1,
                ..
            } = create_ethane_fragment();
            assert_eq!(
                system.remove_bond(c2, h1),
                Err(AssemblyError::Bond(BondError::BondNotFound { a: c2, b: h1 }))
            );
        }

        #[test]
        fn neighbors_returns_bonded_set() {
            let Ethane {
                system,
                c1,
                c2,
                h1,
                ..
            } = create_ethane_fragment();
            assert_eq!(system.neighbors(c1), HashSet::from([c2, h1]));
            assert_eq!(system.neighbors(c2), HashSet::from([c1]));
            assert_eq!(system.bonded_neighbors(h1), Some(&[c1][..]));
        }
    }

    mod ports {
        use super::*;

        #[test]
        fn add_port_registers_under_anchor_parent() {
            let Ethane {
                mut system,
                root,
                c2,
                ..
            } = create_ethane_fragment();
            let port = system
                .add_port(c2, "up", Vector3::new(-2.0, 0.0, 0.0), 0.77)
                .unwrap();

            let registered = system.port(port).unwrap();
            assert_eq!(registered.owner, root);
            assert_eq!(registered.anchor, c2);
            assert!((registered.direction.norm() - 1.0).abs() < 1e-12);
            assert_eq!(system.port_by_label(root, "up"), Some(port));
            assert_eq!(system.find_port(root, "up"), Some(port));
            assert_eq!(system.open_ports(root), vec![port]);
            let site = system.port_site(port).unwrap();
            assert!((site - Point3::new(2.31, 0.0, 0.0)).norm() < 1e-12);
        }

        #[test]
        fn add_port_validates_label_and_geometry() {
            let Ethane {
                mut system,
                root,
                c2,
                ..
            } = create_ethane_fragment();
            assert!(matches!(
                system.add_port(c2, "C1", Vector3::x(), 1.0),
                Err(AssemblyError::Structural(
                    StructuralError::DuplicateLabel { .. }
                ))
            ));
            assert!(matches!(
                system.add_port(c2, "up", Vector3::zeros(), 1.0),
                Err(AssemblyError::InvalidGeometry(_))
            ));
            assert!(matches!(
                system.add_port(c2, "up", Vector3::x(), 0.0),
                Err(AssemblyError::InvalidGeometry(_))
            ));
            assert!(system.open_ports(root).is_empty());
        }

        #[test]
        fn add_port_requires_an_owner() {
            let mut system = MolecularSystem::new();
            let lonely = system.create_particle("H", Point3::origin(), "H");
            assert!(matches!(
                system.add_port(lonely, "up", Vector3::x(), 0.5),
                Err(AssemblyError::Structural(
                    StructuralError::InvalidOwnership { .. }
                ))
            ));
        }

        #[test]
        fn removed_port_becomes_stale() {
            let Ethane {
                mut system, c2, ..
            } = create_ethane_fragment();
            let port = system.add_port(c2, "up", Vector3::x(), 0.5).unwrap();
            system.remove_port(port).unwrap();
            assert_eq!(
                system.remove_port(port),
                Err(AssemblyError::Port(PortError::StalePort(port)))
            );
            assert!(system.port(port).is_none());
        }
    }

    mod removal {
        use super::*;

        #[test]
        fn removing_singly_bonded_particle_leaves_one_port() {
            let Ethane {
                mut system,
                root,
                c1,
                h1,
                ..
            } = create_ethane_fragment();
            let bonds_before = system.bond_count();

            let port_id = system.remove_particle(h1).unwrap().unwrap();

            assert_eq!(system.bond_count(), bonds_before - 1);
            assert_eq!(system.open_ports(root), vec![port_id]);
            assert!(system.node(h1).is_none());
            assert_eq!(system.child(root, "H1"), None);

            let port = system.port(port_id).unwrap();
            assert_eq!(port.anchor, c1);
            assert_eq!(port.owner, root);
            assert_eq!(port.label, "port");
            assert!((port.direction.into_inner() - Vector3::x()).norm() < 1e-12);
            assert!((port.separation - 1.09 / 2.0).abs() < 1e-12);
        }

        #[test]
        fn removing_multiply_bonded_particle_is_ambiguous() {
            let Ethane {
                mut system,
                root,
                c1,
                ..
            } = create_ethane_fragment();
            let bonds_before: Vec<Bond> = system.bonds().copied().collect();
            let nodes_before = system.node_count();

            let err = system.remove_particle(c1).unwrap_err();

            assert_eq!(
                err,
                AssemblyError::Bond(BondError::AmbiguousRemoval {
                    particle: c1,
                    bond_count: 2
                })
            );
            assert_eq!(system.bonds().copied().collect::<Vec<_>>(), bonds_before);
            assert_eq!(system.node_count(), nodes_before);
            assert!(system.open_ports(root).is_empty());
        }

        #[test]
        fn removing_unbonded_particle_creates_no_port() {
            let mut system = MolecularSystem::new();
            let root = system.create_composite("root");
            let atom = system.create_particle("Ar", Point3::origin(), "Ar");
            system.add_child(root, atom, "Ar").unwrap();

            assert_eq!(system.remove_particle(atom), Ok(None));
            assert_eq!(system.particle_count(root), 0);
            assert_eq!(system.port_count(), 0);
        }

        #[test]
        fn removal_honors_separation_policy() {
            let Ethane {
                mut system, h1, ..
            } = create_ethane_fragment();
            system.set_separation_policy(SeparationPolicy::BondLength);
            let port = system.remove_particle(h1).unwrap().unwrap();
            assert!((system.port(port).unwrap().separation - 1.09).abs() < 1e-12);
        }

        #[test]
        fn successive_removals_get_unique_port_labels() {
            let mut system = MolecularSystem::new();
            let root = system.create_composite("methane");
            let c = system.create_particle("C", Point3::origin(), "C");
            system.add_child(root, c, "C").unwrap();
            for (i, dir) in [Vector3::x(), Vector3::y()].iter().enumerate() {
                let h = system.create_particle("H", Point3::from(*dir), "H");
                system.add_child(root, h, &format!("H{}", i)).unwrap();
                system.add_bond(c, h).unwrap();
            }
            let h0 = system.child(root, "H0").unwrap();
            let h1 = system.child(root, "H1").unwrap();
            let p0 = system.remove_particle(h0).unwrap().unwrap();
            let p1 = system.remove_particle(h1).unwrap().unwrap();
            assert_eq!(system.port(p0).unwrap().label, "port");
            assert_eq!(system.port(p1).unwrap().label, "port[1]");
        }
    }

    mod copy_and_motion {
        use super::*;

        #[test]
        fn deep_copy_duplicates_nodes_bonds_and_ports() {
            let Ethane {
                mut system,
                root,
                c2,
                ..
            } = create_ethane_fragment();
            let port = system.add_port(c2, "up", Vector3::x(), 0.5).unwrap();

            let copy = system.deep_copy(root).unwrap();

            assert_ne!(copy.root, root);
            assert_eq!(system.parent(copy.root), None);
            assert_eq!(system.particle_count(copy.root), 3);
            assert_eq!(system.bonds_under(copy.root).count(), 2);
            assert_eq!(system.bonds_under(root).count(), 2);
            let copied_port = copy.ports[&port];
            assert_eq!(system.port(copied_port).unwrap().owner, copy.root);
            assert_eq!(system.port(copied_port).unwrap().anchor, copy.nodes[&c2]);
            assert_eq!(system.open_ports(root), vec![port]);
            assert_parent_links_consistent(&system, copy.root);
        }

        #[test]
        fn transform_moves_positions_and_rotates_ports() {
            let Ethane {
                mut system,
                root,
                c2,
                ..
            } = create_ethane_fragment();
            let port = system.add_port(c2, "up", Vector3::x(), 0.5).unwrap();
            let rotation =
                Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
            system.transform(root, &rotation, &Vector3::new(0.0, 0.0, 1.0));

            let moved = system.node(c2).unwrap().position().unwrap();
            assert!((moved - Point3::new(0.0, 1.54, 1.0)).norm() < 1e-12);
            let direction = system.port(port).unwrap().direction.into_inner();
            assert!((direction - Vector3::y()).norm() < 1e-12);
        }

        #[test]
        fn centroid_averages_particles() {
            let mut system = MolecularSystem::new();
            let root = system.create_composite("pair");
            let a = system.create_particle("a", Point3::new(0.0, 0.0, 0.0), "C");
            let b = system.create_particle("b", Point3::new(2.0, 4.0, 0.0), "C");
            system.add_child(root, a, "a").unwrap();
            system.add_child(root, b, "b").unwrap();
            assert_eq!(system.centroid(root), Some(Point3::new(1.0, 2.0, 0.0)));

            let empty = system.create_composite("empty");
            assert_eq!(system.centroid(empty), None);
        }
    }
}
