use crate::core::error::AssemblyError;
use crate::core::models::ids::NodeId;
use crate::core::models::system::MolecularSystem;
use nalgebra::Vector3;
use tracing::{debug, instrument};

/// Three lattice vectors `a`, `b`, `c` spanning a periodic cell, in Angstroms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    pub vectors: [Vector3<f64>; 3],
}

impl Lattice {
    pub fn new(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self { vectors: [a, b, c] }
    }

    /// A box-shaped cell with the given edge lengths along x, y and z.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self::new(
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(0.0, b, 0.0),
            Vector3::new(0.0, 0.0, c),
        )
    }

    /// The translation `i*a + j*b + k*c` of cell `(i, j, k)`.
    pub fn offset(&self, i: usize, j: usize, k: usize) -> Vector3<f64> {
        let [a, b, c] = &self.vectors;
        a * i as f64 + b * j as f64 + c * k as f64
    }
}

/// Replicates `unit` on an `nx` by `ny` by `nz` block of lattice cells.
///
/// Returns a new detached composite labeled `"{unit label}-tiled"` whose children are
/// translated deep copies labeled `"{unit label}[i,j,k]"`. Copies are not bonded to each
/// other and keep their ports open. `unit` itself is not modified; a zero count yields an
/// empty composite.
///
/// # Errors
///
/// Returns [`StructuralError::StaleNode`](crate::core::error::StructuralError::StaleNode) if
/// `unit` does not exist.
#[instrument(skip_all, name = "tile", fields(counts = ?counts))]
pub fn tile(
    system: &mut MolecularSystem,
    unit: NodeId,
    counts: [usize; 3],
    lattice: &Lattice,
) -> Result<NodeId, AssemblyError> {
    let base = system.live(unit)?.label.clone();
    let tiled = system.create_composite(&format!("{}-tiled", base));
    let [nx, ny, nz] = counts;

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let copy = system.deep_copy(unit)?;
                system.translate(copy.root, &lattice.offset(i, j, k));
                system.graft(tiled, copy.root, &format!("{}[{},{},{}]", base, i, j, k));
            }
        }
    }

    debug!(
        "Tiled '{}' into {} cell(s)",
        base,
        system.children(tiled).len()
    );
    Ok(tiled)
}
