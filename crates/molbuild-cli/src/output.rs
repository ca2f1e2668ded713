use crate::error::Result;
use molbuild::core::models::exchange::FlatView;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

const UNKNOWN_ELEMENT: &str = "X";

/// Writes a flat view in XYZ format: a count line, a comment line, then one
/// `element x y z` line per particle.
pub fn write_xyz<W: Write>(view: &FlatView, comment: &str, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "{}", view.particles.len())?;
    writeln!(writer, "{}", comment.replace(['\n', '\r'], " "))?;
    for particle in &view.particles {
        let element = if particle.element.is_empty() {
            UNKNOWN_ELEMENT
        } else {
            particle.element.as_str()
        };
        writeln!(
            writer,
            "{:<2} {:>12.6} {:>12.6} {:>12.6}",
            element, particle.position.x, particle.position.y, particle.position.z
        )?;
    }
    Ok(())
}

pub fn write_xyz_file(path: &Path, view: &FlatView, comment: &str) -> Result<()> {
    debug!("Writing {} particle(s) to {:?}", view.particles.len(), path);
    let mut writer = BufWriter::new(File::create(path)?);
    write_xyz(view, comment, &mut writer)?;
    writer.flush()?;
    Ok(())
}
