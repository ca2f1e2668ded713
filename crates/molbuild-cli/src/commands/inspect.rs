use crate::cli::InspectArgs;
use crate::error::Result;
use molbuild::core::library::FragmentLibrary;
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    info!("Loading fragment library from {:?}", &args.library);
    let library = FragmentLibrary::load(&args.library)?;
    if library.is_empty() {
        println!("No fragments defined in {}", args.library.display());
        return Ok(());
    }
    for line in describe(&library) {
        println!("{}", line);
    }
    Ok(())
}

/// One summary line per fragment, in name order.
fn describe(library: &FragmentLibrary) -> Vec<String> {
    library
        .names()
        .filter_map(|name| {
            let template = library.get(name)?;
            let ports: Vec<&str> = template.ports.iter().map(|p| p.label.as_str()).collect();
            Some(format!(
                "{:<16} {:>4} particle(s) {:>4} bond(s)  ports: [{}]",
                name,
                template.particles.len(),
                template.bonds.len(),
                ports.join(", ")
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn describes_each_fragment() {
        let library = FragmentLibrary::from_toml_str(
            r#"
[h]
particles = [{ label = "H", element = "H", position = [0.0, 0.0, 0.0] }]
ports = [{ label = "bond", anchor = 0, direction = [0.0, 0.0, 1.0], separation = 0.32 }]

[ar]
particles = [{ label = "Ar", element = "Ar", position = [0.0, 0.0, 0.0] }]
"#,
        )
        .unwrap();

        let lines = describe(&library);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ar "));
        assert!(lines[0].ends_with("ports: []"));
        assert!(lines[1].ends_with("ports: [bond]"));
    }

    #[test]
    fn run_reads_library_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[ar]\nparticles = [{{ label = \"Ar\", element = \"Ar\", position = [0.0, 0.0, 0.0] }}]\n"
        )
        .unwrap();
        assert!(run(InspectArgs {
            library: file.path().to_path_buf()
        })
        .is_ok());
        assert!(run(InspectArgs {
            library: PathBuf::from("/nonexistent/library.toml")
        })
        .is_err());
    }
}
