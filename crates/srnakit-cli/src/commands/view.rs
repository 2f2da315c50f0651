use crate::cli::{ViewArgs, ViewCommands, ViewConfidenceArgs, ViewStructuresArgs};
use crate::error::{CliError, Result};
use srnakit::core::io::cif::CifFile;
use srnakit::core::io::npz::NpzFile;
use srnakit::core::io::pdb::PdbFile;
use srnakit::core::io::traits::StructureReader;
use srnakit::viewer::confidence::{ConfidenceReport, EmbeddedStructure, render_confidence_page};
use srnakit::viewer::payload::F32Payload;
use srnakit::viewer::structures::{StructureEntry, render_structures_page};
use std::fs;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub fn run(args: ViewArgs) -> Result<()> {
    match args.command {
        ViewCommands::Structures(args) => run_structures(args),
        ViewCommands::Confidence(args) => run_confidence(args),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("structure")
        .to_string()
}

fn run_structures(args: ViewStructuresArgs) -> Result<()> {
    if args.cifs.is_empty() && args.pdbs.is_empty() {
        return Err(CliError::Argument(
            "provide at least one --cif or --pdb input".to_string(),
        ));
    }

    let mut entries = Vec::new();
    for path in &args.cifs {
        let text = fs::read_to_string(path)?;
        let parsed = CifFile::read_from(&mut BufReader::new(text.as_bytes())).map_err(
            |source| CliError::Cif {
                path: path.clone(),
                source,
            },
        )?;
        entries.push(StructureEntry::new(
            entries.len(),
            &file_name(path),
            "cif",
            text,
            &parsed,
        ));
    }
    for path in &args.pdbs {
        let text = fs::read_to_string(path)?;
        let parsed = PdbFile::read_from(&mut BufReader::new(text.as_bytes()))?;
        entries.push(StructureEntry::new(
            entries.len(),
            &file_name(path),
            "pdb",
            text,
            &parsed,
        ));
    }

    info!("Embedding {} structures.", entries.len());
    let page = render_structures_page(&entries, &args.title)?;
    fs::write(&args.out, page)?;
    println!("Wrote {}", args.out.display());
    Ok(())
}

/// Loads one array out of an optional NPZ path.
fn load_payload(path: &Option<std::path::PathBuf>, key: &str) -> Result<Option<F32Payload>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let npz = NpzFile::read_from_path(path)?;
    let array = npz.array(key)?;
    info!("{}: '{}' array with shape {:?}", path.display(), key, array.shape);
    Ok(Some(F32Payload::from_array(array)))
}

fn run_confidence(args: ViewConfidenceArgs) -> Result<()> {
    let cif_text = fs::read_to_string(&args.cif)?;

    let conf = match &args.conf {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => serde_json::Value::Null,
    };

    let report = ConfidenceReport {
        title: args.title.clone(),
        cif: EmbeddedStructure {
            name: file_name(&args.cif),
            format: "cif".to_string(),
            text: cif_text,
        },
        conf,
        pae: load_payload(&args.pae, "pae")?,
        pde: load_payload(&args.pde, "pde")?,
        plddt: load_payload(&args.plddt, "plddt")?,
    };

    let page = render_confidence_page(&report)?;
    fs::write(&args.out, page)?;
    println!("Wrote {}", args.out.display());
    Ok(())
}
