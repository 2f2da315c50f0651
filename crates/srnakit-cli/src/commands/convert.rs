use crate::cli::ConvertArgs;
use crate::error::{CliError, Result};
use srnakit::core::chem::ResidueKind;
use srnakit::core::convert::{AltlocPolicy, ConvertOptions, convert};
use srnakit::core::io::cif::CifFile;
use srnakit::core::io::pdb::PdbFile;
use srnakit::core::io::traits::{StructureReader, StructureWriter};
use srnakit::core::models::structure::Structure;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub fn run(args: ConvertArgs) -> Result<()> {
    if args.out.is_some() && args.inputs.len() != 1 {
        return Err(CliError::Argument(
            "--out can only be used with a single input file.".to_string(),
        ));
    }
    let kinds = parse_kinds(&args.only)?;

    for input in &args.inputs {
        if !looks_like_cif(input) {
            warn!("{} does not look like a CIF, continuing...", input.display());
        }
        let out = args
            .out
            .clone()
            .unwrap_or_else(|| input.with_extension("pdb"));
        convert_one(input, &out, &args, &kinds)?;
    }
    Ok(())
}

fn looks_like_cif(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("cif" | "mmcif")
    )
}

/// Parses the `--only` list into residue kinds, rejecting unknown names.
fn parse_kinds(only: &str) -> Result<HashSet<ResidueKind>> {
    let mut kinds = HashSet::new();
    let mut unknown = Vec::new();
    for token in only.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match ResidueKind::from_str(&token.to_ascii_lowercase()) {
            Ok(kind) => {
                kinds.insert(kind);
            }
            Err(_) => unknown.push(token.to_string()),
        }
    }
    if !unknown.is_empty() {
        unknown.sort();
        return Err(CliError::Argument(format!(
            "--only had unknown kinds: {}",
            unknown.join(", ")
        )));
    }
    Ok(kinds)
}

/// Structure id when the CIF lacks a `data_` header: the file stem,
/// truncated to ten characters.
fn fallback_id(input: &Path) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    stem.chars().take(10).collect()
}

/// Output path for one model when `--all-models` splits the ensemble.
fn model_out_path(out: &Path, model_number: i32) -> PathBuf {
    let stem = out
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    let ext = out.extension().and_then(|e| e.to_str()).unwrap_or("pdb");
    out.with_file_name(format!("{stem}_model{model_number}.{ext}"))
}

fn convert_one(
    input: &Path,
    out: &Path,
    args: &ConvertArgs,
    kinds: &HashSet<ResidueKind>,
) -> Result<()> {
    let mut structure = CifFile::read_from_path(input).map_err(|source| CliError::Cif {
        path: input.to_path_buf(),
        source,
    })?;
    if structure.id.is_empty() {
        structure.id = fallback_id(input);
    }

    let options = ConvertOptions {
        model: args.model,
        keep_hydrogens: !args.no_h,
        kinds: kinds.clone(),
        altloc: if args.keep_altloc {
            AltlocPolicy::KeepAll
        } else {
            AltlocPolicy::BestOccupancy
        },
        renumber: args.renumber,
    };

    let (converted, summary) = convert(&structure, &options)?;
    info!(
        "{}: {} models, {} of {} atoms kept ({} residues filtered, {} hydrogens, {} altlocs dropped)",
        input.display(),
        summary.models,
        summary.atoms_out,
        summary.atoms_in,
        summary.residues_dropped,
        summary.hydrogens_dropped,
        summary.altlocs_pruned
    );

    let split_models = args.all_models && args.model.is_none();
    if split_models && converted.models.len() > 1 {
        for model in &converted.models {
            let single = Structure {
                id: converted.id.clone(),
                models: vec![model.clone()],
            };
            let out_model = model_out_path(out, model.number);
            PdbFile::write_to_path(&single, &out_model)?;
            println!("Wrote {}", out_model.display());
        }
    } else {
        PdbFile::write_to_path(&converted, out)?;
        println!("Wrote {}", out.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MINI_CIF: &str = "\
data_mini
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
ATOM 1 C CA . ALA A 1 0.0 0.0 0.0 1.00 10.00
ATOM 2 P P . U B 1 1.0 0.0 0.0 1.00 10.00
";

    const TWO_MODEL_CIF: &str = "\
data_pair
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.pdbx_PDB_model_num
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
ATOM 1 C CA . ALA A 1 1 0.0 0.0 0.0 1.00 10.00
ATOM 2 C CA . ALA A 1 2 0.1 0.0 0.0 1.00 10.00
";

    fn base_args(input: PathBuf, out: Option<PathBuf>) -> ConvertArgs {
        ConvertArgs {
            inputs: vec![input],
            out,
            model: None,
            all_models: false,
            no_h: false,
            only: String::new(),
            keep_altloc: false,
            renumber: false,
        }
    }

    #[test]
    fn parse_kinds_accepts_known_names() {
        let kinds = parse_kinds("protein, RNA").unwrap();
        assert!(kinds.contains(&ResidueKind::Protein));
        assert!(kinds.contains(&ResidueKind::Rna));
        assert!(parse_kinds("").unwrap().is_empty());
    }

    #[test]
    fn parse_kinds_rejects_unknown_names() {
        let err = parse_kinds("rna,lipid,metal").unwrap_err();
        assert!(
            err.to_string()
                .contains("--only had unknown kinds: lipid, metal")
        );
    }

    #[test]
    fn fallback_id_truncates_long_stems() {
        assert_eq!(fallback_id(Path::new("/tmp/mini.cif")), "mini");
        assert_eq!(
            fallback_id(Path::new("boltz2_prediction_rank1.cif")),
            "boltz2_pre"
        );
    }

    #[test]
    fn model_out_path_inserts_suffix_before_extension() {
        assert_eq!(
            model_out_path(Path::new("/tmp/job.pdb"), 2),
            PathBuf::from("/tmp/job_model2.pdb")
        );
    }

    #[test]
    fn converts_a_cif_file_to_pdb() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("mini.cif");
        fs::write(&input, MINI_CIF).unwrap();

        run(base_args(input.clone(), None)).unwrap();

        let out = input.with_extension("pdb");
        let text = fs::read_to_string(out).unwrap();
        assert!(text.contains("ATOM      1  CA  ALA A   1"));
        assert!(text.trim_end().ends_with("END"));
    }

    #[test]
    fn ensembles_become_one_multi_model_pdb_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pair.cif");
        fs::write(&input, TWO_MODEL_CIF).unwrap();

        run(base_args(input.clone(), None)).unwrap();

        let text = fs::read_to_string(input.with_extension("pdb")).unwrap();
        assert!(text.contains("MODEL        1"));
        assert!(text.contains("MODEL        2"));
        assert_eq!(text.matches("ENDMDL").count(), 2);
    }

    #[test]
    fn all_models_splits_the_ensemble_into_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pair.cif");
        fs::write(&input, TWO_MODEL_CIF).unwrap();

        let mut args = base_args(input.clone(), None);
        args.all_models = true;
        run(args).unwrap();

        for n in 1..=2 {
            let text =
                fs::read_to_string(dir.path().join(format!("pair_model{n}.pdb"))).unwrap();
            assert!(!text.contains("MODEL"));
            assert!(text.contains("ATOM      1  CA  ALA A   1"));
        }
    }

    #[test]
    fn out_with_multiple_inputs_is_rejected() {
        let mut args = base_args(PathBuf::from("a.cif"), Some(PathBuf::from("x.pdb")));
        args.inputs.push(PathBuf::from("b.cif"));
        let err = run(args).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }
}
