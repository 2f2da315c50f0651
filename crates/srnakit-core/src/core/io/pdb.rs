use crate::core::chem::{ResidueKind, classify_residue};
use crate::core::io::traits::{StructureReader, StructureWriter};
use crate::core::models::atom::Atom;
use crate::core::models::structure::{Model, Structure};
use crate::core::models::system::MolecularSystem;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Line is too short for an ATOM/HETATM record (needs 54 columns)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

/// PDB flat-file format.
///
/// The writer renumbers atom serials sequentially, emits `TER` after each
/// polymer chain, and wraps each coordinate model in `MODEL`/`ENDMDL` when
/// the structure holds more than one. The reader handles the subset of
/// records the viewer and the round-trip tests need: ATOM, HETATM, MODEL,
/// ENDMDL and TER.
pub struct PdbFile;

impl StructureReader for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut structure = Structure::new("");
        let mut current_model: Option<Model> = None;
        let mut atom_count = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record = slice_and_trim(&line, 0, 6);

            match record {
                "MODEL" => {
                    if let Some(model) = current_model.take() {
                        structure.models.push(model);
                    }
                    let number_str = slice_and_trim(&line, 6, 14);
                    let number: i32 = number_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "7-14".into(),
                            value: number_str.into(),
                        },
                    })?;
                    current_model = Some(Model {
                        number,
                        system: MolecularSystem::new(),
                    });
                }
                "ENDMDL" => {
                    if let Some(model) = current_model.take() {
                        structure.models.push(model);
                    }
                }
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }
                    let model = current_model.get_or_insert_with(|| Model {
                        number: 1,
                        system: MolecularSystem::new(),
                    });
                    parse_atom_record(&line, line_num, record == "HETATM", &mut model.system)?;
                    atom_count += 1;
                }
                _ => {}
            }
        }

        if let Some(model) = current_model.take() {
            structure.models.push(model);
        }
        if atom_count == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        Ok(structure)
    }
}

fn parse_atom_record(
    line: &str,
    line_num: usize,
    is_hetero: bool,
    system: &mut MolecularSystem,
) -> Result<(), PdbError> {
    let parse_int = |s: &str, columns: &str| -> Result<i64, PdbError> {
        s.parse().map_err(|_| PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::InvalidInt {
                columns: columns.into(),
                value: s.into(),
            },
        })
    };
    let parse_float = |s: &str, columns: &str| -> Result<f64, PdbError> {
        s.parse().map_err(|_| PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::InvalidFloat {
                columns: columns.into(),
                value: s.into(),
            },
        })
    };

    let serial = parse_int(slice_and_trim(line, 6, 11), "7-11")? as u32;
    let name = slice_and_trim(line, 12, 16);
    let altloc = line
        .chars()
        .nth(16)
        .filter(|c| !c.is_whitespace());
    let res_name = slice_and_trim(line, 17, 20);
    let chain_char = line.chars().nth(21).unwrap_or('A');
    let res_seq = parse_int(slice_and_trim(line, 22, 26), "23-26")?;
    let insertion_code = line
        .chars()
        .nth(26)
        .filter(|c| !c.is_whitespace());
    let x = parse_float(slice_and_trim(line, 30, 38), "31-38")?;
    let y = parse_float(slice_and_trim(line, 38, 46), "39-46")?;
    let z = parse_float(slice_and_trim(line, 46, 54), "47-54")?;

    let occupancy = slice_and_trim(line, 54, 60).parse().unwrap_or(1.0);
    let b_factor = slice_and_trim(line, 60, 66).parse().unwrap_or(0.0);
    let element = {
        let e = slice_and_trim(line, 76, 78);
        if e.is_empty() { None } else { Some(e.to_string()) }
    };

    let chain_id = system.add_chain(chain_char);
    let kind = classify_residue(res_name);
    let residue_id = system
        .add_residue(chain_id, res_seq, insertion_code, res_name, kind)
        .expect("chain inserted above");

    let mut atom = Atom::new(serial, name, residue_id, Point3::new(x, y, z));
    atom.altloc = altloc;
    atom.occupancy = occupancy;
    atom.b_factor = b_factor;
    atom.element = element;
    atom.is_hetero = is_hetero;
    system.add_atom_to_residue(residue_id, atom);
    Ok(())
}

impl StructureWriter for PdbFile {
    type Error = PdbError;

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        let multi_model = structure.models.len() > 1;
        for model in &structure.models {
            if multi_model {
                writeln!(writer, "MODEL     {:>4}", model.number)?;
            }
            write_model(&model.system, writer)?;
            if multi_model {
                writeln!(writer, "ENDMDL")?;
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

fn write_model(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), PdbError> {
    let mut serial = 0u32;

    for (_, chain) in system.chains_ordered() {
        let mut last_polymer: Option<(String, i64, Option<char>)> = None;

        for &residue_id in chain.residues() {
            let Some(residue) = system.residue(residue_id) else {
                continue;
            };
            let record = match residue.kind {
                ResidueKind::Water | ResidueKind::Ligand => "HETATM",
                _ => "ATOM",
            };
            for &atom_id in residue.atoms() {
                let Some(atom) = system.atom(atom_id) else {
                    continue;
                };
                serial += 1;
                write_atom_line(writer, record, serial, atom, residue, chain.id)?;
            }
            if record == "ATOM" {
                last_polymer = Some((
                    residue.name.clone(),
                    residue.number,
                    residue.insertion_code,
                ));
            }
        }

        if let Some((res_name, res_seq, icode)) = last_polymer {
            serial += 1;
            writeln!(
                writer,
                "TER   {:>5}      {:>3} {}{:>4}{}",
                serial,
                res_name,
                chain.id,
                res_seq,
                icode.unwrap_or(' ')
            )?;
        }
    }
    Ok(())
}

fn write_atom_line(
    writer: &mut impl Write,
    record: &str,
    serial: u32,
    atom: &Atom,
    residue: &crate::core::models::residue::Residue,
    chain_id: char,
) -> Result<(), PdbError> {
    let element = atom.element.as_deref().unwrap_or("").trim();
    // Atom names shorter than four characters start in column 14 unless the
    // element symbol itself is two characters wide (e.g. FE, MG).
    let name_field = if atom.name.len() >= 4 || element.len() == 2 {
        format!("{:<4}", atom.name)
    } else {
        format!(" {:<3}", atom.name)
    };

    writeln!(
        writer,
        "{:<6}{:>5} {}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
        record,
        serial,
        name_field,
        atom.altloc.unwrap_or(' '),
        residue.name,
        chain_id,
        residue.number,
        residue.insertion_code.unwrap_or(' '),
        atom.position.x,
        atom.position.y,
        atom.position.z,
        atom.occupancy,
        atom.b_factor,
        element.to_ascii_uppercase()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::cif::CifFile;
    use std::io::BufReader;

    fn build_simple_structure() -> Structure {
        let cif = "\
data_test
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
ATOM 1 N N . ALA A 1 11.104 6.134 -6.504 1.00 88.10
ATOM 2 C CA . ALA A 1 11.639 6.071 -5.147 1.00 90.55
ATOM 3 P P . U B 1 1.000 2.000 3.000 1.00 70.00
HETATM 4 O O . HOH C 1 9.000 9.000 9.000 1.00 20.00
";
        let mut reader = BufReader::new(cif.as_bytes());
        CifFile::read_from(&mut reader).unwrap()
    }

    fn write_to_string(structure: &Structure) -> String {
        let mut out = Vec::new();
        PdbFile::write_to(structure, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn writes_fixed_column_atom_records() {
        let text = write_to_string(&build_simple_structure());
        let first = text.lines().next().unwrap();

        assert!(first.starts_with("ATOM      1  N   ALA A   1"));
        // Coordinate columns 31-38 / 39-46 / 47-54.
        assert_eq!(&first[30..38], "  11.104");
        assert_eq!(&first[38..46], "   6.134");
        assert_eq!(&first[46..54], "  -6.504");
        assert_eq!(&first[54..60], "  1.00");
        assert_eq!(&first[60..66], " 88.10");
        assert_eq!(&first[76..78], " N");
    }

    #[test]
    fn water_residues_become_hetatm() {
        let text = write_to_string(&build_simple_structure());
        assert!(text.lines().any(|l| l.starts_with("HETATM") && l.contains("HOH")));
    }

    #[test]
    fn ter_records_follow_polymer_chains_only() {
        let text = write_to_string(&build_simple_structure());
        let ter_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("TER")).collect();
        // Chains A (protein) and B (RNA) get TER; the water chain does not.
        assert_eq!(ter_lines.len(), 2);
        assert!(ter_lines[0].contains("ALA"));
        assert!(ter_lines[1].contains("U"));
    }

    #[test]
    fn serials_are_renumbered_sequentially() {
        let text = write_to_string(&build_simple_structure());
        let serials: Vec<u32> = text
            .lines()
            .filter(|l| l.starts_with("ATOM") || l.starts_with("HETATM") || l.starts_with("TER"))
            .map(|l| l[6..11].trim().parse().unwrap())
            .collect();
        let expected: Vec<u32> = (1..=serials.len() as u32).collect();
        assert_eq!(serials, expected);
    }

    #[test]
    fn multi_model_structures_get_model_wrappers() {
        let mut structure = build_simple_structure();
        let mut second = structure.models[0].clone();
        second.number = 2;
        structure.models.push(second);

        let text = write_to_string(&structure);
        assert!(text.contains("MODEL        1"));
        assert!(text.contains("MODEL        2"));
        assert_eq!(text.matches("ENDMDL").count(), 2);
        assert!(text.trim_end().ends_with("END"));
    }

    #[test]
    fn four_character_names_start_in_column_13() {
        let mut structure = Structure::new("x");
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A');
        let res = system
            .add_residue(chain, 1, None, "U", ResidueKind::Rna)
            .unwrap();
        let mut atom = Atom::new(1, "H5''", res, Point3::new(0.0, 0.0, 0.0));
        atom.element = Some("H".into());
        system.add_atom_to_residue(res, atom);
        structure.models.push(Model { number: 1, system });

        let text = write_to_string(&structure);
        let line = text.lines().next().unwrap();
        assert_eq!(&line[12..16], "H5''");
    }

    #[test]
    fn round_trips_through_the_reader() {
        let original = build_simple_structure();
        let text = write_to_string(&original);

        let mut reader = BufReader::new(text.as_bytes());
        let reparsed = PdbFile::read_from(&mut reader).unwrap();

        assert_eq!(reparsed.models.len(), 1);
        let system = &reparsed.models[0].system;
        assert_eq!(system.atom_count(), 4);
        let chains: Vec<char> = system.chains_ordered().map(|(_, c)| c.id).collect();
        assert_eq!(chains, vec!['A', 'B', 'C']);

        let (_, first) = system.atoms_ordered().next().unwrap();
        assert_eq!(first.name, "N");
        assert_eq!(first.position, Point3::new(11.104, 6.134, -6.504));
        assert_eq!(first.b_factor, 88.10);
    }

    #[test]
    fn reader_rejects_structures_without_atoms() {
        let mut reader = BufReader::new("HEADER    NOTHING\nEND\n".as_bytes());
        let err = PdbFile::read_from(&mut reader).unwrap_err();
        assert!(matches!(err, PdbError::MissingRecord(_)));
    }

    #[test]
    fn reader_reports_short_atom_lines() {
        let mut reader = BufReader::new("ATOM      1  N   ALA A   1\n".as_bytes());
        let err = PdbFile::read_from(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                kind: PdbParseErrorKind::LineTooShort,
                ..
            }
        ));
    }

    #[test]
    fn path_helpers_write_and_read_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("structure.pdb");

        let original = build_simple_structure();
        PdbFile::write_to_path(&original, &path).unwrap();
        let reparsed = PdbFile::read_from_path(&path).unwrap();

        assert_eq!(reparsed.models.len(), 1);
        assert_eq!(reparsed.models[0].system.atom_count(), 4);
    }

    #[test]
    fn reader_splits_models() {
        let pdb = "\
MODEL        1
ATOM      1  CA  ALA A   1      11.104   6.134  -6.504  1.00 88.10           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1      11.000   6.000  -6.000  1.00 87.00           C
ENDMDL
END
";
        let mut reader = BufReader::new(pdb.as_bytes());
        let structure = PdbFile::read_from(&mut reader).unwrap();
        assert_eq!(structure.models.len(), 2);
        assert_eq!(structure.models[1].number, 2);
    }
}
