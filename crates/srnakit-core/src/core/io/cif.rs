use crate::core::chem::classify_residue;
use crate::core::io::traits::StructureReader;
use crate::core::models::atom::Atom;
use crate::core::models::structure::{Model, Structure};
use crate::core::models::system::MolecularSystem;
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: CifParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum CifParseErrorKind {
    #[error("Invalid integer in field '{field}' (value: '{value}')")]
    InvalidInt { field: String, value: String },
    #[error("Invalid float in field '{field}' (value: '{value}')")]
    InvalidFloat { field: String, value: String },
    #[error("Required field '{field}' is absent from the _atom_site loop")]
    MissingField { field: String },
    #[error("Data row has {found} values but the loop declares {expected} fields")]
    ColumnMismatch { expected: usize, found: usize },
}

/// mmCIF/PDBx reader.
///
/// Only the `_atom_site` loop is consumed; every other category (entities,
/// cell parameters, software provenance) is skipped. `auth_*` identifiers
/// are preferred over `label_*` so that chain letters and residue numbers
/// match what PDB-oriented tools display, matching the conventions of the
/// prediction pipelines this crate targets.
pub struct CifFile;

/// One tokenized `_atom_site` data row together with its source line number.
struct AtomSiteRow {
    line: usize,
    values: Vec<String>,
}

/// Field-name-to-column lookup for the `_atom_site` loop.
struct FieldIndex {
    by_name: HashMap<String, usize>,
}

impl FieldIndex {
    fn new(names: &[String]) -> Self {
        let by_name = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { by_name }
    }

    /// Raw cell value; `.` and `?` (CIF null markers) collapse to `None`.
    fn get<'a>(&self, row: &'a AtomSiteRow, field: &str) -> Option<&'a str> {
        self.by_name
            .get(field)
            .and_then(|&i| row.values.get(i))
            .map(|s| s.as_str())
            .filter(|s| *s != "." && *s != "?")
    }

    /// First present value among `auth_*` and `label_*` variants of a field.
    fn get_either<'a>(&self, row: &'a AtomSiteRow, auth: &str, label: &str) -> Option<&'a str> {
        self.get(row, auth).or_else(|| self.get(row, label))
    }

    fn require<'a>(
        &self,
        row: &'a AtomSiteRow,
        auth: &str,
        label: &str,
    ) -> Result<&'a str, CifError> {
        self.get_either(row, auth, label).ok_or_else(|| CifError::Parse {
            line: row.line,
            kind: CifParseErrorKind::MissingField {
                field: label.to_string(),
            },
        })
    }

    fn parse_f64(&self, row: &AtomSiteRow, field: &str) -> Result<f64, CifError> {
        let value = self.get(row, field).ok_or_else(|| CifError::Parse {
            line: row.line,
            kind: CifParseErrorKind::MissingField {
                field: field.to_string(),
            },
        })?;
        value.parse().map_err(|_| CifError::Parse {
            line: row.line,
            kind: CifParseErrorKind::InvalidFloat {
                field: field.to_string(),
                value: value.to_string(),
            },
        })
    }

    fn parse_f64_opt(&self, row: &AtomSiteRow, field: &str) -> Option<f64> {
        self.get(row, field).and_then(|v| v.parse().ok())
    }
}

impl StructureReader for CifFile {
    type Error = CifError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line?);
        }

        let mut structure_id = String::new();
        let mut field_names: Vec<String> = Vec::new();
        let mut rows: Vec<AtomSiteRow> = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let trimmed = lines[i].trim();

            if trimmed.starts_with(';') {
                // Multi-line text value; skip to the terminating semicolon.
                i += 1;
                while i < lines.len() && !lines[i].starts_with(';') {
                    i += 1;
                }
                i += 1;
                continue;
            }
            if let Some(id) = trimmed.strip_prefix("data_") {
                if structure_id.is_empty() {
                    structure_id = id.to_string();
                }
                i += 1;
                continue;
            }
            if trimmed == "loop_" {
                // Peek past blank/comment lines for the first field name.
                let mut j = i + 1;
                while j < lines.len() {
                    let next = lines[j].trim();
                    if next.is_empty() || next.starts_with('#') {
                        j += 1;
                        continue;
                    }
                    break;
                }
                if j < lines.len() && lines[j].trim().starts_with("_atom_site.") {
                    let consumed = Self::parse_atom_site_loop(
                        &lines[j..],
                        j,
                        &mut field_names,
                        &mut rows,
                    )?;
                    i = j + consumed;
                    continue;
                }
            }
            i += 1;
        }

        if rows.is_empty() {
            return Err(CifError::MissingRecord("_atom_site loop".to_string()));
        }

        Self::build_structure(&structure_id, &field_names, &rows)
    }
}

impl CifFile {
    /// Parses the `_atom_site` loop starting at its first header line.
    ///
    /// Returns the number of lines consumed. Data values may wrap across
    /// physical lines; tokens accumulate until a full row is assembled.
    fn parse_atom_site_loop(
        lines: &[String],
        base_line: usize,
        field_names: &mut Vec<String>,
        rows: &mut Vec<AtomSiteRow>,
    ) -> Result<usize, CifError> {
        let mut i = 0;

        while i < lines.len() {
            let trimmed = lines[i].trim();
            if trimmed.starts_with("_atom_site.") {
                field_names.push(trimmed.split_whitespace().next().unwrap_or("").to_string());
                i += 1;
            } else {
                break;
            }
        }

        let expected = field_names.len();
        let mut pending: Vec<String> = Vec::new();
        let mut pending_start = 0usize;

        while i < lines.len() {
            let trimmed = lines[i].trim();

            if trimmed.is_empty() {
                i += 1;
                continue;
            }
            if trimmed.starts_with('#')
                || trimmed.starts_with("loop_")
                || trimmed.starts_with("data_")
                || (trimmed.starts_with('_') && pending.is_empty())
            {
                break;
            }

            if trimmed.starts_with(';') {
                // A semicolon-delimited text block is a single value.
                let mut text = String::from(trimmed.trim_start_matches(';'));
                i += 1;
                while i < lines.len() && !lines[i].starts_with(';') {
                    text.push('\n');
                    text.push_str(&lines[i]);
                    i += 1;
                }
                i += 1;
                if pending.is_empty() {
                    pending_start = base_line + i;
                }
                pending.push(text);
            } else {
                if pending.is_empty() {
                    pending_start = base_line + i + 1;
                }
                pending.extend(tokenize(trimmed));
                i += 1;
            }

            if pending.len() >= expected {
                if pending.len() > expected {
                    return Err(CifError::Parse {
                        line: pending_start,
                        kind: CifParseErrorKind::ColumnMismatch {
                            expected,
                            found: pending.len(),
                        },
                    });
                }
                rows.push(AtomSiteRow {
                    line: pending_start,
                    values: std::mem::take(&mut pending),
                });
            }
        }

        if !pending.is_empty() {
            return Err(CifError::Parse {
                line: pending_start,
                kind: CifParseErrorKind::ColumnMismatch {
                    expected,
                    found: pending.len(),
                },
            });
        }

        Ok(i)
    }

    fn build_structure(
        structure_id: &str,
        field_names: &[String],
        rows: &[AtomSiteRow],
    ) -> Result<Structure, CifError> {
        let fields = FieldIndex::new(field_names);
        let mut structure = Structure::new(structure_id);
        // (model number, chain char) -> next fallback residue number
        let mut fallback_seq: HashMap<(i32, char), i64> = HashMap::new();

        for row in rows {
            let model_number: i32 = match fields.get(row, "_atom_site.pdbx_PDB_model_num") {
                Some(v) => v.parse().map_err(|_| CifError::Parse {
                    line: row.line,
                    kind: CifParseErrorKind::InvalidInt {
                        field: "_atom_site.pdbx_PDB_model_num".to_string(),
                        value: v.to_string(),
                    },
                })?,
                None => 1,
            };

            if structure.models.last().map(|m| m.number) != Some(model_number)
                && structure.model(model_number).is_none()
            {
                structure.models.push(Model {
                    number: model_number,
                    system: MolecularSystem::new(),
                });
            }
            let system = &mut structure
                .models
                .iter_mut()
                .find(|m| m.number == model_number)
                .expect("model inserted above")
                .system;

            let group = fields.get(row, "_atom_site.group_PDB").unwrap_or("ATOM");
            let is_hetero = group == "HETATM";

            let serial_str = fields.require(row, "_atom_site.id", "_atom_site.id")?;
            let serial: u32 = serial_str.parse().map_err(|_| CifError::Parse {
                line: row.line,
                kind: CifParseErrorKind::InvalidInt {
                    field: "_atom_site.id".to_string(),
                    value: serial_str.to_string(),
                },
            })?;

            let atom_name = fields.require(
                row,
                "_atom_site.auth_atom_id",
                "_atom_site.label_atom_id",
            )?;
            let comp_id = fields.require(
                row,
                "_atom_site.auth_comp_id",
                "_atom_site.label_comp_id",
            )?;
            let asym_id = fields.require(
                row,
                "_atom_site.auth_asym_id",
                "_atom_site.label_asym_id",
            )?;
            let chain_char = asym_id.chars().next().unwrap_or('A');

            let seq_id: i64 = match fields.get_either(
                row,
                "_atom_site.auth_seq_id",
                "_atom_site.label_seq_id",
            ) {
                Some(v) => v.parse().map_err(|_| CifError::Parse {
                    line: row.line,
                    kind: CifParseErrorKind::InvalidInt {
                        field: "_atom_site.auth_seq_id".to_string(),
                        value: v.to_string(),
                    },
                })?,
                // Waters and ligands sometimes carry no sequence number;
                // assign the next free number in this chain.
                None => {
                    let counter = fallback_seq
                        .entry((model_number, chain_char))
                        .or_insert(0);
                    *counter += 1;
                    *counter
                }
            };
            if let Some(counter) = fallback_seq.get_mut(&(model_number, chain_char)) {
                *counter = (*counter).max(seq_id);
            } else {
                fallback_seq.insert((model_number, chain_char), seq_id);
            }

            let insertion_code = fields
                .get(row, "_atom_site.pdbx_PDB_ins_code")
                .and_then(|s| s.chars().next());
            let altloc = fields
                .get(row, "_atom_site.label_alt_id")
                .and_then(|s| s.chars().next());
            let element = fields
                .get(row, "_atom_site.type_symbol")
                .map(|s| s.to_string());

            let x = fields.parse_f64(row, "_atom_site.Cartn_x")?;
            let y = fields.parse_f64(row, "_atom_site.Cartn_y")?;
            let z = fields.parse_f64(row, "_atom_site.Cartn_z")?;
            let occupancy = fields.parse_f64_opt(row, "_atom_site.occupancy").unwrap_or(1.0);
            let b_factor = fields
                .parse_f64_opt(row, "_atom_site.B_iso_or_equiv")
                .unwrap_or(0.0);

            let chain_id = system.add_chain(chain_char);
            let kind = classify_residue(comp_id);
            let residue_id = system
                .add_residue(chain_id, seq_id, insertion_code, comp_id, kind)
                .expect("chain inserted above");

            let mut atom = Atom::new(serial, atom_name, residue_id, Point3::new(x, y, z));
            atom.element = element;
            atom.altloc = altloc;
            atom.occupancy = occupancy;
            atom.b_factor = b_factor;
            atom.is_hetero = is_hetero;
            system.add_atom_to_residue(residue_id, atom);
        }

        Ok(structure)
    }
}

/// Tokenizes a single CIF data line, respecting single- and double-quoted
/// values.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        if chars[i] == '#' {
            break;
        }
        if chars[i] == '\'' || chars[i] == '"' {
            let quote = chars[i];
            i += 1;
            let start = i;
            while i < len && chars[i] != quote {
                i += 1;
            }
            tokens.push(chars[start..i].iter().collect());
            if i < len {
                i += 1; // closing quote
            }
            continue;
        }
        let start = i;
        while i < len && !chars[i].is_whitespace() {
            i += 1;
        }
        tokens.push(chars[start..i].iter().collect());
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    const MINIMAL_CIF: &str = "\
data_bzjob1
#
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.pdbx_PDB_ins_code
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
_atom_site.pdbx_PDB_model_num
ATOM 1 N N . ALA A 1 ? 1.000 2.000 3.000 1.00 88.10 1
ATOM 2 C CA . ALA A 1 ? 2.000 2.000 3.000 1.00 90.55 1
ATOM 3 P P . U B 1 ? 8.000 1.000 2.000 1.00 77.20 1
HETATM 4 O O . HOH C 1 ? 9.000 9.000 9.000 1.00 30.00 1
#
";

    fn parse(text: &str) -> Structure {
        let mut reader = BufReader::new(text.as_bytes());
        CifFile::read_from(&mut reader).unwrap()
    }

    #[test]
    fn parses_minimal_cif() {
        let s = parse(MINIMAL_CIF);
        assert_eq!(s.id, "bzjob1");
        assert_eq!(s.models.len(), 1);
        assert_eq!(s.models[0].number, 1);
        assert_eq!(s.models[0].system.atom_count(), 4);

        let system = &s.models[0].system;
        let chains: Vec<char> = system.chains_ordered().map(|(_, c)| c.id).collect();
        assert_eq!(chains, vec!['A', 'B', 'C']);
    }

    #[test]
    fn classifies_residues_while_parsing() {
        use crate::core::chem::ResidueKind;
        let s = parse(MINIMAL_CIF);
        let system = &s.models[0].system;
        let kinds: Vec<ResidueKind> = system.residues_ordered().map(|(_, r)| r.kind).collect();
        assert_eq!(
            kinds,
            vec![ResidueKind::Protein, ResidueKind::Rna, ResidueKind::Water]
        );
    }

    #[test]
    fn parses_coordinates_and_bfactors() {
        let s = parse(MINIMAL_CIF);
        let system = &s.models[0].system;
        let (_, first) = system.atoms_ordered().next().unwrap();
        assert_eq!(first.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(first.b_factor, 88.10);
        assert_eq!(first.occupancy, 1.0);
        assert_eq!(first.element.as_deref(), Some("N"));
    }

    #[test]
    fn splits_models_by_model_number() {
        let text = "\
data_ens
loop_
_atom_site.group_PDB
_atom_site.id
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
_atom_site.pdbx_PDB_model_num
ATOM 1 CA . ALA A 1 1.0 2.0 3.0 1.00 10.00 1
ATOM 2 CA . ALA A 1 1.5 2.5 3.5 1.00 11.00 2
";
        let s = parse(text);
        assert_eq!(s.models.len(), 2);
        assert_eq!(s.models[0].number, 1);
        assert_eq!(s.models[1].number, 2);
        assert_eq!(s.models[0].system.atom_count(), 1);
        assert_eq!(s.models[1].system.atom_count(), 1);
    }

    #[test]
    fn prefers_auth_fields_over_label() {
        let text = "\
data_auth
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.auth_asym_id
_atom_site.auth_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
ATOM 1 CA . ALA A 1 Q 55 1.0 2.0 3.0
";
        let s = parse(text);
        let system = &s.models[0].system;
        let chains: Vec<char> = system.chains_ordered().map(|(_, c)| c.id).collect();
        assert_eq!(chains, vec!['Q']);
        let (_, residue) = system.residues_ordered().next().unwrap();
        assert_eq!(residue.number, 55);
    }

    #[test]
    fn altloc_and_null_markers() {
        let text = "\
data_alt
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
ATOM 1 CA A SER A 1 1.0 2.0 3.0 0.60
ATOM 2 CA B SER A 1 1.1 2.1 3.1 0.40
";
        let s = parse(text);
        let system = &s.models[0].system;
        let altlocs: Vec<Option<char>> =
            system.atoms_ordered().map(|(_, a)| a.altloc).collect();
        assert_eq!(altlocs, vec![Some('A'), Some('B')]);
        let occs: Vec<f64> = system.atoms_ordered().map(|(_, a)| a.occupancy).collect();
        assert_eq!(occs, vec![0.60, 0.40]);
    }

    #[test]
    fn quoted_atom_names_are_single_tokens() {
        let tokens = tokenize("ATOM 1 \"O5'\" . U A 1");
        assert_eq!(tokens[2], "O5'");
        let tokens = tokenize("ATOM 'C 1' rest");
        assert_eq!(tokens[1], "C 1");
    }

    #[test]
    fn missing_atom_site_loop_is_an_error() {
        let text = "data_empty\nloop_\n_entity.id\n_entity.type\n1 polymer\n";
        let mut reader = BufReader::new(text.as_bytes());
        let err = CifFile::read_from(&mut reader).unwrap_err();
        assert!(matches!(err, CifError::MissingRecord(_)));
    }

    #[test]
    fn column_mismatch_is_reported_with_line() {
        let text = "\
data_bad
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.label_atom_id
ATOM 1 CA extra1 extra2 extra3 extra4
";
        let mut reader = BufReader::new(text.as_bytes());
        let err = CifFile::read_from(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            CifError::Parse {
                kind: CifParseErrorKind::ColumnMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn skips_semicolon_text_blocks_outside_atom_site() {
        let text = "\
data_semi
_struct.title
;
a long multi-line
title block
;
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
ATOM 1 CA . GLY A 1 1.0 2.0 3.0
";
        let s = parse(text);
        assert_eq!(s.models[0].system.atom_count(), 1);
    }
}
