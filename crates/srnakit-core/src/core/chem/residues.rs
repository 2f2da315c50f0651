use phf::phf_set;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The 20 standard amino acids plus nonstandard residues that still belong to
/// a polypeptide chain (selenomethionine and friends).
static AMINO_ACIDS: phf::Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "MSE", "SEC", "PYL", "HYP", "ASX", "GLX", "UNK",
};

/// Ribonucleotide names as they appear in mmCIF outputs, including the
/// modified bases Boltz-2 emits for sRNA targets.
static RNA_RESIDUES: phf::Set<&'static str> = phf_set! {
    "A", "U", "G", "C", "I", "PSU", "5MC",
};

static DNA_RESIDUES: phf::Set<&'static str> = phf_set! {
    "DA", "DT", "DG", "DC", "DI",
};

static WATER_RESIDUES: phf::Set<&'static str> = phf_set! {
    "HOH", "WAT",
};

/// Classification of a residue into the coarse categories the converter
/// filters on.
///
/// Mirrors the categories accepted by the converter's `--only` flag. Anything
/// that is not recognizably polymer or solvent falls back to [`ResidueKind::Ligand`],
/// which intentionally sweeps up modified nucleotides and other HETATM-style
/// residues with unknown names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidueKind {
    Protein,
    Rna,
    Dna,
    Water,
    Ligand,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown residue kind '{0}' (expected protein, rna, dna, ligand or water)")]
pub struct ParseResidueKindError(pub String);

impl FromStr for ResidueKind {
    type Err = ParseResidueKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "protein" => Ok(ResidueKind::Protein),
            "rna" => Ok(ResidueKind::Rna),
            "dna" => Ok(ResidueKind::Dna),
            "water" => Ok(ResidueKind::Water),
            "ligand" => Ok(ResidueKind::Ligand),
            other => Err(ParseResidueKindError(other.to_string())),
        }
    }
}

impl fmt::Display for ResidueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ResidueKind::Protein => "protein",
                ResidueKind::Rna => "rna",
                ResidueKind::Dna => "dna",
                ResidueKind::Water => "water",
                ResidueKind::Ligand => "ligand",
            }
        )
    }
}

/// Classifies a residue by its (upper-cased, trimmed) name.
///
/// Water wins first so that `HOH` marked as HETATM does not land in the
/// ligand bucket; polymer tables are consulted next; everything else is a
/// ligand, since prediction outputs frequently omit `HETATM` markers for
/// bound small molecules.
pub fn classify_residue(name: &str) -> ResidueKind {
    let name = name.trim().to_ascii_uppercase();
    if WATER_RESIDUES.contains(name.as_str()) {
        return ResidueKind::Water;
    }
    if AMINO_ACIDS.contains(name.as_str()) {
        return ResidueKind::Protein;
    }
    if RNA_RESIDUES.contains(name.as_str()) {
        return ResidueKind::Rna;
    }
    if DNA_RESIDUES.contains(name.as_str()) {
        return ResidueKind::Dna;
    }
    ResidueKind::Ligand
}

/// Reports whether an atom is a hydrogen (or deuterium).
///
/// Prefers the element symbol when present. When only the atom name is
/// available, leading digits are stripped before checking the first letter,
/// so primed names like `1H5'` and `2HB` are recognized.
pub fn is_hydrogen(name: &str, element: Option<&str>) -> bool {
    if let Some(el) = element {
        let el = el.trim();
        if !el.is_empty() {
            return el.eq_ignore_ascii_case("H") || el.eq_ignore_ascii_case("D");
        }
    }
    name.trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'H'))
}
