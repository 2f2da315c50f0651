use super::ids::ResidueId;
use crate::core::chem::ResidueKind;
use serde::Serialize;
use std::fmt;

/// Dominant composition of a chain, decided by majority residue kind.
///
/// Used by the viewer generators to label chains in the embedded UI; a chain
/// with more nucleotides than amino acids is RNA, one with any amino acids is
/// protein, anything else (pure ligand/water chains) is other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChainKind {
    Protein,
    Rna,
    Dna,
    Other,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChainKind::Protein => "Protein",
                ChainKind::Rna => "RNA",
                ChainKind::Dna => "DNA",
                ChainKind::Other => "Other",
            }
        )
    }
}

/// Classifies a chain from counts of its residue kinds.
pub fn chain_kind_from_counts(aa: usize, rna: usize, dna: usize) -> ChainKind {
    let nucl = rna + dna;
    if nucl > aa {
        if dna > rna { ChainKind::Dna } else { ChainKind::Rna }
    } else if aa > 0 {
        ChainKind::Protein
    } else {
        ChainKind::Other
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: char,                        // Chain identifier (e.g., 'A', 'B')
    pub(crate) residues: Vec<ResidueId>, // Ordered list of residue IDs belonging to this chain
}

impl Chain {
    pub(crate) fn new(id: char) -> Self {
        Self {
            id,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }
}

/// Convenience: ResidueKind counts feeding [`chain_kind_from_counts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KindCounts {
    pub aa: usize,
    pub rna: usize,
    pub dna: usize,
}

impl KindCounts {
    pub fn record(&mut self, kind: ResidueKind) {
        match kind {
            ResidueKind::Protein => self.aa += 1,
            ResidueKind::Rna => self.rna += 1,
            ResidueKind::Dna => self.dna += 1,
            ResidueKind::Water | ResidueKind::Ligand => {}
        }
    }

    pub fn chain_kind(&self) -> ChainKind {
        chain_kind_from_counts(self.aa, self.rna, self.dna)
    }
}
