use super::ids::{AtomId, ChainId};
use crate::core::chem::ResidueKind;

/// Represents a residue: one amino acid, nucleotide, water or ligand group.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub number: i64,               // Residue sequence number from the source file
    pub insertion_code: Option<char>, // PDB insertion code, if any
    pub name: String,              // Residue name (e.g., "ALA", "U", "HOH")
    pub kind: ResidueKind,         // Coarse classification used for filtering
    pub chain_id: ChainId,         // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>, // Atom IDs in file order
}

impl Residue {
    pub(crate) fn new(
        number: i64,
        insertion_code: Option<char>,
        name: &str,
        kind: ResidueKind,
        chain_id: ChainId,
    ) -> Self {
        Self {
            number,
            insertion_code,
            name: name.to_string(),
            kind,
            chain_id,
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_id: AtomId) {
        self.atoms.push(atom_id);
    }

    pub(crate) fn remove_atom(&mut self, atom_id: AtomId) {
        self.atoms.retain(|&id| id != atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// The (number, insertion code) pair identifying this residue within its chain.
    pub fn seq_key(&self) -> (i64, Option<char>) {
        (self.number, self.insertion_code)
    }
}
