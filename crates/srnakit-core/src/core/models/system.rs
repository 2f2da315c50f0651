use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use crate::core::chem::ResidueKind;
use slotmap::SlotMap;
use std::collections::HashMap;

/// Represents the atoms, residues and chains of one coordinate model.
///
/// This is the central data structure the parsers build and the conversion
/// pipeline edits. Entities are stored in slot maps and referenced by stable
/// IDs; chains keep their residues (and residues their atoms) in file order,
/// so writers can reproduce the source ordering after arbitrary removals.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms using a slot map for efficient ID management.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues using a slot map for efficient ID management.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains using a slot map for efficient ID management.
    chains: SlotMap<ChainId, Chain>,
    /// Chains in order of first appearance in the source file.
    chain_order: Vec<ChainId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
    /// Lookup map for finding residues by chain, sequence number and insertion code.
    residue_id_map: HashMap<(ChainId, i64, Option<char>), ResidueId>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable reference to an atom by its ID.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Retrieves an immutable reference to a residue by its ID.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Retrieves a mutable reference to a residue by its ID.
    pub fn residue_mut(&mut self, id: ResidueId) -> Option<&mut Residue> {
        self.residues.get_mut(id)
    }

    /// Retrieves an immutable reference to a chain by its ID.
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns chain IDs in file order.
    pub fn chain_ids(&self) -> &[ChainId] {
        &self.chain_order
    }

    /// Returns an iterator over chains in file order.
    pub fn chains_ordered(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|c| (id, c)))
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Finds a residue ID by chain, sequence number and insertion code.
    pub fn find_residue(
        &self,
        chain_id: ChainId,
        number: i64,
        insertion_code: Option<char>,
    ) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, number, insertion_code))
            .copied()
    }

    /// Number of atoms currently in the system.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of residues currently in the system.
    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    /// Returns `true` when the system holds no atoms.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Returns an iterator over all atoms in file order (chain, residue, atom).
    pub fn atoms_ordered(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.chains_ordered().flat_map(move |(_, chain)| {
            chain.residues().iter().flat_map(move |&res_id| {
                self.residues
                    .get(res_id)
                    .into_iter()
                    .flat_map(move |residue| {
                        residue
                            .atoms()
                            .iter()
                            .filter_map(move |&atom_id| {
                                self.atoms.get(atom_id).map(|a| (atom_id, a))
                            })
                    })
            })
        })
    }

    /// Returns residue IDs in file order across all chains.
    pub fn residues_ordered(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains_ordered().flat_map(move |(_, chain)| {
            chain
                .residues()
                .iter()
                .filter_map(move |&res_id| self.residues.get(res_id).map(|r| (res_id, r)))
        })
    }

    /// Adds a new chain to the system or returns the existing one.
    ///
    /// Idempotent; a chain that already exists keeps its position in the
    /// file order.
    pub fn add_chain(&mut self, id: char) -> ChainId {
        if let Some(&existing) = self.chain_id_map.get(&id) {
            return existing;
        }
        let chain_id = self.chains.insert(Chain::new(id));
        self.chain_id_map.insert(id, chain_id);
        self.chain_order.push(chain_id);
        chain_id
    }

    /// Adds a new residue to a chain or returns the existing one.
    ///
    /// Returns `None` if the chain does not exist.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        number: i64,
        insertion_code: Option<char>,
        name: &str,
        kind: ResidueKind,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        let key = (chain_id, number, insertion_code);

        let residue_id = *self.residue_id_map.entry(key).or_insert_with(|| {
            let residue = Residue::new(number, insertion_code, name, kind, chain_id);
            self.residues.insert(residue)
        });

        if !chain.residues.contains(&residue_id) {
            chain.residues.push(residue_id);
        }

        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// Returns `None` if the residue does not exist. The atom's `residue_id`
    /// is overwritten with the target residue.
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }
        atom.residue_id = residue_id;
        let atom_id = self.atoms.insert(atom);
        self.residues
            .get_mut(residue_id)
            .expect("residue checked above")
            .add_atom(atom_id);
        Some(atom_id)
    }

    /// Removes an atom from the system and its parent residue.
    ///
    /// Returns `Some(Atom)` if the atom existed and was removed.
    pub fn remove_atom(&mut self, atom_id: AtomId) -> Option<Atom> {
        let atom = self.atoms.remove(atom_id)?;
        if let Some(residue) = self.residues.get_mut(atom.residue_id) {
            residue.remove_atom(atom_id);
        }
        Some(atom)
    }

    /// Removes a residue and all of its atoms.
    ///
    /// Returns `Some(Residue)` if the residue existed and was removed.
    pub fn remove_residue(&mut self, residue_id: ResidueId) -> Option<Residue> {
        let residue = self.residues.get(residue_id)?.clone();

        for atom_id in residue.atoms().to_vec() {
            self.atoms.remove(atom_id);
        }

        if let Some(chain) = self.chains.get_mut(residue.chain_id) {
            chain.residues.retain(|&id| id != residue_id);
        }

        self.residue_id_map
            .remove(&(residue.chain_id, residue.number, residue.insertion_code));

        self.residues.remove(residue_id)
    }

    /// Removes a chain and all of its residues and atoms.
    pub fn remove_chain(&mut self, chain_id: ChainId) -> Option<Chain> {
        let chain = self.chains.get(chain_id)?.clone();
        for residue_id in chain.residues().to_vec() {
            self.remove_residue(residue_id);
        }
        self.chain_order.retain(|&id| id != chain_id);
        self.chain_id_map.retain(|_, &mut id| id != chain_id);
        self.chains.remove(chain_id)
    }

    /// Drops chains that no longer hold any residues.
    pub fn prune_empty_chains(&mut self) {
        let empty: Vec<ChainId> = self
            .chains
            .iter()
            .filter(|(_, chain)| chain.residues.is_empty())
            .map(|(id, _)| id)
            .collect();
        for chain_id in empty {
            self.remove_chain(chain_id);
        }
    }

    /// Renumbers the residue lookup key after a residue's number or insertion
    /// code changed.
    ///
    /// The caller mutates the residue first and then registers the new key;
    /// the stale key is dropped. Returns `false` if the residue is unknown.
    pub fn reindex_residue(
        &mut self,
        residue_id: ResidueId,
        old_key: (i64, Option<char>),
    ) -> bool {
        let Some(residue) = self.residues.get(residue_id) else {
            return false;
        };
        let chain_id = residue.chain_id;
        let new_key = (chain_id, residue.number, residue.insertion_code);
        self.residue_id_map
            .remove(&(chain_id, old_key.0, old_key.1));
        self.residue_id_map.insert(new_key, residue_id);
        true
    }

    /// Rebuilds the residue lookup map from scratch.
    ///
    /// Bulk renumbering can move a residue onto a key another residue still
    /// occupies; rebuilding once afterwards avoids that collision.
    pub fn rebuild_residue_index(&mut self) {
        self.residue_id_map.clear();
        for (residue_id, residue) in &self.residues {
            self.residue_id_map.insert(
                (residue.chain_id, residue.number, residue.insertion_code),
                residue_id,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    struct TestRefs {
        chain_a: ChainId,
        gly: ResidueId,
        gly_n: AtomId,
        gly_ca: AtomId,
        hoh: ResidueId,
    }

    fn create_test_system() -> (MolecularSystem, TestRefs) {
        let mut system = MolecularSystem::new();

        let chain_a = system.add_chain('A');
        let gly = system
            .add_residue(chain_a, 1, None, "GLY", ResidueKind::Protein)
            .unwrap();
        let gly_n = system
            .add_atom_to_residue(gly, Atom::new(1, "N", gly, Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        let gly_ca = system
            .add_atom_to_residue(gly, Atom::new(2, "CA", gly, Point3::new(1.4, 0.0, 0.0)))
            .unwrap();

        let chain_w = system.add_chain('W');
        let hoh = system
            .add_residue(chain_w, 101, None, "HOH", ResidueKind::Water)
            .unwrap();
        system
            .add_atom_to_residue(hoh, Atom::new(3, "O", hoh, Point3::new(5.0, 5.0, 5.0)))
            .unwrap();

        let refs = TestRefs {
            chain_a,
            gly,
            gly_n,
            gly_ca,
            hoh,
        };
        (system, refs)
    }

    #[test]
    fn system_creation_and_access() {
        let (system, refs) = create_test_system();

        assert_eq!(system.atom_count(), 3);
        assert_eq!(system.residue_count(), 2);
        assert_eq!(system.chain_ids().len(), 2);
        assert!(system.find_chain_by_id('B').is_none());
        assert_eq!(system.find_chain_by_id('A'), Some(refs.chain_a));
        assert_eq!(system.find_residue(refs.chain_a, 1, None), Some(refs.gly));
        assert_eq!(system.atom(refs.gly_n).unwrap().name, "N");
    }

    #[test]
    fn chains_and_atoms_iterate_in_file_order() {
        let (system, _) = create_test_system();

        let chain_ids: Vec<char> = system.chains_ordered().map(|(_, c)| c.id).collect();
        assert_eq!(chain_ids, vec!['A', 'W']);

        let atom_names: Vec<&str> = system
            .atoms_ordered()
            .map(|(_, a)| a.name.as_str())
            .collect();
        assert_eq!(atom_names, vec!["N", "CA", "O"]);
    }

    #[test]
    fn add_chain_is_idempotent() {
        let (mut system, refs) = create_test_system();
        assert_eq!(system.add_chain('A'), refs.chain_a);
        assert_eq!(system.chain_ids().len(), 2);
    }

    #[test]
    fn atom_removal_updates_parent_residue() {
        let (mut system, refs) = create_test_system();
        let removed = system.remove_atom(refs.gly_n).unwrap();

        assert_eq!(removed.name, "N");
        assert_eq!(system.atom_count(), 2);
        assert!(system.atom(refs.gly_n).is_none());
        assert_eq!(system.residue(refs.gly).unwrap().atoms(), &[refs.gly_ca]);
    }

    #[test]
    fn residue_removal_updates_chain_and_maps() {
        let (mut system, refs) = create_test_system();
        let removed = system.remove_residue(refs.gly).unwrap();

        assert_eq!(removed.name, "GLY");
        assert_eq!(system.residue_count(), 1);
        assert!(system.atom(refs.gly_n).is_none());
        assert!(system.atom(refs.gly_ca).is_none());
        assert!(system.find_residue(refs.chain_a, 1, None).is_none());
        assert!(system.chain(refs.chain_a).unwrap().residues().is_empty());
    }

    #[test]
    fn prune_empty_chains_drops_emptied_chains_only() {
        let (mut system, refs) = create_test_system();
        system.remove_residue(refs.gly);
        system.prune_empty_chains();

        assert!(system.find_chain_by_id('A').is_none());
        assert!(system.find_chain_by_id('W').is_some());
        let _ = refs.hoh;
    }

    #[test]
    fn reindex_residue_moves_lookup_key() {
        let (mut system, refs) = create_test_system();

        let old_key = system.residue(refs.gly).unwrap().seq_key();
        system.residue_mut(refs.gly).unwrap().number = 42;
        assert!(system.reindex_residue(refs.gly, old_key));

        assert!(system.find_residue(refs.chain_a, 1, None).is_none());
        assert_eq!(system.find_residue(refs.chain_a, 42, None), Some(refs.gly));
    }
}
