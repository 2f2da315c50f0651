//! Occupancy-based selection of alternate atom locations.

use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;

/// Tie-break rank for equally occupied locations: 'A' beats the blank
/// location, which beats any other indicator. Equal ranks keep the earlier
/// atom in file order.
fn altloc_rank(altloc: Option<char>) -> u8 {
    match altloc {
        Some('A') => 0,
        None => 1,
        Some(_) => 2,
    }
}

const OCC_EPSILON: f64 = 1e-9;

/// Collapses alternate locations to the best-occupied atom per name.
///
/// Within each residue, atoms sharing a name form one location group; the
/// location with the highest occupancy survives and its altloc indicator is
/// cleared. Returns the number of atoms removed.
pub fn select_best_altlocs(system: &mut MolecularSystem) -> usize {
    let mut losers: Vec<AtomId> = Vec::new();
    let mut winners: Vec<AtomId> = Vec::new();

    for (_, residue) in system.residues_ordered() {
        let mut groups: Vec<(&str, Vec<AtomId>)> = Vec::new();
        for &atom_id in residue.atoms() {
            let Some(atom) = system.atom(atom_id) else {
                continue;
            };
            match groups.iter_mut().find(|(name, _)| *name == atom.name) {
                Some((_, ids)) => ids.push(atom_id),
                None => groups.push((&atom.name, vec![atom_id])),
            }
        }

        for (_, ids) in groups {
            let mut best = ids[0];
            for &candidate in &ids[1..] {
                let (b, c) = (
                    system.atom(best).expect("grouped above"),
                    system.atom(candidate).expect("grouped above"),
                );
                if c.occupancy > b.occupancy + OCC_EPSILON
                    || ((c.occupancy - b.occupancy).abs() <= OCC_EPSILON
                        && altloc_rank(c.altloc) < altloc_rank(b.altloc))
                {
                    best = candidate;
                }
            }
            winners.push(best);
            losers.extend(ids.into_iter().filter(|&id| id != best));
        }
    }

    let removed = losers.len();
    for atom_id in losers {
        system.remove_atom(atom_id);
    }
    for atom_id in winners {
        if let Some(atom) = system.atom_mut(atom_id) {
            atom.altloc = None;
        }
    }
    removed
}
