//! The structure conversion pipeline.
//!
//! Takes a parsed [`Structure`] and applies model selection, residue-kind
//! filtering, hydrogen removal, alternate-location handling and optional
//! renumbering, producing a structure ready for the PDB writer.

pub mod altloc;

use crate::core::chem::{ResidueKind, is_hydrogen};
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::structure::{Model, Structure};
use crate::core::models::system::MolecularSystem;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Model {requested} not found (available: {})",
        available.iter().map(i32::to_string).collect::<Vec<_>>().join(", "))]
    ModelNotFound { requested: i32, available: Vec<i32> },
    #[error("No atoms left after filtering")]
    EmptyResult,
}

/// How alternate atom locations are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AltlocPolicy {
    /// Keep the best-occupied location per atom name and clear the
    /// indicator.
    #[default]
    BestOccupancy,
    /// Keep every location with its indicator intact.
    KeepAll,
}

/// Options controlling one conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Model number to keep; `None` keeps every model in the file.
    pub model: Option<i32>,
    /// Keep hydrogen and deuterium atoms.
    pub keep_hydrogens: bool,
    /// Residue kinds to keep; an empty set keeps everything.
    pub kinds: HashSet<ResidueKind>,
    /// Alternate-location policy.
    pub altloc: AltlocPolicy,
    /// Renumber residues from 1 per chain, clearing insertion codes.
    pub renumber: bool,
}

/// Counts reported after a conversion, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub models: usize,
    pub atoms_in: usize,
    pub atoms_out: usize,
    pub residues_dropped: usize,
    pub hydrogens_dropped: usize,
    pub altlocs_pruned: usize,
}

/// Runs the conversion pipeline over `structure`.
///
/// Filters are applied in a fixed order: model selection, residue-kind
/// filtering, hydrogen removal, altloc resolution, then renumbering. Chains
/// emptied by filtering are dropped.
///
/// # Errors
///
/// Returns [`ConvertError::ModelNotFound`] when the requested model number
/// is absent, and [`ConvertError::EmptyResult`] when filtering removes every
/// atom.
pub fn convert(structure: &Structure, options: &ConvertOptions) -> Result<(Structure, ConvertSummary), ConvertError> {
    let mut summary = ConvertSummary {
        atoms_in: structure.atom_count(),
        ..Default::default()
    };

    let mut result = Structure::new(&structure.id);
    result.models = select_models(structure, options)?;
    summary.models = result.models.len();

    for model in &mut result.models {
        let system = &mut model.system;

        if !options.kinds.is_empty() {
            summary.residues_dropped += filter_kinds(system, &options.kinds);
        }
        if !options.keep_hydrogens {
            summary.hydrogens_dropped += strip_hydrogens(system);
        }
        if options.altloc == AltlocPolicy::BestOccupancy {
            summary.altlocs_pruned += altloc::select_best_altlocs(system);
        }

        drop_empty_residues(system);
        system.prune_empty_chains();

        if options.renumber {
            renumber_chains(system);
        }
    }

    summary.atoms_out = result.atom_count();
    if summary.atoms_out == 0 {
        return Err(ConvertError::EmptyResult);
    }
    Ok((result, summary))
}

fn select_models(structure: &Structure, options: &ConvertOptions) -> Result<Vec<Model>, ConvertError> {
    match options.model {
        Some(number) => structure
            .model(number)
            .map(|m| vec![m.clone()])
            .ok_or_else(|| ConvertError::ModelNotFound {
                requested: number,
                available: structure.models.iter().map(|m| m.number).collect(),
            }),
        None => Ok(structure.models.clone()),
    }
}

fn filter_kinds(system: &mut MolecularSystem, kinds: &HashSet<ResidueKind>) -> usize {
    let doomed: Vec<ResidueId> = system
        .residues_ordered()
        .filter(|(_, r)| !kinds.contains(&r.kind))
        .map(|(id, _)| id)
        .collect();
    for residue_id in &doomed {
        system.remove_residue(*residue_id);
    }
    doomed.len()
}

fn strip_hydrogens(system: &mut MolecularSystem) -> usize {
    let doomed: Vec<AtomId> = system
        .atoms_ordered()
        .filter(|(_, a)| is_hydrogen(&a.name, a.element.as_deref()))
        .map(|(id, _)| id)
        .collect();
    for atom_id in &doomed {
        system.remove_atom(*atom_id);
    }
    doomed.len()
}

fn drop_empty_residues(system: &mut MolecularSystem) {
    let doomed: Vec<ResidueId> = system
        .residues_ordered()
        .filter(|(_, r)| r.atoms().is_empty())
        .map(|(id, _)| id)
        .collect();
    for residue_id in doomed {
        system.remove_residue(residue_id);
    }
}

fn renumber_chains(system: &mut MolecularSystem) {
    let per_chain: Vec<Vec<ResidueId>> = system
        .chain_ids()
        .iter()
        .filter_map(|&chain_id| system.chain(chain_id).map(|c| c.residues().to_vec()))
        .collect();

    for residues in per_chain {
        for (index, residue_id) in residues.into_iter().enumerate() {
            if let Some(residue) = system.residue_mut(residue_id) {
                residue.number = index as i64 + 1;
                residue.insertion_code = None;
            }
        }
    }
    system.rebuild_residue_index();
}
