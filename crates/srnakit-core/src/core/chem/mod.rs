//! Residue-name classification tables and rules.
//!
//! This module owns the static lookup tables used to decide whether a residue
//! is protein, RNA, DNA, water, or a free-standing ligand, plus the hydrogen
//! detection rule used when stripping hydrogens during conversion.

pub mod residues;

pub use residues::{ParseResidueKindError, ResidueKind, classify_residue, is_hydrogen};
