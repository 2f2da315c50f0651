//! # Core Module
//!
//! Fundamental building blocks for structure-file handling: the molecular
//! data model, residue-name classification, mmCIF/PDB/NPZ I/O, the
//! CIF-to-PDB conversion pipeline, and sequence utilities.
//!
//! The module is organized into specialized submodules:
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, models, structures
//! - **Residue Classification** ([`chem`]) - Name tables and kind/hydrogen rules
//! - **File I/O** ([`io`]) - mmCIF reading, PDB reading/writing, NPZ arrays
//! - **Conversion** ([`convert`]) - Altloc selection, kind filtering, renumbering
//! - **Sequences** ([`seq`]) - FASTA loading and RNA motif counting

pub mod chem;
pub mod convert;
pub mod io;
pub mod models;
pub mod seq;
