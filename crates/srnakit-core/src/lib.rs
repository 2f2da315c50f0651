//! # srnakit Core Library
//!
//! Utilities for working with structure-prediction outputs (Boltz-2 and
//! friends) in sRNA design workflows: mmCIF parsing, PDB conversion with
//! altloc/occupancy selection, confidence-array (`.npz`) reading, standalone
//! HTML viewer generation, and small-RNA sequence analysis.
//!
//! ## Organization
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`,
//!   `MolecularSystem`), residue classification tables, file I/O for mmCIF,
//!   PDB and NumPy `.npz` archives, the conversion pipeline, and sequence
//!   utilities (FASTA loading, motif counting).
//!
//! - **[`viewer`]: HTML Generation.** Builders for self-contained 3Dmol.js
//!   viewer pages: a multi-structure browser and a Boltz-2 confidence viewer
//!   with embedded PAE/PDE/pLDDT payloads.

pub mod core;
pub mod viewer;
