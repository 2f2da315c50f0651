//! Provides the molecular data model shared by the I/O and conversion layers.
//!
//! A parsed file becomes a [`structure::Structure`]: an identifier plus one
//! [`system::MolecularSystem`] per coordinate model. Atoms, residues and
//! chains live in slot maps and are referenced by stable IDs, so filtering
//! passes can remove entities without invalidating the rest of the system.

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod structure;
pub mod system;
