//! Provides input/output functionality for the file formats the toolkit
//! consumes and produces.
//!
//! mmCIF reading and PDB reading/writing share the [`traits`] interface and
//! build [`crate::core::models::structure::Structure`] values; [`npz`] reads
//! the NumPy archives that carry PAE/PDE/pLDDT confidence arrays.

pub mod cif;
pub mod npz;
pub mod pdb;
pub mod traits;
