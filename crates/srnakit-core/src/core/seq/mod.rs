//! Sequence handling: FASTA records and small-RNA motif statistics.

pub mod fasta;
pub mod motifs;
