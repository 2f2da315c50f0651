//! FASTA parsing.
//!
//! Handles the plain multi-record FASTA that NCBI efetch returns: a `>`
//! header holding an identifier and optional description, followed by
//! wrapped sequence lines.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Sequence data on line {0} appears before any '>' header")]
    DataBeforeHeader(usize),
    #[error("No FASTA records found")]
    Empty,
}

/// One FASTA record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// The first whitespace-delimited token after `>`.
    pub id: String,
    /// The remainder of the header line, if any.
    pub description: Option<String>,
    pub sequence: String,
}

/// Reads every record from a FASTA stream.
///
/// # Errors
///
/// Returns an error on I/O failure, on sequence data preceding the first
/// header, or when the stream holds no records at all.
pub fn read_fasta(reader: &mut impl BufRead) -> Result<Vec<FastaRecord>, FastaError> {
    let mut records: Vec<FastaRecord> = Vec::new();

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('>') {
            let mut parts = header.splitn(2, char::is_whitespace);
            let id = parts.next().unwrap_or("").to_string();
            let description = parts
                .next()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from);
            records.push(FastaRecord {
                id,
                description,
                sequence: String::new(),
            });
        } else {
            let Some(current) = records.last_mut() else {
                return Err(FastaError::DataBeforeHeader(line_num + 1));
            };
            current.sequence.push_str(trimmed);
        }
    }

    if records.is_empty() {
        return Err(FastaError::Empty);
    }
    Ok(records)
}

/// Reads every record from a FASTA file.
pub fn read_fasta_path<P: AsRef<Path>>(path: P) -> Result<Vec<FastaRecord>, FastaError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_fasta(&mut reader)
}

/// Indexes records by identifier. Later duplicates win, matching the
/// dictionary behaviour downstream tables rely on.
pub fn records_by_id(records: Vec<FastaRecord>) -> HashMap<String, FastaRecord> {
    records.into_iter().map(|r| (r.id.clone(), r)).collect()
}
