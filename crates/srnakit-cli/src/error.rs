use srnakit::core::convert::ConvertError;
use srnakit::core::io::cif::CifError;
use srnakit::core::io::npz::NpzError;
use srnakit::core::io::pdb::PdbError;
use srnakit::core::seq::fasta::FastaError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Cif {
        path: PathBuf,
        #[source]
        source: CifError,
    },

    #[error(transparent)]
    Pdb(#[from] PdbError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Npz(#[from] NpzError),

    #[error(transparent)]
    Fasta(#[from] FastaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to render page: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),
}
