use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "srnakit - structure-file conversion, confidence viewers, and sequence utilities for sRNA design work.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert mmCIF structure files to PDB.
    Convert(ConvertArgs),
    /// Generate self-contained HTML viewer pages.
    View(ViewArgs),
    /// Compute motif statistics over a FASTA file and emit a CSV report.
    Motifs(MotifsArgs),
    /// Fetch nucleotide sequences from NCBI for every row of a CSV table.
    Fetch(FetchArgs),
    /// Convert a tab-delimited text file to CSV.
    Tab2csv(Tab2csvArgs),
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input .cif/.mmcif files (you can pass multiple)
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Output PDB file (only valid with a single input).
    /// If omitted, writes alongside each input with a .pdb extension.
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Keep only this model number. If omitted, all models are written.
    #[arg(long, value_name = "N")]
    pub model: Option<i32>,

    /// When multiple models exist, write one PDB per model with suffix
    /// _modelN.pdb instead of a single MODEL/ENDMDL-wrapped file
    /// (ignored if --model is set).
    #[arg(long)]
    pub all_models: bool,

    /// Drop hydrogens.
    #[arg(long = "no-h")]
    pub no_h: bool,

    /// Comma list to include: protein,rna,dna,ligand,water. Empty=keep all.
    #[arg(long, value_name = "KINDS", default_value = "")]
    pub only: String,

    /// Keep all altlocs instead of selecting best by occupancy.
    #[arg(long)]
    pub keep_altloc: bool,

    /// Renumber residues per chain starting at 1.
    #[arg(long)]
    pub renumber: bool,
}

/// Arguments for the `view` subcommand.
#[derive(Args, Debug)]
pub struct ViewArgs {
    #[command(subcommand)]
    pub command: ViewCommands,
}

#[derive(Subcommand, Debug)]
pub enum ViewCommands {
    /// Build a multi-structure browser page.
    Structures(ViewStructuresArgs),
    /// Build a prediction-confidence page for one Boltz-2 result.
    Confidence(ViewConfidenceArgs),
}

#[derive(Args, Debug)]
pub struct ViewStructuresArgs {
    /// Path to a .cif/.mmcif file. Repeat for multiple.
    #[arg(long = "cif", value_name = "PATH")]
    pub cifs: Vec<PathBuf>,

    /// Path to a .pdb file. Repeat for multiple.
    #[arg(long = "pdb", value_name = "PATH")]
    pub pdbs: Vec<PathBuf>,

    /// Output HTML file path.
    #[arg(long, default_value = "structures.html", value_name = "PATH")]
    pub out: PathBuf,

    /// HTML page title.
    #[arg(long, default_value = "Structure viewer")]
    pub title: String,
}

#[derive(Args, Debug)]
pub struct ViewConfidenceArgs {
    /// Path to the structure file (cif).
    #[arg(long, required = true, value_name = "PATH")]
    pub cif: PathBuf,

    /// Path to confidence.json.
    #[arg(long, value_name = "PATH")]
    pub conf: Option<PathBuf>,

    /// Path to pae.npz (key='pae').
    #[arg(long, value_name = "PATH")]
    pub pae: Option<PathBuf>,

    /// Path to pde.npz (key='pde').
    #[arg(long, value_name = "PATH")]
    pub pde: Option<PathBuf>,

    /// Path to plddt.npz (key='plddt').
    #[arg(long, value_name = "PATH")]
    pub plddt: Option<PathBuf>,

    /// Output HTML file path.
    #[arg(long, default_value = "confidence.html", value_name = "PATH")]
    pub out: PathBuf,

    /// HTML page title.
    #[arg(long, default_value = "Boltz-2 result")]
    pub title: String,
}

/// Arguments for the `motifs` subcommand.
#[derive(Args, Debug)]
pub struct MotifsArgs {
    /// Input FASTA file.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output CSV path. Writes to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Arguments for the `fetch` subcommand.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Input CSV with seqID, start, end and strand columns.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output CSV path; also used for per-batch checkpoints.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub out: PathBuf,

    /// Contact email passed to NCBI E-utilities.
    #[arg(long, required = true)]
    pub email: String,

    /// NCBI API key (raises the request rate limit).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Rows fetched between two checkpoint writes.
    #[arg(long, default_value_t = 100, value_name = "N")]
    pub batch_size: usize,
}

/// Arguments for the `tab2csv` subcommand.
#[derive(Args, Debug)]
pub struct Tab2csvArgs {
    /// Input tab-delimited text file.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output CSV file.
    #[arg(required = true, value_name = "PATH")]
    pub output: PathBuf,
}
