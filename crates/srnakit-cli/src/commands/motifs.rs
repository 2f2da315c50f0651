use crate::cli::MotifsArgs;
use crate::error::Result;
use srnakit::core::seq::fasta::read_fasta_path;
use srnakit::core::seq::motifs;
use std::io::Write;
use tracing::info;

pub fn run(args: MotifsArgs) -> Result<()> {
    let records = read_fasta_path(&args.input)?;
    info!("Loaded {} sequences from {}.", records.len(), args.input.display());

    match &args.out {
        Some(path) => {
            let writer = csv::Writer::from_path(path)?;
            write_report(&records, writer)?;
            println!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_report(&records, csv::Writer::from_writer(stdout.lock()))?;
        }
    }
    Ok(())
}

fn write_report<W: Write>(
    records: &[srnakit::core::seq::fasta::FastaRecord],
    mut writer: csv::Writer<W>,
) -> Result<()> {
    writer.write_record([
        "id",
        "length",
        "arn_motifs",
        "aan_motifs",
        "longest_arn_run",
        "longest_u_run",
        "longest_a_run",
        "longest_a_run_norm",
        "a_richness",
    ])?;

    for record in records {
        let seq = &record.sequence;
        writer.write_record([
            record.id.clone(),
            seq.len().to_string(),
            motifs::count_arn_motifs(seq).to_string(),
            motifs::count_aan_motifs(seq).to_string(),
            motifs::longest_arn_run(seq).to_string(),
            motifs::longest_u_run(seq).to_string(),
            motifs::longest_a_run(seq).to_string(),
            format!("{:.6}", motifs::longest_a_run_normalized(seq)),
            format!("{:.6}", motifs::a_richness(seq)),
        ])?;
    }
    writer.flush().map_err(crate::error::CliError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn report_holds_one_row_per_record_with_all_counters() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("seqs.fasta");
        let out = dir.path().join("report.csv");
        fs::write(&fasta, ">s1\nAAGAAGAT\n>s2\nGGCC\n").unwrap();

        run(MotifsArgs {
            input: fasta,
            out: Some(out.clone()),
        })
        .unwrap();

        let text = fs::read_to_string(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,length,arn_motifs"));
        assert_eq!(lines[1], "s1,8,2,2,2,1,2,0.250000,0.625000");
        assert_eq!(lines[2], "s2,4,0,0,0,0,0,0.000000,0.000000");
    }
}
