use crate::cli::FetchArgs;
use crate::error::{CliError, Result};
use csv::StringRecord;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use srnakit::core::seq::fasta::read_fasta;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Column indices of the fields one efetch call needs.
struct Columns {
    seq_id: usize,
    start: usize,
    end: usize,
    strand: usize,
}

fn required_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| CliError::Argument(format!("input CSV lacks a '{name}' column")))
}

/// Maps GFF-style strand symbols to the E-utilities strand parameter.
/// Values that are already numeric pass through.
fn strand_param(raw: &str) -> &str {
    match raw.trim() {
        "+" => "1",
        "-" => "2",
        other => other,
    }
}

pub async fn run(args: FetchArgs) -> Result<()> {
    let mut reader = csv::Reader::from_path(&args.input)?;
    let headers = reader.headers()?.clone();
    let columns = Columns {
        seq_id: required_column(&headers, "seqID")?,
        start: required_column(&headers, "start")?,
        end: required_column(&headers, "end")?,
        strand: required_column(&headers, "strand")?,
    };

    let rows: Vec<StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    let mut sequences = vec![String::new(); rows.len()];

    let client = Client::new();
    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr_with_hz(2));

    let batch_size = args.batch_size.max(1);
    for batch_start in (0..rows.len()).step_by(batch_size) {
        let batch_end = (batch_start + batch_size).min(rows.len());
        info!("Processing records {} to {}...", batch_start, batch_end);

        for (i, row) in rows.iter().enumerate().take(batch_end).skip(batch_start) {
            sequences[i] = fetch_sequence(&client, &args, row, &columns).await?;
            pb.inc(1);
        }
        // Checkpoint after every batch so an interrupted run keeps its
        // progress on disk.
        write_output(&args.out, &headers, &rows, &sequences)?;
    }

    pb.finish_and_clear();
    write_output(&args.out, &headers, &rows, &sequences)?;
    println!("Wrote {}", args.out.display());
    Ok(())
}

async fn fetch_sequence(
    client: &Client,
    args: &FetchArgs,
    row: &StringRecord,
    columns: &Columns,
) -> Result<String> {
    let seq_id = row.get(columns.seq_id).unwrap_or_default();
    let start = row.get(columns.start).unwrap_or_default();
    let end = row.get(columns.end).unwrap_or_default();
    let strand = strand_param(row.get(columns.strand).unwrap_or_default());

    let mut request = client.get(EFETCH_URL).query(&[
        ("db", "nucleotide"),
        ("id", seq_id),
        ("rettype", "fasta"),
        ("retmode", "text"),
        ("strand", strand),
        ("seq_start", start),
        ("seq_stop", end),
        ("email", args.email.as_str()),
    ]);
    if let Some(key) = &args.api_key {
        request = request.query(&[("api_key", key.as_str())]);
    }

    let body = request.send().await?.error_for_status()?.text().await?;
    let records = read_fasta(&mut BufReader::new(body.as_bytes()))?;
    Ok(records
        .into_iter()
        .next()
        .map(|r| r.sequence)
        .unwrap_or_default())
}

fn write_output(
    out: &Path,
    headers: &StringRecord,
    rows: &[StringRecord],
    sequences: &[String],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(out)?;

    let mut header_row: Vec<&str> = headers.iter().collect();
    header_row.push("sequence");
    writer.write_record(&header_row)?;

    for (row, sequence) in rows.iter().zip(sequences) {
        let mut fields: Vec<&str> = row.iter().collect();
        fields.push(sequence);
        writer.write_record(&fields)?;
    }
    writer.flush().map_err(CliError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn strand_symbols_map_to_eutils_values() {
        assert_eq!(strand_param("+"), "1");
        assert_eq!(strand_param("-"), "2");
        assert_eq!(strand_param("1"), "1");
        assert_eq!(strand_param(" 2 "), "2");
    }

    #[test]
    fn missing_columns_are_argument_errors() {
        let headers = StringRecord::from(vec!["seqID", "start", "end"]);
        assert_eq!(required_column(&headers, "start").unwrap(), 1);
        let err = required_column(&headers, "strand").unwrap_err();
        assert!(err.to_string().contains("'strand' column"));
    }

    #[test]
    fn output_appends_a_sequence_column() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("with_seq.csv");

        let headers = StringRecord::from(vec!["seqID", "start", "end", "strand"]);
        let rows = vec![StringRecord::from(vec!["NC_000913.3", "100", "160", "+"])];
        let sequences = vec!["ACGT".to_string()];

        write_output(&out, &headers, &rows, &sequences).unwrap();

        let text = fs::read_to_string(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "seqID,start,end,strand,sequence");
        assert_eq!(lines[1], "NC_000913.3,100,160,+,ACGT");
    }
}
