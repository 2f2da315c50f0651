use crate::cli::Tab2csvArgs;
use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::info;

pub fn run(args: Tab2csvArgs) -> Result<()> {
    let reader = BufReader::new(File::open(&args.input)?);
    let mut writer = csv::Writer::from_path(&args.output)?;

    let mut rows = 0usize;
    for line in reader.lines() {
        let line = line?;
        writer.write_record(line.trim().split('\t'))?;
        rows += 1;
    }
    writer.flush()?;

    info!("Converted {} rows.", rows);
    println!(
        "Conversion complete. CSV file saved as {}",
        args.output.display()
    );
    Ok(())
}
