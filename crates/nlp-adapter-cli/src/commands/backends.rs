use std::io::{self, Write};

use anyhow::{Context, Result};
use nlp_adapter::quirks::BackendQuirkEntry;
use nlp_adapter::AdapterConfig;
use tabwriter::TabWriter;

use nlp_adapter_cli::cli::OutputFormat;

pub fn handle(config: &AdapterConfig, format: OutputFormat) -> Result<()> {
    let table = config.quirk_table();
    match format {
        OutputFormat::Table => write_table(io::stdout(), table.entries()),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(io::stdout(), table.entries())
                .context("serializing quirk table to JSON")?;
            println!();
            Ok(())
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn write_table<W: Write>(out: W, entries: &[BackendQuirkEntry]) -> Result<()> {
    let mut writer = TabWriter::new(out);
    writeln!(writer, "BACKEND\tRESHAPE COLUMN\tTRUST ECHO\tPOPULATION FILE")?;
    for entry in entries {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            entry.name,
            yes_no(entry.quirks.reshape_column_solution),
            yes_no(entry.quirks.trust_echoed_result),
            yes_no(entry.quirks.uses_external_population_file),
        )?;
    }
    writer.flush()?;
    Ok(())
}
