use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use nlp_adapter::population::{PopulationFile, ResultExtractor};
use nlp_adapter::{ParetoFront, PopulationLayout};
use tabwriter::TabWriter;
use tracing::info;

use nlp_adapter_cli::cli::OutputFormat;

pub fn handle(path: &Path, layout: PopulationLayout, format: OutputFormat) -> Result<()> {
    info!(
        path = %path.display(),
        nx = layout.nx,
        nc = layout.nc,
        nf = layout.nf,
        "reading population file"
    );
    let front = PopulationFile::new(path)
        .extract(&layout)
        .with_context(|| format!("parsing population file {}", path.display()))?;

    match format {
        OutputFormat::Table => write_table(io::stdout(), &front),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(io::stdout(), &front)
                .context("serializing front to JSON")?;
            println!();
            Ok(())
        }
    }
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_table<W: Write>(out: W, front: &ParetoFront) -> Result<()> {
    let mut writer = TabWriter::new(out);
    writeln!(writer, "#\tOBJECTIVES\tCONSTRAINTS\tDESIGN")?;
    for (i, ((objectives, constraints), design)) in front
        .objectives
        .iter()
        .zip(&front.constraints)
        .zip(&front.designs)
        .enumerate()
    {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            i,
            join(objectives),
            join(constraints),
            join(design)
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlp_adapter::parse_population;

    const POPULATION: &str =
        "# population\n# generation 50\n1.0 2.0 0.5 3.0 4.0 1\n0.5 0.5 0.0 0.0 0.0 2\n";

    #[test]
    fn test_table_lists_rank_one_members() {
        let layout = PopulationLayout::new(2, 1, 2);
        let front = parse_population(POPULATION.as_bytes(), &layout).unwrap();

        let mut out = Vec::new();
        write_table(&mut out, &front).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("1 2"));
        assert!(lines[1].contains("-0.5"));
        assert!(lines[1].contains("3 4"));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = handle(
            Path::new("/nonexistent/pop.out"),
            PopulationLayout::new(1, 0, 2),
            OutputFormat::Json,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("parsing population file"));
    }
}
