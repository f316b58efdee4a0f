//! Pareto-front extraction from population files.
//!
//! Some population-based multi-objective backends do not echo their result
//! through the solution record; they write the final population to a text
//! file instead. The layout is a two-line header followed by one
//! whitespace-delimited row per member:
//!
//! ```text
//! f_0 .. f_{nf-1}  c_0 .. c_{nc-1}  x_0 .. x_{nx-1}  rank  [ignored ...]
//! ```
//!
//! Only rank-1 members (the first Pareto front) are kept. Constraint columns
//! are stored as `c >= 0` feasible and are negated into the `c <= 0`
//! convention used everywhere else.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AdapterError, AdapterResult};

/// Header lines skipped at the top of a population file.
pub const HEADER_LINES: usize = 2;

/// Column counts of a population row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationLayout {
    pub nx: usize,
    pub nc: usize,
    pub nf: usize,
}

impl PopulationLayout {
    pub fn new(nx: usize, nc: usize, nf: usize) -> Self {
        Self { nx, nc, nf }
    }

    /// Zero-based column of the rank field.
    pub fn rank_column(&self) -> usize {
        self.nf + self.nc + self.nx
    }

    /// Minimum number of fields in a row.
    pub fn min_fields(&self) -> usize {
        self.rank_column() + 1
    }
}

/// Members of the first Pareto front, in file order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParetoFront {
    pub designs: Vec<Vec<f64>>,
    pub objectives: Vec<Vec<f64>>,
    /// Inequality constraints in the `c <= 0` convention.
    pub constraints: Vec<Vec<f64>>,
}

impl ParetoFront {
    pub fn len(&self) -> usize {
        self.designs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }
}

/// Parse a population file from any buffered reader.
///
/// Blank lines are skipped. A row with too few fields or a non-numeric
/// field is a fatal error; extra trailing fields are ignored.
pub fn parse_population<R: BufRead>(
    reader: R,
    layout: &PopulationLayout,
) -> AdapterResult<ParetoFront> {
    let mut front = ParetoFront::default();
    let mut discarded = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx < HEADER_LINES || line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < layout.min_fields() {
            return Err(AdapterError::PopulationParse {
                line: line_no,
                reason: format!(
                    "expected at least {} fields, found {}",
                    layout.min_fields(),
                    fields.len()
                ),
            });
        }

        let values = fields[..layout.min_fields()]
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|e| AdapterError::PopulationParse {
                    line: line_no,
                    reason: format!("invalid number `{field}`: {e}"),
                })
            })
            .collect::<AdapterResult<Vec<f64>>>()?;

        if values[layout.rank_column()] != 1.0 {
            discarded += 1;
            continue;
        }

        let (objectives, rest) = values.split_at(layout.nf);
        let (constraints, rest) = rest.split_at(layout.nc);
        let design = &rest[..layout.nx];

        front.objectives.push(objectives.to_vec());
        front.constraints.push(constraints.iter().map(|c| -c).collect());
        front.designs.push(design.to_vec());
    }

    info!(
        kept = front.len(),
        discarded, "parsed population front"
    );
    Ok(front)
}

/// Source of a multi-objective result that bypasses the solution record.
pub trait ResultExtractor {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Extract the final front.
    fn extract(&self, layout: &PopulationLayout) -> AdapterResult<ParetoFront>;
}

/// Reads the front from a population file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationFile {
    path: PathBuf,
}

impl PopulationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultExtractor for PopulationFile {
    fn name(&self) -> &str {
        "population-file"
    }

    fn extract(&self, layout: &PopulationLayout) -> AdapterResult<ParetoFront> {
        debug!(path = %self.path.display(), "reading population file");
        let file = File::open(&self.path)?;
        parse_population(BufReader::new(file), layout)
    }
}
