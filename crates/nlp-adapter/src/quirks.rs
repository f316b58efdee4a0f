//! Per-backend result quirks.
//!
//! Different engines report their results with known defects. Each backend
//! name maps to one [`BackendQuirks`] row, selected once per solve, so adding
//! a backend is a table entry rather than another branch in the normalizer.
//!
//! | Backend | Reshape column solution | Trust echoed result | External population file |
//! |---------|-------------------------|---------------------|--------------------------|
//! | NLPQLP  | yes | no  | no  |
//! | SNOPT   | no  | yes | no  |
//! | NSGA2   | no  | no  | yes |
//! | others  | no  | no  | no  |

use serde::{Deserialize, Serialize};

/// Flags describing how a backend's raw solution must be repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendQuirks {
    /// The solution vector comes back as an `nx x 1` column matrix.
    pub reshape_column_solution: bool,
    /// Echoed final objective and constraint values can be used as-is.
    pub trust_echoed_result: bool,
    /// Multi-objective results live in an external population file.
    pub uses_external_population_file: bool,
}

/// One named row of the quirk table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendQuirkEntry {
    pub name: String,
    #[serde(flatten)]
    pub quirks: BackendQuirks,
}

impl BackendQuirkEntry {
    pub fn new(name: impl Into<String>, quirks: BackendQuirks) -> Self {
        Self {
            name: name.into(),
            quirks,
        }
    }
}

/// Lookup table from backend name to [`BackendQuirks`].
///
/// Names compare case-insensitively; unknown backends get the default row
/// (nothing trusted, nothing reshaped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuirkTable {
    entries: Vec<BackendQuirkEntry>,
}

impl Default for QuirkTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl QuirkTable {
    /// A table with no rows.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The built-in rows for known backends.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                BackendQuirkEntry::new(
                    "NLPQLP",
                    BackendQuirks {
                        reshape_column_solution: true,
                        ..BackendQuirks::default()
                    },
                ),
                BackendQuirkEntry::new(
                    "SNOPT",
                    BackendQuirks {
                        trust_echoed_result: true,
                        ..BackendQuirks::default()
                    },
                ),
                BackendQuirkEntry::new(
                    "NSGA2",
                    BackendQuirks {
                        uses_external_population_file: true,
                        ..BackendQuirks::default()
                    },
                ),
            ],
        }
    }

    /// Built-in rows overridden or extended by `extra`.
    pub fn with_overrides(extra: &[BackendQuirkEntry]) -> Self {
        let mut table = Self::builtin();
        for entry in extra {
            table.insert(entry.clone());
        }
        table
    }

    /// Add a row, replacing any existing row with the same name.
    pub fn insert(&mut self, entry: BackendQuirkEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(&entry.name))
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Quirks for `backend`, or the default row if it is unknown.
    pub fn lookup(&self, backend: &str) -> BackendQuirks {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(backend))
            .map(|e| e.quirks)
            .unwrap_or_default()
    }

    pub fn entries(&self) -> &[BackendQuirkEntry] {
        &self.entries
    }
}
