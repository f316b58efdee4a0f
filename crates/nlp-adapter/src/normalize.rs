//! Post-solve normalization.
//!
//! Turns a backend's [`RawSolution`] into a [`Solution`] by applying the
//! backend's quirk row:
//!
//! 1. flatten a column-matrix solution vector,
//! 2. re-evaluate the final point unless the echoed values are trusted,
//! 3. read the Pareto front from an external extractor for population-based
//!    multi-objective backends,
//!
//! and then computes the aggregate constraint violation.

use tracing::{debug, warn};

use crate::backend::{RawDesign, RawSolution};
use crate::bridge::{FinalEvaluator, ProblemShape};
use crate::error::{AdapterError, AdapterResult};
use crate::evaluation::ObjectiveValues;
use crate::population::{PopulationLayout, ResultExtractor};
use crate::quirks::BackendQuirks;
use crate::solution::{PointSolution, Solution};
use crate::violation::{max_constraint_violation, worst_violation};

/// Repairs backend-specific defects in a raw solution.
pub struct ResultNormalizer {
    quirks: BackendQuirks,
    always_reevaluate: bool,
    extractor: Option<Box<dyn ResultExtractor>>,
}

impl ResultNormalizer {
    pub fn new(quirks: BackendQuirks) -> Self {
        Self {
            quirks,
            always_reevaluate: false,
            extractor: None,
        }
    }

    /// Re-evaluate the final point even when the backend is trusted.
    pub fn always_reevaluate(mut self, yes: bool) -> Self {
        self.always_reevaluate = yes;
        self
    }

    /// Source of the front for backends flagged `uses_external_population_file`.
    pub fn with_extractor(mut self, extractor: Box<dyn ResultExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn quirks(&self) -> BackendQuirks {
        self.quirks
    }

    /// Normalize `raw` and return it with its maximum constraint violation.
    pub fn normalize(
        &self,
        raw: RawSolution,
        shape: &ProblemShape,
        evaluator: &mut dyn FinalEvaluator,
    ) -> AdapterResult<(Solution, f64)> {
        if self.quirks.uses_external_population_file && shape.objective_count() > 1 {
            if let Some(extractor) = &self.extractor {
                let layout = PopulationLayout::new(shape.nx, shape.nc, shape.objective_count());
                debug!(extractor = extractor.name(), "extracting Pareto front");
                let front = extractor.extract(&layout)?;
                let violation = worst_violation(
                    front
                        .constraints
                        .iter()
                        .map(|c| max_constraint_violation(c, &[])),
                );
                return Ok((Solution::Front(front), violation));
            }
            warn!(
                backend = %raw.backend,
                "no result extractor configured, using echoed single point"
            );
        }

        let x = self.flatten(&raw.backend, raw.x_star, shape.nx)?;
        let echo = Echo {
            backend: &raw.backend,
            objective: raw.f_star,
            inequality: raw.inequality_star,
            equality: raw.equality_star,
        };
        let point = self.final_point(x, echo, shape, evaluator)?;
        let violation = max_constraint_violation(&point.inequality, &point.equality);
        Ok((Solution::Point(point), violation))
    }

    fn flatten(&self, backend: &str, design: RawDesign, nx: usize) -> AdapterResult<Vec<f64>> {
        let x = match design {
            RawDesign::Flat(x) => x,
            RawDesign::Column(rows) if self.quirks.reshape_column_solution => {
                debug!(rows = rows.len(), "flattening column solution");
                rows.into_iter()
                    .map(|row| {
                        row.first().copied().ok_or_else(|| AdapterError::MalformedSolution {
                            backend: backend.to_string(),
                            message: "empty row in column solution".to_string(),
                        })
                    })
                    .collect::<AdapterResult<Vec<f64>>>()?
            }
            RawDesign::Column(_) => {
                warn!(backend, "column solution from a backend not flagged for reshaping");
                return Err(AdapterError::MalformedSolution {
                    backend: backend.to_string(),
                    message: "solution reported as a column matrix".to_string(),
                });
            }
        };

        if x.len() != nx {
            return Err(AdapterError::MalformedSolution {
                backend: backend.to_string(),
                message: format!("expected {nx} design variables, found {}", x.len()),
            });
        }
        Ok(x)
    }

    fn final_point(
        &self,
        x: Vec<f64>,
        echo: Echo<'_>,
        shape: &ProblemShape,
        evaluator: &mut dyn FinalEvaluator,
    ) -> AdapterResult<PointSolution> {
        let trusted = self.quirks.trust_echoed_result && !self.always_reevaluate;
        if !trusted {
            let eval = evaluator.reevaluate(&x)?;
            let equality = eval.equality_values().to_vec();
            return Ok(PointSolution {
                x,
                objective: eval.objective,
                inequality: eval.inequality,
                equality,
            });
        }

        echo.validate(shape)?;
        // A group with no entries needs no echo.
        let inequality = echo.inequality.or_else(|| (shape.nc == 0).then(Vec::new));
        let equality = echo.equality.or_else(|| (shape.neq == 0).then(Vec::new));
        match (inequality, equality) {
            (Some(inequality), Some(equality)) => {
                debug!("using echoed final values");
                Ok(PointSolution {
                    x,
                    objective: echo.objective,
                    inequality,
                    equality,
                })
            }
            _ => {
                // Echoed objective is kept; constraints still come from the function.
                debug!("echoed constraints incomplete, re-evaluating for constraint values");
                let eval = evaluator.reevaluate(&x)?;
                let equality = eval.equality_values().to_vec();
                Ok(PointSolution {
                    x,
                    objective: echo.objective,
                    inequality: eval.inequality,
                    equality,
                })
            }
        }
    }
}

/// Final values a backend echoed in its solution record.
struct Echo<'a> {
    backend: &'a str,
    objective: ObjectiveValues,
    inequality: Option<Vec<f64>>,
    equality: Option<Vec<f64>>,
}

impl Echo<'_> {
    fn validate(&self, shape: &ProblemShape) -> AdapterResult<()> {
        let checks = [
            ("objective", Some(self.objective.len()), shape.objective_count()),
            (
                "inequality",
                self.inequality.as_ref().map(Vec::len),
                shape.nc,
            ),
            ("equality", self.equality.as_ref().map(Vec::len), shape.neq),
        ];
        for (what, found, expected) in checks {
            if let Some(found) = found.filter(|&n| n != expected) {
                return Err(AdapterError::MalformedSolution {
                    backend: self.backend.to_string(),
                    message: format!("echoed {what} has {found} values, expected {expected}"),
                });
            }
        }
        Ok(())
    }
}
