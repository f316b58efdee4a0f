//! Top-level solve orchestration.

use std::time::Instant;

use tracing::{debug, info, info_span};

use crate::backend::{Sensitivity, SolverBackend};
use crate::bridge::EvaluationBridge;
use crate::config::AdapterConfig;
use crate::descriptor::{LinearConstraint, ProblemDescriptor};
use crate::error::{AdapterError, AdapterResult};
use crate::evaluation::Evaluator;
use crate::normalize::ResultNormalizer;
use crate::population::PopulationFile;
use crate::solution::{OptimizeResult, SolveInfo};

/// Optional linear constraint blocks of a problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearConstraints {
    /// `A x <= b`.
    pub inequality: Option<LinearConstraint>,
    /// `Aeq x == beq`.
    pub equality: Option<LinearConstraint>,
}

impl LinearConstraints {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn inequality(mut self, matrix: Vec<Vec<f64>>, bound: Vec<f64>) -> Self {
        self.inequality = Some(LinearConstraint::new(matrix, bound));
        self
    }

    pub fn equality(mut self, matrix: Vec<Vec<f64>>, bound: Vec<f64>) -> Self {
        self.equality = Some(LinearConstraint::new(matrix, bound));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.inequality.as_ref().map_or(true, LinearConstraint::is_empty)
            && self.equality.as_ref().map_or(true, LinearConstraint::is_empty)
    }
}

/// Solve with the default [`AdapterConfig`].
///
/// See [`optimize_with_config`].
pub fn optimize<E, S>(
    func: E,
    x0: &[f64],
    lower: &[f64],
    upper: &[f64],
    solver: &mut S,
    linear: LinearConstraints,
) -> AdapterResult<OptimizeResult>
where
    E: Evaluator,
    S: SolverBackend + ?Sized,
{
    optimize_with_config(func, x0, lower, upper, solver, linear, &AdapterConfig::default())
}

/// Run one solve of `func` through `solver`.
///
/// This function:
/// 1. Calls `func` once at `x0` to detect the evaluation form and sizes
/// 2. Builds the [`ProblemDescriptor`] and picks the sensitivity strategy
/// 3. Invokes the solver once with the bridge as its callbacks
/// 4. Normalizes the raw solution per the backend's quirk row
///
/// The call counter and gradient cache live in the bridge created here, so
/// nothing carries over between solves.
///
/// # Errors
///
/// Fails on inconsistent inputs, on any error from `func` (which aborts the
/// solve), on evaluation-form changes, on solver failure, and on malformed
/// solver output.
pub fn optimize_with_config<E, S>(
    func: E,
    x0: &[f64],
    lower: &[f64],
    upper: &[f64],
    solver: &mut S,
    linear: LinearConstraints,
    config: &AdapterConfig,
) -> AdapterResult<OptimizeResult>
where
    E: Evaluator,
    S: SolverBackend + ?Sized,
{
    let backend_name = solver.name().to_string();
    let span = info_span!("optimize", backend = %backend_name);
    let _enter = span.enter();

    let (mut bridge, _initial) = EvaluationBridge::detect(func, x0)?;
    let shape = bridge.shape();

    let mut builder = ProblemDescriptor::builder(&config.problem_name, x0, lower, upper)?
        .objectives(shape.nf)
        .inequality(shape.nc)
        .equality(shape.neq);
    if let Some(a) = &linear.inequality {
        builder = builder.linear_inequality(a)?;
    }
    if let Some(aeq) = &linear.equality {
        builder = builder.linear_equality(aeq)?;
    }
    let descriptor = builder.build();

    let sensitivity = if bridge.has_gradients() {
        Sensitivity::Analytic
    } else {
        Sensitivity::FiniteDifference(config.finite_difference)
    };
    info!(
        groups = descriptor.group_names().len(),
        %sensitivity,
        "starting solver"
    );

    let started = Instant::now();
    let raw = solver
        .solve(&descriptor, &sensitivity, &mut bridge)
        .map_err(AdapterError::from_solver)?;
    let measured = started.elapsed();
    debug!(
        reported = %raw.backend,
        calls = bridge.calls(),
        "solver returned"
    );

    let quirks = config.quirk_table().lookup(&raw.backend);
    debug!(?quirks, "selected backend quirks");
    let mut normalizer =
        ResultNormalizer::new(quirks).always_reevaluate(config.normalizer.always_reevaluate);
    if quirks.uses_external_population_file {
        normalizer = normalizer.with_extractor(Box::new(PopulationFile::new(
            &config.normalizer.population_file,
        )));
    }

    let elapsed = raw.opt_time.unwrap_or(measured);
    let termination = raw.inform.clone();
    let backend = raw.backend.clone();
    let (solution, max_constraint_violation) = normalizer.normalize(raw, &shape, &mut bridge)?;

    let info = SolveInfo {
        function_calls: bridge.calls(),
        elapsed,
        termination,
        max_constraint_violation,
        backend,
    };
    info!(
        calls = info.function_calls,
        elapsed_ms = info.elapsed.as_millis() as u64,
        violation = info.max_constraint_violation,
        "solve finished"
    );

    Ok(OptimizeResult { solution, info })
}
