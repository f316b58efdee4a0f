//! Adapter between evaluation functions and group-based NLP solvers.
//!
//! Callers write one evaluation function that returns the objective, the
//! constraint values and, optionally, their derivatives. External
//! nonlinear-programming engines expect something more rigid: named
//! variable/objective/constraint groups, separate value and gradient
//! callbacks, and results that differ in small ways from backend to backend.
//! This crate sits in between.
//!
//! # Architecture
//!
//! ```text
//! caller ──> EvaluationBridge::detect ──> ProblemDescriptor
//!                    │                           │
//!                    └──── SolveCallbacks ──> SolverBackend::solve
//!                                                  │
//!                                           RawSolution
//!                                                  │
//!            ResultNormalizer (QuirkTable, ResultExtractor)
//!                                                  │
//!                                     OptimizeResult { Solution, SolveInfo }
//! ```
//!
//! - [`bridge::EvaluationBridge`] detects whether gradients are supplied and
//!   serves the value and gradient entry points, caching the derivatives of
//!   the last evaluated point so the gradient call rarely re-evaluates.
//! - [`descriptor::ProblemDescriptor`] is the group model handed to the solver.
//!   Empty groups are never registered.
//! - [`backend::SolverBackend`] is the black-box engine, invoked once per solve.
//! - [`normalize::ResultNormalizer`] repairs known backend defects, driven by
//!   the [`quirks::QuirkTable`], and computes the constraint violation.
//!
//! # Example
//!
//! ```ignore
//! use nlp_adapter::{optimize, Evaluation, LinearConstraints};
//!
//! let rosenbrock = |x: &[f64]| -> anyhow::Result<Evaluation> {
//!     let f = (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
//!     Ok(Evaluation::basic(f, vec![x[0] * x[0] + x[1] * x[1] - 2.0]))
//! };
//!
//! let result = optimize(
//!     rosenbrock,
//!     &[0.0, 0.0],
//!     &[-2.0, -2.0],
//!     &[2.0, 2.0],
//!     &mut engine,
//!     LinearConstraints::none(),
//! )?;
//! println!("calls: {}", result.info.function_calls);
//! ```

pub mod backend;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod counter;
pub mod descriptor;
pub mod error;
pub mod evaluation;
pub mod groups;
pub mod normalize;
pub mod optimize;
pub mod population;
pub mod quirks;
pub mod solution;
pub mod violation;

pub use backend::{
    FiniteDifference, RawDesign, RawSolution, Sensitivity, SolveCallbacks, SolverBackend,
    TerminationCode,
};
pub use bridge::{EvaluationBridge, ProblemShape};
pub use config::AdapterConfig;
pub use descriptor::{ConstraintGroup, LinearConstraint, ProblemDescriptor};
pub use error::{AdapterError, AdapterResult};
pub use evaluation::{with_args, Evaluation, EvaluationForm, Evaluator, Gradients, ObjectiveValues};
pub use groups::{DesignInputs, GradientOutputs, ValueOutputs};
pub use optimize::{optimize, optimize_with_config, LinearConstraints};
pub use population::{parse_population, ParetoFront, PopulationLayout};
pub use quirks::{BackendQuirks, QuirkTable};
pub use solution::{OptimizeResult, PointSolution, Solution, SolveInfo};
pub use violation::max_constraint_violation;
