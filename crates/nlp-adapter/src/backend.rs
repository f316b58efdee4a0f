//! The solver capability seam.
//!
//! The adapter never solves anything itself. A [`SolverBackend`] receives the
//! [`ProblemDescriptor`], a [`Sensitivity`] strategy and the two entry points
//! (behind [`SolveCallbacks`]), runs to completion, and returns a
//! [`RawSolution`] that the normalizer then repairs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nlp_adapter::backend::{RawSolution, Sensitivity, SolveCallbacks, SolverBackend};
//! use nlp_adapter::{DesignInputs, ProblemDescriptor};
//! use anyhow::Result;
//!
//! struct MyEngine;
//!
//! impl SolverBackend for MyEngine {
//!     fn name(&self) -> &str { "MYENGINE" }
//!     fn solve(
//!         &mut self,
//!         problem: &ProblemDescriptor,
//!         sensitivity: &Sensitivity,
//!         callbacks: &mut dyn SolveCallbacks,
//!     ) -> Result<RawSolution> {
//!         let start = DesignInputs::new(problem.variables.value.clone());
//!         let (values, _fail) = callbacks.evaluate(&start)?;
//!         // Engine iterations
//!     }
//! }
//! ```

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::descriptor::ProblemDescriptor;
use crate::error::AdapterResult;
use crate::evaluation::ObjectiveValues;
use crate::groups::{DesignInputs, GradientOutputs, ValueOutputs};

/// Difference formula used by a finite-difference fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceScheme {
    #[default]
    Forward,
    Central,
}

/// How the finite-difference step is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepSize {
    /// Step proportional to the magnitude of each variable.
    #[default]
    Relative,
    Absolute,
}

/// Finite-difference policy delegated entirely to the solver capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FiniteDifference {
    pub scheme: DifferenceScheme,
    pub step: StepSize,
}

impl FiniteDifference {
    /// Policy string understood by group-based NLP engines (e.g. `"FDR"`).
    pub fn policy(&self) -> &'static str {
        match (self.scheme, self.step) {
            (DifferenceScheme::Forward, StepSize::Relative) => "FDR",
            (DifferenceScheme::Forward, StepSize::Absolute) => "FD",
            (DifferenceScheme::Central, StepSize::Relative) => "CDR",
            (DifferenceScheme::Central, StepSize::Absolute) => "CD",
        }
    }
}

/// How the solver obtains derivatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    /// Call [`SolveCallbacks::gradient`].
    Analytic,
    /// Approximate derivatives inside the solver.
    FiniteDifference(FiniteDifference),
}

impl Sensitivity {
    pub fn is_analytic(&self) -> bool {
        matches!(self, Sensitivity::Analytic)
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensitivity::Analytic => write!(f, "analytic"),
            Sensitivity::FiniteDifference(fd) => write!(f, "{}", fd.policy()),
        }
    }
}

/// The value and gradient entry points, as seen by a solver.
///
/// Both return a fail flag alongside their output. Errors are fatal: a
/// solver should propagate them and stop.
pub trait SolveCallbacks {
    /// Evaluate objectives and nonlinear constraints at `inputs.x`.
    fn evaluate(&mut self, inputs: &DesignInputs) -> AdapterResult<(ValueOutputs, bool)>;

    /// Derivatives at `inputs.x`, normally right after [`Self::evaluate`] at the same point.
    fn gradient(
        &mut self,
        inputs: &DesignInputs,
        values: &ValueOutputs,
    ) -> AdapterResult<(GradientOutputs, bool)>;
}

/// Final design vector as reported by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawDesign {
    Flat(Vec<f64>),
    /// `nx x 1` column matrix, one single-element row per variable.
    Column(Vec<Vec<f64>>),
}

/// Termination status reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationCode {
    pub value: i32,
    pub text: String,
}

/// Solution record returned by a backend, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    /// Name of the concrete backend that ran; selects the quirk row.
    pub backend: String,
    /// Final value of the `x` group.
    pub x_star: RawDesign,
    /// Echoed final objective value(s).
    pub f_star: ObjectiveValues,
    /// Echoed final inequality constraint values, if the backend reports them.
    pub inequality_star: Option<Vec<f64>>,
    /// Echoed final equality constraint values, if the backend reports them.
    pub equality_star: Option<Vec<f64>>,
    /// Time spent inside the optimizer.
    pub opt_time: Option<Duration>,
    pub inform: Option<TerminationCode>,
}

impl RawSolution {
    /// A record with a flat design vector and nothing else echoed.
    pub fn new(backend: impl Into<String>, x_star: Vec<f64>, f_star: ObjectiveValues) -> Self {
        Self {
            backend: backend.into(),
            x_star: RawDesign::Flat(x_star),
            f_star,
            inequality_star: None,
            equality_star: None,
            opt_time: None,
            inform: None,
        }
    }
}

/// A black-box optimization engine.
pub trait SolverBackend {
    /// Name of the concrete backend (e.g. `"SNOPT"`, `"NSGA2"`).
    fn name(&self) -> &str;

    /// Run the engine once to completion.
    ///
    /// The implementation calls back into `callbacks` as often as it needs
    /// and must propagate any error they return.
    fn solve(
        &mut self,
        problem: &ProblemDescriptor,
        sensitivity: &Sensitivity,
        callbacks: &mut dyn SolveCallbacks,
    ) -> Result<RawSolution>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_forward_relative() {
        assert_eq!(FiniteDifference::default().policy(), "FDR");
    }

    #[test]
    fn test_policy_strings() {
        let central = FiniteDifference {
            scheme: DifferenceScheme::Central,
            step: StepSize::Absolute,
        };
        assert_eq!(central.policy(), "CD");
        assert_eq!(
            Sensitivity::FiniteDifference(central).to_string(),
            "CD"
        );
        assert_eq!(Sensitivity::Analytic.to_string(), "analytic");
    }

    #[test]
    fn test_backend_trait_is_object_safe() {
        fn _accepts_backend(_b: &mut dyn SolverBackend) {}
        fn _accepts_callbacks(_c: &mut dyn SolveCallbacks) {}
    }
}
