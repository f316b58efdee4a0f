//! Results returned by the caller's evaluation function.
//!
//! An [`Evaluation`] carries the objective, the nonlinear constraint values
//! and, optionally, their derivatives. Which parts are present determines the
//! evaluation *form*; the form seen on the first call is fixed for the rest
//! of the solve.

use serde::{Deserialize, Serialize};

/// Dense row-major matrix, one inner vector per row.
pub type Matrix = Vec<Vec<f64>>;

/// Objective value(s) at a design point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectiveValues {
    /// A single scalar objective.
    Single(f64),
    /// Several objectives, in index order.
    Multi(Vec<f64>),
}

impl ObjectiveValues {
    /// Number of objective components.
    pub fn len(&self) -> usize {
        match self {
            ObjectiveValues::Single(_) => 1,
            ObjectiveValues::Multi(values) => values.len(),
        }
    }

    /// Whether there are no objective components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is a multi-objective vector, even one of length one.
    pub fn is_multi(&self) -> bool {
        matches!(self, ObjectiveValues::Multi(_))
    }

    /// Objective components as a slice, in index order.
    pub fn as_slice(&self) -> &[f64] {
        match self {
            ObjectiveValues::Single(value) => std::slice::from_ref(value),
            ObjectiveValues::Multi(values) => values,
        }
    }
}

/// Derivatives with respect to the design vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gradients {
    /// Objective gradient, one row per objective.
    pub objective: Matrix,
    /// Inequality constraint Jacobian, one row per constraint.
    pub inequality: Matrix,
    /// Equality constraint Jacobian (extended form only).
    pub equality: Option<Matrix>,
}

/// The shape of result an evaluation function returns.
///
/// The arity matches the tuple lengths of the classic calling convention:
/// `(f, c)`, `(f, c, ceq)`, `(f, c, df, dc)` and `(f, c, ceq, df, dc, dceq)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluationForm {
    Basic,
    Extended,
    BasicWithGradients,
    ExtendedWithGradients,
}

impl EvaluationForm {
    /// Number of elements of the equivalent result tuple.
    pub fn arity(&self) -> usize {
        match self {
            EvaluationForm::Basic => 2,
            EvaluationForm::Extended => 3,
            EvaluationForm::BasicWithGradients => 4,
            EvaluationForm::ExtendedWithGradients => 6,
        }
    }

    /// Whether the result carries analytic derivatives.
    pub fn has_gradients(&self) -> bool {
        matches!(
            self,
            EvaluationForm::BasicWithGradients | EvaluationForm::ExtendedWithGradients
        )
    }

    /// Whether the result carries equality constraints (possibly empty).
    pub fn is_extended(&self) -> bool {
        matches!(
            self,
            EvaluationForm::Extended | EvaluationForm::ExtendedWithGradients
        )
    }
}

impl std::fmt::Display for EvaluationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationForm::Basic => write!(f, "basic"),
            EvaluationForm::Extended => write!(f, "extended"),
            EvaluationForm::BasicWithGradients => write!(f, "basic+gradients"),
            EvaluationForm::ExtendedWithGradients => write!(f, "extended+gradients"),
        }
    }
}

/// One call's worth of output from the evaluation function.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub objective: ObjectiveValues,
    /// Inequality constraints, satisfied when `c <= 0`.
    pub inequality: Vec<f64>,
    /// Equality constraints, satisfied when `ceq == 0`.
    pub equality: Option<Vec<f64>>,
    pub gradients: Option<Gradients>,
}

impl Evaluation {
    /// Scalar objective with inequality constraints: the `(f, c)` form.
    pub fn basic(objective: f64, inequality: Vec<f64>) -> Self {
        Self {
            objective: ObjectiveValues::Single(objective),
            inequality,
            equality: None,
            gradients: None,
        }
    }

    /// Objective(s) with inequality and equality constraints: the `(f, c, ceq)` form.
    pub fn extended(objective: ObjectiveValues, inequality: Vec<f64>, equality: Vec<f64>) -> Self {
        Self {
            objective,
            inequality,
            equality: Some(equality),
            gradients: None,
        }
    }

    /// Attach the objective gradient and inequality Jacobian.
    pub fn with_gradients(mut self, objective: Matrix, inequality: Matrix) -> Self {
        let equality = self.gradients.and_then(|g| g.equality);
        self.gradients = Some(Gradients {
            objective,
            inequality,
            equality,
        });
        self
    }

    /// Attach the equality Jacobian (extended form).
    pub fn with_equality_jacobian(mut self, jacobian: Matrix) -> Self {
        self.gradients.get_or_insert_with(Gradients::default).equality = Some(jacobian);
        self
    }

    /// The form of this result.
    ///
    /// A multi-objective vector is only expressible in the extended form, so
    /// it selects that form even when no equality constraints are given.
    pub fn form(&self) -> EvaluationForm {
        let extended = self.equality.is_some() || self.objective.is_multi();
        match (extended, self.gradients.is_some()) {
            (false, false) => EvaluationForm::Basic,
            (true, false) => EvaluationForm::Extended,
            (false, true) => EvaluationForm::BasicWithGradients,
            (true, true) => EvaluationForm::ExtendedWithGradients,
        }
    }

    /// Equality constraint values, empty when none were returned.
    pub fn equality_values(&self) -> &[f64] {
        self.equality.as_deref().unwrap_or(&[])
    }
}

/// The caller-supplied evaluation routine.
///
/// Implemented for every `FnMut(&[f64]) -> anyhow::Result<Evaluation>`; use
/// [`with_args`] to bind extra arguments.
pub trait Evaluator {
    /// Evaluate the objective and constraints at `x`.
    fn evaluate(&mut self, x: &[f64]) -> anyhow::Result<Evaluation>;
}

impl<F> Evaluator for F
where
    F: FnMut(&[f64]) -> anyhow::Result<Evaluation>,
{
    fn evaluate(&mut self, x: &[f64]) -> anyhow::Result<Evaluation> {
        self(x)
    }
}

/// An evaluation function bound to extra arguments.
pub struct WithArgs<F, A> {
    func: F,
    args: A,
}

/// Bind `args` so that every evaluation calls `func(x, &args)`.
pub fn with_args<F, A>(func: F, args: A) -> WithArgs<F, A>
where
    F: FnMut(&[f64], &A) -> anyhow::Result<Evaluation>,
{
    WithArgs { func, args }
}

impl<F, A> Evaluator for WithArgs<F, A>
where
    F: FnMut(&[f64], &A) -> anyhow::Result<Evaluation>,
{
    fn evaluate(&mut self, x: &[f64]) -> anyhow::Result<Evaluation> {
        (self.func)(x, &self.args)
    }
}
