//! Evaluation bridge between the caller's function and the solver callbacks.
//!
//! The bridge detects the evaluation form on a first call at the initial
//! design vector, then serves the value and gradient entry points. In
//! gradient mode the value entry point stashes the derivatives it computed
//! so that the gradient entry point, called next for the same point, does not
//! evaluate the function a second time.

use tracing::{debug, info, trace};

use crate::backend::SolveCallbacks;
use crate::cache::EvaluationCache;
use crate::counter::CallCounter;
use crate::error::{AdapterError, AdapterResult};
use crate::evaluation::{Evaluation, EvaluationForm, Evaluator, Gradients};
use crate::groups::{
    objective_group_name, DesignInputs, GradientOutputs, GroupGradient, ValueOutputs,
    EQUALITY_GROUP, INEQUALITY_GROUP, OBJECTIVE_GROUP,
};

const OBJECTIVE_GRADIENT: &str = "objective gradient";
const INEQUALITY_JACOBIAN: &str = "inequality jacobian";
const EQUALITY_JACOBIAN: &str = "equality jacobian";

/// Sizes fixed by the detection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemShape {
    /// Design variables.
    pub nx: usize,
    /// Objective components; `None` for a scalar objective.
    pub nf: Option<usize>,
    /// Nonlinear inequality constraints.
    pub nc: usize,
    /// Nonlinear equality constraints.
    pub neq: usize,
}

impl ProblemShape {
    /// Number of objective components, counting a scalar objective as one.
    pub fn objective_count(&self) -> usize {
        self.nf.unwrap_or(1)
    }
}

/// Re-evaluation of the final design point during normalization.
pub trait FinalEvaluator {
    /// Evaluate `x` through the user function, counting the call.
    fn reevaluate(&mut self, x: &[f64]) -> AdapterResult<Evaluation>;
}

/// Wraps an [`Evaluator`] for the duration of one solve.
pub struct EvaluationBridge<E> {
    func: E,
    form: EvaluationForm,
    shape: ProblemShape,
    cache: EvaluationCache,
    counter: CallCounter,
}

impl<E: Evaluator> EvaluationBridge<E> {
    /// Detect the evaluation form by calling `func` once at `x0`.
    ///
    /// The detection call is counted. Returns the bridge together with the
    /// evaluation at `x0`.
    pub fn detect(mut func: E, x0: &[f64]) -> AdapterResult<(Self, Evaluation)> {
        let mut counter = CallCounter::new();
        counter.increment();
        let initial = func.evaluate(x0).map_err(AdapterError::Evaluation)?;

        let form = initial.form();
        let shape = ProblemShape {
            nx: x0.len(),
            nf: initial.objective.is_multi().then(|| initial.objective.len()),
            nc: initial.inequality.len(),
            neq: initial.equality_values().len(),
        };
        info!(
            %form,
            nx = shape.nx,
            nc = shape.nc,
            neq = shape.neq,
            objectives = shape.objective_count(),
            "detected evaluation form"
        );

        let bridge = Self {
            func,
            form,
            shape,
            cache: EvaluationCache::new(),
            counter,
        };
        bridge.check(&initial)?;
        Ok((bridge, initial))
    }

    /// Evaluation form fixed by the detection call.
    pub fn form(&self) -> EvaluationForm {
        self.form
    }

    /// Sizes fixed by the detection call.
    pub fn shape(&self) -> ProblemShape {
        self.shape
    }

    /// Whether the evaluation function supplies its own derivatives.
    pub fn has_gradients(&self) -> bool {
        self.form.has_gradients()
    }

    /// Number of evaluation-function invocations so far, detection included.
    pub fn calls(&self) -> usize {
        self.counter.get()
    }

    /// Call the user function, counting the call and enforcing the detected form.
    fn call(&mut self, x: &[f64]) -> AdapterResult<Evaluation> {
        let n = self.counter.increment();
        trace!(call = n, "evaluating user function");
        let eval = self.func.evaluate(x).map_err(AdapterError::Evaluation)?;
        self.check(&eval)?;
        Ok(eval)
    }

    fn check_design(&self, x: &[f64]) -> AdapterResult<()> {
        if x.len() != self.shape.nx {
            return Err(AdapterError::DimensionMismatch {
                what: "design vector",
                expected: self.shape.nx,
                found: x.len(),
            });
        }
        Ok(())
    }

    fn check(&self, eval: &Evaluation) -> AdapterResult<()> {
        let form = eval.form();
        if form != self.form {
            return Err(AdapterError::ArityChanged {
                expected: self.form.arity(),
                found: form.arity(),
            });
        }
        check_size(OBJECTIVE_GROUP, self.shape.objective_count(), eval.objective.len())?;
        check_size(INEQUALITY_GROUP, self.shape.nc, eval.inequality.len())?;
        check_size(EQUALITY_GROUP, self.shape.neq, eval.equality_values().len())?;
        if let Some(gradients) = &eval.gradients {
            self.check_gradients(gradients)?;
        }
        Ok(())
    }

    /// Every Jacobian block needs one row per output entry and `nx` columns.
    fn check_gradients(&self, gradients: &Gradients) -> AdapterResult<()> {
        let nx = self.shape.nx;
        check_block(
            OBJECTIVE_GRADIENT,
            &gradients.objective,
            self.shape.objective_count(),
            nx,
        )?;
        check_block(INEQUALITY_JACOBIAN, &gradients.inequality, self.shape.nc, nx)?;
        let equality = gradients.equality.as_deref().unwrap_or(&[]);
        check_block(EQUALITY_JACOBIAN, equality, self.shape.neq, nx)?;
        Ok(())
    }

    fn gradients_of(eval: Evaluation) -> AdapterResult<Gradients> {
        eval.gradients.ok_or(AdapterError::GradientsUnavailable)
    }

    /// The value entry point.
    ///
    /// The fail flag is always `false`: the adapter does no failure
    /// signalling of its own, and a failing user function aborts the solve.
    pub fn evaluate(&mut self, inputs: &DesignInputs) -> AdapterResult<(ValueOutputs, bool)> {
        let x = inputs.x.as_slice();
        self.check_design(x)?;
        let eval = self.call(x)?;

        let outputs = ValueOutputs {
            objective: eval.objective,
            inequality: eval.inequality,
            equality: if self.form.is_extended() {
                Some(eval.equality.unwrap_or_default())
            } else {
                None
            },
        };
        if let Some(gradients) = eval.gradients {
            self.cache.store(x, gradients);
        }

        Ok((outputs, false))
    }

    /// The gradient entry point.
    ///
    /// Reuses the derivatives stashed by the preceding [`Self::evaluate`] when
    /// `inputs.x` matches exactly; otherwise evaluates again.
    pub fn gradient(
        &mut self,
        inputs: &DesignInputs,
        _values: &ValueOutputs,
    ) -> AdapterResult<(GradientOutputs, bool)> {
        if !self.has_gradients() {
            return Err(AdapterError::GradientsUnavailable);
        }

        let x = inputs.x.as_slice();
        self.check_design(x)?;
        let gradients = match self.cache.take(x) {
            Some(cached) => {
                trace!("gradient cache hit");
                cached
            }
            None => {
                debug!("gradient cache miss, re-evaluating");
                Self::gradients_of(self.call(x)?)?
            }
        };

        Ok((self.gradient_outputs(gradients), false))
    }

    fn gradient_outputs(&self, gradients: Gradients) -> GradientOutputs {
        let objective = match self.shape.nf {
            None => vec![GroupGradient {
                of: OBJECTIVE_GROUP.to_string(),
                wrt_x: gradients.objective,
            }],
            Some(_) => gradients
                .objective
                .into_iter()
                .enumerate()
                .map(|(i, row)| GroupGradient {
                    of: objective_group_name(i),
                    wrt_x: vec![row],
                })
                .collect(),
        };

        GradientOutputs {
            objective,
            inequality: GroupGradient {
                of: INEQUALITY_GROUP.to_string(),
                wrt_x: gradients.inequality,
            },
            equality: self.form.is_extended().then(|| GroupGradient {
                of: EQUALITY_GROUP.to_string(),
                wrt_x: gradients.equality.unwrap_or_default(),
            }),
        }
    }
}

impl<E: Evaluator> SolveCallbacks for EvaluationBridge<E> {
    fn evaluate(&mut self, inputs: &DesignInputs) -> AdapterResult<(ValueOutputs, bool)> {
        EvaluationBridge::evaluate(self, inputs)
    }

    fn gradient(
        &mut self,
        inputs: &DesignInputs,
        values: &ValueOutputs,
    ) -> AdapterResult<(GradientOutputs, bool)> {
        EvaluationBridge::gradient(self, inputs, values)
    }
}

impl<E: Evaluator> FinalEvaluator for EvaluationBridge<E> {
    fn reevaluate(&mut self, x: &[f64]) -> AdapterResult<Evaluation> {
        debug!("re-evaluating final design point");
        self.cache.clear();
        self.call(x)
    }
}

fn check_size(group: &'static str, expected: usize, found: usize) -> AdapterResult<()> {
    if expected != found {
        return Err(AdapterError::ShapeChanged {
            group,
            expected,
            found,
        });
    }
    Ok(())
}

fn check_block(
    block: &'static str,
    matrix: &[Vec<f64>],
    rows: usize,
    nx: usize,
) -> AdapterResult<()> {
    check_size(block, rows, matrix.len())?;
    if let Some(row) = matrix.iter().find(|row| row.len() != nx) {
        return Err(AdapterError::ShapeChanged {
            group: block,
            expected: nx,
            found: row.len(),
        });
    }
    Ok(())
}
