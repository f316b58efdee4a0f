//! End-to-end tests of `optimize` against mock solver capabilities.
//!
//! Each mock plays the role of one kind of external engine: an analytic
//! gradient driver, a finite-difference driver, a column-vector reporter and
//! a population-file writer.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use nlp_adapter::backend::{RawDesign, TerminationCode};
use nlp_adapter::config::AdapterConfig;
use nlp_adapter::{
    optimize, optimize_with_config, AdapterError, DesignInputs, Evaluation, LinearConstraints,
    ObjectiveValues, ProblemDescriptor, RawSolution, Sensitivity, SolveCallbacks, SolverBackend,
};

/// `f = (x0 - 1)^2 + (x1 - 2)^2`, `c = [x0 + x1 - 2]`.
fn bowl(x: &[f64]) -> Result<Evaluation> {
    Ok(Evaluation::basic(
        (x[0] - 1.0).powi(2) + (x[1] - 2.0).powi(2),
        vec![x[0] + x[1] - 2.0],
    ))
}

fn bowl_with_gradients(x: &[f64]) -> Result<Evaluation> {
    Ok(bowl(x)?.with_gradients(
        vec![vec![2.0 * (x[0] - 1.0), 2.0 * (x[1] - 2.0)]],
        vec![vec![1.0, 1.0]],
    ))
}

/// Fixed-step gradient descent on the objective, ignoring constraints.
struct SteepestDescent {
    name: &'static str,
    steps: usize,
    /// Ask for the gradient at a perturbed point instead of the evaluated one.
    perturb_gradient_point: bool,
    seen: Option<ProblemDescriptor>,
    sensitivity: Option<Sensitivity>,
}

impl SteepestDescent {
    fn new(name: &'static str, steps: usize) -> Self {
        Self {
            name,
            steps,
            perturb_gradient_point: false,
            seen: None,
            sensitivity: None,
        }
    }
}

impl SolverBackend for SteepestDescent {
    fn name(&self) -> &str {
        self.name
    }

    fn solve(
        &mut self,
        problem: &ProblemDescriptor,
        sensitivity: &Sensitivity,
        callbacks: &mut dyn SolveCallbacks,
    ) -> Result<RawSolution> {
        self.seen = Some(problem.clone());
        self.sensitivity = Some(*sensitivity);

        let mut x = problem.variables.value.clone();
        let mut last = 0.0;
        for _ in 0..self.steps {
            let inputs = DesignInputs::new(x.clone());
            let (values, fail) = callbacks.evaluate(&inputs)?;
            assert!(!fail);
            last = values.objective.as_slice()[0];

            if sensitivity.is_analytic() {
                let grad_inputs = if self.perturb_gradient_point {
                    DesignInputs::new(x.iter().map(|v| v + 1e-3).collect())
                } else {
                    inputs
                };
                let (grads, fail) = callbacks.gradient(&grad_inputs, &values)?;
                assert!(!fail);
                let g = &grads.objective[0].wrt_x[0];
                for (xi, gi) in x.iter_mut().zip(g) {
                    *xi -= 0.25 * gi;
                }
            } else {
                let h = 1e-6;
                let mut g = Vec::with_capacity(x.len());
                for i in 0..x.len() {
                    let mut xh = x.clone();
                    xh[i] += h * x[i].abs().max(1.0);
                    let (vh, _) = callbacks.evaluate(&DesignInputs::new(xh.clone()))?;
                    g.push((vh.objective.as_slice()[0] - last) / (xh[i] - x[i]));
                }
                for (xi, gi) in x.iter_mut().zip(&g) {
                    *xi -= 0.25 * gi;
                }
            }
        }

        let mut raw = RawSolution::new(self.name, x, ObjectiveValues::Single(-1.0e9));
        raw.opt_time = Some(Duration::from_millis(7));
        raw.inform = Some(TerminationCode {
            value: 0,
            text: "iteration limit".to_string(),
        });
        Ok(raw)
    }
}

#[test]
fn test_analytic_gradients_hit_cache() {
    let mut solver = SteepestDescent::new("SLSQP", 20);
    let result = optimize(
        bowl_with_gradients,
        &[0.0, 0.0],
        &[-10.0, -10.0],
        &[10.0, 10.0],
        &mut solver,
        LinearConstraints::none(),
    )
    .unwrap();

    assert_eq!(solver.sensitivity, Some(Sensitivity::Analytic));
    // detection + one value call per step + final re-evaluation
    assert_eq!(result.info.function_calls, 1 + 20 + 1);

    let point = result.solution.point().unwrap();
    assert!((point.x[0] - 1.0).abs() < 1e-4);
    assert!((point.x[1] - 2.0).abs() < 1e-4);
    // Echoed objective was garbage; the re-evaluated one is not.
    match point.objective {
        ObjectiveValues::Single(f) => assert!(f.abs() < 1e-8),
        ObjectiveValues::Multi(_) => panic!("expected a scalar objective"),
    }
    assert!((result.info.max_constraint_violation - 1.0).abs() < 1e-4);
    assert_eq!(result.info.elapsed, Duration::from_millis(7));
    assert_eq!(result.info.termination.as_ref().unwrap().value, 0);
    assert_eq!(result.info.backend, "SLSQP");
}

#[test]
fn test_gradient_point_mismatch_recomputes() {
    let mut solver = SteepestDescent::new("SLSQP", 5);
    solver.perturb_gradient_point = true;
    let result = optimize(
        bowl_with_gradients,
        &[0.0, 0.0],
        &[-10.0, -10.0],
        &[10.0, 10.0],
        &mut solver,
        LinearConstraints::none(),
    )
    .unwrap();

    // detection + (value + gradient miss) per step + final re-evaluation
    assert_eq!(result.info.function_calls, 1 + 5 * 2 + 1);
}

#[test]
fn test_finite_difference_fallback() {
    let mut solver = SteepestDescent::new("SLSQP", 3);
    let result = optimize(
        bowl,
        &[0.0, 0.0],
        &[-10.0, -10.0],
        &[10.0, 10.0],
        &mut solver,
        LinearConstraints::none(),
    )
    .unwrap();

    match solver.sensitivity {
        Some(Sensitivity::FiniteDifference(fd)) => assert_eq!(fd.policy(), "FDR"),
        other => panic!("unexpected sensitivity: {other:?}"),
    }
    // detection + (1 + nx) per step + final re-evaluation
    assert_eq!(result.info.function_calls, 1 + 3 * 3 + 1);
}

#[test]
fn test_descriptor_groups() {
    let mut solver = SteepestDescent::new("SLSQP", 1);
    let linear = LinearConstraints::none()
        .inequality(vec![vec![1.0, 0.0]], vec![5.0])
        .equality(vec![vec![0.0, 1.0]], vec![2.0]);
    optimize(
        bowl_with_gradients,
        &[0.5, 0.5],
        &[-10.0, -10.0],
        &[10.0, 10.0],
        &mut solver,
        linear,
    )
    .unwrap();

    let descriptor = solver.seen.unwrap();
    assert_eq!(
        descriptor.group_names(),
        vec!["x", "obj", "con", "linear-ineq", "linear-eq"]
    );
    assert_eq!(descriptor.variables.value, vec![0.5, 0.5]);
    assert_eq!(descriptor.name, "optimization");
}

#[test]
fn test_zero_size_groups_omitted() {
    let unconstrained = |x: &[f64]| -> Result<Evaluation> {
        Ok(Evaluation::extended(
            ObjectiveValues::Single(x[0] * x[0]),
            vec![],
            vec![],
        ))
    };
    let mut solver = SteepestDescent::new("SLSQP", 1);
    let result = optimize(
        unconstrained,
        &[1.0],
        &[-1.0],
        &[1.0],
        &mut solver,
        LinearConstraints::none().inequality(vec![], vec![]),
    )
    .unwrap();

    let descriptor = solver.seen.unwrap();
    assert!(descriptor.constraints.is_empty());
    assert_eq!(result.info.max_constraint_violation, 0.0);
}

#[test]
fn test_bounds_mismatch_rejected_before_solving() {
    let mut solver = SteepestDescent::new("SLSQP", 1);
    let err = optimize(
        bowl,
        &[0.0, 0.0],
        &[-1.0],
        &[1.0, 1.0],
        &mut solver,
        LinearConstraints::none(),
    )
    .unwrap_err();
    assert!(matches!(err, AdapterError::DimensionMismatch { .. }));
    assert!(solver.seen.is_none());
}

#[test]
fn test_user_error_aborts_solve() {
    let fragile = |x: &[f64]| -> Result<Evaluation> {
        if x[0] > 0.1 {
            anyhow::bail!("simulation diverged at x0 = {}", x[0]);
        }
        bowl(x)
    };
    let mut solver = SteepestDescent::new("SLSQP", 10);
    let err = optimize(
        fragile,
        &[0.0, 0.0],
        &[-10.0, -10.0],
        &[10.0, 10.0],
        &mut solver,
        LinearConstraints::none(),
    )
    .unwrap_err();

    match err {
        AdapterError::Evaluation(inner) => assert!(inner.to_string().contains("diverged")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_solves_do_not_share_counters() {
    let mut first = SteepestDescent::new("SLSQP", 4);
    let mut second = SteepestDescent::new("SLSQP", 4);
    let a = optimize(
        bowl_with_gradients,
        &[0.0, 0.0],
        &[-10.0, -10.0],
        &[10.0, 10.0],
        &mut first,
        LinearConstraints::none(),
    )
    .unwrap();
    let b = optimize(
        bowl_with_gradients,
        &[0.0, 0.0],
        &[-10.0, -10.0],
        &[10.0, 10.0],
        &mut second,
        LinearConstraints::none(),
    )
    .unwrap();
    assert_eq!(a.info.function_calls, b.info.function_calls);
}

/// Reports the starting point as an `nx x 1` column and fails loudly otherwise.
struct ColumnReporter;

impl SolverBackend for ColumnReporter {
    fn name(&self) -> &str {
        "NLPQLP"
    }

    fn solve(
        &mut self,
        problem: &ProblemDescriptor,
        _sensitivity: &Sensitivity,
        callbacks: &mut dyn SolveCallbacks,
    ) -> Result<RawSolution> {
        let (values, _) = callbacks.evaluate(&DesignInputs::new(problem.variables.value.clone()))?;
        let mut raw = RawSolution::new("NLPQLP", vec![], values.objective);
        raw.x_star = RawDesign::Column(
            problem
                .variables
                .value
                .iter()
                .map(|v| vec![*v])
                .collect(),
        );
        Ok(raw)
    }
}

#[test]
fn test_column_solution_is_flattened() {
    let result = optimize(
        bowl,
        &[0.25, 0.75],
        &[-1.0, -1.0],
        &[1.0, 1.0],
        &mut ColumnReporter,
        LinearConstraints::none(),
    )
    .unwrap();
    assert_eq!(result.solution.point().unwrap().x, vec![0.25, 0.75]);
}

/// Trusted backend that echoes objective and constraints.
struct Echoing;

impl SolverBackend for Echoing {
    fn name(&self) -> &str {
        "SNOPT"
    }

    fn solve(
        &mut self,
        problem: &ProblemDescriptor,
        _sensitivity: &Sensitivity,
        callbacks: &mut dyn SolveCallbacks,
    ) -> Result<RawSolution> {
        let x = problem.variables.value.clone();
        let (values, _) = callbacks.evaluate(&DesignInputs::new(x.clone()))?;
        let mut raw = RawSolution::new("SNOPT", x, values.objective);
        raw.inequality_star = Some(values.inequality);
        Ok(raw)
    }
}

#[test]
fn test_trusted_backend_skips_reevaluation() {
    let result = optimize(
        bowl,
        &[2.0, 2.0],
        &[-5.0, -5.0],
        &[5.0, 5.0],
        &mut Echoing,
        LinearConstraints::none(),
    )
    .unwrap();
    assert_eq!(result.info.function_calls, 2);
    assert_eq!(result.info.max_constraint_violation, 2.0);
}

#[test]
fn test_trusted_backend_without_equality_echo_keeps_equality_violation() {
    let offset = |x: &[f64]| -> Result<Evaluation> {
        Ok(Evaluation::extended(
            ObjectiveValues::Single(x[0] * x[0]),
            vec![x[0] - 1.0],
            vec![x[0] - 5.0],
        ))
    };
    let result = optimize(
        offset,
        &[0.0],
        &[-10.0],
        &[10.0],
        &mut Echoing,
        LinearConstraints::none(),
    )
    .unwrap();

    let point = result.solution.point().unwrap();
    assert_eq!(point.equality, vec![-5.0]);
    assert_eq!(point.objective, ObjectiveValues::Single(0.0));
    assert_eq!(result.info.max_constraint_violation, 5.0);
    // detection + one value call + re-evaluation for the missing equality echo
    assert_eq!(result.info.function_calls, 3);
}

#[test]
fn test_legacy_always_reevaluate() {
    let mut config = AdapterConfig::default();
    config.normalizer.always_reevaluate = true;
    let result = optimize_with_config(
        bowl,
        &[2.0, 2.0],
        &[-5.0, -5.0],
        &[5.0, 5.0],
        &mut Echoing,
        LinearConstraints::none(),
        &config,
    )
    .unwrap();
    assert_eq!(result.info.function_calls, 3);
}

/// Writes a final population file the way a genetic backend does.
struct PopulationWriter {
    path: PathBuf,
}

impl SolverBackend for PopulationWriter {
    fn name(&self) -> &str {
        "NSGA2"
    }

    fn solve(
        &mut self,
        problem: &ProblemDescriptor,
        _sensitivity: &Sensitivity,
        callbacks: &mut dyn SolveCallbacks,
    ) -> Result<RawSolution> {
        assert_eq!(problem.objectives.len(), 2);
        let x = problem.variables.value.clone();
        let (values, _) = callbacks.evaluate(&DesignInputs::new(x.clone()))?;

        let mut file = std::fs::File::create(&self.path)?;
        writeln!(file, "# population")?;
        writeln!(file, "# generation 100")?;
        writeln!(file, "1.0 2.0 0.5 3.0 4.0 1")?;
        writeln!(file, "0.5 0.5 0.1 0.0 0.0 2")?;
        writeln!(file, "2.0 1.0 -0.25 5.0 6.0 1")?;

        Ok(RawSolution::new("NSGA2", x, values.objective))
    }
}

#[test]
fn test_population_front_extracted() {
    let two_objectives = |x: &[f64]| -> Result<Evaluation> {
        Ok(Evaluation::extended(
            ObjectiveValues::Multi(vec![x[0], x[1]]),
            vec![x[0] - x[1]],
            vec![],
        ))
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("final_pop.out");
    let mut config = AdapterConfig::default();
    config.normalizer.population_file = path.clone();

    let result = optimize_with_config(
        two_objectives,
        &[0.0, 1.0],
        &[0.0, 0.0],
        &[10.0, 10.0],
        &mut PopulationWriter { path },
        LinearConstraints::none(),
        &config,
    )
    .unwrap();

    let front = result.solution.front().unwrap();
    assert_eq!(front.len(), 2);
    assert_eq!(front.objectives, vec![vec![1.0, 2.0], vec![2.0, 1.0]]);
    assert_eq!(front.constraints, vec![vec![-0.5], vec![0.25]]);
    assert_eq!(front.designs, vec![vec![3.0, 4.0], vec![5.0, 6.0]]);
    assert_eq!(result.info.max_constraint_violation, 0.25);
    // detection + one value call; no final re-evaluation
    assert_eq!(result.info.function_calls, 2);
}

/// Fails on its own, without any callback error.
struct Broken;

impl SolverBackend for Broken {
    fn name(&self) -> &str {
        "BROKEN"
    }

    fn solve(
        &mut self,
        _problem: &ProblemDescriptor,
        _sensitivity: &Sensitivity,
        _callbacks: &mut dyn SolveCallbacks,
    ) -> Result<RawSolution> {
        anyhow::bail!("license check failed")
    }
}

#[test]
fn test_solver_failure_reported() {
    let err = optimize(
        bowl,
        &[0.0, 0.0],
        &[-1.0, -1.0],
        &[1.0, 1.0],
        &mut Broken,
        LinearConstraints::none(),
    )
    .unwrap_err();
    assert!(matches!(err, AdapterError::Solver(_)));
}
