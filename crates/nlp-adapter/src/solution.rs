//! Normalized solve output.
//!
//! Whatever backend ran, callers get the same shape back: a [`Solution`]
//! (a single point or a Pareto front) and a [`SolveInfo`] with diagnostics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::TerminationCode;
use crate::evaluation::ObjectiveValues;
use crate::population::ParetoFront;

/// A single optimal point with trustworthy final values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSolution {
    pub x: Vec<f64>,
    pub objective: ObjectiveValues,
    pub inequality: Vec<f64>,
    pub equality: Vec<f64>,
}

/// Final result of a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Solution {
    Point(PointSolution),
    /// First Pareto front of a population-based multi-objective backend.
    Front(ParetoFront),
}

impl Solution {
    /// The single optimal point, if this is not a front.
    pub fn point(&self) -> Option<&PointSolution> {
        match self {
            Solution::Point(point) => Some(point),
            Solution::Front(_) => None,
        }
    }

    /// The Pareto front, if the backend produced one.
    pub fn front(&self) -> Option<&ParetoFront> {
        match self {
            Solution::Point(_) => None,
            Solution::Front(front) => Some(front),
        }
    }

    /// Solution vector(s): one for a point, one per member for a front.
    pub fn designs(&self) -> Vec<&[f64]> {
        match self {
            Solution::Point(point) => vec![point.x.as_slice()],
            Solution::Front(front) => front.designs.iter().map(Vec::as_slice).collect(),
        }
    }
}

/// Diagnostics of one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveInfo {
    /// Evaluation-function invocations, detection call included.
    pub function_calls: usize,
    pub elapsed: Duration,
    pub termination: Option<TerminationCode>,
    pub max_constraint_violation: f64,
    /// Backend that produced the raw solution.
    pub backend: String,
}

/// Everything [`crate::optimize`] returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub solution: Solution,
    pub info: SolveInfo,
}
