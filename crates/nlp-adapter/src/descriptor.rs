//! Problem descriptor handed to the solver capability.
//!
//! Builds the named-group model: one design-variable group, one objective
//! group per objective, and the nonlinear and linear constraint groups.
//! Groups of size zero are never registered.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AdapterError, AdapterResult};
use crate::evaluation::Matrix;
use crate::groups::{
    objective_group_name, DESIGN_GROUP, EQUALITY_GROUP, INEQUALITY_GROUP,
    LINEAR_EQUALITY_GROUP, LINEAR_INEQUALITY_GROUP, OBJECTIVE_GROUP,
};

/// Design-variable group with bounds and starting point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableGroup {
    pub name: String,
    pub size: usize,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub value: Vec<f64>,
}

/// A named objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveGroup {
    pub name: String,
    /// Position in a multi-objective vector; `None` for a scalar objective.
    pub index: Option<usize>,
}

/// A named block of constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintGroup {
    pub name: String,
    pub size: usize,
    /// `None` means unbounded below.
    pub lower: Option<Vec<f64>>,
    /// `None` means unbounded above.
    pub upper: Option<Vec<f64>>,
    pub linear: bool,
    /// Fixed Jacobian with respect to `x`; linear groups only.
    pub jacobian: Option<Matrix>,
}

impl ConstraintGroup {
    pub fn is_equality(&self) -> bool {
        self.lower.is_some() && self.lower == self.upper
    }
}

/// Linear constraint block `A x <= b` or `A x == b`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// One row per constraint, `nx` columns each.
    pub matrix: Matrix,
    pub bound: Vec<f64>,
}

impl LinearConstraint {
    pub fn new(matrix: Matrix, bound: Vec<f64>) -> Self {
        Self { matrix, bound }
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    fn validate(&self, what: &'static str, nx: usize) -> AdapterResult<()> {
        if self.matrix.len() != self.bound.len() {
            return Err(AdapterError::DimensionMismatch {
                what,
                expected: self.bound.len(),
                found: self.matrix.len(),
            });
        }
        if let Some(row) = self.matrix.iter().find(|row| row.len() != nx) {
            return Err(AdapterError::DimensionMismatch {
                what,
                expected: nx,
                found: row.len(),
            });
        }
        Ok(())
    }
}

/// The complete group model for one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDescriptor {
    pub name: String,
    pub variables: VariableGroup,
    pub objectives: Vec<ObjectiveGroup>,
    pub constraints: Vec<ConstraintGroup>,
}

impl ProblemDescriptor {
    /// Start building a descriptor around the design-variable group.
    pub fn builder(
        name: impl Into<String>,
        x0: &[f64],
        lower: &[f64],
        upper: &[f64],
    ) -> AdapterResult<DescriptorBuilder> {
        DescriptorBuilder::new(name.into(), x0, lower, upper)
    }

    /// Number of design variables.
    pub fn nx(&self) -> usize {
        self.variables.size
    }

    /// Look up a constraint group by name.
    pub fn constraint(&self, name: &str) -> Option<&ConstraintGroup> {
        self.constraints.iter().find(|g| g.name == name)
    }

    /// Names of all registered groups, design variables first.
    pub fn group_names(&self) -> Vec<&str> {
        std::iter::once(self.variables.name.as_str())
            .chain(self.objectives.iter().map(|o| o.name.as_str()))
            .chain(self.constraints.iter().map(|c| c.name.as_str()))
            .collect()
    }
}

/// Incremental construction of a [`ProblemDescriptor`].
#[derive(Debug)]
pub struct DescriptorBuilder {
    descriptor: ProblemDescriptor,
}

impl DescriptorBuilder {
    fn new(name: String, x0: &[f64], lower: &[f64], upper: &[f64]) -> AdapterResult<Self> {
        let nx = x0.len();
        if lower.len() != nx {
            return Err(AdapterError::DimensionMismatch {
                what: "lower bounds",
                expected: nx,
                found: lower.len(),
            });
        }
        if upper.len() != nx {
            return Err(AdapterError::DimensionMismatch {
                what: "upper bounds",
                expected: nx,
                found: upper.len(),
            });
        }

        debug!(group = DESIGN_GROUP, size = nx, "registered design variables");
        Ok(Self {
            descriptor: ProblemDescriptor {
                name,
                variables: VariableGroup {
                    name: DESIGN_GROUP.to_string(),
                    size: nx,
                    lower: lower.to_vec(),
                    upper: upper.to_vec(),
                    value: x0.to_vec(),
                },
                objectives: Vec::new(),
                constraints: Vec::new(),
            },
        })
    }

    /// Register the objective group(s).
    ///
    /// `count` is `None` for a scalar objective, otherwise the length of the
    /// objective vector; each component gets its own group in index order.
    pub fn objectives(mut self, count: Option<usize>) -> Self {
        self.descriptor.objectives = match count {
            None => vec![ObjectiveGroup {
                name: OBJECTIVE_GROUP.to_string(),
                index: None,
            }],
            Some(n) => (0..n)
                .map(|i| ObjectiveGroup {
                    name: objective_group_name(i),
                    index: Some(i),
                })
                .collect(),
        };
        debug!(
            count = self.descriptor.objectives.len(),
            "registered objective groups"
        );
        self
    }

    /// Register the nonlinear inequality group `c(x) <= 0`.
    pub fn inequality(self, size: usize) -> Self {
        self.push(ConstraintGroup {
            name: INEQUALITY_GROUP.to_string(),
            size,
            lower: None,
            upper: Some(vec![0.0; size]),
            linear: false,
            jacobian: None,
        })
    }

    /// Register the nonlinear equality group `ceq(x) == 0`.
    pub fn equality(self, size: usize) -> Self {
        self.push(ConstraintGroup {
            name: EQUALITY_GROUP.to_string(),
            size,
            lower: Some(vec![0.0; size]),
            upper: Some(vec![0.0; size]),
            linear: false,
            jacobian: None,
        })
    }

    /// Register the linear inequality group `A x <= b`.
    pub fn linear_inequality(self, constraint: &LinearConstraint) -> AdapterResult<Self> {
        constraint.validate("linear inequality matrix", self.descriptor.variables.size)?;
        Ok(self.push(ConstraintGroup {
            name: LINEAR_INEQUALITY_GROUP.to_string(),
            size: constraint.len(),
            lower: None,
            upper: Some(constraint.bound.clone()),
            linear: true,
            jacobian: Some(constraint.matrix.clone()),
        }))
    }

    /// Register the linear equality group `Aeq x == beq`.
    pub fn linear_equality(self, constraint: &LinearConstraint) -> AdapterResult<Self> {
        constraint.validate("linear equality matrix", self.descriptor.variables.size)?;
        Ok(self.push(ConstraintGroup {
            name: LINEAR_EQUALITY_GROUP.to_string(),
            size: constraint.len(),
            lower: Some(constraint.bound.clone()),
            upper: Some(constraint.bound.clone()),
            linear: true,
            jacobian: Some(constraint.matrix.clone()),
        }))
    }

    fn push(mut self, group: ConstraintGroup) -> Self {
        if group.size == 0 {
            debug!(group = %group.name, "skipped empty constraint group");
            return self;
        }
        debug!(
            group = %group.name,
            size = group.size,
            linear = group.linear,
            "registered constraint group"
        );
        self.descriptor.constraints.push(group);
        self
    }

    pub fn build(self) -> ProblemDescriptor {
        self.descriptor
    }
}
