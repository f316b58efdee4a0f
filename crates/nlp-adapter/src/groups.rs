//! Named-group records exchanged with the solver capability.
//!
//! Group-based NLP engines address every block of variables, objectives and
//! constraints by name. These records keep that logical key set (one entry
//! per declared group) while giving each group a typed field.

use serde::{Deserialize, Serialize};

use crate::evaluation::{Matrix, ObjectiveValues};

/// Design-variable group.
pub const DESIGN_GROUP: &str = "x";
/// Objective group of a single-objective problem.
pub const OBJECTIVE_GROUP: &str = "obj";
/// Nonlinear inequality constraint group.
pub const INEQUALITY_GROUP: &str = "con";
/// Nonlinear equality constraint group.
pub const EQUALITY_GROUP: &str = "con-eq";
/// Linear inequality constraint group.
pub const LINEAR_INEQUALITY_GROUP: &str = "linear-ineq";
/// Linear equality constraint group.
pub const LINEAR_EQUALITY_GROUP: &str = "linear-eq";

/// Name of objective `index` in a multi-objective problem.
pub fn objective_group_name(index: usize) -> String {
    format!("{OBJECTIVE_GROUP}{index}")
}

/// Input handed to the value and gradient entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignInputs {
    /// Values of the `x` group.
    pub x: Vec<f64>,
}

impl DesignInputs {
    pub fn new(x: Vec<f64>) -> Self {
        Self { x }
    }
}

/// Output of the value entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueOutputs {
    pub objective: ObjectiveValues,
    /// Values of the `con` group (empty when there are none).
    pub inequality: Vec<f64>,
    /// Values of the `con-eq` group; present for extended-form functions.
    pub equality: Option<Vec<f64>>,
}

impl ValueOutputs {
    /// Objective entries keyed by group name, in index order.
    ///
    /// A scalar objective yields the single `obj` key; a multi-objective
    /// vector yields `obj0`, `obj1`, ... with one scalar each.
    pub fn objective_entries(&self) -> Vec<(String, f64)> {
        match &self.objective {
            ObjectiveValues::Single(value) => vec![(OBJECTIVE_GROUP.to_string(), *value)],
            ObjectiveValues::Multi(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| (objective_group_name(i), *v))
                .collect(),
        }
    }

    /// Look up one objective by group name.
    pub fn objective(&self, name: &str) -> Option<f64> {
        self.objective_entries()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Derivatives of one output group with respect to the `x` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupGradient {
    /// Output group name (`obj`, `obj0`, `con`, ...).
    pub of: String,
    /// Row-major derivative block, one row per output entry.
    pub wrt_x: Matrix,
}

/// Output of the gradient entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientOutputs {
    /// One block per objective group, in index order, each `1 x nx`.
    pub objective: Vec<GroupGradient>,
    /// Inequality Jacobian, `nc x nx`.
    pub inequality: GroupGradient,
    /// Equality Jacobian, `neq x nx`; present for extended-form functions.
    pub equality: Option<GroupGradient>,
}

impl GradientOutputs {
    /// All gradient blocks keyed by output group.
    pub fn blocks(&self) -> impl Iterator<Item = &GroupGradient> {
        self.objective
            .iter()
            .chain(std::iter::once(&self.inequality))
            .chain(self.equality.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_objective_entries() {
        let out = ValueOutputs {
            objective: ObjectiveValues::Single(2.5),
            inequality: vec![],
            equality: None,
        };
        assert_eq!(out.objective_entries(), vec![("obj".to_string(), 2.5)]);
        assert_eq!(out.objective("obj"), Some(2.5));
        assert_eq!(out.objective("obj0"), None);
    }

    #[test]
    fn test_multi_objective_entries() {
        let out = ValueOutputs {
            objective: ObjectiveValues::Multi(vec![1.0, 2.0, 3.0]),
            inequality: vec![],
            equality: Some(vec![]),
        };
        let keys: Vec<String> = out.objective_entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["obj0", "obj1", "obj2"]);
        assert_eq!(out.objective("obj1"), Some(2.0));
        assert_eq!(out.objective("obj"), None);
    }

    #[test]
    fn test_gradient_blocks_order() {
        let grads = GradientOutputs {
            objective: vec![GroupGradient {
                of: "obj".to_string(),
                wrt_x: vec![vec![1.0]],
            }],
            inequality: GroupGradient {
                of: "con".to_string(),
                wrt_x: vec![],
            },
            equality: Some(GroupGradient {
                of: "con-eq".to_string(),
                wrt_x: vec![],
            }),
        };
        let names: Vec<&str> = grads.blocks().map(|b| b.of.as_str()).collect();
        assert_eq!(names, vec!["obj", "con", "con-eq"]);
    }
}
