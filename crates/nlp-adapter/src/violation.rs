//! Aggregate constraint-violation metric.

/// Largest amount by which any constraint misses its bound.
///
/// Inequalities follow `c <= 0` and equalities `ceq == 0`, so the metric is
/// `max(0, max(c), max(|ceq|))`. It is exactly zero when there are no
/// constraints or every one is satisfied.
///
/// A NaN constraint value makes the metric NaN.
pub fn max_constraint_violation(inequality: &[f64], equality: &[f64]) -> f64 {
    worst_violation(
        inequality
            .iter()
            .copied()
            .chain(equality.iter().map(|v| v.abs())),
    )
}

/// Largest of `violations`, floored at zero. NaN anywhere yields NaN.
pub fn worst_violation<I>(violations: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    violations.into_iter().fold(0.0_f64, |worst, v| {
        if worst.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            worst.max(v)
        }
    })
}
