use std::io::{self, Write};

use anyhow::Result;
use nlp_adapter::max_constraint_violation;
use tracing::debug;

pub fn handle(inequality: &[f64], equality: &[f64]) -> Result<()> {
    debug!(
        inequality = inequality.len(),
        equality = equality.len(),
        "computing constraint violation"
    );
    write_violation(&mut io::stdout(), inequality, equality)
}

fn write_violation<W: Write>(out: &mut W, inequality: &[f64], equality: &[f64]) -> Result<()> {
    writeln!(out, "{}", max_constraint_violation(inequality, equality))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_violation() {
        let mut out = Vec::new();
        write_violation(&mut out, &[-1.0, 2.0, -3.0], &[-2.5]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2.5\n");
    }

    #[test]
    fn test_write_violation_feasible() {
        let mut out = Vec::new();
        write_violation(&mut out, &[-1.0], &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0\n");
    }
}
