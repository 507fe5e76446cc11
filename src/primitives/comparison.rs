// ABOUTME: Variadic chained comparisons: <, <=, =, >=, >

use crate::error::RuntimeError;
use crate::primitives::arithmetic::as_ratio;
use crate::value::Value;
use std::cmp::Ordering;

fn require_at_least_two(function: &str, args: &[Value]) -> Result<(), RuntimeError> {
    if args.len() < 2 {
        return Err(RuntimeError::arity(function, "at least 2", args.len()));
    }
    Ok(())
}

/// Cross-multiplies two already-normalized ratios (positive denominators) to
/// compare without floating point.
fn ratio_cmp(a: (i64, i64), b: (i64, i64)) -> Ordering {
    (a.0 * b.1).cmp(&(b.0 * a.1))
}

fn chained(function: &str, args: &[Value], holds: impl Fn(Ordering) -> bool) -> Result<Value, RuntimeError> {
    require_at_least_two(function, args)?;
    let mut prev = as_ratio(&args[0], function, 0)?;
    for (i, arg) in args[1..].iter().enumerate() {
        let current = as_ratio(arg, function, i + 1)?;
        if !holds(ratio_cmp(prev, current)) {
            return Ok(Value::Boolean(false));
        }
        prev = current;
    }
    Ok(Value::Boolean(true))
}

pub fn less(args: &[Value]) -> Result<Value, RuntimeError> {
    chained("<", args, |o| o == Ordering::Less)
}

pub fn less_eq(args: &[Value]) -> Result<Value, RuntimeError> {
    chained("<=", args, |o| o != Ordering::Greater)
}

pub fn numeric_equal(args: &[Value]) -> Result<Value, RuntimeError> {
    chained("=", args, |o| o == Ordering::Equal)
}

pub fn greater_eq(args: &[Value]) -> Result<Value, RuntimeError> {
    chained(">=", args, |o| o != Ordering::Less)
}

pub fn greater(args: &[Value]) -> Result<Value, RuntimeError> {
    chained(">", args, |o| o == Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn less_requires_at_least_two_args() {
        assert!(less(&[Value::Integer(1)]).is_err());
    }

    #[test]
    fn chained_less_than() {
        let args = [Value::Integer(1), Value::Integer(2), Value::Integer(3)];
        assert!(matches!(less(&args).unwrap(), Value::Boolean(true)));
    }

    #[test]
    fn chained_less_than_stops_at_first_violation() {
        let args = [Value::Integer(1), Value::Integer(3), Value::Integer(2)];
        assert!(matches!(less(&args).unwrap(), Value::Boolean(false)));
    }

    #[test]
    fn equal_compares_rationals_cross_multiplied() {
        let args = [Value::Rational(1, 2), Value::Rational(2, 4)];
        assert!(matches!(numeric_equal(&args).unwrap(), Value::Boolean(true)));
    }

    #[test]
    fn greater_eq_allows_equal_neighbors() {
        let args = [Value::Integer(3), Value::Integer(3), Value::Integer(2)];
        assert!(matches!(greater_eq(&args).unwrap(), Value::Boolean(true)));
    }
}
