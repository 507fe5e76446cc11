// ABOUTME: Exact rational arithmetic: +, -, *, /, modulo, expt

use crate::error::RuntimeError;
use crate::value::{make_rational, Value};

pub(crate) fn as_ratio(v: &Value, function: &str, position: usize) -> Result<(i64, i64), RuntimeError> {
    match v {
        Value::Integer(n) => Ok((*n, 1)),
        Value::Rational(n, d) => Ok((*n, *d)),
        other => Err(RuntimeError::type_error(function, "number", other, position)),
    }
}

fn as_integer(v: &Value, function: &str, position: usize) -> Result<i64, RuntimeError> {
    match v {
        Value::Integer(n) => Ok(*n),
        other => Err(RuntimeError::type_error(function, "integer", other, position)),
    }
}

/// `(+)` ⇒ 0; mixed integer/rational operands promote to rational.
pub fn add(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut num = 0i64;
    let mut den = 1i64;
    for (i, arg) in args.iter().enumerate() {
        let (n, d) = as_ratio(arg, "+", i)?;
        num = num * d + n * den;
        den *= d;
        (num, den) = normalize(num, den)?;
    }
    make_rational(num, den)
}

/// `(-)` fails; `(- x)` negates; otherwise left-fold subtraction.
pub fn sub(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::arity("-", "at least 1", 0));
    }
    let (mut num, mut den) = as_ratio(&args[0], "-", 0)?;
    if args.len() == 1 {
        return make_rational(-num, den);
    }
    for (i, arg) in args[1..].iter().enumerate() {
        let (n, d) = as_ratio(arg, "-", i + 1)?;
        num = num * d - n * den;
        den *= d;
        (num, den) = normalize(num, den)?;
    }
    make_rational(num, den)
}

/// `(*)` ⇒ 1.
pub fn mul(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut num = 1i64;
    let mut den = 1i64;
    for (i, arg) in args.iter().enumerate() {
        let (n, d) = as_ratio(arg, "*", i)?;
        num *= n;
        den *= d;
        (num, den) = normalize(num, den)?;
    }
    make_rational(num, den)
}

/// `(/)` fails; `(/ x)` is the reciprocal; otherwise left-fold division.
/// Two integers always produce a rational (collapsing to integer when the
/// denominator reduces to 1).
pub fn div(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::arity("/", "at least 1", 0));
    }
    let (mut num, mut den) = as_ratio(&args[0], "/", 0)?;
    if args.len() == 1 {
        if num == 0 {
            return Err(RuntimeError::DivisionByZero { function: "/".to_string() });
        }
        return make_rational(den, num);
    }
    for (i, arg) in args[1..].iter().enumerate() {
        let (n, d) = as_ratio(arg, "/", i + 1)?;
        if n == 0 {
            return Err(RuntimeError::DivisionByZero { function: "/".to_string() });
        }
        num *= d;
        den *= n;
        (num, den) = normalize(num, den)?;
    }
    make_rational(num, den)
}

fn normalize(num: i64, den: i64) -> Result<(i64, i64), RuntimeError> {
    match make_rational(num, den)? {
        Value::Integer(n) => Ok((n, 1)),
        Value::Rational(n, d) => Ok((n, d)),
        _ => unreachable!("make_rational only ever returns Integer or Rational"),
    }
}

/// Two integers, truncated remainder, fails on a zero divisor.
pub fn modulo(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    let a = as_integer(a, "modulo", 0)?;
    let b = as_integer(b, "modulo", 1)?;
    if b == 0 {
        return Err(RuntimeError::DivisionByZero { function: "modulo".to_string() });
    }
    Ok(Value::Integer(a % b))
}

/// Exponentiation by squaring over `i64`. Rejects a negative exponent and
/// `0^0`, and fails on accumulator overflow.
pub fn expt(base: &Value, exponent: &Value) -> Result<Value, RuntimeError> {
    let base = as_integer(base, "expt", 0)?;
    let exponent = as_integer(exponent, "expt", 1)?;

    if exponent < 0 {
        return Err(RuntimeError::ExptNegativeExponent);
    }
    if base == 0 && exponent == 0 {
        return Err(RuntimeError::ExptZeroToTheZero);
    }

    let mut acc: i64 = 1;
    let mut base = base;
    let mut exp = exponent as u64;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.checked_mul(base).ok_or(RuntimeError::ExptOverflow)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = base.checked_mul(base).ok_or(RuntimeError::ExptOverflow)?;
        }
    }
    Ok(Value::Integer(acc))
}
