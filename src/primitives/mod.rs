// ABOUTME: Primitive operator registry and the by-name dispatch used for first-class primitives

pub mod arithmetic;
pub mod comparison;
pub mod console;
pub mod lists;
pub mod types;

use crate::error::RuntimeError;
use crate::value::Value;
use std::io::Write;

/// The operand-count shape the parser uses to decide whether arity is
/// checked at parse time (§4.2): unary and binary primitives are fixed
/// arity and checked immediately, variadic primitives defer the check to
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
    Variadic,
}

/// Arity shape for every primitive name in the closed set of §3, except
/// `exit`, which compiles straight to `Expr::ExitLit` and never reaches
/// this table except when referenced in value position (see `is_primitive`).
pub fn arity_of(name: &str) -> Option<Arity> {
    use Arity::*;
    Some(match name {
        "car" | "cdr" | "not" | "boolean?" | "fixnum?" | "null?" | "pair?" | "procedure?"
        | "symbol?" | "string?" | "list?" | "display" => Unary,
        "modulo" | "expt" | "cons" | "eq?" | "set-car!" | "set-cdr!" => Binary,
        "+" | "-" | "*" | "/" | "<" | "<=" | "=" | ">=" | ">" | "list" | "void" => Variadic,
        _ => return None,
    })
}

/// True for any name the parser or evaluator treats as a primitive,
/// including `exit`, which has no entry in `arity_of` because it never
/// needs one (its parse and eval paths are both fixed, argument-ignoring
/// shortcuts, see `parser::parse_list` and `Expr::ExitLit`).
pub fn is_primitive(name: &str) -> bool {
    name == "exit" || arity_of(name).is_some()
}

/// Applies a primitive by name to already-evaluated arguments. This is the
/// path taken only when a primitive is referenced in value position and
/// wrapped as a first-class procedure (`Procedure::primitive`), e.g.
/// `(map + xs ys)` if a `map` were ever defined in terms of `apply`-like
/// application. Direct primitive-operator expressions (`Expr::Car`, etc.)
/// call into the family modules straight from `eval`, bypassing this name
/// dispatch.
pub fn apply(name: &str, args: Vec<Value>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
    match name {
        "car" => lists::car(unary(name, &args)?),
        "cdr" => lists::cdr(unary(name, &args)?),
        "not" => Ok(types::not(unary(name, &args)?)),
        "boolean?" => Ok(types::boolean_p(unary(name, &args)?)),
        "fixnum?" => Ok(types::fixnum_p(unary(name, &args)?)),
        "null?" => Ok(types::null_p(unary(name, &args)?)),
        "pair?" => Ok(types::pair_p(unary(name, &args)?)),
        "procedure?" => Ok(types::procedure_p(unary(name, &args)?)),
        "symbol?" => Ok(types::symbol_p(unary(name, &args)?)),
        "string?" => Ok(types::string_p(unary(name, &args)?)),
        "list?" => Ok(types::list_p(unary(name, &args)?)),
        "display" => Ok(console::display(unary(name, &args)?, out)),
        "modulo" => {
            let (a, b) = binary(name, &args)?;
            arithmetic::modulo(a, b)
        }
        "expt" => {
            let (a, b) = binary(name, &args)?;
            arithmetic::expt(a, b)
        }
        "cons" => {
            let (a, b) = binary(name, &args)?;
            Ok(lists::cons(a.clone(), b.clone()))
        }
        "eq?" => {
            let (a, b) = binary(name, &args)?;
            Ok(lists::eq_p(a, b))
        }
        "set-car!" => {
            let (a, b) = binary(name, &args)?;
            lists::set_car(a, b.clone())
        }
        "set-cdr!" => {
            let (a, b) = binary(name, &args)?;
            lists::set_cdr(a, b.clone())
        }
        "+" => arithmetic::add(&args),
        "-" => arithmetic::sub(&args),
        "*" => arithmetic::mul(&args),
        "/" => arithmetic::div(&args),
        "<" => comparison::less(&args),
        "<=" => comparison::less_eq(&args),
        "=" => comparison::numeric_equal(&args),
        ">=" => comparison::greater_eq(&args),
        ">" => comparison::greater(&args),
        "list" => Ok(lists::list(args)),
        "void" => Ok(Value::Void),
        "exit" => Ok(Value::Terminate),
        other => Err(RuntimeError::UnknownPrimitive(other.to_string())),
    }
}

fn unary<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity(name, "1", args.len()));
    }
    Ok(&args[0])
}

fn binary<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity(name, "2", args.len()));
    }
    Ok((&args[0], &args[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_primitive_covers_fixed_and_variadic_and_exit() {
        assert!(is_primitive("car"));
        assert!(is_primitive("cons"));
        assert!(is_primitive("+"));
        assert!(is_primitive("exit"));
        assert!(!is_primitive("frobnicate"));
    }

    #[test]
    fn apply_dispatches_by_name() {
        let mut sink = Vec::new();
        let result = apply("+", vec![Value::Integer(1), Value::Integer(2)], &mut sink).unwrap();
        assert!(matches!(result, Value::Integer(3)));
    }

    #[test]
    fn apply_unary_rejects_wrong_arity() {
        let mut sink = Vec::new();
        assert!(apply("car", vec![], &mut sink).is_err());
    }

    #[test]
    fn apply_unknown_primitive_is_an_error() {
        let mut sink = Vec::new();
        assert!(apply("not-a-real-primitive", vec![], &mut sink).is_err());
    }
}
