// ABOUTME: Runtime value universe and the procedure representation closures produce

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::expr::Expr;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A procedure's code: either a user body to evaluate against its captured
/// environment, or the name of a primitive operator it wraps. The latter is
/// how a primitive becomes a first-class value (e.g. `(map + xs ys)`): no
/// expression tree is synthesized, the application just dispatches on the
/// name directly (see `crate::primitives::apply`).
#[derive(Debug)]
pub enum ProcedureBody {
    UserDefined(Rc<Expr>),
    Primitive(String),
}

/// A closure: parameters, the body, and the environment captured at
/// creation time. Shared via `Rc` so every call site sees the same captured
/// scope.
#[derive(Debug)]
pub struct Procedure {
    pub params: Vec<String>,
    pub variadic: bool,
    pub body: ProcedureBody,
    pub env: Rc<Environment>,
}

impl Procedure {
    /// Wraps a primitive operator as a first-class procedure value. Params
    /// and environment are never consulted for a primitive body, only the
    /// name is, at application time.
    pub fn primitive(name: impl Into<String>) -> Procedure {
        Procedure {
            params: Vec::new(),
            variadic: true,
            body: ProcedureBody::Primitive(name.into()),
            env: Environment::empty(),
        }
    }
}

/// The runtime tagged value universe (§3 of the spec).
///
/// `Pair`'s two slots are individually mutable (`set-car!`/`set-cdr!`) and
/// shared by `Rc`, so two pairs can share structure or form a cycle.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Rational(i64, i64),
    Boolean(bool),
    Symbol(String),
    String(String),
    Null,
    Pair(Rc<RefCell<Value>>, Rc<RefCell<Value>>),
    Procedure(Rc<Procedure>),
    Void,
    /// Sentinel returned by `(exit)`; the REPL stops on seeing it. Never
    /// otherwise produced or consumed as a value.
    Terminate,
}

impl Value {
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Rc::new(RefCell::new(car)), Rc::new(RefCell::new(cdr)))
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Rational(..) => "rational",
            Value::Boolean(_) => "boolean",
            Value::Symbol(_) => "symbol",
            Value::String(_) => "string",
            Value::Null => "null",
            Value::Pair(..) => "pair",
            Value::Procedure(_) => "procedure",
            Value::Void => "void",
            Value::Terminate => "terminate",
        }
    }

    /// Builds a proper list, right-folding `items` onto `Value::Null`.
    pub fn list(items: Vec<Value>) -> Value {
        items
            .into_iter()
            .rev()
            .fold(Value::Null, |tail, item| Value::cons(item, tail))
    }

    /// `list?`: true iff this value is a proper, finite, `Null`-terminated
    /// chain of pairs. Cycle-safe via Floyd's tortoise-and-hare walk, per
    /// the spec's invariant that `list?` must terminate on cyclic input.
    pub fn is_proper_list(&self) -> bool {
        let mut slow = self.clone();
        let mut fast = self.clone();

        loop {
            match &fast {
                Value::Null => return true,
                Value::Pair(_, fast_cdr) => {
                    let fast_cdr = fast_cdr.borrow().clone();
                    match &fast_cdr {
                        Value::Null => return true,
                        Value::Pair(_, fast_cdr2) => {
                            fast = fast_cdr2.borrow().clone();
                        }
                        _ => return false,
                    }
                }
                _ => return false,
            }

            slow = match &slow {
                Value::Pair(_, cdr) => cdr.borrow().clone(),
                _ => return false,
            };

            if let (Value::Pair(slow_car, slow_cdr), Value::Pair(fast_car, fast_cdr)) =
                (&slow, &fast)
            {
                if Rc::ptr_eq(slow_car, fast_car) && Rc::ptr_eq(slow_cdr, fast_cdr) {
                    return false;
                }
            }
        }
    }
}

/// Normalizes a rational to lowest terms with a positive denominator,
/// collapsing to `Integer` when the reduced denominator is 1 (§3).
pub fn make_rational(num: i64, den: i64) -> Result<Value, RuntimeError> {
    if den == 0 {
        return Err(RuntimeError::DivisionByZero {
            function: "/".to_string(),
        });
    }

    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1);
    let num = num / g as i64;
    let den = den / g as i64;

    if den == 1 {
        Ok(Value::Integer(num))
    } else {
        Ok(Value::Rational(num, den))
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Rational(n, d) => write!(f, "{n}/{d}"),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Null => write!(f, "()"),
            Value::Pair(..) => fmt_pair(self, f),
            Value::Procedure(_) => write!(f, "#<procedure>"),
            Value::Void => write!(f, "#<void>"),
            Value::Terminate => write!(f, "#<terminate>"),
        }
    }
}

fn fmt_pair(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(")?;
    let mut current = value.clone();
    let mut first = true;
    loop {
        match current {
            Value::Pair(car, cdr) => {
                if !first {
                    write!(f, " ")?;
                }
                first = false;
                write!(f, "{}", car.borrow())?;
                current = cdr.borrow().clone();
            }
            Value::Null => break,
            other => {
                write!(f, " . {other}")?;
                break;
            }
        }
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_integers_and_rationals() {
        assert_eq!(format!("{}", Value::Integer(5)), "5");
        assert_eq!(format!("{}", Value::Rational(1, 2)), "1/2");
    }

    #[test]
    fn displays_booleans() {
        assert_eq!(format!("{}", Value::Boolean(true)), "#t");
        assert_eq!(format!("{}", Value::Boolean(false)), "#f");
    }

    #[test]
    fn displays_proper_list() {
        let list = Value::list(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        assert_eq!(format!("{list}"), "(1 2 3)");
    }

    #[test]
    fn displays_improper_list() {
        let pair = Value::cons(Value::Integer(9), Value::Integer(2));
        assert_eq!(format!("{pair}"), "(9 . 2)");
    }

    #[test]
    fn displays_empty_list() {
        assert_eq!(format!("{}", Value::Null), "()");
    }

    #[test]
    fn rational_normalizes_to_lowest_terms() {
        let v = make_rational(2, 4).unwrap();
        assert!(matches!(v, Value::Rational(1, 2)));
    }

    #[test]
    fn rational_with_denominator_one_becomes_integer() {
        let v = make_rational(6, 2).unwrap();
        assert!(matches!(v, Value::Integer(3)));
    }

    #[test]
    fn rational_normalizes_negative_denominator() {
        let v = make_rational(1, -2).unwrap();
        assert!(matches!(v, Value::Rational(-1, 2)));
    }

    #[test]
    fn rational_rejects_zero_denominator() {
        assert!(make_rational(1, 0).is_err());
    }

    #[test]
    fn proper_list_detection() {
        let proper = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        assert!(proper.is_proper_list());

        let improper = Value::cons(Value::Integer(1), Value::Integer(2));
        assert!(!improper.is_proper_list());

        assert!(Value::Null.is_proper_list());
        assert!(!Value::Integer(1).is_proper_list());
    }

    #[test]
    fn cyclic_structure_is_not_a_proper_list() {
        let car = Rc::new(RefCell::new(Value::Integer(1)));
        let cdr = Rc::new(RefCell::new(Value::Null));
        let pair = Value::Pair(car, cdr.clone());
        // Tie the knot: cdr now points back to the pair itself.
        *cdr.borrow_mut() = pair.clone();

        assert!(!pair.is_proper_list());
    }
}
