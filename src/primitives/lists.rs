// ABOUTME: Pair and list operators: cons, car, cdr, set-car!, set-cdr!, list, predicates, eq?

use crate::error::RuntimeError;
use crate::value::Value;

pub fn cons(car: Value, cdr: Value) -> Value {
    Value::cons(car, cdr)
}

pub fn car(pair: &Value) -> Result<Value, RuntimeError> {
    match pair {
        Value::Pair(car, _) => Ok(car.borrow().clone()),
        other => Err(RuntimeError::type_error("car", "pair", other, 0)),
    }
}

pub fn cdr(pair: &Value) -> Result<Value, RuntimeError> {
    match pair {
        Value::Pair(_, cdr) => Ok(cdr.borrow().clone()),
        other => Err(RuntimeError::type_error("cdr", "pair", other, 0)),
    }
}

pub fn set_car(pair: &Value, new_car: Value) -> Result<Value, RuntimeError> {
    match pair {
        Value::Pair(car, _) => {
            *car.borrow_mut() = new_car;
            Ok(Value::Void)
        }
        other => Err(RuntimeError::type_error("set-car!", "pair", other, 0)),
    }
}

pub fn set_cdr(pair: &Value, new_cdr: Value) -> Result<Value, RuntimeError> {
    match pair {
        Value::Pair(_, cdr) => {
            *cdr.borrow_mut() = new_cdr;
            Ok(Value::Void)
        }
        other => Err(RuntimeError::type_error("set-cdr!", "pair", other, 0)),
    }
}

/// `(list)` ⇒ `Null`; otherwise right-folds its arguments into a chain of pairs.
pub fn list(args: Vec<Value>) -> Value {
    Value::list(args)
}

/// Structural equality for integers, booleans, symbols, null, and void;
/// identity (pointer equality of the shared pair cells) otherwise.
pub fn eq_p(a: &Value, b: &Value) -> Value {
    let result = match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Void, Value::Void) => true,
        (Value::Pair(car_a, cdr_a), Value::Pair(car_b, cdr_b)) => {
            std::rc::Rc::ptr_eq(car_a, car_b) && std::rc::Rc::ptr_eq(cdr_a, cdr_b)
        }
        (Value::String(x), Value::String(y)) => std::ptr::eq(x.as_str(), y.as_str()),
        (Value::Procedure(x), Value::Procedure(y)) => std::rc::Rc::ptr_eq(x, y),
        _ => false,
    };
    Value::Boolean(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_of_non_pair_is_a_type_error() {
        assert!(car(&Value::Null).is_err());
    }

    #[test]
    fn car_and_cdr_of_a_pair() {
        let p = cons(Value::Integer(1), Value::Integer(2));
        assert!(matches!(car(&p).unwrap(), Value::Integer(1)));
        assert!(matches!(cdr(&p).unwrap(), Value::Integer(2)));
    }

    #[test]
    fn set_car_mutates_in_place() {
        let p = cons(Value::Integer(1), Value::Integer(2));
        set_car(&p, Value::Integer(9)).unwrap();
        assert!(matches!(car(&p).unwrap(), Value::Integer(9)));
    }

    #[test]
    fn list_of_no_args_is_null() {
        assert!(matches!(list(vec![]), Value::Null));
    }

    #[test]
    fn eq_is_structural_for_integers() {
        assert!(matches!(eq_p(&Value::Integer(2), &Value::Integer(2)), Value::Boolean(true)));
    }

    #[test]
    fn eq_is_identity_for_distinct_pairs() {
        let a = cons(Value::Integer(1), Value::Null);
        let b = cons(Value::Integer(1), Value::Null);
        assert!(matches!(eq_p(&a, &b), Value::Boolean(false)));
        assert!(matches!(eq_p(&a, &a), Value::Boolean(true)));
    }
}
