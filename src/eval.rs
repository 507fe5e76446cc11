// ABOUTME: Evaluator module for walking an Expr tree against a lexically scoped Environment (§4.3)

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::expr::Expr;
use crate::primitives::{self, arithmetic, comparison, console, lists, types};
use crate::syntax::Syntax;
use crate::value::{make_rational, Procedure, ProcedureBody, Value};
use std::io::Write;
use std::rc::Rc;

/// Evaluates one expression against `env`, writing any `display` output to
/// `out`. Closures may re-enter this function any number of times against
/// the environment captured at their creation point (§3: "expression trees
/// may be re-evaluated"). `out` is threaded through rather than hardcoded to
/// process stdout so the REPL driver's printing policy (`repl::run_source`)
/// and `display`'s own output land on the same stream and can be exercised
/// headlessly in tests.
pub fn eval(expr: &Rc<Expr>, env: &Rc<Environment>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
    match expr.as_ref() {
        Expr::Fixnum(n) => Ok(Value::Integer(*n)),
        Expr::RationalLit(n, d) => make_rational(*n, *d),
        Expr::StringLit(s) => Ok(Value::String(s.clone())),
        Expr::True => Ok(Value::Boolean(true)),
        Expr::False => Ok(Value::Boolean(false)),
        Expr::VoidLit => Ok(Value::Void),
        Expr::ExitLit => Ok(Value::Terminate),

        Expr::Var(name) => eval_var(name, env),
        Expr::Quote(syntax) => quote_to_value(syntax),

        Expr::If(cond, then, els) => {
            if eval(cond, env, out)?.is_truthy() {
                eval(then, env, out)
            } else {
                eval(els, env, out)
            }
        }
        Expr::Cond(clauses) => eval_cond(clauses, env, out),
        Expr::Begin(exprs) => eval_body(exprs, env, out),
        Expr::And(exprs) => eval_and(exprs, env, out),
        Expr::Or(exprs) => eval_or(exprs, env, out),

        Expr::Lambda { params, variadic, body } => Ok(Value::Procedure(Rc::new(Procedure {
            params: params.clone(),
            variadic: *variadic,
            body: ProcedureBody::UserDefined(Rc::clone(body)),
            env: Rc::clone(env),
        }))),
        Expr::Apply(rator, rands) => eval_apply(rator, rands, env, out),

        Expr::Define(name, rhs) => eval_define(name, rhs, env, out),
        Expr::Set(name, rhs) => eval_set(name, rhs, env, out),

        Expr::Let(bindings, body) => eval_let(bindings, body, env, out),
        Expr::Letrec(bindings, body) => eval_letrec(bindings, body, env, out),

        Expr::Car(e) => lists::car(&eval(e, env, out)?),
        Expr::Cdr(e) => lists::cdr(&eval(e, env, out)?),
        Expr::Not(e) => Ok(types::not(&eval(e, env, out)?)),
        Expr::IsBoolean(e) => Ok(types::boolean_p(&eval(e, env, out)?)),
        Expr::IsFixnum(e) => Ok(types::fixnum_p(&eval(e, env, out)?)),
        Expr::IsNull(e) => Ok(types::null_p(&eval(e, env, out)?)),
        Expr::IsPair(e) => Ok(types::pair_p(&eval(e, env, out)?)),
        Expr::IsProcedure(e) => Ok(types::procedure_p(&eval(e, env, out)?)),
        Expr::IsSymbol(e) => Ok(types::symbol_p(&eval(e, env, out)?)),
        Expr::IsString(e) => Ok(types::string_p(&eval(e, env, out)?)),
        Expr::IsList(e) => Ok(types::list_p(&eval(e, env, out)?)),
        Expr::Display(e) => {
            let value = eval(e, env, out)?;
            Ok(console::display(&value, out))
        }

        Expr::Modulo(a, b) => arithmetic::modulo(&eval(a, env, out)?, &eval(b, env, out)?),
        Expr::Expt(a, b) => arithmetic::expt(&eval(a, env, out)?, &eval(b, env, out)?),
        Expr::Cons(a, b) => Ok(lists::cons(eval(a, env, out)?, eval(b, env, out)?)),
        Expr::IsEq(a, b) => Ok(lists::eq_p(&eval(a, env, out)?, &eval(b, env, out)?)),
        Expr::SetCar(a, b) => {
            let pair = eval(a, env, out)?;
            let value = eval(b, env, out)?;
            lists::set_car(&pair, value)
        }
        Expr::SetCdr(a, b) => {
            let pair = eval(a, env, out)?;
            let value = eval(b, env, out)?;
            lists::set_cdr(&pair, value)
        }

        Expr::Plus(args) => arithmetic::add(&eval_all(args, env, out)?),
        Expr::Minus(args) => arithmetic::sub(&eval_all(args, env, out)?),
        Expr::Mul(args) => arithmetic::mul(&eval_all(args, env, out)?),
        Expr::Div(args) => arithmetic::div(&eval_all(args, env, out)?),
        Expr::Less(args) => comparison::less(&eval_all(args, env, out)?),
        Expr::LessEq(args) => comparison::less_eq(&eval_all(args, env, out)?),
        Expr::Equal(args) => comparison::numeric_equal(&eval_all(args, env, out)?),
        Expr::GreaterEq(args) => comparison::greater_eq(&eval_all(args, env, out)?),
        Expr::Greater(args) => comparison::greater(&eval_all(args, env, out)?),
        Expr::ListCtor(args) => Ok(lists::list(eval_all(args, env, out)?)),
        Expr::MakeVoid(args) => {
            for a in args {
                eval(a, env, out)?;
            }
            Ok(Value::Void)
        }
    }
}

fn eval_all(exprs: &[Rc<Expr>], env: &Rc<Environment>, out: &mut dyn Write) -> Result<Vec<Value>, RuntimeError> {
    exprs.iter().map(|e| eval(e, env, out)).collect()
}

/// Var lookup; an unbound name that happens to be a primitive is wrapped on
/// demand into a first-class procedure (§4.3, §9 "Primitive-as-value").
fn eval_var(name: &str, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    if let Some(value) = env.find(name) {
        return Ok(value);
    }
    if primitives::is_primitive(name) {
        return Ok(Value::Procedure(Rc::new(Procedure::primitive(name))));
    }
    Err(RuntimeError::UnboundVariable(name.to_string()))
}

fn eval_and(exprs: &[Rc<Expr>], env: &Rc<Environment>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
    let mut result = Value::Boolean(true);
    for e in exprs {
        result = eval(e, env, out)?;
        if !result.is_truthy() {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(result)
}

fn eval_or(exprs: &[Rc<Expr>], env: &Rc<Environment>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
    for e in exprs {
        let value = eval(e, env, out)?;
        if value.is_truthy() {
            return Ok(value);
        }
    }
    Ok(Value::Boolean(false))
}

fn eval_cond(
    clauses: &[crate::expr::CondClause],
    env: &Rc<Environment>,
    out: &mut dyn Write,
) -> Result<Value, RuntimeError> {
    for clause in clauses {
        let (taken, test_value) = match &clause.test {
            None => (true, None),
            Some(test) => {
                let value = eval(test, env, out)?;
                let truthy = value.is_truthy();
                (truthy, Some(value))
            }
        };
        if taken {
            if clause.body.is_empty() {
                return Ok(test_value.unwrap_or(Value::Void));
            }
            return eval_body(&clause.body, env, out);
        }
    }
    Ok(Value::Void)
}

/// Evaluates a sequence of body expressions, returning the last result
/// (empty sequence -> Void). A leading run of internal `define`s is
/// hoisted letrec-style: every name gets a slot before any right-hand side
/// is evaluated, so mutually recursive local helpers can see each other.
/// Any later `define` still extends the running scope for subsequent
/// siblings, just without the simultaneous pre-declaration.
pub(crate) fn eval_body(exprs: &[Rc<Expr>], env: &Rc<Environment>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
    if exprs.is_empty() {
        return Ok(Value::Void);
    }

    let mut split = 0;
    while split < exprs.len() && matches!(exprs[split].as_ref(), Expr::Define(..)) {
        split += 1;
    }

    let mut current_env = Rc::clone(env);

    if split > 0 {
        let names: Vec<String> = exprs[..split]
            .iter()
            .map(|e| match e.as_ref() {
                Expr::Define(name, _) => name.clone(),
                _ => unreachable!(),
            })
            .collect();
        for name in &names {
            current_env = Environment::extend(name.clone(), Value::Void, &current_env);
        }
        for (e, name) in exprs[..split].iter().zip(names.iter()) {
            if let Expr::Define(_, rhs) = e.as_ref() {
                check_not_primitive(name)?;
                let value = eval(rhs, &current_env, out)?;
                current_env.modify(name, value);
            }
        }
    }

    let mut result = Value::Void;
    for e in &exprs[split..] {
        if let Expr::Define(name, rhs) = e.as_ref() {
            check_not_primitive(name)?;
            current_env = Environment::extend(name.clone(), Value::Void, &current_env);
            let value = eval(rhs, &current_env, out)?;
            current_env.modify(name, value);
            result = Value::Void;
        } else {
            result = eval(e, &current_env, out)?;
        }
    }
    Ok(result)
}

fn check_not_primitive(name: &str) -> Result<(), RuntimeError> {
    if primitives::is_primitive(name) {
        return Err(RuntimeError::RedefinePrimitive(name.to_string()));
    }
    Ok(())
}

/// A standalone `define` not sequenced inside a `begin`/lambda body (only
/// reachable when it is the sole body form of a lambda/let, or via the
/// top-level driver in `repl`). The new frame is established and
/// back-patched per §4.3's implementation note, then discarded if nothing
/// downstream can observe it.
fn eval_define(name: &str, rhs: &Rc<Expr>, env: &Rc<Environment>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
    check_not_primitive(name)?;
    let extended = Environment::extend(name.to_string(), Value::Void, env);
    let value = eval(rhs, &extended, out)?;
    extended.modify(name, value);
    Ok(Value::Void)
}

fn eval_set(name: &str, rhs: &Rc<Expr>, env: &Rc<Environment>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
    if !env.is_bound(name) {
        return Err(RuntimeError::UnboundVariable(name.to_string()));
    }
    let value = eval(rhs, env, out)?;
    env.modify(name, value);
    Ok(Value::Void)
}

fn eval_let(
    bindings: &[crate::expr::Binding],
    body: &Rc<Expr>,
    env: &Rc<Environment>,
    out: &mut dyn Write,
) -> Result<Value, RuntimeError> {
    let mut values = Vec::with_capacity(bindings.len());
    for binding in bindings {
        values.push(eval(&binding.expr, env, out)?);
    }
    let mut new_env = Rc::clone(env);
    for (binding, value) in bindings.iter().zip(values) {
        new_env = Environment::extend(binding.name.clone(), value, &new_env);
    }
    eval(body, &new_env, out)
}

fn eval_letrec(
    bindings: &[crate::expr::Binding],
    body: &Rc<Expr>,
    env: &Rc<Environment>,
    out: &mut dyn Write,
) -> Result<Value, RuntimeError> {
    let mut new_env = Rc::clone(env);
    for binding in bindings {
        new_env = Environment::extend(binding.name.clone(), Value::Void, &new_env);
    }
    for binding in bindings {
        let value = eval(&binding.expr, &new_env, out)?;
        new_env.modify(&binding.name, value);
    }
    eval(body, &new_env, out)
}

fn eval_apply(
    rator: &Rc<Expr>,
    rands: &[Rc<Expr>],
    env: &Rc<Environment>,
    out: &mut dyn Write,
) -> Result<Value, RuntimeError> {
    let proc_value = eval(rator, env, out)?;
    let proc = match &proc_value {
        Value::Procedure(p) => Rc::clone(p),
        other => {
            return Err(RuntimeError::NotProcedure {
                actual: other.type_name().to_string(),
            })
        }
    };
    let args = eval_all(rands, env, out)?;
    apply_procedure(&proc, args, out)
}

fn apply_procedure(proc: &Rc<Procedure>, args: Vec<Value>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
    match &proc.body {
        ProcedureBody::Primitive(name) => primitives::apply(name, args, out),
        ProcedureBody::UserDefined(body) => {
            let mut new_env = Rc::clone(&proc.env);

            if proc.variadic {
                let fixed = proc.params.len() - 1;
                if args.len() < fixed {
                    return Err(RuntimeError::arity("procedure", format!("at least {fixed}"), args.len()));
                }
                let mut args = args;
                let rest_args = args.split_off(fixed);
                for (name, value) in proc.params[..fixed].iter().zip(args) {
                    new_env = Environment::extend(name.clone(), value, &new_env);
                }
                let rest = Value::list(rest_args);
                new_env = Environment::extend(proc.params[fixed].clone(), rest, &new_env);
            } else {
                if args.len() != proc.params.len() {
                    return Err(RuntimeError::arity("procedure", proc.params.len().to_string(), args.len()));
                }
                for (name, value) in proc.params.iter().zip(args) {
                    new_env = Environment::extend(name.clone(), value, &new_env);
                }
            }

            eval(body, &new_env, out)
        }
    }
}

/// Converts a raw syntax tree to a value (§4.3 Quote). Numbers become
/// `Integer`/`Rational`, strings/booleans/symbols convert directly, the
/// empty list becomes `Null`, and a list right-folds into a chain of
/// `Pair`s. A dotted tail `(a . b)` is recognized when the symbol `.`
/// appears exactly once, second-to-last.
pub fn quote_to_value(syntax: &Syntax) -> Result<Value, RuntimeError> {
    match syntax {
        Syntax::Integer(n) => Ok(Value::Integer(*n)),
        Syntax::Rational(n, d) => make_rational(*n, *d),
        Syntax::String(s) => Ok(Value::String(s.clone())),
        Syntax::Boolean(b) => Ok(Value::Boolean(*b)),
        Syntax::Symbol(s) => Ok(Value::Symbol(s.clone())),
        Syntax::List(items) => quote_list(items),
    }
}

fn quote_list(items: &[Syntax]) -> Result<Value, RuntimeError> {
    let dot_positions: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, s)| matches!(s.as_symbol(), Some(".")))
        .map(|(i, _)| i)
        .collect();

    if !dot_positions.is_empty() {
        if dot_positions.len() != 1 || dot_positions[0] != items.len().saturating_sub(2) || items.len() < 3 {
            return Err(RuntimeError::MalformedQuote(
                "dotted-pair marker '.' must appear exactly once, second-to-last".to_string(),
            ));
        }
        let dot = dot_positions[0];
        let mut result = quote_to_value(&items[dot + 1])?;
        for item in items[..dot].iter().rev() {
            result = Value::cons(quote_to_value(item)?, result);
        }
        return Ok(result);
    }

    let mut result = Value::Null;
    for item in items.iter().rev() {
        result = Value::cons(quote_to_value(item)?, result);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::reader::read;

    fn run(src: &str) -> Result<Value, RuntimeError> {
        let env = Environment::empty();
        let syntax = read(src).expect("reader should accept this input");
        let expr = parse(&syntax, &env)?;
        let mut sink = Vec::new();
        eval(&expr, &env, &mut sink)
    }

    fn run_program(forms: &[&str]) -> Result<Value, RuntimeError> {
        let mut env = Environment::empty();
        let mut result = Value::Void;
        let mut sink = Vec::new();
        for src in forms {
            let syntax = read(src).expect("reader should accept this input");
            let expr = parse(&syntax, &env)?;
            if let Expr::Define(name, rhs) = expr.as_ref() {
                env = Environment::extend(name.clone(), Value::Void, &env);
                let value = eval(rhs, &env, &mut sink)?;
                env.modify(name, value);
                result = Value::Void;
            } else {
                result = eval(&expr, &env, &mut sink)?;
            }
        }
        Ok(result)
    }

    #[test]
    fn arithmetic_end_to_end() {
        assert!(matches!(run("(+ 1 2 3)").unwrap(), Value::Integer(6)));
    }

    #[test]
    fn recursive_factorial_via_define() {
        let result = run_program(&[
            "(define (fact n) (if (= n 0) 1 (* n (fact (- n 1)))))",
            "(fact 5)",
        ])
        .unwrap();
        assert!(matches!(result, Value::Integer(120)));
    }

    #[test]
    fn rational_arithmetic_normalizes() {
        assert!(matches!(run("(/ 1 2)").unwrap(), Value::Rational(1, 2)));
        assert!(matches!(run("(+ 1/2 1/3)").unwrap(), Value::Rational(5, 6)));
        assert!(matches!(run("(* 6 1/2)").unwrap(), Value::Integer(3)));
    }

    #[test]
    fn letrec_mutual_recursion() {
        let result = run(
            "(letrec ((even? (lambda (n) (if (= n 0) #t (odd? (- n 1))))) \
                       (odd? (lambda (n) (if (= n 0) #f (even? (- n 1)))))) \
               (even? 10))",
        )
        .unwrap();
        assert!(matches!(result, Value::Boolean(true)));
    }

    #[test]
    fn set_car_mutates_a_shared_pair() {
        let result = run_program(&["(define p (cons 1 2))", "(set-car! p 9)", "p"]).unwrap();
        assert_eq!(format!("{result}"), "(9 . 2)");
    }

    #[test]
    fn shadowing_plus_as_a_local_function() {
        let result = run_program(&["(define + (lambda (a b) (cons a b)))", "(+ 1 2)"]).unwrap();
        assert_eq!(format!("{result}"), "(1 . 2)");
    }

    #[test]
    fn car_of_empty_list_is_a_runtime_error() {
        assert!(run("(car (quote ()))").is_err());
    }

    #[test]
    fn lexical_scope_captures_definition_site_environment() {
        let result = run_program(&[
            "(define x 10)",
            "(define f (lambda () x))",
            "(define x 20)",
            "(f)",
        ])
        .unwrap();
        // `f` closes over the global frame chain, and `define x` at the
        // top level re-binds the same frame (via modify), so `f` sees the
        // latest value -- this is lexical scope over a shared frame, not
        // frame recreation.
        assert!(matches!(result, Value::Integer(20)));
    }

    #[test]
    fn and_short_circuits_on_first_false() {
        let result = run_program(&[
            "(define calls (quote ()))",
            "(define (record v) (set! calls (cons v calls)) v)",
            "(and (record 1) (record #f) (record 3))",
        ])
        .unwrap();
        assert!(matches!(result, Value::Boolean(false)));
    }

    #[test]
    fn or_returns_first_truthy_value() {
        assert!(matches!(run("(or #f #f 3 4)").unwrap(), Value::Integer(3)));
    }

    #[test]
    fn cond_with_else_and_empty_body_returns_test_value() {
        assert!(matches!(run("(cond (#f 1) (5))").unwrap(), Value::Integer(5)));
    }

    #[test]
    fn variadic_lambda_collects_rest_args() {
        let result = run_program(&["(define (f a rest ...) rest)", "(f 1 2 3)"]).unwrap();
        assert_eq!(format!("{result}"), "(2 3)");
    }

    #[test]
    fn quoted_dotted_pair() {
        let result = run("(quote (1 . 2))").unwrap();
        assert_eq!(format!("{result}"), "(1 . 2)");
    }

    #[test]
    fn quoted_proper_list() {
        let result = run("(quote (1 2 3))").unwrap();
        assert_eq!(format!("{result}"), "(1 2 3)");
    }

    #[test]
    fn redefining_a_primitive_at_global_scope_via_local_define_is_rejected() {
        let result = run("(let () (define + 1) +)");
        assert!(result.is_err());
    }

    #[test]
    fn unbound_variable_is_an_error() {
        assert!(run("totally-unbound-name").is_err());
    }

    #[test]
    fn bare_primitive_name_is_first_class() {
        let result = run_program(&["(define plus +)", "(plus 2 3)"]).unwrap();
        assert!(matches!(result, Value::Integer(5)));
    }

    #[test]
    fn exit_evaluates_to_terminate() {
        assert!(matches!(run("(exit)").unwrap(), Value::Terminate));
    }

    #[test]
    fn display_writes_to_the_threaded_output_sink_not_process_stdout() {
        let env = Environment::empty();
        let syntax = read(r#"(display "hi")"#).unwrap();
        let expr = parse(&syntax, &env).unwrap();
        let mut sink = Vec::new();
        eval(&expr, &env, &mut sink).unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "hi");
    }
}
