// ABOUTME: Parser module for resolving a Syntax tree into an Expr tree (§4.2 dispatch rules)

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::expr::{Binding, CondClause, Expr};
use crate::primitives;
use crate::syntax::Syntax;
use crate::value::Value;
use std::rc::Rc;

/// Resolves one syntax node into an expression, against `env` for
/// shadow-detection only (§4.2 rule 3a: a current binding shadows both
/// reserved forms and primitive names).
pub fn parse(syntax: &Syntax, env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    match syntax {
        Syntax::Integer(n) => Ok(Rc::new(Expr::Fixnum(*n))),
        Syntax::Rational(n, d) => Ok(Rc::new(Expr::RationalLit(*n, *d))),
        Syntax::String(s) => Ok(Rc::new(Expr::StringLit(s.clone()))),
        Syntax::Boolean(true) => Ok(Rc::new(Expr::True)),
        Syntax::Boolean(false) => Ok(Rc::new(Expr::False)),
        Syntax::Symbol(name) => Ok(Rc::new(Expr::Var(name.clone()))),
        Syntax::List(items) => {
            // Rule 1: empty list -> Quote(empty-list-syntax).
            if syntax.is_empty_list() {
                return Ok(Rc::new(Expr::Quote(Syntax::List(Vec::new()))));
            }
            parse_list(items, env)
        }
    }
}

fn parse_each(items: &[Syntax], env: &Rc<Environment>) -> Result<Vec<Rc<Expr>>, RuntimeError> {
    items.iter().map(|s| parse(s, env)).collect()
}

fn parse_list(items: &[Syntax], env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    let head = &items[0];
    let tail = &items[1..];

    // Rule 2: head is not a symbol -> plain application.
    let op = match head.as_symbol() {
        Some(op) => op,
        None => return parse_apply(head, tail, env),
    };

    // Rule 3a: a current binding shadows reserved forms and primitives.
    if env.is_bound(op) {
        return parse_apply(head, tail, env);
    }

    // Rule 3b: reserved forms.
    if let Some(expr) = parse_reserved(op, tail, env)? {
        return Ok(expr);
    }

    // §9: exit is uniformly a primitive whose invocation evaluates to
    // Terminate; it ignores its operands entirely, so it compiles straight
    // to the literal rather than an Apply/primitive-operator variant.
    if op == "exit" {
        return Ok(Rc::new(Expr::ExitLit));
    }

    // Rule 3c: primitive names, with parse-time arity enforcement for the
    // fixed-arity (unary/binary) shapes.
    if let Some(arity) = primitives::arity_of(op) {
        return parse_primitive(op, arity, tail, env);
    }

    // Rule 3d: free application, resolved at eval time.
    parse_apply(head, tail, env)
}

fn parse_apply(head: &Syntax, tail: &[Syntax], env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    let rator = parse(head, env)?;
    let rands = parse_each(tail, env)?;
    Ok(Rc::new(Expr::Apply(rator, rands)))
}

fn parse_primitive(
    op: &str,
    arity: primitives::Arity,
    tail: &[Syntax],
    env: &Rc<Environment>,
) -> Result<Rc<Expr>, RuntimeError> {
    use primitives::Arity;

    match arity {
        Arity::Unary => {
            if tail.len() != 1 {
                return Err(RuntimeError::arity(op, "1", tail.len()));
            }
            let e = parse(&tail[0], env)?;
            Ok(Rc::new(unary_variant(op, e)))
        }
        Arity::Binary => {
            if tail.len() != 2 {
                return Err(RuntimeError::arity(op, "2", tail.len()));
            }
            let a = parse(&tail[0], env)?;
            let b = parse(&tail[1], env)?;
            Ok(Rc::new(binary_variant(op, a, b)))
        }
        Arity::Variadic => {
            // `(void)` with no operands is the literal shortcut; `(void a
            // b ...)` evaluates and discards its operands via MakeVoid.
            if op == "void" && tail.is_empty() {
                return Ok(Rc::new(Expr::VoidLit));
            }
            let args = parse_each(tail, env)?;
            Ok(Rc::new(variadic_variant(op, args)))
        }
    }
}

fn unary_variant(op: &str, e: Rc<Expr>) -> Expr {
    match op {
        "car" => Expr::Car(e),
        "cdr" => Expr::Cdr(e),
        "not" => Expr::Not(e),
        "boolean?" => Expr::IsBoolean(e),
        "fixnum?" => Expr::IsFixnum(e),
        "null?" => Expr::IsNull(e),
        "pair?" => Expr::IsPair(e),
        "procedure?" => Expr::IsProcedure(e),
        "symbol?" => Expr::IsSymbol(e),
        "string?" => Expr::IsString(e),
        "list?" => Expr::IsList(e),
        "display" => Expr::Display(e),
        _ => unreachable!("unary_variant called with non-unary primitive {op}"),
    }
}

fn binary_variant(op: &str, a: Rc<Expr>, b: Rc<Expr>) -> Expr {
    match op {
        "modulo" => Expr::Modulo(a, b),
        "expt" => Expr::Expt(a, b),
        "cons" => Expr::Cons(a, b),
        "eq?" => Expr::IsEq(a, b),
        "set-car!" => Expr::SetCar(a, b),
        "set-cdr!" => Expr::SetCdr(a, b),
        _ => unreachable!("binary_variant called with non-binary primitive {op}"),
    }
}

fn variadic_variant(op: &str, args: Vec<Rc<Expr>>) -> Expr {
    match op {
        "+" => Expr::Plus(args),
        "-" => Expr::Minus(args),
        "*" => Expr::Mul(args),
        "/" => Expr::Div(args),
        "<" => Expr::Less(args),
        "<=" => Expr::LessEq(args),
        "=" => Expr::Equal(args),
        ">=" => Expr::GreaterEq(args),
        ">" => Expr::Greater(args),
        "list" => Expr::ListCtor(args),
        "void" => Expr::MakeVoid(args),
        _ => unreachable!("variadic_variant called with non-variadic primitive {op}"),
    }
}

/// Rule 3b. Returns `Ok(None)` when `op` isn't a reserved-form name at all
/// (so the caller falls through to primitive/free-application handling).
fn parse_reserved(op: &str, tail: &[Syntax], env: &Rc<Environment>) -> Result<Option<Rc<Expr>>, RuntimeError> {
    let expr = match op {
        "if" => {
            if tail.len() != 3 {
                return Err(RuntimeError::arity("if", "3", tail.len()));
            }
            let cond = parse(&tail[0], env)?;
            let then = parse(&tail[1], env)?;
            let els = parse(&tail[2], env)?;
            Expr::If(cond, then, els)
        }
        "begin" => return Ok(Some(parse_sequence_as_begin(tail, env)?)),
        "quote" => {
            if tail.len() != 1 {
                return Err(RuntimeError::arity("quote", "1", tail.len()));
            }
            Expr::Quote(tail[0].clone())
        }
        "and" => Expr::And(parse_each(tail, env)?),
        "or" => Expr::Or(parse_each(tail, env)?),
        "lambda" => return Ok(Some(parse_lambda(tail, env)?)),
        "define" => return Ok(Some(parse_define(tail, env)?)),
        "set!" => {
            if tail.len() != 2 {
                return Err(RuntimeError::arity("set!", "2", tail.len()));
            }
            let name = tail[0]
                .as_symbol()
                .ok_or_else(|| RuntimeError::malformed("set!", "target must be a symbol"))?;
            let value = parse(&tail[1], env)?;
            Expr::Set(name.to_string(), value)
        }
        "let" => return Ok(Some(parse_let(tail, env)?)),
        "letrec" => return Ok(Some(parse_letrec(tail, env)?)),
        "cond" => Expr::Cond(parse_cond_clauses(tail, env)?),
        _ => return Ok(None),
    };
    Ok(Some(Rc::new(expr)))
}

/// Parses a sequence of body forms, threading a sub-environment that
/// accumulates each internal `define`'s name so later forms in the same
/// sequence see it as bound (shadowing reserved/primitive names exactly as
/// a top-level `define` would, per §4.2).
fn parse_sequence(items: &[Syntax], env: &Rc<Environment>) -> Result<Vec<Rc<Expr>>, RuntimeError> {
    let mut current_env = env.clone();
    let mut exprs = Vec::with_capacity(items.len());
    for item in items {
        let e = parse(item, &current_env)?;
        if let Expr::Define(name, _) = &*e {
            current_env = Environment::extend(name.clone(), Value::Void, &current_env);
        }
        exprs.push(e);
    }
    Ok(exprs)
}

fn parse_sequence_as_begin(items: &[Syntax], env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    Ok(Rc::new(Expr::Begin(parse_sequence(items, env)?)))
}

/// The body of a `lambda`/`let`/`letrec`: the last operand if exactly one,
/// otherwise `Begin` of all of them (§4.2).
fn parse_body(items: &[Syntax], env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    if items.len() == 1 {
        parse(&items[0], env)
    } else {
        parse_sequence_as_begin(items, env)
    }
}

fn parse_lambda(tail: &[Syntax], env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    if tail.len() < 2 {
        return Err(RuntimeError::malformed("lambda", "expected a parameter list and at least one body form"));
    }
    let param_items = tail[0]
        .as_list()
        .ok_or_else(|| RuntimeError::malformed("lambda", "parameter list must be a list"))?;

    let (params, variadic) = parse_param_list(param_items)?;

    let mut body_env = env.clone();
    for name in &params {
        body_env = Environment::extend(name.clone(), Value::Void, &body_env);
    }
    let body = parse_body(&tail[1..], &body_env)?;

    Ok(Rc::new(Expr::Lambda { params, variadic, body }))
}

fn parse_param_list(items: &[Syntax]) -> Result<(Vec<String>, bool), RuntimeError> {
    let mut params = Vec::with_capacity(items.len());
    let mut variadic = false;
    for (i, item) in items.iter().enumerate() {
        let name = item
            .as_symbol()
            .ok_or_else(|| RuntimeError::malformed("lambda", "parameters must be symbols"))?;
        if name == "..." {
            if i == 0 || i != items.len() - 1 {
                return Err(RuntimeError::malformed(
                    "lambda",
                    "'...' must follow a parameter name and be the last element",
                ));
            }
            variadic = true;
        } else {
            params.push(name.to_string());
        }
    }
    Ok((params, variadic))
}

fn parse_define(tail: &[Syntax], env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    if tail.is_empty() {
        return Err(RuntimeError::malformed("define", "expected a name or a function header"));
    }

    match &tail[0] {
        Syntax::Symbol(name) => {
            if tail.len() != 2 {
                return Err(RuntimeError::arity("define", "2", tail.len()));
            }
            let value = parse(&tail[1], env)?;
            Ok(Rc::new(Expr::Define(name.clone(), value)))
        }
        Syntax::List(header) => {
            if tail.len() < 2 {
                return Err(RuntimeError::malformed(
                    "define",
                    "function shape requires a header and at least one body form",
                ));
            }
            let (name, rest) = header
                .split_first()
                .ok_or_else(|| RuntimeError::malformed("define", "function header must not be empty"))?;
            let name = name
                .as_symbol()
                .ok_or_else(|| RuntimeError::malformed("define", "function name must be a symbol"))?;

            let (params, variadic) = parse_param_list(rest)?;
            let mut body_env = env.clone();
            for p in &params {
                body_env = Environment::extend(p.clone(), Value::Void, &body_env);
            }
            let body = parse_body(&tail[1..], &body_env)?;
            let lambda = Expr::Lambda { params, variadic, body };
            Ok(Rc::new(Expr::Define(name.to_string(), Rc::new(lambda))))
        }
        _ => Err(RuntimeError::malformed("define", "expected a name or a function header")),
    }
}

fn parse_bindings(items: &[Syntax]) -> Result<Vec<(&str, &Syntax)>, RuntimeError> {
    items
        .iter()
        .map(|item| {
            let pair = item
                .as_list()
                .ok_or_else(|| RuntimeError::malformed("let", "each binding must be a (name expr) pair"))?;
            if pair.len() != 2 {
                return Err(RuntimeError::malformed("let", "each binding must be a (name expr) pair"));
            }
            let name = pair[0]
                .as_symbol()
                .ok_or_else(|| RuntimeError::malformed("let", "binding name must be a symbol"))?;
            Ok((name, &pair[1]))
        })
        .collect()
}

fn parse_let(tail: &[Syntax], env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    if tail.len() < 2 {
        return Err(RuntimeError::malformed("let", "expected a bindings list and at least one body form"));
    }
    let binding_items = tail[0]
        .as_list()
        .ok_or_else(|| RuntimeError::malformed("let", "bindings must be a list"))?;
    let raw = parse_bindings(binding_items)?;

    // RHS exprs evaluate in the enclosing scope (no new bindings yet).
    let bindings = raw
        .iter()
        .map(|(name, rhs)| {
            Ok(Binding {
                name: name.to_string(),
                expr: parse(rhs, env)?,
            })
        })
        .collect::<Result<Vec<_>, RuntimeError>>()?;

    let mut body_env = env.clone();
    for b in &bindings {
        body_env = Environment::extend(b.name.clone(), Value::Void, &body_env);
    }
    let body = parse_body(&tail[1..], &body_env)?;
    Ok(Rc::new(Expr::Let(bindings, body)))
}

fn parse_letrec(tail: &[Syntax], env: &Rc<Environment>) -> Result<Rc<Expr>, RuntimeError> {
    if tail.len() < 2 {
        return Err(RuntimeError::malformed("letrec", "expected a bindings list and at least one body form"));
    }
    let binding_items = tail[0]
        .as_list()
        .ok_or_else(|| RuntimeError::malformed("letrec", "bindings must be a list"))?;
    let raw = parse_bindings(binding_items)?;

    // Every name is visible to every RHS and to the body (mutual recursion).
    let mut scope_env = env.clone();
    for (name, _) in &raw {
        scope_env = Environment::extend(name.to_string(), Value::Void, &scope_env);
    }

    let bindings = raw
        .iter()
        .map(|(name, rhs)| {
            Ok(Binding {
                name: name.to_string(),
                expr: parse(rhs, &scope_env)?,
            })
        })
        .collect::<Result<Vec<_>, RuntimeError>>()?;

    let body = parse_body(&tail[1..], &scope_env)?;
    Ok(Rc::new(Expr::Letrec(bindings, body)))
}

fn parse_cond_clauses(tail: &[Syntax], env: &Rc<Environment>) -> Result<Vec<CondClause>, RuntimeError> {
    let mut clauses = Vec::with_capacity(tail.len());
    let mut seen_else = false;
    for (i, item) in tail.iter().enumerate() {
        if seen_else {
            return Err(RuntimeError::malformed("cond", "'else' must be the last clause"));
        }
        let items = item
            .as_list()
            .ok_or_else(|| RuntimeError::malformed("cond", "each clause must be a list"))?;
        let (test_syntax, body_syntax) = items
            .split_first()
            .ok_or_else(|| RuntimeError::malformed("cond", "each clause needs at least a test"))?;

        let is_else = matches!(test_syntax.as_symbol(), Some("else"));
        if is_else {
            seen_else = true;
            if i != tail.len() - 1 {
                return Err(RuntimeError::malformed("cond", "'else' must be the last clause"));
            }
        }

        let test = if is_else { None } else { Some(parse(test_syntax, env)?) };
        let body = parse_sequence(body_syntax, env)?;
        clauses.push(CondClause { test, body });
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read;

    fn parse_str(src: &str) -> Result<Rc<Expr>, RuntimeError> {
        let syntax = read(src).expect("reader should accept this input");
        parse(&syntax, &Environment::empty())
    }

    #[test]
    fn parses_integer_literal() {
        assert!(matches!(*parse_str("42").unwrap(), Expr::Fixnum(42)));
    }

    #[test]
    fn parses_plus_as_primitive_variant() {
        assert!(matches!(*parse_str("(+ 1 2)").unwrap(), Expr::Plus(ref a) if a.len() == 2));
    }

    #[test]
    fn shadowed_plus_parses_as_application() {
        let env = Environment::empty();
        let env = Environment::extend("+", Value::Void, &env);
        let syntax = read("(+ 1 2)").unwrap();
        let expr = parse(&syntax, &env).unwrap();
        assert!(matches!(&*expr, Expr::Apply(..)));
    }

    #[test]
    fn rejects_wrong_arity_for_fixed_arity_primitive() {
        assert!(parse_str("(car 1 2)").is_err());
        assert!(parse_str("(cons 1)").is_err());
    }

    #[test]
    fn if_requires_exactly_three_operands() {
        assert!(parse_str("(if #t 1)").is_err());
        assert!(parse_str("(if #t 1 2 3)").is_err());
        assert!(parse_str("(if #t 1 2)").is_ok());
    }

    #[test]
    fn lambda_with_ellipsis_is_variadic() {
        let expr = parse_str("(lambda (a b rest ...) a)").unwrap();
        match &*expr {
            Expr::Lambda { params, variadic, .. } => {
                assert_eq!(params, &vec!["a".to_string(), "b".to_string(), "rest".to_string()]);
                assert!(*variadic);
            }
            _ => panic!("expected lambda"),
        }
    }

    #[test]
    fn define_function_sugar_desugars_to_lambda() {
        let expr = parse_str("(define (square x) (* x x))").unwrap();
        match &*expr {
            Expr::Define(name, rhs) => {
                assert_eq!(name, "square");
                assert!(matches!(&**rhs, Expr::Lambda { .. }));
            }
            _ => panic!("expected define"),
        }
    }

    #[test]
    fn cond_else_must_be_last() {
        assert!(parse_str("(cond (else 1) (#t 2))").is_err());
    }

    #[test]
    fn cond_allows_at_most_one_else() {
        assert!(parse_str("(cond (#t 1) (else 2) (else 3))").is_err());
    }

    #[test]
    fn quote_carries_raw_syntax_unparsed() {
        let expr = parse_str("(quote (a b))").unwrap();
        assert!(matches!(&*expr, Expr::Quote(Syntax::List(items)) if items.len() == 2));
    }

    #[test]
    fn void_with_no_args_is_the_literal_shortcut() {
        assert!(matches!(*parse_str("(void)").unwrap(), Expr::VoidLit));
    }

    #[test]
    fn void_with_args_is_make_void() {
        assert!(matches!(*parse_str("(void 1 2)").unwrap(), Expr::MakeVoid(ref a) if a.len() == 2));
    }

    #[test]
    fn exit_ignores_operands_and_is_always_the_literal() {
        assert!(matches!(*parse_str("(exit)").unwrap(), Expr::ExitLit));
        assert!(matches!(*parse_str("(exit 1 2 3)").unwrap(), Expr::ExitLit));
    }

    #[test]
    fn internal_define_in_begin_shadows_for_later_forms() {
        let expr = parse_str("(begin (define + 9) (+ 1 2))").unwrap();
        match &*expr {
            Expr::Begin(exprs) => {
                assert!(matches!(&*exprs[1], Expr::Apply(..)));
            }
            _ => panic!("expected begin"),
        }
    }
}
