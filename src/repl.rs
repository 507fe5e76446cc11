// ABOUTME: Read-eval-print loop: persistent global environment, §6's printing policy

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::eval::eval;
use crate::expr::Expr;
use crate::parser::parse;
use crate::primitives;
use crate::reader;
use crate::value::Value;
use std::io::Write;
use std::rc::Rc;

/// How a driver is feeding source to the loop. Controls the printing
/// policy, not parsing or evaluation (§6: prompting and the exception's own
/// message are a terminal-only nicety; script mode suppresses result
/// echoing entirely but still surfaces failures).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A script file: evaluate every form, print nothing but failures.
    Script,
    /// Stdin is not a terminal: echo results per §6, no prompt, no
    /// exception message ahead of the `RuntimeError` line.
    Piped,
    /// Stdin is a terminal: echo results, prompt before each read, and
    /// print the exception's own message ahead of the `RuntimeError` line.
    Interactive,
}

/// Evaluates one top-level expression against `env`, threading a mutable
/// handle so `define` (including one reached by splicing through a
/// top-level `begin`) grows the persistent global environment across
/// forms. This is the only place the evaluator's immutable-frame-chain
/// design needs an escape hatch: the REPL's notion of "the" global
/// environment is a variable that gets reassigned, not a frame that
/// mutates in place.
pub fn eval_top_level(
    expr: &Rc<Expr>,
    env: &mut Rc<Environment>,
    out: &mut dyn std::io::Write,
) -> Result<Value, RuntimeError> {
    match expr.as_ref() {
        Expr::Define(name, rhs) => {
            if primitives::is_primitive(name) {
                return Err(RuntimeError::RedefinePrimitive(name.clone()));
            }
            *env = Environment::extend(name.clone(), Value::Void, env);
            let value = eval(rhs, env, out)?;
            env.modify(name, value);
            Ok(Value::Void)
        }
        Expr::Begin(exprs) => {
            let mut result = Value::Void;
            for e in exprs {
                result = eval_top_level(e, env, out)?;
            }
            Ok(result)
        }
        _ => eval(expr, env, out),
    }
}

enum Action {
    Stop,
    Silent,
    Print(String),
}

/// §6's printing rules for one top-level `(expr, value)` pair: `Terminate`
/// stops the loop; `Void` prints nothing unless `expr` is, syntactically,
/// an explicit `void` invocation (recursively through `begin`/`if`/`cond`
/// tails); a `display` invocation (same tail recursion) has already
/// written its own output, so nothing more prints; otherwise the value's
/// textual form prints.
fn printing_action(expr: &Expr, value: &Value) -> Action {
    if matches!(value, Value::Terminate) {
        return Action::Stop;
    }
    if matches!(value, Value::Void) {
        return if expr.is_explicit_void_tail() {
            Action::Print("#<void>".to_string())
        } else {
            Action::Silent
        };
    }
    if expr.is_display_tail() {
        return Action::Silent;
    }
    Action::Print(value.to_string())
}

/// Reads, parses, and evaluates every top-level form in `source` against
/// `env`, applying the printing policy for `mode` to `out`. Takes no
/// terminal dependency, so it's exercised directly by tests.
pub fn run_source(
    source: &str,
    env: &mut Rc<Environment>,
    mode: Mode,
    out: &mut impl Write,
) -> std::io::Result<bool> {
    let mut remaining = source;
    loop {
        let trimmed = remaining.trim_start();
        if trimmed.is_empty() {
            return Ok(true);
        }

        let (syntax, rest) = match reader::read_one(trimmed) {
            Ok(pair) => pair,
            Err(message) => {
                if mode == Mode::Interactive {
                    writeln!(out, "{message}")?;
                }
                writeln!(out, "RuntimeError")?;
                return Ok(true);
            }
        };
        remaining = rest;

        let parsed = match parse(&syntax, env) {
            Ok(parsed) => parsed,
            Err(e) => {
                report_error(&e, mode, out)?;
                continue;
            }
        };

        let value = match eval_top_level(&parsed, env, out) {
            Ok(value) => value,
            Err(e) => {
                report_error(&e, mode, out)?;
                continue;
            }
        };

        if mode == Mode::Script {
            if matches!(value, Value::Terminate) {
                return Ok(false);
            }
            continue;
        }

        match printing_action(&parsed, &value) {
            Action::Stop => return Ok(false),
            Action::Silent => {}
            Action::Print(text) => writeln!(out, "{text}")?,
        }
    }
}

fn report_error(e: &RuntimeError, mode: Mode, out: &mut impl Write) -> std::io::Result<()> {
    if mode == Mode::Interactive {
        writeln!(out, "{e}")?;
    }
    writeln!(out, "RuntimeError")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_to_string(source: &str) -> String {
        let mut env = Environment::empty();
        let mut out = Vec::new();
        run_source(source, &mut env, Mode::Piped, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_plain_values_with_trailing_newline() {
        assert_eq!(eval_to_string("(+ 1 2 3)"), "6\n");
    }

    #[test]
    fn define_produces_no_output() {
        assert_eq!(
            eval_to_string("(define (fact n) (if (= n 0) 1 (* n (fact (- n 1))))) (fact 5)"),
            "120\n"
        );
    }

    #[test]
    fn plain_void_prints_nothing() {
        assert_eq!(eval_to_string("(define x 1)"), "");
    }

    #[test]
    fn explicit_void_invocation_prints_the_void_marker() {
        assert_eq!(eval_to_string("(void)"), "#<void>\n");
    }

    #[test]
    fn explicit_void_through_if_tail_prints_the_marker() {
        assert_eq!(eval_to_string("(if #t (void) 1)"), "#<void>\n");
    }

    #[test]
    fn display_invocation_suppresses_the_trailing_echo() {
        assert_eq!(eval_to_string(r#"(display "hi")"#), "hi");
    }

    #[test]
    fn runtime_errors_print_on_their_own_line_and_recover() {
        let output = eval_to_string("(car (quote ())) (+ 1 2)");
        assert_eq!(output, "RuntimeError\n2\n");
    }

    #[test]
    fn interactive_mode_prints_the_message_before_runtime_error() {
        let mut env = Environment::empty();
        let mut out = Vec::new();
        run_source("(car (quote ()))", &mut env, Mode::Interactive, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("car: expected pair, got null at argument 0"));
        assert_eq!(lines.next(), Some("RuntimeError"));
    }

    #[test]
    fn script_mode_suppresses_result_printing() {
        let mut env = Environment::empty();
        let mut out = Vec::new();
        run_source("(+ 1 2)", &mut env, Mode::Script, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn script_mode_still_reports_failures() {
        let mut env = Environment::empty();
        let mut out = Vec::new();
        run_source("(car (quote ()))", &mut env, Mode::Script, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "RuntimeError\n");
    }

    #[test]
    fn top_level_define_persists_across_forms() {
        assert_eq!(eval_to_string("(define x 5) (set! x (+ x 1)) x"), "6\n");
    }

    #[test]
    fn a_failed_form_leaves_earlier_defines_intact() {
        let mut env = Environment::empty();
        let mut out = Vec::new();
        run_source("(begin (define y 1) (car (quote ())))", &mut env, Mode::Piped, &mut out).unwrap();
        assert!(env.find("y").is_some());
    }

    #[test]
    fn exit_stops_the_loop_and_processes_nothing_after() {
        let mut env = Environment::empty();
        let mut out = Vec::new();
        let keep_going = run_source("(exit) (+ 1 2)", &mut env, Mode::Piped, &mut out).unwrap();
        assert!(!keep_going);
        assert_eq!(String::from_utf8(out).unwrap(), "");
    }
}
