mod config;
mod env;
mod error;
mod eval;
mod expr;
mod highlighter;
mod parser;
mod primitives;
mod reader;
mod repl;
mod syntax;
mod value;

use clap::Parser;
use config::{HISTORY_FILE, PROMPT, WELCOME_FOOTER, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use env::Environment;
use highlighter::LispHelper;
use repl::{run_source, Mode};
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

/// A small Lisp-family interpreter: integers, exact rationals, closures.
#[derive(Parser, Debug)]
#[command(name = "schemelet")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter for a lexically scoped, dynamically typed Lisp-family language")]
struct CliArgs {
    /// Script file to execute (omit to start the interactive REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(path) = args.script {
        return run_script(&path);
    }

    run_repl()
}

/// Script mode (SPEC_FULL §F): every top-level form is read, parsed, and
/// evaluated in sequence with no result echoing, but a failure still
/// surfaces on the shared output.
fn run_script(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {e}", path.display()))?;

    let mut env = Environment::empty();
    let mut out = io::stdout();
    run_source(&contents, &mut env, Mode::Script, &mut out)?;
    Ok(())
}

/// Interactive mode (§6): one persistent global environment across every
/// line read, with the prompt/exception-message/result-echo printing policy
/// `repl::run_source` implements for `Mode::Interactive`. Stdin is checked
/// once at startup: a real terminal gets the `scm> ` prompt and the
/// exception's own message ahead of `RuntimeError`; piped stdin gets
/// neither, per §6's "optional build mode" language.
fn run_repl() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config).map_err(|e| format!("failed to initialize the REPL: {e}"))?;
    rl.set_helper(Some(LispHelper::new()));
    let _ = rl.load_history(HISTORY_FILE);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");
    println!("{WELCOME_FOOTER}");

    let is_terminal = io::stdin().is_terminal();
    let mode = if is_terminal { Mode::Interactive } else { Mode::Piped };
    let prompt = if is_terminal { PROMPT } else { "" };

    let mut env = Environment::empty();
    let mut out = io::stdout();

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let keep_going = run_source(&line, &mut env, mode, &mut out)?;
                if !keep_going {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{err}");
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}
