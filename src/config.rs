// ABOUTME: Version string, welcome banner, and REPL prompt constants

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const WELCOME_MESSAGE: &str = "schemelet";
pub const WELCOME_SUBTITLE: &str = "a small Lisp-family interpreter: integers, exact rationals, closures";
pub const WELCOME_FOOTER: &str = "Type (exit) or press Ctrl-D to quit.";

/// Prompt token printed before each read when stdin is a terminal (§6: the
/// "optional build mode" prompting language).
pub const PROMPT: &str = "scm> ";

/// History file persisted between interactive sessions, written to the
/// current working directory per the teacher's convention.
pub const HISTORY_FILE: &str = ".schemelet_history";
