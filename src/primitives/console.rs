// ABOUTME: display, writes a value's contents to standard output

use crate::value::Value;
use std::io::Write;

/// Writes `value` to `out` without quoting strings (their contents print
/// bare; everything else prints in its canonical textual form). Always
/// returns `Void`. `out` is the same stream the REPL driver prints its own
/// result/error lines to, so a program's `display` calls interleave with
/// the REPL's output in the order they actually ran. A write failure here
/// (a closed pipe, a full disk) isn't one of this language's modeled
/// failure categories, so it's swallowed rather than surfaced as a
/// `RuntimeError`.
pub fn display(value: &Value, out: &mut dyn Write) -> Value {
    match value {
        Value::String(s) => {
            let _ = write!(out, "{s}");
        }
        other => {
            let _ = write!(out, "{other}");
        }
    }
    Value::Void
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_writes_string_contents_without_quotes() {
        let mut out = Vec::new();
        display(&Value::String("hi".to_string()), &mut out);
        assert_eq!(String::from_utf8(out).unwrap(), "hi");
    }

    #[test]
    fn display_writes_other_values_in_canonical_form() {
        let mut out = Vec::new();
        display(&Value::Integer(42), &mut out);
        assert_eq!(String::from_utf8(out).unwrap(), "42");
    }
}
