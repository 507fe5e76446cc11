// ABOUTME: Syntax tree produced by the reader, consumed by the parser

use std::fmt;

/// A raw, unresolved syntax node: the output of the reader and the input to
/// the parser. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Integer(i64),
    Rational(i64, i64),
    String(String),
    Boolean(bool),
    Symbol(String),
    List(Vec<Syntax>),
}

impl Syntax {
    /// True for a `List` with no elements.
    pub fn is_empty_list(&self) -> bool {
        matches!(self, Syntax::List(items) if items.is_empty())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Syntax::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Syntax]> {
        match self {
            Syntax::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Integer(n) => write!(f, "{n}"),
            Syntax::Rational(n, d) => write!(f, "{n}/{d}"),
            Syntax::String(s) => write!(f, "\"{s}\""),
            Syntax::Boolean(true) => write!(f, "#t"),
            Syntax::Boolean(false) => write!(f, "#f"),
            Syntax::Symbol(s) => write!(f, "{s}"),
            Syntax::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}
