// ABOUTME: Reader module for turning raw text into a Syntax tree using nom combinators
//
// This is the textual-tokenizer layer spec.md treats as an external
// collaborator: it knows nothing about reserved forms, primitives, or
// environments. It only turns characters into syntax nodes.

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while, take_while1},
    character::complete::{char, digit1, multispace1, none_of, one_of},
    combinator::{map_res, not, opt, peek, recognize, value},
    multi::many0,
    IResult, Parser,
};

use crate::syntax::Syntax;

fn parse_regular_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    many0(alt((value((), multispace1), parse_regular_comment)))
        .map(|_| ())
        .parse(input)
}

/// Integer or rational literal: `42`, `-42`, `1/2`, `-3/4`.
fn parse_number(input: &str) -> IResult<&str, Syntax> {
    let (input, sign) = opt(char('-')).parse(input)?;
    let (input, num_str) = digit1(input)?;
    let (input, den_str) = opt((char('/'), digit1)).parse(input)?;

    let negative = sign.is_some();
    let num: i64 = num_str.parse().map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })?;
    let num = if negative { -num } else { num };

    match den_str {
        Some((_, den_digits)) => {
            let den: i64 = den_digits.parse().map_err(|_| {
                nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
            })?;
            Ok((input, Syntax::Rational(num, den)))
        }
        None => Ok((input, Syntax::Integer(num))),
    }
}

fn parse_bool(input: &str) -> IResult<&str, Syntax> {
    alt((
        value(Syntax::Boolean(true), tag("#t")),
        value(Syntax::Boolean(false), tag("#f")),
    ))
    .parse(input)
}

const SYMBOL_SPECIALS: &str = "+-*/%<>=!?.";

fn parse_symbol(input: &str) -> IResult<&str, Syntax> {
    let specials = SYMBOL_SPECIALS;
    let (input, first) = map_res(
        one_of("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+-*/%<>=!?."),
        |c: char| -> Result<char, ()> { Ok(c) },
    )
    .parse(input)?;
    let (input, rest) = take_while(|c: char| c.is_alphanumeric() || c == '-' || c == '_' || specials.contains(c))(input)?;

    let mut symbol = String::new();
    symbol.push(first);
    symbol.push_str(rest);
    Ok((input, Syntax::Symbol(symbol)))
}

fn parse_string(input: &str) -> IResult<&str, Syntax> {
    let (input, _) = char('"')(input)?;

    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('"')(input) {
        return Ok((input, Syntax::String(String::new())));
    }

    let (input, content) = escaped(none_of("\"\\"), '\\', one_of("\"\\nt")).parse(input)?;
    let (input, _) = char('"')(input)?;

    let mut result = String::new();
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    Ok((input, Syntax::String(result)))
}

fn parse_list(input: &str) -> IResult<&str, Syntax> {
    let (input, _) = char('(')(input)?;
    let (input, _) = ws_and_comments(input)?;

    let mut items = Vec::new();
    let mut remaining = input;

    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>(')')(remaining) {
            return Ok((rest, Syntax::List(items)));
        }

        let (rest, item) = parse_syntax(remaining)?;
        items.push(item);

        let (rest, _) = ws_and_comments(rest)?;
        remaining = rest;
    }
}

fn parse_syntax(input: &str) -> IResult<&str, Syntax> {
    let (input, _) = ws_and_comments(input)?;
    alt((parse_list, parse_bool, parse_number, parse_string, parse_symbol)).parse(input)
}

/// Read exactly one syntax tree from the front of `input`, returning it
/// along with whatever text remains.
pub fn read_one(input: &str) -> Result<(Syntax, &str), String> {
    let (input, _) = ws_and_comments(input).unwrap_or((input, ()));
    if input.is_empty() {
        return Err("no more input".to_string());
    }
    match parse_syntax(input) {
        Ok((rest, node)) => Ok((node, rest)),
        Err(e) => Err(format!("read error: {e:?}")),
    }
}

/// Read a single syntax tree, requiring the entire (trimmed) input to be
/// consumed by it. Used when an API boundary expects exactly one form.
pub fn read(input: &str) -> Result<Syntax, String> {
    let (node, rest) = read_one(input)?;
    let (rest, _) = ws_and_comments(rest).unwrap_or((rest, ()));
    if !rest.is_empty() {
        return Err(format!("unexpected trailing input: '{rest}'"));
    }
    Ok(node)
}

/// Read every syntax tree present in `input`, in order.
pub fn read_all(input: &str) -> Result<Vec<Syntax>, String> {
    let mut forms = Vec::new();
    let mut remaining = input;
    loop {
        let (after_ws, _) = ws_and_comments(remaining).unwrap_or((remaining, ()));
        if after_ws.is_empty() {
            break;
        }
        let (node, rest) = read_one(after_ws)?;
        forms.push(node);
        remaining = rest;
    }
    Ok(forms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_integers() {
        assert_eq!(read("42").unwrap(), Syntax::Integer(42));
        assert_eq!(read("-42").unwrap(), Syntax::Integer(-42));
        assert_eq!(read("0").unwrap(), Syntax::Integer(0));
    }

    #[test]
    fn reads_rationals() {
        assert_eq!(read("1/2").unwrap(), Syntax::Rational(1, 2));
        assert_eq!(read("-3/4").unwrap(), Syntax::Rational(-3, 4));
    }

    #[test]
    fn reads_booleans() {
        assert_eq!(read("#t").unwrap(), Syntax::Boolean(true));
        assert_eq!(read("#f").unwrap(), Syntax::Boolean(false));
    }

    #[test]
    fn reads_symbols() {
        assert_eq!(read("foo-bar?").unwrap(), Syntax::Symbol("foo-bar?".into()));
        assert_eq!(read("+").unwrap(), Syntax::Symbol("+".into()));
        assert_eq!(read("set!").unwrap(), Syntax::Symbol("set!".into()));
        assert_eq!(read("...").unwrap(), Syntax::Symbol("...".into()));
    }

    #[test]
    fn reads_strings_with_escapes() {
        assert_eq!(read(r#""hi""#).unwrap(), Syntax::String("hi".into()));
        assert_eq!(
            read(r#""a\nb""#).unwrap(),
            Syntax::String("a\nb".into())
        );
    }

    #[test]
    fn reads_empty_list() {
        assert_eq!(read("()").unwrap(), Syntax::List(vec![]));
    }

    #[test]
    fn reads_nested_lists() {
        let node = read("(+ 1 (* 2 3))").unwrap();
        match node {
            Syntax::List(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[0], Syntax::Symbol("+".into()));
                assert_eq!(items[1], Syntax::Integer(1));
                assert!(matches!(&items[2], Syntax::List(inner) if inner.len() == 3));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn reads_dotted_pair_syntax() {
        let node = read("(1 . 2)").unwrap();
        match node {
            Syntax::List(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[1], Syntax::Symbol(".".into()));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn reads_comments() {
        assert_eq!(
            read("; comment\n42").unwrap(),
            Syntax::Integer(42)
        );
    }

    #[test]
    fn read_all_handles_multiple_top_level_forms() {
        let forms = read_all("1 2 3").unwrap();
        assert_eq!(forms.len(), 3);
    }

    #[test]
    fn read_rejects_unclosed_list() {
        assert!(read("(1 2").is_err());
    }

    #[test]
    fn read_rejects_trailing_input() {
        assert!(read("1 2").is_err());
    }
}
