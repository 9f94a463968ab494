// Filter expression parser.
//
// Grammar (case-sensitive, no whitespace):
//
//     filterList := filterExpr ("/" filterExpr)*
//     filterExpr := atom | "not(" filterExpr ")" | "and(" argList ")" | "or(" argList ")"
//     argList    := filterExpr ("," filterExpr)*
//     atom       := "photo" | "video" | "rt" | "qt" | "all"
//
// Separators only split at parenthesis depth zero, so `and(rt,qt)/photo`
// yields two entries and the comma stays inside the first one.

use thiserror::Error;

use super::ast::{AtomKind, FilterList, PredicateNode};

/// Errors produced while parsing filter text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A token that is neither an atom nor a combinator.
    #[error("unknown filter \"{token}\"")]
    UnknownAtom { token: String },

    /// Parentheses are missing or do not balance.
    #[error("unbalanced or missing parentheses in \"{expr}\"")]
    Unbalanced { expr: String },

    /// A combinator with nothing between its parentheses.
    #[error("empty argument list in \"{expr}\"")]
    EmptyArgs { expr: String },

    /// An empty entry or argument, e.g. `rt//qt` or `and(rt,)`.
    #[error("empty filter expression")]
    EmptyExpression,
}

impl ParseError {
    fn unbalanced(expr: &str) -> Self {
        ParseError::Unbalanced {
            expr: expr.to_string(),
        }
    }
}

/// Parse a `/`-separated filter list.
pub fn parse(text: &str) -> Result<FilterList, ParseError> {
    let entries = split_top_level(text, '/')?
        .into_iter()
        .map(parse_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FilterList::new(entries))
}

/// Parse a single filter expression.
pub fn parse_expr(text: &str) -> Result<PredicateNode, ParseError> {
    if text.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    if let Some(kind) = AtomKind::from_token(text) {
        return Ok(PredicateNode::Atom(kind));
    }

    if let Some(rest) = combinator_args(text, "not") {
        let inner = unwrap_args(text, rest)?;
        return Ok(PredicateNode::negate(parse_expr(inner)?));
    }

    if let Some(rest) = combinator_args(text, "and") {
        return Ok(PredicateNode::And(parse_args(text, rest)?));
    }

    if let Some(rest) = combinator_args(text, "or") {
        return Ok(PredicateNode::Or(parse_args(text, rest)?));
    }

    Err(ParseError::UnknownAtom {
        token: text.to_string(),
    })
}

/// The text after a combinator name, if `text` is a use of that combinator.
/// A bare name (`and`) counts, so it reports missing parentheses rather than
/// an unknown token; `another` does not.
fn combinator_args<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.strip_prefix(name)
        .filter(|rest| rest.is_empty() || rest.starts_with('('))
}

fn parse_args(expr: &str, rest: &str) -> Result<Vec<PredicateNode>, ParseError> {
    let inner = unwrap_args(expr, rest)?;
    split_top_level(inner, ',')?
        .into_iter()
        .map(parse_expr)
        .collect()
}

/// Strip the outer `(` `)` from a combinator's argument text. The opening
/// parenthesis has to close on the last character.
fn unwrap_args<'a>(expr: &str, rest: &'a str) -> Result<&'a str, ParseError> {
    if rest.len() < 2 || !rest.starts_with('(') || !rest.ends_with(')') {
        return Err(ParseError::unbalanced(expr));
    }

    let last = rest.len() - 1;
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ParseError::unbalanced(expr))?;
                if depth == 0 && i != last {
                    return Err(ParseError::unbalanced(expr));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::unbalanced(expr));
    }

    let inner = &rest[1..last];
    if inner.is_empty() {
        return Err(ParseError::EmptyArgs {
            expr: expr.to_string(),
        });
    }
    Ok(inner)
}

/// Split on `sep` wherever the parenthesis depth is zero. Depth must never go
/// negative and must be back at zero at the end of the text.
fn split_top_level(text: &str, sep: char) -> Result<Vec<&str>, ParseError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ParseError::unbalanced(text))?;
            }
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ParseError::unbalanced(text));
    }
    parts.push(&text[start..]);
    Ok(parts)
}
