use alloc::{format, string::String, vec::Vec};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace1, not_line_ending},
    combinator::{cut, map, value},
    multi::many0,
    sequence::{pair, preceded, terminated},
    IResult,
};

use crate::error::{InputKind, MalformedInput};

/// Parenthesised expression as written, before any PDDL meaning is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExpr<'a> {
    Atom(&'a str),
    List(Vec<SExpr<'a>>),
}

impl<'a> SExpr<'a> {
    pub fn as_atom(&self) -> Option<&'a str> {
        match self {
            Self::Atom(a) => Some(a),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr<'a>]> {
        match self {
            Self::Atom(_) => None,
            Self::List(l) => Some(l),
        }
    }

    /// Keywords are matched ignoring ASCII case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.as_atom()
            .is_some_and(|a| a.eq_ignore_ascii_case(keyword))
    }

    /// First element of a list, if it is an atom.
    pub fn head(&self) -> Option<&'a str> {
        self.as_list().and_then(|l| l.first()).and_then(SExpr::as_atom)
    }
}

impl core::fmt::Display for SExpr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Atom(a) => write!(f, "{}", a),
            Self::List(l) => {
                write!(f, "(")?;
                for (i, e) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Whitespace and `;` comments.
pub(crate) fn ws(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), pair(char(';'), not_line_ending)),
        ))),
    )(input)
}

fn atom(input: &str) -> IResult<&str, SExpr<'_>> {
    map(
        take_while1(|c: char| !c.is_whitespace() && c != '(' && c != ')' && c != ';'),
        SExpr::Atom,
    )(input)
}

fn list(input: &str) -> IResult<&str, SExpr<'_>> {
    map(
        preceded(
            char('('),
            cut(terminated(
                many0(preceded(ws, expr)),
                preceded(ws, char(')')),
            )),
        ),
        SExpr::List,
    )(input)
}

fn expr(input: &str) -> IResult<&str, SExpr<'_>> {
    alt((list, atom))(input)
}

pub(crate) fn line_of(source: &str, rest: &str) -> usize {
    let consumed = source.len().saturating_sub(rest.len());
    source[..consumed].matches('\n').count() + 1
}

fn syntax_error(source: &str, rest: &str, kind: InputKind) -> MalformedInput {
    let reason = match rest.chars().next() {
        None => String::from("unexpected end of input, missing `)`"),
        Some(')') => String::from("unbalanced `)`"),
        Some(_) => format!(
            "unexpected `{}`",
            rest.split_whitespace().next().unwrap_or_default()
        ),
    };
    MalformedInput::Syntax {
        input: kind,
        line: line_of(source, rest),
        reason,
    }
}

/// Reads every top-level expression of `source`.
pub fn parse_all(source: &str, kind: InputKind) -> Result<Vec<SExpr<'_>>, MalformedInput> {
    match terminated(many0(preceded(ws, expr)), ws)(source) {
        Ok(("", exprs)) => Ok(exprs),
        Ok((rest, _)) => Err(syntax_error(source, rest, kind)),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            Err(syntax_error(source, e.input, kind))
        }
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(source, "", kind)),
    }
}

/// Reads exactly one top-level expression.
pub fn parse_one(source: &str, kind: InputKind) -> Result<SExpr<'_>, MalformedInput> {
    let mut exprs = parse_all(source, kind)?;
    match exprs.len() {
        1 => Ok(exprs.remove(0)),
        0 => Err(MalformedInput::Syntax {
            input: kind,
            line: line_of(source, ""),
            reason: String::from("empty input"),
        }),
        _ => Err(MalformedInput::Syntax {
            input: kind,
            line: 1,
            reason: String::from("more than one top-level expression"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_parse_atoms_and_lists() {
        let e = parse_one("  (move r1 (roomA) roomB) ", InputKind::Plan).unwrap();
        assert_eq!(
            e,
            SExpr::List(vec![
                SExpr::Atom("move"),
                SExpr::Atom("r1"),
                SExpr::List(vec![SExpr::Atom("roomA")]),
                SExpr::Atom("roomB"),
            ])
        );
        assert_eq!(e.head(), Some("move"));
        assert_eq!(e.to_string(), "(move r1 (roomA) roomB)");

        let e = parse_one("pick-up", InputKind::Plan).unwrap();
        assert_eq!(e, SExpr::Atom("pick-up"));
        assert!(SExpr::Atom(":Action").is_keyword(":action"));
    }

    #[test]
    fn test_comments() {
        let source = r#"
; leading comment
(define ; trailing comment
  (domain d)) ; after
"#;
        let e = parse_one(source, InputKind::Domain).unwrap();
        assert_eq!(e.to_string(), "(define (domain d))");
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_one("(define\n  (domain d)\n", InputKind::Domain).unwrap_err();
        assert_eq!(
            err,
            MalformedInput::Syntax {
                input: InputKind::Domain,
                line: 3,
                reason: String::from("unexpected end of input, missing `)`"),
            }
        );

        let err = parse_one("(a)\n(b))", InputKind::Problem).unwrap_err();
        assert!(matches!(err, MalformedInput::Syntax { line: 2, .. }));

        assert!(parse_one("", InputKind::Plan).is_err());
        assert!(parse_one("(a) (b)", InputKind::Plan).is_err());
        assert_eq!(parse_all("(a) (b)", InputKind::Plan).unwrap().len(), 2);
    }
}
