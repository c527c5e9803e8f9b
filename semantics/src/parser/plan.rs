use alloc::{string::String, vec::Vec};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, multispace0, multispace1},
    combinator::{all_consuming, map, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};

use crate::{
    error::{Error, InputKind, InvalidCall, MalformedInput},
    parser::sexpr::{line_of, ws},
};

/// A name followed by its arguments, as in `pick-up a` or `on a b`.
///
/// Used for both action calls and ground propositions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call<'a> {
    pub name: &'a str,
    pub arguments: Vec<&'a str>,
}

fn brackets<'a, F, O>(f: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(pair(tag("("), multispace0), f, pair(multispace0, tag(")")))
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alpha1,
        many0(alt((alphanumeric1, tag("-"), tag("_")))),
    ))
    .parse(input)
}

fn call_body(input: &str) -> IResult<&str, Call<'_>> {
    map(separated_list1(multispace1, name), |mut parts: Vec<&str>| {
        // Can remove because the parser reads at least one name
        let name = parts.remove(0);
        Call {
            name,
            arguments: parts,
        }
    })(input)
}

fn call(input: &str) -> IResult<&str, Call<'_>> {
    delimited(
        multispace0,
        alt((brackets(call_body), call_body)),
        multispace0,
    )(input)
}

fn plan(input: &str) -> IResult<&str, Vec<Call<'_>>> {
    delimited(
        ws,
        alt((
            brackets(many0(preceded(ws, brackets(call_body)))),
            many0(preceded(ws, brackets(call_body))),
        )),
        ws,
    )(input)
}

/// Whether `text` is a name that calls and propositions can refer to:
/// a letter followed by letters, digits, `-` or `_`.
pub fn is_name(text: &str) -> bool {
    all_consuming(name)(text).is_ok()
}

/// Reads `name arg1 .. argN`, optionally wrapped in one pair of parentheses.
pub fn parse_call(text: &str) -> Result<Call<'_>, InvalidCall> {
    all_consuming(call)(text)
        .map(|(_, c)| c)
        .map_err(|_| InvalidCall::Malformed(String::from(text)))
}

/// Reads a plan written either as one list of calls, `((a x) (b y))`,
/// or as a sequence of calls, one `(a x)` per line.
pub fn parse_plan(text: &str) -> Result<Vec<Call<'_>>, Error> {
    match all_consuming(plan)(text) {
        Ok((_, calls)) => Ok(calls),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(MalformedInput::Syntax {
            input: InputKind::Plan,
            line: line_of(text, e.input),
            reason: String::from("expected a list of action calls"),
        }
        .into()),
        Err(nom::Err::Incomplete(_)) => Err(MalformedInput::Syntax {
            input: InputKind::Plan,
            line: line_of(text, ""),
            reason: String::from("unexpected end of input"),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn call_of<'a>(name: &'a str, arguments: &[&'a str]) -> Call<'a> {
        Call {
            name,
            arguments: arguments.to_vec(),
        }
    }

    #[test]
    fn test_parse_name() {
        let valid_names = [
            "move",
            "pick-up",
            "room1",
            "robot_arm",
            "box-123",
            "a",
            "task-42b",
            "Box",
        ];

        for &input in &valid_names {
            let maybe_name = name(input);
            assert!(
                maybe_name.is_ok(),
                "Expected valid name to parse: '{}'",
                input
            );
            let (_, parsed_name) = maybe_name.unwrap();
            assert_eq!(parsed_name, input);
            assert!(is_name(input));
        }

        let invalid_names = [
            "?x",       // variable, not grounded
            "-move",    // starts with non-letter
            "123robot", // starts with digit
            "move!",    // invalid character
            "pick up",  // space inside
            "",         // empty string
            "(move)",   // parentheses are not part of names
            " move",    // leading space
            "move ",    // trailing space
        ];

        for &input in &invalid_names {
            assert!(!is_name(input), "{}", input);
            let maybe_name = name(input);
            if let Ok((rem, _)) = maybe_name {
                assert!(
                    !rem.is_empty(),
                    "Expected to not parse the whole input: '{}'",
                    input
                );
            } else {
                assert!(
                    maybe_name.is_err(),
                    "Expected invalid name to fail parsing: '{}'",
                    input
                );
            }
        }
    }

    #[test]
    fn test_parse_call() {
        assert_eq!(
            parse_call("move r1 roomA roomB"),
            Ok(call_of("move", &["r1", "roomA", "roomB"]))
        );
        assert_eq!(
            parse_call("(  \n   pick-up \n r1    box1 \n roomB   )"),
            Ok(call_of("pick-up", &["r1", "box1", "roomB"]))
        );
        assert_eq!(parse_call(" handempty "), Ok(call_of("handempty", &[])));

        for bad in ["", "()", "((move r1))", "move r1)", "move ?x", "(move r1"] {
            assert_eq!(
                parse_call(bad),
                Err(InvalidCall::Malformed(String::from(bad))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_plan() {
        let input = r#"((move r1 roomA roomB))"#;
        assert_eq!(
            parse_plan(input).unwrap(),
            vec![call_of("move", &["r1", "roomA", "roomB"])]
        );

        let input = "( (move r1 roomA roomB) (pick-up r1 box1 roomB))";
        assert_eq!(
            parse_plan(input).unwrap(),
            vec![
                call_of("move", &["r1", "roomA", "roomB"]),
                call_of("pick-up", &["r1", "box1", "roomB"]),
            ]
        );

        let input = r#"
; found by hand
(move r1 roomA roomB)
(pick-up r1 box1 roomB) ; grab it
(move r1 roomB roomA)
(drop r1 box1 roomA)
"#;
        assert_eq!(
            parse_plan(input).unwrap(),
            vec![
                call_of("move", &["r1", "roomA", "roomB"]),
                call_of("pick-up", &["r1", "box1", "roomB"]),
                call_of("move", &["r1", "roomB", "roomA"]),
                call_of("drop", &["r1", "box1", "roomA"]),
            ]
        );

        assert!(parse_plan("").unwrap().is_empty());
        assert!(parse_plan("()").unwrap().is_empty());
        assert!(matches!(
            parse_plan("(move r1 roomA roomB)\n(pick-up r1"),
            Err(Error::MalformedInput(MalformedInput::Syntax {
                input: InputKind::Plan,
                ..
            }))
        ));
    }
}
