//! The field-spec mini-language.
//!
//! A spec is a whitespace-separated list of field tokens. Positions count from 0 at the least
//! significant bit:
//!
//! - `NAME:BIT` is a single bit at `BIT`.
//! - `NAME:@COUNT` is `COUNT` contiguous bits whose position is inferred from the neighbours.
//! - `NAME:START:END` is an inclusive range, written high-to-low or low-to-high.
//!
//! ```text
//! Reserved:31:17 COUNTFLAG:@1 Reserved:@13 CLKSOURCE:2 TICKINT:1 ENABLE:0
//! ```

use nom::branch::alt;
use nom::bytes::complete::take_till1;
use nom::character::complete::{char, u32};
use nom::combinator::{all_consuming, map, map_opt, verify};
use nom::sequence::{preceded, separated_pair, tuple};
use nom::IResult;

use crate::error::{Error, MalformedFieldTokenSnafu};

/// A position exactly as the author wrote it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecPosition {
    Bit(u32),
    Span { start: u32, end: u32 },
}

impl SpecPosition {
    pub fn min(self) -> u32 {
        match self {
            Self::Bit(bit) => bit,
            Self::Span { start, end } => start.min(end),
        }
    }

    pub fn max(self) -> u32 {
        match self {
            Self::Bit(bit) => bit,
            Self::Span { start, end } => start.max(end),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub length: u32,
    pub position: Option<SpecPosition>,
}

/// The accepted fields of a spec, in input order, and the tokens that were dropped.
#[derive(Debug, Default)]
pub struct ParsedSpec {
    pub fields: Vec<FieldSpec>,
    pub rejected: Vec<Error>,
}

/// Parses every token of `spec`. Malformed tokens are logged and skipped.
pub fn parse(spec: &str) -> ParsedSpec {
    let mut parsed = ParsedSpec::default();
    for token in spec.split_whitespace() {
        match parse_token(token) {
            Ok(field) => parsed.fields.push(field),
            Err(e) => {
                log::warn!("{e}");
                parsed.rejected.push(e);
            }
        }
    }
    parsed
}

/// Parses a single field token.
pub fn parse_token(token: &str) -> Result<FieldSpec, Error> {
    let malformed = |reason: &str| MalformedFieldTokenSnafu { token, reason }.build();

    let arity = token.split(':').count();
    if !(2..=3).contains(&arity) {
        return Err(malformed(
            "expected NAME:BIT, NAME:@COUNT or NAME:START:END",
        ));
    }
    match all_consuming(field)(token) {
        Ok((_, field)) => Ok(field),
        Err(_) if token.starts_with(':') => Err(malformed("missing field name")),
        Err(_) if token.contains(":@") => Err(malformed("expected a positive bit count")),
        Err(_) => Err(malformed("expected bit positions")),
    }
}

fn name(input: &str) -> IResult<&str, &str> {
    take_till1(|c| c == ':')(input)
}

fn count(input: &str) -> IResult<&str, u32> {
    preceded(char('@'), verify(u32, |&n| n > 0))(input)
}

fn range(input: &str) -> IResult<&str, SpecPosition> {
    map(separated_pair(u32, char(':'), u32), |(start, end)| {
        SpecPosition::Span { start, end }
    })(input)
}

fn field(input: &str) -> IResult<&str, FieldSpec> {
    let (input, (name, _)) = tuple((name, char(':')))(input)?;
    let name = name.to_string();
    alt((
        map(count, {
            let name = name.clone();
            move |length| FieldSpec {
                name: name.clone(),
                length,
                position: None,
            }
        }),
        map_opt(range, {
            let name = name.clone();
            move |position| {
                Some(FieldSpec {
                    name: name.clone(),
                    length: (position.max() - position.min()).checked_add(1)?,
                    position: Some(position),
                })
            }
        }),
        map(u32, move |bit| FieldSpec {
            name: name.clone(),
            length: 1,
            position: Some(SpecPosition::Bit(bit)),
        }),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bit() {
        assert_eq!(
            parse_token("ENABLE:0"),
            Ok(FieldSpec {
                name: "ENABLE".to_string(),
                length: 1,
                position: Some(SpecPosition::Bit(0)),
            }),
        );
    }

    #[test]
    fn count() {
        assert_eq!(
            parse_token("Reserved:@13"),
            Ok(FieldSpec {
                name: "Reserved".to_string(),
                length: 13,
                position: None,
            }),
        );
    }

    #[test]
    fn range_keeps_written_direction() {
        assert_eq!(
            parse_token("Reserved:31:17"),
            Ok(FieldSpec {
                name: "Reserved".to_string(),
                length: 15,
                position: Some(SpecPosition::Span { start: 31, end: 17 }),
            }),
        );
        assert_eq!(
            parse_token("toff:0:3").map(|f| (f.length, f.position)),
            Ok((4, Some(SpecPosition::Span { start: 0, end: 3 }))),
        );
    }

    #[test]
    fn malformed_tokens() {
        for token in ["ENABLE", "A:1:2:3", ":3", "A:@0", "A:@", "A:x", "A:1:y", "A:", "A:1:"] {
            assert!(
                matches!(parse_token(token), Err(Error::MalformedFieldToken { .. })),
                "{token}",
            );
        }
    }

    #[test]
    fn range_over_every_bit_is_rejected() {
        assert!(matches!(
            parse_token("A:0:4294967295"),
            Err(Error::MalformedFieldToken { .. }),
        ));
        assert_eq!(parse_token("A:1:4294967295").map(|f| f.length), Ok(u32::MAX));
    }

    #[test]
    fn malformed_tokens_are_skipped() {
        let parsed = parse("A:0 bogus B:@2 C:1:2:3 D:5");
        let names: Vec<_> = parsed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "D"]);
        assert_eq!(parsed.rejected.len(), 2);
        assert_eq!(
            parsed.rejected[0].to_string(),
            "ignoring field \"bogus\": expected NAME:BIT, NAME:@COUNT or NAME:START:END",
        );
    }

    #[test]
    fn whitespace_is_flexible() {
        let parsed = parse("\n  A:0\tB:1   C:2\n");
        assert_eq!(parsed.fields.len(), 3);
        assert!(parsed.rejected.is_empty());
    }
}
