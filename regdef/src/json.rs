//! A small JSON reader for register-map documents.
//!
//! Objects keep their members in document order, since that is the order registers are generated
//! in. Numbers are kept as written.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::{char, digit1, multispace0, none_of, one_of};
use nom::combinator::{map, map_opt, opt, recognize, value};
use nom::multi::{fold_many0, separated_list0};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(String),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.parse().ok(),
            _ => None,
        }
    }

    /// Whether the value carries nothing: `null`, `false`, `0`, `""`, `[]` or `{}`.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Number(n) => n.parse::<f64>().map_or(false, |n| n == 0.0),
            Self::String(s) => s.is_empty(),
            Self::Array(values) => values.is_empty(),
            Self::Object(members) => members.is_empty(),
        }
    }
}

/// Parses a whole document. Trailing input other than whitespace is an error.
pub fn parse(input: &str) -> Result<Value, nom::Err<nom::error::Error<&str>>> {
    let (input, root) = ws(json_value)(input)?;
    if !input.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        )));
    }
    Ok(root)
}

fn ws<'a, O>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(multispace0, parser, multispace0)
}

fn json_value(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Null, tag("null")),
        value(Value::Bool(true), tag("true")),
        value(Value::Bool(false), tag("false")),
        map(number, |n| Value::Number(n.to_string())),
        map(string, Value::String),
        map(array, Value::Array),
        map(object, Value::Object),
    ))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

fn unicode_escape(input: &str) -> IResult<&str, char> {
    map_opt(
        preceded(
            char('u'),
            take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
        ),
        |hex| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32),
    )(input)
}

fn escape(input: &str) -> IResult<&str, char> {
    preceded(
        char('\\'),
        alt((
            value('"', char('"')),
            value('\\', char('\\')),
            value('/', char('/')),
            value('\n', char('n')),
            value('\r', char('r')),
            value('\t', char('t')),
            value('\u{8}', char('b')),
            value('\u{c}', char('f')),
            unicode_escape,
        )),
    )(input)
}

fn string(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(
            alt((none_of("\"\\"), escape)),
            String::new,
            |mut s, c| {
                s.push(c);
                s
            },
        ),
        char('"'),
    )(input)
}

fn array(input: &str) -> IResult<&str, Vec<Value>> {
    delimited(
        terminated(char('['), multispace0),
        separated_list0(char(','), ws(json_value)),
        char(']'),
    )(input)
}

fn member(input: &str) -> IResult<&str, (String, Value)> {
    separated_pair(ws(string), char(':'), ws(json_value))(input)
}

fn object(input: &str) -> IResult<&str, Vec<(String, Value)>> {
    delimited(
        terminated(char('{'), multispace0),
        separated_list0(char(','), member),
        char('}'),
    )(input)
}
