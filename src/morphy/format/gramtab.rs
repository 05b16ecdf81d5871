//! Decoder for the serialized gramtab blob written by the dictionary compiler.
//!
//! The compiler writes the table with PHP's `serialize()`, a length-prefixed
//! text format:
//!
//! ```text
//! a:3:{s:5:"index";a:N:{s:2:"aa";i:257;...}s:5:"poses";a:M:{i:0;s:4:"NOUN";...}s:8:"grammems";a:K:{...}}
//! ```
//!
//! Only the value kinds the gramtab needs are supported: null, bool, integer,
//! float, byte string and array. Strings are byte-counted, so the single-byte
//! dictionary codepage passes through untouched.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, take, take_till},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::fold_many_m_n,
    sequence::{delimited, pair, terminated},
    IResult,
};

use crate::morphy::types::error::{MorphyError, Result};

/// A serialized scalar or array.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Vec<u8>),
    Array(Vec<(Key, Value)>),
}

/// Array keys are either integers or byte strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Int(i64),
    Str(Vec<u8>),
}

impl Key {
    /// Integer keys are how the serializer stores numeric-looking strings, so
    /// both forms are normalized to bytes for string-keyed lookups.
    fn into_bytes(self) -> Vec<u8> {
        match self {
            Key::Int(n) => n.to_string().into_bytes(),
            Key::Str(s) => s,
        }
    }
}

/// The three tables making up a gramtab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GramTabData {
    /// 2-byte ancode -> combined index (low byte: pos, high byte: grammems).
    pub index: HashMap<Vec<u8>, u16>,
    pub poses: HashMap<usize, Vec<u8>>,
    pub grammems: HashMap<usize, Vec<u8>>,
}

// =============================================================================
// PARSERS
// =============================================================================

fn integer(input: &[u8]) -> IResult<&[u8], i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<i64>().map_err(|_| ()))
    })(input)
}

fn length(input: &[u8]) -> IResult<&[u8], usize> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<usize>().map_err(|_| ()))
    })(input)
}

fn null(input: &[u8]) -> IResult<&[u8], Value> {
    value(Value::Null, tag("N;"))(input)
}

fn boolean(input: &[u8]) -> IResult<&[u8], Value> {
    map(delimited(tag("b:"), one_of("01"), char(';')), |c| {
        Value::Bool(c == '1')
    })(input)
}

fn int(input: &[u8]) -> IResult<&[u8], i64> {
    delimited(tag("i:"), integer, char(';'))(input)
}

fn float(input: &[u8]) -> IResult<&[u8], Value> {
    map_res(
        delimited(tag("d:"), take_till(|b: u8| b == b';'), char(';')),
        |digits: &[u8]| {
            std::str::from_utf8(digits)
                .map_err(|_| ())
                .and_then(|s| s.parse::<f64>().map_err(|_| ()))
                .map(Value::Float)
        },
    )(input)
}

fn string(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (input, len) = delimited(tag("s:"), length, tag(":\""))(input)?;
    let (input, bytes) = take(len)(input)?;
    let (input, _) = tag("\";")(input)?;
    Ok((input, bytes.to_vec()))
}

fn key(input: &[u8]) -> IResult<&[u8], Key> {
    alt((map(int, Key::Int), map(string, Key::Str)))(input)
}

fn array(input: &[u8]) -> IResult<&[u8], Vec<(Key, Value)>> {
    let (input, len) = delimited(tag("a:"), length, tag(":{"))(input)?;
    terminated(
        fold_many_m_n(len, len, pair(key, parse_value), Vec::new, |mut acc, item| {
            acc.push(item);
            acc
        }),
        char('}'),
    )(input)
}

fn parse_value(input: &[u8]) -> IResult<&[u8], Value> {
    alt((
        null,
        boolean,
        map(int, Value::Int),
        float,
        map(string, Value::Str),
        map(array, Value::Array),
    ))(input)
}

/// Parses one complete serialized value, allowing trailing whitespace.
pub fn parse(raw: &[u8]) -> Result<Value> {
    match all_consuming(terminated(parse_value, multispace0))(raw) {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(MorphyError::GramTab(format!(
                "Unexpected input at byte {} ({:?})",
                raw.len() - e.input.len(),
                e.code
            )))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(MorphyError::GramTab("Serialized data is truncated".to_string()))
        }
    }
}

// =============================================================================
// TABLE EXTRACTION
// =============================================================================

fn take_array(entries: &mut Vec<(Key, Value)>, name: &str) -> Result<Vec<(Key, Value)>> {
    let pos = entries
        .iter()
        .position(|(k, _)| matches!(k, Key::Str(s) if s == name.as_bytes()))
        .ok_or_else(|| MorphyError::GramTab(format!("Missing '{}' table", name)))?;

    match entries.swap_remove(pos).1 {
        Value::Array(items) => Ok(items),
        other => Err(MorphyError::GramTab(format!(
            "'{}' must be an array, found {:?}",
            name, other
        ))),
    }
}

fn string_table(items: Vec<(Key, Value)>, name: &str) -> Result<HashMap<usize, Vec<u8>>> {
    items
        .into_iter()
        .map(|(k, v)| {
            let idx = match k {
                Key::Int(n) if n >= 0 => n as usize,
                other => {
                    return Err(MorphyError::GramTab(format!(
                        "Bad key {:?} in '{}'",
                        other, name
                    )))
                }
            };
            let text = match v {
                Value::Str(s) => s,
                Value::Null => Vec::new(),
                other => {
                    return Err(MorphyError::GramTab(format!(
                        "Bad value {:?} in '{}'",
                        other, name
                    )))
                }
            };
            Ok((idx, text))
        })
        .collect()
}

/// Deserializes a gramtab blob into its `index`, `poses` and `grammems` tables.
pub fn decode(raw: &[u8]) -> Result<GramTabData> {
    let mut root = match parse(raw)? {
        Value::Array(entries) => entries,
        other => {
            return Err(MorphyError::GramTab(format!(
                "Top-level value must be an array, found {:?}",
                other
            )))
        }
    };

    let index = take_array(&mut root, "index")?
        .into_iter()
        .map(|(k, v)| match v {
            Value::Int(n) if (0..=i64::from(u16::MAX)).contains(&n) => {
                Ok((k.into_bytes(), n as u16))
            }
            other => Err(MorphyError::GramTab(format!("Bad index value {:?}", other))),
        })
        .collect::<Result<HashMap<_, _>>>()?;
    let poses = string_table(take_array(&mut root, "poses")?, "poses")?;
    let grammems = string_table(take_array(&mut root, "grammems")?, "grammems")?;

    Ok(GramTabData {
        index,
        poses,
        grammems,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        assert_eq!(parse(b"N;").unwrap(), Value::Null);
        assert_eq!(parse(b"b:1;").unwrap(), Value::Bool(true));
        assert_eq!(parse(b"i:-42;").unwrap(), Value::Int(-42));
        assert_eq!(parse(b"d:0.5;").unwrap(), Value::Float(0.5));
        assert_eq!(parse(b"s:3:\"a;b\";\n").unwrap(), Value::Str(b"a;b".to_vec()));
    }

    #[test]
    fn string_length_is_in_bytes() {
        // Embedded quote and a non-ASCII single-byte character.
        let raw = b"s:4:\"\xc0\"\"x\";";
        assert_eq!(parse(raw).unwrap(), Value::Str(b"\xc0\"\"x".to_vec()));
    }

    #[test]
    fn decodes_tables_with_numeric_keys() {
        let raw = b"a:3:{s:5:\"index\";a:2:{s:2:\"aa\";i:257;i:10;i:0;}\
s:5:\"poses\";a:2:{i:0;s:0:\"\";i:1;s:4:\"NOUN\";}\
s:8:\"grammems\";a:2:{i:0;s:2:\"sg\";i:1;s:2:\"pl\";}}";
        let data = decode(raw).unwrap();
        assert_eq!(data.index.get(&b"aa"[..]), Some(&257));
        assert_eq!(data.index.get(&b"10"[..]), Some(&0));
        assert_eq!(data.poses.get(&1).map(Vec::as_slice), Some(&b"NOUN"[..]));
        assert_eq!(data.grammems.get(&1).map(Vec::as_slice), Some(&b"pl"[..]));
    }

    #[test]
    fn rejects_missing_table_and_garbage() {
        assert!(matches!(
            decode(b"a:1:{s:5:\"index\";a:0:{}}"),
            Err(MorphyError::GramTab(_))
        ));
        assert!(matches!(decode(b"a:1:{"), Err(MorphyError::GramTab(_))));
        assert!(matches!(decode(b"s:10:\"abc\";"), Err(MorphyError::GramTab(_))));
    }
}
