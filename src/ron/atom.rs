//! Value atoms: the positional, typed payload of an op.
//!
//! Each atom starts with its own marker:
//!
//! | marker | atom                          | value                      |
//! |--------|-------------------------------|----------------------------|
//! | `=`    | `=-42`                        | `Value::Int`               |
//! | `^`    | `^3.5`, `^1e-7`               | `Value::Float`             |
//! | `'`    | `'it\'s'`                     | `Value::String`            |
//! | `>`    | `>1ABC+user`, `>true`, `>0`   | `Value::Uuid`, `Bool`, `Null` |
//!
//! Strings use JSON escapes with the quotes flipped: the delimiter is `'`,
//! so `'` is escaped and `"` is not.

use smallvec::SmallVec;

use super::skip_ws;
use super::uuid;
use super::uuid::Uuid;
use crate::error::Error;
use crate::error::Result;

pub const INT_MARK: u8 = b'=';
pub const FLOAT_MARK: u8 = b'^';
pub const STRING_QUOTE: u8 = b'\'';
pub const UUID_MARK: u8 = b'>';
/// Written in place of `Value::FrameMarker`.
pub const FRAME_MARK: u8 = b'!';
/// Written in place of `Value::QueryMarker`.
pub const QUERY_MARK: u8 = b'?';

/// Decoded atoms of one op. Most ops carry one or two.
pub type Values = SmallVec<[Value; 4]>;

/// The syntactic kind of an atom, known from its marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtomKind {
    Int,
    Float,
    String,
    Uuid,
}

impl AtomKind {
    fn name(self) -> &'static str {
        return match self {
            AtomKind::Int => "int",
            AtomKind::Float => "float",
            AtomKind::String => "string",
            AtomKind::Uuid => "uuid",
        };
    }
}

/// A single decoded atom.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Uuid(Uuid),
    Bool(bool),
    Null,
    /// Ends the enclosing op as a header.
    FrameMarker,
    /// Ends the enclosing op as a query.
    QueryMarker,
}

impl Value {
    /// Append the atom text of this value.
    pub fn write_to(&self, out: &mut String) -> Result<()> {
        match self {
            Value::Int(int) => {
                out.push(INT_MARK as char);
                out.push_str(&int.to_string());
            }
            Value::Float(float) => {
                if !float.is_finite() {
                    return Err(Error::UnsupportedValue(format!("non-finite float {float}")));
                }
                out.push(FLOAT_MARK as char);
                // Debug keeps a `.0` or an exponent, so the atom reads back as a float.
                out.push_str(&format!("{float:?}"));
            }
            Value::String(text) => escape_into(text, out)?,
            Value::Uuid(id) => write_uuid(id, out),
            Value::Bool(true) => write_uuid(&Uuid::TRUE, out),
            Value::Bool(false) => write_uuid(&Uuid::FALSE, out),
            Value::Null => write_uuid(&Uuid::NULL, out),
            Value::FrameMarker => out.push(FRAME_MARK as char),
            Value::QueryMarker => out.push(QUERY_MARK as char),
        }
        return Ok(());
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Value {
        return Value::Int(int);
    }
}

impl From<f64> for Value {
    fn from(float: f64) -> Value {
        return Value::Float(float);
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Value {
        return Value::String(text.to_string());
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Value {
        return Value::Bool(flag);
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Value {
        return Value::Uuid(id);
    }
}

fn write_uuid(id: &Uuid, out: &mut String) {
    out.push(UUID_MARK as char);
    id.write_relative(&Uuid::ZERO, out);
}

/// Serialize values, in order, into an atom blob. Nothing is returned
/// unless every value serializes.
pub fn encode(values: &[Value]) -> Result<String> {
    let mut out = String::new();
    for value in values {
        value.write_to(&mut out)?;
    }
    return Ok(out);
}

/// Decode an atom blob into values, in order.
pub fn decode(blob: &str) -> Result<Values> {
    let bytes = blob.as_bytes();
    let mut values = Values::new();
    let mut pos = skip_ws(bytes, 0);
    while pos < bytes.len() {
        let Some((kind, end)) = scan_atom(bytes, pos) else {
            return Err(Error::MalformedAtom {
                kind: "unknown",
                text: blob[pos..].to_string(),
            });
        };
        values.push(decode_atom(kind, &blob[pos..end])?);
        pos = skip_ws(bytes, end);
    }
    return Ok(values);
}

/// Decode one atom, marker included.
fn decode_atom(kind: AtomKind, atom: &str) -> Result<Value> {
    let bad = || Error::MalformedAtom {
        kind: kind.name(),
        text: atom.to_string(),
    };
    let body = &atom[1..];
    match kind {
        AtomKind::Int => return body.parse().map(Value::Int).map_err(|_| bad()),
        AtomKind::Float => return body.parse().map(Value::Float).map_err(|_| bad()),
        AtomKind::String => {
            let inner = &body[..body.len() - 1];
            return unescape(inner).map(Value::String).ok_or_else(bad);
        }
        AtomKind::Uuid => {
            let id = Uuid::parse_relative(body, &Uuid::ZERO)?;
            if id == Uuid::TRUE {
                return Ok(Value::Bool(true));
            }
            if id == Uuid::FALSE {
                return Ok(Value::Bool(false));
            }
            if id == Uuid::NULL {
                return Ok(Value::Null);
            }
            return Ok(Value::Uuid(id));
        }
    }
}

/// Match one atom starting exactly at `pos`, returning its kind and end.
pub(crate) fn scan_atom(bytes: &[u8], pos: usize) -> Option<(AtomKind, usize)> {
    match *bytes.get(pos)? {
        INT_MARK => return scan_int(bytes, pos + 1).map(|end| (AtomKind::Int, end)),
        FLOAT_MARK => return scan_float(bytes, pos + 1).map(|end| (AtomKind::Float, end)),
        STRING_QUOTE => return scan_string(bytes, pos + 1).map(|end| (AtomKind::String, end)),
        UUID_MARK => return Some((AtomKind::Uuid, uuid::scan_token(bytes, pos + 1))),
        _ => return None,
    }
}

fn scan_digits(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    return pos;
}

/// `[+-]?[0-9]+`
fn scan_int(bytes: &[u8], mut pos: usize) -> Option<usize> {
    if matches!(bytes.get(pos), Some(b'+' | b'-')) {
        pos += 1;
    }
    let end = scan_digits(bytes, pos);
    if end == pos {
        return None;
    }
    return Some(end);
}

/// `[+-]?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?`
fn scan_float(bytes: &[u8], pos: usize) -> Option<usize> {
    let mut end = scan_int(bytes, pos)?;
    if bytes.get(end) == Some(&b'.') {
        let fraction = scan_digits(bytes, end + 1);
        if fraction > end + 1 {
            end = fraction;
        }
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        if let Some(exponent) = scan_int(bytes, end + 1) {
            end = exponent;
        }
    }
    return Some(end);
}

/// Everything up to and including the closing quote.
fn scan_string(bytes: &[u8], mut pos: usize) -> Option<usize> {
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            STRING_QUOTE => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    return None;
}

/// Write `text` as a JSON string with the quotes flipped: `'` is escaped
/// and `"` is not.
fn escape_into(text: &str, out: &mut String) -> Result<()> {
    let json = serde_json::to_string(text).map_err(|error| Error::UnsupportedValue(error.to_string()))?;
    let inner = &json[1..json.len() - 1];
    out.push(STRING_QUOTE as char);
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push(STRING_QUOTE as char);
    return Ok(());
}

/// Read the inside of a quoted atom by flipping it back into a JSON string.
fn unescape(text: &str) -> Option<String> {
    let mut json = String::with_capacity(text.len() + 2);
    json.push('"');
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                '\'' => json.push('\''),
                escaped => {
                    json.push('\\');
                    json.push(escaped);
                }
            },
            '"' => json.push_str("\\\""),
            c => json.push(c),
        }
    }
    json.push('"');
    return serde_json::from_str(&json).ok();
}
