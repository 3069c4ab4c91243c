//! Ops: four uuids, a blob of value atoms and a terminator.
//!
//! An op is written relative to a context op, normally the op right before
//! it in the same frame. Each uuid is preceded by its field marker and is
//! skipped entirely when it equals the context's uuid in the same position:
//!
//! ```text
//! *lww#mice@1ABC+gritzko!      header, every field written
//! :x=1                         kind, object and event come from the header
//! :y=2
//! ```
//!
//! A comment op (kind `~`) carries free text. It is always written and read
//! against the zero op, and the op after a comment is too.

use std::borrow::Cow;
use std::fmt;

use super::atom;
use super::atom::Value;
use super::atom::Values;
use super::skip_ws;
use super::uuid;
use super::uuid::Uuid;
use crate::error::Error;
use crate::error::Result;

/// Field markers for kind, object, event and location, in that order.
pub const MARKERS: [u8; 4] = *b"*#@:";

/// How an op ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// `;`, the default; never written unless the op would be empty.
    #[default]
    Regular,
    /// `!`, declares the defaults for an object.
    Header,
    /// `?`, a read or subscription.
    Query,
    /// `,`, more of the same reduction follows.
    Continuation,
}

impl Term {
    pub const fn as_char(self) -> char {
        return match self {
            Term::Regular => ';',
            Term::Header => '!',
            Term::Query => '?',
            Term::Continuation => ',',
        };
    }

    pub const fn from_byte(byte: u8) -> Option<Term> {
        return match byte {
            b';' => Some(Term::Regular),
            b'!' => Some(Term::Header),
            b'?' => Some(Term::Query),
            b',' => Some(Term::Continuation),
            _ => None,
        };
    }
}

/// One of the four uuid slots of an op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    Kind,
    Object,
    Event,
    Location,
}

impl Position {
    pub const ALL: [Position; 4] = [Position::Kind, Position::Object, Position::Event, Position::Location];

    pub const fn index(self) -> usize {
        return self as usize;
    }

    pub const fn marker(self) -> char {
        return MARKERS[self as usize] as char;
    }
}

impl TryFrom<usize> for Position {
    type Error = Error;

    fn try_from(index: usize) -> Result<Position> {
        return Position::ALL.get(index).copied().ok_or(Error::PositionOutOfRange(index));
    }
}

/// What an op writes to: competing writes share a key and differ by event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    pub kind: Uuid,
    pub object: Uuid,
    pub location: Uuid,
}

/// A single operation.
///
/// Parsed ops borrow their value blob from the frame text; `into_owned`
/// detaches them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Op<'a> {
    pub kind: Uuid,
    pub object: Uuid,
    pub event: Uuid,
    pub location: Uuid,
    /// Serialized value atoms.
    pub values: Cow<'a, str>,
    pub term: Term,
}

impl Op<'static> {
    /// The context of the first op in a frame, and of any op after a comment.
    pub const ZERO: Op<'static> = Op {
        kind: Uuid::ZERO,
        object: Uuid::ZERO,
        event: Uuid::ZERO,
        location: Uuid::ZERO,
        values: Cow::Borrowed(""),
        term: Term::Regular,
    };

    /// Stands in for an op that failed to parse.
    pub const ERROR: Op<'static> = Op {
        kind: Uuid::ERROR,
        object: Uuid::ERROR,
        event: Uuid::ERROR,
        location: Uuid::ERROR,
        values: Cow::Borrowed(">parseerror"),
        term: Term::Regular,
    };

    /// Build an op from typed values.
    ///
    /// A trailing `FrameMarker` or `QueryMarker` becomes the op's terminator,
    /// overriding `term`. A marker anywhere else is unsupported: it would
    /// end the op in the middle of its values.
    pub fn with_values(
        kind: Uuid,
        object: Uuid,
        event: Uuid,
        location: Uuid,
        values: &[Value],
        term: Term,
    ) -> Result<Op<'static>> {
        let (values, term) = match values.split_last() {
            Some((Value::FrameMarker, rest)) => (rest, Term::Header),
            Some((Value::QueryMarker, rest)) => (rest, Term::Query),
            _ => (values, term),
        };
        if let Some(marker) = values.iter().find(|value| matches!(value, Value::FrameMarker | Value::QueryMarker)) {
            return Err(Error::UnsupportedValue(format!("{marker:?} before the last value")));
        }
        let blob = atom::encode(values)?;
        return Ok(Op::new(kind, object, event, location, blob, term));
    }
}

impl<'a> Op<'a> {
    /// Build an op from an already serialized value blob. The blob is
    /// trusted to be a valid sequence of atoms.
    pub fn new(
        kind: Uuid,
        object: Uuid,
        event: Uuid,
        location: Uuid,
        values: impl Into<Cow<'a, str>>,
        term: Term,
    ) -> Op<'a> {
        return Op {
            kind,
            object,
            event,
            location,
            values: values.into(),
            term,
        };
    }

    pub fn uuids(&self) -> [Uuid; 4] {
        return [self.kind, self.object, self.event, self.location];
    }

    pub fn uuid(&self, position: Position) -> Uuid {
        return self.uuids()[position.index()];
    }

    pub fn uuid_at(&self, index: usize) -> Result<Uuid> {
        return Ok(self.uuid(Position::try_from(index)?));
    }

    pub fn key(&self) -> Key {
        return Key {
            kind: self.kind,
            object: self.object,
            location: self.location,
        };
    }

    /// The same op with another terminator.
    pub fn with_term(&self, term: Term) -> Op<'a> {
        return Op {
            term,
            ..self.clone()
        };
    }

    pub fn is_header(&self) -> bool {
        return self.term == Term::Header;
    }

    pub fn is_query(&self) -> bool {
        return self.term == Term::Query;
    }

    /// Neither a header nor a query. Continuations are regular.
    pub fn is_regular(&self) -> bool {
        return !self.is_header() && !self.is_query();
    }

    pub fn is_comment(&self) -> bool {
        return self.kind == Uuid::COMMENT;
    }

    pub fn is_error(&self) -> bool {
        return self.event == Uuid::ERROR;
    }

    /// Decode all value atoms.
    pub fn atoms(&self) -> Result<Values> {
        return atom::decode(&self.values);
    }

    /// Decode the value atom at `index`, if there is one.
    pub fn value(&self, index: usize) -> Result<Option<Value>> {
        let mut atoms = self.atoms()?;
        if index >= atoms.len() {
            return Ok(None);
        }
        return Ok(Some(atoms.swap_remove(index)));
    }

    pub fn into_owned(self) -> Op<'static> {
        return Op {
            kind: self.kind,
            object: self.object,
            event: self.event,
            location: self.location,
            values: Cow::Owned(self.values.into_owned()),
            term: self.term,
        };
    }

    /// Append the text of this op relative to `ctx`, the op written right
    /// before it.
    pub fn write_to(&self, ctx: &Op<'_>, out: &mut String) {
        let context = if self.is_comment() { Op::ZERO.uuids() } else { ctx.uuids() };
        let uuids = self.uuids();
        let first = (0..4).find(|&i| uuids[i] != context[i]);

        // Without a terminator the previous op may still be open: atoms or
        // later fields would extend it instead of starting a new op. An
        // empty kind field (the context kind) always starts a new op.
        let open = ctx.term == Term::Regular;
        let fuses = match first {
            None => true,
            Some(0) => false,
            Some(_) => ctx.values.is_empty(),
        };
        if open && fuses {
            out.push(MARKERS[0] as char);
        } else if first.is_none() && self.values.is_empty() && self.term == Term::Regular {
            out.push(Term::Regular.as_char());
        }

        for i in 0..4 {
            if uuids[i] == context[i] {
                continue;
            }
            out.push(MARKERS[i] as char);
            uuids[i].write_relative(&context[i], out);
        }
        out.push_str(&self.values);
        if self.term != Term::Regular {
            out.push(self.term.as_char());
        }
    }

    /// The text of this op relative to `ctx`.
    pub fn serialize(&self, ctx: &Op<'_>) -> String {
        let mut out = String::new();
        self.write_to(ctx, &mut out);
        return out;
    }

    /// Match one op starting exactly at `offset` of `body`, resolving
    /// skipped fields against `ctx`.
    ///
    /// Returns the op and the length of its text, surrounding whitespace
    /// included, or `None` when nothing at `offset` looks like an op. A
    /// malformed uuid inside an otherwise matching op is an error.
    pub fn parse(body: &'a str, ctx: &Op<'_>, offset: usize) -> Result<Option<(Op<'a>, usize)>> {
        let bytes = body.as_bytes();
        if offset > bytes.len() {
            return Ok(None);
        }
        let mut context = ctx.uuids();
        let mut uuids = context;
        let mut pos = skip_ws(bytes, offset);
        let mut next = 0;
        let mut matched = false;

        while pos < bytes.len() {
            let Some(index) = MARKERS.iter().position(|&m| m == bytes[pos]) else {
                break;
            };
            if index < next {
                break;
            }
            let start = skip_ws(bytes, pos + 1);
            let end = uuid::scan_token(bytes, start);
            let id = Uuid::parse_relative(&body[start..end], &context[index])?;
            if index == 0 && id == Uuid::COMMENT {
                context = Op::ZERO.uuids();
                uuids = context;
            }
            uuids[index] = id;
            next = index + 1;
            matched = true;
            pos = skip_ws(bytes, end);
        }

        let values_start = pos;
        let mut values_end = pos;
        while let Some((_, end)) = atom::scan_atom(bytes, pos) {
            values_end = end;
            pos = skip_ws(bytes, end);
        }

        let mut term = Term::Regular;
        if let Some(found) = bytes.get(pos).and_then(|&b| Term::from_byte(b)) {
            term = found;
            matched = true;
            pos = skip_ws(bytes, pos + 1);
        }

        if !matched && values_end == values_start {
            return Ok(None);
        }
        let [kind, object, event, location] = uuids;
        let op = Op::new(kind, object, event, location, &body[values_start..values_end], term);
        return Ok(Some((op, pos - offset)));
    }
}

impl Default for Op<'_> {
    fn default() -> Self {
        return Op::ZERO;
    }
}

impl fmt::Display for Op<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.serialize(&Op::ZERO));
    }
}
