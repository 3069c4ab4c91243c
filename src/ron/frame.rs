//! Frames: append-only text buffers of ops, and batches of frames.

use std::fmt;

use tracing::debug;

use super::cursor::Cursor;
use super::op::Op;
use super::op::Position;
use super::op::Term;
use super::uuid::Uuid;
use crate::error::Error;
use crate::error::Result;

/// A frame: ops written one after another, each relative to the one
/// before it.
///
/// The text is the frame. Iterating re-scans it, so what comes out is
/// always exactly what the text says.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    body: String,
    /// The last op in `body`, the context for the next push.
    last: Op<'static>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Frame {
        return Frame::default();
    }

    /// Take over existing frame text, failing if it does not scan cleanly.
    pub fn parse(text: impl Into<String>) -> Result<Frame> {
        let body = text.into();
        let mut cursor = Cursor::new(&body);
        let mut last = None;
        for op in cursor.by_ref() {
            last = Some(op);
        }
        cursor.finish()?;
        let last = last.map(Op::into_owned).unwrap_or_default();
        return Ok(Frame { body, last });
    }

    pub fn as_str(&self) -> &str {
        return &self.body;
    }

    pub fn into_string(self) -> String {
        return self.body;
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        return self.body.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.body.is_empty();
    }

    /// The last op pushed (or scanned, for frames built from text).
    pub fn last(&self) -> &Op<'static> {
        return &self.last;
    }

    /// Append an op, written relative to the last one.
    pub fn push(&mut self, op: &Op<'_>) {
        if self.last.is_comment() {
            self.last = Op::ZERO;
        }
        op.write_to(&self.last, &mut self.body);
        self.last = op.clone().into_owned();
    }

    /// Append an op with its terminator replaced.
    pub fn push_with_term(&mut self, op: &Op<'_>, term: Term) {
        self.push(&op.with_term(term));
    }

    /// Scan the ops of this frame from the start.
    pub fn ops(&self) -> Cursor<'_> {
        return Cursor::new(&self.body);
    }

    /// All ops, or the error that stopped the scan.
    pub fn try_ops(&self) -> Result<Vec<Op<'_>>> {
        let mut cursor = self.ops();
        let ops: Vec<Op<'_>> = cursor.by_ref().collect();
        cursor.finish()?;
        return Ok(ops);
    }

    /// Rewrite every uuid of every op. `substitute` sees the uuid, its
    /// position, the index of its op and the op itself, and returns a
    /// replacement or `None` to keep it.
    ///
    /// The frame is rebuilt from scratch so that compression stays right.
    /// A frame that does not scan cleanly is left untouched.
    pub fn map_uuids<F>(&mut self, mut substitute: F) -> Result<()>
    where
        F: FnMut(Uuid, Position, usize, &Op<'_>) -> Option<Uuid>,
    {
        let mut rebuilt = Frame::new();
        let mut replaced = 0;
        let mut cursor = self.ops();
        for (index, op) in cursor.by_ref().enumerate() {
            let mut uuids = op.uuids();
            for position in Position::ALL {
                if let Some(uuid) = substitute(uuids[position.index()], position, index, &op) {
                    uuids[position.index()] = uuid;
                    replaced += 1;
                }
            }
            let [kind, object, event, location] = uuids;
            rebuilt.push(&Op::new(kind, object, event, location, op.values.as_ref(), op.term));
        }
        cursor.finish()?;
        debug!(replaced, "rewrote frame uuids");
        *self = rebuilt;
        return Ok(());
    }
}

/// Cut `[from, till)` out of a frame: the op under `from`, written in
/// full, then the raw text up to `till` (or to the end when `till` is at
/// the end). The ops after the first keep their compression.
pub fn slice(from: &Cursor<'_>, till: &Cursor<'_>) -> Result<String> {
    if !std::ptr::eq(from.body(), till.body()) {
        return Err(Error::ForeignCursor);
    }
    let Some(first) = from.op() else {
        return Ok(String::new());
    };
    let body = from.body();
    let start = from.offset() + from.op_text().len();
    let end = if till.is_end() { body.len() } else { till.offset().max(start) };
    let mut out = first.serialize(&Op::ZERO);
    out.push_str(&body[start..end]);
    return Ok(out);
}

impl From<String> for Frame {
    /// Take over frame text as is. Text that does not scan cleanly is kept;
    /// the last op that did scan becomes the context for pushes.
    fn from(body: String) -> Frame {
        let last = Cursor::new(&body).last().map(Op::into_owned).unwrap_or_default();
        return Frame { body, last };
    }
}

impl From<&str> for Frame {
    fn from(body: &str) -> Frame {
        return Frame::from(body.to_string());
    }
}

impl<'a> IntoIterator for &'a Frame {
    type Item = Op<'a>;
    type IntoIter = Cursor<'a>;

    fn into_iter(self) -> Cursor<'a> {
        return self.ops();
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.body);
    }
}

/// Frames describing the same object, possibly from diverging replicas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    frames: Vec<Frame>,
}

impl Batch {
    pub fn new() -> Batch {
        return Batch::default();
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        return self.frames.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.frames.is_empty();
    }

    pub fn frames(&self) -> &[Frame] {
        return &self.frames;
    }

    pub fn last(&self) -> Option<&Frame> {
        return self.frames.last();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        return self.frames.iter();
    }
}

impl From<Vec<Frame>> for Batch {
    fn from(frames: Vec<Frame>) -> Batch {
        return Batch { frames };
    }
}

impl FromIterator<Frame> for Batch {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Batch {
        return Batch {
            frames: iter.into_iter().collect(),
        };
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        return self.frames.iter();
    }
}
