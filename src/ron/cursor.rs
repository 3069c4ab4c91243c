//! Incremental scanning of frame text.

use tracing::trace;

use super::op::Op;
use super::skip_ws;
use crate::error::Error;
use crate::error::Result;

/// A forward-only scanner over the ops of one frame.
///
/// A cursor is positioned at an op until the text runs out, or until the
/// text at the current offset is not an op. The second case is recorded and
/// can be told apart from a clean end with `error()` or `finish()`. A
/// cursor never skips bytes to find the next op.
///
/// Cloning a cursor is cheap: clones share the text and continue from the
/// same position independently.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    body: &'a str,
    offset: usize,
    /// Length of the current op's text.
    length: usize,
    op: Option<Op<'a>>,
    /// Context for the next op: the current op, or zero after a comment.
    ctx: Op<'a>,
    error: Option<Error>,
}

impl<'a> Cursor<'a> {
    /// Start scanning `body`, positioned at its first op.
    pub fn new(body: &'a str) -> Cursor<'a> {
        let mut cursor = Cursor {
            body,
            offset: 0,
            length: 0,
            op: None,
            ctx: Op::ZERO,
            error: None,
        };
        cursor.step();
        return cursor;
    }

    /// The text being scanned.
    pub fn body(&self) -> &'a str {
        return self.body;
    }

    /// Offset of the current op.
    pub fn offset(&self) -> usize {
        return self.offset;
    }

    /// The current op, or `None` at the end of the sequence.
    pub fn op(&self) -> Option<&Op<'a>> {
        return self.op.as_ref();
    }

    /// The source text of the current op, whitespace included.
    pub fn op_text(&self) -> &'a str {
        return &self.body[self.offset..self.offset + self.length];
    }

    /// Why the sequence ended early, if it did.
    pub fn error(&self) -> Option<&Error> {
        return self.error.as_ref();
    }

    pub fn is_end(&self) -> bool {
        return self.op.is_none();
    }

    /// `Ok` unless the scan stopped on corrupt text.
    pub fn finish(&self) -> Result<()> {
        match &self.error {
            Some(error) => return Err(error.clone()),
            None => return Ok(()),
        }
    }

    /// Move to the next op and return it.
    pub fn advance(&mut self) -> Option<&Op<'a>> {
        self.step();
        return self.op.as_ref();
    }

    fn step(&mut self) {
        self.offset += self.length;
        self.length = 0;
        self.op = None;
        if self.error.is_some() || skip_ws(self.body.as_bytes(), self.offset) == self.body.len() {
            return;
        }
        match Op::parse(self.body, &self.ctx, self.offset) {
            Ok(Some((op, length))) => {
                self.ctx = if op.is_comment() { Op::ZERO } else { op.clone() };
                self.length = length;
                self.op = Some(op);
            }
            Ok(None) => {
                trace!(offset = self.offset, "no op matches");
                self.error = Some(Error::MalformedOp { offset: self.offset });
            }
            Err(error) => {
                trace!(offset = self.offset, %error, "op does not parse");
                self.error = Some(error);
            }
        }
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = Op<'a>;

    fn next(&mut self) -> Option<Op<'a>> {
        let op = self.op.take()?;
        self.step();
        return Some(op);
    }
}
