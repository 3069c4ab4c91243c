//! Streams of frames: splitting, joining, direction-annotated fixtures and
//! grouping by object.
//!
//! Frames in a stream are separated by `.` and a newline. Recorded
//! sessions prefix every frame with a comment op naming the direction the
//! frame travelled in:
//!
//! ```text
//! *~ '>' *db#test@0+user?.
//! *~ '<' *lww#object@time+author!:key'value'.
//! ```

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::Error;
use crate::error::Result;
use crate::ron::Batch;
use crate::ron::Frame;
use crate::ron::Uuid;
use crate::ron::Value;

/// Separates frames in a stream.
pub const FRAME_SEP: &str = ".\n";

/// Split a stream into frames, skipping blank chunks. Each frame's text is
/// exactly its chunk. The last separator may lack its newline.
pub fn split(text: &str) -> Vec<Frame> {
    let text = match text.trim_end().strip_suffix('.') {
        Some(rest) if !text.ends_with(FRAME_SEP) => rest,
        _ => text,
    };
    return text
        .split(FRAME_SEP)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(Frame::from)
        .collect();
}

/// Write frames as a stream, each followed by the separator.
pub fn join<'a>(frames: impl IntoIterator<Item = &'a Frame>) -> String {
    let mut out = String::new();
    for frame in frames {
        out.push_str(frame.as_str());
        out.push_str(FRAME_SEP);
    }
    return out;
}

/// Which way a recorded frame went.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `>`, sent by the client.
    Outgoing,
    /// `<`, received by the client.
    Incoming,
}

impl Direction {
    pub const fn as_char(self) -> char {
        return match self {
            Direction::Outgoing => '>',
            Direction::Incoming => '<',
        };
    }

    pub fn from_mark(mark: &str) -> Option<Direction> {
        return match mark {
            ">" => Some(Direction::Outgoing),
            "<" => Some(Direction::Incoming),
            _ => None,
        };
    }
}

/// A recorded frame with its direction annotation taken off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub direction: Direction,
    /// The frame text after the annotation.
    pub body: String,
}

impl RawFrame {
    pub fn new(direction: Direction, body: impl Into<String>) -> RawFrame {
        return RawFrame {
            direction,
            body: body.into(),
        };
    }

    /// Strip the direction comment off an annotated frame.
    pub fn from_frame(frame: &Frame) -> Result<RawFrame> {
        let cursor = frame.ops();
        let Some(op) = cursor.op() else {
            return Err(Error::MissingAnnotation);
        };
        if !op.is_comment() {
            return Err(Error::MissingAnnotation);
        }
        let direction = match op.value(0)? {
            Some(Value::String(mark)) => Direction::from_mark(&mark),
            _ => None,
        };
        let Some(direction) = direction else {
            return Err(Error::MissingAnnotation);
        };
        let body = &frame.as_str()[cursor.op_text().len()..];
        return Ok(RawFrame::new(direction, body));
    }

    pub fn frame(&self) -> Frame {
        return Frame::from(self.body.as_str());
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "*~ '{}' {}.", self.direction.as_char(), self.body);
    }
}

/// Split an annotated stream into its recorded frames.
pub fn read_annotated(text: &str) -> Result<Vec<RawFrame>> {
    return split(text).iter().map(RawFrame::from_frame).collect();
}

/// Group frames into one batch per object, in the order objects first
/// appear. A frame belongs to the object of its first op; frames without
/// ops are grouped under zero.
pub fn group_by_object(frames: impl IntoIterator<Item = Frame>) -> Vec<Batch> {
    let mut index: FxHashMap<Uuid, usize> = FxHashMap::default();
    let mut batches: Vec<Batch> = Vec::new();
    for frame in frames {
        let object = frame.ops().op().map(|op| op.object).unwrap_or_default();
        let slot = *index.entry(object).or_insert_with(|| {
            batches.push(Batch::new());
            return batches.len() - 1;
        });
        batches[slot].push(frame);
    }
    return batches;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_chunks_byte_for_byte() {
        let frames = split("*lww#a@1+x!:k=1.\n\n*lww#b@2+y! :k=2 .\n");
        let texts: Vec<&str> = frames.iter().map(Frame::as_str).collect();
        assert_eq!(texts, vec!["*lww#a@1+x!:k=1", "\n*lww#b@2+y! :k=2 "]);
    }

    #[test]
    fn split_accepts_a_final_dot_without_newline() {
        let frames = split("*a!.\n*b!.");
        let texts: Vec<&str> = frames.iter().map(Frame::as_str).collect();
        assert_eq!(texts, vec!["*a!", "*b!"]);
    }

    #[test]
    fn join_is_the_inverse_of_split() {
        let text = "*lww#a@1+x!:k=1.\n*lww#b@2+y!:k=2.\n";
        assert_eq!(join(&split(text)), text);
        assert_eq!(join(std::iter::empty()), "");
    }

    #[test]
    fn annotations_are_stripped() {
        let frame = Frame::from("*~ '<' *lww#object@time+author!:key'value'");
        let raw = RawFrame::from_frame(&frame).unwrap();
        assert_eq!(raw.direction, Direction::Incoming);
        assert_eq!(raw.body, "*lww#object@time+author!:key'value'");
        assert_eq!(raw.to_string(), "*~ '<' *lww#object@time+author!:key'value'.");
        assert_eq!(raw.frame().ops().count(), 2);
    }

    #[test]
    fn unannotated_frames_are_rejected() {
        assert_eq!(RawFrame::from_frame(&Frame::from("*lww#a!")), Err(Error::MissingAnnotation));
        assert_eq!(RawFrame::from_frame(&Frame::from("*~ '^' *lww#a!")), Err(Error::MissingAnnotation));
        assert_eq!(RawFrame::from_frame(&Frame::from("*~ =1 *lww#a!")), Err(Error::MissingAnnotation));
        assert_eq!(RawFrame::from_frame(&Frame::new()), Err(Error::MissingAnnotation));
    }

    #[test]
    fn frames_group_by_first_object() {
        let frames = split("*lww#b@1+x!:k=1.\n*lww#a@1+x!:k=1.\n*lww#b@2+y!:k=2.\n");
        let groups = group_by_object(frames);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 1);
        assert_eq!(groups[1].frames()[0].as_str(), "*lww#a@1+x!:k=1");
    }
}
