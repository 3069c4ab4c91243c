//! The replicated object notation: uuids, ops, cursors and frames.
//!
//! Data flows one way through this module: frame text is scanned by a
//! `Cursor` into borrowed `Op`s, and ops are pushed into a `Frame`, which
//! writes each one relative to the op before it.

pub mod atom;
pub mod cursor;
pub mod frame;
pub mod op;
pub mod uuid;

pub use atom::Value;
pub use atom::Values;
pub use cursor::Cursor;
pub use frame::Batch;
pub use frame::Frame;
pub use frame::slice;
pub use op::Key;
pub use op::Op;
pub use op::Position;
pub use op::Term;
pub use uuid::Scheme;
pub use uuid::Uuid;
pub use uuid::Word;

/// Skip ASCII whitespace starting at `pos`.
#[inline]
pub(crate) fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    return pos;
}
