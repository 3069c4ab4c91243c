//! A k-way merge over the ops of several frames.
//!
//! Each frame contributes one run: its mergeable ops, sorted by the heap's
//! comparators. Frames may list their keys in any order. The heap keeps the
//! runs ordered by their least op, so popping yields ops from all frames in
//! one sorted stream.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::error::Result;
use crate::ron::Cursor;
use crate::ron::Frame;
use crate::ron::Op;

/// Orders two ops.
pub type Comparator = fn(&Op<'_>, &Op<'_>) -> Ordering;

/// Groups writes to the same key together, keys ascending.
pub fn ref_order(a: &Op<'_>, b: &Op<'_>) -> Ordering {
    return a.key().cmp(&b.key());
}

/// Newest event first. Exact event ties fall back to the value blob and
/// then the terminator, so that the order is total.
pub fn event_order_desc(a: &Op<'_>, b: &Op<'_>) -> Ordering {
    return b
        .event
        .cmp(&a.event)
        .then_with(|| a.values.cmp(&b.values))
        .then_with(|| a.term.cmp(&b.term));
}

/// Only regular ops take part in a merge; headers, queries and comments
/// are skipped.
fn is_mergeable(op: &Op<'_>) -> bool {
    return op.is_regular() && !op.is_comment();
}

struct Entry<'a> {
    /// Sorted greatest first, so the least op is at the end.
    run: Vec<Op<'a>>,
    primary: Comparator,
    secondary: Comparator,
}

impl<'a> Entry<'a> {
    fn op(&self) -> Option<&Op<'a>> {
        return self.run.last();
    }

    fn order(&self, other: &Self) -> Ordering {
        match (self.op(), other.op()) {
            (Some(a), Some(b)) => return (self.primary)(a, b).then_with(|| (self.secondary)(a, b)),
            _ => return Ordering::Equal,
        }
    }
}

impl Ord for Entry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: `BinaryHeap` pops the greatest entry, we want the least op.
        return other.order(self);
    }
}

impl PartialOrd for Entry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        return self.order(other) == Ordering::Equal;
    }
}

impl Eq for Entry<'_> {}

/// Merges the regular ops of several frames by a primary and a secondary
/// comparator.
///
/// A heap borrows the text of its frames and shares nothing between merges;
/// make a new one for every merge.
pub struct MergeHeap<'a> {
    heap: BinaryHeap<Entry<'a>>,
    primary: Comparator,
    secondary: Comparator,
}

impl<'a> MergeHeap<'a> {
    pub fn new(primary: Comparator, secondary: Comparator) -> MergeHeap<'a> {
        return MergeHeap {
            heap: BinaryHeap::new(),
            primary,
            secondary,
        };
    }

    /// Add the mergeable ops left in a cursor as one run. A cursor that
    /// runs into corrupt text fails the put and adds nothing.
    pub fn put(&mut self, mut cursor: Cursor<'a>) -> Result<()> {
        let mut run: Vec<Op<'a>> = cursor.by_ref().filter(is_mergeable).collect();
        cursor.finish()?;
        if run.is_empty() {
            return Ok(());
        }
        let (primary, secondary) = (self.primary, self.secondary);
        run.sort_by(|a, b| primary(b, a).then_with(|| secondary(b, a)));
        self.heap.push(Entry {
            run,
            primary,
            secondary,
        });
        return Ok(());
    }

    pub fn put_frame(&mut self, frame: &'a Frame) -> Result<()> {
        return self.put(frame.ops());
    }

    /// The least op across all frames.
    pub fn current(&self) -> Option<&Op<'a>> {
        return self.heap.peek().and_then(Entry::op);
    }

    /// Remove and return the least op.
    pub fn pop(&mut self) -> Result<Option<Op<'a>>> {
        let Some(mut entry) = self.heap.pop() else {
            return Ok(None);
        };
        let op = entry.run.pop();
        if !entry.run.is_empty() {
            self.heap.push(entry);
        }
        return Ok(op);
    }

    /// Remove every op that is equal to the least one by the primary
    /// comparator, and return the least of them by the secondary one.
    pub fn take_prim(&mut self) -> Result<Option<Op<'a>>> {
        let Some(mut best) = self.pop()? else {
            return Ok(None);
        };
        loop {
            let Some(next) = self.current() else {
                break;
            };
            if (self.primary)(next, &best) != Ordering::Equal {
                break;
            }
            let Some(next) = self.pop()? else {
                break;
            };
            if (self.secondary)(&next, &best) == Ordering::Less {
                trace!(key = ?best.key(), shadowed = ?best.event, by = ?next.event, "shadowed write");
                best = next;
            } else {
                trace!(key = ?next.key(), shadowed = ?next.event, by = ?best.event, "shadowed write");
            }
        }
        return Ok(Some(best));
    }

    pub fn len(&self) -> usize {
        return self.heap.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.heap.is_empty();
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
