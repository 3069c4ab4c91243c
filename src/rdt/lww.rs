//! Last-write-wins: for every key, the write with the greatest event wins.

use tracing::debug;
use tracing::warn;

use super::heap::MergeHeap;
use super::heap::event_order_desc;
use super::heap::ref_order;
use crate::error::Result;
use crate::ron::Batch;
use crate::ron::Frame;
use crate::ron::Op;
use crate::ron::Term;
use crate::ron::Uuid;

/// The type id of LWW objects.
pub const TYPE: Uuid = Uuid::name("lww");

/// Location of a reduced header that carries a partial state.
pub const DELTA: Uuid = Uuid::name("d");

/// Reduce a batch of frames describing one LWW object into one frame.
///
/// The result is a header followed by the winning write of every key, in
/// key order, each terminated with `,`. A batch of one frame is returned as
/// is. Input frames may list their writes in any order and may write a key
/// more than once.
pub fn reduce(batch: &Batch) -> Result<Frame> {
    let mut result = Frame::new();
    if batch.len() == 1 {
        if let Some(frame) = batch.last() {
            return Ok(frame.clone());
        }
    }
    // The header is modelled on the first op of the batch.
    let Some(first) = batch.iter().find_map(|frame| frame.ops().op().cloned()) else {
        return Ok(result);
    };

    // The event comes from the first op of the last frame, not from the
    // newest write.
    let event = batch
        .last()
        .and_then(|frame| frame.ops().op().map(|op| op.event))
        .unwrap_or(first.event);
    let location = if first.is_header() && first.location.is_zero() {
        Uuid::ZERO
    } else {
        DELTA
    };
    result.push(&Op::new(TYPE, first.object, event, location, "", Term::Header));

    let mut heap = MergeHeap::new(ref_order, event_order_desc);
    for (index, frame) in batch.iter().enumerate() {
        if let Err(error) = heap.put_frame(frame) {
            warn!(index, %error, "corrupt frame in lww batch");
            return Err(error);
        }
    }

    let mut keys = 0;
    while let Some(op) = heap.take_prim()? {
        result.push_with_term(&op, Term::Continuation);
        keys += 1;
    }
    debug!(frames = batch.len(), keys, object = %first.object, "reduced lww batch");
    return Ok(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn uuid(text: &str) -> Uuid {
        return text.parse().unwrap();
    }

    fn batch(frames: &[&str]) -> Batch {
        return frames.iter().map(|text| Frame::from(*text)).collect();
    }

    #[test]
    fn empty_batch_reduces_to_an_empty_frame() {
        assert_eq!(reduce(&Batch::new()).unwrap(), Frame::new());
        assert_eq!(reduce(&batch(&["", " "])).unwrap(), Frame::new());
    }

    #[test]
    fn single_frame_is_returned_unchanged() {
        let single = batch(&["*lww#mice@1+a!:y=2:x=1"]);
        assert_eq!(reduce(&single).unwrap().as_str(), "*lww#mice@1+a!:y=2:x=1");
    }

    #[test]
    fn newest_write_wins() {
        let reduced = reduce(&batch(&["*lww#mice@1+a!:x=1", "*lww#mice@2+b!:x=2"])).unwrap();
        assert_eq!(reduced.as_str(), "*lww#mice@2+b!:x=2,");
    }

    #[test]
    fn unsorted_frames_keep_one_write_per_key() {
        let reduced = reduce(&batch(&["*lww#obj@1+a!:y=1:x=1", "*lww#obj@2+b!:x=2:y=2"])).unwrap();
        assert_eq!(reduced.as_str(), "*lww#obj@2+b!:x=2,:y=2,");

        let repeated = reduce(&batch(&["*lww#obj@1+a!:x=1:y=1@2+a:x=2", "*lww#obj@1+b!"])).unwrap();
        let writes: Vec<_> = repeated
            .ops()
            .filter(|op| op.is_regular())
            .map(|op| (op.location, op.values.into_owned()))
            .collect();
        assert_eq!(writes, vec![(uuid("x"), "=2".to_string()), (uuid("y"), "=1".to_string())]);
    }

    #[test]
    fn header_event_comes_from_the_last_frame() {
        let reduced = reduce(&batch(&["*lww#mice@2+b!:x=2", "*lww#mice@1+a!:x=1"])).unwrap();
        let ops = reduced.try_ops().unwrap();
        assert_eq!(ops[0].event, uuid("1+a"));
        assert_eq!(ops[1].values, "=2");
        assert_eq!(ops[1].event, uuid("2+b"));
    }

    #[test]
    fn header_location_depends_on_the_first_op() {
        let zero = reduce(&batch(&["*lww#mice@1+a!:x=1", "*lww#mice@2+b!:x=2"])).unwrap();
        assert_eq!(zero.ops().op().map(|op| op.location), Some(Uuid::ZERO));

        let delta = reduce(&batch(&["*lww#mice@1+a:d!:x=1", "*lww#mice@2+b!:x=2"])).unwrap();
        assert_eq!(delta.ops().op().map(|op| op.location), Some(DELTA));

        let headless = reduce(&batch(&["*lww#mice@1+a:x=1", "*lww#mice@2+b:x=2"])).unwrap();
        assert_eq!(headless.as_str(), "*lww#mice@2+b:d!:x=2,");
    }

    #[test]
    fn corrupt_frames_are_reported() {
        let result = reduce(&batch(&["*lww#mice@1+a!:x=1", "*lww#mice@2+b! }{"]));
        assert_eq!(result, Err(Error::MalformedOp { offset: 15 }));
    }

    #[test]
    fn reduced_frames_reduce_again() {
        let once = reduce(&batch(&["*lww#mice@1+a!:x=1:y=1", "*lww#mice@2+b!:y=2"])).unwrap();
        let twice = reduce(&Batch::from(vec![once.clone(), Frame::from("*lww#mice@3+c!:x=3")])).unwrap();
        let winners: Vec<_> = twice
            .ops()
            .filter(|op| op.is_regular())
            .map(|op| (op.location, op.values.into_owned()))
            .collect();
        assert_eq!(winners, vec![(uuid("x"), "=3".to_string()), (uuid("y"), "=2".to_string())]);
    }
}
