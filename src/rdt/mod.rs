//! Replicated data types: reducers that merge frames of one object.

pub mod heap;
pub mod lww;

use crate::error::Error;
use crate::error::Result;
use crate::ron::Batch;
use crate::ron::Frame;
use crate::ron::Uuid;

/// A reducer merges a batch of frames describing one object into a single
/// frame. Reduction is commutative, associative, and idempotent.
pub trait Reducer {
    /// The type id of the objects this reducer understands.
    fn kind(&self) -> Uuid;

    /// Merge all frames of `batch`.
    fn reduce(&self, batch: &Batch) -> Result<Frame>;
}

/// The last-write-wins reducer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lww;

impl Reducer for Lww {
    fn kind(&self) -> Uuid {
        return lww::TYPE;
    }

    fn reduce(&self, batch: &Batch) -> Result<Frame> {
        return lww::reduce(batch);
    }
}

static REDUCERS: [&(dyn Reducer + Sync); 1] = [&Lww];

/// Look up the reducer for objects of type `kind`.
pub fn reducer_for(kind: Uuid) -> Result<&'static dyn Reducer> {
    for reducer in REDUCERS {
        if reducer.kind() == kind {
            return Ok(reducer);
        }
    }
    return Err(Error::UnknownReducer(kind.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lww_is_registered() {
        let reducer = reducer_for(lww::TYPE).unwrap();
        assert_eq!(reducer.kind(), lww::TYPE);
        let batch: Batch = vec![Frame::from("*lww#a@1+x!:k=1"), Frame::from("*lww#a@2+y!:k=2")].into_iter().collect();
        assert_eq!(reducer.reduce(&batch).unwrap().as_str(), "*lww#a@2+y!:k=2,");
    }

    #[test]
    fn unknown_types_are_an_error() {
        let kind = Uuid::name("rga");
        assert_eq!(reducer_for(kind).err(), Some(Error::UnknownReducer("rga".to_string())));
    }
}
