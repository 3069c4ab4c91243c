//! Ronframe - replicated operation frames.
//!
//! Replicas exchange *frames*: compact text holding a sequence of ops, each
//! op written relative to the one before it. This crate reads and writes
//! frames and merges diverging frames of one object with a
//! last-write-wins reducer.
//!
//! # Quick Start
//!
//! ```
//! use ronframe::rdt::lww;
//! use ronframe::ron::{Batch, Frame};
//!
//! // Two replicas wrote the same field.
//! let alice = Frame::from("*lww#mice@1+alice!:x=1");
//! let bob = Frame::from("*lww#mice@2+bob!:x=2");
//!
//! // The later write wins.
//! let merged = lww::reduce(&Batch::from(vec![alice, bob])).unwrap();
//! assert_eq!(merged.as_str(), "*lww#mice@2+bob!:x=2,");
//! ```

pub mod error;
pub mod rdt;
pub mod ron;
pub mod stream;

pub use error::Error;
pub use error::Result;
