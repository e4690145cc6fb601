//! Byte-range streaming pipeline.
//!
//! The three stages of a stream response, in order:
//!
//! - [`range`] turns the `Range` header (or its absence) plus the object
//!   size into a validated inclusive byte interval.
//! - [`chunks`] aligns that interval to the store's fixed chunk grid and
//!   produces the lazy byte stream.
//! - [`response`] assembles status and headers and attaches the stream as
//!   the body.

pub mod chunks;
pub mod range;
pub mod response;

pub use chunks::{chunk_stream, ChunkPlan};
pub use range::{resolve, ByteInterval, RangeError, ResolvedRange};
