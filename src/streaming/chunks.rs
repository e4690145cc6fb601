//! Chunk-alignment arithmetic and the lazy chunk stream producer.
//!
//! The store serves objects in fixed-size chunks addressed by index. A
//! byte interval rarely starts or ends on a chunk boundary, so the first
//! and last fetched chunks are trimmed; interior chunks pass through
//! untouched.

use crate::store::{ChunkPayload, ObjectDescriptor, StreamAdapter};
use bytes::Bytes;
use futures::Stream;
use std::sync::Arc;

use super::range::ByteInterval;

/// Fetch plan for one byte interval over the chunk grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub chunk_size: u64,
    /// Index of the first chunk to fetch.
    pub first_chunk_index: u64,
    /// Bytes to discard from the front of the first fetched chunk.
    pub first_part_cut: u64,
    /// Bytes to keep from the front of the last fetched chunk.
    pub last_part_cut: u64,
    /// Number of chunks to fetch, partial first/last included.
    pub part_count: u64,
    /// Total bytes the stream must emit.
    pub req_length: u64,
}

impl ChunkPlan {
    pub fn new(interval: ByteInterval, chunk_size: u64) -> Self {
        let first_chunk_index = interval.from / chunk_size;
        let last_chunk_index = interval.until / chunk_size;
        Self {
            chunk_size,
            first_chunk_index,
            first_part_cut: interval.from % chunk_size,
            last_part_cut: interval.until % chunk_size + 1,
            part_count: last_chunk_index - first_chunk_index + 1,
            req_length: interval.byte_len(),
        }
    }

    /// Byte range to keep from the fetched chunk at position `part`
    /// (0-based within the plan), assuming a full-length chunk.
    fn keep_range(&self, part: u64) -> (u64, u64) {
        let start = if part == 0 { self.first_part_cut } else { 0 };
        let end = if part == self.part_count - 1 {
            self.last_part_cut
        } else {
            self.chunk_size
        };
        (start, end)
    }
}

/// Produce the lazy ordered byte stream for one resolved interval.
///
/// Chunks are fetched strictly in ascending index order through the given
/// worker adapter. The stream is finite and not restartable. A short read,
/// an early end-of-object, or a store error terminates it before
/// `req_length` bytes have been emitted; the truncation is logged and the
/// body simply ends, since the headers are already committed.
pub fn chunk_stream(
    adapter: Arc<StreamAdapter>,
    descriptor: ObjectDescriptor,
    plan: ChunkPlan,
) -> impl Stream<Item = Bytes> + Send {
    struct State {
        adapter: Arc<StreamAdapter>,
        descriptor: ObjectDescriptor,
        plan: ChunkPlan,
        part: u64,
        done: bool,
    }

    let state = State {
        adapter,
        descriptor,
        plan,
        part: 0,
        done: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        if st.done || st.part >= st.plan.part_count {
            return None;
        }

        let index = st.plan.first_chunk_index + st.part;
        let chunk = match st
            .adapter
            .fetch_chunk(&st.descriptor, index, st.plan.chunk_size)
            .await
        {
            Ok(ChunkPayload::Data(chunk)) => chunk,
            Ok(ChunkPayload::End) => {
                tracing::warn!(
                    object = %st.descriptor.object,
                    part = st.part,
                    expected_parts = st.plan.part_count,
                    "object ended before the requested interval was served"
                );
                return None;
            }
            Err(err) => {
                tracing::warn!(
                    object = %st.descriptor.object,
                    part = st.part,
                    error = %err,
                    "chunk fetch failed mid-stream, truncating body"
                );
                return None;
            }
        };

        let (start, end) = st.plan.keep_range(st.part);
        let available = chunk.len() as u64;
        if end > available {
            // Short read: emit whatever falls inside the window, then stop.
            tracing::warn!(
                object = %st.descriptor.object,
                part = st.part,
                expected = end,
                got = available,
                "short chunk read, truncating body"
            );
            st.done = true;
        }

        let start = start.min(available) as usize;
        let end = end.min(available) as usize;
        if start >= end {
            return None;
        }

        let piece = chunk.slice(start..end);
        st.part += 1;
        Some((piece, st))
    })
}
