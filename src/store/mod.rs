//! Message-store collaborator interface.
//!
//! The gateway never talks to the remote service directly; everything goes
//! through [`MessageStore`], which resolves object ids to metadata and
//! hands out raw chunks. Retry and backoff for "peer not yet resolved"
//! conditions live behind this trait, not in the request path.
//!
//! Two local backends implement the trait: [`MemoryStore`] for tests and
//! the default dev setup, and [`FsStore`] for serving a directory of files
//! through the same chunked interface.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::ids::{ObjectId, ScopeId};
use crate::pool::WorkerHandle;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Metadata for one stored object, assembled once per request by
/// [`MessageStore::resolve`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub scope: ScopeId,
    pub object: ObjectId,
    /// Total object size in bytes.
    pub size: u64,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    /// Content-derived identifier, stable across requests.
    pub unique_id: String,
}

/// Result of one chunk fetch.
#[derive(Debug, Clone)]
pub enum ChunkPayload {
    Data(Bytes),
    /// The store has no bytes at the requested offset.
    End,
}

/// Failures surfaced by the store collaborator.
///
/// Transient conditions are retried inside the collaborator; by the time
/// an error reaches the gateway it is terminal for the request.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found")]
    NotFound,

    #[error("upstream timeout: {0}")]
    Timeout(String),

    #[error("transient upstream failure: {0}")]
    Transient(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The chunk-addressable remote store, as seen by the gateway.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Resolve an object address to its metadata.
    async fn resolve(
        &self,
        scope: ScopeId,
        object: ObjectId,
    ) -> Result<ObjectDescriptor, StoreError>;

    /// Fetch one fixed-size chunk of an object through the given worker
    /// connection. The final chunk of an object may be shorter than
    /// `chunk_size`; offsets past the end yield [`ChunkPayload::End`].
    async fn fetch_chunk(
        &self,
        worker: WorkerHandle,
        descriptor: &ObjectDescriptor,
        chunk_index: u64,
        chunk_size: u64,
    ) -> Result<ChunkPayload, StoreError>;
}

/// A store client bound to one worker connection.
///
/// One adapter exists per worker (cached by the pool); requests served by
/// the same worker share it instead of rebuilding per request.
pub struct StreamAdapter {
    store: Arc<dyn MessageStore>,
    worker: WorkerHandle,
}

impl StreamAdapter {
    pub fn new(store: Arc<dyn MessageStore>, worker: WorkerHandle) -> Self {
        Self { store, worker }
    }

    pub fn worker(&self) -> WorkerHandle {
        self.worker
    }

    pub async fn resolve(
        &self,
        scope: ScopeId,
        object: ObjectId,
    ) -> Result<ObjectDescriptor, StoreError> {
        self.store.resolve(scope, object).await
    }

    pub async fn fetch_chunk(
        &self,
        descriptor: &ObjectDescriptor,
        chunk_index: u64,
        chunk_size: u64,
    ) -> Result<ChunkPayload, StoreError> {
        self.store
            .fetch_chunk(self.worker, descriptor, chunk_index, chunk_size)
            .await
    }
}
