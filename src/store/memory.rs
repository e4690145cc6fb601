//! In-memory message store.
//!
//! Backs the test suite and the default dev configuration. Objects are
//! registered up front; chunk fetches slice the stored bytes. A per-fetch
//! delay and an advertised-size override are available to exercise slow
//! streams and short reads.

use super::{ChunkPayload, MessageStore, ObjectDescriptor, StoreError};
use crate::ids::{ObjectId, ScopeId};
use crate::pool::WorkerHandle;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::time::Duration;
use uuid::Uuid;

struct StoredObject {
    bytes: Bytes,
    mime_type: Option<String>,
    file_name: Option<String>,
    unique_id: String,
    /// When set, `resolve` reports this size instead of the actual byte
    /// count, so fetches past the real end come up short.
    advertised_size: Option<u64>,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<(i64, i64), StoredObject>,
    fetch_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that sleeps before every chunk fetch.
    pub fn with_fetch_delay(delay: Duration) -> Self {
        Self {
            objects: DashMap::new(),
            fetch_delay: Some(delay),
        }
    }

    /// Register an object.
    pub fn insert(
        &self,
        scope: ScopeId,
        object: ObjectId,
        bytes: impl Into<Bytes>,
        mime_type: Option<&str>,
        file_name: Option<&str>,
    ) {
        self.objects.insert(
            (scope.get(), object.get()),
            StoredObject {
                bytes: bytes.into(),
                mime_type: mime_type.map(str::to_owned),
                file_name: file_name.map(str::to_owned),
                unique_id: Uuid::new_v4().simple().to_string(),
                advertised_size: None,
            },
        );
    }

    /// Register an object whose descriptor advertises more bytes than the
    /// store can deliver, to simulate a truncated upstream object.
    pub fn insert_truncated(
        &self,
        scope: ScopeId,
        object: ObjectId,
        bytes: impl Into<Bytes>,
        advertised_size: u64,
    ) {
        self.objects.insert(
            (scope.get(), object.get()),
            StoredObject {
                bytes: bytes.into(),
                mime_type: None,
                file_name: None,
                unique_id: Uuid::new_v4().simple().to_string(),
                advertised_size: Some(advertised_size),
            },
        );
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn resolve(
        &self,
        scope: ScopeId,
        object: ObjectId,
    ) -> Result<ObjectDescriptor, StoreError> {
        let stored = self
            .objects
            .get(&(scope.get(), object.get()))
            .ok_or(StoreError::NotFound)?;
        Ok(ObjectDescriptor {
            scope,
            object,
            size: stored
                .advertised_size
                .unwrap_or(stored.bytes.len() as u64),
            mime_type: stored.mime_type.clone(),
            file_name: stored.file_name.clone(),
            unique_id: stored.unique_id.clone(),
        })
    }

    async fn fetch_chunk(
        &self,
        _worker: WorkerHandle,
        descriptor: &ObjectDescriptor,
        chunk_index: u64,
        chunk_size: u64,
    ) -> Result<ChunkPayload, StoreError> {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        let bytes = {
            let stored = self
                .objects
                .get(&(descriptor.scope.get(), descriptor.object.get()))
                .ok_or(StoreError::NotFound)?;
            stored.bytes.clone()
        };

        let offset = (chunk_index * chunk_size) as usize;
        if offset >= bytes.len() {
            return Ok(ChunkPayload::End);
        }
        let end = (offset + chunk_size as usize).min(bytes.len());
        Ok(ChunkPayload::Data(bytes.slice(offset..end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_resolve_and_fetch() {
        let store = MemoryStore::new();
        let scope = ScopeId::from(1);
        let object = ObjectId::from(2);
        store.insert(scope, object, vec![7u8; 300], Some("video/mp4"), Some("a.mp4"));

        let descriptor = store.resolve(scope, object).await.unwrap();
        assert_eq!(descriptor.size, 300);
        assert_eq!(descriptor.mime_type.as_deref(), Some("video/mp4"));

        let worker = WorkerHandle::new(0);
        let chunk = store.fetch_chunk(worker, &descriptor, 0, 256).await.unwrap();
        assert_matches!(chunk, ChunkPayload::Data(b) if b.len() == 256);
        let chunk = store.fetch_chunk(worker, &descriptor, 1, 256).await.unwrap();
        assert_matches!(chunk, ChunkPayload::Data(b) if b.len() == 44);
        let chunk = store.fetch_chunk(worker, &descriptor, 2, 256).await.unwrap();
        assert_matches!(chunk, ChunkPayload::End);
    }

    #[tokio::test]
    async fn test_resolve_unknown_object() {
        let store = MemoryStore::new();
        let result = store.resolve(ScopeId::from(1), ObjectId::from(2)).await;
        assert_matches!(result, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_truncated_object_advertises_larger_size() {
        let store = MemoryStore::new();
        let scope = ScopeId::from(1);
        let object = ObjectId::from(2);
        store.insert_truncated(scope, object, vec![1u8; 100], 1000);

        let descriptor = store.resolve(scope, object).await.unwrap();
        assert_eq!(descriptor.size, 1000);

        let worker = WorkerHandle::new(0);
        let chunk = store.fetch_chunk(worker, &descriptor, 0, 64).await.unwrap();
        assert_matches!(chunk, ChunkPayload::Data(b) if b.len() == 64);
        // Past the real end of the stored bytes.
        let chunk = store.fetch_chunk(worker, &descriptor, 2, 64).await.unwrap();
        assert_matches!(chunk, ChunkPayload::End);
    }
}
