//! Filesystem-backed message store.
//!
//! Objects live at `<root>/<scope>/<object>[.<ext>]`. Metadata comes from
//! the file itself: size from the filesystem, name from the directory
//! entry, and a unique id derived from the path and length. Chunks are
//! served by seeking into the file.

use super::{ChunkPayload, MessageStore, ObjectDescriptor, StoreError};
use crate::ids::{ObjectId, ScopeId};
use crate::pool::WorkerHandle;
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, SeekFrom};
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, descriptor: &ObjectDescriptor) -> PathBuf {
        let name = descriptor
            .file_name
            .clone()
            .unwrap_or_else(|| descriptor.object.to_string());
        self.root.join(descriptor.scope.to_string()).join(name)
    }
}

#[async_trait]
impl MessageStore for FsStore {
    async fn resolve(
        &self,
        scope: ScopeId,
        object: ObjectId,
    ) -> Result<ObjectDescriptor, StoreError> {
        let dir = self.root.join(scope.to_string());
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|_| StoreError::NotFound)?;

        let stem = object.to_string();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) != Some(stem.as_str()) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let file_name = path
                .file_name()
                .and_then(|s| s.to_str())
                .map(str::to_owned);
            let digest = Sha256::digest(format!("{}:{}", path.display(), metadata.len()));
            return Ok(ObjectDescriptor {
                scope,
                object,
                size: metadata.len(),
                mime_type: None,
                file_name,
                unique_id: hex::encode(&digest[..8]),
            });
        }
        Err(StoreError::NotFound)
    }

    async fn fetch_chunk(
        &self,
        _worker: WorkerHandle,
        descriptor: &ObjectDescriptor,
        chunk_index: u64,
        chunk_size: u64,
    ) -> Result<ChunkPayload, StoreError> {
        let offset = chunk_index * chunk_size;
        if offset >= descriptor.size {
            return Ok(ChunkPayload::End);
        }

        let path = self.object_path(descriptor);
        let mut file = File::open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound,
            _ => StoreError::Io(e),
        })?;
        file.seek(SeekFrom::Start(offset)).await?;

        let want = chunk_size.min(descriptor.size - offset) as usize;
        let mut buf = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            let n = file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(ChunkPayload::End);
        }
        buf.truncate(filled);
        Ok(ChunkPayload::Data(Bytes::from(buf)))
    }
}
