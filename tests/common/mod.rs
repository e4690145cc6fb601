//! Shared test harness for integration tests.
//!
//! Boots the gateway on a random port over an in-memory message store and
//! provides helpers for registering objects and minting token paths.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use streamgate::config::Config;
use streamgate::ids::{ObjectId, ScopeId};
use streamgate::pool::WorkerPool;
use streamgate::server::{create_router, AppContext};
use streamgate::store::{MemoryStore, MessageStore};
use streamgate::token::{self, CapabilityToken};

pub const SECRET: &str = "647e2c1ac884418b5c270862a9a484105e88b11f097fa9d5";
pub const CIPHER_KEY: &str = "BHADOO9854752658";
pub const CIPHER_IV: &str = "CLOUD54158954721";

/// Small chunk size so even modest test objects span several chunks.
pub const CHUNK_SIZE: u64 = 1024;
pub const POOL_SIZE: usize = 3;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory store.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub pool: WorkerPool,
    pub config: Arc<Config>,
}

impl TestHarness {
    /// Create a new harness with default configuration and an empty store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Create a harness around a pre-populated store.
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let mut config = Config::default();
        config.auth.secret_key = Some(SECRET.to_string());
        config.auth.cipher_key = Some(CIPHER_KEY.to_string());
        config.auth.cipher_iv = Some(CIPHER_IV.to_string());
        config.store.pool_size = POOL_SIZE;
        config.store.chunk_size = CHUNK_SIZE;

        let pool = WorkerPool::new(store.clone() as Arc<dyn MessageStore>, POOL_SIZE);

        Self {
            store,
            pool,
            config: Arc::new(config),
        }
    }

    /// Start an Axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_store(Arc::new(MemoryStore::new())).await
    }

    /// Start an Axum server around a pre-populated store.
    pub async fn with_server_store(store: Arc<MemoryStore>) -> (Self, SocketAddr) {
        let harness = Self::with_store(store);
        let ctx = AppContext {
            pool: harness.pool.clone(),
            config: harness.config.clone(),
            started_at: std::time::Instant::now(),
        };
        let app = create_router(ctx);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Register an object and return its (scope, object) address.
    pub fn add_object(&self, bytes: Vec<u8>, mime: Option<&str>, name: Option<&str>) -> (i64, i64) {
        let scope = -1_001_234_567_890;
        let object = 42;
        self.store
            .insert(ScopeId::from(scope), ObjectId::from(object), bytes, mime, name);
        (scope, object)
    }

    /// Mint a signed token path. Negative `ttl` produces an expired link.
    pub fn signed_path(&self, scope: i64, object: i64, ttl: i64) -> String {
        let expires_at = expiry(ttl);
        let signature = token::sign(scope.into(), object.into(), expires_at, SECRET);
        format!("{scope}/{object}/{expires_at}/{signature}")
    }

    /// Mint an encrypted blob token path.
    pub fn blob_path(&self, scope: i64, object: i64, ttl: i64) -> String {
        let capability = CapabilityToken {
            scope: scope.into(),
            object: object.into(),
            expires_at: expiry(ttl),
        };
        token::blob::encode(&capability, CIPHER_KEY.as_bytes(), CIPHER_IV.as_bytes())
            .expect("blob encode")
    }
}

fn expiry(ttl: i64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64;
    (now + ttl).max(0) as u64
}

/// Deterministic pseudo-random test payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
