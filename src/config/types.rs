use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Keys for the two link encodings. Presence of a key enables the
/// corresponding form; either or both may be configured.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Secret for the plain signed link form (generate with
    /// `streamgate generate-secret`)
    #[serde(default)]
    pub secret_key: Option<String>,

    /// 16-byte AES-128-CBC key for the encrypted single-blob link form
    #[serde(default)]
    pub cipher_key: Option<String>,

    /// 16-byte IV paired with `cipher_key`
    #[serde(default)]
    pub cipher_iv: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory for the `fs` backend
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Number of worker connections to the store (default: 4)
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Remote chunk size in bytes (default: 1 MiB)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
}

fn default_pool_size() -> usize {
    4
}
fn default_chunk_size() -> u64 {
    1024 * 1024
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            root: None,
            pool_size: default_pool_size(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Fs,
}
