mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./streamgate.toml",
        "~/.config/streamgate/config.toml",
        "/etc/streamgate/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.store.pool_size == 0 {
        anyhow::bail!("Worker pool size cannot be 0");
    }

    if config.store.chunk_size == 0 {
        anyhow::bail!("Chunk size cannot be 0");
    }

    if let Some(secret) = &config.auth.secret_key {
        if secret.is_empty() {
            anyhow::bail!("secret_key cannot be empty when set");
        }
    }

    match (&config.auth.cipher_key, &config.auth.cipher_iv) {
        (None, None) => {}
        (Some(key), Some(iv)) => {
            if key.len() != 16 {
                anyhow::bail!("cipher_key must be exactly 16 bytes, got {}", key.len());
            }
            if iv.len() != 16 {
                anyhow::bail!("cipher_iv must be exactly 16 bytes, got {}", iv.len());
            }
        }
        _ => anyhow::bail!("cipher_key and cipher_iv must be configured together"),
    }

    if config.auth.secret_key.is_none() && config.auth.cipher_key.is_none() {
        tracing::warn!("No token format configured; every stream request will be rejected");
    }

    if config.store.backend == StoreBackend::Fs {
        match &config.store.root {
            None => anyhow::bail!("[store] root is required for the fs backend"),
            Some(root) => {
                if !root.exists() {
                    tracing::warn!("Store root does not exist: {:?}", root);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.store.pool_size, 4);
        assert_eq!(config.store.chunk_size, 1024 * 1024);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 9090

            [auth]
            secret_key = "647e2c1ac884418b5c270862a9a48410"
            cipher_key = "BHADOO9854752658"
            cipher_iv = "CLOUD54158954721"

            [store]
            backend = "fs"
            root = "/srv/media"
            pool_size = 8
            chunk_size = 524288
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.store.pool_size, 8);
        assert_eq!(config.store.chunk_size, 524_288);
        assert_eq!(config.store.backend, StoreBackend::Fs);
        assert!(config.auth.secret_key.is_some());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let mut config = Config::default();
        config.store.pool_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_cipher_key_length() {
        let mut config = Config::default();
        config.auth.cipher_key = Some("short".to_string());
        config.auth.cipher_iv = Some("CLOUD54158954721".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_cipher_key_without_iv() {
        let mut config = Config::default();
        config.auth.cipher_key = Some("BHADOO9854752658".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_fs_backend_without_root() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Fs;
        assert!(validate_config(&config).is_err());
    }
}
