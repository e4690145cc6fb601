mod cli;

use streamgate::{
    config::{self, Config, StoreBackend},
    server,
    store::{FsStore, MemoryStore, MessageStore},
    token,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "streamgate=trace,tower_http=debug".to_string()
        } else {
            "streamgate=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("streamgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::SignLink {
            scope,
            object,
            ttl,
            encrypted,
        } => sign_link(cli.config.as_deref(), scope, object, ttl, encrypted),
        Commands::GenerateSecret => {
            println!("{}", token::generate_secret());
            Ok(())
        }
    }
}

async fn start_server(host: String, port: u16, config_path: Option<&std::path::Path>) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting Streamgate gateway");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!(
        "Worker pool size {} with {} byte chunks",
        config.store.pool_size,
        config.store.chunk_size
    );

    let store = build_store(&config)?;

    server::start_server(config, store).await
}

fn build_store(config: &Config) -> Result<Arc<dyn MessageStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!(
                "Using the in-memory store backend; it starts empty and is meant for development"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Fs => {
            let root = config
                .store
                .root
                .clone()
                .context("[store] root is required for the fs backend")?;
            tracing::info!("Serving objects from {:?}", root);
            Ok(Arc::new(FsStore::new(root)))
        }
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!(
                "  Signed links: {}",
                if config.auth.secret_key.is_some() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!(
                "  Encrypted links: {}",
                if config.auth.cipher_key.is_some() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!("  Store backend: {:?}", config.store.backend);
            println!("  Pool size: {}", config.store.pool_size);
            println!("  Chunk size: {} bytes", config.store.chunk_size);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}

fn sign_link(
    config_path: Option<&std::path::Path>,
    scope: i64,
    object: i64,
    ttl: u64,
    encrypted: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let expires_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the unix epoch")?
        .as_secs()
        + ttl;

    let capability = token::CapabilityToken {
        scope: scope.into(),
        object: object.into(),
        expires_at,
    };

    let path = if encrypted {
        let key = config
            .auth
            .cipher_key
            .context("cipher_key is not configured")?;
        let iv = config
            .auth
            .cipher_iv
            .context("cipher_iv is not configured")?;
        token::blob::encode(&capability, key.as_bytes(), iv.as_bytes())?
    } else {
        let secret = config
            .auth
            .secret_key
            .context("secret_key is not configured")?;
        let signature = token::sign(capability.scope, capability.object, expires_at, &secret);
        format!("{scope}/{object}/{expires_at}/{signature}")
    };

    println!("/{path}");
    Ok(())
}
