use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "streamgate")]
#[command(author, version, about = "HTTP byte-range gateway for chunked remote media stores")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Start {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,

    /// Mint a streaming link path for an object
    SignLink {
        /// Scope (channel) id owning the object
        scope: i64,

        /// Object id within the scope
        object: i64,

        /// Link lifetime in seconds
        #[arg(long, default_value = "3600")]
        ttl: u64,

        /// Emit the encrypted single-blob form instead of signed segments
        #[arg(long)]
        encrypted: bool,
    },

    /// Generate a random secret for signed links
    GenerateSecret,
}
