// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyward - credential protection with tracked key rotation.
//!
//! This is the binary entry point for the `keyward` command.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod keys;
mod protect;
mod rotate;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use keyward_config::KeywardConfig;
use keyward_core::KeywardError;
use keyward_keys::{KeyLifecycleManager, KeyMetadataStore, RotationReason};
use keyward_rotation::RotationOrchestrator;
use keyward_vault::EncryptionEngine;
use serde::Serialize;
use tracing::error;

/// Keyward - credential protection with tracked key rotation.
#[derive(Parser, Debug)]
#[command(name = "keyward", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a protecting key and store it with rotation tracking.
    GenerateKey {
        /// Variable name of the key in the key file.
        #[arg(long)]
        name: String,
        /// Maximum key age in days, overriding `[rotation]`.
        #[arg(long)]
        max_age: Option<i64>,
        /// Replace the key if it already exists.
        #[arg(long)]
        rotate: bool,
        /// Environments that use this key.
        #[arg(long = "env")]
        environments: Vec<String>,
        /// Variables protected by this key.
        #[arg(long = "var")]
        variables: Vec<String>,
    },
    /// Encrypt variables of a credential file in place.
    Encrypt {
        /// Credential file, relative to the environment directory.
        file: String,
        /// Name of the protecting key.
        #[arg(long)]
        key: String,
        /// Variables to encrypt; all when omitted.
        #[arg(long = "var")]
        variables: Vec<String>,
        /// Re-encrypt values that are already encrypted.
        #[arg(long)]
        force: bool,
    },
    /// Print the plaintext of one encrypted variable.
    Decrypt {
        file: String,
        variable: String,
        #[arg(long)]
        key: String,
    },
    /// Rotate a key and re-encrypt the files that depend on it.
    Rotate {
        #[arg(long)]
        key: String,
        /// Credential files to re-encrypt.
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long, default_value = "manual", value_parser = parse_reason)]
        reason: RotationReason,
        /// New maximum key age in days.
        #[arg(long)]
        max_age: Option<i64>,
        /// Also encrypt plaintext values found in the files.
        #[arg(long)]
        include_plaintext: bool,
    },
    /// Check rotation status of one key, or sweep all keys.
    Status { key: Option<String> },
    /// Show metadata and audit summary for one key.
    Info { key: String },
    /// Audit every tracked key.
    Audit,
    /// Run the startup security check; exits non-zero when system health is critical.
    Check,
    /// Record that a key was used.
    Access {
        key: String,
        #[arg(long, default_value = "cli")]
        source: String,
    },
    /// Reset invalid rotation configs to the defaults.
    Repair { key: Option<String> },
}

/// Everything a command needs, built once from the configuration.
pub struct App {
    pub config: KeywardConfig,
    pub engine: EncryptionEngine,
    pub lifecycle: KeyLifecycleManager,
    pub orchestrator: RotationOrchestrator,
    pub json: bool,
    pub color: bool,
}

impl App {
    fn new(config: KeywardConfig, json: bool, plain: bool) -> Result<Self, KeywardError> {
        use std::io::IsTerminal;

        let engine = EncryptionEngine::new(&config.vault);
        let store = Arc::new(KeyMetadataStore::from_config(&config));
        let lifecycle = KeyLifecycleManager::from_config(store, &config)?;
        let orchestrator = RotationOrchestrator::new(engine.clone(), lifecycle.clone());
        Ok(Self {
            config,
            engine,
            lifecycle,
            orchestrator,
            json,
            color: !plain && std::io::stdout().is_terminal(),
        })
    }

    /// Print `value` as pretty JSON.
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<(), KeywardError> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn parse_reason(value: &str) -> Result<RotationReason, String> {
    value.parse().map_err(|_| {
        format!(
            "unknown rotation reason `{value}` (expected scheduled, manual, expired, security_breach or compromised)"
        )
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => keyward_config::load_and_validate_path(path),
        None => keyward_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            keyward_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match App::new(config, cli.json, cli.plain) {
        Ok(app) => run(&app, cli.command).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("keyward: {e}");
        std::process::exit(1);
    }
}

async fn run(app: &App, command: Commands) -> Result<(), KeywardError> {
    match command {
        Commands::GenerateKey {
            name,
            max_age,
            rotate,
            environments,
            variables,
        } => keys::generate_key(app, name, max_age, rotate, environments, variables).await,
        Commands::Encrypt {
            file,
            key,
            variables,
            force,
        } => protect::encrypt(app, &file, &key, variables, force).await,
        Commands::Decrypt {
            file,
            variable,
            key,
        } => protect::decrypt(app, &file, &variable, &key).await,
        Commands::Rotate {
            key,
            files,
            reason,
            max_age,
            include_plaintext,
        } => rotate::rotate(app, &key, &files, reason, max_age, include_plaintext).await,
        Commands::Status { key } => status::status(app, key.as_deref()).await,
        Commands::Info { key } => keys::info(app, &key).await,
        Commands::Audit => status::audit(app).await,
        Commands::Check => status::check(app).await,
        Commands::Access { key, source } => keys::access(app, &key, &source).await,
        Commands::Repair { key } => keys::repair(app, key.as_deref()).await,
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` takes precedence.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyward={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
