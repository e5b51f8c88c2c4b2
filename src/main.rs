mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use cs_core::config::{self, Config};
use cs_server::context::AppContext;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "camstream=trace,cs_server=trace,cs_core=debug,tower_http=debug".to_string()
        } else {
            "camstream=info,cs_server=info,cs_core=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so command output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start {
            host,
            port,
            root,
            chunk_size,
        } => {
            let mut config = load(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(root) = root {
                config.media.root = root;
            }
            if let Some(chunk_size) = chunk_size {
                config.media.chunk_size = chunk_size;
            }
            config.check().context("Invalid configuration after CLI overrides")?;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cs_server::start(config))?;
            Ok(())
        }
        Commands::Catalog { root } => {
            let mut config = load(cli.config.as_deref())?;
            if let Some(root) = root {
                config.media.root = root;
            }
            print_catalog(config)
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path)
        }
        Commands::Version => {
            println!("camstream {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    config::load_config_or_default(path).context("Failed to load configuration")
}

fn print_catalog(config: Config) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let ctx = AppContext::new(config);
    let available = rt.block_on(ctx.catalog.list());

    if available.is_empty() {
        println!("No media available under {}", ctx.resolver.root().display());
    }
    for id in available {
        println!("{id}");
    }
    Ok(())
}

fn validate_config(path: Option<PathBuf>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            config::load_config(&p).with_context(|| format!("Invalid config {}", p.display()))?
        }
        None => {
            println!("No config file specified, checking defaults");
            load(None)?
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Idle timeout: {}s", config.server.idle_timeout_secs);
    println!("  Media root: {}", config.media.root.display());
    println!("  Chunk size: {} bytes", config.media.chunk_size);
    println!("  Extensions: {}", config.media.extensions.join(", "));
    println!("  Candidates: {}", config.media.candidates.len());

    let warnings = config.validate();
    for warning in &warnings {
        println!("  ! {warning}");
    }

    Ok(())
}
