//! Main entry point for the zipack CLI application.
//!
//! Reads files from an archive through the cache, lists its entries, or
//! serves it over HTTP.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use zipack::cli::Command;
use zipack::{Cli, Manager, Options, ZipFileEntry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over -v
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let file_options = cli
        .config
        .as_deref()
        .map(Options::from_file)
        .transpose()?;
    let Some(options) = cli.options(file_options) else {
        bail!("no archive given: pass --archive or --config");
    };

    let archive = options.archive.display().to_string();
    let mgr = Manager::new(options).with_context(|| format!("failed to load {archive}"))?;

    match cli.command {
        Command::Cat { paths } => cat(&mgr, &paths),
        Command::Ls => list(&mgr),
        Command::Serve { listen, .. } => {
            let listener = tokio::net::TcpListener::bind(listen)
                .await
                .with_context(|| format!("failed to bind {listen}"))?;
            let shutdown = zipack::serve::shutdown_on(tokio::signal::ctrl_c());
            zipack::serve::run(Arc::new(mgr), listener, shutdown).await?;
            Ok(())
        }
    }
}

/// Write each file's contents to stdout, in order.
fn cat(mgr: &Manager, paths: &[String]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for path in paths {
        let data = mgr.get_contents(path)?;
        stdout.write_all(&data)?;
    }
    stdout.flush()?;
    Ok(())
}

/// List archive entries as a table: size, mode, modification time, name.
fn list(mgr: &Manager) -> Result<()> {
    let entries = mgr.list_entries()?;
    let mut stdout = std::io::stdout().lock();

    writeln!(stdout, "{:>10}  {:>6}  {:>19}  Name", "Length", "Mode", "Modified")?;
    writeln!(stdout, "{}", "-".repeat(60))?;

    let mut total = 0u64;
    let mut files = 0usize;
    for entry in &entries {
        writeln!(
            stdout,
            "{:>10}  {:>6o}  {:>19}  {}",
            entry.uncompressed_size,
            entry.mode(),
            format_modified(entry),
            entry.file_name
        )?;
        if !entry.is_dir() {
            total += entry.uncompressed_size;
            files += 1;
        }
    }

    writeln!(stdout, "{}", "-".repeat(60))?;
    writeln!(stdout, "{:>10}  {:>6}  {:>19}  {} files", total, "", "", files)?;
    Ok(())
}

fn format_modified(entry: &ZipFileEntry) -> String {
    entry
        .modified()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
