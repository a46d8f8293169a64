//! npc-forge: generate NPC notes for an Obsidian vault.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use npc_forge::{Config, GeminiClient, NoteStorage, RunOptions, VaultSettings, VaultStorage};

#[derive(Parser, Debug)]
#[command(name = "npc-forge")]
#[command(about = "Generate NPC notes for Obsidian using Gemini")]
struct Args {
    /// Number of NPCs to generate
    #[arg(default_value_t = 1)]
    count: u32,

    /// Path to config.toml (defaults to the file next to the executable)
    #[arg(long, env = "NPC_FORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Tag added to each generated note's frontmatter (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Print an existing note from the vault instead of generating
    #[arg(long, value_name = "TITLE")]
    read: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run_cli(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(args: Args) -> Result<()> {
    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if let Some(title) = args.read {
        let vault = VaultSettings::load(&config_path)?;
        tracing::info!("Vault path: {}", vault.vault_path.display());
        return read_note(&VaultStorage::new(vault), &title).await;
    }

    let config = Config::load(&config_path)?;
    tracing::info!("Vault path: {}", config.vault.vault_path.display());

    let storage = VaultStorage::new(config.vault.clone());

    let client = GeminiClient::configure(&config.gemini).context("Failed to configure Gemini")?;
    tracing::info!("Using Gemini model {}", client.model());

    let options = RunOptions {
        count: args.count,
        tags: args.tags,
    };
    let summary = npc_forge::run(&client, &storage, &options).await;

    println!(
        "Generated {} of {} NPC(s): {} created, {} skipped",
        summary.created + summary.skipped,
        summary.requested,
        summary.created,
        summary.skipped
    );

    Ok(())
}

async fn read_note(storage: &VaultStorage, title: &str) -> Result<()> {
    match storage.find_note(title).await? {
        Some(note) => {
            tracing::info!("Read note: {}", note.path.display());
            println!("{}", note.content);
        }
        None => println!("Note '{}' not found", title),
    }
    Ok(())
}
