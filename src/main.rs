mod cli;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use reshelf::config::Settings;
use reshelf::dearrow::{DeArrow, DeArrowClient};
use reshelf::location::{classify, Location};
use reshelf::progress::watch_progress;
use reshelf::Reshelf;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("RESHELF_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Rewrite { file, config, url, pretty, settle_ms } => {
            rewrite(&file, config, &url, pretty, settle_ms).await?;
        }
        Commands::Classify { url } => {
            let location = Location::parse(&url).with_context(|| format!("invalid url: {url}"))?;
            println!("{}", classify(&location));
        }
        Commands::Progress { file } => {
            let raw = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let item: Value = serde_json::from_str(&raw).context("parsing item fixture")?;
            match watch_progress(&item) {
                Some(pct) => println!("{pct}"),
                None => println!("no progress data"),
            }
        }
    }
    Ok(())
}

async fn rewrite(file: &Path, config: Option<PathBuf>, url: &str, pretty: bool, settle_ms: u64) -> Result<()> {
    let settings = Settings::load_or_default(config.as_deref())?;
    let location = Location::parse(url).with_context(|| format!("invalid url: {url}"))?;
    let with_dearrow = settings.enable_de_arrow;

    let mut builder = Reshelf::builder().config(Arc::new(settings)).location(Arc::new(location));
    if with_dearrow {
        let client = DeArrowClient::new().context("building DeArrow client")?;
        builder = builder.dearrow(DeArrow::new(Arc::new(client), tokio::runtime::Handle::current()));
    }
    let reshelf = builder.build();

    let raw = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut decoded = reshelf.decode_tracked(&raw).context("decoding response")?;

    if with_dearrow && settle_ms > 0 {
        tokio::time::sleep(Duration::from_millis(settle_ms)).await;
        let applied = reshelf.apply_substitutions(&mut decoded);
        info!(applied, "DeArrow substitutions");
    }

    let out = if pretty {
        serde_json::to_string_pretty(&decoded.payload)?
    } else {
        serde_json::to_string(&decoded.payload)?
    };
    println!("{out}");
    Ok(())
}
