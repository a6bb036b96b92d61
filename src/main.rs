use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pkg_versions::cache::UpstreamCache;
use pkg_versions::collect::Collector;
use pkg_versions::config::{self, Config};
use pkg_versions::report::{Report, html};

#[derive(Parser)]
#[command(name = "pkg-versions")]
#[command(version, about = "Collects Java package versions across Fedora, upstream and bootstrap sources")]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect versions from all sources and write the JSON report
    Fetch {
        /// Where to write the report
        #[arg(long, env = "OUT_JSON", default_value = "versions.json")]
        output: PathBuf,

        /// Upstream snapshot location
        #[arg(long, env = "CACHE_FILE")]
        cache_file: Option<PathBuf>,
    },

    /// Render a previously collected JSON report as an HTML table
    Html {
        /// The JSON report to render
        #[arg(long, env = "OUT_JSON", default_value = "versions.json")]
        input: PathBuf,

        /// Where to write the table
        #[arg(long, env = "OUT_HTML", default_value = "versions.html")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Fetch { output, cache_file } => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(fetch(config, output, cache_file)),
        Command::Html { input, output } => render(&input, &output),
    }
}

async fn fetch(config: Config, output: PathBuf, cache_file: Option<PathBuf>) -> anyhow::Result<()> {
    let cache = UpstreamCache::new(
        cache_file.unwrap_or_else(config::default_cache_file),
        config.cache_max_age_secs,
    );

    let report = Collector::new(config, cache)
        .collect()
        .await
        .context("collecting versions failed")?;

    std::fs::write(&output, report.to_json()?)
        .with_context(|| format!("cannot write report to {}", output.display()))?;
    tracing::info!("wrote report to {}", output.display());
    Ok(())
}

fn render(input: &PathBuf, output: &PathBuf) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read report from {}", input.display()))?;
    let report = Report::from_json(&content)
        .with_context(|| format!("cannot parse report {}", input.display()))?;

    std::fs::write(output, html::render(&report))
        .with_context(|| format!("cannot write table to {}", output.display()))?;
    tracing::info!("wrote table to {}", output.display());
    Ok(())
}
