use anyhow::{Context, Result};
use clap::Parser;
use sharewatch::cli::{self, Cli};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging (stderr; stdout carries the JSON) ──────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,sharewatch=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) options & config ─────────────────────────────────────────
    let args = Cli::parse();
    let config = args.load_config().context("loading config")?;
    debug!(?config, "config");

    // ─── 3) fetch & print ────────────────────────────────────────────
    let output = cli::run(&args, &config)
        .await
        .with_context(|| format!("{:?} failed", args.command))?;
    println!("{}", output);

    info!("done");
    Ok(())
}
