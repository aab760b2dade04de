use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "networth",
    about = "Multi-year net worth projection from salaries and budget categories"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, env = "NETWORTH_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Run one projection from a JSON payload and print the result
    Project {
        #[arg(long, help = "Payload file, or - to read from stdin")]
        input: PathBuf,
        #[arg(long, help = "Overrides the payload's years (clamped to 1..=200)")]
        years: Option<i64>,
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port } => networth::api::run_http_server(port)
            .await
            .context("HTTP server failed"),
        Command::Project {
            input,
            years,
            pretty,
        } => run_projection(&input, years, pretty),
    }
}

fn run_projection(input: &Path, years: Option<i64>, pretty: bool) -> anyhow::Result<()> {
    let json = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read payload {}", input.display()))?
    };

    let mut payload = networth::api::parse_payload(&json)?;
    if let Some(years) = years {
        payload.override_years(years);
    }
    let response = networth::api::simulate(payload)?;

    let out = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{out}");
    Ok(())
}
