// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use pacresolver::logging::{init_logging, LogLevel};
use log::warn;
use pacresolver::pac::{evaluate_pac_for_host, is_pac_url};
use pacresolver::{parse_directives, EngineConfig};
use std::path::PathBuf;
use url::Url;

/// Evaluate a PAC script for a URL and print the proxy it picks.
#[derive(Parser, Debug)]
#[command(name = "pacresolve", version, about)]
struct Cli {
    /// PAC script location: a file path or an http(s) URL.
    pac: String,

    /// URL to find a proxy for.
    #[arg(default_value = "https://www.google.com")]
    url: String,

    /// Host passed to FindProxyForURL. Defaults to the URL's host.
    #[arg(long)]
    host: Option<String>,

    /// TOML file with engine settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each directive as a proxy URL instead of the raw PAC result.
    #[arg(long)]
    urls: bool,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn });

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if !is_pac_url(&cli.pac) {
        warn!("{} does not look like a PAC file, evaluating it anyway", cli.pac);
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let host = match &cli.host {
        Some(host) => host.clone(),
        None => Url::parse(&cli.url)
            .with_context(|| format!("invalid URL {}", cli.url))?
            .host_str()
            .with_context(|| format!("URL has no host: {}", cli.url))?
            .to_string(),
    };

    let result = evaluate_pac_for_host(&cli.pac, &cli.url, &host, &config)
        .with_context(|| format!("evaluating {} for {}", cli.pac, cli.url))?;

    if cli.urls {
        for directive in parse_directives(&result) {
            println!("{}", directive.to_url());
        }
    } else {
        println!("Proxy for {} → {}", cli.url, result);
    }
    Ok(())
}
