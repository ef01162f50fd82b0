// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use contentguard_config::{Config, ConfigManager};
use contentguard_gateway::{
    FetchOptions, HttpUpstream, ResilientClient, Upstream, WarmReport,
};
use serde_json::Value;
use std::time::Duration;

/// Write a default config file
pub fn init_config(manager: &ConfigManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to initialize config")?;

    if created {
        println!(
            "{} Config written to {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!("Config already exists at {}", manager.config_path().display());
    }
    Ok(())
}

/// Report validation errors in the config file
pub fn validate_config(manager: &ConfigManager) -> Result<()> {
    let errors = manager.validate().context("Failed to load config")?;

    if errors.is_empty() {
        println!("{} {} is valid", style("✓").green().bold(), manager.config_path().display());
        return Ok(());
    }

    println!("{} {} problem(s) found:", style("✗").red().bold(), errors.len());
    for error in &errors {
        println!("  - {}", error);
    }
    bail!("Config at {} is invalid", manager.config_path().display())
}

/// Print the effective config as TOML
pub fn show_config(manager: &ConfigManager) -> Result<()> {
    let config = manager
        .load_with_env_overrides()
        .context("Failed to load config")?;
    println!("# {}", manager.config_path().display());
    print!("{}", render_config(&config)?);
    Ok(())
}

fn render_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to render config")
}

/// Fetch a path one or more times and print the cache statistics
pub async fn fetch(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("path")
        .ok_or_else(|| anyhow::anyhow!("Path is required"))?;
    let repeat = matches.get_one::<u32>("repeat").copied().unwrap_or(1);
    let ttl = matches.get_one::<u64>("ttl-ms").map(|ms| Duration::from_millis(*ms));
    let quiet = matches.get_flag("quiet");

    let client = build_client(manager)?;
    let summary = run_fetch(&client, path, repeat, ttl).await;

    if let Some(body) = summary.last.as_ref().filter(|_| !quiet) {
        println!("{}", serde_json::to_string_pretty(body)?);
    }
    print_fetch_summary(&summary);
    print_client_state(&client);

    if summary.succeeded == 0 {
        bail!("All {} fetches of {} failed", repeat, path);
    }
    Ok(())
}

/// Fetch the configured warm paths
pub async fn warm(manager: &ConfigManager) -> Result<()> {
    let client = build_client(manager)?;
    let report = client.warm_configured().await;

    print_warm_report(&report);
    print_client_state(&client);

    if !report.is_complete() {
        bail!("{} path(s) could not be warmed", report.failed.len());
    }
    Ok(())
}

fn build_client(manager: &ConfigManager) -> Result<ResilientClient<HttpUpstream>> {
    let config = manager
        .load_with_env_overrides()
        .context("Failed to load config")?;
    if let Err(errors) = config.validate() {
        bail!(
            "Config is invalid: {}",
            errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
        );
    }

    let upstream = HttpUpstream::new(&config.upstream).context("Failed to create HTTP client")?;
    Ok(ResilientClient::from_config(upstream, &config))
}

/// Outcome of repeated fetches of one path
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub succeeded: u32,
    pub failures: Vec<String>,
    pub last: Option<Value>,
}

pub async fn run_fetch<U: Upstream>(
    client: &ResilientClient<U>,
    path: &str,
    repeat: u32,
    ttl: Option<Duration>,
) -> FetchSummary {
    let mut options = FetchOptions::new();
    options.ttl = ttl;

    let mut summary = FetchSummary::default();
    for _ in 0..repeat {
        match client.get(path, options.clone()).await {
            Ok(value) => {
                summary.succeeded += 1;
                summary.last = Some(value);
            }
            Err(e) => summary.failures.push(e.to_string()),
        }
    }
    summary
}

fn print_fetch_summary(summary: &FetchSummary) {
    println!(
        "\n{} succeeded, {} failed",
        style(summary.succeeded).green().bold(),
        style(summary.failures.len()).red().bold()
    );
    for failure in &summary.failures {
        println!("  {} {}", style("✗").red(), failure);
    }
}

fn print_warm_report(report: &WarmReport) {
    for path in &report.warmed {
        println!("  {} {}", style("warmed").green(), path);
    }
    for path in &report.skipped {
        println!("  {} {}", style("cached").dim(), path);
    }
    for (path, error) in &report.failed {
        println!("  {} {}: {}", style("failed").red(), path, error);
    }
}

fn print_client_state<U>(client: &ResilientClient<U>) {
    println!("\n{}", style("Cache").bold().cyan());
    println!("  {}", client.cache_stats_display());

    let breakers = client.breaker_states();
    if breakers.is_empty() {
        return;
    }
    println!("\n{}", style("Circuit breakers").bold().cyan());
    for (endpoint, stats) in breakers {
        println!(
            "  {:<30} {:<10} failures: {}",
            endpoint, stats.state, stats.failure_count
        );
    }
}

#[cfg(test)]
mod tests;
