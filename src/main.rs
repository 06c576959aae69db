//! `licensecheck` — walk an installed `node_modules` tree and show the license of every package.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load the license catalog ([`license::catalog`]) and overrides ([`config::load_overrides`]).
//! 3. Walk the dependency graph, inspecting each package ([`engine::resolve_licenses`]).
//! 4. Render the tree, flat list or JSON to stdout ([`report`]).
//! 5. Optionally print license totals to stderr ([`report::summary`]).

mod analyzer;
mod cli;
mod config;
mod engine;
mod license;
mod models;
mod report;

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use regex::RegexBuilder;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use engine::ResolveOptions;
use license::catalog::Catalog;
use report::fields::Style;
use report::RenderOptions;

/// Environment variable holding the log filter, e.g. `LICENSECHECK_LOG=debug`.
const LOG_ENV: &str = "LICENSECHECK_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let catalog = match &cli.catalog {
        Some(dir) => Catalog::from_dir(dir)?,
        None => Catalog::builtin()?,
    };
    debug!(entries = catalog.entries().len(), "catalog loaded");

    let cwd = std::env::current_dir().context("reading current directory")?;
    let overrides = config::load_overrides(&cwd, cli.overrides.as_deref())?;
    debug!(count = overrides.len(), "overrides loaded");

    let highlight = cli
        .highlight
        .as_deref()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("invalid --highlight pattern {:?}", pattern))
        })
        .transpose()?;

    let spinner = if std::io::stderr().is_terminal() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(format!("resolving {}", cli.path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let tree = engine::resolve_licenses(
        &cli.path,
        &catalog,
        &overrides,
        ResolveOptions {
            include_dev: cli.dev,
        },
    );

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let options = RenderOptions {
        mode: cli.mode(),
        fields: cli.fields(),
        separator: report::unescape_separator(cli.raw_separator()),
        missing_only: cli.missing_only,
        style: Style {
            color: cli.color(),
            highlight,
        },
    };

    let output = report::render(&tree, &options)?;
    if !output.is_empty() {
        println!("{}", output);
    }

    if cli.summary {
        let style = Style {
            color: !cli.no_color && std::io::stderr().is_terminal(),
            highlight: None,
        };
        eprintln!("{}", report::summary::render(&tree, &style));
    }

    Ok(())
}
