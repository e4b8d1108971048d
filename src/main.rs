mod cli;
mod config;
mod output;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::Cli;
use config::UntrakConfig;
use log::info;
use reconcile::{Resource, aggregate, local_sources};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "untrak", &mut io::stdout());
        return Ok(());
    }

    let config = UntrakConfig::load(&config::expand_path(&cli.config))?;
    let untracked = find_untracked(&cli.root, &config, cli.quiet)?;

    let mut out = io::stdout().lock();
    output::render(cli.output, &untracked.iter().collect::<Vec<_>>(), &mut out)?;
    out.flush()?;
    Ok(())
}

/// Load both sides and return the observed resources nobody declared
fn find_untracked(root: &Path, config: &UntrakConfig, quiet: bool) -> Result<Vec<Resource>> {
    // The two sides share nothing, so they load side by side
    let (declared, observed) = rayon::join(
        || load_declared(root, config),
        || aggregate(&config.observed_sources()),
    );
    let declared = declared.context("Failed to load declared resources")?;
    let observed = observed.context("Failed to load observed resources")?;
    info!(
        "{} declared, {} observed resources",
        declared.len(),
        observed.len()
    );

    if declared.is_empty() && !quiet {
        ui::warn(&format!(
            "No declared resources found in {}, every observed resource is untracked",
            root.display()
        ));
    }

    let untracked: Vec<Resource> =
        reconcile::untracked(&declared, &observed, &config.exclusion_policy())
            .into_iter()
            .cloned()
            .collect();
    info!("{} untracked resources", untracked.len());
    Ok(untracked)
}

/// Local manifests under `root`, plus any configured `in` commands
fn load_declared(root: &Path, config: &UntrakConfig) -> reconcile::Result<Vec<Resource>> {
    let mut sources = local_sources(root)?;
    sources.extend(config.declared_sources());
    aggregate(&sources)
}
