//! `manifest-remediator` — find dependencies a pull request changes and suggest
//! versions that satisfy the organization's policies.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and set up logging.
//! 2. Load engine settings ([`config::load_config`]), then apply CLI overrides.
//! 3. Read the changed files ([`input`]) and walk each patch ([`diff`]).
//! 4. Extract added or changed components per manifest ([`extractor`]).
//! 5. Ask the policy engine for replacements ([`remediation`], [`engine`]).
//! 6. Render review comments and the requested report ([`report`]).
//! 7. Exit `0` (nothing to remediate) or `1` (at least one remediation).

mod cli;
mod config;
mod diff;
mod engine;
mod extractor;
mod input;
mod models;
mod purl;
mod remediation;
mod report;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ReportFormat};
use config::{load_config, Config};
use engine::iq::IqClient;
use extractor::find_components;
use input::load_changed_files;
use models::RemediationResult;
use remediation::{resolve, ResolveOptions};
use report::{post_remediations, RenderedComment};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let cwd = std::env::current_dir()?;
    let mut config = load_config(&cwd, cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    let files = load_changed_files(&cli.input, cli.input_format)?;
    let extraction = find_components(&files);

    let components: usize = extraction.values().map(|l| l.len()).sum();
    info!(files = files.len(), manifests = extraction.len(), components, "extracted components");

    let remediations = if cli.extract_only {
        None
    } else {
        Some(remediate(&config, &extraction, components, cli.quiet).await?)
    };

    let mut comments: Vec<RenderedComment> = Vec::new();
    if let Some(result) = &remediations {
        post_remediations(result, &mut comments);
    }

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(
                &report::terminal::Summary {
                    files: files.len(),
                    extraction: &extraction,
                    remediations: remediations.as_ref(),
                    comments: &comments,
                },
                cli.verbose,
                cli.quiet,
            )?;
        }
        ReportFormat::Json => {
            println!(
                "{}",
                report::json::render(&extraction, remediations.as_ref(), &comments)?
            );
        }
    }

    // Exit code: 1 if any remediation was found
    if remediations.is_some_and(|r| !r.is_empty()) {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    let engine = &mut config.engine;
    if let Some(url) = &cli.iq_url {
        engine.url = Some(url.clone());
    }
    if let Some(user) = &cli.iq_user {
        engine.username = user.clone();
    }
    if let Some(password) = &cli.iq_password {
        engine.password = password.clone();
    }
    if let Some(app) = &cli.iq_app {
        engine.application = Some(app.clone());
    }
    if let Some(stage) = cli.stage {
        engine.stage = stage;
    }
}

async fn remediate(
    config: &Config,
    extraction: &models::ManifestExtraction,
    components: usize,
    quiet: bool,
) -> Result<RemediationResult> {
    let application = config.engine.require_application()?;
    let client = IqClient::new(&config.engine)?;

    if !quiet {
        eprintln!(
            "  {} evaluating {} components against {} ({})",
            "→".cyan(),
            components,
            application,
            config.engine.stage
        );
    }

    let pb = if !quiet && components > 0 {
        let pb = ProgressBar::new(components as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let options = ResolveOptions {
        application,
        stage: config.engine.stage,
        batch_size: config.remediation.batch_size,
    };
    let result = resolve(&client, &options, extraction, pb.as_ref()).await;

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    Ok(result)
}
