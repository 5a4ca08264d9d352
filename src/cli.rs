use std::path::PathBuf;

use clap::Parser;

use crate::engine::Stage;

#[derive(Parser, Debug)]
#[command(
    name = "manifest-remediator",
    about = "Find changed dependencies in a pull request diff and suggest policy-compliant versions",
    version
)]
pub struct Cli {
    /// Changed files: a JSON array of {"filename", "patch"} or a git diff; `-` reads stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// How to read the input
    #[arg(long, default_value = "auto", value_name = "FORMAT")]
    pub input_format: InputFormat,

    /// Config file [default: ./.manifest-remediator/config.toml, fallback ~/.config/manifest-remediator/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Policy engine base URL (overrides [engine].url)
    #[arg(long, value_name = "URL")]
    pub iq_url: Option<String>,

    /// Policy engine user (overrides [engine].username)
    #[arg(long, value_name = "USER")]
    pub iq_user: Option<String>,

    /// Policy engine password (overrides [engine].password)
    #[arg(long, value_name = "PASSWORD", env = "IQ_PASSWORD", hide_env_values = true)]
    pub iq_password: Option<String>,

    /// Application public id whose policies apply (overrides [engine].application)
    #[arg(long, value_name = "APP")]
    pub iq_app: Option<String>,

    /// Evaluation stage (overrides [engine].stage)
    #[arg(long, value_name = "STAGE")]
    pub stage: Option<Stage>,

    /// Only list changed dependencies; do not contact the policy engine
    #[arg(long)]
    pub extract_only: bool,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Log filter, e.g. `info` or `manifest_remediator=debug`
    #[arg(long, default_value = "warn", value_name = "FILTER")]
    pub log_level: String,

    /// Show every changed dependency and the rendered comments
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// JSON when the input starts with `[`, git diff otherwise
    Auto,
    Json,
    Diff,
}
