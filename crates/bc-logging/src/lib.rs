// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging setup for Becon binaries
//!
//! Console crates (`bc_*`) log at the requested level while third-party
//! crates such as `reqwest` and `hyper` stay at `warn`. `RUST_LOG` replaces
//! the whole default filter when set.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing::Level;

/// Tracing targets of the console crates
const CONSOLE_TARGETS: &[&str] = &[
    "bc_cli",
    "bc_client_mock",
    "bc_config",
    "bc_core",
    "bc_rest_client",
];

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, Display, EnumString, clap::ValueEnum, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    /// One JSON object per event
    Json,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, Display, EnumString, clap::ValueEnum, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CliLogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

/// Where log events are written
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogDestination {
    /// Stdout is left to command output
    Stderr,
    File(PathBuf),
}

/// Logging flags for `#[command(flatten)]`
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliLoggingArgs {
    /// Log verbosity for console crates (default: warn)
    #[arg(long, value_enum, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<CliLogLevel>,

    /// Log output format (default: plaintext)
    #[arg(long, value_enum, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,

    /// Write logs to `<dir>/<component>.log` instead of stderr
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Write logs to this file; relative paths are resolved against `--log-dir`
    #[arg(long, global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl CliLoggingArgs {
    pub fn init(&self, component: &str) -> anyhow::Result<()> {
        let level = self.log_level.unwrap_or_default().into();
        let format = self.log_format.unwrap_or_default();
        match self.destination(component) {
            LogDestination::Stderr => init(component, level, format),
            LogDestination::File(path) => init_to_file(component, level, format, &path),
        }
    }

    pub fn destination(&self, component: &str) -> LogDestination {
        let path = match (&self.log_file, &self.log_dir) {
            (Some(file), Some(dir)) if file.is_relative() => dir.join(file),
            (Some(file), _) => file.clone(),
            (None, Some(dir)) => dir.join(log_file_name(component)),
            (None, None) => return LogDestination::Stderr,
        };
        LogDestination::File(path)
    }
}

fn log_file_name(component: &str) -> String {
    format!("{}.log", component)
}

/// Initialize logging to stderr
pub fn init(component: &str, default_level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, default_level, format, io::stderr)
}

/// Initialize logging to `log_path`, appending and creating parent directories
pub fn init_to_file(
    component: &str,
    default_level: Level,
    format: LogFormat,
    log_path: &Path,
) -> anyhow::Result<()> {
    match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)?,
        _ => {}
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    init_with_writer(component, default_level, format, file)
}

pub fn init_with_writer<W>(
    component: &str,
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(component, default_level))?,
    };
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt_layer.json().flatten_event(true)).try_init()?,
        LogFormat::Plaintext => registry.with(fmt_layer).try_init()?,
    }
    Ok(())
}

/// Filter directive used when `RUST_LOG` is unset
///
/// `component` may use dashes; it is matched as the underscored target.
pub fn default_filter(component: &str, level: Level) -> String {
    let component = component.replace('-', "_");
    let mut directives = vec![Level::WARN.to_string().to_lowercase()];
    directives.extend(
        CONSOLE_TARGETS
            .iter()
            .copied()
            .chain((!CONSOLE_TARGETS.contains(&component.as_str())).then_some(component.as_str()))
            .map(|target| format!("{}={}", target, level.to_string().to_lowercase())),
    );
    directives.join(",")
}

/// Placeholder for credentials in log fields
///
/// ```rust
/// use bc_logging::redact;
///
/// let token = "eyJhbGciOi...";
/// tracing::info!(token = %redact(token), "Token configured");
/// ```
pub fn redact(_value: impl std::fmt::Display) -> &'static str {
    "[REDACTED]"
}
