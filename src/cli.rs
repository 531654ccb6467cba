use std::{
    io::{self, IsTerminal},
    path::{Path, PathBuf},
};

mod account;
mod browse;
mod config;
mod dashboard;
mod impact;
mod map;
mod pledge;
mod render;
mod shell;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use donorlink::Config;
use shell::{Flow, Session};
use tracing::instrument;

/// The file looked for in the working directory when `--config` is not given.
const DEFAULT_CONFIG: &str = "donorlink.toml";

/// Parse a unit count.
///
/// Negative numbers are accepted and treated as zero so that the domain
/// reports the valid range, rather than the parser rejecting the sign.
fn parse_quantity(s: &str) -> Result<u32, String> {
    let value: i64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a whole number"))?;
    Ok(u32::try_from(value.max(0)).unwrap_or(u32::MAX))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file (default: ./donorlink.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

        self.command
            .unwrap_or(Command::Shell)
            .run(&config_path, self.config.is_some())
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Start an interactive session (default)
    ///
    /// Commands are read from standard input, one per line. Type `help` for
    /// the list of session commands.
    Shell,

    /// Run session commands non-interactively
    ///
    /// Each argument is one command line, executed in order against a single
    /// fresh session.
    ///
    /// Example:
    ///   donorlink run "browse --category food" "pledge need-2 10"
    Run(Run),

    /// Show or modify configuration settings
    Config(config::Command),
}

impl Command {
    fn run(self, config_path: &Path, explicit: bool) -> anyhow::Result<()> {
        match self {
            Self::Shell => {
                let mut session = Session::from_config(load_config(config_path, explicit)?)?;
                let stdin = io::stdin();
                let prompt = stdin.is_terminal();
                shell::run(&mut session, stdin.lock(), &mut io::stdout().lock(), prompt)
            }
            Self::Run(command) => command.run(load_config(config_path, explicit)?),
            Self::Config(command) => command.run(config_path, &mut io::stdout().lock()),
        }
    }
}

/// Loads the configuration.
///
/// A missing default file means "use the defaults"; a missing file that was
/// named explicitly is an error.
fn load_config(path: &Path, explicit: bool) -> anyhow::Result<Config> {
    if !explicit && !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    Config::load(path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

#[derive(Debug, clap::Parser)]
pub struct Run {
    /// Command lines to execute, in order
    #[arg(required = true, value_name = "LINE")]
    lines: Vec<String>,
}

impl Run {
    #[instrument(skip(config))]
    fn run(self, config: Config) -> anyhow::Result<()> {
        let mut session = Session::from_config(config)?;
        let mut out = io::stdout().lock();

        for line in &self.lines {
            if session.execute_line(line, &mut out)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("7", 7; "positive")]
    #[test_case(" 12 ", 12; "padded")]
    #[test_case("0", 0; "zero")]
    #[test_case("-3", 0; "negative")]
    #[test_case("99999999999", u32::MAX; "too large")]
    fn quantities_parse_leniently(input: &str, expected: u32) {
        assert_eq!(parse_quantity(input).unwrap(), expected);
    }

    #[test]
    fn non_numeric_quantity_is_rejected() {
        assert_eq!(
            parse_quantity("lots").unwrap_err(),
            "'lots' is not a whole number"
        );
    }

    #[test]
    fn missing_default_config_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load_config(&tmp.path().join(DEFAULT_CONFIG), false).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_config(&tmp.path().join("custom.toml"), true).is_err());
    }
}
