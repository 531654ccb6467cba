use std::{io::Write, path::Path};

use donorlink::{Config, ShelterId};
use tracing::instrument;

use crate::cli::terminal::Colorize;

const KEYS: &[&str] = &[
    "reference_latitude",
    "reference_longitude",
    "jitter_span",
    "demo_shelter",
    "seed_path",
    "seed",
    "recent_limit",
];

#[derive(Debug, clap::Parser)]
/// Show or modify configuration settings
///
/// Configuration is stored in donorlink.toml (or the file given with
/// --config) and controls how sessions start.
///
/// Available configuration keys:
///   `reference_latitude`   Centre of new shelter locations (default: 47.6062)
///   `reference_longitude`  Centre of new shelter locations (default: -122.3321)
///   `jitter_span`          Width in degrees of the placement window (default: 0.1)
///   `demo_shelter`         Shelter the demo login resolves to (default: shelter-1)
///   `seed_path`            YAML file to seed sessions from (default: built-in data)
///   seed                 Start from seed data at all (default: true)
///   `recent_limit`         Needs listed by `recent` (default: 4)
pub struct Command {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, clap::Parser)]
enum ConfigCommand {
    /// Show all configuration values
    Show,

    /// Get a specific configuration value
    Get {
        /// Configuration key to retrieve
        key: String,
    },

    /// Set a configuration value
    ///
    /// Examples:
    ///   donorlink config set `recent_limit` 6
    ///   donorlink config set `demo_shelter` shelter-2
    ///   donorlink config set `seed_path` none
    Set {
        /// Configuration key to set
        key: String,

        /// Value to set ("none" clears optional values)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Write a configuration file with the default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    #[instrument(skip(out))]
    pub fn run(self, config_path: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
        match self.command {
            ConfigCommand::Show => Self::show_config(config_path, out),
            ConfigCommand::Get { key } => Self::get_config(config_path, &key, out),
            ConfigCommand::Set { key, value } => Self::set_config(config_path, &key, &value, out),
            ConfigCommand::Init { force } => Self::init_config(config_path, force, out),
        }
    }

    fn load(config_path: &Path) -> anyhow::Result<Config> {
        if config_path.exists() {
            Config::load(config_path).map_err(|e| anyhow::anyhow!("{e}"))
        } else {
            Ok(Config::default())
        }
    }

    fn show_config(config_path: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
        let config = Self::load(config_path)?;

        let source = if config_path.exists() {
            config_path.display().to_string()
        } else {
            "defaults".to_string()
        };
        writeln!(out, "Configuration ({}):", source.dim())?;
        for key in KEYS {
            writeln!(out, "  {key}: {}", value_of(&config, key).unwrap_or_default())?;
        }
        Ok(())
    }

    fn get_config(config_path: &Path, key: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let config = Self::load(config_path)?;
        let Some(value) = value_of(&config, key) else {
            anyhow::bail!(
                "Unknown configuration key: '{key}'\n\nAvailable keys:\n  {}",
                KEYS.join("\n  ")
            );
        };
        writeln!(out, "{value}")?;
        Ok(())
    }

    fn set_config(
        config_path: &Path,
        key: &str,
        value: &str,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let mut config = Self::load(config_path)?;
        let cleared = value.eq_ignore_ascii_case("none");

        match key {
            "reference_latitude" | "reference_longitude" => {
                let degrees = parse_degrees(value)?;
                let mut reference = config.reference();
                if key == "reference_latitude" {
                    reference.latitude = degrees;
                } else {
                    reference.longitude = degrees;
                }
                config.set_reference(reference);
            }
            "jitter_span" => config.set_jitter_span(parse_degrees(value)?),
            "demo_shelter" => {
                config.set_demo_shelter((!cleared).then(|| ShelterId::new(value.trim())));
            }
            "seed_path" => config.seed_path = (!cleared).then(|| value.trim().into()),
            "seed" => {
                config.seed = value
                    .parse::<bool>()
                    .map_err(|_| anyhow::anyhow!("Value must be 'true' or 'false'"))?;
            }
            "recent_limit" => {
                config.recent_limit = value
                    .parse::<usize>()
                    .map_err(|_| anyhow::anyhow!("Value must be a non-negative whole number"))?;
            }
            _ => {
                anyhow::bail!(
                    "Unknown configuration key: '{key}'\n\nAvailable keys:\n  {}",
                    KEYS.join("\n  ")
                );
            }
        }

        config
            .save(config_path)
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        let value = value_of(&config, key).unwrap_or_default();
        writeln!(out, "{}", format!("{key} = {value}").success())?;
        Ok(())
    }

    fn init_config(config_path: &Path, force: bool, out: &mut dyn Write) -> anyhow::Result<()> {
        if config_path.exists() && !force {
            anyhow::bail!(
                "Configuration already exists at {} (use --force to overwrite)",
                config_path.display()
            );
        }

        Config::default()
            .save(config_path)
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        writeln!(
            out,
            "{}",
            format!("Wrote default configuration to {}", config_path.display()).success()
        )?;
        Ok(())
    }
}

fn parse_degrees(value: &str) -> anyhow::Result<f64> {
    let degrees: f64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Value must be a number of degrees"))?;
    anyhow::ensure!(degrees.is_finite(), "Value must be a finite number");
    Ok(degrees)
}

fn value_of(config: &Config, key: &str) -> Option<String> {
    let value = match key {
        "reference_latitude" => config.reference().latitude.to_string(),
        "reference_longitude" => config.reference().longitude.to_string(),
        "jitter_span" => config.jitter_span().to_string(),
        "demo_shelter" => config
            .demo_shelter()
            .map_or_else(|| "none".to_string(), ToString::to_string),
        "seed_path" => config
            .seed_path
            .as_ref()
            .map_or_else(|| "none".to_string(), |path| path.display().to_string()),
        "seed" => config.seed.to_string(),
        "recent_limit" => config.recent_limit.to_string(),
        _ => return None,
    };
    Some(value)
}
