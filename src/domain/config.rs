use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, ShelterId};

/// Configuration for a donation matching session.
///
/// This struct holds settings that control how a session is seeded, where
/// synthetic shelter coordinates are placed, and which shelter the demo
/// login resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// Centre of the window new shelters are placed in.
    reference: Coordinate,

    /// Width, in degrees, of the window around the reference point.
    jitter_span: f64,

    /// The shelter the demo login resolves to.
    ///
    /// If this shelter does not exist, the first shelter is used.
    demo_shelter: Option<ShelterId>,

    /// An alternative seed file (YAML) to start the session from.
    pub seed_path: Option<PathBuf>,

    /// Whether to start from seed data at all.
    ///
    /// When `false` the session starts with no shelters and no needs.
    pub seed: bool,

    /// How many needs the `recent` listing shows.
    pub recent_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            jitter_span: default_jitter_span(),
            demo_shelter: Some(default_demo_shelter()),
            seed_path: None,
            seed: true,
            recent_limit: default_recent_limit(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The centre of the window synthetic coordinates are drawn from.
    #[must_use]
    pub const fn reference(&self) -> Coordinate {
        self.reference
    }

    /// Moves the centre of the jitter window.
    pub const fn set_reference(&mut self, reference: Coordinate) {
        self.reference = reference;
    }

    /// Width, in degrees, of the window around the reference point.
    #[must_use]
    pub const fn jitter_span(&self) -> f64 {
        self.jitter_span
    }

    /// Sets the jitter window width.
    ///
    /// Negative and non-finite widths are treated as zero.
    pub fn set_jitter_span(&mut self, span: f64) {
        self.jitter_span = if span.is_finite() { span.max(0.0) } else { 0.0 };
    }

    /// The shelter the demo login resolves to, if configured.
    #[must_use]
    pub const fn demo_shelter(&self) -> Option<&ShelterId> {
        self.demo_shelter.as_ref()
    }

    /// Sets the shelter the demo login resolves to.
    pub fn set_demo_shelter(&mut self, shelter: Option<ShelterId>) {
        self.demo_shelter = shelter;
    }
}

const fn default_reference() -> Coordinate {
    Coordinate::new(47.6062, -122.3321)
}

const fn default_jitter_span() -> f64 {
    0.1
}

fn default_demo_shelter() -> ShelterId {
    ShelterId::new("shelter-1")
}

const fn default_recent_limit() -> usize {
    4
}

const fn default_true() -> bool {
    true
}

fn default_demo_shelter_option() -> Option<ShelterId> {
    Some(default_demo_shelter())
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_latitude")]
        reference_latitude: f64,

        #[serde(default = "default_longitude")]
        reference_longitude: f64,

        /// Width, in degrees, of the jitter window.
        #[serde(default = "default_jitter_span")]
        jitter_span: f64,

        #[serde(
            default = "default_demo_shelter_option",
            skip_serializing_if = "Option::is_none"
        )]
        demo_shelter: Option<ShelterId>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed_path: Option<PathBuf>,

        #[serde(default = "default_true")]
        seed: bool,

        #[serde(default = "default_recent_limit")]
        recent_limit: usize,
    },
}

const fn default_latitude() -> f64 {
    default_reference().latitude
}

const fn default_longitude() -> f64 {
    default_reference().longitude
}

impl TryFrom<Versions> for super::Config {
    type Error = String;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                reference_latitude,
                reference_longitude,
                jitter_span,
                demo_shelter,
                seed_path,
                seed,
                recent_limit,
            } => {
                for (key, value) in [
                    ("reference_latitude", reference_latitude),
                    ("reference_longitude", reference_longitude),
                    ("jitter_span", jitter_span),
                ] {
                    if !value.is_finite() {
                        return Err(format!("{key} must be a finite number (got {value})"));
                    }
                }

                Ok(Self {
                    reference: Coordinate::new(reference_latitude, reference_longitude),
                    jitter_span: jitter_span.max(0.0),
                    demo_shelter,
                    seed_path,
                    seed,
                    recent_limit,
                })
            }
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            reference_latitude: config.reference.latitude,
            reference_longitude: config.reference.longitude,
            jitter_span: config.jitter_span,
            demo_shelter: config.demo_shelter,
            seed_path: config.seed_path,
            seed: config.seed,
            recent_limit: config.recent_limit,
        }
    }
}
