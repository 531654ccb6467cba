//! Initial data for a session.
//!
//! A seed is a YAML document with `shelters` and `needs` lists. The built-in
//! seed is compiled into the binary; an alternative file can be named in the
//! configuration.

use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{TimeDelta, Utc};
use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        Coordinate, ItemType, Need, NeedId, Shelter, ShelterId, ShelterProfile, Status, Urgency,
    },
    session::{IntegrityError, Store},
};

const BUILTIN: &str = include_str!("seed.yaml");

/// Errors that can occur when loading seed data.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The seed file could not be read.
    #[error("failed to read seed file '{}': {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The document is not valid seed YAML.
    #[error("failed to parse seed data: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A need record breaks a lifecycle invariant.
    #[error("invalid need '{id}' in seed data: {reason}")]
    InvalidNeed {
        /// The offending record.
        id: NeedId,
        /// What is wrong with it.
        reason: String,
    },

    /// The records do not reference each other consistently.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Shelters and needs to start a session from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    shelters: Vec<ShelterRecord>,
    #[serde(default)]
    needs: Vec<NeedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ShelterRecord {
    id: ShelterId,
    name: String,
    street: String,
    city: String,
    state: String,
    email: String,
    phone: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NeedRecord {
    id: NeedId,
    shelter_id: ShelterId,
    item_type: ItemType,
    name: String,
    #[serde(default)]
    description: String,
    urgency: Urgency,
    status: Status,
    original_quantity: u32,
    quantity: u32,
}

impl Seed {
    /// The mock data set shipped with the application.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded document is malformed.
    pub fn builtin() -> Result<Self, SeedError> {
        Self::from_yaml(BUILTIN)
    }

    /// A seed with no shelters and no needs.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a seed from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Yaml`] if the document does not parse.
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads a seed file.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Io`] if the file cannot be read, or
    /// [`SeedError::Yaml`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded seed from {}", path.display());
        Self::from_yaml(&yaml)
    }

    /// Number of shelter records.
    #[must_use]
    pub fn shelter_count(&self) -> usize {
        self.shelters.len()
    }

    /// Number of need records.
    #[must_use]
    pub fn need_count(&self) -> usize {
        self.needs.len()
    }

    /// Builds a store from the seed, with nobody signed in.
    ///
    /// Needs keep seed order. Posting times count back one minute per record
    /// so that the first record is the newest.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::InvalidNeed`] if a record breaks a need invariant
    /// and [`SeedError::Integrity`] if ids clash or dangle.
    pub fn into_store(self) -> Result<Store, SeedError> {
        let shelters = self.shelters.into_iter().map(ShelterRecord::into_shelter).collect();

        let mut posted = Utc::now();
        let mut needs = Vec::with_capacity(self.needs.len());
        for record in self.needs {
            let mut need = record.into_need()?;
            need.posted = posted;
            needs.push(need);
            posted -= TimeDelta::minutes(1);
        }

        Ok(Store::new(shelters, needs)?)
    }
}

impl ShelterRecord {
    fn into_shelter(self) -> Shelter {
        Shelter::new(
            self.id,
            ShelterProfile {
                name: self.name,
                street: self.street,
                city: self.city,
                state: self.state,
                email: self.email,
                phone: self.phone,
            },
            Coordinate::new(self.latitude, self.longitude),
        )
    }
}

impl NeedRecord {
    fn into_need(self) -> Result<Need, SeedError> {
        let invalid = |reason: String| SeedError::InvalidNeed {
            id: self.id.clone(),
            reason,
        };

        if self.quantity > self.original_quantity {
            return Err(invalid(format!(
                "remaining quantity {} exceeds the posted total {}",
                self.quantity, self.original_quantity
            )));
        }
        let name = NonEmptyString::new(self.name.trim().to_string())
            .map_err(|_| invalid("name must not be empty".to_string()))?;

        Ok(Need {
            id: self.id,
            shelter_id: self.shelter_id,
            item_type: self.item_type,
            name,
            description: self.description,
            urgency: self.urgency,
            status: self.status,
            original_quantity: self.original_quantity,
            quantity: self.quantity,
            posted: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_seed_builds_a_consistent_store() {
        let seed = Seed::builtin().unwrap();
        assert_eq!(seed.shelter_count(), 4);
        assert_eq!(seed.need_count(), 10);

        let store = seed.into_store().unwrap();
        assert!(store.active_shelter().is_none());
        assert!(
            store
                .needs()
                .iter()
                .all(|need| need.quantity() <= need.original_quantity())
        );
        assert!(
            store
                .needs()
                .windows(2)
                .all(|pair| pair[0].posted() > pair[1].posted())
        );
    }

    #[test]
    fn builtin_demo_shelter_exists() {
        let store = Seed::builtin().unwrap().into_store().unwrap();
        assert!(store.shelter(&ShelterId::new("shelter-1")).is_some());
    }

    #[test]
    fn empty_seed_builds_an_empty_store() {
        let store = Seed::empty().into_store().unwrap();
        assert!(store.shelters().is_empty());
        assert!(store.needs().is_empty());
    }

    const ONE_SHELTER: &str = "
shelters:
  - id: s1
    name: One
    street: 1 Main St
    city: Seattle
    state: WA
    email: one@example.org
    phone: '555'
    latitude: 47.0
    longitude: -122.0
";

    #[test]
    fn dangling_shelter_reference_is_an_integrity_error() {
        let yaml = format!(
            "{ONE_SHELTER}needs:
  - id: n1
    shelter_id: s2
    item_type: Food
    name: Rice
    urgency: Low
    status: Active
    original_quantity: 3
    quantity: 3
"
        );
        let err = Seed::from_yaml(&yaml).unwrap().into_store().unwrap_err();
        assert!(matches!(
            err,
            SeedError::Integrity(IntegrityError::MissingShelter { .. })
        ));
    }

    #[test]
    fn remainder_above_total_is_rejected() {
        let yaml = format!(
            "{ONE_SHELTER}needs:
  - id: n1
    shelter_id: s1
    item_type: food
    name: Rice
    urgency: Low
    status: Active
    original_quantity: 3
    quantity: 4
"
        );
        // Labels in seed files are case-sensitive variant names.
        assert!(matches!(Seed::from_yaml(&yaml), Err(SeedError::Yaml(_))));

        let yaml = yaml.replace("item_type: food", "item_type: Food");
        let err = Seed::from_yaml(&yaml).unwrap().into_store().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid need 'n1' in seed data: remaining quantity 4 exceeds the posted total 3"
        );
    }

    #[test]
    fn load_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ONE_SHELTER.as_bytes()).unwrap();

        let seed = Seed::load(file.path()).unwrap();
        assert_eq!(seed.shelter_count(), 1);
        assert_eq!(seed.need_count(), 0);
    }

    #[test]
    fn load_missing_file_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Seed::load(&tmp.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
        assert!(err.to_string().starts_with("failed to read seed file"));
    }
}
