use std::{convert::Infallible, fmt, str::FromStr};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::domain::short_token;

/// Characters left unescaped in a URI component.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/?api=1&destination=";

/// Opaque identifier of a [`Shelter`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShelterId(String);

impl ShelterId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier of the form `shelter-<8 hex digits>`.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("shelter-{}", short_token()))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShelterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShelterId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude, positive north.
    pub latitude: f64,
    /// Longitude, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// The details a shelter provides when signing up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelterProfile {
    /// Display name.
    pub name: String,
    /// Street address.
    pub street: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
}

/// An organisation that posts needs.
///
/// Shelters never change after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Shelter {
    pub(crate) id: ShelterId,
    pub(crate) profile: ShelterProfile,
    pub(crate) coordinate: Coordinate,
}

impl Shelter {
    /// Creates a shelter from its identity, profile and location.
    #[must_use]
    pub const fn new(id: ShelterId, profile: ShelterProfile, coordinate: Coordinate) -> Self {
        Self {
            id,
            profile,
            coordinate,
        }
    }

    /// The shelter's identifier.
    #[must_use]
    pub const fn id(&self) -> &ShelterId {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.profile.name
    }

    /// The full profile.
    #[must_use]
    pub const fn profile(&self) -> &ShelterProfile {
        &self.profile
    }

    /// Contact email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.profile.email
    }

    /// Contact phone number.
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.profile.phone
    }

    /// Location on the map.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// The postal address on one line: `street, city, state`.
    #[must_use]
    pub fn address(&self) -> String {
        format!(
            "{}, {}, {}",
            self.profile.street, self.profile.city, self.profile.state
        )
    }

    /// A link to driving directions to the shelter.
    #[must_use]
    pub fn directions_url(&self) -> String {
        let address = self.address();
        let destination = utf8_percent_encode(&address, URI_COMPONENT);
        format!("{DIRECTIONS_BASE}{destination}")
    }
}
