//! Coordinates for newly registered shelters.
//!
//! Addresses are not geocoded. [`JitteredCoordinates`] places each new
//! shelter at a random point near a reference location; a geocoding service
//! would implement [`CoordinateProvider`] from the address fields instead.

use rand::Rng;

use crate::domain::{Coordinate, ShelterProfile};

/// Chooses a map location for a shelter.
pub trait CoordinateProvider {
    /// The location to record for a shelter with this profile.
    fn locate(&self, profile: &ShelterProfile) -> Coordinate;
}

/// Places shelters uniformly at random inside a square window centred on a
/// reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitteredCoordinates {
    reference: Coordinate,
    span: f64,
}

impl JitteredCoordinates {
    /// Creates a provider drawing from `reference ± span / 2` on each axis.
    #[must_use]
    pub const fn new(reference: Coordinate, span: f64) -> Self {
        Self { reference, span }
    }
}

impl CoordinateProvider for JitteredCoordinates {
    fn locate(&self, _profile: &ShelterProfile) -> Coordinate {
        if !self.span.is_finite() || self.span <= 0.0 {
            return self.reference;
        }

        let half = self.span / 2.0;
        let mut rng = rand::rng();
        Coordinate::new(
            self.reference.latitude + rng.random_range(-half..half),
            self.reference.longitude + rng.random_range(-half..half),
        )
    }
}

/// Always returns the same coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCoordinates(pub Coordinate);

impl CoordinateProvider for FixedCoordinates {
    fn locate(&self, _profile: &ShelterProfile) -> Coordinate {
        self.0
    }
}
