use std::collections::HashSet;

use crate::domain::{Need, Shelter, Status, Urgency, query::sort_by_urgency};

/// How prominently a pin is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// At least one of the shelter's active needs is high urgency.
    HighUrgency,
    /// No high-urgency needs.
    Standard,
}

impl Marker {
    /// Conventional marker colour.
    #[must_use]
    pub const fn colour(self) -> &'static str {
        match self {
            Self::HighUrgency => "red",
            Self::Standard => "blue",
        }
    }
}

/// One shelter on the map with the active needs shown in its popup.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPin<'a> {
    /// The shelter being pinned.
    pub shelter: &'a Shelter,
    /// Its active needs, most urgent first.
    pub needs: Vec<&'a Need>,
    /// Marker emphasis.
    pub marker: Marker,
}

/// Needs currently open to donors.
pub fn active_needs(needs: &[Need]) -> impl Iterator<Item = &Need> {
    needs.iter().filter(|need| need.status == Status::Active)
}

/// Shelters with at least one active need, in shelter order.
pub fn shelters_with_active_needs<'a>(
    shelters: &'a [Shelter],
    needs: &'a [Need],
) -> impl Iterator<Item = &'a Shelter> {
    let owners: HashSet<_> = active_needs(needs).map(|need| &need.shelter_id).collect();
    shelters
        .iter()
        .filter(move |shelter| owners.contains(&shelter.id))
}

/// Builds one pin per shelter that has active needs.
#[must_use]
pub fn map_feed<'a>(shelters: &'a [Shelter], needs: &'a [Need]) -> Vec<MapPin<'a>> {
    shelters_with_active_needs(shelters, needs)
        .map(|shelter| {
            let mut pinned: Vec<&Need> = active_needs(needs)
                .filter(|need| need.shelter_id == shelter.id)
                .collect();
            sort_by_urgency(&mut pinned);

            let marker = if pinned.iter().any(|need| need.urgency == Urgency::High) {
                Marker::HighUrgency
            } else {
                Marker::Standard
            };

            MapPin {
                shelter,
                needs: pinned,
                marker,
            }
        })
        .collect()
}
