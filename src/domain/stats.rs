use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{ItemType, Need, ShelterId, Status};

/// Each fulfilled need is assumed to have connected this many donors.
const DONORS_PER_FULFILLED_NEED: usize = 3;

/// Counts shown at the top of a shelter's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardSummary {
    /// Needs open to donors.
    pub active: usize,
    /// Needs with a pledge awaiting confirmation.
    pub pending: usize,
    /// Needs the shelter has confirmed.
    pub fulfilled: usize,
}

impl DashboardSummary {
    /// Counts the needs owned by `shelter` by status.
    #[must_use]
    pub fn for_shelter(needs: &[Need], shelter: &ShelterId) -> Self {
        needs
            .iter()
            .filter(|need| &need.shelter_id == shelter)
            .fold(Self::default(), |mut summary, need| {
                match need.status {
                    Status::Active => summary.active += 1,
                    Status::Pending => summary.pending += 1,
                    Status::Fulfilled => summary.fulfilled += 1,
                }
                summary
            })
    }
}

/// Community-wide totals for the impact page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImpactSummary {
    /// Units of fulfilled food needs.
    pub meals_shared: u64,
    /// Distinct shelters that have posted needs.
    pub shelters_served: usize,
    /// Units of all fulfilled needs.
    pub items_donated: u64,
    /// Estimated donors reached.
    pub donors_connected: usize,
}

impl ImpactSummary {
    /// Aggregates the whole catalogue.
    ///
    /// Fulfilled needs count their posted total, which is what the shelter
    /// reports as received.
    #[must_use]
    pub fn from_needs(needs: &[Need]) -> Self {
        let shelters_served = needs
            .iter()
            .map(|need| &need.shelter_id)
            .collect::<HashSet<_>>()
            .len();

        let fulfilled = needs
            .iter()
            .filter(|need| need.status == Status::Fulfilled);

        let mut summary = Self {
            shelters_served,
            ..Self::default()
        };
        for need in fulfilled {
            let units = u64::from(need.original_quantity);
            summary.items_donated += units;
            if need.item_type == ItemType::Food {
                summary.meals_shared += units;
            }
            summary.donors_connected += DONORS_PER_FULFILLED_NEED;
        }
        summary
    }
}
