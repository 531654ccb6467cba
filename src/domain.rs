//! Domain models for donation matching.
//!
//! This module contains the core domain types including shelters, needs and
//! their lifecycle, the donor-facing query engine and configuration.

/// Needs posted by shelters and their lifecycle transitions.
pub mod need;
pub use need::{
    Acknowledgement, ItemType, LifecycleError, Need, NeedId, NewNeed, ParseLabelError, Progress,
    Status, Urgency,
};

/// Shelters and their locations.
pub mod shelter;
pub use shelter::{Coordinate, Shelter, ShelterId, ShelterProfile};

/// Filtering and ordering of needs for donors.
pub mod query;
pub use query::{Filter, Query, Selection, SortKey};

/// The feed consumed by map renderers.
pub mod feed;
pub use feed::{MapPin, Marker};

/// Aggregate counts for dashboards and the impact page.
pub mod stats;
pub use stats::{DashboardSummary, ImpactSummary};

mod config;
pub use config::Config;

/// Returns a short random token used to build opaque identifiers.
pub(crate) fn short_token() -> String {
    let mut token = uuid::Uuid::new_v4().simple().to_string();
    token.truncate(8);
    token
}
