//! Donation matching between shelters and donors
//!
//! Shelters post needs, donors browse and pledge against them. All state is
//! held in memory for a single session.

pub mod domain;
pub use domain::{
    Config, Coordinate, ItemType, LifecycleError, Need, NeedId, NewNeed, Shelter, ShelterId,
    ShelterProfile, Status, Urgency,
};

/// The in-memory session: store, identity and seed data.
pub mod session;
pub use session::{Intent, Seed, Store, StoreError};
