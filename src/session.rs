pub mod auth;
pub mod geo;
pub mod seed;
mod store;

pub use auth::{AuthError, Authenticator, Credentials, DemoAuthenticator};
pub use geo::{CoordinateProvider, FixedCoordinates, JitteredCoordinates};
pub use seed::{Seed, SeedError};
pub use store::{Dashboard, IntegrityError, Intent, PledgeReceipt, Store, StoreError, Update};
