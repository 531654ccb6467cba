//! Identity boundary for shelter logins.
//!
//! There is no real account system: the [`DemoAuthenticator`] accepts any
//! plausible credentials and resolves them to a fixed demo shelter. A real
//! identity provider implements [`Authenticator`] instead.

use thiserror::Error;

use crate::domain::{Shelter, ShelterId};

/// What a shelter types into the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates a set of credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Errors that can occur when logging in.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The email address is not plausible.
    #[error("please enter a valid email address")]
    InvalidEmail,
    /// No password was given.
    #[error("please enter a password")]
    MissingPassword,
    /// There is no shelter to log in as.
    #[error("No shelters available to log in.")]
    NoShelters,
}

/// Resolves login credentials to a shelter.
pub trait Authenticator {
    /// Checks `credentials` and returns the shelter they identify.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the credentials are rejected or no
    /// shelter matches.
    fn authenticate(
        &self,
        credentials: &Credentials,
        shelters: &[Shelter],
    ) -> Result<ShelterId, AuthError>;
}

/// Accepts any well-formed credentials and logs in as the demo shelter.
#[derive(Debug, Clone, Default)]
pub struct DemoAuthenticator {
    demo_shelter: Option<ShelterId>,
}

impl DemoAuthenticator {
    /// Resolves every login to `demo_shelter`, or to the first shelter if it
    /// is not set or no longer exists.
    #[must_use]
    pub const fn new(demo_shelter: Option<ShelterId>) -> Self {
        Self { demo_shelter }
    }
}

impl Authenticator for DemoAuthenticator {
    fn authenticate(
        &self,
        credentials: &Credentials,
        shelters: &[Shelter],
    ) -> Result<ShelterId, AuthError> {
        if !is_plausible_email(&credentials.email) {
            return Err(AuthError::InvalidEmail);
        }
        if credentials.password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let configured = self
            .demo_shelter
            .as_ref()
            .and_then(|id| shelters.iter().find(|shelter| shelter.id() == id));

        configured
            .or_else(|| shelters.first())
            .map(|shelter| shelter.id().clone())
            .ok_or(AuthError::NoShelters)
    }
}

/// Whether `email` has a local part and a domain around a single `@`.
pub(crate) fn is_plausible_email(email: &str) -> bool {
    email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        })
}
