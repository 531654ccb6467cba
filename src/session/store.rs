//! The in-memory session store
//!
//! The [`Store`] is the single owner of the shelters, the needs and the
//! signed-in shelter. Every mutation goes through [`Store::dispatch`] as an
//! [`Intent`]; the higher-level operations validate their input, compute the
//! next record with the pure lifecycle functions on [`Need`], and then
//! dispatch. A failed operation leaves the store untouched.

use std::collections::HashSet;

use tracing::instrument;

use crate::{
    domain::{
        Acknowledgement, DashboardSummary, ImpactSummary, LifecycleError, MapPin, Need, NeedId,
        NewNeed, Query, Selection, Shelter, ShelterId, ShelterProfile, Status, Urgency, feed,
        query,
    },
    session::{AuthError, Authenticator, CoordinateProvider, Credentials, auth},
};

/// A named mutation of the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Insert a need at the front of the collection.
    CreateNeed(Need),
    /// Replace the need with the same id.
    UpdateNeed(Need),
    /// Remove a need.
    DeleteNeed(NeedId),
    /// Register a shelter.
    CreateShelter(Shelter),
    /// Sign a shelter in, or sign out with `None`.
    SetActiveShelter(Option<ShelterId>),
}

/// The collections violate a referential invariant.
///
/// These indicate corrupt seed data or a bug, never a user mistake.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// A need refers to a shelter that does not exist.
    #[error("need '{need}' refers to unknown shelter '{shelter}'")]
    MissingShelter {
        /// The need holding the dangling reference.
        need: NeedId,
        /// The shelter it refers to.
        shelter: ShelterId,
    },

    /// Two shelters share an id.
    #[error("duplicate shelter id '{0}'")]
    DuplicateShelter(ShelterId),

    /// Two needs share an id.
    #[error("duplicate need id '{0}'")]
    DuplicateNeed(NeedId),
}

/// Errors returned by store operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// No need has this id.
    #[error("no need with id '{0}'")]
    UnknownNeed(NeedId),

    /// No shelter has this id.
    #[error("no shelter with id '{0}'")]
    UnknownShelter(ShelterId),

    /// The operation needs a signed-in shelter.
    #[error("please log in as a shelter first")]
    NotSignedIn,

    /// The need belongs to a different shelter.
    #[error("need '{0}' belongs to another shelter")]
    NotOwner(NeedId),

    /// Donors may only pledge against active needs.
    #[error("need '{0}' is no longer accepting pledges")]
    NotAcceptingPledges(NeedId),

    /// A required sign-up field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A lifecycle transition was refused.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Login failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The collections are inconsistent.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl StoreError {
    /// Whether this error signals inconsistent data rather than bad input.
    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

/// The outcome of a change that may turn out to be a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// The need was replaced with this record.
    Updated(Need),
    /// The need already had the requested value.
    Unchanged,
}

/// Everything a donor needs to know after pledging.
#[derive(Debug, Clone, PartialEq)]
pub struct PledgeReceipt {
    /// The need after the pledge.
    pub need: Need,
    /// The shelter to deliver to.
    pub shelter: Shelter,
    /// The message shown to the donor.
    pub acknowledgement: Acknowledgement,
    /// Units pledged.
    pub donated: u32,
}

/// A shelter's view of its own postings.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard<'a> {
    /// The signed-in shelter.
    pub shelter: &'a Shelter,
    /// Counts by status.
    pub summary: DashboardSummary,
    /// Its needs, newest first.
    pub needs: Vec<&'a Need>,
}

/// Shelters, needs and the active session identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    shelters: Vec<Shelter>,
    needs: Vec<Need>,
    active: Option<ShelterId>,
}

impl Store {
    /// Builds a store from existing collections, with nobody signed in.
    ///
    /// # Errors
    ///
    /// Returns an [`IntegrityError`] if ids are duplicated or a need refers to
    /// a shelter that is not in `shelters`.
    pub fn new(shelters: Vec<Shelter>, needs: Vec<Need>) -> Result<Self, IntegrityError> {
        let mut shelter_ids = HashSet::with_capacity(shelters.len());
        for shelter in &shelters {
            if !shelter_ids.insert(shelter.id()) {
                return Err(IntegrityError::DuplicateShelter(shelter.id().clone()));
            }
        }

        let mut need_ids = HashSet::with_capacity(needs.len());
        for need in &needs {
            if !need_ids.insert(need.id()) {
                return Err(IntegrityError::DuplicateNeed(need.id().clone()));
            }
            if !shelter_ids.contains(need.shelter_id()) {
                return Err(IntegrityError::MissingShelter {
                    need: need.id().clone(),
                    shelter: need.shelter_id().clone(),
                });
            }
        }

        Ok(Self {
            shelters,
            needs,
            active: None,
        })
    }

    /// All shelters, in registration order.
    #[must_use]
    pub fn shelters(&self) -> &[Shelter] {
        &self.shelters
    }

    /// All needs, newest first.
    #[must_use]
    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    /// Looks up a shelter.
    #[must_use]
    pub fn shelter(&self, id: &ShelterId) -> Option<&Shelter> {
        self.shelters.iter().find(|shelter| shelter.id() == id)
    }

    /// Looks up a need.
    #[must_use]
    pub fn need(&self, id: &NeedId) -> Option<&Need> {
        self.needs.iter().find(|need| need.id() == id)
    }

    /// The signed-in shelter, if any.
    #[must_use]
    pub fn active_shelter(&self) -> Option<&Shelter> {
        self.active.as_ref().and_then(|id| self.shelter(id))
    }

    /// Needs matching `query`, in query order.
    #[must_use]
    pub fn browse(&self, query: &Query) -> Selection<'_> {
        query::select(&self.needs, query)
    }

    /// The newest active needs.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &Need> {
        query::recent(&self.needs, limit)
    }

    /// One pin per shelter with active needs.
    #[must_use]
    pub fn map_feed(&self) -> Vec<MapPin<'_>> {
        feed::map_feed(&self.shelters, &self.needs)
    }

    /// Community-wide totals.
    #[must_use]
    pub fn impact(&self) -> ImpactSummary {
        ImpactSummary::from_needs(&self.needs)
    }

    /// The signed-in shelter's dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotSignedIn`] if no shelter is signed in.
    pub fn dashboard(&self) -> Result<Dashboard<'_>, StoreError> {
        let shelter = self.active_shelter().ok_or(StoreError::NotSignedIn)?;
        let needs = self
            .needs
            .iter()
            .filter(|need| need.shelter_id() == shelter.id())
            .collect();

        Ok(Dashboard {
            shelter,
            summary: DashboardSummary::for_shelter(&self.needs, shelter.id()),
            needs,
        })
    }

    /// Applies a single mutation.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the store unchanged, if the intent refers to
    /// a record that does not exist or would break an integrity invariant.
    #[instrument(level = "debug", skip(self))]
    pub fn dispatch(&mut self, intent: Intent) -> Result<(), StoreError> {
        match intent {
            Intent::CreateNeed(need) => {
                if self.need(need.id()).is_some() {
                    return Err(IntegrityError::DuplicateNeed(need.id().clone()).into());
                }
                if self.shelter(need.shelter_id()).is_none() {
                    return Err(IntegrityError::MissingShelter {
                        need: need.id().clone(),
                        shelter: need.shelter_id().clone(),
                    }
                    .into());
                }
                self.needs.insert(0, need);
            }
            Intent::UpdateNeed(need) => {
                let slot = self.position(need.id())?;
                self.needs[slot] = need;
            }
            Intent::DeleteNeed(id) => {
                let slot = self.position(&id)?;
                self.needs.remove(slot);
            }
            Intent::CreateShelter(shelter) => {
                if self.shelter(shelter.id()).is_some() {
                    return Err(IntegrityError::DuplicateShelter(shelter.id().clone()).into());
                }
                self.shelters.push(shelter);
            }
            Intent::SetActiveShelter(id) => {
                if let Some(id) = &id {
                    if self.shelter(id).is_none() {
                        return Err(StoreError::UnknownShelter(id.clone()));
                    }
                }
                self.active = id;
            }
        }
        Ok(())
    }

    /// A donor pledges `quantity` units against an active need.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownNeed`] if the need does not exist
    /// - [`StoreError::NotAcceptingPledges`] if it is not active
    /// - [`StoreError::Lifecycle`] if the quantity is out of range
    /// - [`StoreError::Integrity`] if its shelter is missing
    #[instrument(skip(self))]
    pub fn pledge(&mut self, id: &NeedId, quantity: u32) -> Result<PledgeReceipt, StoreError> {
        let need = self.lookup(id)?;
        if need.status() != Status::Active {
            return Err(StoreError::NotAcceptingPledges(id.clone()));
        }

        let Some(shelter) = self.shelter(need.shelter_id()).cloned() else {
            let error = IntegrityError::MissingShelter {
                need: id.clone(),
                shelter: need.shelter_id().clone(),
            };
            tracing::error!("{error}");
            return Err(error.into());
        };

        let (next, acknowledgement) = need.pledge(quantity)?;
        self.dispatch(Intent::UpdateNeed(next.clone()))?;
        tracing::info!(need = %id, quantity, remaining = next.quantity(), "pledge recorded");

        Ok(PledgeReceipt {
            need: next,
            shelter,
            acknowledgement,
            donated: quantity,
        })
    }

    /// The signed-in shelter posts a new need.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotSignedIn`] if nobody is signed in, or a
    /// lifecycle error if the draft is invalid.
    #[instrument(skip(self))]
    pub fn post_need(&mut self, draft: NewNeed) -> Result<Need, StoreError> {
        let shelter = self.active.clone().ok_or(StoreError::NotSignedIn)?;
        let need = Need::create(shelter, draft)?;
        self.dispatch(Intent::CreateNeed(need.clone()))?;
        tracing::info!(need = %need.id(), "need posted");
        Ok(need)
    }

    /// The owning shelter changes a need's status.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is signed in, the need does not exist or it
    /// belongs to another shelter.
    #[instrument(skip(self))]
    pub fn set_status(&mut self, id: &NeedId, status: Status) -> Result<Update, StoreError> {
        let need = self.owned(id)?;
        if need.status() == status {
            tracing::debug!(need = %id, %status, "status unchanged");
            return Ok(Update::Unchanged);
        }

        let next = need.with_status(status);
        self.dispatch(Intent::UpdateNeed(next.clone()))?;
        tracing::info!(need = %id, %status, "status changed");
        Ok(Update::Updated(next))
    }

    /// The owning shelter changes a need's posted total.
    ///
    /// # Errors
    ///
    /// Returns an error if the need is not the signed-in shelter's, or
    /// [`LifecycleError::BelowPledged`] if the total is below what has been
    /// pledged.
    #[instrument(skip(self))]
    pub fn edit_total(&mut self, id: &NeedId, total: u32) -> Result<Need, StoreError> {
        let next = self.owned(id)?.with_original_quantity(total)?;
        self.dispatch(Intent::UpdateNeed(next.clone()))?;
        tracing::info!(need = %id, total, "total changed");
        Ok(next)
    }

    /// The owning shelter re-prioritises a need.
    ///
    /// # Errors
    ///
    /// Returns an error if the need is not the signed-in shelter's.
    #[instrument(skip(self))]
    pub fn set_urgency(&mut self, id: &NeedId, urgency: Urgency) -> Result<Update, StoreError> {
        let need = self.owned(id)?;
        if need.urgency() == urgency {
            tracing::debug!(need = %id, %urgency, "urgency unchanged");
            return Ok(Update::Unchanged);
        }

        let next = need.with_urgency(urgency);
        self.dispatch(Intent::UpdateNeed(next.clone()))?;
        tracing::info!(need = %id, %urgency, "urgency changed");
        Ok(Update::Updated(next))
    }

    /// The owning shelter deletes a need, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error if the need is not the signed-in shelter's.
    #[instrument(skip(self))]
    pub fn delete_need(&mut self, id: &NeedId) -> Result<Need, StoreError> {
        let need = self.owned(id)?.clone();
        self.dispatch(Intent::DeleteNeed(id.clone()))?;
        tracing::info!(need = %id, "need deleted");
        Ok(need)
    }

    /// Signs a shelter in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Auth`] if the authenticator refuses the
    /// credentials.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub fn sign_in(
        &mut self,
        authenticator: &dyn Authenticator,
        credentials: &Credentials,
    ) -> Result<&Shelter, StoreError> {
        let id = authenticator.authenticate(credentials, &self.shelters)?;
        self.dispatch(Intent::SetActiveShelter(Some(id.clone())))?;
        tracing::info!(shelter = %id, "signed in");
        self.shelter(&id).ok_or(StoreError::UnknownShelter(id))
    }

    /// Registers a new shelter and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingField`] if any profile field is blank, or
    /// [`AuthError::InvalidEmail`] if the email is not plausible.
    #[instrument(skip_all, fields(name = %profile.name))]
    pub fn sign_up(
        &mut self,
        profile: ShelterProfile,
        locator: &dyn CoordinateProvider,
    ) -> Result<&Shelter, StoreError> {
        for (field, value) in [
            ("shelter name", &profile.name),
            ("street", &profile.street),
            ("city", &profile.city),
            ("state", &profile.state),
            ("email", &profile.email),
            ("phone", &profile.phone),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::MissingField(field));
            }
        }
        if !auth::is_plausible_email(&profile.email) {
            return Err(AuthError::InvalidEmail.into());
        }

        let mut id = ShelterId::generate();
        while self.shelter(&id).is_some() {
            id = ShelterId::generate();
        }

        let coordinate = locator.locate(&profile);
        let shelter = Shelter::new(id.clone(), profile, coordinate);
        self.dispatch(Intent::CreateShelter(shelter))?;
        self.dispatch(Intent::SetActiveShelter(Some(id.clone())))?;
        tracing::info!(shelter = %id, %coordinate, "shelter registered");
        self.shelter(&id).ok_or(StoreError::UnknownShelter(id))
    }

    /// Signs out, returning the shelter that was signed in.
    pub fn sign_out(&mut self) -> Option<ShelterId> {
        let previous = self.active.take();
        if let Some(id) = &previous {
            tracing::info!(shelter = %id, "signed out");
        }
        previous
    }

    fn position(&self, id: &NeedId) -> Result<usize, StoreError> {
        self.needs
            .iter()
            .position(|need| need.id() == id)
            .ok_or_else(|| StoreError::UnknownNeed(id.clone()))
    }

    fn lookup(&self, id: &NeedId) -> Result<&Need, StoreError> {
        self.need(id)
            .ok_or_else(|| StoreError::UnknownNeed(id.clone()))
    }

    /// Resolves a need owned by the signed-in shelter.
    fn owned(&self, id: &NeedId) -> Result<&Need, StoreError> {
        let shelter = self.active.as_ref().ok_or(StoreError::NotSignedIn)?;
        let need = self.lookup(id)?;
        if need.shelter_id() == shelter {
            Ok(need)
        } else {
            Err(StoreError::NotOwner(id.clone()))
        }
    }
}
