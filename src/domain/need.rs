use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ShelterId, short_token};

/// Opaque identifier of a [`Need`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeedId(String);

impl NeedId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier of the form `need-<8 hex digits>`.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("need-{}", short_token()))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NeedId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

impl From<&str> for NeedId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Error returned when a label does not name a variant of a closed
/// enumeration.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseLabelError {
    fn new<T: fmt::Display>(kind: &'static str, value: &str, all: &[T]) -> Self {
        let expected = all
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

/// Implements label conversions for a closed enumeration.
///
/// Labels are the variant names; parsing is case-insensitive.
macro_rules! labelled {
    ($ty:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The display label of this variant.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = ParseLabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ParseLabelError::new($kind, s, Self::ALL))
            }
        }
    };
}

/// The category of item a shelter is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    /// Food and drink.
    Food,
    /// Clothing, including coats and shoes.
    Clothing,
    /// Hygiene and personal care products.
    Hygiene,
    /// Blankets and bedding.
    Blankets,
    /// Anything else.
    Other,
}

labelled!(ItemType, "category", [Food, Clothing, Hygiene, Blankets, Other]);

/// How urgently a need should be covered.
///
/// Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Urgency {
    /// Can wait.
    Low,
    /// Needed soon.
    Medium,
    /// Needed now.
    High,
}

labelled!(Urgency, "urgency", [Low, Medium, High]);

/// Lifecycle stage of a need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Open for pledges; no pledge outstanding.
    Active,
    /// A donor has pledged and the shelter has not yet confirmed receipt.
    Pending,
    /// The shelter has confirmed the need is covered.
    Fulfilled,
}

labelled!(Status, "status", [Active, Pending, Fulfilled]);

/// Errors raised when a lifecycle transition is not allowed.
///
/// A failed transition never changes the need.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// The pledged quantity is zero or more than what is still needed.
    #[error("please enter a quantity between 1 and {available} (got {requested})")]
    PledgeOutOfRange {
        /// The quantity the donor tried to pledge.
        requested: u32,
        /// The quantity still needed.
        available: u32,
    },

    /// The new total is smaller than what donors have already pledged.
    #[error(
        "cannot reduce the total to {requested}: donors have already pledged {pledged} units"
    )]
    BelowPledged {
        /// The requested new total.
        requested: u32,
        /// Units pledged so far.
        pledged: u32,
    },

    /// A need must ask for at least one unit.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// A need must have a name.
    #[error("item name must not be empty")]
    EmptyName,
}

/// The fields a shelter fills in when posting a need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNeed {
    /// Category of the item.
    pub item_type: ItemType,
    /// Short name, e.g. "Winter Coats".
    pub name: String,
    /// Number of units requested.
    pub quantity: u32,
    /// How urgent the need is.
    pub urgency: Urgency,
    /// Sizes, brands or other requirements.
    pub description: String,
}

/// A shelter's request for a quantity of a categorised item.
///
/// Only two counters are kept: the posted total and the remainder still
/// needed. Units pledged so far are `original_quantity - quantity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Need {
    pub(crate) id: NeedId,
    pub(crate) shelter_id: ShelterId,
    pub(crate) item_type: ItemType,
    pub(crate) name: NonEmptyString,
    pub(crate) description: String,
    pub(crate) urgency: Urgency,
    pub(crate) status: Status,
    pub(crate) original_quantity: u32,
    pub(crate) quantity: u32,
    pub(crate) posted: DateTime<Utc>,
}

/// What a donor is told after a successful pledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Nothing more is needed; the shelter still has to confirm receipt.
    FullyCovered,
    /// More units are still needed.
    PartiallyCovered {
        /// Units pledged by this donor.
        donated: u32,
        /// Units still needed.
        remaining: u32,
    },
}

impl fmt::Display for Acknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullyCovered => f.write_str(
                "Thank you for fulfilling this need! The shelter has been notified and will \
                 confirm once the items arrive.",
            ),
            Self::PartiallyCovered { donated, remaining } => write!(
                f,
                "Thank you for your donation of {donated} units! The request is now pending \
                 shelter confirmation; {remaining} more needed."
            ),
        }
    }
}

/// Human-readable progress of a need, as shown on a shelter's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Units still needed (active needs).
    Needed(u32),
    /// Units pledged out of the posted total (pending needs).
    Pledged {
        /// Units pledged so far.
        pledged: u32,
        /// The posted total.
        total: u32,
    },
    /// Units received (fulfilled needs).
    Received(u32),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Needed(quantity) => write!(f, "{quantity} units needed"),
            Self::Pledged { pledged, total } => write!(f, "{pledged}/{total} units pledged"),
            Self::Received(total) => write!(f, "{total} units received"),
        }
    }
}

impl Need {
    /// Creates a new active need owned by `shelter_id`.
    ///
    /// A fresh identifier is generated and the posting time is now.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ZeroQuantity`] if no units are requested, or
    /// [`LifecycleError::EmptyName`] if the name is blank.
    pub fn create(shelter_id: ShelterId, draft: NewNeed) -> Result<Self, LifecycleError> {
        Self::create_with_id(NeedId::generate(), shelter_id, draft, Utc::now())
    }

    pub(crate) fn create_with_id(
        id: NeedId,
        shelter_id: ShelterId,
        draft: NewNeed,
        posted: DateTime<Utc>,
    ) -> Result<Self, LifecycleError> {
        if draft.quantity == 0 {
            return Err(LifecycleError::ZeroQuantity);
        }
        let name = non_blank(&draft.name)?;

        Ok(Self {
            id,
            shelter_id,
            item_type: draft.item_type,
            name,
            description: draft.description.trim().to_string(),
            urgency: draft.urgency,
            status: Status::Active,
            original_quantity: draft.quantity,
            quantity: draft.quantity,
            posted,
        })
    }

    /// The need's identifier.
    #[must_use]
    pub const fn id(&self) -> &NeedId {
        &self.id
    }

    /// The shelter that posted this need.
    #[must_use]
    pub const fn shelter_id(&self) -> &ShelterId {
        &self.shelter_id
    }

    /// Category of the requested item.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Short name of the requested item.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// How urgent the need is.
    #[must_use]
    pub const fn urgency(&self) -> Urgency {
        self.urgency
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// The total as first posted or last edited by the shelter.
    #[must_use]
    pub const fn original_quantity(&self) -> u32 {
        self.original_quantity
    }

    /// Units still needed.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Units pledged since the total was last set.
    #[must_use]
    pub const fn pledged(&self) -> u32 {
        self.original_quantity - self.quantity
    }

    /// When the need was posted.
    #[must_use]
    pub const fn posted(&self) -> DateTime<Utc> {
        self.posted
    }

    /// Dashboard progress for the current status.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        match self.status {
            Status::Active => Progress::Needed(self.quantity),
            Status::Pending => Progress::Pledged {
                pledged: self.pledged(),
                total: self.original_quantity,
            },
            Status::Fulfilled => Progress::Received(self.original_quantity),
        }
    }

    /// Computes the need after a donor pledges `quantity` units.
    ///
    /// Any successful pledge moves the need to [`Status::Pending`], even when
    /// nothing remains: the shelter confirms fulfilment itself.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::PledgeOutOfRange`] unless
    /// `0 < quantity <= self.quantity()`.
    pub fn pledge(&self, quantity: u32) -> Result<(Self, Acknowledgement), LifecycleError> {
        if quantity == 0 || quantity > self.quantity {
            return Err(LifecycleError::PledgeOutOfRange {
                requested: quantity,
                available: self.quantity,
            });
        }

        let remaining = self.quantity - quantity;
        let next = Self {
            quantity: remaining,
            status: Status::Pending,
            ..self.clone()
        };

        let acknowledgement = if remaining == 0 {
            Acknowledgement::FullyCovered
        } else {
            Acknowledgement::PartiallyCovered {
                donated: quantity,
                remaining,
            }
        };

        Ok((next, acknowledgement))
    }

    /// Computes the need after the shelter moves it to `status`.
    ///
    /// Moving a pending need back to active means the pledge fell through.
    /// Individual pledges are not recorded, so the remainder is reset to the
    /// full posted total. Every other change only sets the status, and setting
    /// the current status returns an identical need.
    #[must_use]
    pub fn with_status(&self, status: Status) -> Self {
        let quantity = match (self.status, status) {
            (Status::Pending, Status::Active) => self.original_quantity,
            _ => self.quantity,
        };

        Self {
            status,
            quantity,
            ..self.clone()
        }
    }

    /// Computes the need after the shelter changes the posted total.
    ///
    /// Units already pledged are preserved, so the remainder becomes
    /// `total - pledged`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ZeroQuantity`] if `total` is zero, or
    /// [`LifecycleError::BelowPledged`] if it is less than the units already
    /// pledged.
    pub fn with_original_quantity(&self, total: u32) -> Result<Self, LifecycleError> {
        if total == 0 {
            return Err(LifecycleError::ZeroQuantity);
        }
        let pledged = self.pledged();
        let quantity = total
            .checked_sub(pledged)
            .ok_or(LifecycleError::BelowPledged {
                requested: total,
                pledged,
            })?;

        Ok(Self {
            original_quantity: total,
            quantity,
            ..self.clone()
        })
    }

    /// Computes the need after the shelter changes its urgency.
    #[must_use]
    pub fn with_urgency(&self, urgency: Urgency) -> Self {
        Self {
            urgency,
            ..self.clone()
        }
    }
}

fn non_blank(name: &str) -> Result<NonEmptyString, LifecycleError> {
    NonEmptyString::new(name.trim().to_string()).map_err(|_| LifecycleError::EmptyName)
}

#[cfg(test)]
pub(crate) mod tests {
    use test_case::test_case;

    use super::*;

    pub(crate) fn draft(name: &str, quantity: u32, urgency: Urgency) -> NewNeed {
        NewNeed {
            item_type: ItemType::Food,
            name: name.to_string(),
            quantity,
            urgency,
            description: String::new(),
        }
    }

    fn need(quantity: u32) -> Need {
        Need::create(ShelterId::new("shelter-1"), draft("Canned Soup", quantity, Urgency::High))
            .unwrap()
    }

    #[test]
    fn create_starts_active_with_full_remainder() {
        let need = need(10);
        assert_eq!(need.status(), Status::Active);
        assert_eq!(need.original_quantity(), 10);
        assert_eq!(need.quantity(), 10);
        assert_eq!(need.pledged(), 0);
        assert!(need.id().as_str().starts_with("need-"));
    }

    #[test]
    fn create_rejects_zero_quantity() {
        let err = Need::create(ShelterId::new("shelter-1"), draft("Soap", 0, Urgency::Low))
            .unwrap_err();
        assert_eq!(err, LifecycleError::ZeroQuantity);
    }

    #[test]
    fn create_rejects_blank_name() {
        let err = Need::create(ShelterId::new("shelter-1"), draft("   ", 3, Urgency::Low))
            .unwrap_err();
        assert_eq!(err, LifecycleError::EmptyName);
    }

    #[test]
    fn create_trims_name() {
        let need =
            Need::create(ShelterId::new("shelter-1"), draft("  Socks ", 3, Urgency::Low)).unwrap();
        assert_eq!(need.name(), "Socks");
    }

    #[test]
    fn partial_pledge_moves_to_pending() {
        let (next, ack) = need(10).pledge(7).unwrap();
        assert_eq!(next.quantity(), 3);
        assert_eq!(next.status(), Status::Pending);
        assert_eq!(
            ack,
            Acknowledgement::PartiallyCovered {
                donated: 7,
                remaining: 3
            }
        );
    }

    #[test]
    fn full_pledge_stays_pending() {
        let (next, ack) = need(10).pledge(10).unwrap();
        assert_eq!(next.quantity(), 0);
        assert_eq!(next.status(), Status::Pending);
        assert_eq!(ack, Acknowledgement::FullyCovered);
    }

    #[test_case(0; "zero")]
    #[test_case(11; "more than remaining")]
    #[test_case(u32::MAX; "far too many")]
    fn out_of_range_pledge_is_rejected(quantity: u32) {
        let need = need(10);
        let err = need.pledge(quantity).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::PledgeOutOfRange {
                requested: quantity,
                available: 10
            }
        );
        assert!(err.to_string().contains("between 1 and 10"));
    }

    #[test]
    fn reverting_pending_to_active_resets_remainder() {
        let (pending, _) = need(10).pledge(10).unwrap();
        let active = pending.with_status(Status::Active);
        assert_eq!(active.status(), Status::Active);
        assert_eq!(active.quantity(), 10);
        assert_eq!(active.original_quantity(), 10);
    }

    #[test]
    fn fulfilling_keeps_remainder() {
        let (pending, _) = need(10).pledge(7).unwrap();
        let fulfilled = pending.with_status(Status::Fulfilled);
        assert_eq!(fulfilled.status(), Status::Fulfilled);
        assert_eq!(fulfilled.quantity(), 3);
    }

    #[test_case(Status::Active, Status::Pending; "active to pending")]
    #[test_case(Status::Active, Status::Fulfilled; "active to fulfilled")]
    #[test_case(Status::Fulfilled, Status::Active; "fulfilled to active")]
    #[test_case(Status::Fulfilled, Status::Pending; "fulfilled to pending")]
    fn other_transitions_leave_quantity_alone(from: Status, to: Status) {
        let (pledged, _) = need(10).pledge(4).unwrap();
        let start = pledged.with_status(from);
        let next = start.with_status(to);
        assert_eq!(next.status(), to);
        assert_eq!(next.quantity(), start.quantity());
    }

    #[test]
    fn setting_current_status_is_a_no_op() {
        let (pending, _) = need(10).pledge(4).unwrap();
        assert_eq!(pending.with_status(Status::Pending), pending);
    }

    #[test]
    fn edit_below_pledged_is_rejected() {
        let (pending, _) = need(10).pledge(6).unwrap();
        let err = pending.with_original_quantity(5).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::BelowPledged {
                requested: 5,
                pledged: 6
            }
        );
    }

    #[test]
    fn edit_to_zero_is_rejected() {
        assert_eq!(
            need(10).with_original_quantity(0).unwrap_err(),
            LifecycleError::ZeroQuantity
        );
        let (pending, _) = need(10).pledge(6).unwrap();
        assert_eq!(
            pending.with_original_quantity(0).unwrap_err(),
            LifecycleError::ZeroQuantity
        );
    }

    #[test_case(6, 0; "exactly pledged")]
    #[test_case(8, 2; "shrink")]
    #[test_case(20, 14; "grow")]
    fn edit_preserves_pledged_units(total: u32, remaining: u32) {
        let (pending, _) = need(10).pledge(6).unwrap();
        let edited = pending.with_original_quantity(total).unwrap();
        assert_eq!(edited.original_quantity(), total);
        assert_eq!(edited.quantity(), remaining);
        assert_eq!(edited.pledged(), 6);
        assert_eq!(edited.status(), Status::Pending);
    }

    #[test]
    fn progress_follows_status() {
        let active = need(10);
        assert_eq!(active.progress().to_string(), "10 units needed");

        let (pending, _) = active.pledge(4).unwrap();
        assert_eq!(pending.progress().to_string(), "4/10 units pledged");

        let fulfilled = pending.with_status(Status::Fulfilled);
        assert_eq!(fulfilled.progress().to_string(), "10 units received");
    }

    #[test_case("food", ItemType::Food)]
    #[test_case("BLANKETS", ItemType::Blankets)]
    #[test_case(" Hygiene ", ItemType::Hygiene)]
    fn item_type_parses_case_insensitively(label: &str, expected: ItemType) {
        assert_eq!(label.parse::<ItemType>().unwrap(), expected);
    }

    #[test]
    fn unknown_label_lists_the_options() {
        let err = "urgentish".parse::<Urgency>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown urgency 'urgentish' (expected one of: Low, Medium, High)"
        );
    }

    #[test]
    fn urgency_orders_high_above_low() {
        assert!(Urgency::High > Urgency::Medium);
        assert!(Urgency::Medium > Urgency::Low);
    }
}
