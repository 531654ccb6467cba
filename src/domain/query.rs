use std::{cmp::Reverse, fmt, iter::Copied, slice, str::FromStr};

use crate::domain::{ItemType, Need, Status, Urgency};

/// Restricts a field to one value, or admits every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<T> {
    /// Every value is admitted.
    All,
    /// Only this value is admitted.
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Filter<T> {
    /// Whether `value` passes the filter.
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }
}

impl<T: FromStr> FromStr for Filter<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(value) => value.fmt(f),
        }
    }
}

/// How a selection is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// High, then medium, then low urgency.
    #[default]
    Urgency,
    /// Nearest shelter first.
    ///
    /// Shelters are not geocoded, so this orders by owning shelter id as a
    /// stand-in.
    Distance,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Urgency => "urgency",
            Self::Distance => "distance",
        })
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgency" => Ok(Self::Urgency),
            "distance" => Ok(Self::Distance),
            other => Err(format!(
                "unknown sort key '{other}' (expected urgency or distance)"
            )),
        }
    }
}

/// A set of predicates and an ordering applied to a collection of needs.
///
/// The default query is the donor view: active needs only, most urgent
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    search: Option<String>,
    category: Filter<ItemType>,
    urgency: Filter<Urgency>,
    status: Filter<Status>,
    sort: SortKey,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search: None,
            category: Filter::All,
            urgency: Filter::All,
            status: Filter::Only(Status::Active),
            sort: SortKey::Urgency,
        }
    }
}

impl Query {
    /// The donor-facing query: active needs, most urgent first.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring match against name, description and
    /// category. A blank term matches everything.
    #[must_use]
    pub fn search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_lowercase());
        self
    }

    /// Restrict by category.
    #[must_use]
    pub const fn category(mut self, category: Filter<ItemType>) -> Self {
        self.category = category;
        self
    }

    /// Restrict by urgency.
    #[must_use]
    pub const fn urgency(mut self, urgency: Filter<Urgency>) -> Self {
        self.urgency = urgency;
        self
    }

    /// Restrict by status.
    ///
    /// Donor views must keep the default, which admits only active needs.
    #[must_use]
    pub const fn status(mut self, status: Filter<Status>) -> Self {
        self.status = status;
        self
    }

    /// Set the ordering.
    #[must_use]
    pub const fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Whether a need passes every predicate of the query.
    #[must_use]
    pub fn matches(&self, need: &Need) -> bool {
        if !self.status.admits(&need.status) {
            return false;
        }

        if !self.category.admits(&need.item_type) {
            return false;
        }

        if !self.urgency.admits(&need.urgency) {
            return false;
        }

        if let Some(search) = &self.search {
            let found = need.name().to_lowercase().contains(search)
                || need.description.to_lowercase().contains(search)
                || need.item_type.label().to_lowercase().contains(search);
            if !found {
                return false;
            }
        }

        true
    }
}

/// An ordered selection of needs.
///
/// Iterating does not consume the selection, so it can be walked any number
/// of times and always yields the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    needs: Vec<&'a Need>,
}

impl<'a> Selection<'a> {
    /// Iterates over the selected needs in order.
    pub fn iter(&self) -> Copied<slice::Iter<'_, &'a Need>> {
        self.needs.iter().copied()
    }

    /// Number of selected needs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.needs.len()
    }

    /// Whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }

    /// Keeps at most `limit` needs.
    #[must_use]
    pub fn truncate(mut self, limit: usize) -> Self {
        self.needs.truncate(limit);
        self
    }
}

impl<'s, 'a> IntoIterator for &'s Selection<'a> {
    type Item = &'a Need;
    type IntoIter = Copied<slice::Iter<'s, &'a Need>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Selects and orders the needs matching `query`.
///
/// Sorting is stable: needs that compare equal keep their collection order.
#[must_use]
pub fn select<'a>(needs: &'a [Need], query: &Query) -> Selection<'a> {
    let mut selected: Vec<&Need> = needs.iter().filter(|need| query.matches(need)).collect();

    match query.sort {
        SortKey::Urgency => sort_by_urgency(&mut selected),
        SortKey::Distance => selected.sort_by(|a, b| a.shelter_id.cmp(&b.shelter_id)),
    }

    Selection { needs: selected }
}

/// The first `limit` active needs in collection order, newest postings
/// first.
pub fn recent(needs: &[Need], limit: usize) -> impl Iterator<Item = &Need> {
    needs
        .iter()
        .filter(|need| need.status == Status::Active)
        .take(limit)
}

/// Stable sort, most urgent first.
pub(crate) fn sort_by_urgency(needs: &mut [&Need]) {
    needs.sort_by_key(|need| Reverse(need.urgency));
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use test_case::test_case;

    use super::*;
    use crate::domain::{NeedId, NewNeed, ShelterId};

    fn need(id: &str, shelter: &str, item_type: ItemType, name: &str, urgency: Urgency) -> Need {
        Need::create_with_id(
            NeedId::new(id),
            ShelterId::new(shelter),
            NewNeed {
                item_type,
                name: name.to_string(),
                quantity: 5,
                urgency,
                description: format!("{name} for the shelter"),
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn catalogue() -> Vec<Need> {
        vec![
            need("n1", "shelter-b", ItemType::Food, "Canned Soup", Urgency::Low),
            need("n2", "shelter-a", ItemType::Clothing, "Winter Coats", Urgency::High),
            need("n3", "shelter-c", ItemType::Hygiene, "Toothpaste", Urgency::Medium),
            need("n4", "shelter-a", ItemType::Blankets, "Wool Blankets", Urgency::High),
            need("n5", "shelter-b", ItemType::Food, "Rice", Urgency::Medium),
            need("n6", "shelter-c", ItemType::Other, "Bus Passes", Urgency::Low),
        ]
    }

    fn ids(selection: &Selection<'_>) -> Vec<String> {
        selection.iter().map(|need| need.id.to_string()).collect()
    }

    #[test]
    fn urgency_sort_is_stable() {
        let needs = catalogue();
        let selection = select(&needs, &Query::new());
        assert_eq!(ids(&selection), ["n2", "n4", "n3", "n5", "n1", "n6"]);
    }

    #[test]
    fn distance_sort_orders_by_shelter_id_stably() {
        let needs = catalogue();
        let selection = select(&needs, &Query::new().sort(SortKey::Distance));
        assert_eq!(ids(&selection), ["n2", "n4", "n1", "n5", "n3", "n6"]);
    }

    #[test]
    fn only_active_needs_reach_donors() {
        let mut needs = catalogue();
        needs[1] = needs[1].pledge(1).unwrap().0;
        needs[3] = needs[3].with_status(Status::Fulfilled);

        let selection = select(&needs, &Query::new());
        assert!(selection.iter().all(|need| need.status == Status::Active));
        assert_eq!(selection.len(), 4);
    }

    #[test_case("coats", &["n2"]; "name")]
    #[test_case("SHELTER", &["n2", "n4", "n3", "n5", "n1", "n6"]; "description")]
    #[test_case("hygiene", &["n3"]; "category label")]
    #[test_case("   ", &["n2", "n4", "n3", "n5", "n1", "n6"]; "blank")]
    #[test_case("nothing matches", &[]; "no match")]
    fn search_is_case_insensitive(term: &str, expected: &[&str]) {
        let needs = catalogue();
        let selection = select(&needs, &Query::new().search(term));
        assert_eq!(ids(&selection), expected);
    }

    #[test]
    fn category_and_urgency_filters_combine() {
        let needs = catalogue();
        let query = Query::new()
            .category(Filter::Only(ItemType::Food))
            .urgency(Filter::Only(Urgency::Medium));
        assert_eq!(ids(&select(&needs, &query)), ["n5"]);
    }

    #[test]
    fn selecting_twice_yields_identical_order() {
        let needs = catalogue();
        let query = Query::new().sort(SortKey::Distance).search("o");
        let first = select(&needs, &query);
        let second = select(&needs, &query);
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(ids(&first), first.iter().map(|n| n.id.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn recent_takes_active_needs_in_collection_order() {
        let mut needs = catalogue();
        needs[0] = needs[0].with_status(Status::Fulfilled);
        let recent: Vec<_> = recent(&needs, 3).map(|n| n.id.to_string()).collect();
        assert_eq!(recent, ["n2", "n3", "n4"]);
    }

    #[test_case("all", Filter::All)]
    #[test_case("ALL", Filter::All)]
    #[test_case("blankets", Filter::Only(ItemType::Blankets))]
    fn filter_parses(label: &str, expected: Filter<ItemType>) {
        assert_eq!(label.parse::<Filter<ItemType>>().unwrap(), expected);
    }

    #[test]
    fn sort_key_rejects_unknown() {
        assert!("nearest".parse::<SortKey>().is_err());
    }
}
