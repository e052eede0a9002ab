//! URL State Codec
//!
//! The location query string is the single source of truth for the listing
//! view. It carries `page`, `size`, `order_by`, `search` and `rules`, where
//! `rules` holds the percent-encoded JSON array of rules (so it is encoded a
//! second time inside the query string). Any other parameters in the location
//! belong to someone else and survive updates untouched.
//!
//! Decoding never fails. Garbled links degrade to defaults: a bad page or size
//! becomes 1/20, an unknown sort becomes `-counter`, and rules that cannot be
//! parsed or validated become an empty rule set.

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use ud_core::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use url::form_urlencoded;

use crate::filters::RuleSet;
use crate::sorts::SortSpec;
use crate::state::{QueryState, QueryStateDelta};

pub const PAGE: &str = "page";
pub const SIZE: &str = "size";
pub const ORDER_BY: &str = "order_by";
pub const SEARCH: &str = "search";
pub const RULES: &str = "rules";

const OWNED_KEYS: [&str; 5] = [PAGE, SIZE, ORDER_BY, SEARCH, RULES];

fn pairs(location: &str) -> Vec<(String, String)> {
    let query = location.strip_prefix('?').unwrap_or(location);
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn positive(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default)
}

fn decode_sort(raw: Option<&str>) -> SortSpec {
    let Some(raw) = raw else {
        return SortSpec::default();
    };
    SortSpec::parse(raw).unwrap_or_else(|err| {
        debug!(order_by = raw, error = %err, "Ignoring unsortable order_by");
        SortSpec::default()
    })
}

/// Undo the inner percent-encoding of the rules parameter
fn unescape_rules(raw: &str) -> Option<String> {
    if raw.trim_start().starts_with('[') {
        return Some(raw.to_string());
    }
    let mut parsed = form_urlencoded::parse(raw.as_bytes());
    match (parsed.next(), parsed.next()) {
        (Some((json, value)), None) if value.is_empty() => Some(json.into_owned()),
        _ => None,
    }
}

fn decode_rules(raw: Option<&str>) -> RuleSet {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return RuleSet::new();
    };
    let Some(json) = unescape_rules(raw) else {
        warn!("Discarding undecodable rules parameter");
        return RuleSet::new();
    };
    match serde_json::from_str::<RuleSet>(&json) {
        Ok(rules) => rules,
        Err(e) => {
            warn!(error = %e, "Discarding invalid rules parameter");
            RuleSet::new()
        }
    }
}

fn encode_rules(rules: &RuleSet) -> Option<String> {
    if rules.is_empty() {
        return None;
    }
    // A RuleSet holds only strings, numbers and booleans.
    let json = serde_json::to_string(rules).ok()?;
    Some(form_urlencoded::byte_serialize(json.as_bytes()).collect())
}

/// Parse a location query string (with or without the leading `?`)
pub fn decode(location: &str) -> QueryState {
    let pairs = pairs(location);
    QueryState {
        page: positive(first(&pairs, PAGE), DEFAULT_PAGE),
        size: positive(first(&pairs, SIZE), DEFAULT_PAGE_SIZE),
        sort: decode_sort(first(&pairs, ORDER_BY)),
        search: first(&pairs, SEARCH)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        rules: decode_rules(first(&pairs, RULES)),
    }
}

fn owned_pairs(state: &QueryState) -> Vec<(&'static str, String)> {
    let mut out = vec![
        (PAGE, state.page.to_string()),
        (SIZE, state.size.to_string()),
        (ORDER_BY, state.sort.to_param()),
    ];
    if let Some(search) = state.search.as_deref().filter(|s| !s.is_empty()) {
        out.push((SEARCH, search.to_string()));
    }
    if let Some(rules) = encode_rules(&state.rules) {
        out.push((RULES, rules));
    }
    out
}

/// Render a state as a location query string (without the leading `?`)
pub fn encode(state: &QueryState) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(owned_pairs(state))
        .finish()
}

/// Apply a delta to a location, keeping parameters this codec does not own
pub fn update(location: &str, delta: QueryStateDelta) -> String {
    let pairs = pairs(location);
    let next = decode(location).apply(delta);

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(owned_pairs(&next));
    serializer.extend_pairs(
        pairs
            .iter()
            .filter(|(k, _)| !OWNED_KEYS.contains(&k.as_str())),
    );
    serializer.finish()
}

/// Whether the location sets `key` at all
pub fn has_param(location: &str, key: &str) -> bool {
    first(&pairs(location), key).is_some()
}

/// Path of a user's detail page that remembers the listing it came from
pub fn detail_path(user_id: i64, location: &str) -> String {
    let from: String = form_urlencoded::byte_serialize(location.as_bytes()).collect();
    format!("/users/{}?from={}", user_id, from)
}

/// The listing location remembered by [`detail_path`]
pub fn return_location(detail_query: &str) -> Option<String> {
    let pairs = pairs(detail_query);
    first(&pairs, "from").map(str::to_string)
}

/// Where the location string lives
pub trait LocationStore: Send + Sync {
    fn read(&self) -> String;
    fn write(&self, location: String);
}

/// Location string held in memory
#[derive(Debug, Default)]
pub struct MemoryLocation {
    location: RwLock<String>,
}

impl MemoryLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: RwLock::new(location.into()),
        }
    }
}

impl LocationStore for MemoryLocation {
    fn read(&self) -> String {
        self.location.read().clone()
    }

    fn write(&self, location: String) {
        *self.location.write() = location;
    }
}

/// Read-modify-write access to a stored location.
///
/// Each update decodes, applies and re-encodes under one lock, so writers
/// touching different parts of the state do not lose each other's changes.
pub struct UrlState<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: LocationStore> UrlState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// The current state, decoded from the store
    pub fn current(&self) -> QueryState {
        decode(&self.store.read())
    }

    /// Apply a delta and return the new state
    pub fn update(&self, delta: QueryStateDelta) -> QueryState {
        let _guard = self.write_lock.lock();
        let location = update(&self.store.read(), delta);
        let state = decode(&location);
        self.store.write(location);
        state
    }

    /// Drop every parameter from the location
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        self.store.write(String::new());
    }

    pub fn query_string(&self) -> String {
        self.store.read()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterRule;
    use crate::operators::Operator;

    fn sample_state() -> QueryState {
        let rules = RuleSet::from_rules([
            FilterRule::between("score", 10, 50),
            FilterRule::is_empty("country"),
            FilterRule::contains("username", "علی & co"),
            FilterRule::equals("is_ban", false),
            FilterRule::gt("updated_at", "2024-03-01T12:30:00.000Z"),
        ])
        .unwrap();
        QueryState::new()
            .with_page(3)
            .with_size(50)
            .with_sort(SortSpec::asc("join_date").unwrap())
            .with_search("09 12")
            .with_rules(rules)
    }

    #[test]
    fn test_empty_location_is_default() {
        assert_eq!(decode(""), QueryState::new());
        assert_eq!(decode("?"), QueryState::new());
    }

    #[test]
    fn test_round_trip() {
        let state = sample_state();
        assert_eq!(decode(&encode(&state)), state);
        assert_eq!(decode(&format!("?{}", encode(&state))), state);
        assert_eq!(decode(&encode(&QueryState::new())), QueryState::new());
    }

    #[test]
    fn test_default_encoding() {
        assert_eq!(encode(&QueryState::new()), "page=1&size=20&order_by=-counter");
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let state = decode("page=abc&size=-5");
        assert_eq!(state.page, 1);
        assert_eq!(state.size, 20);
        assert_eq!(decode("page=0&size=0").page, 1);
        assert_eq!(decode("page=7&size=100").size, 100);
    }

    #[test]
    fn test_sort_decoding() {
        assert_eq!(decode("order_by=-score").sort, SortSpec::desc("score").unwrap());
        assert_eq!(decode("order_by=username").sort, SortSpec::asc("username").unwrap());
        assert_eq!(decode("order_by=-profile_path").sort, SortSpec::default());
        assert_eq!(decode("order_by=nonsense").sort, SortSpec::default());
    }

    #[test]
    fn test_every_sortable_field_round_trips() {
        for field in crate::sorts::sortable_fields() {
            for sort in [SortSpec::asc(field.name), SortSpec::desc(field.name)] {
                let state = QueryState::new().with_sort(sort.unwrap());
                assert_eq!(decode(&encode(&state)), state);
            }
        }
    }

    #[test]
    fn test_url_state_sort_update() {
        let url_state = UrlState::new(MemoryLocation::new("page=5"));
        let sort = SortSpec::parse("-score").unwrap();
        let state = url_state.update(QueryStateDelta::new().sort(sort.clone()));
        assert_eq!(state.sort, sort);
        assert_eq!(state.page, 1);
        assert_eq!(url_state.query_string(), "page=1&size=20&order_by=-score");
    }

    #[test]
    fn test_malformed_rules_become_empty() {
        for location in [
            "rules=not-json",
            "rules=%255B%257B",
            "rules=%5B%7B%22field%22%3A%22counter%22%2C%22operator%22%3A%22gt%22%7D%5D",
            "rules=%5B%7B%22field%22%3A%22password%22%2C%22operator%22%3A%22equals%22%7D%5D",
        ] {
            let state = decode(location);
            assert!(state.rules.is_empty(), "{}", location);
        }
        assert_eq!(decode("page=2&rules=%7B").page, 2);
    }

    #[test]
    fn test_accepts_single_encoded_rules() {
        let state = decode(
            "rules=%5B%7B%22field%22%3A%22score%22%2C%22operator%22%3A%22gt%22%2C%22value%22%3A0%7D%5D",
        );
        assert_eq!(state.rules.get("score"), Some(&FilterRule::gt("score", 0)));
    }

    #[test]
    fn test_accepts_encode_uri_component_rules() {
        // encodeURIComponent output, then query-string encoded
        let state = decode(
            "rules=%255B%257B%2522field%2522%253A%2522country%2522%252C%2522operator%2522%253A%2522is_empty%2522%257D%255D",
        );
        assert_eq!(
            state.rules.get("country").map(|r| r.operator),
            Some(Operator::IsEmpty)
        );
    }

    #[test]
    fn test_first_occurrence_wins() {
        assert_eq!(decode("page=2&page=9").page, 2);
        assert!(has_param("?page=2&size=", SIZE));
        assert!(!has_param("page=2", SIZE));
    }

    #[test]
    fn test_update_preserves_foreign_params() {
        let location = "tab=stats&page=4&size=50";
        let next = update(location, QueryStateDelta::new().search("ali"));
        assert_eq!(next, "page=1&size=50&order_by=-counter&search=ali&tab=stats");
    }

    #[test]
    fn test_update_page_only() {
        let location = encode(&sample_state());
        let next = decode(&update(&location, QueryStateDelta::new().page(5)));
        assert_eq!(next.page, 5);
        assert_eq!(next.rules, sample_state().rules);
    }

    #[test]
    fn test_clearing_rules_and_search() {
        let location = encode(&sample_state());
        let next = update(
            &location,
            QueryStateDelta::new().search("").rules(RuleSet::new()),
        );
        assert_eq!(next, "page=1&size=50&order_by=join_date");
    }

    #[test]
    fn test_detail_path() {
        let location = "page=2&search=ali";
        let path = detail_path(42, location);
        assert_eq!(path, "/users/42?from=page%3D2%26search%3Dali");
        let query = path.split_once('?').map(|(_, q)| q).unwrap();
        assert_eq!(return_location(query).as_deref(), Some(location));
    }

    #[test]
    fn test_url_state_updates() {
        let url_state = UrlState::new(MemoryLocation::new("tab=1"));
        let state = url_state.update(QueryStateDelta::new().page(3));
        assert_eq!(state.page, 3);
        assert_eq!(url_state.current(), state);
        assert!(url_state.query_string().ends_with("tab=1"));

        url_state.clear();
        assert_eq!(url_state.query_string(), "");
        assert_eq!(url_state.current(), QueryState::new());
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let url_state = UrlState::new(MemoryLocation::default());
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..50 {
                    url_state.update(QueryStateDelta::new().size(40));
                }
            });
            scope.spawn(|| {
                for _ in 0..50 {
                    url_state.update(QueryStateDelta::new().search("ali"));
                }
            });
        });
        let state = url_state.current();
        assert_eq!(state.size, 40);
        assert_eq!(state.search.as_deref(), Some("ali"));
    }
}
