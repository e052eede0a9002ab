//! Query Encoder
//!
//! Translates a [`QueryState`] into the flat parameter mapping of the users
//! API. The encoding is one generic algorithm over two alias tables:
//!
//! - null checks (`is_empty`/`is_full`) send `<null alias> = "true"|"false"`
//! - `contains` sends `<field>_contains = value`
//! - `gt`/`lt`/`between` send the lower/upper range alias
//! - `equals` sends `<field> = value`
//!
//! Values that are not provided (absent or the empty string) send nothing.
//! Fields without an alias entry fall back to `<field>__isnull`,
//! `<field>__gte` and `<field>__lte`.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use url::form_urlencoded;

use crate::filters::{provided, FilterRule, FilterValue, RuleSet};
use crate::operators::Operator;
use crate::state::QueryState;

/// Null-check parameter names, keyed by field
const NULL_ALIASES: &[(&str, &str)] = &[
    ("user_id", "no_user_id"),
    ("accounting_code", "no_accounting_code"),
    ("username", "no_username"),
    ("first_name", "no_first_name"),
    ("last_name", "no_last_name"),
    ("nickname", "no_nickname"),
    ("phone_number", "no_phone_number"),
    ("whatsapp_number", "no_whatsapp_number"),
    ("country", "no_country"),
    ("mode", "no_mode"),
    ("join_date", "no_join_date"),
    ("profile_path", "no_profile_path"),
    ("telegram_message_id", "no_telegram_msg_id"),
    ("group_message_id", "no_group_msg_id"),
    ("public_message_id", "no_public_msg_id"),
    ("public_group_message_id", "no_public_group_msg_id"),
    ("channel_updated_at", "no_channel_update"),
];

/// Lower/upper bound parameter names, keyed by field
const RANGE_ALIASES: &[(&str, &str, &str)] = &[
    ("score", "min_score", "max_score"),
    ("ban_time", "min_ban_time", "max_ban_time"),
    ("join_date", "joined_after_unix", "joined_before_unix"),
    ("updated_at", "updated_after", "updated_before"),
    ("channel_updated_at", "channel_updated_after", "channel_updated_before"),
];

/// Parameter name for a null check on `field`
pub fn null_alias(field: &str) -> String {
    NULL_ALIASES
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, alias)| alias.to_string())
        .unwrap_or_else(|| format!("{}__isnull", field))
}

/// Lower and upper bound parameter names for `field`
pub fn range_aliases(field: &str) -> (String, String) {
    RANGE_ALIASES
        .iter()
        .find(|(name, _, _)| *name == field)
        .map(|(_, gte, lte)| (gte.to_string(), lte.to_string()))
        .unwrap_or_else(|| (format!("{}__gte", field), format!("{}__lte", field)))
}

/// Flat API query parameters, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `application/x-www-form-urlencoded` rendering
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<'a> IntoIterator for &'a QueryParams {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Encode a listing state into API parameters
pub fn encode(state: &QueryState) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("page", state.page.to_string());
    params.insert("size", state.size.to_string());
    params.insert("order_by", state.sort.to_param());
    if let Some(search) = state.search.as_deref().filter(|s| !s.is_empty()) {
        params.insert("search", search);
    }
    encode_rules(&state.rules, &mut params);

    debug!(
        rules = state.rules.len(),
        params = params.len(),
        "Encoded listing query"
    );
    params
}

/// Parameters that ask only for the row count matching `rules`.
///
/// Page 1 with size 1, no sort and no search; the answer is `meta.total`.
pub fn encode_count(rules: &RuleSet) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("page", "1");
    params.insert("size", "1");
    encode_rules(rules, &mut params);
    params
}

fn encode_rules(rules: &RuleSet, params: &mut QueryParams) {
    for rule in rules {
        encode_rule(rule, params);
    }
}

fn encode_rule(rule: &FilterRule, params: &mut QueryParams) {
    let field = rule.field.as_str();
    let value = provided(&rule.value);

    match rule.operator {
        Operator::IsEmpty | Operator::IsFull => {
            let flag = rule.operator == Operator::IsEmpty;
            params.insert(null_alias(field), flag.to_string());
        }
        Operator::Contains => {
            if let Some(value) = value {
                params.insert(format!("{}_contains", field), value.to_string());
            }
        }
        Operator::Gt | Operator::Lt | Operator::Between => {
            let (gte, lte) = range_aliases(field);
            let (lower, upper) = match rule.operator {
                Operator::Gt => (value, None),
                Operator::Lt => (None, value),
                _ => (value, provided(&rule.value_to)),
            };
            insert_value(params, gte, lower);
            insert_value(params, lte, upper);
        }
        Operator::Equals => insert_value(params, field.to_string(), value),
    }
}

fn insert_value(params: &mut QueryParams, key: String, value: Option<&FilterValue>) {
    if let Some(value) = value {
        params.insert(key, value.to_string());
    }
}
