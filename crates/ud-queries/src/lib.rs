//! # ud-queries
//!
//! Filter-rule engine for the Userdesk user listing.
//!
//! This crate turns structured filter criteria over typed user fields into the
//! flat query parameters the users API expects, and keeps the listing state
//! (page, size, sort, search, rules) in a shareable location string.
//!
//! ## Structure
//!
//! - `catalog` - Static registry of filterable/sortable user fields
//! - `operators` - Operators and the legal set per semantic type
//! - `filters` - Filter rules, values, and the per-field rule set
//! - `sorts` - Sort direction and `order_by` specs
//! - `state` - The listing `QueryState` and its deltas
//! - `encoder` - `QueryState` to API parameters, with per-field aliases
//! - `url_state` - `QueryState` to and from the location query string
//! - `presets` - Rule sets used by the statistics page
//!
//! ## Example
//!
//! ```
//! use ud_queries::{encode, FilterRule, QueryState, RuleSet};
//!
//! let rules = RuleSet::new()
//!     .with(FilterRule::between("score", 10, 50))
//!     .unwrap()
//!     .with(FilterRule::is_empty("country"))
//!     .unwrap();
//! let params = encode(&QueryState::new().with_rules(rules));
//!
//! assert_eq!(params.get("min_score"), Some("10"));
//! assert_eq!(params.get("max_score"), Some("50"));
//! assert_eq!(params.get("no_country"), Some("true"));
//! assert_eq!(params.get("order_by"), Some("-counter"));
//! ```

pub mod catalog;
pub mod operators;
pub mod filters;
pub mod sorts;
pub mod state;
pub mod encoder;
pub mod url_state;
pub mod presets;

// Re-exports for convenience
pub use catalog::{user_catalog, FieldCatalog, FieldDescriptor, SemanticType};
pub use operators::{operators_for, Arity, Operator};
pub use filters::{coerce_input, FilterRule, FilterValue, RuleSet};
pub use sorts::{sortable_fields, SortDirection, SortSpec};
pub use state::{QueryState, QueryStateDelta};
pub use encoder::{encode, encode_count, QueryParams};
pub use url_state::{LocationStore, MemoryLocation, UrlState};
