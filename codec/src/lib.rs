//! elastic-builder - Filter tree / search query codec
//!
//! Converts between an editable tree of filter groups and rules and the
//! boolean filter query a search engine accepts, in both directions.
//!
//! # Core Types
//!
//! - [`FieldMap`] - Per-field metadata driving both directions
//! - [`FilterNode`] - Group or rule in the editable tree
//! - [`Query`] - Single-key wire clause (`and`, `term`, `range`, ...)
//! - [`BuilderSession`] - Keeps a tree and its query in step while editing
//!
//! # Example
//!
//! ```
//! use elastic_builder::{FieldDescriptor, FieldMap, Query, decode, encode};
//!
//! let fields = FieldMap::new().with("created", FieldDescriptor::date());
//! let query: Vec<Query> = serde_json::from_value(serde_json::json!([
//!     {"range": {"created": {"gte": "now-7d", "lte": "now"}}}
//! ]))
//! .unwrap();
//!
//! let filters = decode(&query, &fields).unwrap();
//! assert_eq!(encode(&filters, &fields).unwrap(), query);
//! ```

// ============================================================================
// MODULES
// ============================================================================

pub mod date;
pub mod decode;
pub mod encode;
pub mod error;
pub mod field;
pub mod filter;
pub mod query;
pub mod session;
pub mod style;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use date::{DateFormat, RelativeKind, RelativeWindow, RuleDate};
pub use decode::decode;
pub use encode::encode;
pub use error::{CodecError, Result};
pub use field::{FieldDescriptor, FieldKind, FieldMap, FieldSubType, RuleType};
pub use filter::{
    BOOLEAN_CHOICES, Combinator, Comparator, FilterGroup, FilterNode, FilterRule, FilterTree,
    RuleSubType,
};
pub use query::Query;
pub use session::BuilderSession;
pub use style::{GROUP_STYLES, chooser_level, color_for, group_actions_level};
