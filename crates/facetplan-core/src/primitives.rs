//! # Primitives
//!
//! Hardcoded constants for the facet rendering selector.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Maximum number of histogram buckets considered readable.
///
/// A date histogram whose range divided by the bucket width exceeds this
/// value is coarsened by the estimator.
pub const MAX_HISTOGRAM_BUCKETS: u64 = 100;

/// Query format handed to range controls for date-typed facets.
pub const DATE_QUERY_FORMAT: &str = "date";

/// Currency prefix used when the preferences document does not set one.
pub const DEFAULT_CURRENCY: &str = "$";

/// Component id of the search box every facet reacts to.
pub const SEARCH_COMPONENT_ID: &str = "search";

/// Component id of the query that scopes the collection list to collection
/// documents.
pub const COLLECTION_SCOPE_COMPONENT_ID: &str = "filter_by_collection";

/// Placeholder for the lower bound inside a [`crate::LabelTemplate`].
pub const LABEL_MIN_PLACEHOLDER: &str = "{min}";

/// Placeholder for the upper bound inside a [`crate::LabelTemplate`].
pub const LABEL_MAX_PLACEHOLDER: &str = "{max}";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of dynamic facets in one preferences document.
pub const MAX_FACETS: usize = 64;

/// Maximum length for identifiers, field paths, titles and labels.
pub const MAX_FIELD_LENGTH: usize = 256;

/// Maximum length for rich-text messages (8 KiB).
pub const MAX_MESSAGE_LENGTH: usize = 8192;
