//! # facetplan-core
//!
//! The deterministic Facet Rendering Selector - THE LOGIC.
//!
//! Given a storefront preferences document, this crate decides how every
//! facet should be rendered and produces serializable render plans:
//! - enumerated list / checkbox selection
//! - a fixed numeric or date range control
//! - an open-ended dynamic range slider
//!
//! For date-typed facets it also picks a calendar interval coarse enough that
//! a histogram over the configured range stays readable.
//!
//! ## Layers
//!
//! - `granularity` → Bucket-Size Estimator
//! - `mode` → Facet Mode Resolver
//! - `preferences` → one-shot normalization of the preferences document
//! - `plan` → Presentation Layer (mode + granularity → control description)
//! - `sanitize` → rich-text sanitizer contract and default implementation
//!
//! ## Architectural Constraints
//!
//! - Pure functions: identical input always yields identical output
//! - Integer arithmetic only (no floats)
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod granularity;
pub mod mode;
pub mod plan;
pub mod preferences;
pub mod primitives;
pub mod sanitize;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ConfigError, CustomMessages, ExportType, FacetConfig, FacetError, FacetKind, FacetValue,
    FilterType, StaticFacet, ThemeType,
};

// =============================================================================
// RE-EXPORTS: Selector
// =============================================================================

pub use granularity::{
    Granularity, GranularityEstimate, bucket_count, estimate_granularity,
    estimate_granularity_for, exceeds_bucket_limit,
};
pub use mode::{FacetMode, resolve_mode};

// =============================================================================
// RE-EXPORTS: Planning
// =============================================================================

pub use plan::{
    DateHistogram, FacetControl, FacetPlan, FacetWarning, LabelTemplate, PlanContext,
    RangeBounds, RangeLabels, WidgetPlan, plan_facet, plan_preferences,
};
pub use preferences::{
    AnalyticsConfig, BackendSettings, Preferences, ResultLayout, ResultSettings, SortOption,
    parse_facet_entry, react_dependencies,
};
pub use sanitize::{MarkupSanitizer, Sanitizer};
