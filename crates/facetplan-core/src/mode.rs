//! # Facet Mode Resolver
//!
//! Decides which of the three rendering modes applies to a facet.
//!
//! Priority:
//! 1. `filterType == list` → [`FacetMode::List`], whatever else is set
//! 2. both range endpoints present and non-empty → [`FacetMode::BoundedRange`]
//! 3. otherwise → [`FacetMode::DynamicRange`]

use crate::types::{FacetConfig, FilterType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering mode of a facet. Derived, never stored in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacetMode {
    /// Enumerated values with checkbox selection.
    List,
    /// Range control with preconfigured bounds.
    BoundedRange,
    /// Range control whose bounds come from the current result set.
    DynamicRange,
}

impl FacetMode {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FacetMode::List => "list",
            FacetMode::BoundedRange => "boundedRange",
            FacetMode::DynamicRange => "dynamicRange",
        }
    }

    /// Whether the mode renders a range control.
    #[must_use]
    pub fn is_range(&self) -> bool {
        !matches!(self, FacetMode::List)
    }
}

impl fmt::Display for FacetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Resolve the rendering mode of a facet. Pure and infallible.
#[must_use]
pub fn resolve_mode(config: &FacetConfig) -> FacetMode {
    if config.filter_type == FilterType::List {
        return FacetMode::List;
    }
    if config.bounded_range().is_some() {
        return FacetMode::BoundedRange;
    }
    FacetMode::DynamicRange
}

// =============================================================================
// TESTS
// =============================================================================
