//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Every response except `/health` carries `success`. Failures have the
//! shape `{"success": false, "error": "..."}`.

use facetplan_core::{
    FacetMode, FacetPlan, GranularityEstimate, WidgetPlan, bucket_count,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Failure body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// =============================================================================
// PLAN RESPONSES
// =============================================================================

/// Whole-widget plan response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetPlanResponse {
    pub success: bool,
    pub plan: WidgetPlan,
}

impl WidgetPlanResponse {
    pub fn success(plan: WidgetPlan) -> Self {
        Self {
            success: true,
            plan,
        }
    }
}

/// Single-facet plan response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetPlanResponse {
    pub success: bool,
    pub plan: FacetPlan,
}

impl FacetPlanResponse {
    pub fn success(plan: FacetPlan) -> Self {
        Self {
            success: true,
            plan,
        }
    }
}

// =============================================================================
// MODE RESPONSE
// =============================================================================

/// Resolved rendering mode of one facet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeResponse {
    pub success: bool,
    pub component_id: String,
    pub mode: FacetMode,
}

impl ModeResponse {
    pub fn success(component_id: impl Into<String>, mode: FacetMode) -> Self {
        Self {
            success: true,
            component_id: component_id.into(),
            mode,
        }
    }
}

// =============================================================================
// GRANULARITY REQUEST/RESPONSE
// =============================================================================

/// Estimator request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GranularityRequest {
    pub total_range_ms: u64,
    #[serde(default)]
    pub calendar_interval: Option<String>,
}

/// Estimator response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GranularityResponse {
    pub success: bool,
    pub estimate: GranularityEstimate,
    /// Buckets the histogram has at the chosen interval.
    pub bucket_count: u64,
}

impl GranularityResponse {
    pub fn success(total_range_ms: u64, estimate: GranularityEstimate) -> Self {
        Self {
            success: true,
            bucket_count: bucket_count(total_range_ms, estimate.granularity),
            estimate,
        }
    }
}
