//! # API Endpoint Handlers
//!
//! Every handler is a pure function of the request body and the immutable
//! [`AppState`]. Configuration errors map to 400, everything else to 500.

use super::{
    AppState,
    types::{
        ErrorResponse, FacetPlanResponse, GranularityRequest, GranularityResponse, HealthResponse,
        ModeResponse, WidgetPlanResponse,
    },
};
use axum::{
    Json,
    extract::{FromRequest, Request, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use facetplan_core::{
    FacetError, PlanContext, Preferences, estimate_granularity_for, parse_facet_entry, plan_facet,
    plan_preferences, resolve_mode,
};

/// Status code for a core error.
pub fn error_status(error: &FacetError) -> StatusCode {
    if error.is_config_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(context: &str, error: &FacetError) -> Response {
    let status = error_status(error);
    if status.is_server_error() {
        tracing::error!(error = %error, "{} failed", context);
    } else {
        tracing::debug!(error = %error, "{} rejected", context);
    }
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}

/// JSON body extractor whose rejections use the [`ErrorResponse`] shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let message = rejection.body_text();
                tracing::debug!(error = %message, "request body rejected");
                Err((rejection.status(), Json(ErrorResponse::new(message))).into_response())
            }
        }
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// WIDGET PLAN HANDLERS
// =============================================================================

/// Plan a preferences document sent in the body.
pub async fn plan_handler(
    State(state): State<AppState>,
    JsonBody(document): JsonBody<serde_json::Value>,
) -> Response {
    let plan = Preferences::from_value(document)
        .and_then(|prefs| plan_preferences(&prefs, state.sanitizer.as_ref()));

    match plan {
        Ok(plan) => (StatusCode::OK, Json(WidgetPlanResponse::success(plan))).into_response(),
        Err(e) => error_response("plan", &e),
    }
}

/// Plan the preferences loaded at startup.
pub async fn startup_plan_handler(State(state): State<AppState>) -> Response {
    let Some(prefs) = state.preferences.as_deref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("No preferences loaded at startup")),
        )
            .into_response();
    };

    match plan_preferences(prefs, state.sanitizer.as_ref()) {
        Ok(plan) => (StatusCode::OK, Json(WidgetPlanResponse::success(plan))).into_response(),
        Err(e) => error_response("startup plan", &e),
    }
}

// =============================================================================
// FACET HANDLERS
// =============================================================================

/// Resolve the rendering mode of one `{rsConfig, customMessages}` entry.
pub async fn facet_mode_handler(JsonBody(entry): JsonBody<serde_json::Value>) -> Response {
    match parse_facet_entry(entry) {
        Ok(facet) => (
            StatusCode::OK,
            Json(ModeResponse::success(
                facet.component_id.clone(),
                resolve_mode(&facet),
            )),
        )
            .into_response(),
        Err(e) => error_response("facet mode", &e),
    }
}

/// Plan one facet entry.
///
/// When startup preferences are loaded, their theme, currency and facets
/// supply the widget context; otherwise the defaults apply.
pub async fn facet_plan_handler(
    State(state): State<AppState>,
    JsonBody(entry): JsonBody<serde_json::Value>,
) -> Response {
    let facet = match parse_facet_entry(entry) {
        Ok(facet) => facet,
        Err(e) => return error_response("facet plan", &e),
    };

    let peers = state
        .preferences
        .as_deref()
        .map(Preferences::component_ids)
        .unwrap_or_default();
    let mut ctx = PlanContext::new(state.sanitizer.as_ref()).with_peers(&peers);
    if let Some(prefs) = state.preferences.as_deref() {
        ctx = ctx
            .with_theme(prefs.theme_type)
            .with_currency(&prefs.currency);
    }

    match plan_facet(&facet, &ctx) {
        Ok(plan) => (StatusCode::OK, Json(FacetPlanResponse::success(plan))).into_response(),
        Err(e) => error_response("facet plan", &e),
    }
}

// =============================================================================
// GRANULARITY HANDLER
// =============================================================================

/// Run the bucket-size estimator.
pub async fn granularity_handler(JsonBody(request): JsonBody<GranularityRequest>) -> Response {
    let requested = request
        .calendar_interval
        .as_deref()
        .filter(|name| !name.is_empty());

    match estimate_granularity_for(request.total_range_ms, requested) {
        Ok(estimate) => (
            StatusCode::OK,
            Json(GranularityResponse::success(request.total_range_ms, estimate)),
        )
            .into_response(),
        Err(e) => error_response("granularity", &FacetError::from(e)),
    }
}
