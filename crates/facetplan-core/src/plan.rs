//! # Planner (Presentation Layer)
//!
//! Turns a resolved [`FacetMode`] (and, for date facets, a resolved
//! [`Granularity`]) into a [`FacetControl`]: a serializable description of
//! the list, range input or range slider the host should render.
//!
//! The planner decides; the host renders. Data fields, labels and histogram
//! visibility pass through unchanged. Rich-text messages are sanitized here,
//! before they can reach the DOM.

use crate::granularity::{Granularity, estimate_granularity, exceeds_bucket_limit};
use crate::mode::{FacetMode, resolve_mode};
use crate::preferences::{
    AnalyticsConfig, BackendSettings, Preferences, ResultSettings, dependencies_among,
};
use crate::primitives::{
    DATE_QUERY_FORMAT, DEFAULT_CURRENCY, LABEL_MAX_PLACEHOLDER, LABEL_MIN_PLACEHOLDER,
};
use crate::sanitize::Sanitizer;
use crate::types::{
    ConfigError, ExportType, FacetConfig, FacetError, FacetKind, FacetValue, StaticFacet,
    ThemeType,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// PLAN TYPES
// =============================================================================

/// Preconfigured bounds of a range input.
///
/// Numeric facets hold the integer bounds; date facets hold epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBounds {
    pub start: i64,
    pub end: i64,
}

impl RangeBounds {
    /// Width of the range, independent of endpoint order.
    #[must_use]
    pub fn span(&self) -> u64 {
        self.start.abs_diff(self.end)
    }
}

/// Fixed labels under the range endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLabels {
    pub start: String,
    pub end: String,
}

/// Labels computed by the host from the live bounds.
///
/// `{min}` and `{max}` are replaced with the current bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTemplate {
    pub start: String,
    pub end: String,
}

/// Date-mode settings of a range control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateHistogram {
    pub query_format: String,
    pub calendar_interval: Granularity,
    pub warning: Option<String>,
}

/// The control a facet renders as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FacetControl {
    /// Multi-select list with optional checkboxes.
    MultiList {
        data_field: String,
        filter_label: String,
        show_checkbox: bool,
        show_count: bool,
        show_search: bool,
        react_and: Vec<String>,
        loading_html: String,
        no_results_html: String,
    },
    /// Range input with preconfigured bounds.
    RangeInput {
        data_field: String,
        filter_label: String,
        range: RangeBounds,
        range_labels: RangeLabels,
        show_histogram: bool,
        date: Option<DateHistogram>,
    },
    /// Range slider whose bounds come from the result set.
    DynamicRangeSlider {
        data_field: String,
        filter_label: String,
        show_histogram: bool,
        range_labels: Option<LabelTemplate>,
        loading_html: Option<String>,
        date: Option<DateHistogram>,
    },
}

impl FacetControl {
    /// Date settings, when the control is a date range.
    #[must_use]
    pub fn date(&self) -> Option<&DateHistogram> {
        match self {
            FacetControl::MultiList { .. } => None,
            FacetControl::RangeInput { date, .. } | FacetControl::DynamicRangeSlider { date, .. } => {
                date.as_ref()
            }
        }
    }
}

/// Render plan of one facet panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetPlan {
    pub component_id: String,
    pub title: String,
    pub mode: FacetMode,
    pub show_arrow: bool,
    pub url_params: bool,
    pub control: FacetControl,
}

impl FacetPlan {
    /// Estimator diagnostic for this facet, if any.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.control.date().and_then(|d| d.warning.as_deref())
    }
}

/// A diagnostic tied to the facet that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetWarning {
    pub component_id: String,
    pub message: String,
}

/// Render plan of the whole widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPlan {
    pub theme_type: ThemeType,
    pub currency: String,
    pub export_type: ExportType,
    pub backend: BackendSettings,
    pub analytics: AnalyticsConfig,
    pub results: ResultSettings,
    pub facets: Vec<FacetPlan>,
    pub warnings: Vec<FacetWarning>,
}

// =============================================================================
// PLAN CONTEXT
// =============================================================================

/// Widget-wide inputs the planner needs besides the facet itself.
pub struct PlanContext<'a> {
    pub theme_type: ThemeType,
    pub currency: &'a str,
    pub sanitizer: &'a dyn Sanitizer,
    /// Component ids of every facet in the widget.
    pub peers: &'a [String],
}

impl<'a> PlanContext<'a> {
    /// Context for a facet planned on its own: classic theme, default
    /// currency, no peer facets.
    #[must_use]
    pub fn new(sanitizer: &'a dyn Sanitizer) -> Self {
        Self {
            theme_type: ThemeType::Classic,
            currency: DEFAULT_CURRENCY,
            sanitizer,
            peers: &[],
        }
    }

    #[must_use]
    pub fn with_theme(mut self, theme_type: ThemeType) -> Self {
        self.theme_type = theme_type;
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: &'a str) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn with_peers(mut self, peers: &'a [String]) -> Self {
        self.peers = peers;
        self
    }

    fn react_and(&self, config: &FacetConfig) -> Vec<String> {
        let peers = || dependencies_among(self.peers.iter().map(String::as_str), &config.component_id);
        match config.kind {
            FacetKind::Static(facet) => {
                let companion = facet.defaults().companion.map(str::to_string);
                if facet.reacts_to_peers() {
                    companion.into_iter().chain(peers()).collect()
                } else {
                    companion.into_iter().collect()
                }
            }
            FacetKind::Dynamic => peers(),
        }
    }

    fn sanitize(&self, html: Option<&str>) -> String {
        html.map(|h| self.sanitizer.sanitize(h)).unwrap_or_default()
    }
}

// =============================================================================
// PLANNING
// =============================================================================

/// Plan a single facet.
pub fn plan_facet(config: &FacetConfig, ctx: &PlanContext<'_>) -> Result<FacetPlan, FacetError> {
    let mode = resolve_mode(config);
    let control = match (mode, config.bounded_range()) {
        (FacetMode::List, _) => list_control(config, ctx),
        (FacetMode::BoundedRange, Some((start, end))) => range_input(config, start, end)?,
        _ => range_slider(config, ctx),
    };

    Ok(FacetPlan {
        component_id: config.component_id.clone(),
        title: config.title.clone().unwrap_or_default(),
        mode,
        show_arrow: ctx.theme_type.shows_decorations(),
        url_params: true,
        control,
    })
}

/// Plan every facet of a preferences snapshot.
///
/// Static facets come first in panel order, then dynamic facets in document
/// order. Estimator diagnostics are collected into `warnings`.
pub fn plan_preferences(
    preferences: &Preferences,
    sanitizer: &dyn Sanitizer,
) -> Result<WidgetPlan, FacetError> {
    let peers = preferences.component_ids();
    let ctx = PlanContext::new(sanitizer)
        .with_theme(preferences.theme_type)
        .with_currency(&preferences.currency)
        .with_peers(&peers);

    let facets = preferences
        .facets()
        .map(|facet| plan_facet(facet, &ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let warnings: Vec<FacetWarning> = facets
        .iter()
        .filter_map(|plan| {
            plan.warning().map(|message| FacetWarning {
                component_id: plan.component_id.clone(),
                message: message.to_string(),
            })
        })
        .collect();

    for warning in &warnings {
        tracing::warn!(facet = %warning.component_id, "{}", warning.message);
    }

    Ok(WidgetPlan {
        theme_type: preferences.theme_type,
        currency: preferences.currency.clone(),
        export_type: preferences.export_type,
        backend: preferences.backend.clone(),
        analytics: preferences.analytics.clone(),
        results: preferences.results.clone(),
        facets,
        warnings,
    })
}

fn list_control(config: &FacetConfig, ctx: &PlanContext<'_>) -> FacetControl {
    let decorated = ctx.theme_type.shows_decorations();
    FacetControl::MultiList {
        data_field: config.data_field.clone(),
        filter_label: config.display_label().to_string(),
        show_checkbox: decorated,
        show_count: decorated,
        show_search: config.kind != FacetKind::Static(StaticFacet::Color),
        react_and: ctx.react_and(config),
        loading_html: ctx.sanitize(config.custom_messages.loading.as_deref()),
        no_results_html: ctx.sanitize(config.custom_messages.no_results.as_deref()),
    }
}

fn range_input(
    config: &FacetConfig,
    start: &FacetValue,
    end: &FacetValue,
) -> Result<FacetControl, ConfigError> {
    let range = if config.filter_type.is_date() {
        RangeBounds {
            start: date_bound(config, start)?,
            end: date_bound(config, end)?,
        }
    } else {
        RangeBounds {
            start: numeric_bound(config, start)?,
            end: numeric_bound(config, end)?,
        }
    };

    let date = config
        .filter_type
        .is_date()
        .then(|| date_histogram(config, Some(range.span())));

    Ok(FacetControl::RangeInput {
        data_field: config.data_field.clone(),
        filter_label: config.display_label().to_string(),
        range,
        range_labels: RangeLabels {
            start: config.start_label.clone().unwrap_or_default(),
            end: config.end_label.clone().unwrap_or_default(),
        },
        show_histogram: config.show_histogram,
        date,
    })
}

fn range_slider(config: &FacetConfig, ctx: &PlanContext<'_>) -> FacetControl {
    let range_labels = (config.kind == FacetKind::Static(StaticFacet::Price)).then(|| {
        LabelTemplate {
            start: format!("{} {}", ctx.currency, LABEL_MIN_PLACEHOLDER),
            end: format!("{} {}", ctx.currency, LABEL_MAX_PLACEHOLDER),
        }
    });
    let loading_html = config
        .custom_messages
        .loading
        .as_deref()
        .filter(|message| !message.is_empty())
        .map(|message| ctx.sanitizer.sanitize(message));

    FacetControl::DynamicRangeSlider {
        data_field: config.data_field.clone(),
        filter_label: config.display_label().to_string(),
        show_histogram: config.show_histogram,
        range_labels,
        loading_html,
        date: config
            .filter_type
            .is_date()
            .then(|| date_histogram(config, None)),
    }
}

fn numeric_bound(config: &FacetConfig, value: &FacetValue) -> Result<i64, ConfigError> {
    value
        .leading_integer()
        .ok_or_else(|| ConfigError::InvalidRangeValue {
            facet: config.name().to_string(),
            value: value.to_string(),
        })
}

fn date_bound(config: &FacetConfig, value: &FacetValue) -> Result<i64, ConfigError> {
    value.epoch_millis().ok_or_else(|| ConfigError::InvalidDate {
        facet: config.name().to_string(),
        value: value.to_string(),
    })
}

/// Calendar interval for a date facet.
///
/// With a known span the configured interval (default `Minute`) is a floor,
/// raised by the estimator only when it would exceed the bucket limit. Without
/// a span the configured interval is used as is (default `Year`).
fn date_histogram(config: &FacetConfig, span_ms: Option<u64>) -> DateHistogram {
    let (calendar_interval, warning) = match span_ms {
        Some(span) => {
            let floor = config.calendar_interval.unwrap_or(Granularity::Minute);
            if exceeds_bucket_limit(span, floor) {
                let estimate = estimate_granularity(span, floor);
                (estimate.granularity, estimate.warning)
            } else {
                (floor, None)
            }
        }
        None => (config.calendar_interval.unwrap_or(Granularity::Year), None),
    };

    DateHistogram {
        query_format: DATE_QUERY_FORMAT.to_string(),
        calendar_interval,
        warning,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::MarkupSanitizer;
    use crate::types::FilterType;

    fn sanitizer() -> MarkupSanitizer {
        MarkupSanitizer::new()
    }

    fn static_facet(facet: StaticFacet, filter_type: FilterType) -> FacetConfig {
        let defaults = facet.defaults();
        let mut config = FacetConfig::new(defaults.component_id, defaults.data_field, filter_type)
            .with_title(defaults.title);
        config.kind = FacetKind::Static(facet);
        config
    }

    #[test]
    fn list_control_follows_theme() {
        let sanitizer = sanitizer();
        let facet = FacetConfig::new("brand", "brand.keyword", FilterType::List);

        let classic = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect("plan");
        let minimal = plan_facet(
            &facet,
            &PlanContext::new(&sanitizer).with_theme(ThemeType::Minimal),
        )
        .expect("plan");

        match (&classic.control, &minimal.control) {
            (
                FacetControl::MultiList {
                    show_checkbox: classic_checkbox,
                    show_count: classic_count,
                    ..
                },
                FacetControl::MultiList {
                    show_checkbox: minimal_checkbox,
                    show_count: minimal_count,
                    ..
                },
            ) => {
                assert!(*classic_checkbox && *classic_count);
                assert!(!*minimal_checkbox && !*minimal_count);
            }
            other => unreachable!("expected lists, got {other:?}"),
        }
        assert!(classic.show_arrow);
        assert!(!minimal.show_arrow);
    }

    #[test]
    fn list_messages_are_sanitized() {
        let sanitizer = sanitizer();
        let mut facet = FacetConfig::new("brand", "brand", FilterType::List);
        facet.custom_messages.loading = Some("<b>Loading</b><script>steal()</script>".to_string());

        let plan = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect("plan");
        match plan.control {
            FacetControl::MultiList {
                loading_html,
                no_results_html,
                ..
            } => {
                assert_eq!(loading_html, "<b>Loading</b>");
                assert_eq!(no_results_html, "");
            }
            other => unreachable!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn static_list_reacts_to_companion_and_peers() {
        let sanitizer = sanitizer();
        let peers = vec!["color".to_string(), "size".to_string(), "brand".to_string()];
        let ctx = PlanContext::new(&sanitizer).with_peers(&peers);

        let color = plan_facet(&static_facet(StaticFacet::Color, FilterType::List), &ctx)
            .expect("plan");
        match color.control {
            FacetControl::MultiList {
                react_and,
                show_search,
                ..
            } => {
                assert_eq!(react_and, vec!["colorOption", "search", "size", "brand"]);
                assert!(!show_search);
            }
            other => unreachable!("expected list, got {other:?}"),
        }

        let collection =
            plan_facet(&static_facet(StaticFacet::Collection, FilterType::List), &ctx)
                .expect("plan");
        match collection.control {
            FacetControl::MultiList { react_and, .. } => {
                assert_eq!(react_and, vec!["filter_by_collection"]);
            }
            other => unreachable!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn bounded_numeric_range() {
        let sanitizer = sanitizer();
        let mut facet =
            FacetConfig::new("weight", "weight", FilterType::Range).with_range("10kg", "20");
        facet.start_label = Some("Light".to_string());
        facet.show_histogram = true;

        let plan = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect("plan");
        assert_eq!(plan.mode, FacetMode::BoundedRange);
        match plan.control {
            FacetControl::RangeInput {
                range,
                range_labels,
                show_histogram,
                date,
                ..
            } => {
                assert_eq!(range, RangeBounds { start: 10, end: 20 });
                assert_eq!(range_labels.start, "Light");
                assert_eq!(range_labels.end, "");
                assert!(show_histogram);
                assert!(date.is_none());
            }
            other => unreachable!("expected range input, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_bound_is_rejected() {
        let sanitizer = sanitizer();
        let facet = FacetConfig::new("weight", "weight", FilterType::Range).with_range("light", "20");
        let err = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect_err("bad bound");
        assert!(matches!(
            err,
            FacetError::Config(ConfigError::InvalidRangeValue { .. })
        ));
    }

    #[test]
    fn bounded_date_range_is_coarsened() {
        let sanitizer = sanitizer();
        let facet = FacetConfig::new("released", "released_at", FilterType::Date)
            .with_range("2020-01-01", "2020-07-19")
            .with_calendar_interval(Granularity::Day);

        let plan = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect("plan");
        let date = plan.control.date().expect("date settings");
        assert_eq!(date.query_format, "date");
        assert_eq!(date.calendar_interval, Granularity::Week);
        assert!(plan.warning().is_some());
    }

    #[test]
    fn bounded_date_range_within_limit_keeps_interval() {
        let sanitizer = sanitizer();
        let facet = FacetConfig::new("released", "released_at", FilterType::Date)
            .with_range("2020-01-01", "2020-02-01")
            .with_calendar_interval(Granularity::Day);

        let plan = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect("plan");
        let date = plan.control.date().expect("date settings");
        assert_eq!(date.calendar_interval, Granularity::Day);
        assert!(plan.warning().is_none());
    }

    #[test]
    fn reversed_date_bounds_use_absolute_span() {
        let sanitizer = sanitizer();
        let facet = FacetConfig::new("released", "released_at", FilterType::Date)
            .with_range("2024-01-01", "2020-01-01");

        let plan = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect("plan");
        let date = plan.control.date().expect("date settings");
        assert_eq!(date.calendar_interval, Granularity::Month);
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let sanitizer = sanitizer();
        let facet = FacetConfig::new("released", "released_at", FilterType::Date)
            .with_range("soon", "2020-01-01");
        let err = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect_err("bad date");
        assert!(matches!(err, FacetError::Config(ConfigError::InvalidDate { .. })));
    }

    #[test]
    fn open_date_range_defaults_to_year() {
        let sanitizer = sanitizer();
        let facet = FacetConfig::new("released", "released_at", FilterType::Date);

        let plan = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect("plan");
        assert_eq!(plan.mode, FacetMode::DynamicRange);
        let date = plan.control.date().expect("date settings");
        assert_eq!(date.calendar_interval, Granularity::Year);
        assert!(date.warning.is_none());
    }

    #[test]
    fn price_slider_gets_currency_template() {
        let sanitizer = sanitizer();
        let facet = static_facet(StaticFacet::Price, FilterType::Other);
        let plan = plan_facet(&facet, &PlanContext::new(&sanitizer).with_currency("€"))
            .expect("plan");

        match plan.control {
            FacetControl::DynamicRangeSlider {
                range_labels,
                loading_html,
                data_field,
                ..
            } => {
                let labels = range_labels.expect("template");
                assert_eq!(labels.start, "€ {min}");
                assert_eq!(labels.end, "€ {max}");
                assert!(loading_html.is_none());
                assert_eq!(data_field, "variants.price");
            }
            other => unreachable!("expected slider, got {other:?}"),
        }
    }

    #[test]
    fn control_serializes_with_component_tag() {
        let sanitizer = sanitizer();
        let facet = FacetConfig::new("weight", "weight", FilterType::Range);
        let plan = plan_facet(&facet, &PlanContext::new(&sanitizer)).expect("plan");

        let json = serde_json::to_value(&plan).expect("serialize");
        assert_eq!(json["mode"], "dynamicRange");
        assert_eq!(json["control"]["component"], "dynamicRangeSlider");
        assert_eq!(json["control"]["dataField"], "weight");
        assert_eq!(json["urlParams"], true);
    }
}
