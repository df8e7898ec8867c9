//! # Preferences Normalizer
//!
//! Parses the storefront preferences document exactly once and applies every
//! default in one place. Everything downstream works on the typed
//! [`Preferences`] snapshot; nothing re-reads the raw JSON.
//!
//! ## Document shape (relevant parts)
//!
//! ```text
//! {
//!   "themeSettings":   { "type": "classic" | "minimal" },
//!   "globalSettings":  { "currency": "$" },
//!   "appbaseSettings": { "index": "...", "url": "...", "userId": "..." },
//!   "exportSettings":  { "type": "shopify" },
//!   "resultSettings":  { "layout": "grid", "mapLayout": "map", "viewSwitcher": true,
//!                        "resultHighlight": false, "sortOptionSelector": [...],
//!                        "rsConfig": { "infiniteScroll": true } },
//!   "facetSettings": {
//!     "staticFacets":  [ { "name": "color", "rsConfig": {...}, "customMessages": {...} } ],
//!     "dynamicFacets": [ { "rsConfig": {...}, "customMessages": {...} } ]
//!   }
//! }
//! ```

use crate::granularity::Granularity;
use crate::primitives::{DEFAULT_CURRENCY, MAX_FACETS, SEARCH_COMPONENT_ID};
use crate::types::{
    ConfigError, CustomMessages, ExportType, FacetConfig, FacetError, FacetKind, FacetValue,
    FilterType, StaticFacet, ThemeType,
};
use serde::{Deserialize, Serialize};

/// Loading message for dynamic list facets without one.
const DYNAMIC_LOADING_MESSAGE: &str = "Loading options";

/// No-results message for dynamic list facets without one.
const DYNAMIC_NO_RESULTS_MESSAGE: &str = "No items Found";

// =============================================================================
// RAW DOCUMENT
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPreferences {
    theme_settings: Option<RawTypeSetting>,
    global_settings: Option<RawGlobalSettings>,
    appbase_settings: Option<RawAppbaseSettings>,
    export_settings: Option<RawTypeSetting>,
    result_settings: Option<RawResultSettings>,
    facet_settings: Option<RawFacetSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTypeSetting {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGlobalSettings {
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAppbaseSettings {
    index: Option<String>,
    url: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawResultSettings {
    layout: Option<String>,
    map_layout: Option<String>,
    view_switcher: Option<bool>,
    result_highlight: Option<bool>,
    sort_option_selector: Option<Vec<SortOption>>,
    rs_config: Option<RawResultRsConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawResultRsConfig {
    infinite_scroll: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFacetSettings {
    static_facets: Option<Vec<RawFacetEntry>>,
    dynamic_facets: Option<Vec<RawFacetEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFacetEntry {
    name: Option<String>,
    rs_config: Option<RawRsConfig>,
    custom_messages: Option<CustomMessages>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRsConfig {
    component_id: Option<String>,
    data_field: Option<String>,
    filter_type: Option<String>,
    start_value: Option<FacetValue>,
    end_value: Option<FacetValue>,
    start_label: Option<String>,
    end_label: Option<String>,
    title: Option<String>,
    filter_label: Option<String>,
    calendar_interval: Option<String>,
    show_histogram: Option<bool>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// =============================================================================
// NORMALIZED SETTINGS
// =============================================================================

/// Search backend coordinates. Credentials are never carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSettings {
    pub index: Option<String>,
    pub url: Option<String>,
}

/// Analytics options spliced into search requests.
///
/// Passed explicitly to whoever builds requests; there is no shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsConfig {
    pub record_analytics: bool,
    pub user_id: Option<String>,
}

impl AnalyticsConfig {
    /// Analytics enabled, with an optional user id (empty ids are dropped).
    #[must_use]
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            record_analytics: true,
            user_id: non_empty(user_id),
        }
    }

    /// The request options object handed to the search client.
    #[must_use]
    pub fn request_options(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut options = serde_json::Map::new();
        options.insert(
            "recordAnalytics".to_string(),
            serde_json::Value::Bool(self.record_analytics),
        );
        if let Some(user_id) = &self.user_id {
            options.insert(
                "userId".to_string(),
                serde_json::Value::String(user_id.clone()),
            );
        }
        options
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

/// How the result set is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultLayout {
    #[default]
    Grid,
    List,
    Map,
}

/// One entry of the sort selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortOption {
    pub label: String,
    pub data_field: String,
    pub sort_by: String,
}

/// Result list settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSettings {
    pub layout: ResultLayout,
    pub view_switcher: bool,
    pub infinite_scroll: bool,
    pub highlight: bool,
    pub sort_options: Vec<SortOption>,
}

impl Default for ResultSettings {
    fn default() -> Self {
        Self {
            layout: ResultLayout::Grid,
            view_switcher: true,
            infinite_scroll: true,
            highlight: false,
            sort_options: Vec::new(),
        }
    }
}

impl ResultSettings {
    fn from_raw(raw: RawResultSettings) -> Self {
        let defaults = Self::default();
        let layout = if raw.map_layout.as_deref() == Some("map") {
            ResultLayout::Map
        } else {
            match raw.layout.as_deref() {
                Some("list") => ResultLayout::List,
                Some("map") => ResultLayout::Map,
                _ => defaults.layout,
            }
        };

        Self {
            layout,
            view_switcher: raw.view_switcher.unwrap_or(defaults.view_switcher),
            infinite_scroll: raw
                .rs_config
                .and_then(|rs| rs.infinite_scroll)
                .unwrap_or(defaults.infinite_scroll),
            highlight: raw.result_highlight.unwrap_or(defaults.highlight),
            sort_options: raw.sort_option_selector.unwrap_or_default(),
        }
    }
}

// =============================================================================
// PREFERENCES
// =============================================================================

/// Normalized preferences snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme_type: ThemeType,
    pub currency: String,
    pub export_type: ExportType,
    pub backend: BackendSettings,
    pub analytics: AnalyticsConfig,
    pub results: ResultSettings,
    /// Static facets, in panel display order.
    pub static_facets: Vec<FacetConfig>,
    /// Dynamic facets, in document order.
    pub dynamic_facets: Vec<FacetConfig>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme_type: ThemeType::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            export_type: ExportType::default(),
            backend: BackendSettings::default(),
            analytics: AnalyticsConfig::default(),
            results: ResultSettings::default(),
            static_facets: Vec::new(),
            dynamic_facets: Vec::new(),
        }
    }
}

impl Preferences {
    /// Parse and normalize a preferences document from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, FacetError> {
        let raw: RawPreferences = serde_json::from_str(raw)
            .map_err(|e| ConfigError::InvalidPreferences(e.to_string()))?;
        Ok(Self::normalize(raw)?)
    }

    /// Parse and normalize an already-decoded preferences document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, FacetError> {
        let raw: RawPreferences = serde_json::from_value(value)
            .map_err(|e| ConfigError::InvalidPreferences(e.to_string()))?;
        Ok(Self::normalize(raw)?)
    }

    fn normalize(raw: RawPreferences) -> Result<Self, ConfigError> {
        let facet_settings = raw.facet_settings.unwrap_or_default();
        let static_facets = normalize_static_facets(facet_settings.static_facets.unwrap_or_default())?;

        let dynamic_entries = facet_settings.dynamic_facets.unwrap_or_default();
        if dynamic_entries.len() > MAX_FACETS {
            return Err(ConfigError::LimitExceeded {
                what: format!("dynamicFacets count {}", dynamic_entries.len()),
                max: MAX_FACETS,
            });
        }
        let dynamic_facets = dynamic_entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| normalize_dynamic(entry, index))
            .collect::<Result<Vec<_>, _>>()?;

        let appbase = raw.appbase_settings.unwrap_or_default();
        let preferences = Self {
            theme_type: raw
                .theme_settings
                .and_then(|t| t.kind)
                .map(|kind| ThemeType::parse(&kind))
                .unwrap_or_default(),
            currency: non_empty(raw.global_settings.and_then(|g| g.currency))
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            export_type: raw
                .export_settings
                .and_then(|e| e.kind)
                .map(|kind| ExportType::parse(&kind))
                .unwrap_or_default(),
            backend: BackendSettings {
                index: non_empty(appbase.index),
                url: non_empty(appbase.url),
            },
            analytics: AnalyticsConfig::new(appbase.user_id),
            results: ResultSettings::from_raw(raw.result_settings.unwrap_or_default()),
            static_facets,
            dynamic_facets,
        };

        tracing::debug!(
            static_facets = preferences.static_facets.len(),
            dynamic_facets = preferences.dynamic_facets.len(),
            theme = ?preferences.theme_type,
            "preferences normalized"
        );
        Ok(preferences)
    }

    /// All facets in render order: static facets first, then dynamic ones.
    pub fn facets(&self) -> impl Iterator<Item = &FacetConfig> {
        self.static_facets.iter().chain(self.dynamic_facets.iter())
    }

    /// Component ids of every facet, in render order.
    #[must_use]
    pub fn component_ids(&self) -> Vec<String> {
        self.facets().map(|f| f.component_id.clone()).collect()
    }

    /// Find a facet by component id.
    #[must_use]
    pub fn find_facet(&self, component_id: &str) -> Option<&FacetConfig> {
        self.facets().find(|f| f.component_id == component_id)
    }
}

/// Components a facet reacts to: the search box and every other facet.
#[must_use]
pub fn react_dependencies(preferences: &Preferences, component_id: &str) -> Vec<String> {
    dependencies_among(
        preferences.facets().map(|f| f.component_id.as_str()),
        component_id,
    )
}

pub(crate) fn dependencies_among<'p>(
    peers: impl Iterator<Item = &'p str>,
    component_id: &str,
) -> Vec<String> {
    std::iter::once(SEARCH_COMPONENT_ID)
        .chain(peers.filter(|id| *id != component_id))
        .map(str::to_string)
        .collect()
}

/// Normalize a single dynamic facet entry (`{rsConfig, customMessages}`).
pub fn parse_facet_entry(value: serde_json::Value) -> Result<FacetConfig, FacetError> {
    let entry: RawFacetEntry = serde_json::from_value(value)
        .map_err(|e| ConfigError::InvalidPreferences(e.to_string()))?;
    Ok(normalize_dynamic(entry, 0)?)
}

// =============================================================================
// FACET NORMALIZATION
// =============================================================================

fn normalize_static_facets(entries: Vec<RawFacetEntry>) -> Result<Vec<FacetConfig>, ConfigError> {
    let mut found: Vec<(StaticFacet, RawFacetEntry)> = Vec::new();
    for entry in entries {
        let Some(name) = entry.name.clone() else {
            tracing::warn!("static facet without a name ignored");
            continue;
        };
        match StaticFacet::from_name(&name) {
            Some(facet) if found.iter().any(|(seen, _)| *seen == facet) => {
                tracing::warn!(facet = %name, "duplicate static facet ignored");
            }
            Some(facet) => found.push((facet, entry)),
            None => tracing::warn!(facet = %name, "unknown static facet ignored"),
        }
    }
    found.sort_by_key(|(facet, _)| *facet);

    found
        .into_iter()
        .map(|(facet, entry)| normalize_static(facet, entry))
        .collect()
}

fn normalize_static(facet: StaticFacet, entry: RawFacetEntry) -> Result<FacetConfig, ConfigError> {
    let defaults = facet.defaults();
    let rs = entry.rs_config.unwrap_or_default();
    let messages = entry.custom_messages.unwrap_or_default();

    let component_id =
        non_empty(rs.component_id.clone()).unwrap_or_else(|| defaults.component_id.to_string());
    let data_field =
        non_empty(rs.data_field.clone()).unwrap_or_else(|| defaults.data_field.to_string());
    let title = non_empty(rs.title.clone()).unwrap_or_else(|| defaults.title.to_string());
    let custom_messages = CustomMessages {
        loading: non_empty(messages.loading).or(defaults.loading.map(str::to_string)),
        no_results: non_empty(messages.no_results).or(defaults.no_results.map(str::to_string)),
    };

    build_config(
        FacetKind::Static(facet),
        component_id,
        data_field,
        Some(title),
        rs,
        custom_messages,
    )
}

fn normalize_dynamic(entry: RawFacetEntry, index: usize) -> Result<FacetConfig, ConfigError> {
    let rs = entry.rs_config.unwrap_or_default();
    let messages = entry.custom_messages.unwrap_or_default();

    let component_id =
        non_empty(rs.component_id.clone()).ok_or_else(|| ConfigError::MissingField {
            facet: format!("dynamicFacets[{}]", index),
            field: "componentId",
        })?;
    let data_field = non_empty(rs.data_field.clone()).ok_or_else(|| ConfigError::MissingField {
        facet: component_id.clone(),
        field: "dataField",
    })?;
    let title = non_empty(rs.title.clone());
    let custom_messages = CustomMessages {
        loading: Some(
            non_empty(messages.loading).unwrap_or_else(|| DYNAMIC_LOADING_MESSAGE.to_string()),
        ),
        no_results: Some(
            non_empty(messages.no_results)
                .unwrap_or_else(|| DYNAMIC_NO_RESULTS_MESSAGE.to_string()),
        ),
    };

    build_config(
        FacetKind::Dynamic,
        component_id,
        data_field,
        title,
        rs,
        custom_messages,
    )
}

fn build_config(
    kind: FacetKind,
    component_id: String,
    data_field: String,
    title: Option<String>,
    rs: RawRsConfig,
    custom_messages: CustomMessages,
) -> Result<FacetConfig, ConfigError> {
    let calendar_interval = non_empty(rs.calendar_interval)
        .map(|name| name.parse::<Granularity>())
        .transpose()
        .inspect_err(|e| tracing::warn!(facet = %component_id, error = %e, "invalid facet"))?;

    let filter_type = match kind {
        // Price only ever renders as a range control.
        FacetKind::Static(StaticFacet::Price) => FilterType::Range,
        _ => rs
            .filter_type
            .as_deref()
            .map(FilterType::parse)
            .unwrap_or_default(),
    };

    let config = FacetConfig {
        kind,
        component_id,
        filter_type,
        data_field,
        start_value: rs.start_value,
        end_value: rs.end_value,
        start_label: non_empty(rs.start_label),
        end_label: non_empty(rs.end_label),
        title,
        filter_label: non_empty(rs.filter_label),
        calendar_interval,
        show_histogram: rs.show_histogram.unwrap_or(false),
        custom_messages,
    };
    config.validate()?;
    Ok(config)
}

// =============================================================================
// TESTS
// =============================================================================
