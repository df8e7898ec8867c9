//! # Core Type Definitions
//!
//! This module contains the typed facet model every other module works on:
//! - Facet configuration (`FacetConfig`, `FilterType`, `FacetValue`)
//! - The fixed storefront facets and their defaults (`StaticFacet`)
//! - Widget-wide enums (`ThemeType`, `ExportType`)
//! - Error types (`ConfigError`, `FacetError`)
//!
//! A `FacetConfig` is an immutable snapshot: it is built once by the
//! preferences normalizer and only read afterwards.

use crate::granularity::Granularity;
use crate::primitives::{MAX_FIELD_LENGTH, MAX_MESSAGE_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// FILTER TYPE
// =============================================================================

/// The configured filter type of a facet.
///
/// Only `List` changes the rendering decision directly; `Date` switches range
/// controls into date mode. Any unrecognized value is kept as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    List,
    Range,
    Date,
    #[default]
    #[serde(other)]
    Other,
}

impl FilterType {
    /// Map a raw `filterType` string. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "list" => Self::List,
            "range" => Self::Range,
            "date" => Self::Date,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn is_date(self) -> bool {
        matches!(self, Self::Date)
    }
}

// =============================================================================
// FACET VALUE
// =============================================================================

/// A range endpoint as written in the preferences document.
///
/// Endpoints arrive either as JSON numbers or as strings (`"10"`,
/// `"2021-01-01"`). The empty string is treated as "not provided".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetValue {
    Number(serde_json::Number),
    Text(String),
}

impl FacetValue {
    /// Whether this endpoint counts as provided.
    ///
    /// Falsy values are absent: the number zero and the empty string. The
    /// string `"0"` is present.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
            Self::Text(text) => !text.is_empty(),
        }
    }

    /// Leading base-10 integer of the value.
    ///
    /// `"10px"` yields 10 and `"12.9"` yields 12. Returns `None` when the
    /// value does not start with a digit (after optional whitespace and sign).
    #[must_use]
    pub fn leading_integer(&self) -> Option<i64> {
        match self {
            Self::Number(number) => number
                .as_i64()
                .or_else(|| parse_leading_integer(&number.to_string())),
            Self::Text(text) => parse_leading_integer(text),
        }
    }

    /// Interpret the value as a point in time, in epoch milliseconds (UTC).
    ///
    /// Accepts epoch milliseconds (number or all-digit string), RFC 3339
    /// timestamps, `YYYY-MM-DD` dates and `YYYY-MM-DDTHH:MM:SS` datetimes.
    #[must_use]
    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            Self::Number(number) => number.as_i64(),
            Self::Text(text) => parse_epoch_millis(text.trim()),
        }
    }
}

impl fmt::Display for FacetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{}", number),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FacetValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FacetValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FacetValue {
    fn from(value: i64) -> Self {
        Self::Number(serde_json::Number::from(value))
    }
}

fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_epoch_millis(raw: &str) -> Option<i64> {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    if raw.is_empty() {
        return None;
    }

    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse().ok();
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.timestamp_millis());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().timestamp_millis());
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|datetime| datetime.and_utc().timestamp_millis())
}

// =============================================================================
// STATIC FACETS
// =============================================================================

/// The fixed storefront facets with dedicated slots in the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StaticFacet {
    ProductType,
    Collection,
    Color,
    Size,
    Price,
}

/// Defaults applied to a static facet when its `rsConfig` leaves a value out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticFacetDefaults {
    pub component_id: &'static str,
    pub data_field: &'static str,
    pub title: &'static str,
    pub loading: Option<&'static str>,
    pub no_results: Option<&'static str>,
    /// Companion component the list rendering always reacts to.
    pub companion: Option<&'static str>,
}

impl StaticFacet {
    /// Panel order of the static facets.
    pub const DISPLAY_ORDER: [StaticFacet; 5] = [
        StaticFacet::ProductType,
        StaticFacet::Collection,
        StaticFacet::Color,
        StaticFacet::Size,
        StaticFacet::Price,
    ];

    /// Look up a static facet by its `name` in `facetSettings.staticFacets`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "productType" => Some(Self::ProductType),
            "collection" => Some(Self::Collection),
            "color" => Some(Self::Color),
            "size" => Some(Self::Size),
            "price" => Some(Self::Price),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ProductType => "productType",
            Self::Collection => "collection",
            Self::Color => "color",
            Self::Size => "size",
            Self::Price => "price",
        }
    }

    /// The single table of static facet defaults.
    #[must_use]
    pub fn defaults(self) -> StaticFacetDefaults {
        match self {
            Self::ProductType => StaticFacetDefaults {
                component_id: "productType",
                data_field: "product_type.keyword",
                title: "Product Type",
                loading: None,
                no_results: None,
                companion: None,
            },
            Self::Collection => StaticFacetDefaults {
                component_id: "collection",
                data_field: "collection",
                title: "Collections",
                loading: Some("Loading collections"),
                no_results: Some("No items Found"),
                companion: Some(crate::primitives::COLLECTION_SCOPE_COMPONENT_ID),
            },
            Self::Color => StaticFacetDefaults {
                component_id: "color",
                data_field: "variants.color",
                title: "Color",
                loading: Some("Loading colors"),
                no_results: Some("Fetching Colors"),
                companion: Some("colorOption"),
            },
            Self::Size => StaticFacetDefaults {
                component_id: "size",
                data_field: "variants.size",
                title: "Size",
                loading: Some("Loading sizes"),
                no_results: Some("No sizes Found"),
                companion: Some("sizeOption"),
            },
            Self::Price => StaticFacetDefaults {
                component_id: "price",
                data_field: "variants.price",
                title: "Price",
                loading: None,
                no_results: None,
                companion: None,
            },
        }
    }

    /// Whether the list rendering reacts to the other facets.
    ///
    /// The collection list is scoped only by its companion query.
    #[must_use]
    pub fn reacts_to_peers(self) -> bool {
        !matches!(self, Self::Collection)
    }
}

/// Where a facet came from in the preferences document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacetKind {
    Static(StaticFacet),
    Dynamic,
}

// =============================================================================
// FACET CONFIG
// =============================================================================

/// Loading / no-results messages. Rich text; sanitized before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMessages {
    pub loading: Option<String>,
    pub no_results: Option<String>,
}

/// Normalized configuration of a single facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetConfig {
    pub kind: FacetKind,
    pub component_id: String,
    pub filter_type: FilterType,
    pub data_field: String,
    pub start_value: Option<FacetValue>,
    pub end_value: Option<FacetValue>,
    pub start_label: Option<String>,
    pub end_label: Option<String>,
    pub title: Option<String>,
    pub filter_label: Option<String>,
    pub calendar_interval: Option<Granularity>,
    pub show_histogram: bool,
    pub custom_messages: CustomMessages,
}

impl FacetConfig {
    /// Create a dynamic facet with no range, labels or messages.
    #[must_use]
    pub fn new(
        component_id: impl Into<String>,
        data_field: impl Into<String>,
        filter_type: FilterType,
    ) -> Self {
        Self {
            kind: FacetKind::Dynamic,
            component_id: component_id.into(),
            filter_type,
            data_field: data_field.into(),
            start_value: None,
            end_value: None,
            start_label: None,
            end_label: None,
            title: None,
            filter_label: None,
            calendar_interval: None,
            show_histogram: false,
            custom_messages: CustomMessages::default(),
        }
    }

    #[must_use]
    pub fn with_range(mut self, start: impl Into<FacetValue>, end: impl Into<FacetValue>) -> Self {
        self.start_value = Some(start.into());
        self.end_value = Some(end.into());
        self
    }

    #[must_use]
    pub fn with_calendar_interval(mut self, interval: Granularity) -> Self {
        self.calendar_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_histogram(mut self, show_histogram: bool) -> Self {
        self.show_histogram = show_histogram;
        self
    }

    /// Both range endpoints, when both are present and non-empty.
    #[must_use]
    pub fn bounded_range(&self) -> Option<(&FacetValue, &FacetValue)> {
        let start = self.start_value.as_ref().filter(|v| v.is_present())?;
        let end = self.end_value.as_ref().filter(|v| v.is_present())?;
        Some((start, end))
    }

    /// Label shown for the active filter: filter label, else title.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.filter_label
            .as_deref()
            .filter(|label| !label.is_empty())
            .or(self.title.as_deref())
            .unwrap_or("")
    }

    /// The facet's name in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.kind {
            FacetKind::Static(facet) => facet.name(),
            FacetKind::Dynamic => &self.component_id,
        }
    }

    /// Check required fields and length limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.component_id.is_empty() {
            return Err(ConfigError::MissingField {
                facet: self.name().to_string(),
                field: "componentId",
            });
        }
        if self.data_field.is_empty() {
            return Err(ConfigError::MissingField {
                facet: self.name().to_string(),
                field: "dataField",
            });
        }

        let short_fields = [
            ("componentId", Some(self.component_id.as_str())),
            ("dataField", Some(self.data_field.as_str())),
            ("startLabel", self.start_label.as_deref()),
            ("endLabel", self.end_label.as_deref()),
            ("title", self.title.as_deref()),
            ("filterLabel", self.filter_label.as_deref()),
        ];
        for (field, value) in short_fields {
            check_length(self.name(), field, value, MAX_FIELD_LENGTH)?;
        }

        check_length(
            self.name(),
            "customMessages.loading",
            self.custom_messages.loading.as_deref(),
            MAX_MESSAGE_LENGTH,
        )?;
        check_length(
            self.name(),
            "customMessages.noResults",
            self.custom_messages.no_results.as_deref(),
            MAX_MESSAGE_LENGTH,
        )
    }
}

fn check_length(
    facet: &str,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ConfigError> {
    match value {
        Some(value) if value.len() > max => Err(ConfigError::LimitExceeded {
            what: format!("{}.{} length {}", facet, field, value.len()),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// WIDGET-WIDE ENUMS
// =============================================================================

/// Visual theme of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    #[default]
    Classic,
    Minimal,
}

impl ThemeType {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "minimal" => Self::Minimal,
            _ => Self::Classic,
        }
    }

    /// Checkboxes, counts and panel arrows are hidden in the minimal theme.
    #[must_use]
    pub fn shows_decorations(self) -> bool {
        !matches!(self, Self::Minimal)
    }
}

/// Storefront platform the catalog was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    #[default]
    Shopify,
    Other,
}

impl ExportType {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "shopify" => Self::Shopify,
            _ => Self::Other,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Configuration errors: the preferences document asks for something the
/// selector cannot honor. Always reported, never silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A calendar interval outside the supported granularities.
    #[error("Invalid calendarInterval '{value}': expected one of {expected}")]
    InvalidCalendarInterval { value: String, expected: String },

    /// A required facet field is absent or empty.
    #[error("Facet '{facet}' is missing required field '{field}'")]
    MissingField { facet: String, field: &'static str },

    /// A numeric range endpoint does not start with an integer.
    #[error("Facet '{facet}' has a non-numeric range value '{value}'")]
    InvalidRangeValue { facet: String, value: String },

    /// A date range endpoint cannot be parsed.
    #[error("Facet '{facet}' has an unparseable date '{value}'")]
    InvalidDate { facet: String, value: String },

    /// The preferences document is malformed.
    #[error("Invalid preferences document: {0}")]
    InvalidPreferences(String),

    /// An input limit was exceeded.
    #[error("{what} exceeds maximum of {max}")]
    LimitExceeded { what: String, max: usize },
}

/// Errors that can occur in facetplan.
///
/// - No silent failures
/// - The core never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum FacetError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl FacetError {
    /// Whether the error was caused by the caller's configuration.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
