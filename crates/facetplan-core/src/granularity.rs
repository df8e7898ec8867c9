//! # Bucket-Size Estimator
//!
//! Calendar intervals for date histograms.
//!
//! A date histogram over a long range with a fine interval produces thousands
//! of unreadable buckets. The estimator treats the requested interval as a
//! floor and walks towards coarser intervals until the bucket count fits in
//! [`MAX_HISTOGRAM_BUCKETS`]. `Year` is the ceiling: it is never coarsened.
//!
//! All comparisons are integer-only: `range / duration <= 100` is evaluated as
//! `range <= 100 * duration`, which is exact.

use crate::primitives::MAX_HISTOGRAM_BUCKETS;
use crate::types::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Warning attached when even `Year` buckets are too narrow.
pub const SHORTER_RANGE_WARNING: &str = "Try using a shorter range of values.";

// =============================================================================
// GRANULARITY
// =============================================================================

/// Histogram bucket width, ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    /// Every granularity in ascending order of duration.
    pub const ALL: [Granularity; 7] = [
        Granularity::Minute,
        Granularity::Hour,
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Year,
    ];

    /// Fixed bucket width in milliseconds.
    ///
    /// Month, quarter and year use the mean Gregorian year (365.2425 days).
    #[must_use]
    pub const fn duration_ms(self) -> u64 {
        match self {
            Granularity::Minute => 60_000,
            Granularity::Hour => 3_600_000,
            Granularity::Day => 86_400_000,
            Granularity::Week => 604_800_000,
            Granularity::Month => 2_629_746_000,
            Granularity::Quarter => 7_889_238_000,
            Granularity::Year => 31_556_952_000,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }

    /// Granularities strictly coarser than `self`, finest first.
    pub fn coarser(self) -> impl Iterator<Item = Granularity> {
        Self::ALL.into_iter().filter(move |candidate| *candidate > self)
    }

    /// `Year` cannot be coarsened any further.
    #[must_use]
    pub fn is_coarsest(self) -> bool {
        matches!(self, Granularity::Year)
    }

    fn expected_names() -> String {
        Self::ALL
            .iter()
            .map(|g| g.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Granularity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| ConfigError::InvalidCalendarInterval {
                value: s.to_string(),
                expected: Self::expected_names(),
            })
    }
}

// =============================================================================
// ESTIMATION
// =============================================================================

/// Result of the estimator: the interval to use and an optional diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GranularityEstimate {
    pub granularity: Granularity,
    pub warning: Option<String>,
}

impl GranularityEstimate {
    /// Estimate with the default `Minute` floor.
    #[must_use]
    pub fn for_range(total_range_ms: u64) -> Self {
        estimate_granularity(total_range_ms, Granularity::Minute)
    }

    fn ceiling() -> Self {
        Self {
            granularity: Granularity::Year,
            warning: Some(SHORTER_RANGE_WARNING.to_string()),
        }
    }
}

/// Number of buckets a histogram over `total_range_ms` has at `granularity`.
///
/// A trailing partial bucket counts as a bucket.
#[must_use]
pub fn bucket_count(total_range_ms: u64, granularity: Granularity) -> u64 {
    total_range_ms.div_ceil(granularity.duration_ms())
}

/// Whether `granularity` spreads `total_range_ms` over more than
/// [`MAX_HISTOGRAM_BUCKETS`] buckets.
#[must_use]
pub fn exceeds_bucket_limit(total_range_ms: u64, granularity: Granularity) -> bool {
    !fits_bucket_limit(total_range_ms, granularity)
}

fn fits_bucket_limit(total_range_ms: u64, granularity: Granularity) -> bool {
    total_range_ms <= MAX_HISTOGRAM_BUCKETS.saturating_mul(granularity.duration_ms())
}

/// Pick the first granularity coarser than `requested` that keeps the
/// histogram within the bucket limit.
///
/// - `requested == Year` is returned unchanged with a "shorter range" warning.
/// - Finer-than-requested intervals are never considered.
/// - When no coarser interval fits, `Year` is returned with the same warning.
#[must_use]
pub fn estimate_granularity(total_range_ms: u64, requested: Granularity) -> GranularityEstimate {
    if requested.is_coarsest() {
        return GranularityEstimate::ceiling();
    }

    match requested
        .coarser()
        .find(|candidate| fits_bucket_limit(total_range_ms, *candidate))
    {
        Some(candidate) => {
            tracing::debug!(
                requested = %requested,
                chosen = %candidate,
                total_range_ms,
                "calendar interval raised"
            );
            GranularityEstimate {
                granularity: candidate,
                warning: Some(format!(
                    "Raise calendarInterval to at least `{}` for a meaningful resolution of the histogram.",
                    candidate
                )),
            }
        }
        None => GranularityEstimate::ceiling(),
    }
}

/// Parse an optional interval name, then estimate.
///
/// `None` uses the `Minute` floor. An unknown name is a
/// [`ConfigError::InvalidCalendarInterval`].
pub fn estimate_granularity_for(
    total_range_ms: u64,
    requested: Option<&str>,
) -> Result<GranularityEstimate, ConfigError> {
    let requested = match requested {
        Some(name) => name.parse::<Granularity>().inspect_err(|e| {
            tracing::warn!(error = %e, "rejected calendar interval");
        })?,
        None => Granularity::Minute,
    };
    Ok(estimate_granularity(total_range_ms, requested))
}

// =============================================================================
// TESTS
// =============================================================================
