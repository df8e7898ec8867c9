//! # Sanitizer
//!
//! Loading and no-results messages are merchant-supplied rich text that the
//! host injects into the DOM. They pass through a [`Sanitizer`] first.
//!
//! Contract: remove executable content, preserve safe markup.

use ammonia::Builder;

/// Rich-text sanitizer used by the planner.
///
/// # Extension Point
///
/// Hosts with their own HTML policy can plug it in here. Implementors must be
/// stateless and pure.
pub trait Sanitizer: Send + Sync {
    /// Return `html` with executable content removed.
    fn sanitize(&self, html: &str) -> String;
}

/// Upper bound on cleaning passes over one message.
const MAX_PASSES: usize = 8;

/// Default allow-list sanitizer.
///
/// The message is parsed as an HTML fragment and re-serialized with only
/// allow-listed elements and attributes. Event handlers never survive, and
/// URLs are checked after entity decoding, so `&#106;avascript:` is caught.
/// Cleaning repeats until the output is stable.
pub struct MarkupSanitizer {
    policy: Builder<'static>,
}

impl std::fmt::Debug for MarkupSanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupSanitizer").finish_non_exhaustive()
    }
}

impl MarkupSanitizer {
    #[must_use]
    pub fn new() -> Self {
        let mut policy = Builder::default();
        // Messages are shown inline; links keep the markup the merchant wrote.
        policy.link_rel(None);
        Self { policy }
    }
}

impl Default for MarkupSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer for MarkupSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let mut current = html.to_string();
        for _ in 0..MAX_PASSES {
            let next = self.policy.clean(&current).to_string();
            if next == current {
                return current;
            }
            current = next;
        }
        tracing::warn!("sanitizer did not converge; dropping markup");
        String::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
