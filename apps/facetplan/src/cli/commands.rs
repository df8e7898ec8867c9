//! # CLI Command Implementations

use crate::api::{self, AppState};
use crate::config::{FileConfig, ServerSettings};
use facetplan_core::{
    ConfigError, FacetControl, FacetError, FacetPlan, MarkupSanitizer, Preferences, WidgetPlan,
    bucket_count, estimate_granularity_for, parse_facet_entry, plan_preferences, resolve_mode,
};
use std::path::{Path, PathBuf};

// =============================================================================
// OUTPUT SETTINGS
// =============================================================================

/// How commands report their results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json_mode: bool,
    pub quiet: bool,
}

impl Output {
    fn print_json(self, value: &impl serde::Serialize) -> Result<(), FacetError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| FacetError::SerializationError(e.to_string()))?;
        println!("{}", text);
        Ok(())
    }
}

// =============================================================================
// FILE INPUT
// =============================================================================

/// Maximum size of a preferences or facet file (10 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_INPUT_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate a file path: canonicalize it and ensure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, FacetError> {
    let canonical = path.canonicalize().map_err(|e| {
        FacetError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(FacetError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), FacetError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| FacetError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(FacetError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Read a JSON input file after path and size checks.
pub fn read_input(path: &Path) -> Result<String, FacetError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_INPUT_FILE_SIZE)?;
    std::fs::read_to_string(&path)
        .map_err(|e| FacetError::IoError(format!("Cannot read '{}': {}", path.display(), e)))
}

/// Read and normalize a preferences document.
pub fn load_preferences(path: &Path) -> Result<Preferences, FacetError> {
    let raw = read_input(path)?;
    Preferences::from_json(&raw)
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Plan every facet of a preferences document.
pub fn cmd_plan(file: &Path, output: Output) -> Result<(), FacetError> {
    let prefs = load_preferences(file)?;
    let sanitizer = MarkupSanitizer::new();
    let plan = plan_preferences(&prefs, &sanitizer)?;

    if output.json_mode {
        return output.print_json(&plan);
    }

    print_widget_plan(&plan);
    Ok(())
}

fn print_widget_plan(plan: &WidgetPlan) {
    println!("Widget Plan");
    println!("===========");
    println!("Theme:    {:?}", plan.theme_type);
    println!("Currency: {}", plan.currency);
    println!("Layout:   {:?}", plan.results.layout);
    println!();
    println!("Facets ({}):", plan.facets.len());
    for facet in &plan.facets {
        println!("  {}", describe_facet(facet));
    }

    if !plan.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &plan.warnings {
            println!("  [{}] {}", warning.component_id, warning.message);
        }
    }
}

fn describe_facet(plan: &FacetPlan) -> String {
    let detail = match &plan.control {
        FacetControl::MultiList { data_field, .. } => format!("list on {}", data_field),
        FacetControl::RangeInput {
            data_field, range, ..
        } => format!("range [{}, {}] on {}", range.start, range.end, data_field),
        FacetControl::DynamicRangeSlider { data_field, .. } => {
            format!("slider on {}", data_field)
        }
    };

    match plan.control.date() {
        Some(date) => format!(
            "{:<20} {:<14} {} by {}",
            plan.component_id, plan.mode, detail, date.calendar_interval
        ),
        None => format!("{:<20} {:<14} {}", plan.component_id, plan.mode, detail),
    }
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Resolve the rendering mode of one facet entry.
pub fn cmd_resolve(file: &Path, output: Output) -> Result<(), FacetError> {
    let raw = read_input(file)?;
    let entry: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| ConfigError::InvalidPreferences(e.to_string()))?;
    let facet = parse_facet_entry(entry)?;
    let mode = resolve_mode(&facet);

    if output.json_mode {
        return output.print_json(&serde_json::json!({
            "componentId": facet.component_id,
            "mode": mode,
        }));
    }

    println!("{}: {}", facet.component_id, mode);
    Ok(())
}

// =============================================================================
// GRANULARITY COMMAND
// =============================================================================

/// Run the bucket-size estimator.
pub fn cmd_granularity(
    range_ms: u64,
    interval: Option<&str>,
    output: Output,
) -> Result<(), FacetError> {
    let estimate = estimate_granularity_for(range_ms, interval)?;
    let buckets = bucket_count(range_ms, estimate.granularity);

    if output.json_mode {
        return output.print_json(&serde_json::json!({
            "totalRangeMs": range_ms,
            "granularity": estimate.granularity,
            "bucketCount": buckets,
            "warning": estimate.warning,
        }));
    }

    println!("Calendar interval: {}", estimate.granularity);
    println!("Buckets:           {}", buckets);
    if let Some(warning) = estimate.warning.as_deref().filter(|_| !output.quiet) {
        println!("Note:              {}", warning);
    }
    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Normalize a preferences document and report the result.
pub fn cmd_validate(file: &Path, output: Output) -> Result<(), FacetError> {
    let prefs = load_preferences(file)?;

    if output.json_mode {
        return output.print_json(&serde_json::json!({
            "valid": true,
            "staticFacets": prefs.static_facets.len(),
            "dynamicFacets": prefs.dynamic_facets.len(),
            "componentIds": prefs.component_ids(),
        }));
    }

    if !output.quiet {
        println!(
            "Valid: {} static facet(s), {} dynamic facet(s)",
            prefs.static_facets.len(),
            prefs.dynamic_facets.len()
        );
    }
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    host: Option<String>,
    port: Option<u16>,
    file: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Output,
) -> Result<(), FacetError> {
    let file_config = FileConfig::discover(config.as_deref())?;
    let settings = ServerSettings::resolve(file_config, host, port, file);

    let mut state = AppState::with_default_sanitizer();
    if let Some(path) = &settings.preferences {
        let prefs = load_preferences(path)?;
        tracing::info!(
            path = %path.display(),
            facets = prefs.component_ids().len(),
            "startup preferences loaded"
        );
        state = state.with_preferences(prefs);
    }

    if !output.quiet {
        println!("facetplan server starting...");
        println!();
        println!("Configuration:");
        println!("  Host:        {}", settings.host);
        println!("  Port:        {}", settings.port);
        match &settings.preferences {
            Some(path) => println!("  Preferences: {}", path.display()),
            None => println!("  Preferences: (none)"),
        }
        println!();
        println!("Endpoints:");
        println!("  GET  /health      - Health check");
        println!("  POST /plan        - Plan a preferences document");
        println!("  GET  /plan        - Plan the startup preferences");
        println!("  POST /facet/mode  - Resolve one facet's mode");
        println!("  POST /facet/plan  - Plan one facet");
        println!("  POST /granularity - Run the bucket-size estimator");
        println!();
        println!("Press Ctrl+C to stop");
        println!();
    }

    api::run_server(&settings.addr(), state).await
}

// =============================================================================
// TESTS
// =============================================================================
