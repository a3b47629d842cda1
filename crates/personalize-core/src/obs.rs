//! Structured observability hooks for personalization run lifecycle events.
//!
//! This module provides:
//! - A run-scoped tracing span via [`run_span`]
//! - Emission functions for lifecycle events: start, stage completion,
//!   degraded classification, render failure, finish, sink failure
//!
//! Events are emitted at `info!` level, failures at `warn!`. For JSON output,
//! set `PERSONALIZE_LOG_FORMAT=json`.

use tracing::{info, warn};

/// Run-scoped span; every event emitted inside carries the run_id.
///
/// # Example
///
/// ```ignore
/// run_future.instrument(run_span(&run_id)).await
/// ```
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("personalize.run", run_id = %run_id)
}

/// Emit event: run started for a page URL.
pub fn emit_run_started(run_id: &str, url: &str) {
    info!(event = "run.started", run_id = %run_id, url = %url);
}

/// Emit event: one pipeline stage completed.
pub fn emit_stage_completed(run_id: &str, stage: &str, elapsed_ms: f64) {
    info!(
        event = "stage.completed",
        run_id = %run_id,
        stage = %stage,
        elapsed_ms = elapsed_ms,
    );
}

/// Emit event: remote classification abandoned in favour of the keyword rules.
pub fn emit_classification_degraded(reason: &str) {
    warn!(event = "classification.degraded", reason = %reason);
}

/// Emit event: render stage failed; prior content stays in place.
pub fn emit_render_failed(template_id: &str, error: &str) {
    warn!(event = "render.failed", template_id = %template_id, error = %error);
}

/// Emit event: run finished with the applied intent and template.
pub fn emit_run_finished(
    run_id: &str,
    intent: &str,
    template_id: &str,
    total_ms: f64,
    applied: bool,
    digest: &str,
) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        intent = %intent,
        template_id = %template_id,
        total_ms = total_ms,
        success = applied,
        digest = %digest,
    );
}

/// Emit event: decision record could not be digested (warning level).
pub fn emit_digest_failed(run_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "decision.digest_failed", run_id = %run_id, error = %error);
}

/// Emit event: decision record could not be published (warning level).
pub fn emit_publish_failed(run_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "decision.publish_failed", run_id = %run_id, error = %error);
}
