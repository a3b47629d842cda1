//! Decision record publication.
//!
//! Publishing is fire-and-forget from the pipeline's point of view: a sink
//! error is logged and never fails the run.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::decision::DecisionRecord;
use crate::domain::error::Result;

/// Receives every completed decision record.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn publish(&self, record: &DecisionRecord) -> Result<()>;
}

/// Keeps the latest record (and a history) in memory.
#[derive(Debug, Default)]
pub struct MemoryDecisionSink {
    records: Mutex<Vec<DecisionRecord>>,
}

impl MemoryDecisionSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently published record.
    pub fn latest(&self) -> Option<DecisionRecord> {
        self.lock().last().cloned()
    }

    pub fn all(&self) -> Vec<DecisionRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DecisionRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DecisionSink for MemoryDecisionSink {
    async fn publish(&self, record: &DecisionRecord) -> Result<()> {
        self.lock().push(record.clone());
        Ok(())
    }
}

/// Writes each record as pretty JSON, replacing the previous one.
#[derive(Debug, Clone)]
pub struct JsonFileDecisionSink {
    path: PathBuf,
}

impl JsonFileDecisionSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DecisionSink for JsonFileDecisionSink {
    async fn publish(&self, record: &DecisionRecord) -> Result<()> {
        write_decision_json(&self.path, record).await
    }
}

/// Write a decision record as pretty JSON.
pub async fn write_decision_json(path: &Path, record: &DecisionRecord) -> Result<()> {
    let content = serde_json::to_string_pretty(record)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// Logs a one-line summary of each record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDecisionSink;

#[async_trait]
impl DecisionSink for TracingDecisionSink {
    async fn publish(&self, record: &DecisionRecord) -> Result<()> {
        tracing::info!(
            event = "decision.published",
            run_id = %record.run_id,
            intent = record.top_intent().unwrap_or("none"),
            method = ?record.semantic.method,
            template_id = %record.selected_template.template_id,
            applied = record.applied,
            total_ms = record.total_time_ms,
            digest = record.digest.as_deref().unwrap_or(""),
            "decision record"
        );
        Ok(())
    }
}
