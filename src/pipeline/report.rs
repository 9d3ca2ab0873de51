//! Machine-readable run report written with `--report`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::stage::StageId;
use crate::error::{describe_error_code, DeployError, ErrorCode, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed,
    /// Planned but never started because an earlier stage failed
    NotRun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageId,
    pub status: StageStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportError {
    pub code: u16,
    pub exit_code: i32,
    /// Meaning of `code`
    pub description: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub success: bool,
    pub stages: Vec<StageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportError>,
}

impl PipelineReport {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            success: false,
            stages: Vec::new(),
            error: None,
        }
    }

    pub fn record_success(
        &mut self,
        stage: StageId,
        started_at: DateTime<Utc>,
        duration: Duration,
        warnings: Vec<String>,
        notes: Vec<String>,
    ) {
        self.stages.push(StageRecord {
            stage,
            status: StageStatus::Succeeded,
            started_at: Some(started_at),
            duration_ms: duration.as_millis() as u64,
            warnings,
            notes,
            error: None,
        });
    }

    pub fn record_failure(
        &mut self,
        stage: StageId,
        started_at: DateTime<Utc>,
        duration: Duration,
        error: String,
    ) {
        self.stages.push(StageRecord {
            stage,
            status: StageStatus::Failed,
            started_at: Some(started_at),
            duration_ms: duration.as_millis() as u64,
            warnings: Vec::new(),
            notes: Vec::new(),
            error: Some(error),
        });
    }

    pub fn record_not_run(&mut self, stage: StageId) {
        self.stages.push(StageRecord {
            stage,
            status: StageStatus::NotRun,
            started_at: None,
            duration_ms: 0,
            warnings: Vec::new(),
            notes: Vec::new(),
            error: None,
        });
    }

    /// Close the report. `error` must already be masked.
    pub fn finish(&mut self, error: Option<&DeployError>) {
        self.finished_at = Some(Utc::now());
        self.success = error.is_none();
        self.error = error.map(|err| ReportError {
            code: err.code(),
            exit_code: err.exit_code(),
            description: describe_error_code(err.code()).to_string(),
            message: err.to_string(),
            remediation: err.remediation().map(str::to_string),
        });
    }

    pub fn status_of(&self, stage: StageId) -> Option<StageStatus> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.status)
    }

    pub fn executed(&self) -> Vec<StageId> {
        self.stages
            .iter()
            .filter(|r| r.status != StageStatus::NotRun)
            .map(|r| r.stage)
            .collect()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let report_error = |message: String| {
            DeployError::pipeline(ErrorCode::PIPELINE_REPORT_WRITE, message, None)
        };

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| report_error("Cannot serialize run report".to_string()).with_source(e))?;
        std::fs::write(path, json).map_err(|e| {
            report_error(format!("Cannot write run report to {}", path.display())).with_source(e)
        })?;
        tracing::debug!("Run report written to {}", path.display());
        Ok(())
    }
}
