//! Duplicate-resource handling for create operations
//!
//! Creating something that already exists is the normal case on a re-run.
//! Each stage declares whether that is acceptable; the decision is made here
//! from the raw command output so every create call handles it the same way.

use serde::{Deserialize, Serialize};

use crate::subprocess::{ExitStatus, ProcessError, ProcessOutput};

/// Markers cloud and cluster CLIs print when the target already exists
const ALREADY_EXISTS_MARKERS: &[&str] = &["already exists", "ALREADY_EXISTS", "AlreadyExists"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdempotencyPolicy {
    /// The stage issues no create calls; any failure is fatal
    NotApplicable,
    /// A duplicate is a failure like any other
    FailOnDuplicate,
    /// A duplicate counts as success and is reported as a warning
    TreatDuplicateAsSuccess,
}

impl std::fmt::Display for IdempotencyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdempotencyPolicy::NotApplicable => f.write_str("not-applicable"),
            IdempotencyPolicy::FailOnDuplicate => f.write_str("fail-on-duplicate"),
            IdempotencyPolicy::TreatDuplicateAsSuccess => f.write_str("treat-duplicate-as-success"),
        }
    }
}

/// Result of a create call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExisted,
}

pub fn is_already_exists(stderr: &str) -> bool {
    ALREADY_EXISTS_MARKERS.iter().any(|m| stderr.contains(m))
}

impl IdempotencyPolicy {
    /// Whether the stage carrying this policy performs create calls at all
    pub fn creates(&self) -> bool {
        *self != IdempotencyPolicy::NotApplicable
    }

    /// Interpret the output of a create command.
    ///
    /// `command` is only used to label the error.
    pub fn resolve(
        &self,
        command: &str,
        output: ProcessOutput,
    ) -> Result<CreateOutcome, ProcessError> {
        match output.status {
            ExitStatus::Success => Ok(CreateOutcome::Created),
            ExitStatus::Error(_)
                if *self == IdempotencyPolicy::TreatDuplicateAsSuccess
                    && is_already_exists(&output.stderr) =>
            {
                tracing::debug!("{} reported an existing resource", command);
                Ok(CreateOutcome::AlreadyExisted)
            }
            ExitStatus::Error(code) => Err(ProcessError::Failed {
                command: command.to_string(),
                code,
                stderr: output.stderr.trim().to_string(),
            }),
            ExitStatus::Signal(sig) => Err(ProcessError::Signal(sig)),
            ExitStatus::Timeout => Err(ProcessError::Timeout(output.duration)),
        }
    }
}
