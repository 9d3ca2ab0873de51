//! Readiness waiting
//!
//! After a deploy phase the pipeline polls each declared workload until its
//! predicate holds or its timeout elapses. Conditions are checked one at a
//! time, in declaration order. A probe that errors (the status query itself
//! failing, or a response that cannot be interpreted) ends the wait at once
//! and is never retried.

pub mod probe;

pub use probe::{KubectlProbe, ProbeStatus, ReadinessProbe};

use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{DeployError, ErrorCode, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Longest wait a single condition may declare
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_namespace() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Deployment,
    StatefulSet,
    Service,
}

impl ResourceKind {
    /// Resource name as kubectl expects it
    pub fn as_kubectl(&self) -> &'static str {
        match self {
            ResourceKind::Deployment => "deployment",
            ResourceKind::StatefulSet => "statefulset",
            ResourceKind::Service => "service",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_kubectl())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Predicate {
    /// Replicas available (Deployment) or ready (StatefulSet)
    #[default]
    Available,
    /// LoadBalancer Service has an ingress address
    ExternalIp,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Available => f.write_str("available"),
            Predicate::ExternalIp => f.write_str("external-ip"),
        }
    }
}

/// One workload to wait for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessCondition {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub predicate: Predicate,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl ReadinessCondition {
    pub fn available(kind: ResourceKind, name: &str, namespace: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
            predicate: Predicate::Available,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `kind/name` as shown to the operator
    pub fn workload(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

impl fmt::Display for ReadinessCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} in {} ({}, timeout {})",
            self.kind,
            self.name,
            self.namespace,
            self.predicate,
            humantime::format_duration(self.timeout)
        )
    }
}

/// Terminal result of a wait that did not error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Satisfied {
        attempts: u32,
        elapsed: Duration,
        detail: String,
    },
    TimedOut {
        attempts: u32,
        elapsed: Duration,
        last_status: String,
    },
}

impl ReadinessOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, ReadinessOutcome::Satisfied { .. })
    }
}

/// Polls a `ReadinessProbe` on a fixed interval
pub struct ReadinessWaiter {
    probe: Arc<dyn ReadinessProbe>,
    poll_interval: Duration,
}

impl ReadinessWaiter {
    pub fn new(probe: Arc<dyn ReadinessProbe>, poll_interval: Duration) -> Self {
        Self {
            probe,
            poll_interval,
        }
    }

    /// Poll until satisfied or `condition.timeout` has elapsed.
    ///
    /// The probe runs at least once, so a zero timeout still reports an
    /// already-ready workload as satisfied.
    pub async fn wait_for(&self, condition: &ReadinessCondition) -> Result<ReadinessOutcome> {
        let start = Instant::now();
        let deadline = start + condition.timeout.min(MAX_TIMEOUT);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let status = self.probe.check(condition).await?;
            tracing::debug!(
                "Readiness probe {} attempt {}: {}",
                condition.workload(),
                attempts,
                status.detail
            );

            if status.ready {
                return Ok(ReadinessOutcome::Satisfied {
                    attempts,
                    elapsed: start.elapsed(),
                    detail: status.detail,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(ReadinessOutcome::TimedOut {
                    attempts,
                    elapsed: start.elapsed(),
                    last_status: status.detail,
                });
            }

            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Like `wait_for`, but a timeout becomes a readiness error naming the
    /// workload. Returns the probe's final detail on success.
    pub async fn require(&self, condition: &ReadinessCondition) -> Result<String> {
        match self.wait_for(condition).await? {
            ReadinessOutcome::Satisfied { detail, .. } => Ok(detail),
            ReadinessOutcome::TimedOut {
                attempts,
                last_status,
                ..
            } => Err(DeployError::readiness(
                ErrorCode::READINESS_TIMEOUT,
                format!(
                    "not {} after {} ({} checks, last status: {})",
                    condition.predicate,
                    humantime::format_duration(condition.timeout),
                    attempts,
                    last_status
                ),
                condition.workload(),
            )
            .with_remediation(format!(
                "kubectl describe {} {} -n {}",
                condition.kind, condition.name, condition.namespace
            ))),
        }
    }
}
