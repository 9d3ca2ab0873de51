use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::{Predicate, ReadinessCondition, ResourceKind};
use crate::error::{DeployError, ErrorCode, Result};
use crate::subprocess::KubectlRunner;

/// One observation of a workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStatus {
    pub ready: bool,
    /// Short human-readable status, e.g. `2/3 available`
    pub detail: String,
}

impl ProbeStatus {
    fn ready(detail: impl Into<String>) -> Self {
        Self {
            ready: true,
            detail: detail.into(),
        }
    }

    fn pending(detail: impl Into<String>) -> Self {
        Self {
            ready: false,
            detail: detail.into(),
        }
    }
}

/// Queries the live status of a workload once
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn check(&self, condition: &ReadinessCondition) -> Result<ProbeStatus>;
}

/// Probe backed by `kubectl get -o json`
pub struct KubectlProbe {
    kubectl: Arc<dyn KubectlRunner>,
    probe_timeout: Duration,
}

impl KubectlProbe {
    pub fn new(kubectl: Arc<dyn KubectlRunner>, probe_timeout: Duration) -> Self {
        Self {
            kubectl,
            probe_timeout,
        }
    }
}

#[async_trait]
impl ReadinessProbe for KubectlProbe {
    async fn check(&self, condition: &ReadinessCondition) -> Result<ProbeStatus> {
        let raw = self
            .kubectl
            .get_json(
                condition.kind.as_kubectl(),
                &condition.name,
                &condition.namespace,
                self.probe_timeout,
            )
            .await
            .map_err(|e| {
                DeployError::readiness(
                    ErrorCode::READINESS_PROBE_FAILED,
                    format!("status query failed: {}", e),
                    condition.workload(),
                )
            })?;

        let object: Value = serde_json::from_str(&raw).map_err(|e| {
            DeployError::readiness(
                ErrorCode::READINESS_BAD_STATUS,
                format!("unreadable status: {}", e),
                condition.workload(),
            )
        })?;

        evaluate(condition.kind, condition.predicate, &object).map_err(|message| {
            DeployError::readiness(ErrorCode::READINESS_BAD_STATUS, message, condition.workload())
        })
    }
}

/// Decide readiness from a kubectl JSON object
pub fn evaluate(
    kind: ResourceKind,
    predicate: Predicate,
    object: &Value,
) -> std::result::Result<ProbeStatus, String> {
    match (kind, predicate) {
        (ResourceKind::Deployment, Predicate::Available) => Ok(deployment_available(object)),
        (ResourceKind::StatefulSet, Predicate::Available) => Ok(statefulset_ready(object)),
        (ResourceKind::Service, Predicate::ExternalIp) => Ok(service_external_address(object)),
        // A Service has no replicas; existing is all "available" can mean
        (ResourceKind::Service, Predicate::Available) => Ok(ProbeStatus::ready("service exists")),
        (kind, Predicate::ExternalIp) => Err(format!(
            "predicate external-ip only applies to services, not {}",
            kind
        )),
    }
}

fn int_at(object: &Value, pointer: &str) -> Option<i64> {
    object.pointer(pointer).and_then(Value::as_i64)
}

fn deployment_available(object: &Value) -> ProbeStatus {
    let desired = int_at(object, "/spec/replicas").unwrap_or(1);
    let available = int_at(object, "/status/availableReplicas").unwrap_or(0);
    let generation = int_at(object, "/metadata/generation").unwrap_or(0);
    let observed = int_at(object, "/status/observedGeneration").unwrap_or(0);

    let detail = format!("{}/{} available", available, desired);
    if observed < generation {
        ProbeStatus::pending(format!("{}, rollout not yet observed", detail))
    } else if available >= desired {
        ProbeStatus::ready(detail)
    } else {
        ProbeStatus::pending(detail)
    }
}

fn statefulset_ready(object: &Value) -> ProbeStatus {
    let desired = int_at(object, "/spec/replicas").unwrap_or(1);
    let ready = int_at(object, "/status/readyReplicas").unwrap_or(0);

    let detail = format!("{}/{} ready", ready, desired);
    if ready >= desired {
        ProbeStatus::ready(detail)
    } else {
        ProbeStatus::pending(detail)
    }
}

fn service_external_address(object: &Value) -> ProbeStatus {
    let address = object
        .pointer("/status/loadBalancer/ingress")
        .and_then(Value::as_array)
        .and_then(|ingress| {
            ingress.iter().find_map(|entry| {
                entry
                    .get("ip")
                    .or_else(|| entry.get("hostname"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
            })
        });

    match address {
        Some(address) => ProbeStatus::ready(address),
        None => ProbeStatus::pending("external address pending"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::{KubectlRunnerImpl, MockProcessRunner};
    use serde_json::json;

    #[test]
    fn test_deployment_available() {
        let object = json!({
            "metadata": {"generation": 2},
            "spec": {"replicas": 2},
            "status": {"availableReplicas": 2, "observedGeneration": 2}
        });
        let status = evaluate(ResourceKind::Deployment, Predicate::Available, &object).unwrap();
        assert_eq!(status, ProbeStatus::ready("2/2 available"));
    }

    #[test]
    fn test_deployment_partially_available() {
        let object = json!({
            "spec": {"replicas": 3},
            "status": {"availableReplicas": 1}
        });
        let status = evaluate(ResourceKind::Deployment, Predicate::Available, &object).unwrap();
        assert!(!status.ready);
        assert_eq!(status.detail, "1/3 available");
    }

    #[test]
    fn test_deployment_stale_generation_not_ready() {
        let object = json!({
            "metadata": {"generation": 3},
            "spec": {"replicas": 1},
            "status": {"availableReplicas": 1, "observedGeneration": 2}
        });
        let status = evaluate(ResourceKind::Deployment, Predicate::Available, &object).unwrap();
        assert!(!status.ready);
    }

    #[test]
    fn test_deployment_without_status() {
        let object = json!({"spec": {}});
        let status = evaluate(ResourceKind::Deployment, Predicate::Available, &object).unwrap();
        assert_eq!(status, ProbeStatus::pending("0/1 available"));
    }

    #[test]
    fn test_statefulset_ready() {
        let ready = json!({"spec": {"replicas": 1}, "status": {"readyReplicas": 1}});
        let pending = json!({"spec": {"replicas": 1}, "status": {"replicas": 1}});

        assert!(evaluate(ResourceKind::StatefulSet, Predicate::Available, &ready)
            .unwrap()
            .ready);
        assert!(!evaluate(ResourceKind::StatefulSet, Predicate::Available, &pending)
            .unwrap()
            .ready);
    }

    #[test]
    fn test_service_external_ip() {
        let with_ip = json!({"status": {"loadBalancer": {"ingress": [{"ip": "34.1.2.3"}]}}});
        let with_host = json!({"status": {"loadBalancer": {"ingress": [{"hostname": "lb.example.com"}]}}});
        let pending = json!({"status": {"loadBalancer": {}}});

        assert_eq!(
            evaluate(ResourceKind::Service, Predicate::ExternalIp, &with_ip).unwrap(),
            ProbeStatus::ready("34.1.2.3")
        );
        assert_eq!(
            evaluate(ResourceKind::Service, Predicate::ExternalIp, &with_host)
                .unwrap()
                .detail,
            "lb.example.com"
        );
        assert!(!evaluate(ResourceKind::Service, Predicate::ExternalIp, &pending)
            .unwrap()
            .ready);
    }

    #[test]
    fn test_external_ip_on_deployment_rejected() {
        let result = evaluate(ResourceKind::Deployment, Predicate::ExternalIp, &json!({}));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_kubectl_probe_reads_json() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("kubectl")
            .with_args(|args| args[..3] == ["get", "statefulset", "ledger-db"])
            .returns_stdout(r#"{"spec":{"replicas":1},"status":{"readyReplicas":1}}"#)
            .finish();

        let probe = KubectlProbe::new(
            Arc::new(KubectlRunnerImpl::new(Arc::new(mock.clone()))),
            Duration::from_secs(30),
        );
        let condition =
            ReadinessCondition::available(ResourceKind::StatefulSet, "ledger-db", "default");

        let status = probe.check(&condition).await.unwrap();
        assert!(status.ready);
        assert_eq!(
            mock.get_call_history()[0].timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[tokio::test]
    async fn test_kubectl_probe_failure_is_probe_error() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("kubectl")
            .returns_exit_code(1)
            .returns_stderr("The connection to the server was refused")
            .finish();

        let probe = KubectlProbe::new(
            Arc::new(KubectlRunnerImpl::new(Arc::new(mock))),
            Duration::from_secs(30),
        );
        let condition =
            ReadinessCondition::available(ResourceKind::Deployment, "frontend", "default");

        let err = probe.check(&condition).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::READINESS_PROBE_FAILED);
        assert!(err.to_string().contains("connection to the server was refused"));
    }

    #[tokio::test]
    async fn test_kubectl_probe_garbage_output() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("kubectl").returns_stdout("not json").finish();

        let probe = KubectlProbe::new(
            Arc::new(KubectlRunnerImpl::new(Arc::new(mock))),
            Duration::from_secs(30),
        );
        let condition =
            ReadinessCondition::available(ResourceKind::Deployment, "frontend", "default");

        let err = probe.check(&condition).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::READINESS_BAD_STATUS);
    }
}
