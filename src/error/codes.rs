/// Error code registry for boa-deploy
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Prerequisite errors
/// - 3000-3999: Provisioning errors
/// - 4000-4999: Execution errors
/// - 5000-5999: Build/publish errors
/// - 6000-6999: Templating errors
/// - 7000-7999: Apply errors
/// - 8000-8999: Readiness errors
/// - 9000-9999: Pipeline and usage errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_MISSING_REQUIRED: u16 = 1001;
    pub const CONFIG_PLACEHOLDER_VALUE: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;
    pub const CONFIG_ENV_FILE: u16 = 1004;
    pub const CONFIG_SETTINGS_FILE: u16 = 1005;

    // Prerequisite errors (2000-2999)
    pub const PREREQ_GENERIC: u16 = 2000;
    pub const PREREQ_TOOL_MISSING: u16 = 2001;
    pub const PREREQ_NOT_AUTHENTICATED: u16 = 2002;

    // Provisioning errors (3000-3999)
    pub const PROVISION_GENERIC: u16 = 3000;
    pub const PROVISION_PROJECT_CONTEXT: u16 = 3001;
    pub const PROVISION_API_ENABLE: u16 = 3002;
    pub const PROVISION_REPOSITORY: u16 = 3003;
    pub const PROVISION_CLUSTER_CREATE: u16 = 3004;
    pub const PROVISION_CLUSTER_UNHEALTHY: u16 = 3005;
    pub const PROVISION_CREDENTIALS: u16 = 3006;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_TIMEOUT: u16 = 4002;
    pub const EXEC_SUBPROCESS_FAILED: u16 = 4003;
    pub const EXEC_SIGNAL_RECEIVED: u16 = 4004;
    pub const EXEC_SPAWN_FAILED: u16 = 4005;
    pub const EXEC_OUTPUT_ERROR: u16 = 4006;

    // Build/publish errors (5000-5999)
    pub const BUILD_GENERIC: u16 = 5000;
    pub const BUILD_REGISTRY_AUTH: u16 = 5001;
    pub const BUILD_IMAGE_FAILED: u16 = 5002;
    pub const BUILD_PUSH_FAILED: u16 = 5003;

    // Templating errors (6000-6999)
    pub const TEMPLATE_GENERIC: u16 = 6000;
    pub const TEMPLATE_UNRESOLVED: u16 = 6001;
    pub const TEMPLATE_READ_FAILED: u16 = 6002;

    // Apply errors (7000-7999)
    pub const APPLY_GENERIC: u16 = 7000;
    pub const APPLY_MALFORMED_MANIFEST: u16 = 7001;
    pub const APPLY_REJECTED: u16 = 7002;
    pub const APPLY_NAMESPACE: u16 = 7003;

    // Readiness errors (8000-8999)
    pub const READINESS_GENERIC: u16 = 8000;
    pub const READINESS_TIMEOUT: u16 = 8001;
    pub const READINESS_PROBE_FAILED: u16 = 8002;
    pub const READINESS_BAD_STATUS: u16 = 8003;

    // Pipeline and usage errors (9000-9999)
    pub const PIPELINE_GENERIC: u16 = 9000;
    pub const PIPELINE_DEPENDENCY_NOT_MET: u16 = 9001;
    pub const PIPELINE_MISSING_CONFIGURATION: u16 = 9002;
    pub const PIPELINE_REPORT_WRITE: u16 = 9003;
    pub const USAGE_UNKNOWN_COMMAND: u16 = 9100;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Required configuration value is missing",
        1002 => "Configuration value is still a placeholder",
        1003 => "Invalid configuration value",
        1004 => "Environment file could not be read",
        1005 => "Settings file could not be read or parsed",

        2000 => "Generic prerequisite error",
        2001 => "Required tool is not installed",
        2002 => "No active cloud identity",

        3000 => "Generic provisioning error",
        3001 => "Failed to set active project",
        3002 => "Failed to enable cloud APIs",
        3003 => "Failed to create artifact repository",
        3004 => "Failed to create cluster",
        3005 => "Cluster exists but is not healthy",
        3006 => "Failed to fetch cluster credentials",

        4000 => "Generic execution error",
        4001 => "Command not found",
        4002 => "Command execution timeout",
        4003 => "Subprocess failed",
        4004 => "Command received signal",
        4005 => "Failed to spawn subprocess",
        4006 => "Command output error",

        5000 => "Generic build error",
        5001 => "Failed to configure registry credentials",
        5002 => "Container image build failed",
        5003 => "Container image push failed",

        6000 => "Generic templating error",
        6001 => "Unresolved template placeholder",
        6002 => "Template file could not be read",

        7000 => "Generic apply error",
        7001 => "Manifest is not well-formed",
        7002 => "Cluster rejected manifest",
        7003 => "Failed to create namespace",

        8000 => "Generic readiness error",
        8001 => "Workload did not become ready in time",
        8002 => "Readiness probe failed",
        8003 => "Unreadable workload status",

        9000 => "Generic pipeline error",
        9001 => "Stage dependency has not completed",
        9002 => "Configuration required but not validated",
        9003 => "Failed to write run report",
        9100 => "Unknown command",

        _ => "Unknown error code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_ranges() {
        assert!(ErrorCode::CONFIG_GENERIC >= 1000 && ErrorCode::CONFIG_GENERIC < 2000);
        assert!(ErrorCode::PREREQ_GENERIC >= 2000 && ErrorCode::PREREQ_GENERIC < 3000);
        assert!(ErrorCode::PROVISION_GENERIC >= 3000 && ErrorCode::PROVISION_GENERIC < 4000);
        assert!(ErrorCode::EXEC_GENERIC >= 4000 && ErrorCode::EXEC_GENERIC < 5000);
        assert!(ErrorCode::BUILD_GENERIC >= 5000 && ErrorCode::BUILD_GENERIC < 6000);
        assert!(ErrorCode::TEMPLATE_GENERIC >= 6000 && ErrorCode::TEMPLATE_GENERIC < 7000);
        assert!(ErrorCode::APPLY_GENERIC >= 7000 && ErrorCode::APPLY_GENERIC < 8000);
        assert!(ErrorCode::READINESS_GENERIC >= 8000 && ErrorCode::READINESS_GENERIC < 9000);
        assert!(ErrorCode::PIPELINE_GENERIC >= 9000);
    }

    #[test]
    fn test_error_code_descriptions() {
        assert_eq!(
            describe_error_code(1002),
            "Configuration value is still a placeholder"
        );
        assert_eq!(
            describe_error_code(8001),
            "Workload did not become ready in time"
        );
        assert_eq!(describe_error_code(65535), "Unknown error code");
    }
}
