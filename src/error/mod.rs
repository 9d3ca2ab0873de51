use std::fmt::Display;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for the deployment pipeline
///
/// Every variant except `Usage` corresponds to one class of fatal pipeline
/// failure. Idempotency conflicts are not errors and never reach this type.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        key: Option<String>,
        remediation: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Prerequisite error: {message}")]
    Prerequisite {
        code: u16,
        message: String,
        remediation: Option<String>,
    },

    #[error("[E{code:04}] Provisioning error: {message}")]
    Provisioning {
        code: u16,
        message: String,
        resource: Option<String>,
        remediation: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Execution error: {message}")]
    Execution {
        code: u16,
        message: String,
        command: Option<String>,
        exit_code: Option<i32>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Build error: {message}")]
    Build {
        code: u16,
        message: String,
        image: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Templating error: {message}")]
    Template {
        code: u16,
        message: String,
        tokens: Vec<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Apply error: {message}")]
    Apply {
        code: u16,
        message: String,
        manifest: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Readiness error: {message}")]
    Readiness {
        code: u16,
        message: String,
        workload: Option<String>,
        remediation: Option<String>,
    },

    #[error("[E{code:04}] Pipeline error: {message}")]
    Pipeline {
        code: u16,
        message: String,
        stage: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Usage error: {message}")]
    Usage { code: u16, message: String },
}

impl DeployError {
    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            key: None,
            remediation: None,
            source: None,
        }
    }

    /// A required key is absent (or blank)
    pub fn config_missing(key: &str) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_MISSING_REQUIRED,
            message: format!("{} is not set", key),
            key: Some(key.to_string()),
            remediation: Some(format!(
                "Set {key} in your .env file or run: export {key}=<value>"
            )),
            source: None,
        }
    }

    /// A key still holds its sample value; the value itself is not echoed
    pub fn config_placeholder(key: &str) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_PLACEHOLDER_VALUE,
            message: format!("{} still has its placeholder value", key),
            key: Some(key.to_string()),
            remediation: Some(format!(
                "Replace the sample value of {key} in your .env file with a real one"
            )),
            source: None,
        }
    }

    pub fn config_invalid(key: &str, message: impl Display) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_INVALID_VALUE,
            message: format!("{}: {}", key, message),
            key: Some(key.to_string()),
            remediation: None,
            source: None,
        }
    }

    pub fn prerequisite(
        code: u16,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self::Prerequisite {
            code,
            message: message.into(),
            remediation: Some(remediation.into()),
        }
    }

    pub fn provisioning(
        code: u16,
        message: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self::Provisioning {
            code,
            message: message.into(),
            resource: Some(resource.into()),
            remediation: None,
            source: None,
        }
    }

    /// Create an execution error with specific code
    pub fn execution_with_code(
        code: u16,
        message: impl Into<String>,
        command: Option<String>,
    ) -> Self {
        Self::Execution {
            code,
            message: message.into(),
            command,
            exit_code: None,
            source: None,
        }
    }

    pub fn build(code: u16, message: impl Into<String>, image: impl Into<String>) -> Self {
        Self::Build {
            code,
            message: message.into(),
            image: Some(image.into()),
            source: None,
        }
    }

    pub fn template_unresolved(template: &str, tokens: Vec<String>) -> Self {
        let listed = tokens
            .iter()
            .map(|t| format!("${{{}}}", t))
            .collect::<Vec<_>>()
            .join(", ");
        Self::Template {
            code: ErrorCode::TEMPLATE_UNRESOLVED,
            message: format!("{} has unresolved placeholders: {}", template, listed),
            tokens,
            source: None,
        }
    }

    pub fn template_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Template {
            code,
            message: message.into(),
            tokens: Vec::new(),
            source: None,
        }
    }

    pub fn apply(code: u16, message: impl Into<String>, manifest: impl Into<String>) -> Self {
        Self::Apply {
            code,
            message: message.into(),
            manifest: Some(manifest.into()),
            source: None,
        }
    }

    pub fn readiness(
        code: u16,
        message: impl Into<String>,
        workload: impl Into<String>,
    ) -> Self {
        Self::Readiness {
            code,
            message: message.into(),
            workload: Some(workload.into()),
            remediation: None,
        }
    }

    pub fn pipeline(code: u16, message: impl Into<String>, stage: Option<String>) -> Self {
        Self::Pipeline {
            code,
            message: message.into(),
            stage,
            source: None,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            code: ErrorCode::USAGE_UNKNOWN_COMMAND,
            message: message.into(),
        }
    }

    /// Add a source error to this error. Variants without a source slot are
    /// returned unchanged.
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Provisioning { source: src, .. }
            | Self::Execution { source: src, .. }
            | Self::Build { source: src, .. }
            | Self::Template { source: src, .. }
            | Self::Apply { source: src, .. }
            | Self::Pipeline { source: src, .. } => {
                *src = Some(source.into());
            }
            Self::Prerequisite { .. } | Self::Readiness { .. } | Self::Usage { .. } => {}
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Prerequisite { message, .. }
            | Self::Provisioning { message, .. }
            | Self::Execution { message, .. }
            | Self::Build { message, .. }
            | Self::Template { message, .. }
            | Self::Apply { message, .. }
            | Self::Readiness { message, .. }
            | Self::Pipeline { message, .. }
            | Self::Usage { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Pass every free-text part of the error through `mask`. A source chain
    /// is flattened into one masked cause.
    pub fn masked(mut self, mask: impl Fn(&str) -> String) -> Self {
        match &mut self {
            Self::Config {
                message,
                remediation,
                source,
                ..
            }
            | Self::Provisioning {
                message,
                remediation,
                source,
                ..
            } => {
                *message = mask(message.as_str());
                mask_opt(remediation, &mask);
                mask_source(source, &mask);
            }
            Self::Execution {
                message,
                command,
                source,
                ..
            } => {
                *message = mask(message.as_str());
                mask_opt(command, &mask);
                mask_source(source, &mask);
            }
            Self::Build {
                message, source, ..
            }
            | Self::Template {
                message, source, ..
            }
            | Self::Apply {
                message, source, ..
            }
            | Self::Pipeline {
                message, source, ..
            } => {
                *message = mask(message.as_str());
                mask_source(source, &mask);
            }
            Self::Prerequisite {
                message,
                remediation,
                ..
            }
            | Self::Readiness {
                message,
                remediation,
                ..
            } => {
                *message = mask(message.as_str());
                mask_opt(remediation, &mask);
            }
            Self::Usage { message, .. } => *message = mask(message.as_str()),
        }
        self
    }

    /// Attach an operator remediation command
    pub fn with_remediation(mut self, command: impl Into<String>) -> Self {
        match &mut self {
            Self::Config { remediation, .. }
            | Self::Prerequisite { remediation, .. }
            | Self::Provisioning { remediation, .. }
            | Self::Readiness { remediation, .. } => {
                *remediation = Some(command.into());
            }
            _ => {}
        }
        self
    }

    /// Set the exit code for an execution error
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        if let Self::Execution {
            exit_code: ref mut ec,
            ..
        } = self
        {
            *ec = Some(exit_code);
        }
        self
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Prerequisite { .. } => 3,
            Self::Provisioning { .. } => 4,
            Self::Execution { .. } => 5,
            Self::Build { .. } => 6,
            Self::Template { .. } => 7,
            Self::Apply { .. } => 8,
            Self::Readiness { .. } => 9,
            Self::Pipeline { .. } => 10,
            Self::Usage { .. } => 64,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Prerequisite { code, .. }
            | Self::Provisioning { code, .. }
            | Self::Execution { code, .. }
            | Self::Build { code, .. }
            | Self::Template { code, .. }
            | Self::Apply { code, .. }
            | Self::Readiness { code, .. }
            | Self::Pipeline { code, .. }
            | Self::Usage { code, .. } => *code,
        }
    }

    /// Remediation command to show the operator, if any
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::Config { remediation, .. }
            | Self::Prerequisite { remediation, .. }
            | Self::Provisioning { remediation, .. }
            | Self::Readiness { remediation, .. } => remediation.as_deref(),
            _ => None,
        }
    }

    /// The configuration key this error is about, if any
    pub fn config_key(&self) -> Option<&str> {
        match self {
            Self::Config { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Prerequisite { message, .. } => format!("Missing prerequisite: {}", message),
            Self::Provisioning {
                message, resource, ..
            } => match resource {
                Some(r) => format!("Provisioning of {} failed: {}", r, message),
                None => format!("Provisioning failed: {}", message),
            },
            Self::Execution {
                message, command, ..
            } => match command {
                Some(cmd) => format!("Command '{}' failed: {}", cmd, message),
                None => format!("Execution error: {}", message),
            },
            Self::Build { message, image, .. } => match image {
                Some(i) => format!("Image {} failed: {}", i, message),
                None => format!("Build failed: {}", message),
            },
            Self::Template { message, .. } => format!("Template error: {}", message),
            Self::Apply {
                message, manifest, ..
            } => match manifest {
                Some(m) => format!("Applying {} failed: {}", m, message),
                None => format!("Apply failed: {}", message),
            },
            Self::Readiness {
                message, workload, ..
            } => match workload {
                Some(w) => format!("Workload {} not ready: {}", w, message),
                None => format!("Readiness check failed: {}", message),
            },
            Self::Pipeline { message, stage, .. } => match stage {
                Some(s) => format!("Stage '{}' cannot run: {}", s, message),
                None => format!("Pipeline error: {}", message),
            },
            Self::Usage { message, .. } => message.clone(),
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        let mut msg = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            msg.push_str(&format!("\n  caused by: {}", cause));
            current = cause.source();
        }
        msg
    }
}

fn mask_opt(text: &mut Option<String>, mask: &impl Fn(&str) -> String) {
    if let Some(text) = text {
        *text = mask(text.as_str());
    }
}

fn mask_source(source: &mut Option<BoxedSource>, mask: &impl Fn(&str) -> String) {
    if let Some(cause) = source.take() {
        let mut chain = cause.to_string();
        let mut current = cause.source();
        while let Some(next) = current {
            chain.push_str(&format!(": {}", next));
            current = next.source();
        }
        *source = Some(mask(&chain).into());
    }
}

/// Type alias for Results using DeployError
pub type Result<T> = std::result::Result<T, DeployError>;
