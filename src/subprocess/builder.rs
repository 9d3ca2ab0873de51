use std::collections::HashMap;
use std::time::Duration;

use crate::subprocess::ProcessCommand;

/// Fluent construction of an argv-style `ProcessCommand`.
///
/// Arguments stay separate vector entries and are never joined into a
/// shell string, so values with spaces or quotes need no escaping.
pub struct ProcessCommandBuilder {
    command: ProcessCommand,
}

impl ProcessCommandBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            command: ProcessCommand {
                program: program.to_string(),
                args: Vec::new(),
                env: HashMap::new(),
                timeout: None,
                stdin: None,
            },
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command
            .args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Append `--name=value`
    pub fn flag(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.command
            .args
            .push(format!("--{}={}", name, value.as_ref()));
        self
    }

    /// Append `--name=value` only when there is a value
    pub fn flag_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.flag(name, value),
            None => self,
        }
    }

    /// Append the bare `--name` when `enabled`
    pub fn switch(mut self, name: &str, enabled: bool) -> Self {
        if enabled {
            self.command.args.push(format!("--{}", name));
        }
        self
    }

    /// Extra variable on top of the inherited environment
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.command.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.command.timeout = Some(timeout);
        self
    }

    /// Feed `input` to the child's stdin. Rendered manifests go this way so
    /// their contents never show up in argv or logs.
    pub fn stdin(mut self, input: String) -> Self {
        self.command.stdin = Some(input);
        self
    }

    pub fn build(self) -> ProcessCommand {
        self.command
    }
}
