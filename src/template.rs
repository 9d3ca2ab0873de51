//! Manifest templating
//!
//! Templates carry `${NAME}` placeholders (`NAME` matching
//! `[A-Za-z_][A-Za-z0-9_]*`). Rendering replaces each one with its
//! configuration value and copies everything else byte for byte. There is no
//! default syntax and no escaping; a placeholder without a value fails the
//! whole render.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{DeployError, ErrorCode, Result};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed manifest template
#[derive(Debug, Clone)]
pub struct ManifestTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl ManifestTemplate {
    pub fn parse(name: impl Into<String>, source: &str) -> Self {
        let mut segments = Vec::new();
        let mut last_end = 0;

        for cap in PLACEHOLDER.captures_iter(source) {
            let Some(whole) = cap.get(0) else { continue };
            if whole.start() > last_end {
                segments.push(Segment::Literal(source[last_end..whole.start()].to_string()));
            }
            segments.push(Segment::Placeholder(cap[1].to_string()));
            last_end = whole.end();
        }

        if last_end < source.len() {
            segments.push(Segment::Literal(source[last_end..].to_string()));
        }

        Self {
            name: name.into(),
            segments,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            DeployError::template_with_code(
                ErrorCode::TEMPLATE_READ_FAILED,
                format!("Cannot read template {}", path.display()),
            )
            .with_source(e)
        })?;
        Ok(Self::parse(path.display().to_string(), &source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distinct placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every placeholder.
    ///
    /// Fails without producing output if any placeholder has no value; the
    /// error lists all of them, not just the first.
    pub fn render(&self, values: &BTreeMap<String, String>) -> Result<String> {
        let missing: Vec<String> = self
            .placeholders()
            .into_iter()
            .filter(|name| !values.contains_key(*name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(DeployError::template_unresolved(&self.name, missing));
        }

        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    if let Some(value) = values.get(name) {
                        rendered.push_str(value);
                    }
                }
            }
        }
        Ok(rendered)
    }
}

/// Check that `document` parses as a YAML stream with at least one
/// non-empty document. Returns the number of documents.
pub fn check_yaml(name: &str, document: &str) -> Result<usize> {
    let mut count = 0;
    for doc in serde_yaml::Deserializer::from_str(document) {
        let value = serde_yaml::Value::deserialize(doc).map_err(|e| {
            DeployError::apply(
                ErrorCode::APPLY_MALFORMED_MANIFEST,
                "Rendered manifest is not valid YAML",
                name,
            )
            .with_source(e)
        })?;
        if !value.is_null() {
            count += 1;
        }
    }

    if count == 0 {
        return Err(DeployError::apply(
            ErrorCode::APPLY_MALFORMED_MANIFEST,
            "Rendered manifest contains no documents",
            name,
        ));
    }
    Ok(count)
}
