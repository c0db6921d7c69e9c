// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Policy document parsing.
//!
//! # Format
//! ```json
//! {
//!   "policy": "CPU_ONLY" | "MAX_PRECISION" | "MIN_LATENCY" | "LOAD_BALANCING" |
//!             "PYTORCH_MODEL_GPU" | "MIN_RES" | "MIN_LATENCY_MIN_RES",
//!   "cpu_fallback_percentage": 0..100,
//!   "serialization": { "dir_path": "...", "model_token": "..." },
//!   "caching": {
//!     "cache_dir": "...", "model_token": "...",
//!     "disallow_nnapi_cpu": false,
//!     "max_number_delegated_partitions": 3,
//!     "accelerator_name": "..."
//!   }
//! }
//! ```
//!
//! All keys are optional and unknown keys are ignored. The document is
//! walked as a [`serde_json::Value`] rather than derived, so a bad field
//! only resets that field.

use crate::{AccelerationMode, AccelerationPolicy, AcceleratorCache, GpuResultCache, PolicyError};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// A problem found while reading a policy document. None of these stop
/// parsing; the affected field keeps its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDiagnostic {
    /// The text is not valid JSON. The whole policy is defaulted.
    MalformedDocument(String),
    /// The document is valid JSON but not an object.
    NotAnObject,
    /// `policy` names no known mode; `CPU_ONLY` is used.
    UnknownMode(String),
    /// A key is present with the wrong JSON type.
    WrongType { key: String, expected: &'static str },
    /// A required field of a nested section is missing, so the section is
    /// left unused.
    MissingField {
        section: &'static str,
        field: &'static str,
    },
}

impl PolicyDiagnostic {
    /// Returns `true` for validation failures that disable a whole section.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}

impl fmt::Display for PolicyDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDocument(detail) => {
                write!(f, "policy document is not valid JSON ({detail}); using defaults")
            }
            Self::NotAnObject => write!(f, "policy document is not a JSON object; using defaults"),
            Self::UnknownMode(name) => {
                write!(f, "unknown policy '{name}'; falling back to CPU_ONLY")
            }
            Self::WrongType { key, expected } => {
                write!(f, "'{key}' should be {expected}; using default")
            }
            Self::MissingField { section, field } => {
                write!(f, "'{section}' requires '{field}'; {section} disabled")
            }
        }
    }
}

/// A parsed policy plus everything that was defaulted along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPolicy {
    pub policy: AccelerationPolicy,
    pub diagnostics: Vec<PolicyDiagnostic>,
}

impl ParsedPolicy {
    /// Returns `true` if nothing was defaulted.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

struct Reader {
    diagnostics: Vec<PolicyDiagnostic>,
}

impl Reader {
    fn report(&mut self, diagnostic: PolicyDiagnostic) {
        if diagnostic.is_validation_error() {
            tracing::error!("{}", diagnostic);
        } else {
            tracing::warn!("{}", diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    fn wrong_type(&mut self, key: &str, expected: &'static str) {
        self.report(PolicyDiagnostic::WrongType {
            key: key.to_string(),
            expected,
        });
    }

    fn section<'a>(&mut self, root: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
        match root.get(key)? {
            Value::Object(map) => Some(map),
            _ => {
                self.wrong_type(key, "an object");
                None
            }
        }
    }

    /// Reads a required string field; reports and returns `None` when absent
    /// or not a string.
    fn required_str<'a>(
        &mut self,
        map: &'a Map<String, Value>,
        section: &'static str,
        field: &'static str,
    ) -> Option<&'a str> {
        match map.get(field).and_then(Value::as_str) {
            Some(s) => Some(s),
            None => {
                self.report(PolicyDiagnostic::MissingField { section, field });
                None
            }
        }
    }

    fn mode(&mut self, root: &Map<String, Value>, policy: &mut AccelerationPolicy) {
        let Some(value) = root.get("policy") else {
            return;
        };
        let Some(name) = value.as_str() else {
            self.wrong_type("policy", "a string");
            return;
        };
        match AccelerationMode::from_policy_name(name) {
            Some(mode) => policy.set_mode(mode),
            None => {
                self.report(PolicyDiagnostic::UnknownMode(name.to_string()));
                policy.set_mode(AccelerationMode::CpuOnly);
            }
        }
    }

    fn cpu_fallback(&mut self, root: &Map<String, Value>, policy: &mut AccelerationPolicy) {
        let Some(value) = root.get("cpu_fallback_percentage") else {
            return;
        };
        // Integers too large for i64 still clamp to 100.
        match value.as_i64().or_else(|| value.as_u64().map(|_| i64::MAX)) {
            Some(percent) => policy.enable_load_balancing(percent),
            None => self.wrong_type("cpu_fallback_percentage", "an integer"),
        }
    }

    fn serialization(&mut self, root: &Map<String, Value>, policy: &mut AccelerationPolicy) {
        const SECTION: &str = "serialization";
        let Some(map) = self.section(root, SECTION) else {
            return;
        };
        let dir = self.required_str(map, SECTION, "dir_path");
        let token = self.required_str(map, SECTION, "model_token");
        if let (Some(dir), Some(token)) = (dir, token) {
            policy.set_gpu_cache(GpuResultCache::new(dir, token));
        }
    }

    fn caching(&mut self, root: &Map<String, Value>, policy: &mut AccelerationPolicy) {
        const SECTION: &str = "caching";
        let Some(map) = self.section(root, SECTION) else {
            return;
        };
        let dir = self.required_str(map, SECTION, "cache_dir");
        let token = self.required_str(map, SECTION, "model_token");
        let (Some(dir), Some(token)) = (dir, token) else {
            return;
        };

        let mut cache = AcceleratorCache::new(dir, token);
        if let Some(value) = map.get("disallow_nnapi_cpu") {
            match value.as_bool() {
                Some(b) => cache.disallow_cpu_fallback = b,
                None => self.wrong_type("caching.disallow_nnapi_cpu", "a boolean"),
            }
        }
        if let Some(value) = map.get("max_number_delegated_partitions") {
            match value.as_i64().and_then(|n| i32::try_from(n).ok()) {
                Some(n) => cache.max_delegated_partitions = n,
                None => self.wrong_type("caching.max_number_delegated_partitions", "a 32-bit integer"),
            }
        }
        if let Some(value) = map.get("accelerator_name") {
            match value.as_str() {
                Some(name) => cache.accelerator_name = name.to_string(),
                None => self.wrong_type("caching.accelerator_name", "a string"),
            }
        }
        policy.set_accelerator_cache(cache);
    }
}

impl AccelerationPolicy {
    /// Parses a policy document, discarding diagnostics (they are still
    /// logged).
    pub fn parse(text: &str) -> Self {
        Self::parse_with_diagnostics(text).policy
    }

    /// Parses a policy document.
    ///
    /// Never fails: empty text yields the default policy, malformed text
    /// yields the default policy plus a diagnostic.
    pub fn parse_with_diagnostics(text: &str) -> ParsedPolicy {
        let mut policy = AccelerationPolicy::default();
        let mut reader = Reader {
            diagnostics: Vec::new(),
        };

        if !text.trim().is_empty() {
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(root)) => {
                    // Mode first: the fallback ratio may override it.
                    reader.mode(&root, &mut policy);
                    reader.cpu_fallback(&root, &mut policy);
                    reader.serialization(&root, &mut policy);
                    reader.caching(&root, &mut policy);
                }
                Ok(_) => reader.report(PolicyDiagnostic::NotAnObject),
                Err(e) => reader.report(PolicyDiagnostic::MalformedDocument(e.to_string())),
            }
        }

        tracing::debug!("parsed policy: {}", policy.summary());
        ParsedPolicy {
            policy,
            diagnostics: reader.diagnostics,
        }
    }

    /// Reads and parses a policy file. Only I/O errors are returned.
    pub fn from_file(path: &Path) -> Result<ParsedPolicy, PolicyError> {
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse_with_diagnostics(&content))
    }

    /// Builds the document form of this policy.
    ///
    /// `cpu_fallback_percentage` is only written under `LOAD_BALANCING`,
    /// since reading it back forces that mode.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert("policy".into(), Value::from(self.mode().as_str()));
        if self.mode() == AccelerationMode::EnableLoadBalancing {
            root.insert(
                "cpu_fallback_percentage".into(),
                Value::from(self.cpu_fallback_percentage()),
            );
        }

        let gpu = self.gpu_cache();
        if gpu.use_cache {
            root.insert(
                "serialization".into(),
                serde_json::json!({
                    "dir_path": gpu.dir_path,
                    "model_token": gpu.model_token,
                }),
            );
        }

        let acc = self.accelerator_cache();
        if acc.has_cache_location() {
            root.insert(
                "caching".into(),
                serde_json::json!({
                    "cache_dir": acc.cache_dir,
                    "model_token": acc.model_token,
                    "disallow_nnapi_cpu": acc.disallow_cpu_fallback,
                    "max_number_delegated_partitions": acc.max_delegated_partitions,
                    "accelerator_name": acc.accelerator_name,
                }),
            );
        }
        Value::Object(root)
    }

    /// Serialises this policy as a pretty-printed policy document.
    pub fn to_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }
}
