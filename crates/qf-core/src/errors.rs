//! Structured error types shared across the engine crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`QfError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (symbols, axis indices, sizes, ...).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            let rendered: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            write!(f, " | context: [{}]", rendered.join(", "))?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the quantum faction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum QfError {
    /// Faction descriptor, registry and library errors.
    #[error("faction error: {0}")]
    Faction(ErrorInfo),
    /// Register map and operator construction errors.
    #[error("register error: {0}")]
    Register(ErrorInfo),
    /// State engine errors (refused gates, measured axes, bad time steps).
    #[error("engine error: {0}")]
    Engine(ErrorInfo),
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl QfError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            QfError::Faction(info)
            | QfError::Register(info)
            | QfError::Engine(info)
            | QfError::Config(info)
            | QfError::Serde(info) => info,
        }
    }

    /// Shorthand for the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Builds a [`QfError::Engine`] error.
    pub fn engine(code: &str, message: impl Into<String>) -> Self {
        QfError::Engine(ErrorInfo::new(code, message))
    }

    /// Builds a [`QfError::Register`] error.
    pub fn register(code: &str, message: impl Into<String>) -> Self {
        QfError::Register(ErrorInfo::new(code, message))
    }

    /// Builds a [`QfError::Faction`] error.
    pub fn faction(code: &str, message: impl Into<String>) -> Self {
        QfError::Faction(ErrorInfo::new(code, message))
    }

    /// Builds a [`QfError::Serde`] error.
    pub fn serde(code: &str, message: impl Into<String>) -> Self {
        QfError::Serde(ErrorInfo::new(code, message))
    }

    /// Builds a [`QfError::Config`] error.
    pub fn config(code: &str, message: impl Into<String>) -> Self {
        QfError::Config(ErrorInfo::new(code, message))
    }
}
