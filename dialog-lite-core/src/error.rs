//! Error taxonomy for the build pipeline
//!
//! Every failure the pipeline can observe is a [`PluginError`]. Variants fall
//! into two classes:
//!
//! - **runtime** errors describe bad content in one component (blank values,
//!   missing tabs, placement cycles). They are routed through the active
//!   [`ExceptionHandler`](crate::exceptions::ExceptionHandler), which decides
//!   whether the build goes on.
//! - **checked** errors describe an unusable build environment (unresolvable
//!   types, unreadable files). They are returned directly and abort the build.

use std::path::PathBuf;

use thiserror::Error;

/// Namespace prefix used for qualified error kind names (`dialog_lite::Validation`).
pub const ERROR_NAMESPACE: &str = "dialog_lite";

pub type Result<T> = std::result::Result<T, PluginError>;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Illegal argument: {message}")]
    IllegalArgument { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid container: {message}")]
    InvalidContainer { message: String },

    #[error("Invalid layout: {message}")]
    InvalidLayout { message: String },

    #[error("Placement collision: {message}")]
    PlacementCollision { message: String },

    #[error("Type '{name}' referenced by '{referenced_by}' cannot be resolved")]
    UnresolvedType { name: String, referenced_by: String },

    #[error("Reflection error: {message}")]
    Reflection { message: String },

    #[error("Settings error: {message}")]
    Settings { message: String },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Build aborted: {0}")]
    Aborted(#[source] Box<PluginError>),
}

impl PluginError {
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::IllegalArgument {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_container(message: impl Into<String>) -> Self {
        Self::InvalidContainer {
            message: message.into(),
        }
    }

    pub fn invalid_layout(message: impl Into<String>) -> Self {
        Self::InvalidLayout {
            message: message.into(),
        }
    }

    pub fn placement_collision(message: impl Into<String>) -> Self {
        Self::PlacementCollision {
            message: message.into(),
        }
    }

    pub fn reflection(message: impl Into<String>) -> Self {
        Self::Reflection {
            message: message.into(),
        }
    }

    /// Stable, unqualified name of the error kind. Used by the selective
    /// exception policy to match configured names.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PluginError::IllegalArgument { .. } => "IllegalArgument",
            PluginError::Validation { .. } => "Validation",
            PluginError::InvalidContainer { .. } => "InvalidContainer",
            PluginError::InvalidLayout { .. } => "InvalidLayout",
            PluginError::PlacementCollision { .. } => "PlacementCollision",
            PluginError::UnresolvedType { .. } => "UnresolvedType",
            PluginError::Reflection { .. } => "Reflection",
            PluginError::Settings { .. } => "Settings",
            PluginError::Io { .. } => "Io",
            PluginError::Yaml { .. } => "Yaml",
            PluginError::Xml(_) => "Xml",
            PluginError::Aborted(_) => "Aborted",
        }
    }

    /// Kind name prefixed with [`ERROR_NAMESPACE`].
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", ERROR_NAMESPACE, self.kind_name())
    }

    /// Runtime errors concern content of a single component and may be
    /// tolerated by the exception policy.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            PluginError::IllegalArgument { .. }
                | PluginError::Validation { .. }
                | PluginError::InvalidContainer { .. }
                | PluginError::InvalidLayout { .. }
                | PluginError::PlacementCollision { .. }
        )
    }

    /// Whether this is (or wraps) an escalation produced by the exception policy.
    pub fn is_abort(&self) -> bool {
        matches!(self, PluginError::Aborted(_))
    }

    /// Wrap into [`PluginError::Aborted`]. Already-aborted errors are returned unchanged.
    pub fn into_abort(self) -> Self {
        match self {
            PluginError::Aborted(_) => self,
            other => PluginError::Aborted(Box::new(other)),
        }
    }

    /// The innermost error of an abort wrapper.
    pub fn root_cause(&self) -> &PluginError {
        match self {
            PluginError::Aborted(inner) => inner.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        let err = PluginError::illegal_argument("bad");
        assert_eq!(err.kind_name(), "IllegalArgument");
        assert_eq!(err.qualified_name(), "dialog_lite::IllegalArgument");
    }

    #[test]
    fn test_runtime_classification() {
        assert!(PluginError::validation("x").is_runtime());
        assert!(PluginError::invalid_layout("x").is_runtime());
        assert!(!PluginError::reflection("x").is_runtime());
        assert!(!PluginError::Xml("x".into()).is_runtime());
    }

    /// Every runtime kind has a constructor, so the policy can see all of them.
    #[test]
    fn test_runtime_kinds_are_constructible() {
        let runtime: Vec<&str> = [
            PluginError::illegal_argument("x"),
            PluginError::validation("x"),
            PluginError::invalid_container("x"),
            PluginError::invalid_layout("x"),
            PluginError::placement_collision("x"),
        ]
        .iter()
        .filter(|e| e.is_runtime())
        .map(|e| e.kind_name())
        .collect();
        assert_eq!(
            runtime,
            vec!["IllegalArgument", "Validation", "InvalidContainer", "InvalidLayout", "PlacementCollision"]
        );
    }

    #[test]
    fn test_abort_wraps_once() {
        let err = PluginError::validation("blank title").into_abort().into_abort();
        assert!(err.is_abort());
        assert_eq!(err.root_cause().kind_name(), "Validation");
        assert!(err.to_string().contains("blank title"));
    }
}
