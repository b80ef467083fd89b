//! Per-build context passed by reference through the pipeline.

use std::cell::RefCell;

use serde::Serialize;

use crate::error::{PluginError, Result};
use crate::exceptions::{self, ExceptionHandler};
use crate::index::TypeIndex;
use crate::settings::PluginSettings;
use crate::xml::XmlOptions;

/// A content problem that the exception policy tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub message: String,
}

/// Everything one build needs: the type index, the exception policy, the
/// settings, and the XML writer options.
#[derive(Debug)]
pub struct BuildContext {
    index: TypeIndex,
    exceptions: Box<dyn ExceptionHandler>,
    settings: PluginSettings,
    issues: RefCell<Vec<Issue>>,
}

impl BuildContext {
    pub fn new(index: TypeIndex, settings: PluginSettings) -> Self {
        let exceptions = exceptions::from_setting(&settings.terminate_on);
        Self::with_handler(index, settings, exceptions)
    }

    pub fn with_handler(
        index: TypeIndex,
        settings: PluginSettings,
        exceptions: Box<dyn ExceptionHandler>,
    ) -> Self {
        Self {
            index,
            exceptions,
            settings,
            issues: RefCell::new(Vec::new()),
        }
    }

    pub fn index(&self) -> &TypeIndex {
        &self.index
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    pub fn xml(&self) -> &XmlOptions {
        &self.settings.xml
    }

    pub fn exception_policy(&self) -> &str {
        self.exceptions.name()
    }

    /// Route a content problem through the exception policy. Tolerated
    /// problems are recorded; escalations come back as `Err`.
    pub fn report(&self, error: PluginError) -> Result<()> {
        let issue = Issue {
            kind: error.kind_name(),
            message: error.to_string(),
        };
        self.exceptions.handle(error)?;
        self.issues.borrow_mut().push(issue);
        Ok(())
    }

    /// Problems reported so far and tolerated by the policy.
    pub fn issues(&self) -> Vec<Issue> {
        self.issues.borrow().clone()
    }
}
