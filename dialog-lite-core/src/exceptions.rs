//! Exception handling policy
//!
//! Handlers and the placement resolver never return content errors directly.
//! They pass them to the active [`ExceptionHandler`], which either logs the
//! error (processing continues) or returns it wrapped in
//! [`PluginError::Aborted`] (the build stops).
//!
//! The policy is chosen from the `terminate_on` setting:
//!
//! | Setting | Policy |
//! |---|---|
//! | `""`, `none` | [`PermissiveHandler`] |
//! | `all`, `*` | [`StrictHandler`] |
//! | `Validation, InvalidLayout` | [`SelectiveHandler`] escalating the named kinds |
//! | `all, !Validation` | [`SelectiveHandler`] escalating everything but the named kinds |

use std::fmt;

use tracing::{error, warn};

use crate::error::{PluginError, Result, ERROR_NAMESPACE};

pub trait ExceptionHandler: fmt::Debug {
    /// Log `error` and return `Ok(())`, or return the wrapped abort.
    fn handle(&self, error: PluginError) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Runtime errors are warnings; checked errors are errors.
fn log(error: &PluginError) {
    if error.is_runtime() {
        warn!(kind = error.kind_name(), "{}", error);
    } else {
        error!(kind = error.kind_name(), "{}", error);
    }
}

// ── Permissive ──

#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveHandler;

impl ExceptionHandler for PermissiveHandler {
    fn handle(&self, error: PluginError) -> Result<()> {
        if error.is_abort() {
            return Err(error);
        }
        log(&error);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "permissive"
    }
}

// ── Strict ──

#[derive(Debug, Clone, Copy, Default)]
pub struct StrictHandler;

impl ExceptionHandler for StrictHandler {
    fn handle(&self, error: PluginError) -> Result<()> {
        Err(error.into_abort())
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

// ── Selective ──

#[derive(Debug, Clone, Default)]
pub struct SelectiveHandler {
    /// Lowercased kind names that abort the build
    critical: Vec<String>,
    /// Escalate every kind not listed in `exempt`
    all: bool,
    exempt: Vec<String>,
}

impl SelectiveHandler {
    pub fn new<I, S>(critical: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            critical: critical.into_iter().map(|s| normalize(s.as_ref())).collect(),
            all: false,
            exempt: Vec::new(),
        }
    }

    /// Escalate everything except the given kinds.
    pub fn all_except<I, S>(exempt: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            critical: Vec::new(),
            all: true,
            exempt: exempt.into_iter().map(|s| normalize(s.as_ref())).collect(),
        }
    }

    pub fn is_critical(&self, error: &PluginError) -> bool {
        let matches = |names: &[String]| {
            let simple = error.kind_name().to_ascii_lowercase();
            let qualified = error.qualified_name().to_ascii_lowercase();
            names.iter().any(|n| *n == simple || *n == qualified)
        };
        if self.all {
            !matches(&self.exempt)
        } else {
            matches(&self.critical)
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl ExceptionHandler for SelectiveHandler {
    fn handle(&self, error: PluginError) -> Result<()> {
        if error.is_abort() || self.is_critical(&error) {
            return Err(error.into_abort());
        }
        log(&error);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "selective"
    }
}

/// Build the policy for a `terminate_on` setting value.
pub fn from_setting(setting: &str) -> Box<dyn ExceptionHandler> {
    let tokens: Vec<&str> = setting
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let is_all = |t: &&str| t.eq_ignore_ascii_case("all") || *t == "*";
    let exemptions: Vec<&str> = tokens.iter().filter_map(|t| t.strip_prefix('!')).collect();
    let critical: Vec<&str> = tokens.iter().copied().filter(|t| !t.starts_with('!')).collect();

    match tokens.as_slice() {
        [] => Box::new(PermissiveHandler),
        [only] if only.eq_ignore_ascii_case("none") => Box::new(PermissiveHandler),
        [only] if is_all(only) => Box::new(StrictHandler),
        _ if tokens.iter().any(is_all) => Box::new(SelectiveHandler::all_except(exemptions)),
        _ => Box::new(SelectiveHandler::new(critical)),
    }
}

/// Qualified form of a kind name, as accepted in `terminate_on`.
pub fn qualify(kind: &str) -> String {
    format!("{}::{}", ERROR_NAMESPACE, kind)
}
