//! Rendering scopes: one output document per scope.

use serde::{Deserialize, Serialize};

/// A named rendering context selecting which handler chain applies and which
/// file the resulting tree is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Component definition (`.content.xml`)
    Component,
    Dialog,
    DesignDialog,
    EditConfig,
    ChildEditConfig,
    HtmlTag,
    /// Catch-all scope with no structural handler
    Default,
}

impl Scope {
    /// Scopes that produce a file, in output order.
    pub const OUTPUT: [Scope; 6] = [
        Scope::Component,
        Scope::Dialog,
        Scope::DesignDialog,
        Scope::EditConfig,
        Scope::ChildEditConfig,
        Scope::HtmlTag,
    ];

    /// Path of the output file relative to the component folder.
    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            Scope::Component => Some(".content.xml"),
            Scope::Dialog => Some("_cq_dialog/.content.xml"),
            Scope::DesignDialog => Some("_cq_design_dialog/.content.xml"),
            Scope::EditConfig => Some("_cq_editConfig.xml"),
            Scope::ChildEditConfig => Some("_cq_childEditConfig.xml"),
            Scope::HtmlTag => Some("_cq_htmlTag/.content.xml"),
            Scope::Default => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Component => "component",
            Scope::Dialog => "dialog",
            Scope::DesignDialog => "design_dialog",
            Scope::EditConfig => "edit_config",
            Scope::ChildEditConfig => "child_edit_config",
            Scope::HtmlTag => "html_tag",
            Scope::Default => "default",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
