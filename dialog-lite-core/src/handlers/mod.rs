//! Handlers mutate the output tree for one [`Source`].
//!
//! Built-in handlers cover the scope structures (component, dialog, edit
//! config, HTML tag), generic property mapping and the widget set. User
//! handlers register on [`HandlerChains`] and are invoked for sources
//! carrying their `Custom` marker.

pub mod chains;
pub mod component;
pub mod dialog;
pub mod edit_config;
pub mod html_tag;
pub mod property;
pub mod widgets;

use std::fmt;

use crate::context::BuildContext;
use crate::error::{PluginError, Result};
use crate::index::TypeId;
use crate::model::AnnotationKind;
use crate::scope::Scope;
use crate::source::Source;
use crate::target::{TargetId, TargetTree};

pub use chains::{Chain, HandlerChains, HandlerChainsBuilder};

// ── Resource types ──

pub const PRIMARY_TYPE: &str = "jcr:primaryType";
pub const RESOURCE_TYPE: &str = "sling:resourceType";
pub const NT_UNSTRUCTURED: &str = "nt:unstructured";

pub const RT_DIALOG: &str = "cq/gui/components/authoring/dialog";
pub const RT_CONTAINER: &str = "granite/ui/components/coral/foundation/container";
pub const RT_TABS: &str = "granite/ui/components/coral/foundation/tabs";
pub const RT_ACCORDION: &str = "granite/ui/components/coral/foundation/accordion";
pub const RT_FIXED_COLUMNS: &str = "granite/ui/components/coral/foundation/fixedcolumns";

/// One unit of the handler pipeline.
///
/// `rank`, `before` and `after` order handlers within a chain: lower rank
/// first, then before/after links by handler name.
pub trait Handler: fmt::Debug {
    /// Unique handler name, referenced by other handlers' `before` / `after`.
    fn name(&self) -> &str;

    /// Annotation whose presence on a source selects this handler.
    fn handles(&self) -> AnnotationKind;

    /// Scopes the handler takes part in.
    fn scopes(&self) -> &[Scope] {
        &[Scope::Dialog, Scope::DesignDialog]
    }

    fn rank(&self) -> i32 {
        0
    }

    fn before(&self) -> Option<&str> {
        None
    }

    fn after(&self) -> Option<&str> {
        None
    }

    /// Mutate `target` for `source`. Content problems go through
    /// [`HandlerContext::report`]; an `Err` means the build was aborted.
    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()>;
}

/// State shared by the handlers of one scope rendering.
#[derive(Debug, Clone)]
pub struct HandlerContext<'c> {
    build: &'c BuildContext,
    chains: &'c HandlerChains,
    scope: Scope,
    /// Types currently being rendered, outermost first
    stack: Vec<TypeId>,
    name_prefix: String,
}

impl<'c> HandlerContext<'c> {
    pub fn new(build: &'c BuildContext, chains: &'c HandlerChains, scope: Scope) -> Self {
        Self {
            build,
            chains,
            scope,
            stack: Vec::new(),
            name_prefix: String::new(),
        }
    }

    pub fn build(&self) -> &'c BuildContext {
        self.build
    }

    pub fn chains(&self) -> &'c HandlerChains {
        self.chains
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn report(&self, error: PluginError) -> Result<()> {
        self.build.report(error)
    }

    /// Prefix prepended to generated field names (`./prefix_title`).
    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn is_rendering(&self, ty: TypeId) -> bool {
        self.stack.contains(&ty)
    }

    /// Types being rendered, outermost first.
    pub fn rendering_stack(&self) -> &[TypeId] {
        &self.stack
    }

    /// Context for rendering the members of `ty` inside the current one.
    pub fn nested(&self, ty: TypeId, prefix: &str) -> Self {
        let mut nested = self.clone();
        nested.stack.push(ty);
        nested.name_prefix.push_str(prefix);
        nested
    }
}
