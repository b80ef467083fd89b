use super::{Handler, HandlerContext, NT_UNSTRUCTURED, PRIMARY_TYPE, RESOURCE_TYPE, RT_DIALOG};
use crate::containers;
use crate::error::{PluginError, Result};
use crate::model::AnnotationKind;
use crate::scope::Scope;
use crate::source::Source;
use crate::target::{TargetId, TargetTree};

/// Dialog and design dialog root, followed by the container layout with
/// every member of the source type.
#[derive(Debug, Clone, Copy)]
pub struct DialogHandler {
    scope: Scope,
}

impl DialogHandler {
    pub fn dialog() -> Self {
        Self {
            scope: Scope::Dialog,
        }
    }

    pub fn design_dialog() -> Self {
        Self {
            scope: Scope::DesignDialog,
        }
    }
}

impl Handler for DialogHandler {
    fn name(&self) -> &str {
        match self.scope {
            Scope::DesignDialog => "DesignDialog",
            _ => "Dialog",
        }
    }

    fn handles(&self) -> AnnotationKind {
        match self.scope {
            Scope::DesignDialog => AnnotationKind::DesignDialog,
            _ => AnnotationKind::Dialog,
        }
    }

    fn scopes(&self) -> &[Scope] {
        match self.scope {
            Scope::DesignDialog => &[Scope::DesignDialog],
            _ => &[Scope::Dialog],
        }
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let annotations = source.annotations();
        let def = match self.scope {
            Scope::DesignDialog => annotations.design_dialog(),
            _ => annotations.dialog(),
        };
        let Some(def) = def else {
            return Ok(());
        };

        tree.set_attr(target, PRIMARY_TYPE, NT_UNSTRUCTURED);
        if def.title.trim().is_empty() {
            ctx.report(PluginError::validation(format!(
                "{} of {} has a blank title",
                self.name(),
                source
            )))?;
        } else {
            tree.set_attr(target, "jcr:title", def.title.as_str());
        }
        tree.set_attr(target, RESOURCE_TYPE, RT_DIALOG);
        tree.set_opt(target, "helpPath", def.help_path.as_deref());
        for (name, value) in [("width", def.width), ("height", def.height)] {
            match value {
                Some(v) if v <= 0 => ctx.report(PluginError::validation(format!(
                    "{} {} of {} must be positive, got {}",
                    self.name(),
                    name,
                    source,
                    v
                )))?,
                other => tree.set_opt(target, name, other),
            }
        }

        let nested = ctx.nested(source.declaring(), "");
        containers::build_layout(&nested, source.declaring(), tree, target)
    }
}
