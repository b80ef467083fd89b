use super::{Handler, HandlerContext, PRIMARY_TYPE};
use crate::error::{PluginError, Result};
use crate::model::AnnotationKind;
use crate::scope::Scope;
use crate::source::Source;
use crate::target::{TargetId, TargetTree};

/// Component definition node (`.content.xml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentHandler;

impl Handler for ComponentHandler {
    fn name(&self) -> &str {
        "Component"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::AemComponent
    }

    fn scopes(&self) -> &[Scope] {
        &[Scope::Component]
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = source.annotations().component() else {
            return Ok(());
        };
        tree.set_attr(target, PRIMARY_TYPE, "cq:Component");
        if def.title.trim().is_empty() {
            ctx.report(PluginError::validation(format!(
                "component {} has a blank title",
                source
            )))?;
        } else {
            tree.set_attr(target, "jcr:title", def.title.as_str());
        }
        tree.set_opt(target, "jcr:description", def.description.as_deref());
        tree.set_opt(target, "componentGroup", def.component_group.as_deref());
        tree.set_opt(target, "sling:resourceSuperType", def.resource_super_type.as_deref());
        tree.set_flag(target, "cq:isContainer", def.is_container);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{attr, build_context, type_source};
    use crate::handlers::HandlerChains;

    #[test]
    fn test_component_attributes() {
        let yaml = r#"
types:
  - name: app.Teaser
    annotations:
      - kind: AemComponent
        path: content/teaser
        title: Teaser
        component_group: Content
        is_container: true
"#;
        let ctx = build_context(yaml, "");
        let chains = HandlerChains::default();
        let hctx = HandlerContext::new(&ctx, &chains, Scope::Component);
        let mut tree = TargetTree::new("jcr:root");
        let root = tree.root();
        ComponentHandler
            .apply(type_source(&ctx, "app.Teaser"), &mut tree, root, &hctx)
            .unwrap();

        assert_eq!(attr(&tree, root, PRIMARY_TYPE).as_deref(), Some("cq:Component"));
        assert_eq!(attr(&tree, root, "jcr:title").as_deref(), Some("Teaser"));
        assert_eq!(attr(&tree, root, "componentGroup").as_deref(), Some("Content"));
        assert_eq!(attr(&tree, root, "cq:isContainer").as_deref(), Some("{Boolean}true"));
        assert!(attr(&tree, root, "jcr:description").is_none());
    }

    #[test]
    fn test_blank_title_reported() {
        let yaml = r#"
types:
  - name: app.Teaser
    annotations:
      - kind: AemComponent
        path: content/teaser
        title: ""
"#;
        let ctx = build_context(yaml, "");
        let chains = HandlerChains::default();
        let hctx = HandlerContext::new(&ctx, &chains, Scope::Component);
        let mut tree = TargetTree::new("jcr:root");
        let root = tree.root();
        ComponentHandler
            .apply(type_source(&ctx, "app.Teaser"), &mut tree, root, &hctx)
            .unwrap();
        assert_eq!(ctx.issues()[0].kind, "Validation");
        assert!(attr(&tree, root, "jcr:title").is_none());
    }
}
