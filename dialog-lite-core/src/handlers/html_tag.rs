use super::{Handler, HandlerContext, NT_UNSTRUCTURED, PRIMARY_TYPE};
use crate::error::{PluginError, Result};
use crate::model::AnnotationKind;
use crate::scope::Scope;
use crate::source::Source;
use crate::target::{TargetId, TargetTree};

/// Wrapper element decoration (`_cq_htmlTag/.content.xml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTagHandler;

impl Handler for HtmlTagHandler {
    fn name(&self) -> &str {
        "HtmlTag"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::HtmlTag
    }

    fn scopes(&self) -> &[Scope] {
        &[Scope::HtmlTag]
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = source.annotations().html_tag() else {
            return Ok(());
        };
        tree.set_attr(target, PRIMARY_TYPE, NT_UNSTRUCTURED);
        tree.set_opt(target, "class", def.class_name.as_deref());
        let tag = def.tag_name.trim();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            ctx.report(PluginError::validation(format!(
                "'{}' on {} is not a valid tag name",
                def.tag_name, source
            )))?;
            return Ok(());
        }
        tree.set_attr(target, "cq:tagName", tag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{attr, build_context, type_source};
    use crate::handlers::HandlerChains;

    fn render(yaml: &str) -> (TargetTree, usize) {
        let ctx = build_context(yaml, "");
        let chains = HandlerChains::default();
        let hctx = HandlerContext::new(&ctx, &chains, Scope::HtmlTag);
        let mut tree = TargetTree::new("jcr:root");
        let root = tree.root();
        HtmlTagHandler
            .apply(type_source(&ctx, "app.Teaser"), &mut tree, root, &hctx)
            .unwrap();
        let issues = ctx.issues().len();
        (tree, issues)
    }

    #[test]
    fn test_default_tag_is_div() {
        let (tree, issues) = render(
            "types:\n  - name: app.Teaser\n    annotations:\n      - kind: HtmlTag\n        class_name: teaser\n",
        );
        assert_eq!(issues, 0);
        assert_eq!(attr(&tree, tree.root(), "cq:tagName").as_deref(), Some("div"));
        assert_eq!(attr(&tree, tree.root(), "class").as_deref(), Some("teaser"));
    }

    #[test]
    fn test_invalid_tag_reported() {
        let (tree, issues) = render(
            "types:\n  - name: app.Teaser\n    annotations:\n      - kind: HtmlTag\n        tag_name: \"<b>\"\n",
        );
        assert_eq!(issues, 1);
        assert!(attr(&tree, tree.root(), "cq:tagName").is_none());
    }
}
