//! Generic property mapping: `Property` records become attributes.

use super::{Handler, HandlerContext};
use crate::error::{PluginError, Result};
use crate::model::AnnotationKind;
use crate::scope::Scope;
use crate::source::Source;
use crate::target::{AttrValue, TargetId, TargetTree};

/// First handler of every chain. Applies the source's `Property` records
/// that are unscoped or scoped to the current scope. A name containing `/`
/// addresses an attribute of a relative child node (`items/title/required`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyHandler;

impl Handler for PropertyHandler {
    fn name(&self) -> &str {
        "Property"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::Property
    }

    fn scopes(&self) -> &[Scope] {
        &[
            Scope::Component,
            Scope::Dialog,
            Scope::DesignDialog,
            Scope::EditConfig,
            Scope::ChildEditConfig,
            Scope::HtmlTag,
            Scope::Default,
        ]
    }

    fn rank(&self) -> i32 {
        i32::MIN
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        for property in source.annotations().properties() {
            if property.scope.is_some_and(|s| s != ctx.scope()) {
                continue;
            }
            let name = property.name.trim();
            let (path, attr) = match name.rsplit_once('/') {
                Some((path, attr)) => (Some(path), attr),
                None => (None, name),
            };
            if attr.is_empty() {
                ctx.report(PluginError::validation(format!(
                    "property name '{}' on {} is blank",
                    property.name, source
                )))?;
                continue;
            }
            let node = match path {
                Some(path) => tree.get_or_create(target, path),
                None => target,
            };
            tree.set_attr(node, attr, AttrValue::from(&property.value));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{attr, build_context, type_source};
    use crate::handlers::HandlerChains;

    const YAML: &str = r#"
types:
  - name: app.Teaser
    annotations:
      - kind: Property
        name: cq:icon
        value: image
      - kind: Property
        name: content/items/hint/required
        value: true
        scope: dialog
      - kind: Property
        name: weight
        value: 1.5
        scope: component
      - kind: Property
        name: "  "
        value: x
"#;

    fn apply(scope: Scope, terminate_on: &str) -> (TargetTree, Result<()>, usize) {
        let ctx = build_context(YAML, terminate_on);
        let chains = HandlerChains::default();
        let hctx = HandlerContext::new(&ctx, &chains, scope);
        let mut tree = TargetTree::new("jcr:root");
        let root = tree.root();
        let result = PropertyHandler.apply(type_source(&ctx, "app.Teaser"), &mut tree, root, &hctx);
        let issues = ctx.issues().len();
        (tree, result, issues)
    }

    /// T-PROP-1: scoped properties apply only in their scope.
    #[test]
    fn t_prop_1_scope_filter() {
        let (tree, result, issues) = apply(Scope::Component, "");
        assert!(result.is_ok());
        assert_eq!(issues, 1);
        let root = tree.root();
        assert_eq!(attr(&tree, root, "cq:icon").as_deref(), Some("image"));
        assert_eq!(attr(&tree, root, "weight").as_deref(), Some("{Double}1.5"));
        assert!(tree.find(root, "content").is_none());
    }

    /// T-PROP-2: slash-separated names address relative child nodes.
    #[test]
    fn t_prop_2_relative_paths() {
        let (tree, _, _) = apply(Scope::Dialog, "");
        let hint = tree.find(tree.root(), "content/items/hint").unwrap();
        assert_eq!(attr(&tree, hint, "required").as_deref(), Some("{Boolean}true"));
        assert!(attr(&tree, tree.root(), "weight").is_none());
    }

    /// T-PROP-3: a blank name is a validation error under the active policy.
    #[test]
    fn t_prop_3_blank_name_escalates() {
        let (_, result, _) = apply(Scope::Dialog, "Validation");
        assert!(result.unwrap_err().is_abort());
    }
}
