//! Edit configuration (`_cq_editConfig.xml`) and child edit configuration
//! (`_cq_childEditConfig.xml`).

use super::{Handler, HandlerContext, PRIMARY_TYPE};
use crate::error::{PluginError, Result};
use crate::model::annotations::{DropTarget, Listener};
use crate::model::AnnotationKind;
use crate::scope::Scope;
use crate::source::Source;
use crate::target::{TargetId, TargetTree};

const EDIT_CONFIG: &str = "cq:EditConfig";

#[derive(Debug, Clone, Copy, Default)]
pub struct EditConfigHandler;

impl Handler for EditConfigHandler {
    fn name(&self) -> &str {
        "EditConfig"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::EditConfig
    }

    fn scopes(&self) -> &[Scope] {
        &[Scope::EditConfig]
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = source.annotations().edit_config() else {
            return Ok(());
        };
        tree.set_attr(target, PRIMARY_TYPE, EDIT_CONFIG);
        set_actions(tree, target, &def.actions);
        tree.set_opt(target, "cq:dialogMode", def.dialog_mode.as_deref());
        tree.set_opt(target, "cq:emptyText", def.empty_text.as_deref());
        tree.set_flag(target, "cq:inherit", def.inherit);
        write_listeners(source, tree, target, &def.listeners, ctx)?;
        write_drop_targets(source, tree, target, &def.drop_targets, ctx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChildEditConfigHandler;

impl Handler for ChildEditConfigHandler {
    fn name(&self) -> &str {
        "ChildEditConfig"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::ChildEditConfig
    }

    fn scopes(&self) -> &[Scope] {
        &[Scope::ChildEditConfig]
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = source.annotations().child_edit_config() else {
            return Ok(());
        };
        tree.set_attr(target, PRIMARY_TYPE, EDIT_CONFIG);
        set_actions(tree, target, &def.actions);
        write_listeners(source, tree, target, &def.listeners, ctx)?;
        write_drop_targets(source, tree, target, &def.drop_targets, ctx)
    }
}

fn set_actions(tree: &mut TargetTree, target: TargetId, actions: &[String]) {
    if !actions.is_empty() {
        tree.set_attr(target, "cq:actions", actions.to_vec());
    }
}

/// Listener records are event/action pairs; both halves must be present.
fn write_listeners(
    source: Source<'_>,
    tree: &mut TargetTree,
    target: TargetId,
    listeners: &[Listener],
    ctx: &HandlerContext<'_>,
) -> Result<()> {
    let mut node = None;
    for listener in listeners {
        if listener.event.trim().is_empty() || listener.action.trim().is_empty() {
            ctx.report(PluginError::illegal_argument(format!(
                "malformed listener '{}' = '{}' on {}",
                listener.event, listener.action, source
            )))?;
            continue;
        }
        let id = *node.get_or_insert_with(|| {
            let id = tree.get_or_create(target, "cq:listeners");
            tree.set_attr(id, PRIMARY_TYPE, "cq:EditListenersConfig");
            id
        });
        tree.set_attr(id, listener.event.trim(), listener.action.trim());
    }
    Ok(())
}

fn write_drop_targets(
    source: Source<'_>,
    tree: &mut TargetTree,
    target: TargetId,
    drop_targets: &[DropTarget],
    ctx: &HandlerContext<'_>,
) -> Result<()> {
    let mut container = None;
    for drop in drop_targets {
        if drop.node_name.trim().is_empty() || drop.property_name.trim().is_empty() {
            ctx.report(PluginError::validation(format!(
                "drop target on {} needs a node name and a property name",
                source
            )))?;
            continue;
        }
        let parent = *container.get_or_insert_with(|| {
            let id = tree.get_or_create(target, "cq:dropTargets");
            tree.set_attr(id, PRIMARY_TYPE, "nt:unstructured");
            id
        });
        let node = tree.create_child(parent, drop.node_name.trim());
        tree.set_attr(node, PRIMARY_TYPE, "cq:DropTargetConfig");
        tree.set_attr(node, "accept", drop.accept.clone());
        tree.set_attr(node, "groups", drop.groups.clone());
        tree.set_attr(node, "propertyName", drop.property_name.trim());
    }
    Ok(())
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
      - kind: EditConfig
        actions: [edit, copymove, delete]
        empty_text: Drag an image
        listeners:
          - event: afteredit
            action: REFRESH_PAGE
          - event: afterdelete
            action: ""
        drop_targets:
          - node_name: image
            property_name: ./fileReference
            accept: ["image/.*"]
            groups: [media]
      - kind: ChildEditConfig
        actions: [edit]
"#;

    fn render(handler: &dyn Handler, scope: Scope, terminate_on: &str) -> (TargetTree, Result<()>) {
        let ctx = build_context(YAML, terminate_on);
        let chains = HandlerChains::default();
        let hctx = HandlerContext::new(&ctx, &chains, scope);
        let mut tree = TargetTree::new("jcr:root");
        let root = tree.root();
        let result = handler.apply(type_source(&ctx, "app.Teaser"), &mut tree, root, &hctx);
        (tree, result)
    }

    #[test]
    fn test_edit_config_tree() {
        let (tree, result) = render(&EditConfigHandler, Scope::EditConfig, "");
        assert!(result.is_ok());
        let root = tree.root();
        assert_eq!(attr(&tree, root, PRIMARY_TYPE).as_deref(), Some(EDIT_CONFIG));
        assert_eq!(attr(&tree, root, "cq:actions").as_deref(), Some("[edit,copymove,delete]"));
        assert_eq!(attr(&tree, root, "cq:emptyText").as_deref(), Some("Drag an image"));

        let listeners = tree.find(root, "cq:listeners").unwrap();
        assert_eq!(attr(&tree, listeners, "afteredit").as_deref(), Some("REFRESH_PAGE"));
        assert!(attr(&tree, listeners, "afterdelete").is_none());

        let image = tree.find(root, "cq:dropTargets/image").unwrap();
        assert_eq!(attr(&tree, image, "accept").as_deref(), Some("[image/.*]"));
        assert_eq!(attr(&tree, image, "propertyName").as_deref(), Some("./fileReference"));
    }

    #[test]
    fn test_malformed_listener_is_illegal_argument() {
        let (_, result) = render(&EditConfigHandler, Scope::EditConfig, "IllegalArgument");
        assert_eq!(result.unwrap_err().root_cause().kind_name(), "IllegalArgument");
    }

    #[test]
    fn test_child_edit_config() {
        let (tree, result) = render(&ChildEditConfigHandler, Scope::ChildEditConfig, "");
        assert!(result.is_ok());
        let root = tree.root();
        assert_eq!(attr(&tree, root, "cq:actions").as_deref(), Some("[edit]"));
        assert!(tree.find(root, "cq:listeners").is_none());
    }
}
