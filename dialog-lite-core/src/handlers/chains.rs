//! Handler chain composition
//!
//! `for_scope` = property mapping → scope handler (or nothing) → extensions
//! `for_member` = property mapping → matching widget handlers → extensions
//!
//! Widget and extension order is resolved once, when the registry is built:
//! a stable sort on rank, then the before/after links through the
//! [`Graph`](crate::ordering::Graph). Per-source chains filter that order.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::component::ComponentHandler;
use super::dialog::DialogHandler;
use super::edit_config::{ChildEditConfigHandler, EditConfigHandler};
use super::html_tag::HtmlTagHandler;
use super::property::PropertyHandler;
use super::widgets;
use super::{Handler, HandlerContext};
use crate::error::Result;
use crate::ordering::{sort_orderables_with_report, Orderable};
use crate::scope::Scope;
use crate::source::Source;
use crate::target::{TargetId, TargetTree};

/// Ordered handlers selected for one source and scope.
#[derive(Debug)]
pub struct Chain<'h> {
    handlers: Vec<&'h dyn Handler>,
}

impl<'h> Chain<'h> {
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> Vec<&'h str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run every handler in order against the same target. Stops only when
    /// a handler returns an escalated error.
    pub fn run(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        for handler in &self.handlers {
            debug!(handler = handler.name(), source = %source, scope = %ctx.scope(), "applying handler");
            handler.apply(source, tree, target, ctx)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct HandlerChains {
    property: PropertyHandler,
    scope_handlers: HashMap<Scope, Box<dyn Handler>>,
    /// Built-in widget handlers in resolved order
    widgets: Vec<Box<dyn Handler>>,
    /// User handlers in resolved order
    extensions: Vec<Box<dyn Handler>>,
}

impl Default for HandlerChains {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HandlerChains {
    pub fn builder() -> HandlerChainsBuilder {
        HandlerChainsBuilder::default()
    }

    pub fn for_scope(&self, source: Source<'_>, scope: Scope) -> Chain<'_> {
        let mut handlers: Vec<&dyn Handler> = Vec::new();
        handlers.push(&self.property);
        if let Some(handler) = self.scope_handlers.get(&scope) {
            handlers.push(handler.as_ref());
        }
        handlers.extend(matching(&self.extensions, source, scope));
        Chain { handlers }
    }

    pub fn for_member(&self, source: Source<'_>, scope: Scope) -> Chain<'_> {
        let mut handlers: Vec<&dyn Handler> = Vec::new();
        handlers.push(&self.property);
        handlers.extend(matching(&self.widgets, source, scope));
        handlers.extend(matching(&self.extensions, source, scope));
        Chain { handlers }
    }

    /// Widget handler names in resolved order.
    pub fn widget_order(&self) -> Vec<&str> {
        self.widgets.iter().map(|h| h.name()).collect()
    }

    /// Extension handler names in resolved order.
    pub fn extension_order(&self) -> Vec<&str> {
        self.extensions.iter().map(|h| h.name()).collect()
    }
}

/// Handlers of `pool` declaring `scope` whose annotation is on `source`.
fn matching<'h>(pool: &'h [Box<dyn Handler>], source: Source<'_>, scope: Scope) -> Vec<&'h dyn Handler> {
    let annotations = source.annotations();
    pool.iter()
        .map(|h| h.as_ref())
        .filter(|h| h.scopes().contains(&scope) && annotations.has(&h.handles()))
        .collect()
}

#[derive(Debug, Default)]
pub struct HandlerChainsBuilder {
    extensions: Vec<Box<dyn Handler>>,
}

impl HandlerChainsBuilder {
    /// Register a user handler for its `Custom` marker.
    pub fn register(mut self, handler: impl Handler + 'static) -> Self {
        self.extensions.push(Box::new(handler));
        self
    }

    pub fn build(self) -> HandlerChains {
        let mut scope_handlers: HashMap<Scope, Box<dyn Handler>> = HashMap::new();
        scope_handlers.insert(Scope::Component, Box::new(ComponentHandler));
        scope_handlers.insert(Scope::Dialog, Box::new(DialogHandler::dialog()));
        scope_handlers.insert(Scope::DesignDialog, Box::new(DialogHandler::design_dialog()));
        scope_handlers.insert(Scope::EditConfig, Box::new(EditConfigHandler));
        scope_handlers.insert(Scope::ChildEditConfig, Box::new(ChildEditConfigHandler));
        scope_handlers.insert(Scope::HtmlTag, Box::new(HtmlTagHandler));

        HandlerChains {
            property: PropertyHandler,
            scope_handlers,
            widgets: order_handlers(widgets::builtin()),
            extensions: order_handlers(self.extensions),
        }
    }
}

/// Rank first (stable), then before/after links. Broken links are logged.
pub fn order_handlers(mut handlers: Vec<Box<dyn Handler>>) -> Vec<Box<dyn Handler>> {
    handlers.sort_by_key(|h| h.rank());

    let nodes: Vec<Orderable<Box<dyn Handler>>> = handlers
        .into_iter()
        .map(|handler| {
            let name = handler.name().to_string();
            let before = handler.before().map(str::to_string);
            let after = handler.after().map(str::to_string);
            let mut node = Orderable::new(name, handler);
            if let Some(before) = before {
                node.set_before(before);
            }
            if let Some(after) = after {
                node.set_after(after);
            }
            node
        })
        .collect();

    let (sorted, broken) = sort_orderables_with_report(nodes);
    for constraint in broken {
        warn!(
            before = %constraint.before,
            after = %constraint.after,
            "handler ordering cycle; constraint not honoured"
        );
    }
    sorted.into_iter().map(Orderable::into_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{build_context, member_source, type_source};
    use crate::model::AnnotationKind;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Marker {
        name: &'static str,
        marker: &'static str,
        rank: i32,
        before: Option<&'static str>,
        after: Option<&'static str>,
    }

    impl Marker {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                marker: "Tracking",
                rank: 0,
                before: None,
                after: None,
            }
        }
    }

    impl Handler for Marker {
        fn name(&self) -> &str {
            self.name
        }

        fn handles(&self) -> AnnotationKind {
            AnnotationKind::Custom(self.marker.to_string())
        }

        fn scopes(&self) -> &[Scope] {
            &[Scope::Dialog, Scope::Component]
        }

        fn rank(&self) -> i32 {
            self.rank
        }

        fn before(&self) -> Option<&str> {
            self.before
        }

        fn after(&self) -> Option<&str> {
            self.after
        }

        fn apply(
            &self,
            _source: Source<'_>,
            tree: &mut TargetTree,
            target: TargetId,
            _ctx: &HandlerContext<'_>,
        ) -> Result<()> {
            let trail = tree
                .attr(target, "trail")
                .and_then(|v| v.as_str())
                .map(|s| format!("{},{}", s, self.name))
                .unwrap_or_else(|| self.name.to_string());
            tree.set_attr(target, "trail", trail);
            Ok(())
        }
    }

    const YAML: &str = r#"
types:
  - name: app.Teaser
    annotations:
      - kind: AemComponent
        path: content/teaser
        title: Teaser
      - kind: Custom
        name: Tracking
    members:
      - name: title
        annotations:
          - kind: DialogField
            label: Title
          - kind: TextField
          - kind: Custom
            name: Tracking
      - name: plain
        annotations:
          - kind: Hidden
"#;

    /// T-CHAIN-1: scope chain = property → scope handler → extensions.
    #[test]
    fn t_chain_1_scope_chain_shape() {
        let ctx = build_context(YAML, "");
        let chains = HandlerChains::builder().register(Marker::new("Audit")).build();
        let teaser = type_source(&ctx, "app.Teaser");

        let chain = chains.for_scope(teaser, Scope::Component);
        assert_eq!(chain.names(), vec!["Property", "Component", "Audit"]);

        // No extension for a scope the handler does not declare
        let chain = chains.for_scope(teaser, Scope::EditConfig);
        assert_eq!(chain.names(), vec!["Property", "EditConfig"]);

        // Unhandled scope resolves to the property mapper alone
        let chain = chains.for_scope(teaser, Scope::Default);
        assert_eq!(chain.names(), vec!["Property"]);
    }

    /// T-CHAIN-2: member chain selects only widgets whose annotation is present.
    #[test]
    fn t_chain_2_member_chain_filters() {
        let ctx = build_context(YAML, "");
        let chains = HandlerChains::builder().register(Marker::new("Audit")).build();

        let title = member_source(&ctx, "app.Teaser", "title");
        assert_eq!(
            chains.for_member(title, Scope::Dialog).names(),
            vec!["Property", "DialogField", "TextField", "Audit"]
        );

        let plain = member_source(&ctx, "app.Teaser", "plain");
        assert_eq!(
            chains.for_member(plain, Scope::Dialog).names(),
            vec!["Property", "Hidden"]
        );
        assert_eq!(chains.for_member(plain, Scope::Component).names(), vec!["Property"]);
    }

    /// T-CHAIN-3: extension order honours rank then before/after names.
    #[test]
    fn t_chain_3_extension_ordering() {
        let late = Marker {
            rank: 10,
            ..Marker::new("Late")
        };
        let first = Marker {
            before: Some("Second"),
            ..Marker::new("First")
        };
        let chains = HandlerChains::builder()
            .register(late)
            .register(Marker::new("Second"))
            .register(first)
            .build();
        assert_eq!(chains.extension_order(), vec!["First", "Second", "Late"]);
    }

    /// T-CHAIN-4: handlers run in order and see each other's mutations.
    #[test]
    fn t_chain_4_sequential_mutation() {
        let ctx = build_context(YAML, "");
        let chains = HandlerChains::builder()
            .register(Marker {
                after: Some("B"),
                ..Marker::new("A")
            })
            .register(Marker::new("B"))
            .build();
        let teaser = type_source(&ctx, "app.Teaser");
        let hctx = HandlerContext::new(&ctx, &chains, Scope::Component);
        let mut tree = TargetTree::new("jcr:root");
        let root = tree.root();
        chains
            .for_scope(teaser, Scope::Component)
            .run(teaser, &mut tree, root, &hctx)
            .unwrap();
        assert_eq!(tree.attr(root, "trail").and_then(|v| v.as_str()), Some("B,A"));
        assert_eq!(
            tree.attr(root, "jcr:primaryType").and_then(|v| v.as_str()),
            Some("cq:Component")
        );
    }

    /// T-CHAIN-5: built-in widget order is stable and starts with the common field handler.
    #[test]
    fn t_chain_5_builtin_widget_order() {
        let chains = HandlerChains::default();
        let order = chains.widget_order();
        assert_eq!(order.first(), Some(&"DialogField"));
        assert_eq!(order.len(), widgets::builtin().len());
    }
}
