//! Built-in dialog widgets
//!
//! Each widget handler decorates the member's node with its Granite UI
//! resource type and the attributes of its annotation record. `DialogField`
//! carries the attributes common to every field and runs first.

use super::{Handler, HandlerContext, NT_UNSTRUCTURED, PRIMARY_TYPE, RESOURCE_TYPE, RT_CONTAINER};
use crate::containers;
use crate::error::{PluginError, Result};
use crate::index::TypeId;
use crate::model::{Annotation, AnnotationKind};
use crate::source::Source;
use crate::target::{AttrValue, TargetId, TargetTree};

// ── Resource types ──

pub const RT_TEXTFIELD: &str = "granite/ui/components/coral/foundation/form/textfield";
pub const RT_TEXTAREA: &str = "granite/ui/components/coral/foundation/form/textarea";
pub const RT_CHECKBOX: &str = "granite/ui/components/coral/foundation/form/checkbox";
pub const RT_SELECT: &str = "granite/ui/components/coral/foundation/form/select";
pub const RT_NUMBERFIELD: &str = "granite/ui/components/coral/foundation/form/numberfield";
pub const RT_HIDDEN: &str = "granite/ui/components/coral/foundation/form/hidden";
pub const RT_PATHFIELD: &str = "granite/ui/components/coral/foundation/form/pathfield";
pub const RT_FIELDSET: &str = "granite/ui/components/coral/foundation/form/fieldset";
pub const RT_MULTIFIELD: &str = "granite/ui/components/coral/foundation/form/multifield";

/// Built-in widget handlers, unordered. The registry orders them.
pub fn builtin() -> Vec<Box<dyn Handler>> {
    vec![
        Box::new(DialogFieldHandler),
        Box::new(TextFieldHandler),
        Box::new(TextAreaHandler),
        Box::new(CheckboxHandler),
        Box::new(SelectHandler),
        Box::new(NumberFieldHandler),
        Box::new(HiddenHandler),
        Box::new(PathFieldHandler),
        Box::new(FieldSetHandler),
        Box::new(MultiFieldHandler),
    ]
}

// ── Helpers ──

/// `./<prefix><name>` unless an earlier handler already named the field.
fn ensure_name(source: Source<'_>, tree: &mut TargetTree, target: TargetId, ctx: &HandlerContext<'_>) {
    if tree.attr(target, "name").is_none() {
        tree.set_attr(target, "name", field_path(ctx, &source.field_name()));
    }
}

fn field_path(ctx: &HandlerContext<'_>, name: &str) -> String {
    format!("./{}{}", ctx.name_prefix(), name.trim_start_matches("./"))
}

fn widget(tree: &mut TargetTree, target: TargetId, resource_type: &str) {
    tree.set_attr(target, PRIMARY_TYPE, NT_UNSTRUCTURED);
    tree.set_attr(target, RESOURCE_TYPE, resource_type);
}

/// First annotation matching `pick` on `source`.
fn record<'a, T>(source: Source<'a>, pick: impl Fn(&'a Annotation) -> Option<&'a T>) -> Option<&'a T> {
    source.annotations().iter().find_map(pick)
}

/// Value type of a member embedding another described type, checked for
/// resolution and for recursion through a type already being rendered.
fn embedded_type(source: Source<'_>, ctx: &HandlerContext<'_>) -> Result<Option<TypeId>> {
    let Some(name) = source.value_type_name() else {
        ctx.report(PluginError::validation(format!(
            "{} embeds members but declares no value type",
            source
        )))?;
        return Ok(None);
    };
    let Some(ty) = source.value_type() else {
        ctx.report(PluginError::validation(format!(
            "value type '{}' of {} is not a described type",
            name, source
        )))?;
        return Ok(None);
    };
    if ctx.is_rendering(ty) {
        let index = source.index();
        let chain: Vec<&str> = ctx.rendering_stack().iter().map(|&t| index.name(t)).collect();
        ctx.report(PluginError::invalid_layout(format!(
            "{} of {} recursively embeds {} (rendering {})",
            source.name(),
            source.declaring_name(),
            name,
            chain.join(" -> ")
        )))?;
        return Ok(None);
    }
    Ok(Some(ty))
}

// ── DialogField ──

/// Attributes common to every field.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogFieldHandler;

impl Handler for DialogFieldHandler {
    fn name(&self) -> &str {
        "DialogField"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::DialogField
    }

    fn rank(&self) -> i32 {
        -10
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = source.annotations().dialog_field() else {
            return Ok(());
        };
        let name = match def.name.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => source.field_name(),
        };
        tree.set_attr(target, "name", field_path(ctx, &name));
        tree.set_opt(target, "fieldLabel", def.label.as_deref());
        tree.set_opt(target, "fieldDescription", def.description.as_deref());
        tree.set_flag(target, "required", def.required);
        tree.set_flag(target, "disabled", def.disabled);
        if let Some(value) = &def.default_value {
            tree.set_attr(target, "value", AttrValue::from(value));
        }
        Ok(())
    }
}

// ── Text inputs ──

#[derive(Debug, Clone, Copy, Default)]
pub struct TextFieldHandler;

impl Handler for TextFieldHandler {
    fn name(&self) -> &str {
        "TextField"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::TextField
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::TextField(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_TEXTFIELD);
        ensure_name(source, tree, target, ctx);
        tree.set_opt(target, "emptyText", def.empty_text.as_deref());
        match def.max_length {
            Some(n) if n <= 0 => ctx.report(PluginError::validation(format!(
                "maxLength of {} must be positive, got {}",
                source, n
            )))?,
            other => tree.set_opt(target, "maxlength", other),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextAreaHandler;

impl Handler for TextAreaHandler {
    fn name(&self) -> &str {
        "TextArea"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::TextArea
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::TextArea(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_TEXTAREA);
        ensure_name(source, tree, target, ctx);
        tree.set_opt(target, "emptyText", def.empty_text.as_deref());
        match def.rows {
            Some(rows) if rows < 1 => ctx.report(PluginError::validation(format!(
                "rows of {} must be at least 1, got {}",
                source, rows
            )))?,
            other => tree.set_opt(target, "rows", other),
        }
        tree.set_opt(target, "maxlength", def.max_length.filter(|n| *n > 0));
        tree.set_flag(target, "autofit", def.autofit);
        Ok(())
    }
}

// ── Choice inputs ──

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckboxHandler;

impl Handler for CheckboxHandler {
    fn name(&self) -> &str {
        "Checkbox"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::Checkbox
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::Checkbox(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_CHECKBOX);
        ensure_name(source, tree, target, ctx);
        tree.set_opt(target, "text", def.text.as_deref());
        tree.set_flag(target, "checked", def.checked);
        tree.set_attr(target, "value", def.value.as_deref().unwrap_or("true"));
        tree.set_attr(
            target,
            "uncheckedValue",
            def.unchecked_value.as_deref().unwrap_or("false"),
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectHandler;

impl Handler for SelectHandler {
    fn name(&self) -> &str {
        "Select"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::Select
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::Select(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_SELECT);
        ensure_name(source, tree, target, ctx);
        tree.set_flag(target, "multiple", def.multiple);
        tree.set_opt(target, "emptyText", def.empty_text.as_deref());

        let items = tree.get_or_create(target, "items");
        tree.set_attr(items, PRIMARY_TYPE, NT_UNSTRUCTURED);
        for option in &def.options {
            let value = option.value.trim();
            if value.is_empty() {
                ctx.report(PluginError::validation(format!(
                    "option '{}' of {} has a blank value",
                    option.text, source
                )))?;
                continue;
            }
            let node = tree.create_child(items, value);
            tree.set_attr(node, PRIMARY_TYPE, NT_UNSTRUCTURED);
            tree.set_attr(node, "text", option.text.as_str());
            tree.set_attr(node, "value", value);
            tree.set_flag(node, "selected", option.selected);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberFieldHandler;

impl Handler for NumberFieldHandler {
    fn name(&self) -> &str {
        "NumberField"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::NumberField
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::NumberField(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_NUMBERFIELD);
        ensure_name(source, tree, target, ctx);
        match (def.min, def.max) {
            (Some(min), Some(max)) if min > max => ctx.report(PluginError::validation(format!(
                "min {} of {} exceeds max {}",
                min, source, max
            )))?,
            (min, max) => {
                tree.set_opt(target, "min", min);
                tree.set_opt(target, "max", max);
            }
        }
        tree.set_opt(target, "step", def.step);
        Ok(())
    }
}

// ── Path and hidden inputs ──

#[derive(Debug, Clone, Copy, Default)]
pub struct HiddenHandler;

impl Handler for HiddenHandler {
    fn name(&self) -> &str {
        "Hidden"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::Hidden
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::Hidden(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_HIDDEN);
        ensure_name(source, tree, target, ctx);
        tree.set_opt(target, "value", def.value.as_deref());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PathFieldHandler;

impl Handler for PathFieldHandler {
    fn name(&self) -> &str {
        "PathField"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::PathField
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::PathField(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_PATHFIELD);
        ensure_name(source, tree, target, ctx);
        tree.set_opt(target, "rootPath", def.root_path.as_deref());
        tree.set_opt(target, "emptyText", def.empty_text.as_deref());
        Ok(())
    }
}

// ── Embedding widgets ──

/// Renders the members of the member's value type inline, optionally
/// prefixing their names.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSetHandler;

impl Handler for FieldSetHandler {
    fn name(&self) -> &str {
        "FieldSet"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::FieldSet
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::FieldSet(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_FIELDSET);
        tree.set_opt(target, "jcr:title", def.title.as_deref());
        let Some(ty) = embedded_type(source, ctx)? else {
            return Ok(());
        };
        let items = tree.get_or_create(target, "items");
        tree.set_attr(items, PRIMARY_TYPE, NT_UNSTRUCTURED);
        let prefix = def.name_prefix.as_deref().unwrap_or_default();
        containers::render_members(&ctx.nested(ty, prefix), ty, tree, items)
    }
}

/// Repeatable field. Composite multifields render the value type's members
/// inside the `field` container; simple ones repeat a text field.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiFieldHandler;

impl Handler for MultiFieldHandler {
    fn name(&self) -> &str {
        "MultiField"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::MultiField
    }

    fn apply(
        &self,
        source: Source<'_>,
        tree: &mut TargetTree,
        target: TargetId,
        ctx: &HandlerContext<'_>,
    ) -> Result<()> {
        let Some(def) = record(source, |a| match a {
            Annotation::MultiField(def) => Some(def),
            _ => None,
        }) else {
            return Ok(());
        };
        widget(tree, target, RT_MULTIFIELD);
        tree.set_flag(target, "composite", def.composite);
        tree.set_opt(target, "deleteHint", def.delete_hint);

        let name = field_path(ctx, &source.field_name());
        let field = tree.get_or_create(target, "field");
        tree.set_attr(field, PRIMARY_TYPE, NT_UNSTRUCTURED);
        tree.set_attr(field, "name", name);
        if !def.composite {
            tree.set_attr(field, RESOURCE_TYPE, RT_TEXTFIELD);
            return Ok(());
        }

        tree.set_attr(field, RESOURCE_TYPE, RT_CONTAINER);
        let Some(ty) = embedded_type(source, ctx)? else {
            return Ok(());
        };
        let items = tree.get_or_create(field, "items");
        tree.set_attr(items, PRIMARY_TYPE, NT_UNSTRUCTURED);
        containers::render_members(&ctx.nested(ty, ""), ty, tree, items)
    }
}
