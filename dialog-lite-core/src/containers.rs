//! Container builders
//!
//! A dialog has one top-level container (single column, tabs, accordion or
//! fixed columns) whose sections receive the ordered members of the type.
//! A member carrying `Tabs` / `Accordion` is a nested container: it renders
//! as a node of that layout and its sections receive other members of the
//! same type through `Place.section`.
//!
//! Section lookup by title searches the top-level container first, then the
//! nested containers in member order.

use std::fmt::Display;

use tracing::debug;

use crate::error::{PluginError, Result};
use crate::handlers::{
    HandlerContext, NT_UNSTRUCTURED, PRIMARY_TYPE, RESOURCE_TYPE, RT_ACCORDION, RT_CONTAINER,
    RT_FIXED_COLUMNS, RT_TABS,
};
use crate::index::TypeId;
use crate::members::ordered_members;
use crate::model::{Annotation, SectionDef};
use crate::source::Source;
use crate::target::{TargetId, TargetTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Fixed,
    Tabs,
    Accordion,
    FixedColumns,
}

impl Layout {
    pub fn resource_type(self) -> &'static str {
        match self {
            Layout::Fixed => RT_CONTAINER,
            Layout::Tabs => RT_TABS,
            Layout::Accordion => RT_ACCORDION,
            Layout::FixedColumns => RT_FIXED_COLUMNS,
        }
    }

    /// Node name of a top-level container under `content/items`.
    pub fn node_name(self) -> &'static str {
        match self {
            Layout::Fixed => "column",
            Layout::Tabs => "tabs",
            Layout::Accordion => "accordion",
            Layout::FixedColumns => "columns",
        }
    }
}

#[derive(Debug, Clone)]
struct Container {
    layout: Layout,
    sections: Vec<SectionDef>,
    /// Member owning a nested container; `None` for the top level
    owner: Option<usize>,
}

impl Container {
    /// Single untitled section. No `Place.section` can address it.
    fn fixed(owner: Option<usize>) -> Self {
        Self {
            layout: Layout::Fixed,
            sections: vec![SectionDef::new("")],
            owner,
        }
    }

    fn section(&self, title: &str) -> Option<usize> {
        self.sections.iter().position(|s| {
            let candidate = s.title.trim();
            !candidate.is_empty() && candidate == title
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    container: usize,
    section: usize,
}

const DEFAULT_SLOT: Slot = Slot {
    container: 0,
    section: 0,
};

/// Build the dialog layout for `ty` under `root` and render every member.
pub fn build_layout(
    ctx: &HandlerContext<'_>,
    ty: TypeId,
    tree: &mut TargetTree,
    root: TargetId,
) -> Result<()> {
    let index = ctx.build().index();

    // Most-derived declaration wins
    let declared = index
        .linearize(ty)
        .iter()
        .rev()
        .find_map(|&t| Source::for_type(index, t).annotations().container());
    let top = match declared {
        Some(annotation) => container_of(ctx, annotation, None, index.name(ty))?,
        None => Container::fixed(None),
    };
    debug!(ty = index.name(ty), layout = ?top.layout, "building dialog layout");

    let content = tree.get_or_create(root, "content");
    tree.set_attr(content, PRIMARY_TYPE, NT_UNSTRUCTURED);
    tree.set_attr(content, RESOURCE_TYPE, RT_CONTAINER);
    let items = tree.get_or_create(content, "items");
    tree.set_attr(items, PRIMARY_TYPE, NT_UNSTRUCTURED);
    let node = tree.get_or_create(items, top.layout.node_name());
    let slots = fill_sections(tree, node, &top);

    place_members(ctx, ty, tree, top, slots)
}

/// Render the members of `ty` into a single `items` node. Used by widgets
/// that embed another described type (field sets, composite multifields).
pub fn render_members(
    ctx: &HandlerContext<'_>,
    ty: TypeId,
    tree: &mut TargetTree,
    items: TargetId,
) -> Result<()> {
    place_members(ctx, ty, tree, Container::fixed(None), vec![items])
}

/// Read a container annotation. Tabs and accordions without sections are
/// reported and become a single column.
fn container_of(
    ctx: &HandlerContext<'_>,
    annotation: &Annotation,
    owner: Option<usize>,
    location: impl Display,
) -> Result<Container> {
    let (layout, sections) = match annotation {
        Annotation::Tabs { tabs } => (Layout::Tabs, tabs),
        Annotation::Accordion { panels } => (Layout::Accordion, panels),
        Annotation::FixedColumns { columns } => (Layout::FixedColumns, columns),
        _ => return Ok(Container::fixed(owner)),
    };
    if sections.is_empty() {
        if layout != Layout::FixedColumns {
            ctx.report(PluginError::invalid_container(format!(
                "no tabs defined for the {:?} container of {}",
                layout, location
            )))?;
        }
        return Ok(Container::fixed(owner));
    }
    Ok(Container {
        layout,
        sections: sections.clone(),
        owner,
    })
}

/// Decorate `node` as `container` and create one `items` node per section.
fn fill_sections(tree: &mut TargetTree, node: TargetId, container: &Container) -> Vec<TargetId> {
    tree.set_attr(node, PRIMARY_TYPE, NT_UNSTRUCTURED);
    tree.set_attr(node, RESOURCE_TYPE, container.layout.resource_type());
    if container.layout == Layout::Tabs {
        tree.set_attr(node, "maximized", true);
    }
    let items = tree.get_or_create(node, "items");
    tree.set_attr(items, PRIMARY_TYPE, NT_UNSTRUCTURED);
    if container.layout == Layout::Fixed {
        return vec![items];
    }

    let mut slots = Vec::with_capacity(container.sections.len());
    for section in &container.sections {
        let tab = tree.create_child(items, section.title.trim());
        tree.set_attr(tab, PRIMARY_TYPE, NT_UNSTRUCTURED);
        tree.set_attr(tab, RESOURCE_TYPE, RT_CONTAINER);
        tree.set_attr(tab, "jcr:title", section.title.trim());
        if container.layout == Layout::Accordion && section.expanded {
            let config = tree.get_or_create(tab, "parentConfig");
            tree.set_attr(config, PRIMARY_TYPE, NT_UNSTRUCTURED);
            tree.set_attr(config, "expanded", true);
        }
        let tab_items = tree.get_or_create(tab, "items");
        tree.set_attr(tab_items, PRIMARY_TYPE, NT_UNSTRUCTURED);
        slots.push(tab_items);
    }
    slots
}

fn place_members(
    ctx: &HandlerContext<'_>,
    ty: TypeId,
    tree: &mut TargetTree,
    top: Container,
    top_slots: Vec<TargetId>,
) -> Result<()> {
    let members = ordered_members(ctx.build(), ty)?;

    let mut containers = vec![top];
    let mut owned = vec![None; members.len()];
    for (i, member) in members.iter().enumerate() {
        if let Some(annotation) = member.annotations().container() {
            owned[i] = Some(containers.len());
            containers.push(container_of(ctx, annotation, Some(i), member)?);
        }
    }

    let slots = assign_slots(ctx, ty, &members, &containers)?;
    let plan = Plan {
        members,
        containers,
        owned,
        slots,
    };
    plan.render(ctx, tree, 0, &top_slots)
}

/// Resolve every member's `Place.section`, then move members caught in an
/// ownership cycle back to the default slot.
fn assign_slots(
    ctx: &HandlerContext<'_>,
    ty: TypeId,
    members: &[Source<'_>],
    containers: &[Container],
) -> Result<Vec<Slot>> {
    let mut slots = Vec::with_capacity(members.len());
    for member in members {
        let requested = member
            .annotations()
            .place()
            .and_then(|p| p.section.as_deref())
            .map(str::trim)
            .filter(|title| !title.is_empty());
        let slot = match requested {
            None => DEFAULT_SLOT,
            Some(title) => match find_section(containers, title) {
                Some(slot) => slot,
                None => {
                    ctx.report(PluginError::invalid_container(format!(
                        "section '{}' requested by {} is not defined by any container of {}",
                        title,
                        member,
                        ctx.build().index().name(ty)
                    )))?;
                    DEFAULT_SLOT
                }
            },
        };
        slots.push(slot);
    }

    for i in 0..members.len() {
        if leads_back(i, &slots, containers) {
            ctx.report(PluginError::invalid_layout(format!(
                "member '{}' of {} is placed inside itself through nested containers",
                members[i].name(),
                members[i].declaring_name()
            )))?;
            slots[i] = DEFAULT_SLOT;
        }
    }
    Ok(slots)
}

fn find_section(containers: &[Container], title: &str) -> Option<Slot> {
    containers.iter().enumerate().find_map(|(container, c)| {
        c.section(title).map(|section| Slot { container, section })
    })
}

/// Whether walking the owners upward from `member`'s slot reaches `member`.
fn leads_back(member: usize, slots: &[Slot], containers: &[Container]) -> bool {
    let mut container = slots[member].container;
    for _ in 0..=slots.len() {
        match containers[container].owner {
            None => return false,
            Some(owner) if owner == member => return true,
            Some(owner) => container = slots[owner].container,
        }
    }
    false
}

struct Plan<'a> {
    members: Vec<Source<'a>>,
    containers: Vec<Container>,
    /// Member index → nested container index
    owned: Vec<Option<usize>>,
    slots: Vec<Slot>,
}

impl Plan<'_> {
    /// Render the members of `container`, section by section. A nested
    /// container renders its own members before its owner's handler chain.
    fn render(
        &self,
        ctx: &HandlerContext<'_>,
        tree: &mut TargetTree,
        container: usize,
        section_items: &[TargetId],
    ) -> Result<()> {
        for (section, &items) in section_items.iter().enumerate() {
            let here = Slot { container, section };
            for (i, member) in self.members.iter().enumerate() {
                if self.slots[i] != here {
                    continue;
                }
                let node = tree.create_child(items, &member.field_name());
                tree.set_attr(node, PRIMARY_TYPE, NT_UNSTRUCTURED);
                if let Some(nested) = self.owned[i] {
                    let nested_items = fill_sections(tree, node, &self.containers[nested]);
                    self.render(ctx, tree, nested, &nested_items)?;
                }
                ctx.chains()
                    .for_member(*member, ctx.scope())
                    .run(*member, tree, node, ctx)?;
            }
        }
        Ok(())
    }
}
