//! Member discovery
//!
//! Collects the renderable members of a type across its whole hierarchy and
//! hands them to the ranking resolver. Walk order is supertypes first, so the
//! resolver's encounter order already favours ancestors.

use tracing::debug;

use crate::context::BuildContext;
use crate::error::{PluginError, Result};
use crate::index::TypeId;
use crate::model::{MemberKind, MemberRef};
use crate::ordering::{resolve_member_order, MemberKey, MemberRanking};
use crate::source::Source;

/// Ordered renderable members of `ty`.
///
/// Skipped: static fields, members marked `Ignore`, members named by an
/// `IgnoreMembers` record anywhere in the hierarchy, and members without a
/// widget or container annotation. A method redeclared by a descendant
/// replaces the ancestor declaration.
pub fn ordered_members(ctx: &BuildContext, ty: TypeId) -> Result<Vec<Source<'_>>> {
    let index = ctx.index();
    let linear = index.linearize(ty);

    let ignored: Vec<&MemberRef> = linear
        .iter()
        .flat_map(|&t| Source::for_type(index, t).annotations().ignored_members())
        .collect();

    let mut found: Vec<Source<'_>> = Vec::new();
    for &declaring in linear {
        for member in &index.get(declaring).members {
            let source = Source::for_member(index, declaring, member);
            let annotations = source.annotations();
            if member.is_static && member.kind == MemberKind::Field {
                continue;
            }
            if annotations.is_ignored() || !annotations.is_renderable() {
                continue;
            }
            if ignored.iter().any(|r| refers_to(ctx, r, &source)) {
                debug!(member = %source, "member ignored by type-level IgnoreMembers");
                continue;
            }
            found.push(source);
        }
    }

    let rankings = build_rankings(ctx, &found)?;
    let resolution = resolve_member_order(&rankings, index);

    for (replacer, replaced) in &resolution.replaced {
        debug!(replacer = %found[*replacer], replaced = %found[*replaced], "member replaced");
    }
    for (first, second) in &resolution.broken {
        ctx.report(PluginError::invalid_layout(format!(
            "placement of '{}' relative to '{}' forms a cycle in type {}",
            found[*first],
            found[*second],
            index.name(ty)
        )))?;
    }

    Ok(resolution.order.into_iter().map(|idx| found[idx]).collect())
}

fn build_rankings(ctx: &BuildContext, found: &[Source<'_>]) -> Result<Vec<MemberRanking>> {
    let mut rankings = Vec::with_capacity(found.len());
    for (idx, source) in found.iter().enumerate() {
        let annotations = source.annotations();
        let mut ranking = MemberRanking::new(source.declaring(), source.name());
        ranking.rank = annotations.ranking();

        let explicit = annotations.replace();
        ranking.replace = match explicit {
            Some(r) => member_key(ctx, r),
            None => overridden_method(found, idx).map(|prior| MemberKey::in_type(prior.declaring(), prior.name())),
        };
        if let Some(place) = annotations.place() {
            ranking.before = place.before.as_ref().and_then(|r| member_key(ctx, r));
            ranking.after = place.after.as_ref().and_then(|r| member_key(ctx, r));
        }

        if explicit.is_none() {
            if let Some(prior) = colliding_field(found, idx) {
                ctx.report(PluginError::placement_collision(format!(
                    "field '{}' is declared in both {} and {}",
                    source.name(),
                    prior.declaring_name(),
                    source.declaring_name()
                )))?;
            }
        }
        rankings.push(ranking);
    }
    Ok(rankings)
}

/// An earlier method with the same name, declared by another type.
fn overridden_method<'a>(found: &[Source<'a>], idx: usize) -> Option<Source<'a>> {
    let current = found[idx];
    if current.as_member()?.kind != MemberKind::Method {
        return None;
    }
    found[..idx].iter().rev().copied().find(|prior| {
        prior.name() == current.name()
            && prior.declaring() != current.declaring()
            && prior.as_member().is_some_and(|m| m.kind == MemberKind::Method)
    })
}

fn colliding_field<'a>(found: &[Source<'a>], idx: usize) -> Option<Source<'a>> {
    let current = found[idx];
    if current.as_member()?.kind != MemberKind::Field {
        return None;
    }
    found[..idx].iter().copied().find(|prior| {
        prior.name() == current.name()
            && prior.declaring() != current.declaring()
            && prior.as_member().is_some_and(|m| m.kind == MemberKind::Field)
    })
}

/// Resolve a member reference. An unknown class yields no key, which the
/// resolver treats like a missing member.
fn member_key(ctx: &BuildContext, reference: &MemberRef) -> Option<MemberKey> {
    match reference.class.as_deref() {
        None => Some(MemberKey::named(&reference.name)),
        Some(class) => match ctx.index().lookup(class) {
            Some(id) => Some(MemberKey::in_type(id, &reference.name)),
            None => {
                debug!(reference = %reference, "member reference names an unknown type");
                None
            }
        },
    }
}

fn refers_to(ctx: &BuildContext, reference: &MemberRef, source: &Source<'_>) -> bool {
    reference.name == source.name()
        && reference
            .class
            .as_deref()
            .map_or(true, |class| ctx.index().lookup(class) == Some(source.declaring()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TypeIndex;
    use crate::model::yaml::parse_descriptor_yaml;
    use crate::settings::PluginSettings;
    use pretty_assertions::assert_eq;

    fn context(yaml: &str, terminate_on: &str) -> BuildContext {
        let index = TypeIndex::build(parse_descriptor_yaml(yaml).unwrap().types).unwrap();
        let settings = PluginSettings {
            terminate_on: terminate_on.to_string(),
            ..PluginSettings::default()
        };
        BuildContext::new(index, settings)
    }

    fn names(ctx: &BuildContext, ty: &str) -> Vec<String> {
        let id = ctx.index().lookup(ty).unwrap();
        ordered_members(ctx, id)
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// T-MEM-1: inherited members render before subclass members on rank ties.
    #[test]
    fn t_mem_1_superclass_first_on_ties() {
        let yaml = r#"
types:
  - name: app.Base
    members:
      - name: heading
        annotations:
          - kind: DialogField
            ranking: 0
      - name: subheading
        annotations:
          - kind: TextField
  - name: app.Card
    extends: app.Base
    members:
      - name: image
        annotations: [{ kind: PathField }]
      - name: text
        annotations: [{ kind: TextArea }]
      - name: link
        annotations: [{ kind: PathField }]
"#;
        let ctx = context(yaml, "");
        assert_eq!(
            names(&ctx, "app.Card"),
            vec!["heading", "subheading", "image", "text", "link"]
        );
    }

    /// T-MEM-2: statics, ignored, unannotated and IgnoreMembers members are skipped.
    #[test]
    fn t_mem_2_skipped_members() {
        let yaml = r#"
types:
  - name: app.Base
    members:
      - name: legacy
        annotations: [{ kind: TextField }]
      - name: plain
  - name: app.Card
    extends: app.Base
    annotations:
      - kind: IgnoreMembers
        members: [{ class: app.Base, name: legacy }]
    members:
      - name: CONSTANT
        static: true
        annotations: [{ kind: Hidden }]
      - name: hidden
        annotations: [{ kind: TextField }, { kind: Ignore }]
      - name: title
        annotations: [{ kind: TextField }]
"#;
        let ctx = context(yaml, "");
        assert_eq!(names(&ctx, "app.Card"), vec!["title"]);
    }

    /// T-MEM-3: an overriding method takes the ancestor's slot.
    #[test]
    fn t_mem_3_method_override_replaces() {
        let yaml = r#"
types:
  - name: app.Base
    members:
      - name: getTitle
        kind: method
        annotations: [{ kind: TextField }]
      - name: getText
        kind: method
        annotations: [{ kind: TextArea }]
  - name: app.Card
    extends: app.Base
    members:
      - name: getExtra
        kind: method
        annotations: [{ kind: TextField }]
      - name: getTitle
        kind: method
        annotations: [{ kind: PathField }]
"#;
        let ctx = context(yaml, "");
        let card = ctx.index().lookup("app.Card").unwrap();
        let ordered = ordered_members(&ctx, card).unwrap();
        let rendered: Vec<String> = ordered.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["app.Card#getTitle", "app.Base#getText", "app.Card#getExtra"]
        );
        assert!(ctx.issues().is_empty());
    }

    /// T-MEM-4: same-name fields collide; both are kept and the collision is reported.
    #[test]
    fn t_mem_4_field_collision() {
        let yaml = r#"
types:
  - name: app.Base
    members:
      - name: title
        annotations: [{ kind: TextField }]
  - name: app.Card
    extends: app.Base
    members:
      - name: title
        annotations: [{ kind: TextArea }]
"#;
        let ctx = context(yaml, "");
        assert_eq!(names(&ctx, "app.Card"), vec!["title", "title"]);
        assert_eq!(ctx.issues()[0].kind, "PlacementCollision");

        let strict = context(yaml, "PlacementCollision");
        let card = strict.index().lookup("app.Card").unwrap();
        assert!(ordered_members(&strict, card).unwrap_err().is_abort());
    }

    /// T-MEM-5: explicit replace and placement links across the hierarchy.
    #[test]
    fn t_mem_5_replace_and_place() {
        let yaml = r#"
types:
  - name: app.Base
    members:
      - name: title
        annotations: [{ kind: TextField }]
      - name: text
        annotations: [{ kind: TextArea }]
  - name: app.Card
    extends: app.Base
    members:
      - name: heading
        annotations:
          - kind: TextField
          - kind: Replace
            member: { class: app.Base, name: title }
      - name: link
        annotations:
          - kind: PathField
          - kind: Place
            before: heading
"#;
        let ctx = context(yaml, "");
        assert_eq!(names(&ctx, "app.Card"), vec!["link", "heading", "text"]);
    }

    /// T-MEM-6: a placement cycle is reported as a layout error.
    #[test]
    fn t_mem_6_placement_cycle_reported() {
        let yaml = r#"
types:
  - name: app.Card
    members:
      - name: a
        annotations: [{ kind: TextField }, { kind: Place, after: b }]
      - name: b
        annotations: [{ kind: TextField }, { kind: Place, after: a }]
"#;
        let ctx = context(yaml, "");
        assert_eq!(names(&ctx, "app.Card").len(), 2);
        assert_eq!(ctx.issues()[0].kind, "InvalidLayout");
    }
}
