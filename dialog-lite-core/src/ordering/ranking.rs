//! Member ranking and placement resolution
//!
//! Turns the members of one type hierarchy into render order:
//!
//! 1. `replace` links are applied first (ancestor-declared replacers first).
//!    A replacer takes the replaced member's slot, its tie-break type, and
//!    its rank unless the replacer declares one.
//! 2. Members are sorted by rank; equal ranks keep ancestor-declared members
//!    ahead of descendant-declared ones, otherwise encounter order.
//! 3. `before` / `after` links are layered on top through the [`Graph`].

use tracing::debug;

use super::graph::Graph;
use super::orderable::Orderable;
use crate::index::TypeId;

/// Supertype relation the resolver needs for tie-breaking.
pub trait Hierarchy {
    /// `true` when `ancestor` is a proper supertype of `descendant`.
    fn is_ancestor(&self, ancestor: TypeId, descendant: TypeId) -> bool;
}

/// Reference to a member by name, optionally pinned to a declaring type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberKey {
    pub declaring: Option<TypeId>,
    pub name: String,
}

impl MemberKey {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            declaring: None,
            name: name.into(),
        }
    }

    pub fn in_type(declaring: TypeId, name: impl Into<String>) -> Self {
        Self {
            declaring: Some(declaring),
            name: name.into(),
        }
    }
}

/// Ordering-relevant facts about one member.
#[derive(Debug, Clone)]
pub struct MemberRanking {
    pub name: String,
    pub declaring: TypeId,
    pub rank: Option<i32>,
    pub replace: Option<MemberKey>,
    pub before: Option<MemberKey>,
    pub after: Option<MemberKey>,
}

impl MemberRanking {
    pub fn new(declaring: TypeId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring,
            rank: None,
            replace: None,
            before: None,
            after: None,
        }
    }

    pub fn with_rank(mut self, rank: i32) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn replacing(mut self, key: MemberKey) -> Self {
        self.replace = Some(key);
        self
    }

    pub fn placed_before(mut self, key: MemberKey) -> Self {
        self.before = Some(key);
        self
    }

    pub fn placed_after(mut self, key: MemberKey) -> Self {
        self.after = Some(key);
        self
    }

    fn matches(&self, key: &MemberKey) -> bool {
        self.name == key.name && key.declaring.map_or(true, |d| d == self.declaring)
    }
}

/// Outcome of [`resolve_member_order`]. All values are indices into the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Surviving members in render order
    pub order: Vec<usize>,
    /// `(replacer, replaced)` pairs that were applied
    pub replaced: Vec<(usize, usize)>,
    /// `(first, second)` placement constraints a cycle forced to break
    pub broken: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
struct Slot {
    member: usize,
    slot: usize,
    tie_type: TypeId,
    rank: i32,
}

/// Resolve the render order of `members`, given in encounter order.
pub fn resolve_member_order(members: &[MemberRanking], hierarchy: &impl Hierarchy) -> Resolution {
    let mut live: Vec<Slot> = members
        .iter()
        .enumerate()
        .map(|(idx, m)| Slot {
            member: idx,
            slot: idx,
            tie_type: m.declaring,
            rank: m.rank.unwrap_or(0),
        })
        .collect();

    // ── Replacement ──
    let replacers: Vec<usize> = (0..members.len())
        .filter(|&idx| members[idx].replace.is_some())
        .collect();
    let replacers = ancestor_first(replacers, |&idx| members[idx].declaring, hierarchy);

    let mut replaced = Vec::new();
    for replacer in replacers {
        let Some(key) = members[replacer].replace.as_ref() else {
            continue;
        };
        let Some(replacer_pos) = live.iter().position(|s| s.member == replacer) else {
            // Already superseded by another replacer
            continue;
        };
        let Some(target_pos) = find_live(&live, members, key, replacer) else {
            debug!(
                member = %members[replacer].name,
                target = %key.name,
                "replace target not found; keeping member in place"
            );
            continue;
        };

        let target = live[target_pos].clone();
        let entry = &mut live[replacer_pos];
        entry.slot = target.slot;
        entry.tie_type = target.tie_type;
        entry.rank = members[replacer].rank.unwrap_or(target.rank);
        live.remove(target_pos);
        replaced.push((replacer, target.member));
    }

    // ── Rank + hierarchy ──
    live.sort_by_key(|s| s.slot);
    live.sort_by_key(|s| s.rank);
    let mut base: Vec<Slot> = Vec::with_capacity(live.len());
    let mut run: Vec<Slot> = Vec::new();
    for entry in live {
        if run.last().is_some_and(|last| last.rank != entry.rank) {
            base.extend(ancestor_first(std::mem::take(&mut run), |s| s.tie_type, hierarchy));
        }
        run.push(entry);
    }
    base.extend(ancestor_first(run, |s| s.tie_type, hierarchy));

    // ── Explicit placement ──
    let base = pre_place(base, members);
    let nodes: Vec<Orderable<usize>> = base
        .iter()
        .map(|entry| {
            let member = &members[entry.member];
            let mut node = Orderable::new(entry.member.to_string(), entry.member);
            if let Some(pos) = member
                .before
                .as_ref()
                .and_then(|key| find_live(&base, members, key, entry.member))
            {
                node.set_before(base[pos].member.to_string());
            }
            if let Some(pos) = member
                .after
                .as_ref()
                .and_then(|key| find_live(&base, members, key, entry.member))
            {
                node.set_after(base[pos].member.to_string());
            }
            node
        })
        .collect();

    let graph_order = Graph::from_orderables(&nodes).sort();
    Resolution {
        order: graph_order
            .order
            .iter()
            .map(|&pos| *nodes[pos].value())
            .collect(),
        replaced,
        broken: graph_order
            .broken
            .iter()
            .map(|&(from, to)| (*nodes[from].value(), *nodes[to].value()))
            .collect(),
    }
}

/// Move each placed member next to its target so that unconstrained members
/// keep their relative order. The graph sort then enforces the links
/// transitively and detects cycles.
fn pre_place(mut seq: Vec<Slot>, members: &[MemberRanking]) -> Vec<Slot> {
    let placed: Vec<usize> = seq
        .iter()
        .map(|s| s.member)
        .filter(|&idx| members[idx].before.is_some() || members[idx].after.is_some())
        .collect();

    for member in placed {
        let m = &members[member];
        if let Some(key) = &m.after {
            move_next_to(&mut seq, members, member, key, 1);
        }
        if let Some(key) = &m.before {
            move_next_to(&mut seq, members, member, key, 0);
        }
    }
    seq
}

fn move_next_to(
    seq: &mut Vec<Slot>,
    members: &[MemberRanking],
    member: usize,
    key: &MemberKey,
    offset: usize,
) {
    if find_live(seq, members, key, member).is_none() {
        return;
    }
    let Some(from) = seq.iter().position(|s| s.member == member) else {
        return;
    };
    let entry = seq.remove(from);
    match find_live(seq, members, key, member) {
        Some(target) => seq.insert(target + offset, entry),
        None => seq.insert(from, entry),
    }
}

/// Position in `live` of the lowest-slot member matching `key`, never `exclude`.
fn find_live(
    live: &[Slot],
    members: &[MemberRanking],
    key: &MemberKey,
    exclude: usize,
) -> Option<usize> {
    live.iter()
        .enumerate()
        .filter(|(_, s)| s.member != exclude && members[s.member].matches(key))
        .min_by_key(|(_, s)| s.slot)
        .map(|(pos, _)| pos)
}

/// Stable reordering that moves items ahead of their first descendant-typed item.
///
/// The ancestor relation is only a partial order, so this is an insertion
/// pass rather than a comparator sort: unrelated items keep their order.
fn ancestor_first<T>(
    items: Vec<T>,
    type_of: impl Fn(&T) -> TypeId,
    hierarchy: &impl Hierarchy,
) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let ty = type_of(&item);
        let pos = out
            .iter()
            .position(|o| hierarchy.is_ancestor(ty, type_of(o)))
            .unwrap_or(out.len());
        out.insert(pos, item);
    }
    out
}
