//! Type index: an arena of type descriptors addressed by [`TypeId`].
//!
//! Supertype and interface references are resolved once, at construction.
//! A reference that names no known type is a checked error that aborts the
//! build, as is an inheritance cycle.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{PluginError, Result};
use crate::model::{simple_name, Annotations, TypeDto};
use crate::ordering::Hierarchy;

/// Arena index of a type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct TypeEntry {
    dto: TypeDto,
    parent: Option<TypeId>,
    interfaces: Vec<TypeId>,
}

#[derive(Debug)]
pub struct TypeIndex {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, TypeId>,
    /// Simple name → ids; only unambiguous simple names resolve
    by_simple: HashMap<String, Vec<TypeId>>,
    /// Supertypes-first linearization, self last
    linear: Vec<Vec<TypeId>>,
}

impl TypeIndex {
    /// Build the index, resolving every `extends` / `implements` reference.
    pub fn build(types: Vec<TypeDto>) -> Result<Self> {
        let mut by_name: HashMap<String, TypeId> = HashMap::new();
        let mut by_simple: HashMap<String, Vec<TypeId>> = HashMap::new();
        for (idx, dto) in types.iter().enumerate() {
            let id = TypeId(idx);
            if by_name.insert(dto.name.clone(), id).is_some() {
                return Err(PluginError::reflection(format!(
                    "type '{}' is declared more than once",
                    dto.name
                )));
            }
            by_simple
                .entry(dto.simple_name().to_string())
                .or_default()
                .push(id);
        }

        let mut index = TypeIndex {
            entries: Vec::with_capacity(types.len()),
            by_name,
            by_simple,
            linear: Vec::new(),
        };

        let mut entries = Vec::with_capacity(types.len());
        for dto in types {
            let parent = match dto.extends.as_deref() {
                Some(name) => Some(index.resolve(name, &dto.name)?),
                None => None,
            };
            let interfaces = dto
                .implements
                .iter()
                .map(|name| index.resolve(name, &dto.name))
                .collect::<Result<Vec<_>>>()?;
            entries.push(TypeEntry {
                dto,
                parent,
                interfaces,
            });
        }
        index.entries = entries;
        index.linear = index.compute_linearizations()?;

        debug!(types = index.entries.len(), "type index built");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.entries.len()).map(TypeId)
    }

    pub fn get(&self, id: TypeId) -> &TypeDto {
        &self.entries[id.0].dto
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.entries[id.0].dto.name
    }

    pub fn parent(&self, id: TypeId) -> Option<TypeId> {
        self.entries[id.0].parent
    }

    pub fn interfaces(&self, id: TypeId) -> &[TypeId] {
        &self.entries[id.0].interfaces
    }

    /// Look a type up by qualified name, or by simple name when unambiguous.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        if let Some(&id) = self.by_name.get(name) {
            return Some(id);
        }
        match self.by_simple.get(simple_name(name)).map(Vec::as_slice) {
            Some([only]) if !name.contains('.') => Some(*only),
            _ => None,
        }
    }

    /// Like [`lookup`](Self::lookup), failing with `UnresolvedType`.
    pub fn resolve(&self, name: &str, referenced_by: &str) -> Result<TypeId> {
        self.lookup(name).ok_or_else(|| PluginError::UnresolvedType {
            name: name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    /// The type and all its supertypes, ancestors first: superclass chain,
    /// then interfaces, then the type itself. Each type appears once.
    pub fn linearize(&self, id: TypeId) -> &[TypeId] {
        &self.linear[id.0]
    }

    /// Types carrying `AemComponent` whose qualified name falls under
    /// `package_base` (every type when the base is empty).
    pub fn components(&self, package_base: &str) -> Vec<TypeId> {
        self.ids()
            .filter(|&id| Annotations(&self.get(id).annotations).component().is_some())
            .filter(|&id| in_package(self.name(id), package_base))
            .collect()
    }

    fn compute_linearizations(&self) -> Result<Vec<Vec<TypeId>>> {
        let mut done: Vec<Option<Vec<TypeId>>> = vec![None; self.entries.len()];
        let mut visiting: HashSet<TypeId> = HashSet::new();
        for id in self.ids() {
            self.linearize_into(id, &mut done, &mut visiting)?;
        }
        Ok(done.into_iter().map(Option::unwrap_or_default).collect())
    }

    fn linearize_into(
        &self,
        id: TypeId,
        done: &mut Vec<Option<Vec<TypeId>>>,
        visiting: &mut HashSet<TypeId>,
    ) -> Result<Vec<TypeId>> {
        if let Some(linear) = &done[id.0] {
            return Ok(linear.clone());
        }
        if !visiting.insert(id) {
            return Err(PluginError::reflection(format!(
                "inheritance cycle through type '{}'",
                self.name(id)
            )));
        }

        let mut linear: Vec<TypeId> = Vec::new();
        let supers = self.parent(id).into_iter().chain(self.interfaces(id).iter().copied());
        for sup in supers {
            for ancestor in self.linearize_into(sup, done, visiting)? {
                if !linear.contains(&ancestor) {
                    linear.push(ancestor);
                }
            }
        }
        linear.push(id);

        visiting.remove(&id);
        done[id.0] = Some(linear.clone());
        Ok(linear)
    }
}

impl Hierarchy for TypeIndex {
    fn is_ancestor(&self, ancestor: TypeId, descendant: TypeId) -> bool {
        ancestor != descendant && self.linearize(descendant).contains(&ancestor)
    }
}

/// `true` when `name` is `base` or lies in a sub-package of it.
pub fn in_package(name: &str, base: &str) -> bool {
    let base = base.trim().trim_end_matches('.');
    base.is_empty()
        || name == base
        || name
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('.'))
}
