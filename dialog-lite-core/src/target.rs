//! Output tree
//!
//! A [`TargetTree`] is an arena of nodes for one output document. Children
//! keep insertion order, which is the rendered XML child order. Nodes are
//! addressed by [`TargetId`] and looked up by relative path with
//! get-or-create semantics, so handlers may reference a node before the
//! handler that fills it has run.

use std::fmt;

use crate::model::PropertyValue;
use crate::xml::is_declared_prefix;

// ── Attribute values ──

/// Typed attribute value, rendered with the JCR type hint prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
    Long(i64),
    Double(f64),
    StrArray(Vec<String>),
}

impl AttrValue {
    /// Serialized form: `text`, `{Boolean}true`, `{Long}5`, `{Double}1.5`, `[a,b]`.
    pub fn render(&self) -> String {
        match self {
            AttrValue::Str(s) => escape_leading(s),
            AttrValue::Bool(b) => format!("{{Boolean}}{}", b),
            AttrValue::Long(n) => format!("{{Long}}{}", n),
            AttrValue::Double(d) => format!("{{Double}}{}", d),
            AttrValue::StrArray(items) => {
                let joined: Vec<String> = items.iter().map(|s| s.replace(',', "\\,")).collect();
                format!("[{}]", joined.join(","))
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A string starting with `{` or `[` would be read back as a typed value.
fn escape_leading(s: &str) -> String {
    if s.starts_with('{') || s.starts_with('[') {
        format!("\\{}", s)
    } else {
        s.to_string()
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<&String> for AttrValue {
    fn from(s: &String) -> Self {
        AttrValue::Str(s.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Long(n)
    }
}

impl From<f64> for AttrValue {
    fn from(d: f64) -> Self {
        AttrValue::Double(d)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(items: Vec<String>) -> Self {
        AttrValue::StrArray(items)
    }
}

impl From<&PropertyValue> for AttrValue {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Bool(b) => AttrValue::Bool(*b),
            PropertyValue::Long(n) => AttrValue::Long(*n),
            PropertyValue::Double(d) => AttrValue::Double(*d),
            PropertyValue::Text(s) => AttrValue::Str(s.clone()),
            PropertyValue::List(items) => AttrValue::StrArray(items.clone()),
        }
    }
}

// ── Tree ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

#[derive(Debug, Clone)]
struct Node {
    name: String,
    attrs: Vec<(String, AttrValue)>,
    children: Vec<TargetId>,
    parent: Option<TargetId>,
}

#[derive(Debug, Clone)]
pub struct TargetTree {
    nodes: Vec<Node>,
}

impl TargetTree {
    pub fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![Node {
                name: sanitize_node_name(root_name),
                attrs: Vec::new(),
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> TargetId {
        TargetId(0)
    }

    pub fn name(&self, id: TargetId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: TargetId) -> Option<TargetId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: TargetId) -> &[TargetId] {
        &self.nodes[id.0].children
    }

    pub fn attrs(&self, id: TargetId) -> &[(String, AttrValue)] {
        &self.nodes[id.0].attrs
    }

    pub fn attr(&self, id: TargetId, name: &str) -> Option<&AttrValue> {
        self.nodes[id.0]
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Set an attribute. An existing attribute keeps its position.
    pub fn set_attr(&mut self, id: TargetId, name: &str, value: impl Into<AttrValue>) {
        let value = value.into();
        let attrs = &mut self.nodes[id.0].attrs;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => attrs.push((name.to_string(), value)),
        }
    }

    /// Set an attribute only when the value is present.
    pub fn set_opt<V: Into<AttrValue>>(&mut self, id: TargetId, name: &str, value: Option<V>) {
        if let Some(value) = value {
            self.set_attr(id, name, value);
        }
    }

    /// Set a boolean attribute only when `true`.
    pub fn set_flag(&mut self, id: TargetId, name: &str, value: bool) {
        if value {
            self.set_attr(id, name, true);
        }
    }

    pub fn remove_attr(&mut self, id: TargetId, name: &str) -> Option<AttrValue> {
        let attrs = &mut self.nodes[id.0].attrs;
        let pos = attrs.iter().position(|(n, _)| n == name)?;
        Some(attrs.remove(pos).1)
    }

    /// Direct child by exact name.
    pub fn child(&self, id: TargetId, name: &str) -> Option<TargetId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].name == name)
    }

    /// Append a new child. A name already taken among the siblings gets a
    /// numeric suffix (`title`, `title_1`, ...).
    pub fn create_child(&mut self, parent: TargetId, name: &str) -> TargetId {
        let base = sanitize_node_name(name);
        let mut unique = base.clone();
        let mut counter = 1;
        while self.child(parent, &unique).is_some() {
            unique = format!("{}_{}", base, counter);
            counter += 1;
        }
        self.push_child(parent, unique)
    }

    fn push_child(&mut self, parent: TargetId, name: String) -> TargetId {
        let id = TargetId(self.nodes.len());
        self.nodes.push(Node {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Resolve `path` relative to `from`, creating missing nodes.
    ///
    /// Segments are separated by `/`; `.` is the current node and `..` the
    /// parent (the root is its own parent). Empty segments are skipped.
    pub fn get_or_create(&mut self, from: TargetId, path: &str) -> TargetId {
        let mut current = from;
        for segment in path.split('/') {
            current = match segment {
                "" | "." => current,
                ".." => self.parent(current).unwrap_or(current),
                name => match self.child(current, &sanitize_node_name(name)) {
                    Some(existing) => existing,
                    None => self.push_child(current, sanitize_node_name(name)),
                },
            };
        }
        current
    }

    /// Resolve `path` relative to `from` without creating anything.
    pub fn find(&self, from: TargetId, path: &str) -> Option<TargetId> {
        let mut current = from;
        for segment in path.split('/') {
            current = match segment {
                "" | "." => current,
                ".." => self.parent(current).unwrap_or(current),
                name => self.child(current, &sanitize_node_name(name))?,
            };
        }
        Some(current)
    }

    /// Slash-separated path from the root, for diagnostics.
    pub fn path(&self, id: TargetId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            segments.push(self.name(node));
            current = self.parent(node);
        }
        segments.reverse();
        segments.join("/")
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Make a string usable as an XML element name.
///
/// A `prefix:` is kept only for namespaces declared on the document root
/// (`cq:dialog`, `jcr:content`); any other colon becomes `_`, as does every
/// character outside `[A-Za-z0-9_.-]`. A leading digit, `-` or `.` gets a `_`
/// prefix.
pub fn sanitize_node_name(s: &str) -> String {
    match s.split_once(':') {
        Some((prefix, local)) if !local.is_empty() && is_declared_prefix(prefix) => {
            format!("{}:{}", prefix, sanitize_local_name(local))
        }
        _ => sanitize_local_name(s),
    }
}

fn sanitize_local_name(s: &str) -> String {
    let mut result: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if result.is_empty() {
        result.push('_');
    }
    if let Some(first) = result.chars().next() {
        if first.is_ascii_digit() || first == '-' || first == '.' {
            result.insert(0, '_');
        }
    }
    result
}
