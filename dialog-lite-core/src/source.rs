//! Read view over one type or one member of the [`TypeIndex`].

use std::fmt;

use crate::index::{TypeId, TypeIndex};
use crate::model::{Annotation, AnnotationKind, Annotations, MemberDto, MemberKind, TypeDto};

/// A cheap, copyable view over a type or a member. Recreate it freely; it
/// holds only borrows into the index.
#[derive(Clone, Copy)]
pub struct Source<'a> {
    index: &'a TypeIndex,
    declaring: TypeId,
    member: Option<&'a MemberDto>,
}

impl<'a> Source<'a> {
    pub fn for_type(index: &'a TypeIndex, id: TypeId) -> Self {
        Self {
            index,
            declaring: id,
            member: None,
        }
    }

    pub fn for_member(index: &'a TypeIndex, declaring: TypeId, member: &'a MemberDto) -> Self {
        Self {
            index,
            declaring,
            member: Some(member),
        }
    }

    pub fn index(&self) -> &'a TypeIndex {
        self.index
    }

    /// Member name, or the simple type name for a type source.
    pub fn name(&self) -> &'a str {
        match self.member {
            Some(member) => &member.name,
            None => self.index.get(self.declaring).simple_name(),
        }
    }

    /// Property name used in the generated `name` attribute. Accessor
    /// prefixes are dropped for methods (`getTitle` → `title`).
    pub fn field_name(&self) -> String {
        let name = self.name();
        match self.member.map(|m| m.kind) {
            Some(MemberKind::Method) => strip_accessor(name),
            _ => name.to_string(),
        }
    }

    pub fn declaring(&self) -> TypeId {
        self.declaring
    }

    pub fn declaring_name(&self) -> &'a str {
        self.index.name(self.declaring)
    }

    pub fn is_member(&self) -> bool {
        self.member.is_some()
    }

    pub fn as_member(&self) -> Option<&'a MemberDto> {
        self.member
    }

    pub fn as_type(&self) -> Option<&'a TypeDto> {
        match self.member {
            Some(_) => None,
            None => Some(self.index.get(self.declaring)),
        }
    }

    pub fn annotations(&self) -> Annotations<'a> {
        match self.member {
            Some(member) => Annotations(&member.annotations),
            None => Annotations(&self.index.get(self.declaring).annotations),
        }
    }

    pub fn has(&self, kind: &AnnotationKind) -> bool {
        self.annotations().has(kind)
    }

    /// First annotation of the given kind.
    pub fn annotation(&self, kind: &AnnotationKind) -> Option<&'a Annotation> {
        self.annotations().iter().find(|a| &a.kind() == kind)
    }

    /// Declared value type name of a member.
    pub fn value_type_name(&self) -> Option<&'a str> {
        self.member.and_then(|m| m.value_type.as_deref())
    }

    /// Value type resolved in the index, when it is a described type.
    pub fn value_type(&self) -> Option<TypeId> {
        self.value_type_name().and_then(|name| self.index.lookup(name))
    }
}

impl fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.member {
            Some(member) => write!(f, "{}#{}", self.declaring_name(), member.name),
            None => f.write_str(self.declaring_name()),
        }
    }
}

impl fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source({})", self)
    }
}

fn strip_accessor(name: &str) -> String {
    let stripped = ["get", "is"].into_iter().find_map(|prefix| {
        name.strip_prefix(prefix)
            .filter(|rest| rest.chars().next().is_some_and(|c| c.is_ascii_uppercase()))
    });
    match stripped {
        Some(rest) => {
            let mut chars = rest.chars();
            match chars.next() {
                Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                None => name.to_string(),
            }
        }
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::yaml::parse_descriptor_yaml;

    const YAML: &str = r#"
types:
  - name: app.Link
    members:
      - name: url
  - name: app.Teaser
    annotations:
      - kind: Dialog
        title: Teaser
    members:
      - name: getHeadline
        kind: method
        annotations:
          - kind: TextField
      - name: link
        type: Link
        annotations:
          - kind: FieldSet
"#;

    fn index() -> TypeIndex {
        TypeIndex::build(parse_descriptor_yaml(YAML).unwrap().types).unwrap()
    }

    #[test]
    fn test_type_and_member_views() {
        let idx = index();
        let teaser = idx.lookup("app.Teaser").unwrap();
        let ty = Source::for_type(&idx, teaser);
        assert_eq!(ty.name(), "Teaser");
        assert!(ty.as_type().is_some());
        assert!(ty.as_member().is_none());
        assert!(ty.has(&AnnotationKind::Dialog));

        let members = &idx.get(teaser).members;
        let headline = Source::for_member(&idx, teaser, &members[0]);
        assert_eq!(headline.name(), "getHeadline");
        assert_eq!(headline.field_name(), "headline");
        assert_eq!(headline.to_string(), "app.Teaser#getHeadline");
        assert!(headline.as_type().is_none());
        assert!(headline.has(&AnnotationKind::TextField));
        assert!(!headline.has(&AnnotationKind::Dialog));
    }

    #[test]
    fn test_value_type_resolution() {
        let idx = index();
        let teaser = idx.lookup("app.Teaser").unwrap();
        let link = Source::for_member(&idx, teaser, &idx.get(teaser).members[1]);
        assert_eq!(link.value_type_name(), Some("Link"));
        assert_eq!(link.value_type(), idx.lookup("app.Link"));
    }

    #[test]
    fn test_strip_accessor() {
        assert_eq!(strip_accessor("getTitle"), "title");
        assert_eq!(strip_accessor("isHidden"), "hidden");
        assert_eq!(strip_accessor("get"), "get");
        assert_eq!(strip_accessor("gettysburg"), "gettysburg");
        assert_eq!(strip_accessor("issue"), "issue");
    }
}
