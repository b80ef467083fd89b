//! Type descriptor model
//!
//! Descriptors stand in for runtime reflection: each one lists what a type
//! exposes (supertypes, members, annotation records).

pub mod annotations;
pub mod yaml;

use serde::{Deserialize, Serialize};

pub use annotations::{Annotation, AnnotationKind, Annotations, MemberRef, PropertyValue, SectionDef};

fn is_false(v: &bool) -> bool {
    !v
}

// ── Top-level DTO ──

/// One descriptor document: `types: [ ... ]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorFile {
    #[serde(default)]
    pub types: Vec<TypeDto>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDto {
    /// Fully qualified name (`com.acme.components.Teaser`)
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberDto>,
}

// ── Member ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    #[default]
    Field,
    Method,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDto {
    pub name: String,
    #[serde(default)]
    pub kind: MemberKind,
    /// Plain value type; collections are unwrapped to their element type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl TypeDto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
            extends: None,
            implements: Vec::new(),
            annotations: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

impl MemberDto {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            value_type: None,
            is_static: false,
            annotations: Vec::new(),
        }
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Method,
            ..Self::field(name)
        }
    }

    pub fn with(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Last `.`-separated segment of a qualified type name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
