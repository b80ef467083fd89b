//! Annotation records carried by type and member descriptors.
//!
//! Each record is tagged by `kind:` in YAML. Repeatable annotations are plain
//! sequences on the owning descriptor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scope::Scope;

// ── Helper defaults for serde ──

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !v
}

// ── Member references ──

/// Reference to a member, optionally qualified by its declaring type.
///
/// YAML accepts either a bare member name or `{ class, name }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MemberRefRepr")]
pub struct MemberRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MemberRefRepr {
    Name(String),
    Full {
        #[serde(default)]
        class: Option<String>,
        name: String,
    },
}

impl From<MemberRefRepr> for MemberRef {
    fn from(repr: MemberRefRepr) -> Self {
        match repr {
            MemberRefRepr::Name(name) => MemberRef { class: None, name },
            MemberRefRepr::Full { class, name } => MemberRef { class, name },
        }
    }
}

impl MemberRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            class: None,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for MemberRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.class {
            Some(class) => write!(f, "{}#{}", class, self.name),
            None => f.write_str(&self.name),
        }
    }
}

// ── Property values ──

/// Untyped literal from YAML; becomes a typed XML attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    Text(String),
    List(Vec<String>),
}

// ── Type-level records ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    /// Component folder, relative to the target root
    pub path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_super_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_container: bool,
    /// Additional types contributing dialog / edit config scopes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogDef {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    pub event: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTarget {
    pub node_name: String,
    pub property_name: String,
    #[serde(default)]
    pub accept: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditConfigDef {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_text: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inherit: bool,
    #[serde(default)]
    pub listeners: Vec<Listener>,
    #[serde(default)]
    pub drop_targets: Vec<DropTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEditConfigDef {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub listeners: Vec<Listener>,
    #[serde(default)]
    pub drop_targets: Vec<DropTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlTagDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default = "default_tag")]
    pub tag_name: String,
}

fn default_tag() -> String {
    "div".to_string()
}

/// A tab, accordion panel or column of a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDef {
    pub title: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub expanded: bool,
}

impl SectionDef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            expanded: false,
        }
    }
}

// ── Member-level records ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogFieldDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFieldDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextAreaDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub autofit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckboxDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unchecked_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectDef {
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberFieldDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HiddenDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathFieldDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSetDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Prepended to the `name` of every nested field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiFieldDef {
    #[serde(default = "default_true")]
    pub composite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_hint: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDef {
    /// Title of the tab / panel / column receiving the member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<MemberRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<MemberRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub value: PropertyValue,
    /// Restricts the property to one scope; unset applies everywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

// ── Annotation (tagged enum) ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Annotation {
    AemComponent(ComponentDef),
    Dialog(DialogDef),
    DesignDialog(DialogDef),
    EditConfig(EditConfigDef),
    ChildEditConfig(ChildEditConfigDef),
    HtmlTag(HtmlTagDef),
    IgnoreMembers {
        members: Vec<MemberRef>,
    },
    /// Tabbed container. On a type it is the dialog layout; on a member it is
    /// a nested container.
    Tabs {
        #[serde(default)]
        tabs: Vec<SectionDef>,
    },
    Accordion {
        #[serde(default)]
        panels: Vec<SectionDef>,
    },
    FixedColumns {
        #[serde(default)]
        columns: Vec<SectionDef>,
    },
    Property(PropertyDef),
    /// Marker handled by user-registered handlers.
    Custom {
        name: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        properties: BTreeMap<String, PropertyValue>,
    },
    DialogField(DialogFieldDef),
    TextField(TextFieldDef),
    TextArea(TextAreaDef),
    Checkbox(CheckboxDef),
    Select(SelectDef),
    NumberField(NumberFieldDef),
    Hidden(HiddenDef),
    PathField(PathFieldDef),
    FieldSet(FieldSetDef),
    MultiField(MultiFieldDef),
    Place(PlaceDef),
    Replace {
        member: MemberRef,
    },
    Ignore,
}

/// Data-free discriminant of [`Annotation`], used for handler registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationKind {
    AemComponent,
    Dialog,
    DesignDialog,
    EditConfig,
    ChildEditConfig,
    HtmlTag,
    IgnoreMembers,
    Tabs,
    Accordion,
    FixedColumns,
    Property,
    Custom(String),
    DialogField,
    TextField,
    TextArea,
    Checkbox,
    Select,
    NumberField,
    Hidden,
    PathField,
    FieldSet,
    MultiField,
    Place,
    Replace,
    Ignore,
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::AemComponent(_) => AnnotationKind::AemComponent,
            Annotation::Dialog(_) => AnnotationKind::Dialog,
            Annotation::DesignDialog(_) => AnnotationKind::DesignDialog,
            Annotation::EditConfig(_) => AnnotationKind::EditConfig,
            Annotation::ChildEditConfig(_) => AnnotationKind::ChildEditConfig,
            Annotation::HtmlTag(_) => AnnotationKind::HtmlTag,
            Annotation::IgnoreMembers { .. } => AnnotationKind::IgnoreMembers,
            Annotation::Tabs { .. } => AnnotationKind::Tabs,
            Annotation::Accordion { .. } => AnnotationKind::Accordion,
            Annotation::FixedColumns { .. } => AnnotationKind::FixedColumns,
            Annotation::Property(_) => AnnotationKind::Property,
            Annotation::Custom { name, .. } => AnnotationKind::Custom(name.clone()),
            Annotation::DialogField(_) => AnnotationKind::DialogField,
            Annotation::TextField(_) => AnnotationKind::TextField,
            Annotation::TextArea(_) => AnnotationKind::TextArea,
            Annotation::Checkbox(_) => AnnotationKind::Checkbox,
            Annotation::Select(_) => AnnotationKind::Select,
            Annotation::NumberField(_) => AnnotationKind::NumberField,
            Annotation::Hidden(_) => AnnotationKind::Hidden,
            Annotation::PathField(_) => AnnotationKind::PathField,
            Annotation::FieldSet(_) => AnnotationKind::FieldSet,
            Annotation::MultiField(_) => AnnotationKind::MultiField,
            Annotation::Place(_) => AnnotationKind::Place,
            Annotation::Replace { .. } => AnnotationKind::Replace,
            Annotation::Ignore => AnnotationKind::Ignore,
        }
    }

    /// Annotations that make a member render as a dialog widget.
    pub fn is_widget(&self) -> bool {
        matches!(
            self,
            Annotation::DialogField(_)
                | Annotation::TextField(_)
                | Annotation::TextArea(_)
                | Annotation::Checkbox(_)
                | Annotation::Select(_)
                | Annotation::NumberField(_)
                | Annotation::Hidden(_)
                | Annotation::PathField(_)
                | Annotation::FieldSet(_)
                | Annotation::MultiField(_)
                | Annotation::Custom { .. }
        )
    }

    /// Container annotations (`Tabs`, `Accordion`, `FixedColumns`) with their sections.
    pub fn sections(&self) -> Option<&[SectionDef]> {
        match self {
            Annotation::Tabs { tabs } => Some(tabs),
            Annotation::Accordion { panels } => Some(panels),
            Annotation::FixedColumns { columns } => Some(columns),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationKind::Custom(name) => write!(f, "Custom({})", name),
            other => write!(f, "{:?}", other),
        }
    }
}

// ── Typed lookup ──

/// Borrowed view over an annotation list with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct Annotations<'a>(pub &'a [Annotation]);

impl<'a> Annotations<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a Annotation> {
        self.0.iter()
    }

    pub fn has(&self, kind: &AnnotationKind) -> bool {
        self.0.iter().any(|a| &a.kind() == kind)
    }

    pub fn component(&self) -> Option<&'a ComponentDef> {
        self.0.iter().find_map(|a| match a {
            Annotation::AemComponent(def) => Some(def),
            _ => None,
        })
    }

    pub fn dialog(&self) -> Option<&'a DialogDef> {
        self.0.iter().find_map(|a| match a {
            Annotation::Dialog(def) => Some(def),
            _ => None,
        })
    }

    pub fn design_dialog(&self) -> Option<&'a DialogDef> {
        self.0.iter().find_map(|a| match a {
            Annotation::DesignDialog(def) => Some(def),
            _ => None,
        })
    }

    pub fn edit_config(&self) -> Option<&'a EditConfigDef> {
        self.0.iter().find_map(|a| match a {
            Annotation::EditConfig(def) => Some(def),
            _ => None,
        })
    }

    pub fn child_edit_config(&self) -> Option<&'a ChildEditConfigDef> {
        self.0.iter().find_map(|a| match a {
            Annotation::ChildEditConfig(def) => Some(def),
            _ => None,
        })
    }

    pub fn html_tag(&self) -> Option<&'a HtmlTagDef> {
        self.0.iter().find_map(|a| match a {
            Annotation::HtmlTag(def) => Some(def),
            _ => None,
        })
    }

    pub fn dialog_field(&self) -> Option<&'a DialogFieldDef> {
        self.0.iter().find_map(|a| match a {
            Annotation::DialogField(def) => Some(def),
            _ => None,
        })
    }

    pub fn place(&self) -> Option<&'a PlaceDef> {
        self.0.iter().find_map(|a| match a {
            Annotation::Place(def) => Some(def),
            _ => None,
        })
    }

    pub fn replace(&self) -> Option<&'a MemberRef> {
        self.0.iter().find_map(|a| match a {
            Annotation::Replace { member } => Some(member),
            _ => None,
        })
    }

    pub fn ignored_members(&self) -> impl Iterator<Item = &'a MemberRef> {
        self.0.iter().flat_map(|a| match a {
            Annotation::IgnoreMembers { members } => members.as_slice(),
            _ => &[][..],
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &'a PropertyDef> {
        self.0.iter().filter_map(|a| match a {
            Annotation::Property(def) => Some(def),
            _ => None,
        })
    }

    /// First container annotation (`Tabs`, `Accordion`, `FixedColumns`).
    pub fn container(&self) -> Option<&'a Annotation> {
        self.0.iter().find(|a| a.sections().is_some())
    }

    pub fn is_ignored(&self) -> bool {
        self.0.iter().any(|a| matches!(a, Annotation::Ignore))
    }

    pub fn is_renderable(&self) -> bool {
        self.0.iter().any(|a| a.is_widget() || a.sections().is_some())
    }

    /// Effective ranking from `DialogField.ranking`.
    pub fn ranking(&self) -> Option<i32> {
        self.dialog_field().and_then(|f| f.ranking)
    }
}
