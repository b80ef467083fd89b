//! dialog-lite-core: handler pipeline and ordering engine for authoring XML
//!
//! This crate turns YAML type descriptors into `jcr:root` XML documents:
//! - Type descriptor model and loader (`model`)
//! - Type index with hierarchy linearization (`index`)
//! - Orderable nodes, topological sort and member ranking (`ordering`)
//! - Member discovery across type hierarchies (`members`)
//! - Source views and the output tree (`source`, `target`, `xml`)
//! - Handler chains, scope handlers and widgets (`handlers`)
//! - Container layouts (`containers`)
//! - Exception policy and error taxonomy (`exceptions`, `error`)
//!
//! The build itself runs through [`PluginRuntime`].

pub mod containers;
pub mod context;
pub mod error;
pub mod exceptions;
pub mod handlers;
pub mod index;
pub mod members;
pub mod model;
pub mod ordering;
pub mod pipeline;
pub mod scope;
pub mod settings;
pub mod source;
pub mod target;
pub mod xml;

// Re-export commonly used types
pub use context::{BuildContext, Issue};
pub use error::{PluginError, Result};
pub use exceptions::{ExceptionHandler, PermissiveHandler, SelectiveHandler, StrictHandler};
pub use handlers::{Handler, HandlerChains, HandlerContext};
pub use index::{TypeId, TypeIndex};
pub use model::{Annotation, AnnotationKind, DescriptorFile, MemberDto, TypeDto};
pub use ordering::{Graph, Orderable};
pub use pipeline::{BuildReport, ComponentOutput, PluginRuntime};
pub use scope::Scope;
pub use settings::{PluginSettings, SettingsLoader};
pub use source::Source;
pub use target::{AttrValue, TargetId, TargetTree};
