//! Build entry point
//!
//! `PluginRuntime` loads the descriptors, indexes the types and renders one
//! [`TargetTree`] per output scope of every component:
//!
//! ```text
//! descriptors/*.yaml → TypeIndex → components(package_base)
//!     → per scope: source type → handler chain → TargetTree → XML file
//! ```

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::context::{BuildContext, Issue};
use crate::error::{PluginError, Result};
use crate::handlers::{HandlerChains, HandlerContext};
use crate::index::{TypeId, TypeIndex};
use crate::model::yaml::DescriptorLoader;
use crate::model::{AnnotationKind, TypeDto};
use crate::scope::Scope;
use crate::settings::PluginSettings;
use crate::source::Source;
use crate::target::TargetTree;
use crate::xml::{write_document, ROOT_NAME};

/// Rendered documents of one component, not yet written.
#[derive(Debug)]
pub struct ComponentOutput {
    /// Qualified name of the component type
    pub name: String,
    /// Component folder relative to the target root
    pub path: String,
    pub documents: Vec<(Scope, TargetTree)>,
}

impl ComponentOutput {
    pub fn document(&self, scope: Scope) -> Option<&TargetTree> {
        self.documents
            .iter()
            .find(|(s, _)| *s == scope)
            .map(|(_, tree)| tree)
    }
}

/// Summary of one build, printed by the CLI or serialized with `--json`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub components: Vec<String>,
    pub files: Vec<PathBuf>,
    pub issues: Vec<Issue>,
}

pub struct PluginRuntime {
    ctx: BuildContext,
    chains: HandlerChains,
}

impl PluginRuntime {
    /// Load descriptors from `settings.source_root` and build the type index.
    pub fn new(settings: PluginSettings, chains: HandlerChains) -> Result<Self> {
        settings.validate().map_err(|e| PluginError::Settings {
            message: format!("{:#}", e),
        })?;
        let types = DescriptorLoader::new(&settings.source_root).load()?;
        Self::from_types(types, settings, chains)
    }

    pub fn from_types(types: Vec<TypeDto>, settings: PluginSettings, chains: HandlerChains) -> Result<Self> {
        let index = TypeIndex::build(types)?;
        let ctx = BuildContext::new(index, settings);
        info!(
            types = ctx.index().len(),
            policy = ctx.exception_policy(),
            "type index built"
        );
        Ok(Self { ctx, chains })
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn chains(&self) -> &HandlerChains {
        &self.chains
    }

    /// Component types within the configured package base.
    pub fn components(&self) -> Vec<TypeId> {
        self.ctx.index().components(&self.ctx.settings().package_base)
    }

    /// Render every output scope of one component type.
    ///
    /// Returns `None` for a type without `AemComponent` or with a blank
    /// component path (reported through the policy).
    pub fn render_component(&self, ty: TypeId) -> Result<Option<ComponentOutput>> {
        let index = self.ctx.index();
        let name = index.name(ty);
        let Some(def) = Source::for_type(index, ty).annotations().component() else {
            return Ok(None);
        };
        let path = def.path.trim().trim_matches('/');
        if path.is_empty() {
            self.ctx.report(PluginError::validation(format!(
                "component {} has a blank path",
                name
            )))?;
            return Ok(None);
        }

        let mut views = vec![ty];
        for view in &def.views {
            views.push(index.resolve(view, name)?);
        }

        let mut documents = Vec::new();
        for scope in Scope::OUTPUT {
            let Some(marker) = scope_marker(scope) else {
                continue;
            };
            let Some(source_ty) = views
                .iter()
                .copied()
                .find(|&v| Source::for_type(index, v).has(&marker))
            else {
                continue;
            };

            let source = Source::for_type(index, source_ty);
            let hctx = HandlerContext::new(&self.ctx, &self.chains, scope);
            let mut tree = TargetTree::new(ROOT_NAME);
            let root = tree.root();
            self.chains
                .for_scope(source, scope)
                .run(source, &mut tree, root, &hctx)?;
            debug!(component = name, scope = %scope, source = %source, nodes = tree.node_count(), "scope rendered");
            documents.push((scope, tree));
        }

        info!(component = name, path, documents = documents.len(), "component rendered");
        Ok(Some(ComponentOutput {
            name: name.to_string(),
            path: path.to_string(),
            documents,
        }))
    }

    pub fn render_all(&self) -> Result<Vec<ComponentOutput>> {
        let mut outputs = Vec::new();
        for ty in self.components() {
            if let Some(output) = self.render_component(ty)? {
                outputs.push(output);
            }
        }
        Ok(outputs)
    }

    /// Render everything without writing files.
    pub fn check(&self) -> Result<BuildReport> {
        let components = self.render_all()?.into_iter().map(|o| o.name).collect();
        Ok(BuildReport {
            components,
            files: Vec::new(),
            issues: self.ctx.issues(),
        })
    }

    /// Render everything and write the documents under the target root.
    pub fn run(&self) -> Result<BuildReport> {
        let target_root = &self.ctx.settings().target_root;
        let mut report = BuildReport::default();
        for output in self.render_all()? {
            let folder = target_root.join(&output.path);
            for (scope, tree) in &output.documents {
                let Some(file) = scope.file_name() else {
                    continue;
                };
                let path = folder.join(file);
                write_document(tree, &path, self.ctx.xml())?;
                report.files.push(path);
            }
            report.components.push(output.name);
        }
        report.issues = self.ctx.issues();
        info!(
            components = report.components.len(),
            files = report.files.len(),
            issues = report.issues.len(),
            "build finished"
        );
        Ok(report)
    }
}

/// Type-level annotation that makes a type the source of `scope`.
fn scope_marker(scope: Scope) -> Option<AnnotationKind> {
    match scope {
        Scope::Component => Some(AnnotationKind::AemComponent),
        Scope::Dialog => Some(AnnotationKind::Dialog),
        Scope::DesignDialog => Some(AnnotationKind::DesignDialog),
        Scope::EditConfig => Some(AnnotationKind::EditConfig),
        Scope::ChildEditConfig => Some(AnnotationKind::ChildEditConfig),
        Scope::HtmlTag => Some(AnnotationKind::HtmlTag),
        Scope::Default => None,
    }
}
