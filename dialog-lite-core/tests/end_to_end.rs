//! End-to-end builds: descriptors on disk → XML files in a temp directory.

use std::path::{Path, PathBuf};

use dialog_lite_core::error::Result;
use dialog_lite_core::model::yaml::parse_descriptor_yaml;
use dialog_lite_core::{
    AnnotationKind, Handler, HandlerChains, HandlerContext, PluginError, PluginRuntime, PluginSettings,
    Scope, Source, TargetId, TargetTree,
};
use pretty_assertions::assert_eq;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cards")
}

fn settings(target: &Path, terminate_on: &str) -> PluginSettings {
    PluginSettings {
        source_root: fixtures(),
        target_root: target.to_path_buf(),
        package_base: "app".to_string(),
        terminate_on: terminate_on.to_string(),
        ..PluginSettings::default()
    }
}

/// Byte offsets of `<name ` elements, in the order given.
fn positions(xml: &str, names: &[&str]) -> Vec<usize> {
    names
        .iter()
        .map(|name| {
            xml.find(&format!("<{} ", name))
                .unwrap_or_else(|| panic!("element <{}> missing from:\n{}", name, xml))
        })
        .collect()
}

// ── Descriptor tree build ──

/// T-E2E-1: inherited members render before subclass members when ranks tie.
#[test]
fn t_e2e_1_superclass_members_first() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = PluginRuntime::new(settings(dir.path(), ""), HandlerChains::default()).unwrap();
    let report = runtime.run().unwrap();

    assert_eq!(report.components, vec!["app.components.Card"]);
    assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);

    let dialog = std::fs::read_to_string(
        dir.path().join("app/components/card/_cq_dialog/.content.xml"),
    )
    .unwrap();
    let order = positions(&dialog, &["heading", "subheading", "image", "text", "link", "altText"]);
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted);

    // Static and ignored members never render
    assert!(!dialog.contains("LOGGER"));
    assert!(!dialog.contains("internalId"));
    assert!(dialog.contains(r#"name="./altText""#));
}

/// T-E2E-2: every scope with a source annotation becomes its own file.
#[test]
fn t_e2e_2_scope_files() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = PluginRuntime::new(settings(dir.path(), ""), HandlerChains::default()).unwrap();
    let report = runtime.run().unwrap();

    let folder = dir.path().join("app/components/card");
    assert_eq!(
        report.files,
        vec![
            folder.join(".content.xml"),
            folder.join("_cq_dialog/.content.xml"),
            folder.join("_cq_editConfig.xml"),
            folder.join("_cq_htmlTag/.content.xml"),
        ]
    );

    let component = std::fs::read_to_string(folder.join(".content.xml")).unwrap();
    assert!(component.contains(r#"jcr:primaryType="cq:Component""#));
    assert!(component.contains(r#"cq:icon="card""#));

    let edit = std::fs::read_to_string(folder.join("_cq_editConfig.xml")).unwrap();
    assert!(edit.contains(r#"cq:actions="[edit,delete]""#));
    assert!(edit.contains(r#"afteredit="REFRESH_SELF""#));

    let tag = std::fs::read_to_string(folder.join("_cq_htmlTag/.content.xml")).unwrap();
    assert!(tag.contains(r#"class="cmp-card""#));
    assert!(tag.contains(r#"cq:tagName="div""#));
}

/// T-E2E-3: `check` renders the same components and writes nothing.
#[test]
fn t_e2e_3_check_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out");
    let runtime = PluginRuntime::new(settings(&target, ""), HandlerChains::default()).unwrap();
    let report = runtime.check().unwrap();
    assert_eq!(report.components.len(), 1);
    assert!(report.files.is_empty());
    assert!(!target.exists());
}

/// T-E2E-4: a missing source root is a checked error.
#[test]
fn t_e2e_4_missing_source_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(&dir.path().join("out"), "");
    settings.source_root = dir.path().join("nowhere");
    let err = PluginRuntime::new(settings, HandlerChains::default())
        .err()
        .unwrap();
    assert!(!err.is_runtime());
}

// ── Handler ordering through the registry ──

#[derive(Debug)]
struct Named {
    name: String,
    before: Option<&'static str>,
    after: Option<&'static str>,
}

impl Named {
    fn new(i: usize) -> Self {
        Self {
            name: format!("Handler{}", i),
            before: None,
            after: None,
        }
    }
}

impl Handler for Named {
    fn name(&self) -> &str {
        &self.name
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::Custom("Named".to_string())
    }

    fn before(&self) -> Option<&str> {
        self.before
    }

    fn after(&self) -> Option<&str> {
        self.after
    }

    fn apply(&self, _: Source<'_>, _: &mut TargetTree, _: TargetId, _: &HandlerContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// T-E2E-5: a constraint cycle still yields every handler once, deterministically.
#[test]
fn t_e2e_5_cyclic_handler_order() {
    let build = || {
        let mut handlers: Vec<Named> = (0..5).map(Named::new).collect();
        handlers[0].before = Some("Handler1");
        handlers[1].before = Some("Handler2");
        handlers[4].after = Some("Handler1");
        handlers[2].before = Some("Handler3");
        handlers[3].before = Some("Handler1");
        handlers
            .into_iter()
            .fold(HandlerChains::builder(), |b, h| b.register(h))
            .build()
    };
    let expected = vec!["Handler0", "Handler1", "Handler2", "Handler4", "Handler3"];
    assert_eq!(build().extension_order(), expected);
    assert_eq!(build().extension_order(), expected);
}

/// T-E2E-6: unconstrained handlers keep registration order.
#[test]
fn t_e2e_6_unconstrained_handler_order() {
    let chains = (0..7)
        .map(Named::new)
        .fold(HandlerChains::builder(), |b, h| b.register(h))
        .build();
    let expected: Vec<String> = (0..7).map(|i| format!("Handler{}", i)).collect();
    assert_eq!(chains.extension_order(), expected);
}

// ── Exception policy ──

/// Reports one error of the configured kind for every source it sees.
#[derive(Debug)]
struct Complaining {
    illegal: bool,
}

impl Handler for Complaining {
    fn name(&self) -> &str {
        "Complaining"
    }

    fn handles(&self) -> AnnotationKind {
        AnnotationKind::Custom("Audit".to_string())
    }

    fn scopes(&self) -> &[Scope] {
        &[Scope::Component]
    }

    fn apply(&self, source: Source<'_>, _: &mut TargetTree, _: TargetId, ctx: &HandlerContext<'_>) -> Result<()> {
        let message = format!("audit rejected {}", source);
        let error = if self.illegal {
            PluginError::illegal_argument(message)
        } else {
            PluginError::validation(message)
        };
        ctx.report(error)
    }
}

const AUDITED: &str = r#"
types:
  - name: app.Audited
    annotations:
      - kind: AemComponent
        path: app/audited
        title: Audited
      - kind: Custom
        name: Audit
"#;

fn audited(terminate_on: &str, illegal: bool) -> PluginRuntime {
    let dir = std::env::temp_dir().join("dialog-lite-unused");
    let settings = PluginSettings {
        target_root: dir,
        terminate_on: terminate_on.to_string(),
        ..PluginSettings::default()
    };
    let chains = HandlerChains::builder().register(Complaining { illegal }).build();
    PluginRuntime::from_types(parse_descriptor_yaml(AUDITED).unwrap().types, settings, chains).unwrap()
}

/// T-E2E-7: the selected kind aborts the build, wrapped.
#[test]
fn t_e2e_7_selective_policy_escalates() {
    for setting in ["IllegalArgument", "dialog_lite::IllegalArgument"] {
        let err = audited(setting, true).check().unwrap_err();
        assert!(err.is_abort(), "{} did not abort", setting);
        assert_eq!(err.root_cause().kind_name(), "IllegalArgument");
        assert!(err.to_string().contains("audit rejected app.Audited"));
    }
}

/// T-E2E-8: other kinds are only logged and recorded.
#[test]
fn t_e2e_8_selective_policy_logs_others() {
    let report = audited("IllegalArgument", false).check().unwrap();
    assert_eq!(report.components, vec!["app.Audited"]);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, "Validation");
}
