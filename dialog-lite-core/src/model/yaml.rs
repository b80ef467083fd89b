//! Descriptor loading
//!
//! Reads every `*.yaml` / `*.yml` file under a source root and merges the
//! `types:` lists in path order.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{DescriptorFile, TypeDto};
use crate::error::{PluginError, Result};

/// Parse one descriptor document.
///
/// No cross-type checks happen here; unresolved supertypes are reported when
/// the [`TypeIndex`](crate::index::TypeIndex) is built.
pub fn parse_descriptor_yaml(yaml_str: &str) -> std::result::Result<DescriptorFile, serde_yaml::Error> {
    serde_yaml::from_str(yaml_str)
}

pub struct DescriptorLoader {
    source_root: PathBuf,
}

impl DescriptorLoader {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Load all type descriptors below the source root.
    ///
    /// A single file may also be given as the root.
    pub fn load(&self) -> Result<Vec<TypeDto>> {
        let files = if self.source_root.is_file() {
            vec![self.source_root.clone()]
        } else {
            self.descriptor_files()?
        };
        info!(
            "Loading type descriptors from {} ({} files)",
            self.source_root.display(),
            files.len()
        );

        let mut types = Vec::new();
        for path in files {
            let content = std::fs::read_to_string(&path).map_err(|source| PluginError::Io {
                path: path.clone(),
                source,
            })?;
            let file = parse_descriptor_yaml(&content).map_err(|source| PluginError::Yaml {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), types = file.types.len(), "parsed descriptor file");
            types.extend(file.types);
        }

        info!("Loaded {} type descriptors", types.len());
        Ok(types)
    }

    /// Descriptor files below the root, sorted by path. Hidden entries
    /// (editor swap files, `.git`) are skipped.
    fn descriptor_files(&self) -> Result<Vec<PathBuf>> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| PluginError::Io { path, source }
        };

        let mut pending = vec![self.source_root.clone()];
        let mut files = Vec::new();
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir).map_err(io_err(&dir))? {
                let path = entry.map_err(io_err(&dir))?.path();
                let hidden = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('.'));
                if hidden {
                    continue;
                }
                if path.is_dir() {
                    pending.push(path);
                } else if is_descriptor(&path) {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

fn is_descriptor(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberKind, TypeKind};

    #[test]
    fn test_basic_descriptor_parse() {
        let yaml = r#"
types:
  - name: app.Base
    members:
      - name: title
        type: String
        annotations:
          - kind: TextField
  - name: app.Named
    kind: interface
    members:
      - name: getName
        kind: method
  - name: app.Teaser
    extends: app.Base
    implements: [app.Named]
    annotations:
      - kind: AemComponent
        path: content/teaser
        title: Teaser
    members:
      - name: VERSION
        static: true
"#;
        let file = parse_descriptor_yaml(yaml).unwrap();
        assert_eq!(file.types.len(), 3);
        assert_eq!(file.types[1].kind, TypeKind::Interface);
        assert_eq!(file.types[1].members[0].kind, MemberKind::Method);
        assert_eq!(file.types[2].extends.as_deref(), Some("app.Base"));
        assert!(file.types[2].members[0].is_static);
        assert_eq!(file.types[0].members[0].value_type.as_deref(), Some("String"));
        assert_eq!(file.types[2].simple_name(), "Teaser");
    }

    #[test]
    fn test_unknown_annotation_kind_rejected() {
        let yaml = "types:\n  - name: a.B\n    annotations:\n      - kind: Bogus\n";
        assert!(parse_descriptor_yaml(yaml).is_err());
    }

    #[test]
    fn test_loader_walks_directories_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.yaml"), "types:\n  - name: x.B\n").unwrap();
        std::fs::write(dir.path().join("a.yml"), "types:\n  - name: x.A\n").unwrap();
        std::fs::write(dir.path().join("nested/c.yaml"), "types:\n  - name: x.C\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let types = DescriptorLoader::new(dir.path()).load().unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["x.A", "x.B", "x.C"]);
    }

    #[test]
    fn test_loader_skips_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
        std::fs::write(dir.path().join(".cache/old.yaml"), "types:\n  - name: x.Old\n").unwrap();
        std::fs::write(dir.path().join(".draft.yaml"), "types: [ {").unwrap();
        std::fs::write(dir.path().join("card.yaml"), "types:\n  - name: x.Card\n").unwrap();

        let types = DescriptorLoader::new(dir.path()).load().unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["x.Card"]);
    }

    #[test]
    fn test_loader_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "types: [ {").unwrap();
        let err = DescriptorLoader::new(dir.path()).load().unwrap_err();
        assert_eq!(err.kind_name(), "Yaml");
        assert!(err.to_string().contains("broken.yaml"));
    }
}
