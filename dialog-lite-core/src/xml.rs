//! XML materialisation of a [`TargetTree`].

use std::fmt::Display;
use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use crate::error::{PluginError, Result};
use crate::target::{TargetId, TargetTree};

/// Namespaces declared on every document root.
pub const NAMESPACES: [(&str, &str); 5] = [
    ("xmlns:sling", "http://sling.apache.org/jcr/sling/1.0"),
    ("xmlns:granite", "http://www.adobe.com/jcr/granite/1.0"),
    ("xmlns:cq", "http://www.day.com/jcr/cq/1.0"),
    ("xmlns:jcr", "http://www.jcp.org/jcr/1.0"),
    ("xmlns:nt", "http://www.jcp.org/jcr/nt/1.0"),
];

pub const ROOT_NAME: &str = "jcr:root";

/// Whether `prefix` is bound by one of the root [`NAMESPACES`].
pub fn is_declared_prefix(prefix: &str) -> bool {
    NAMESPACES
        .iter()
        .any(|(key, _)| key.strip_prefix("xmlns:") == Some(prefix))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    /// Spaces per nesting level; 0 writes a single line
    pub indent: usize,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

fn xml_err(e: impl Display) -> PluginError {
    PluginError::Xml(e.to_string())
}

/// Serialize the tree as a standalone XML document.
pub fn render_document(tree: &TargetTree, options: &XmlOptions) -> Result<String> {
    let mut writer = if options.indent > 0 {
        Writer::new_with_indent(Cursor::new(Vec::new()), b' ', options.indent)
    } else {
        Writer::new(Cursor::new(Vec::new()))
    };

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    write_node(&mut writer, tree, tree.root(), true)?;

    let bytes = writer.into_inner().into_inner();
    let mut xml = String::from_utf8(bytes).map_err(xml_err)?;
    xml.push('\n');
    Ok(xml)
}

fn write_node(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    tree: &TargetTree,
    id: TargetId,
    is_root: bool,
) -> Result<()> {
    let name = tree.name(id);
    let mut start = BytesStart::new(name);
    if is_root {
        for (key, uri) in NAMESPACES {
            start.push_attribute((key, uri));
        }
    }
    for (key, value) in tree.attrs(id) {
        let rendered = value.render();
        start.push_attribute((key.as_str(), rendered.as_str()));
    }

    if tree.children(id).is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for &child in tree.children(id) {
        write_node(writer, tree, child, false)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)?;
    Ok(())
}

/// Render and write the document to `path`, creating parent directories.
pub fn write_document(tree: &TargetTree, path: &Path, options: &XmlOptions) -> Result<()> {
    let xml = render_document(tree, options)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PluginError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, xml).map_err(|source| PluginError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TargetTree {
        let mut tree = TargetTree::new(ROOT_NAME);
        let root = tree.root();
        tree.set_attr(root, "jcr:primaryType", "nt:unstructured");
        tree.set_attr(root, "jcr:title", "A & B");
        let items = tree.get_or_create(root, "content/items");
        let field = tree.create_child(items, "title");
        tree.set_attr(field, "required", true);
        tree
    }

    #[test]
    fn test_render_document_structure() {
        let xml = render_document(&sample(), &XmlOptions::default()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"xmlns:jcr="http://www.jcp.org/jcr/1.0""#));
        assert!(xml.contains(r#"jcr:title="A &amp; B""#));
        assert!(xml.contains(r#"<title required="{Boolean}true"/>"#));
        assert!(xml.contains("</jcr:root>"));

        let content = xml.find("<content").unwrap();
        let items = xml.find("<items").unwrap();
        assert!(content < items);
    }

    #[test]
    fn test_namespaces_only_on_root() {
        let xml = render_document(&sample(), &XmlOptions { indent: 0 }).unwrap();
        assert_eq!(xml.matches("xmlns:jcr").count(), 1);
        assert!(!xml.trim_end().contains('\n'));
    }

    /// Titles and option values with colons still yield namespace-well-formed XML.
    #[test]
    fn test_colon_names_resolve_against_root_namespaces() {
        use quick_xml::name::ResolveResult;
        use quick_xml::NsReader;

        let mut tree = TargetTree::new(ROOT_NAME);
        let root = tree.root();
        let items = tree.get_or_create(root, "cq:dialog/items");
        tree.create_child(items, "Step 1: Basics");
        tree.create_child(items, "tel:call");
        let xml = render_document(&tree, &XmlOptions::default()).unwrap();
        assert!(xml.contains("<Step_1__Basics/>"));
        assert!(xml.contains("<tel_call/>"));
        assert!(xml.contains("<cq:dialog>"));

        let mut reader = NsReader::from_str(&xml);
        let mut elements = 0;
        loop {
            match reader.read_resolved_event().unwrap() {
                (_, Event::Eof) => break,
                (ResolveResult::Unknown(prefix), event) => {
                    panic!("unbound prefix {:?} in {:?}", prefix, event)
                }
                (_, Event::Start(_) | Event::Empty(_)) => elements += 1,
                _ => {}
            }
        }
        assert_eq!(elements, 5);
    }

    #[test]
    fn test_write_document_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comp/_cq_dialog/.content.xml");
        write_document(&sample(), &path, &XmlOptions::default()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<jcr:root"));
    }
}
