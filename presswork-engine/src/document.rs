//! Design template document model
//!
//! A template is a JSON document holding a layer tree. The engine opens the
//! template fresh for every production item and edits only the in-memory
//! copy; the template file on disk is never rewritten.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Address of a node in the layer tree: child indices from the root
pub type NodePath = Vec<usize>;

/// A design template document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub width_mm: f64,
    pub height_mm: f64,
    pub root: LayerNode,
}

/// One node of the layer tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerNode {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(flatten)]
    pub kind: LayerKind,
}

fn default_visible() -> bool {
    true
}

/// Layer content
///
/// A `Group`'s effective visibility gates all descendants during export:
/// a hidden group suppresses visible children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Text(TextLayer),
    Image(ImageLayer),
    Group { children: Vec<LayerNode> },
}

/// A text layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLayer {
    pub content: String,
    pub font_size_pt: f64,
    #[serde(default = "Cmyk::black")]
    pub fill: Cmyk,
    /// Present for fixed-size paragraph boxes; absent for free point text.
    /// Only fixed boxes participate in shrink-to-fit.
    #[serde(default)]
    pub paragraph: Option<ParagraphBox>,
}

/// Fixed paragraph box dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParagraphBox {
    pub width_mm: f64,
    pub height_mm: f64,
}

/// An embedded image layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLayer {
    #[serde(default)]
    pub source: Option<PathBuf>,
}

/// CMYK fill color, channel values in percent (0..=100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

impl Cmyk {
    /// Plain text black
    pub fn black() -> Self {
        Self {
            c: 0.0,
            m: 0.0,
            y: 0.0,
            k: 100.0,
        }
    }

    /// Solid single-channel black used as the knockout value in the mask
    /// pass of a specialty separation
    pub const KNOCKOUT: Cmyk = Cmyk {
        c: 0.0,
        m: 0.0,
        y: 0.0,
        k: 100.0,
    };
}

impl Document {
    /// Loads a template document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse template {}", path.display()))
    }

    /// Visits every node exactly once, preorder, with its tree path
    pub fn visit(&self, f: &mut impl FnMut(&NodePath, &LayerNode)) {
        let mut path = NodePath::new();
        visit_node(&self.root, &mut path, f);
    }

    /// Visits every node with its effective visibility (a hidden ancestor
    /// group hides all descendants)
    pub fn visit_effective(&self, f: &mut impl FnMut(&NodePath, &LayerNode, bool)) {
        let mut path = NodePath::new();
        visit_effective_node(&self.root, &mut path, true, f);
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_, _| count += 1);
        count
    }

    /// Mutable access to the node at `path`
    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut LayerNode> {
        let mut node = &mut self.root;
        for &index in path {
            match &mut node.kind {
                LayerKind::Group { children } => node = children.get_mut(index)?,
                _ => return None,
            }
        }
        Some(node)
    }
}

fn visit_node(node: &LayerNode, path: &mut NodePath, f: &mut impl FnMut(&NodePath, &LayerNode)) {
    f(path, node);
    if let LayerKind::Group { children } = &node.kind {
        for (index, child) in children.iter().enumerate() {
            path.push(index);
            visit_node(child, path, f);
            path.pop();
        }
    }
}

fn visit_effective_node(
    node: &LayerNode,
    path: &mut NodePath,
    ancestors_visible: bool,
    f: &mut impl FnMut(&NodePath, &LayerNode, bool),
) {
    let effective = ancestors_visible && node.visible;
    f(path, node, effective);
    if let LayerKind::Group { children } = &node.kind {
        for (index, child) in children.iter().enumerate() {
            path.push(index);
            visit_effective_node(child, path, effective, f);
            path.pop();
        }
    }
}

/// Normalizes a layer name or field key for lookup: surrounding whitespace
/// stripped, uppercased
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn text(name: &str, content: &str) -> LayerNode {
        LayerNode {
            name: name.to_string(),
            visible: true,
            kind: LayerKind::Text(TextLayer {
                content: content.to_string(),
                font_size_pt: 12.0,
                fill: Cmyk::black(),
                paragraph: None,
            }),
        }
    }

    pub fn group(name: &str, children: Vec<LayerNode>) -> LayerNode {
        LayerNode {
            name: name.to_string(),
            visible: true,
            kind: LayerKind::Group { children },
        }
    }

    pub fn doc(root: LayerNode) -> Document {
        Document {
            name: "fixture".to_string(),
            width_mm: 100.0,
            height_mm: 150.0,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn sample() -> Document {
        doc(group(
            "ROOT",
            vec![
                text("Bride Name", "placeholder"),
                group("Ornaments", vec![text("caption", "hello")]),
            ],
        ))
    }

    #[test]
    fn test_visit_sees_every_node_exactly_once() {
        let doc = sample();
        let mut seen = Vec::new();
        doc.visit(&mut |path, node| seen.push((path.clone(), node.name.clone())));

        assert_eq!(seen.len(), 4);
        assert_eq!(doc.node_count(), 4);
        assert_eq!(seen[0], (vec![], "ROOT".to_string()));
        assert_eq!(seen[2], (vec![1], "Ornaments".to_string()));
        assert_eq!(seen[3], (vec![1, 0], "caption".to_string()));
    }

    #[test]
    fn test_hidden_group_suppresses_visible_children() {
        let mut doc = sample();
        doc.node_mut(&[1]).unwrap().visible = false;

        let mut effective = Vec::new();
        doc.visit_effective(&mut |_, node, visible| {
            effective.push((node.name.clone(), visible));
        });

        assert!(effective.contains(&("Bride Name".to_string(), true)));
        assert!(effective.contains(&("Ornaments".to_string(), false)));
        // The caption itself is marked visible but the hidden group gates it.
        assert!(effective.contains(&("caption".to_string(), false)));
    }

    #[test]
    fn test_node_mut_addresses_by_path() {
        let mut doc = sample();
        doc.node_mut(&[1, 0]).unwrap().name = "renamed".to_string();

        let mut names = Vec::new();
        doc.visit(&mut |_, node| names.push(node.name.clone()));
        assert!(names.contains(&"renamed".to_string()));

        assert!(doc.node_mut(&[0, 0]).is_none());
        assert!(doc.node_mut(&[5]).is_none());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Bride Name "), "BRIDE NAME");
        assert_eq!(normalize_name("metal_foil"), "METAL_FOIL");
    }

    #[test]
    fn test_template_json_round_trip() {
        let json = serde_json::json!({
            "name": "card",
            "width_mm": 100.0,
            "height_mm": 150.0,
            "root": {
                "name": "ROOT",
                "type": "group",
                "children": [
                    {
                        "name": "Greeting",
                        "type": "text",
                        "content": "Hello",
                        "font_size_pt": 14.0,
                        "paragraph": { "width_mm": 80.0, "height_mm": 20.0 }
                    },
                    { "name": "Photo", "type": "image" }
                ]
            }
        });

        let doc: Document = serde_json::from_value(json).unwrap();
        assert_eq!(doc.node_count(), 3);

        match &doc.root.kind {
            LayerKind::Group { children } => {
                assert!(matches!(children[0].kind, LayerKind::Text(_)));
                assert!(matches!(children[1].kind, LayerKind::Image(_)));
            }
            _ => panic!("root should be a group"),
        }

        // Visibility defaults to true when omitted.
        assert!(doc.root.visible);
    }
}
