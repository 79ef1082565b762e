//! Specialty stock separation
//!
//! Items destined for metal foil stock are printed in two passes: a base
//! pass with everything except the specialty artwork, and a mask pass with
//! only the specialty artwork, knocked out to solid black so the press can
//! use it as a foil stencil. Layers opt into the specialty pass through
//! their name: any layer whose normalized name contains the keyword is
//! specialty, and so is everything below it.

use std::collections::HashMap;

use crate::document::{Cmyk, Document, LayerKind, NodePath};

/// Substring of a normalized layer name that marks the layer (and its
/// subtree) as specialty artwork
pub const SPECIALTY_KEYWORD: &str = "METAL";

/// Desired visibility per tree path, computed over the original document
pub type VisibilityPlan = HashMap<NodePath, bool>;

fn is_specialty(name: &str) -> bool {
    crate::document::normalize_name(name).contains(SPECIALTY_KEYWORD)
}

/// Paths of every node that is specialty, directly or through an ancestor
fn specialty_paths(doc: &Document) -> VisibilityPlan {
    let mut marked = VisibilityPlan::new();
    let mut stack: Vec<bool> = vec![false];

    doc.visit(&mut |path, node| {
        // The visit is preorder, so the stack mirrors the ancestor chain.
        stack.truncate(path.len() + 1);
        let inherited = *stack.last().unwrap_or(&false);
        let specialty = inherited || is_specialty(&node.name);
        stack.push(specialty);
        marked.insert(path.clone(), specialty);
    });

    marked
}

/// Visibility plan for the base pass: every layer keeps its original
/// visibility except specialty artwork, which is hidden
pub fn base_pass(doc: &Document) -> VisibilityPlan {
    let marked = specialty_paths(doc);
    let mut plan = VisibilityPlan::new();
    doc.visit(&mut |path, node| {
        let specialty = marked.get(path).copied().unwrap_or(false);
        plan.insert(path.clone(), node.visible && !specialty);
    });
    plan
}

/// Visibility plan for the mask pass: only specialty artwork and the
/// groups needed to reach it remain visible
pub fn mask_pass(doc: &Document) -> VisibilityPlan {
    let marked = specialty_paths(doc);
    let mut plan = VisibilityPlan::new();

    doc.visit(&mut |path, node| {
        let specialty = marked.get(path).copied().unwrap_or(false);
        let ancestor_of_specialty = matches!(node.kind, LayerKind::Group { .. })
            && marked
                .iter()
                .any(|(p, &s)| s && p.len() > path.len() && p.starts_with(path));
        plan.insert(path.clone(), node.visible && (specialty || ancestor_of_specialty));
    });

    plan
}

/// Applies a visibility plan to the document in place
pub fn apply(doc: &mut Document, plan: &VisibilityPlan) {
    for (path, &visible) in plan {
        if let Some(node) = doc.node_mut(path) {
            node.visible = visible;
        }
    }
}

/// Repaints every effectively visible text layer to the solid knockout
/// black used for the foil stencil
pub fn apply_knockout(doc: &mut Document) {
    let mut targets: Vec<NodePath> = Vec::new();
    doc.visit_effective(&mut |path, node, visible| {
        if visible && matches!(node.kind, LayerKind::Text(_)) {
            targets.push(path.clone());
        }
    });

    for path in targets {
        if let Some(node) = doc.node_mut(&path)
            && let LayerKind::Text(text) = &mut node.kind
        {
            text.fill = Cmyk::KNOCKOUT;
        }
    }
}
