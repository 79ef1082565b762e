//! Field substitution
//!
//! Walks the layer tree once and applies the job's field-value map to
//! matching leaf layers. Layer names are normalized (trimmed, uppercased)
//! to lookup keys, so "  Bride Name " on the canvas matches the field key
//! "BRIDE NAME". Text in a fixed paragraph box is shrunk in fixed
//! decrements until it fits or the floor size is reached; the size never
//! grows back.

use std::collections::HashMap;

use crate::document::{Document, LayerKind, LayerNode, TextLayer, normalize_name};
use crate::metrics;

/// Fixed decrement applied per shrink step, in points
pub const FONT_STEP_PT: f64 = 0.5;

/// Floor font size; shrink-to-fit never goes below this
pub const MIN_FONT_PT: f64 = 6.0;

/// Applies the field-value map to every matching leaf of the document
pub fn apply_fields(doc: &mut Document, fields: &HashMap<String, String>) {
    let lookup: HashMap<String, &String> = fields
        .iter()
        .map(|(key, value)| (normalize_name(key), value))
        .collect();

    apply_to_node(&mut doc.root, &lookup);
}

fn apply_to_node(node: &mut LayerNode, lookup: &HashMap<String, &String>) {
    match &mut node.kind {
        LayerKind::Group { children } => {
            // No substitution on the group itself.
            for child in children {
                apply_to_node(child, lookup);
            }
        }
        LayerKind::Text(text) => {
            if let Some(value) = lookup.get(&normalize_name(&node.name)) {
                text.content = (*value).clone();
                shrink_to_fit(text);
            }
        }
        LayerKind::Image(_) => {
            // Recognized extension point: image substitution is not part of
            // the merge-sheet job type.
        }
    }
}

/// Shrinks the font size until the content fits its paragraph box or the
/// floor is reached
///
/// Monotonic and one-directional: the size only ever decreases. Point text
/// (no paragraph box) is left untouched.
pub fn shrink_to_fit(text: &mut TextLayer) {
    let Some(frame) = text.paragraph else {
        return;
    };

    while metrics::overflows(&text.content, text.font_size_pt, &frame)
        && text.font_size_pt > MIN_FONT_PT
    {
        text.font_size_pt = (text.font_size_pt - FONT_STEP_PT).max(MIN_FONT_PT);
    }
}
