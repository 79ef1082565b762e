//! Job automation
//!
//! The top-level procedure for one payload: walk the production items in
//! order, open each item's template fresh, substitute its fields, and
//! export the press files. Items on metal stock produce a base and a mask
//! file, and both must succeed for the job to count as done. Any failure
//! aborts the whole job so the press room never receives a partial sheet
//! set.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use presswork_core::domain::job::JobKind;
use presswork_core::dto::ipc::{JobPayload, PayloadItem};

use crate::document::{Document, LayerKind};
use crate::export::{ExportBackend, ExportSettings};
use crate::separation;
use crate::substitute;

/// Runs the full automation for one payload, returning the artifact paths
/// in production order
pub fn run(payload: &JobPayload, backend: &dyn ExportBackend) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&payload.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            payload.output_dir.display()
        )
    })?;

    let mut artifacts = Vec::new();
    for (index, item) in payload.items.iter().enumerate() {
        let span = tracing::info_span!("item", order_id = %item.order_id, index);
        let _guard = span.enter();

        let produced = match payload.kind {
            JobKind::MergeSheet => render_item(item, index, &payload.output_dir, backend)?,
            JobKind::LoadLayers => vec![inventory_item(item, index, &payload.output_dir)?],
        };
        artifacts.extend(produced);
    }

    tracing::info!(count = artifacts.len(), "Automation produced all artifacts");
    Ok(artifacts)
}

/// Stable per-item file stem; the index prefix keeps repeated orders on one
/// sheet from colliding
fn item_stem(item: &PayloadItem, index: usize) -> String {
    format!("{:02}-{}", index + 1, item.order_id)
}

fn render_item(
    item: &PayloadItem,
    index: usize,
    output_dir: &Path,
    backend: &dyn ExportBackend,
) -> Result<Vec<PathBuf>> {
    // Opened fresh per item so substitutions never leak between items
    // sharing a template.
    let mut doc = Document::load(&item.template_path)?;
    substitute::apply_fields(&mut doc, &item.fields);

    let stem = item_stem(item, index);

    if item.export.metal {
        let base_path = output_dir.join(format!("{stem}-base.pdf"));
        let mut base = doc.clone();
        separation::apply(&mut base, &separation::base_pass(&doc));
        backend
            .export(&base, &ExportSettings::print(), &base_path)
            .with_context(|| format!("Base pass failed for {}", item.order_id))?;

        let mask_path = output_dir.join(format!("{stem}-mask.pdf"));
        let mut mask = doc.clone();
        separation::apply(&mut mask, &separation::mask_pass(&doc));
        separation::apply_knockout(&mut mask);
        backend
            .export(&mask, &ExportSettings::print(), &mask_path)
            .with_context(|| format!("Mask pass failed for {}", item.order_id))?;

        return Ok(vec![base_path, mask_path]);
    }

    let print_path = output_dir.join(format!("{stem}.pdf"));
    backend
        .export(&doc, &ExportSettings::print(), &print_path)
        .with_context(|| format!("Print export failed for {}", item.order_id))?;

    let preview_path = output_dir.join(format!("{stem}-preview.png"));
    backend
        .export(&doc, &ExportSettings::preview(), &preview_path)
        .with_context(|| format!("Preview export failed for {}", item.order_id))?;

    Ok(vec![print_path, preview_path])
}

/// One row of the layer inventory artifact
#[derive(Debug, Serialize)]
struct LayerEntry {
    path: Vec<usize>,
    name: String,
    kind: &'static str,
    visible: bool,
}

/// Writes the template's layer inventory so the storefront can offer its
/// editable fields without opening the design tool
fn inventory_item(item: &PayloadItem, index: usize, output_dir: &Path) -> Result<PathBuf> {
    let doc = Document::load(&item.template_path)?;

    let mut entries = Vec::new();
    doc.visit(&mut |path, node| {
        entries.push(LayerEntry {
            path: path.clone(),
            name: node.name.clone(),
            kind: match node.kind {
                LayerKind::Text(_) => "text",
                LayerKind::Image(_) => "image",
                LayerKind::Group { .. } => "group",
            },
            visible: node.visible,
        });
    });

    let out_path = output_dir.join(format!("{}-layers.json", item_stem(item, index)));
    let json = serde_json::to_string_pretty(&entries).context("Failed to serialize inventory")?;
    std::fs::write(&out_path, json)
        .with_context(|| format!("Failed to write inventory {}", out_path.display()))?;

    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ColorMode, RenderSpecBackend};
    use presswork_core::domain::item::ExportConfig;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use uuid::Uuid;

    /// Backend that keeps every export in memory and can be told to fail
    /// on a path substring
    #[derive(Default)]
    struct RecordingBackend {
        exports: RefCell<Vec<(PathBuf, ExportSettings, Document)>>,
        fail_on: Option<&'static str>,
    }

    impl ExportBackend for RecordingBackend {
        fn export(&self, doc: &Document, settings: &ExportSettings, path: &Path) -> Result<()> {
            if let Some(needle) = self.fail_on
                && path.to_string_lossy().contains(needle)
            {
                anyhow::bail!("simulated raster failure");
            }
            self.exports
                .borrow_mut()
                .push((path.to_path_buf(), settings.clone(), doc.clone()));
            Ok(())
        }
    }

    fn write_template(dir: &Path, name: &str) -> PathBuf {
        let json = serde_json::json!({
            "name": name,
            "width_mm": 100.0,
            "height_mm": 150.0,
            "root": {
                "name": "ROOT",
                "type": "group",
                "children": [
                    { "name": "Guest Name", "type": "text",
                      "content": "placeholder", "font_size_pt": 14.0 },
                    { "name": "Metal Crest", "type": "text",
                      "content": "crest", "font_size_pt": 20.0 }
                ]
            }
        });
        let path = dir.join(format!("{name}.json"));
        std::fs::write(&path, json.to_string()).unwrap();
        path
    }

    fn payload(kind: JobKind, output_dir: PathBuf, items: Vec<PayloadItem>) -> JobPayload {
        JobPayload {
            job_id: Uuid::new_v4(),
            kind,
            output_dir,
            items,
        }
    }

    fn item(template: PathBuf, order: &str, metal: bool, fields: &[(&str, &str)]) -> PayloadItem {
        PayloadItem {
            order_id: order.to_string(),
            template_path: template,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            export: ExportConfig { metal },
            quantity: 1,
        }
    }

    fn text_of(doc: &Document, layer: &str) -> String {
        let mut found = String::new();
        doc.visit_effective(&mut |_, node, visible| {
            if visible
                && node.name == layer
                && let LayerKind::Text(t) = &node.kind
            {
                found = t.content.clone();
            }
        });
        found
    }

    #[test]
    fn test_plain_item_exports_print_and_preview() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path(), "card");
        let backend = RecordingBackend::default();

        let artifacts = run(
            &payload(
                JobKind::MergeSheet,
                dir.path().join("out"),
                vec![item(template, "ORD-1", false, &[("GUEST NAME", "Ada")])],
            ),
            &backend,
        )
        .unwrap();

        assert_eq!(artifacts.len(), 2);
        let exports = backend.exports.borrow();
        assert_eq!(exports[0].1.color, ColorMode::Cmyk);
        assert_eq!(exports[1].1.color, ColorMode::Rgb);
        assert_eq!(text_of(&exports[0].2, "Guest Name"), "Ada");
    }

    #[test]
    fn test_metal_item_exports_base_and_mask() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path(), "foil");
        let backend = RecordingBackend::default();

        let artifacts = run(
            &payload(
                JobKind::MergeSheet,
                dir.path().join("out"),
                vec![item(template, "ORD-2", true, &[])],
            ),
            &backend,
        )
        .unwrap();

        let names: Vec<String> = artifacts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01-ORD-2-base.pdf", "01-ORD-2-mask.pdf"]);

        let exports = backend.exports.borrow();
        // Base hides the specialty crest, mask hides everything else.
        assert_eq!(text_of(&exports[0].2, "Metal Crest"), "");
        assert_eq!(text_of(&exports[0].2, "Guest Name"), "placeholder");
        assert_eq!(text_of(&exports[1].2, "Metal Crest"), "crest");
        assert_eq!(text_of(&exports[1].2, "Guest Name"), "");
    }

    #[test]
    fn test_failing_mask_pass_fails_the_whole_job() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path(), "foil");
        let backend = RecordingBackend {
            fail_on: Some("-mask"),
            ..Default::default()
        };

        let err = run(
            &payload(
                JobKind::MergeSheet,
                dir.path().join("out"),
                vec![item(template, "ORD-3", true, &[])],
            ),
            &backend,
        )
        .unwrap_err();

        assert!(err.to_string().contains("Mask pass failed"));
        // The base pass alone is never a usable outcome.
        assert_eq!(backend.exports.borrow().len(), 1);
    }

    #[test]
    fn test_items_sharing_a_template_do_not_leak_substitutions() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path(), "card");
        let backend = RecordingBackend::default();

        run(
            &payload(
                JobKind::MergeSheet,
                dir.path().join("out"),
                vec![
                    item(template.clone(), "ORD-A", false, &[("GUEST NAME", "Ada")]),
                    item(template, "ORD-B", false, &[("GUEST NAME", "Grace")]),
                ],
            ),
            &backend,
        )
        .unwrap();

        let exports = backend.exports.borrow();
        assert_eq!(text_of(&exports[0].2, "Guest Name"), "Ada");
        assert_eq!(text_of(&exports[2].2, "Guest Name"), "Grace");
    }

    #[test]
    fn test_load_layers_writes_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path(), "card");

        let artifacts = run(
            &payload(
                JobKind::LoadLayers,
                dir.path().join("out"),
                vec![item(template, "TPL-card", false, &[])],
            ),
            &RenderSpecBackend,
        )
        .unwrap();

        assert_eq!(artifacts.len(), 1);
        let raw = std::fs::read_to_string(&artifacts[0]).unwrap();
        let entries: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let names: Vec<&str> = entries
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["ROOT", "Guest Name", "Metal Crest"]);
    }

    #[test]
    fn test_missing_template_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &payload(
                JobKind::MergeSheet,
                dir.path().join("out"),
                vec![item(dir.path().join("nope.json"), "ORD-9", false, &[])],
            ),
            &RecordingBackend::default(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("Failed to read template"));
    }
}
