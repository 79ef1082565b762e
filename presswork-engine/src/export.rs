//! Export backends
//!
//! The engine does not rasterize artwork itself. It flattens the layer tree
//! into an ordered list of draw operations and hands them to an
//! [`ExportBackend`] together with the output settings. The backend shipped
//! here writes the render spec as JSON for the downstream raster processor;
//! tests substitute a recording backend.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::document::{Cmyk, Document, LayerKind};

/// Color handling for an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Cmyk,
    Rgb,
}

/// Output settings for one exported file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    pub color: ColorMode,
    pub icc_profile: String,
    pub compression: bool,
    pub dpi: u32,
}

impl ExportSettings {
    /// Press-ready output: CMYK under the house coated profile
    pub fn print() -> Self {
        Self {
            color: ColorMode::Cmyk,
            icc_profile: "Coated FOGRA39".to_string(),
            compression: true,
            dpi: 300,
        }
    }

    /// Low-resolution screen proof
    pub fn preview() -> Self {
        Self {
            color: ColorMode::Rgb,
            icc_profile: "sRGB".to_string(),
            compression: true,
            dpi: 72,
        }
    }
}

/// One flattened draw operation, in paint order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DrawOp {
    Text {
        layer: String,
        content: String,
        font_size_pt: f64,
        fill: Cmyk,
    },
    Image {
        layer: String,
        #[serde(default)]
        source: Option<String>,
    },
}

/// A fully flattened document ready for rasterization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSpec {
    pub document: String,
    pub width_mm: f64,
    pub height_mm: f64,
    pub settings: ExportSettings,
    pub ops: Vec<DrawOp>,
}

/// Flattens the effectively visible leaves of the document into paint order
pub fn flatten(doc: &Document, settings: &ExportSettings) -> RenderSpec {
    let mut ops = Vec::new();

    doc.visit_effective(&mut |_, node, visible| {
        if !visible {
            return;
        }
        match &node.kind {
            LayerKind::Text(text) => ops.push(DrawOp::Text {
                layer: node.name.clone(),
                content: text.content.clone(),
                font_size_pt: text.font_size_pt,
                fill: text.fill,
            }),
            LayerKind::Image(image) => ops.push(DrawOp::Image {
                layer: node.name.clone(),
                source: image
                    .source
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            }),
            LayerKind::Group { .. } => {}
        }
    });

    RenderSpec {
        document: doc.name.clone(),
        width_mm: doc.width_mm,
        height_mm: doc.height_mm,
        settings: settings.clone(),
        ops,
    }
}

/// Produces one output file from a document
pub trait ExportBackend {
    fn export(&self, doc: &Document, settings: &ExportSettings, path: &Path) -> Result<()>;
}

/// Backend that writes the flattened render spec as JSON next to where the
/// rasterizing host expects its input
#[derive(Debug, Default)]
pub struct RenderSpecBackend;

impl ExportBackend for RenderSpecBackend {
    fn export(&self, doc: &Document, settings: &ExportSettings, path: &Path) -> Result<()> {
        let spec = flatten(doc, settings);
        let json = serde_json::to_string_pretty(&spec)
            .context("Failed to serialize render spec")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write export {}", path.display()))?;
        tracing::debug!(path = %path.display(), ops = spec.ops.len(), "Wrote export");
        Ok(())
    }
}
