//! Sheet layout domain model
//!
//! Output of the imposition planner: how many copies of an item fit on one
//! press sheet and where each copy sits. A layout is always recomputed from
//! its inputs and never persisted as authoritative.

use serde::{Deserialize, Serialize};

/// Axis-aligned dimensions in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Dimensions {
    pub fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// The same dimensions rotated 90 degrees
    pub fn rotated(self) -> Self {
        Self {
            width_mm: self.height_mm,
            height_mm: self.width_mm,
        }
    }

    pub fn area_mm2(self) -> f64 {
        self.width_mm * self.height_mm
    }
}

/// Placement of one item copy on a sheet, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// A computed N-up sheet layout
///
/// Invariants:
/// - `rows * cols == items_per_sheet`
/// - every placement lies fully within the sheet bounds
/// - `total_sheets == ceil(total_items / items_per_sheet)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetLayout {
    pub sheet: Dimensions,
    pub rows: u32,
    pub cols: u32,
    pub items_per_sheet: u32,
    pub total_sheets: u32,
    /// True when the 90-degree rotated item orientation was selected
    pub rotated: bool,
    /// Placements for one sheet, row-major so the physical cutting order
    /// matches the item order
    pub placements: Vec<Placement>,
    /// Fraction of the sheet area not covered by items
    pub waste_fraction: f64,
}
