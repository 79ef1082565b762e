//! Imposition planner
//!
//! Lays out N identical items on a fixed press sheet, choosing the item
//! orientation (upright or rotated 90 degrees) that maximizes yield. This is
//! the sole optimization: mixed orientations within one sheet are out of
//! scope. Pure and deterministic, safe to call on every UI input change.

use thiserror::Error;

use crate::domain::layout::{Dimensions, Placement, SheetLayout};

/// Errors the planner can report
#[derive(Debug, Error, PartialEq)]
pub enum ImpositionError {
    /// The item does not fit on the sheet in either orientation. Callers
    /// must surface this as a blocking validation error, never as a layout
    /// with zero sheets.
    #[error("item {item_width_mm}x{item_height_mm}mm does not fit on a {sheet_width_mm}x{sheet_height_mm}mm sheet in either orientation")]
    ItemTooLarge {
        item_width_mm: f64,
        item_height_mm: f64,
        sheet_width_mm: f64,
        sheet_height_mm: f64,
    },

    /// A layout for zero items is meaningless
    #[error("total item count must be at least 1")]
    NoItems,

    /// Non-positive dimensions or a negative gap
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Grid fit of one item orientation on the sheet
#[derive(Debug, Clone, Copy)]
struct GridFit {
    cols: u32,
    rows: u32,
    item: Dimensions,
}

impl GridFit {
    fn count(self) -> u32 {
        self.cols * self.rows
    }
}

/// Computes how many columns and rows of `item` fit on `canvas` with `gap`
/// millimetres between neighbours.
///
/// A grid of n items along one axis occupies `n*item + (n-1)*gap`, which is
/// why the gap is added to both sides of the division.
fn fit(canvas: Dimensions, item: Dimensions, gap_mm: f64) -> GridFit {
    let cols = ((canvas.width_mm + gap_mm) / (item.width_mm + gap_mm)).floor() as u32;
    let rows = ((canvas.height_mm + gap_mm) / (item.height_mm + gap_mm)).floor() as u32;
    GridFit { cols, rows, item }
}

/// Plans an N-up layout for `total_items` copies of `item` on `canvas`.
///
/// The orientation with the strictly larger yield wins; on a tie the
/// upright (non-rotated) orientation is kept. The resulting grid is
/// centred on the sheet with the leftover margin split evenly per axis.
pub fn plan(
    canvas: Dimensions,
    item: Dimensions,
    total_items: u32,
    gap_mm: f64,
) -> Result<SheetLayout, ImpositionError> {
    if canvas.width_mm <= 0.0 || canvas.height_mm <= 0.0 {
        return Err(ImpositionError::InvalidInput(
            "sheet dimensions must be positive".to_string(),
        ));
    }
    if item.width_mm <= 0.0 || item.height_mm <= 0.0 {
        return Err(ImpositionError::InvalidInput(
            "item dimensions must be positive".to_string(),
        ));
    }
    if gap_mm < 0.0 {
        return Err(ImpositionError::InvalidInput(
            "gap must not be negative".to_string(),
        ));
    }
    if total_items == 0 {
        return Err(ImpositionError::NoItems);
    }

    let upright = fit(canvas, item, gap_mm);
    let turned = fit(canvas, item.rotated(), gap_mm);

    // Strictly larger yield wins; ties keep the upright orientation.
    let (chosen, rotated) = if turned.count() > upright.count() {
        (turned, true)
    } else {
        (upright, false)
    };

    let items_per_sheet = chosen.count();
    if items_per_sheet == 0 {
        return Err(ImpositionError::ItemTooLarge {
            item_width_mm: item.width_mm,
            item_height_mm: item.height_mm,
            sheet_width_mm: canvas.width_mm,
            sheet_height_mm: canvas.height_mm,
        });
    }

    let grid_width =
        chosen.cols as f64 * chosen.item.width_mm + (chosen.cols - 1) as f64 * gap_mm;
    let grid_height =
        chosen.rows as f64 * chosen.item.height_mm + (chosen.rows - 1) as f64 * gap_mm;
    let margin_x = (canvas.width_mm - grid_width) / 2.0;
    let margin_y = (canvas.height_mm - grid_height) / 2.0;

    let mut placements = Vec::with_capacity(items_per_sheet as usize);
    for row in 0..chosen.rows {
        for col in 0..chosen.cols {
            placements.push(Placement {
                x_mm: margin_x + col as f64 * (chosen.item.width_mm + gap_mm),
                y_mm: margin_y + row as f64 * (chosen.item.height_mm + gap_mm),
                width_mm: chosen.item.width_mm,
                height_mm: chosen.item.height_mm,
            });
        }
    }

    let total_sheets = total_items.div_ceil(items_per_sheet);
    let waste_fraction =
        1.0 - (items_per_sheet as f64 * chosen.item.area_mm2()) / canvas.area_mm2();

    Ok(SheetLayout {
        sheet: canvas,
        rows: chosen.rows,
        cols: chosen.cols,
        items_per_sheet,
        total_sheets,
        rotated,
        placements,
        waste_fraction,
    })
}
