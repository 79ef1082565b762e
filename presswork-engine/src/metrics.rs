//! Text measurement for shrink-to-fit
//!
//! Deterministic approximation of how much vertical space a run of text
//! needs inside a paragraph box: average glyph width and line height are
//! derived from the font size, words wrap greedily, and a word longer than
//! a full line wraps at character boundaries. The numbers only have to be
//! consistent, not typographically exact, because the rasterizing host
//! applies the same sizes when it draws.

use crate::document::ParagraphBox;

/// Average glyph advance as a fraction of the font size
const GLYPH_WIDTH_FACTOR: f64 = 0.5;

/// Line height as a fraction of the font size
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Points to millimetres
const PT_TO_MM: f64 = 25.4 / 72.0;

/// Height in millimetres the text occupies when wrapped into `box_width_mm`
pub fn wrapped_height_mm(content: &str, font_size_pt: f64, box_width_mm: f64) -> f64 {
    let glyph_width_mm = font_size_pt * GLYPH_WIDTH_FACTOR * PT_TO_MM;
    let line_height_mm = font_size_pt * LINE_HEIGHT_FACTOR * PT_TO_MM;

    let glyphs_per_line = ((box_width_mm / glyph_width_mm).floor() as usize).max(1);

    let mut lines = 0usize;
    for raw_line in content.split('\n') {
        lines += wrapped_line_count(raw_line, glyphs_per_line);
    }

    lines as f64 * line_height_mm
}

/// True when the text does not fit the paragraph box at the given size
pub fn overflows(content: &str, font_size_pt: f64, frame: &ParagraphBox) -> bool {
    wrapped_height_mm(content, font_size_pt, frame.width_mm) > frame.height_mm + 1e-9
}

/// Number of display lines one logical line wraps into
fn wrapped_line_count(line: &str, glyphs_per_line: usize) -> usize {
    let words: Vec<usize> = line.split_whitespace().map(|w| w.chars().count()).collect();
    if words.is_empty() {
        // An empty logical line still occupies one display line.
        return 1;
    }

    let mut lines = 1usize;
    let mut used = 0usize;

    for word_len in words {
        if word_len > glyphs_per_line {
            // Character-wrap an over-long word onto fresh lines.
            if used > 0 {
                lines += 1;
            }
            lines += word_len.div_ceil(glyphs_per_line) - 1;
            used = word_len - (word_len / glyphs_per_line) * glyphs_per_line;
            if used == 0 {
                used = glyphs_per_line;
            }
            continue;
        }

        let needed = if used == 0 { word_len } else { used + 1 + word_len };
        if needed <= glyphs_per_line {
            used = needed;
        } else {
            lines += 1;
            used = word_len;
        }
    }

    lines
}
