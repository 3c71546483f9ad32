use fixsom_core::PageSnapshot;
use fixsom_core::model::SnapshotBuilder;

use crate::rng::XorShift64;

const EM: f64 = 10.0;
const LEADING: f64 = 12.0;
const COLUMN_WIDTH: f64 = 160.0;
const GUTTER: f64 = 20.0;

/// Builds a page of `columns` text columns split by ruling lines, with a
/// 4x3 ruled table below them.
pub fn columns_with_table(columns: usize, lines: usize, rng: &mut XorShift64) -> PageSnapshot {
    let mut b = SnapshotBuilder::new();
    let column_bottom = lines as f64 * LEADING;

    for col in 0..columns {
        let x = col as f64 * (COLUMN_WIDTH + GUTTER);
        if col > 0 {
            let rule = x - GUTTER / 2.0;
            b.add_line((rule, 0.0), (rule, column_bottom));
        }
        for line in 0..lines {
            // word-wrapped fragments, two per line
            let top = line as f64 * LEADING + rng.jitter(0.2);
            b.add_text("lorem ipsum dolor", x, top, EM);
            b.add_text("sit amet", x + 90.0, top, EM);
        }
    }

    let table_top = column_bottom + 40.0;
    let (cols, rows) = (4, 3);
    let (cell_w, cell_h) = (60.0, 20.0);
    let right = cols as f64 * cell_w;
    let bottom = table_top + rows as f64 * cell_h;
    for r in 0..=rows {
        let y = table_top + r as f64 * cell_h + rng.jitter(0.3);
        b.add_line((0.0, y), (right, y));
    }
    for c in 0..=cols {
        let x = c as f64 * cell_w + rng.jitter(0.3);
        b.add_line((x, table_top), (x, bottom));
    }
    for r in 0..rows {
        for c in 0..cols {
            let top = table_top + r as f64 * cell_h + 5.0;
            b.add_text("cell", c as f64 * cell_w + 5.0, top, EM);
        }
    }
    b.finish()
}
