//! Table detection over the ruling-line registry.
//!
//! Tables come purely from line geometry: crossings of horizontal and
//! vertical rulings close rectangular cells, adjacent cells form rows and
//! boundary-adjacent rows form tables. Text is only attached afterwards,
//! by moving finished blocks into the cells that cover them.

mod grid;
mod intersections;

use tracing::debug;

use crate::construct::group_boxes;
use crate::lines::LineRegistry;
use crate::params::SomParams;
use crate::som::{FixedBlock, SemanticBox, Table, TableCell, reading_order};
use crate::utils::BBox;

use grid::{cells_to_rows, crossings_to_cells, rows_to_tables};
use intersections::{collect_edges, edges_to_crossings};

/// Detects the table structure drawn by the registered ruling lines.
///
/// Returned tables have empty cells. Single-cell tables are discarded and
/// tables lying inside a cell of a larger table are nested into that cell.
pub fn detect_tables(registry: &LineRegistry, params: &SomParams) -> Vec<Table> {
    if registry.horizontal_count() < 2 || registry.vertical_count() < 2 {
        return Vec::new();
    }
    let tol = params.table_tolerance;
    let store = collect_edges(registry, tol);
    let crossings = edges_to_crossings(&store, tol);
    let cells = crossings_to_cells(&crossings);
    let cell_count = cells.len();
    let tables: Vec<Table> = rows_to_tables(cells_to_rows(cells, tol), tol)
        .into_iter()
        .filter(|t| t.cell_count() > 1)
        .collect();
    debug!(
        crossings = crossings.len(),
        cells = cell_count,
        tables = tables.len(),
        "table structure detected"
    );
    nest_tables(tables, tol)
}

fn area(b: &BBox) -> f64 {
    b.width() * b.height()
}

/// Position of the smallest cell of `table` accepted by `fits`.
fn best_cell(table: &Table, fits: &dyn Fn(&BBox) -> bool) -> Option<(usize, usize)> {
    table
        .rows
        .iter()
        .enumerate()
        .flat_map(|(r, row)| row.cells.iter().enumerate().map(move |(c, cell)| (r, c, cell)))
        .filter(|(_, _, cell)| fits(&cell.bbox))
        .min_by(|a, b| area(&a.2.bbox).total_cmp(&area(&b.2.bbox)))
        .map(|(r, c, _)| (r, c))
}

/// The deepest cell accepted by `fits`, descending into nested tables.
pub(crate) fn innermost_cell<'t>(
    table: &'t mut Table,
    fits: &dyn Fn(&BBox) -> bool,
) -> Option<&'t mut TableCell> {
    let (r, c) = best_cell(table, fits)?;
    let cell = &mut table.rows[r].cells[c];
    let nested = cell.children.iter().position(|child| match child {
        SemanticBox::Table(t) => best_cell(t, fits).is_some(),
        _ => false,
    });
    match nested {
        Some(i) => match &mut cell.children[i] {
            SemanticBox::Table(t) => innermost_cell(t, fits),
            _ => None,
        },
        None => Some(cell),
    }
}

/// Puts `guest` into the innermost cell of `host` that contains it.
/// Gives the table back if no cell does.
pub(crate) fn absorb_table(host: &mut Table, guest: Table, tolerance: f64) -> Result<(), Table> {
    let bbox = guest.bbox;
    match innermost_cell(host, &|c: &BBox| c.contains(&bbox, tolerance)) {
        Some(cell) => {
            cell.children.push(SemanticBox::Table(guest));
            Ok(())
        }
        None => Err(guest),
    }
}

/// Nests every table into the smallest cell of another table containing it.
fn nest_tables(mut tables: Vec<Table>, tolerance: f64) -> Vec<Table> {
    tables.sort_by(|a, b| {
        area(&b.bbox)
            .total_cmp(&area(&a.bbox))
            .then(a.bbox.top.total_cmp(&b.bbox.top))
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    let mut roots: Vec<Table> = Vec::with_capacity(tables.len());
    for table in tables {
        let mut guest = Some(table);
        for root in roots.iter_mut() {
            let Some(t) = guest.take() else { break };
            if let Err(back) = absorb_table(root, t, tolerance) {
                guest = Some(back);
            }
        }
        if let Some(t) = guest {
            roots.push(t);
        }
    }
    roots.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    roots
}

/// Moves every block lying inside a table into the innermost cell holding
/// the block's centre. Returns the blocks that stay at the top level.
pub(crate) fn place_blocks(
    tables: &mut [Table],
    blocks: Vec<FixedBlock>,
    tolerance: f64,
) -> Vec<FixedBlock> {
    let mut rest = Vec::with_capacity(blocks.len());
    for block in blocks {
        let centre = block.bbox.center();
        let cell = tables
            .iter_mut()
            .filter(|t| t.bbox.contains(&block.bbox, tolerance))
            .find_map(|t| innermost_cell(t, &|c: &BBox| c.contains_point(centre)));
        match cell {
            Some(cell) => cell.children.push(SemanticBox::FixedBlock(block)),
            None => rest.push(block),
        }
    }
    rest
}

/// Drops nested tables without content, bottom up.
fn prune_empty(table: &mut Table) {
    for cell in table.cells_mut() {
        cell.children.retain_mut(|child| match child {
            SemanticBox::Table(t) => {
                prune_empty(t);
                !t.is_empty()
            }
            _ => true,
        });
    }
}

/// Groups the content of every cell, nested tables first.
fn group_cells(table: &mut Table, params: &SomParams) {
    for cell in table.cells_mut() {
        let mut children = std::mem::take(&mut cell.children);
        for child in children.iter_mut() {
            if let SemanticBox::Table(t) = child {
                group_cells(t, params);
            }
        }
        children.sort_by(reading_order);
        cell.children = group_boxes(children, params);
    }
}

/// Fills detected tables with the blocks they cover.
///
/// Returns the populated tables, with empty ones dropped, and the blocks
/// left at the top level.
pub(crate) fn populate_tables(
    mut tables: Vec<Table>,
    blocks: Vec<FixedBlock>,
    params: &SomParams,
) -> (Vec<Table>, Vec<FixedBlock>) {
    let rest = place_blocks(&mut tables, blocks, params.table_tolerance);
    for table in tables.iter_mut() {
        prune_empty(table);
    }
    let before = tables.len();
    tables.retain(|t| !t.is_empty());
    for table in tables.iter_mut() {
        group_cells(table, params);
    }
    debug!(
        kept = tables.len(),
        dropped = before - tables.len(),
        "tables populated"
    );
    (tables, rest)
}
