//! Cell, row and table assembly from line crossings.

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::som::{Table, TableCell, TableRow};
use crate::utils::BBox;

use super::intersections::{Crossing, KeyPoint};

fn sorted_lists_intersect(a: &[usize], b: &[usize]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => return true,
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    false
}

/// Finds the minimal closed rectangles of the line grid.
///
/// From every crossing, walk down its vertical edges and right along its
/// horizontal edges; the nearest lower crossing that can be closed by a
/// bottom-right crossing connected to both sides yields one cell. Partial
/// grids that never close yield nothing.
pub(crate) fn crossings_to_cells(crossings: &FxHashMap<KeyPoint, Crossing>) -> Vec<BBox> {
    let mut points: Vec<KeyPoint> = crossings.keys().copied().collect();
    points.sort();

    let point_index: FxHashMap<KeyPoint, usize> =
        points.iter().enumerate().map(|(i, p)| (*p, i)).collect();
    let point_v: Vec<&[usize]> = points.iter().map(|p| crossings[p].v.as_slice()).collect();
    let point_h: Vec<&[usize]> = points.iter().map(|p| crossings[p].h.as_slice()).collect();

    let mut edge_points_v: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    let mut edge_points_h: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for pid in 0..points.len() {
        for &e in point_v[pid] {
            edge_points_v.entry(e).or_default().push(pid);
        }
        for &e in point_h[pid] {
            edge_points_h.entry(e).or_default().push(pid);
        }
    }
    for ids in edge_points_v.values_mut() {
        ids.sort_by(|a, b| points[*a].1.cmp(&points[*b].1));
    }
    for ids in edge_points_h.values_mut() {
        ids.sort_by(|a, b| points[*a].0.cmp(&points[*b].0));
    }

    let connects = |p1: usize, p2: usize| -> bool {
        if points[p1].0 == points[p2].0 {
            return sorted_lists_intersect(point_v[p1], point_v[p2]);
        }
        if points[p1].1 == points[p2].1 {
            return sorted_lists_intersect(point_h[p1], point_h[p2]);
        }
        false
    };

    let mut cells = Vec::new();
    for (idx, point) in points.iter().enumerate() {
        let mut below: Vec<usize> = Vec::new();
        for e in point_v[idx] {
            if let Some(ids) = edge_points_v.get(e)
                && let Ok(pos) = ids.binary_search_by(|pid| points[*pid].1.cmp(&point.1))
            {
                below.extend(ids[pos + 1..].iter().copied());
            }
        }
        below.sort_by(|a, b| points[*a].1.cmp(&points[*b].1));
        below.dedup();

        let mut right: Vec<usize> = Vec::new();
        for e in point_h[idx] {
            if let Some(ids) = edge_points_h.get(e)
                && let Ok(pos) = ids.binary_search_by(|pid| points[*pid].0.cmp(&point.0))
            {
                right.extend(ids[pos + 1..].iter().copied());
            }
        }
        right.sort_by(|a, b| points[*a].0.cmp(&points[*b].0));
        right.dedup();

        'below: for &below_id in &below {
            if !connects(idx, below_id) {
                continue;
            }
            for &right_id in &right {
                if !connects(idx, right_id) {
                    continue;
                }
                let corner = (points[right_id].0, points[below_id].1);
                if let Some(&corner_id) = point_index.get(&corner)
                    && connects(corner_id, right_id)
                    && connects(corner_id, below_id)
                {
                    cells.push(BBox::new(
                        point.0.into_inner(),
                        point.1.into_inner(),
                        points[right_id].0.into_inner(),
                        points[below_id].1.into_inner(),
                    ));
                    break 'below;
                }
            }
        }
    }
    cells
}

/// Groups cells sharing a top and bottom into left-to-right rows of
/// adjacent cells.
pub(crate) fn cells_to_rows(cells: Vec<BBox>, tolerance: f64) -> Vec<TableRow> {
    let adjacent = |prev: &BBox, cell: &BBox| {
        (prev.top - cell.top).abs() <= tolerance
            && (prev.bottom - cell.bottom).abs() <= tolerance
            && (prev.x1 - cell.x0).abs() <= tolerance
    };
    cells
        .into_iter()
        .sorted_by(|a, b| {
            a.top
                .total_cmp(&b.top)
                .then(a.bottom.total_cmp(&b.bottom))
                .then(a.x0.total_cmp(&b.x0))
        })
        .map(|cell| vec![cell])
        .coalesce(|mut row, next| {
            let joins = matches!(
                (row.last(), next.first()),
                (Some(prev), Some(cell)) if adjacent(prev, cell)
            );
            if joins {
                row.extend(next);
                Ok(row)
            } else {
                Err((row, next))
            }
        })
        .map(|row| TableRow::new(row.into_iter().map(TableCell::new).collect()))
        .collect()
}

/// Stacks rows with equal left and right edges whose bottom meets the
/// next row's top.
pub(crate) fn rows_to_tables(rows: Vec<TableRow>, tolerance: f64) -> Vec<Table> {
    let mut stacks: Vec<Vec<TableRow>> = Vec::new();
    for row in rows {
        let b = row.bbox;
        let host = stacks.iter_mut().find(|stack| {
            stack.last().is_some_and(|last| {
                let l = last.bbox;
                (l.x0 - b.x0).abs() <= tolerance
                    && (l.x1 - b.x1).abs() <= tolerance
                    && (l.bottom - b.top).abs() <= tolerance
            })
        });
        match host {
            Some(stack) => stack.push(row),
            None => stacks.push(vec![row]),
        }
    }
    stacks.into_iter().map(Table::new).collect()
}
