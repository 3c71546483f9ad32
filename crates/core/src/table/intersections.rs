//! Sweep-line search for crossings of ruling lines.
//!
//! Registry segments are first snapped so that lines within the table
//! tolerance share one coordinate, then every horizontal edge is tested
//! against the vertical edges active at its y.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::lines::LineRegistry;

pub(crate) type KeyF64 = OrderedFloat<f64>;
pub(crate) type KeyPoint = (KeyF64, KeyF64);

pub(crate) fn key_point(x: f64, y: f64) -> KeyPoint {
    (OrderedFloat(x), OrderedFloat(y))
}

/// An axis-aligned ruling edge after snapping.
///
/// For horizontal edges `coord` is y and `start..end` runs along x; for
/// vertical edges `coord` is x and the span runs along y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Edge {
    pub coord: f64,
    pub start: f64,
    pub end: f64,
}

/// Horizontal and vertical edges, sorted by coordinate then start.
pub(crate) struct EdgeStore {
    pub h: Vec<Edge>,
    pub v: Vec<Edge>,
}

/// Indices of the edges crossing at one point.
#[derive(Clone, Debug, Default)]
pub(crate) struct Crossing {
    pub h: Vec<usize>,
    pub v: Vec<usize>,
}

/// Replaces each coordinate by the mean of its tolerance cluster.
fn snap(edges: &mut [Edge], tolerance: f64) {
    edges.sort_by(|a, b| a.coord.total_cmp(&b.coord));
    let mut start = 0;
    while start < edges.len() {
        let mut end = start + 1;
        while end < edges.len() && edges[end].coord - edges[end - 1].coord <= tolerance {
            end += 1;
        }
        let mean = edges[start..end].iter().map(|e| e.coord).sum::<f64>() / (end - start) as f64;
        for e in &mut edges[start..end] {
            e.coord = mean;
        }
        start = end;
    }
}

/// Joins collinear edges whose spans overlap or nearly touch.
fn join(mut edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    edges.sort_by(|a, b| {
        a.coord
            .total_cmp(&b.coord)
            .then(a.start.total_cmp(&b.start))
    });
    let mut out: Vec<Edge> = Vec::with_capacity(edges.len());
    for e in edges {
        match out.last_mut() {
            Some(last) if last.coord == e.coord && e.start <= last.end + tolerance => {
                last.end = last.end.max(e.end);
            }
            _ => out.push(e),
        }
    }
    out
}

/// Snapped, joined edges of every registered ruling line.
pub(crate) fn collect_edges(registry: &LineRegistry, tolerance: f64) -> EdgeStore {
    let mut h: Vec<Edge> = registry
        .horizontal_segments()
        .map(|s| Edge {
            coord: s.coord,
            start: s.start,
            end: s.end,
        })
        .collect();
    let mut v: Vec<Edge> = registry
        .vertical_segments()
        .map(|s| Edge {
            coord: s.coord,
            start: s.start,
            end: s.end,
        })
        .collect();
    snap(&mut h, tolerance);
    snap(&mut v, tolerance);
    EdgeStore {
        h: join(h, tolerance),
        v: join(v, tolerance),
    }
}

/// Finds every point where a horizontal edge meets a vertical edge.
pub(crate) fn edges_to_crossings(
    store: &EdgeStore,
    tolerance: f64,
) -> FxHashMap<KeyPoint, Crossing> {
    enum EventKind {
        AddV,
        QueryH,
        RemoveV,
    }

    struct Event {
        y: f64,
        kind: EventKind,
        idx: usize,
    }

    let kind_order = |kind: &EventKind| match kind {
        EventKind::AddV => 0,
        EventKind::QueryH => 1,
        EventKind::RemoveV => 2,
    };

    let mut events = Vec::with_capacity(store.v.len() * 2 + store.h.len());
    for (idx, v) in store.v.iter().enumerate() {
        events.push(Event {
            y: v.start - tolerance,
            kind: EventKind::AddV,
            idx,
        });
        events.push(Event {
            y: v.end + tolerance,
            kind: EventKind::RemoveV,
            idx,
        });
    }
    for (idx, h) in store.h.iter().enumerate() {
        events.push(Event {
            y: h.coord,
            kind: EventKind::QueryH,
            idx,
        });
    }
    events.sort_by(|a, b| {
        a.y.total_cmp(&b.y)
            .then(kind_order(&a.kind).cmp(&kind_order(&b.kind)))
            .then(a.idx.cmp(&b.idx))
    });

    let mut active: BTreeMap<KeyF64, Vec<usize>> = BTreeMap::new();
    let mut crossings: FxHashMap<KeyPoint, Crossing> = FxHashMap::default();

    for event in events {
        match event.kind {
            EventKind::AddV => {
                let x = OrderedFloat(store.v[event.idx].coord);
                active.entry(x).or_default().push(event.idx);
            }
            EventKind::RemoveV => {
                let x = OrderedFloat(store.v[event.idx].coord);
                if let Some(bucket) = active.get_mut(&x) {
                    bucket.retain(|&idx| idx != event.idx);
                    if bucket.is_empty() {
                        active.remove(&x);
                    }
                }
            }
            EventKind::QueryH => {
                let h = &store.h[event.idx];
                let lo = OrderedFloat(h.start - tolerance);
                let hi = OrderedFloat(h.end + tolerance);
                for (x, bucket) in active.range(lo..=hi) {
                    let entry = crossings.entry(key_point(x.0, h.coord)).or_default();
                    entry.h.push(event.idx);
                    entry.v.extend(bucket.iter().copied());
                }
            }
        }
    }

    for crossing in crossings.values_mut() {
        crossing.h.sort_unstable();
        crossing.h.dedup();
        crossing.v.sort_unstable();
        crossing.v.dedup();
    }
    crossings
}
