//! End-to-end properties of page reconstruction.

use fixsom_core::construct::combine_pass;
use fixsom_core::lines::{Orientation, line_shape};
use fixsom_core::model::{ElementId, SnapshotBuilder};
use fixsom_core::som::{BoxKind, FixedBlock, Page, SemanticBox};
use fixsom_core::utils::{BBox, HasBBox};
use fixsom_core::{
    NodeRef, PageConstructor, PageSnapshot, PageSource, SomError, SomParams, reconstruct,
    reconstruct_pages,
};

/// Every fixed block in the tree, depth first.
fn blocks(page: &Page) -> Vec<&FixedBlock> {
    fn walk<'a>(b: &'a SemanticBox, out: &mut Vec<&'a FixedBlock>) {
        match b {
            SemanticBox::FixedBlock(blk) => out.push(blk),
            SemanticBox::Group(g) => g.children.iter().for_each(|c| walk(c, out)),
            SemanticBox::Table(t) => t
                .cells()
                .flat_map(|c| c.children.iter())
                .for_each(|c| walk(c, out)),
            _ => {}
        }
    }
    let mut out = Vec::new();
    page.boxes().iter().for_each(|b| walk(b, &mut out));
    out
}

fn block_holding<'a>(page: &'a Page, node: &NodeRef) -> Option<&'a FixedBlock> {
    blocks(page).into_iter().find(|b| b.has_run_from(node))
}

fn leaf_texts(page: &Page) -> Vec<String> {
    page.leaves()
        .into_iter()
        .filter_map(|b| match b {
            SemanticBox::TextRun(r) => Some(r.text.to_string()),
            _ => None,
        })
        .collect()
}

fn two_column_page() -> PageSnapshot {
    let mut b = SnapshotBuilder::new();
    b.add_line((190.0, 0.0), (190.0, 200.0));
    for i in 0..4 {
        let top = 10.0 + i as f64 * 12.0;
        b.add_text("left column text", 0.0, top, 10.0);
        b.add_text("right column text", 200.0, top, 10.0);
    }
    b.add_text("second paragraph", 0.0, 150.0, 10.0);
    b.add_text("continues here", 0.0, 162.0, 10.0);
    b.finish()
}

/// Rules a 2x2 grid of 100x40 cells at the origin.
fn ruled_grid(b: &mut SnapshotBuilder) {
    for y in [0.0, 40.0, 80.0] {
        b.add_line((0.0, y), (200.0, y));
    }
    for x in [0.0, 100.0, 200.0] {
        b.add_line((x, 0.0), (x, 80.0));
    }
}

/// Top-level boxes of a page with the group wrappers removed.
fn ungrouped(page: &Page) -> Vec<SemanticBox> {
    page.boxes()
        .iter()
        .filter_map(SemanticBox::as_group)
        .flat_map(|g| g.children.iter())
        .cloned()
        .collect()
}

#[test]
fn line_shapes_follow_aspect_ratio() {
    let params = SomParams::default();
    assert_eq!(
        line_shape(&BBox::new(0.0, 0.0, 200.0, 4.0), &params),
        Some(Orientation::Horizontal)
    );
    assert_eq!(
        line_shape(&BBox::new(0.0, 0.0, 4.0, 200.0), &params),
        Some(Orientation::Vertical)
    );
    assert_eq!(line_shape(&BBox::new(0.0, 0.0, 50.0, 50.0), &params), None);
}

#[test]
fn thin_filled_rects_register_as_lines() {
    let mut b = SnapshotBuilder::new();
    b.add_filled_rect(BBox::new(0.0, 0.0, 200.0, 4.0));
    b.add_filled_rect(BBox::new(300.0, 0.0, 304.0, 200.0));
    b.add_filled_rect(BBox::new(400.0, 0.0, 450.0, 50.0));
    let page = reconstruct(&b.finish());

    assert_eq!(page.stats().horizontal_lines, 1);
    assert_eq!(page.stats().vertical_lines, 1);
    // solid fills never become images
    assert!(page.is_empty());
}

#[test]
fn separator_keeps_same_line_runs_apart() {
    let build = |with_rule: bool| {
        let mut b = SnapshotBuilder::new();
        if with_rule {
            b.add_line((50.0, 0.0), (50.0, 100.0));
        }
        let left = b.add_text("left", 0.0, 20.0, 10.0);
        let right = b.add_text("right", 60.0, 20.0, 10.0);
        (reconstruct(&b.finish()), left, right)
    };

    let (page, left, right) = build(false);
    let joined = block_holding(&page, &left).unwrap();
    assert!(joined.has_run_from(&right));

    let (page, left, right) = build(true);
    let left_block = block_holding(&page, &left).unwrap();
    assert!(!left_block.has_run_from(&right));
    assert!(block_holding(&page, &right).is_some());
}

#[test]
fn wide_gap_splits_only_at_a_rule() {
    let build = |with_rule: bool| {
        let mut b = SnapshotBuilder::new();
        if with_rule {
            b.add_line((32.0, 0.0), (32.0, 100.0));
        }
        b.add_text("AAAA     BBBB", 0.0, 20.0, 10.0);
        reconstruct(&b.finish())
    };

    assert_eq!(leaf_texts(&build(false)), vec!["AAAA     BBBB"]);

    let page = build(true);
    let mut texts = leaf_texts(&page);
    texts.sort();
    assert_eq!(texts, vec!["AAAA", "BBBB"]);
    assert_eq!(blocks(&page).len(), 2);
}

#[test]
fn whitespace_runs_join_only_adjacent_blocks() {
    let build = |x: f64| {
        let mut b = SnapshotBuilder::new();
        let word = b.add_text("word", 0.0, 0.0, 10.0);
        let space = b.add_text("   ", x, 0.0, 10.0);
        let page = reconstruct(&b.finish());
        let joined = block_holding(&page, &word).unwrap().has_run_from(&space);
        (joined, blocks(&page).len())
    };

    assert_eq!(build(25.0), (true, 1));
    // well within the consecutive-fragment distance, yet not adjacent
    assert_eq!(build(100.0), (false, 2));
}

#[test]
fn two_by_two_grid_becomes_a_table() {
    let mut b = SnapshotBuilder::new();
    ruled_grid(&mut b);
    let a = b.add_text("a", 10.0, 10.0, 10.0);
    b.add_text("b", 110.0, 10.0, 10.0);
    b.add_text("c", 10.0, 50.0, 10.0);
    b.add_text("d", 110.0, 50.0, 10.0);
    let page = reconstruct(&b.finish());

    assert_eq!(page.count(BoxKind::Table), 1);
    assert_eq!(page.count(BoxKind::TableRow), 2);
    assert_eq!(page.count(BoxKind::TableCell), 4);
    assert_eq!(page.stats().tables, 1);

    let table = page
        .boxes()
        .iter()
        .filter_map(SemanticBox::as_group)
        .flat_map(|g| g.children.iter())
        .find_map(SemanticBox::as_table)
        .unwrap();
    assert_eq!(table.bbox, BBox::new(0.0, 0.0, 200.0, 80.0));
    assert!(table.cells().all(|c| !c.is_empty()));

    let first = &table.rows[0].cells[0];
    let mut leaves = Vec::new();
    first.children.iter().for_each(|c| c.collect_leaves(&mut leaves));
    assert_eq!(leaves.len(), 1);
    assert!(matches!(leaves[0], SemanticBox::TextRun(r) if r.node == a));
}

#[test]
fn combine_pass_is_idempotent_after_reconstruction() {
    let mut with_table = SnapshotBuilder::new();
    ruled_grid(&mut with_table);
    for (x, y) in [(10.0, 10.0), (110.0, 10.0), (10.0, 50.0), (110.0, 50.0)] {
        with_table.add_text("cell", x, y, 10.0);
    }
    with_table.add_text("below the table", 0.0, 150.0, 10.0);

    let constructor = PageConstructor::default();
    for snapshot in [two_column_page(), with_table.finish()] {
        let page = constructor.reconstruct(&snapshot);
        let (registry, _) = constructor.classify_lines(&snapshot);

        let mut top_level = ungrouped(&page);
        let before = top_level.clone();
        assert_eq!(combine_pass(&mut top_level, &registry, constructor.params()), 0);
        assert_eq!(top_level, before);
    }
}

#[test]
fn rule_keeps_runs_apart_after_blocks_grow() {
    let mut b = SnapshotBuilder::new();
    b.add_line((50.0, -5.0), (50.0, 15.0));
    let left = b.add_text("left", 0.0, 0.0, 10.0);
    let right = b.add_text("right", 60.0, 0.0, 10.0);
    let full = b.add_text("a full width line of text", 0.0, 12.0, 10.0);
    let page = reconstruct(&b.finish());

    let left_block = block_holding(&page, &left).unwrap();
    assert!(!left_block.has_run_from(&right));
    // the wide line joins the block under the right-hand run
    assert!(block_holding(&page, &right).unwrap().has_run_from(&full));
}

#[test]
fn distant_whitespace_stays_out_of_touching_blocks() {
    let mut b = SnapshotBuilder::new();
    let word = b.add_text("word", 0.0, 0.0, 10.0);
    b.add_text("elsewhere", 0.0, 300.0, 10.0);
    // touches the word block, but is not markup-adjacent to it
    let space = b.add_text("   ", 20.5, 0.0, 10.0);
    let page = reconstruct(&b.finish());

    assert!(!block_holding(&page, &word).unwrap().has_run_from(&space));
    assert_eq!(blocks(&page).len(), 3);
}

#[test]
fn blocks_in_cells_read_left_to_right() {
    let mut b = SnapshotBuilder::new();
    ruled_grid(&mut b);
    b.add_text("world", 40.0, 10.0, 10.0);
    b.add_text("hello", 10.0, 10.0, 10.0);
    b.add_text("x", 110.0, 50.0, 10.0);
    b.add_text("world", 40.0, 150.0, 10.0);
    b.add_text("hello", 10.0, 150.0, 10.0);
    let page = reconstruct(&b.finish());

    let texts: Vec<String> = blocks(&page).iter().map(|b| b.text()).collect();
    assert_eq!(texts.len(), 3);
    assert_eq!(texts.iter().filter(|t| *t == "helloworld").count(), 2);
}

#[test]
fn columns_stay_apart_and_paragraphs_merge() {
    let page = reconstruct(&two_column_page());
    let texts: Vec<String> = blocks(&page).iter().map(|b| b.text()).collect();
    assert_eq!(texts.len(), 3);
    assert!(texts.contains(&"left column text\n".repeat(4).trim_end().to_string()));
    assert!(texts.contains(&"right column text\n".repeat(4).trim_end().to_string()));
    assert!(texts.contains(&"second paragraph\ncontinues here".to_string()));
}

#[test]
fn groups_are_monotonic_from_top_to_bottom() {
    let page = reconstruct(&two_column_page());
    assert!(page.boxes().iter().all(|b| b.kind() == BoxKind::Group));
    let tops: Vec<f64> = page.boxes().iter().map(|b| b.bbox().top).collect();
    assert!(tops.windows(2).all(|w| w[0] <= w[1]), "tops out of order: {tops:?}");
    // side-by-side columns never share a group
    assert_eq!(page.stats().groups, 3);

    let mut b = SnapshotBuilder::new();
    b.add_text("figure title", 0.0, 0.0, 10.0);
    b.add_image(BBox::new(0.0, 25.0, 80.0, 45.0));
    b.add_text("far below", 0.0, 200.0, 10.0);
    let page = reconstruct(&b.finish());

    let sizes: Vec<usize> = page
        .boxes()
        .iter()
        .filter_map(SemanticBox::as_group)
        .map(|g| g.children.len())
        .collect();
    assert_eq!(sizes, vec![2, 1]);
    let first = page.boxes()[0].as_group().unwrap();
    assert!(first.children[0].bbox().top <= first.children[1].bbox().top);
}

#[test]
fn reconstruction_is_deterministic() {
    let snapshot = two_column_page();
    assert_eq!(reconstruct(&snapshot), reconstruct(&snapshot));
}

#[test]
fn parallel_pages_match_sequential() {
    let mut other = SnapshotBuilder::new();
    other.add_text("another page", 0.0, 0.0, 12.0);
    let pages = vec![two_column_page(), other.finish(), PageSnapshot::default()];

    let sequential: Vec<Page> = pages.iter().map(reconstruct).collect();
    assert_eq!(reconstruct_pages(&pages), sequential);
}

#[test]
fn nodes_resolve_back_to_elements() {
    let mut b = SnapshotBuilder::new();
    b.add_line((32.0, 0.0), (32.0, 100.0));
    let node = b.add_text("AAAA     BBBB", 0.0, 20.0, 10.0);
    let snapshot = b.finish();

    assert_eq!(snapshot.resolve(&node).unwrap().node(), &node);
    let stale = NodeRef::new(ElementId(1), [7]);
    assert!(matches!(snapshot.resolve(&stale), Err(SomError::UnknownNode(_))));

    let page = reconstruct(&snapshot);
    assert_eq!(page.find_by_node(&node).len(), 2);
    assert_eq!(page.boxes_in_rect(BBox::new(0.0, 0.0, 25.0, 100.0)).len(), 1);
}

#[cfg(feature = "serde")]
#[test]
fn snapshots_roundtrip_through_json() {
    let snapshot = two_column_page();
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: PageSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
    assert_eq!(reconstruct(&back), reconstruct(&snapshot));
}
