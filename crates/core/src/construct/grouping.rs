//! Order-preserving grouping of finished boxes.

use crate::params::SomParams;
use crate::som::{Group, SemanticBox};
use crate::utils::{BBox, HasBBox};

/// Partitions `boxes` into groups without reordering them.
///
/// A new group starts when the next box does not meet the previous one
/// inflated vertically by `group_inflate_vertical`, or when it starts
/// above the previous box. Tops are therefore non-decreasing inside every
/// group.
pub fn group_boxes(boxes: Vec<SemanticBox>, params: &SomParams) -> Vec<SemanticBox> {
    let mut groups: Vec<Group> = Vec::new();
    let mut prev: Option<BBox> = None;
    for item in boxes {
        let bbox = item.bbox();
        let joins = prev.is_some_and(|p| {
            bbox.top >= p.top
                && p.inflate(0.0, params.group_inflate_vertical)
                    .intersects(&bbox)
        });
        match groups.last_mut() {
            Some(group) if joins => group.push(item),
            _ => groups.push(Group::new(item)),
        }
        prev = Some(bbox);
    }
    groups.into_iter().map(SemanticBox::Group).collect()
}
