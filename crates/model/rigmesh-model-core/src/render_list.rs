//! Render-list entries and the sort/group seam between the world and the
//! host render system.
//!
//! The host is free to interleave entries from many worlds before sorting;
//! the helpers here provide the canonical key ordering and contiguous
//! grouping the dispatch pass expects.

use std::ops::Range;

use nalgebra::Vector3;

use crate::graphics::BlendFactor;
use crate::resources::BlendMode;
use crate::world::InstanceIndex;

/// One submitted render-list entry for a visible instance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderEntry {
    /// World-space anchor position.
    pub world_position: Vector3<f32>,
    pub instance: InstanceIndex,
    pub batch_key: u32,
    pub tag_mask: u32,
}

/// Order entries by batch key. Stable: members of a group keep their
/// submission order.
pub fn sort_entries(entries: &mut [RenderEntry]) {
    entries.sort_by_key(|e| e.batch_key);
}

/// Contiguous ranges of equal batch key over already-sorted entries.
pub fn group_ranges(entries: &[RenderEntry]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < entries.len() {
        let key = entries[start].batch_key;
        let mut end = start + 1;
        while end < entries.len() && entries[end].batch_key == key {
            end += 1;
        }
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Source/destination blend factors for a resource's declared blend mode.
/// An unrecognized mode is a fatal configuration error.
pub fn blend_factors(mode: BlendMode) -> (BlendFactor, BlendFactor) {
    match mode {
        BlendMode::Alpha => (BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
        BlendMode::Add => (BlendFactor::One, BlendFactor::One),
        BlendMode::Mult => (BlendFactor::DstColor, BlendFactor::OneMinusSrcAlpha),
        BlendMode::Unknown => {
            log::error!("unknown blend mode: {mode:?}");
            panic!("unknown blend mode: {mode:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: u32, instance: u32) -> RenderEntry {
        RenderEntry {
            world_position: Vector3::zeros(),
            instance: InstanceIndex(instance),
            batch_key: key,
            tag_mask: 0,
        }
    }

    #[test]
    fn sort_is_stable_within_groups() {
        let mut entries = vec![entry(7, 0), entry(3, 1), entry(7, 2), entry(3, 3)];
        sort_entries(&mut entries);
        let order: Vec<(u32, u32)> = entries.iter().map(|e| (e.batch_key, e.instance.0)).collect();
        assert_eq!(order, vec![(3, 1), (3, 3), (7, 0), (7, 2)]);
    }

    #[test]
    fn groups_are_contiguous_key_runs() {
        let entries = vec![entry(1, 0), entry(1, 1), entry(2, 2), entry(5, 3), entry(5, 4)];
        assert_eq!(group_ranges(&entries), vec![0..2, 2..3, 3..5]);
        assert!(group_ranges(&[]).is_empty());
    }

    #[test]
    fn blend_factor_table() {
        assert_eq!(
            blend_factors(BlendMode::Alpha),
            (BlendFactor::One, BlendFactor::OneMinusSrcAlpha)
        );
        assert_eq!(blend_factors(BlendMode::Add), (BlendFactor::One, BlendFactor::One));
        assert_eq!(
            blend_factors(BlendMode::Mult),
            (BlendFactor::DstColor, BlendFactor::OneMinusSrcAlpha)
        );
    }

    #[test]
    #[should_panic(expected = "unknown blend mode")]
    fn unknown_blend_mode_is_fatal() {
        let _ = blend_factors(BlendMode::Unknown);
    }
}
