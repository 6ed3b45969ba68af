//! Containment index for locating unit segments inside context segments.

use crate::segment::Segment;
use crate::segmentation::Segmentation;
use crate::store::StringId;
use std::collections::HashMap;

/// Position of one segment inside the indexed segmentation.
#[derive(Debug, Clone, Copy)]
struct Entry {
    start: usize,
    end: usize,
    index: usize,
}

/// Maps each string to the segments over it, sorted by start offset.
///
/// Built once per unit segmentation, it answers "which units lie inside this
/// context?" with a binary search instead of a scan over every unit.
#[derive(Debug, Clone)]
pub struct ContainmentIndex {
    by_string: HashMap<StringId, Vec<Entry>>,
}

impl ContainmentIndex {
    /// Indexes the segments of a segmentation.
    pub fn new(segmentation: &Segmentation) -> Self {
        let mut by_string: HashMap<StringId, Vec<Entry>> = HashMap::new();
        for (index, segment) in segmentation.iter().enumerate() {
            by_string.entry(segment.string_id()).or_default().push(Entry {
                start: segment.start(),
                end: segment.end(),
                index,
            });
        }
        for entries in by_string.values_mut() {
            entries.sort_by_key(|e| (e.start, e.end, e.index));
        }
        Self { by_string }
    }

    /// Returns the indices of indexed segments lying within `outer`, in
    /// segmentation order.
    pub fn contained_in(&self, outer: &Segment) -> Vec<usize> {
        let Some(entries) = self.by_string.get(&outer.string_id()) else {
            return Vec::new();
        };

        let first = entries.partition_point(|e| e.start < outer.start());
        let mut found: Vec<usize> = entries[first..]
            .iter()
            .take_while(|e| e.start <= outer.end())
            .filter(|e| e.end <= outer.end())
            .map(|e| e.index)
            .collect();
        found.sort_unstable();
        found
    }

    /// Returns the first index of every run of `length` consecutive indexed
    /// segments lying within `outer`.
    pub fn contained_sequences(&self, outer: &Segment, length: usize) -> Vec<usize> {
        if length == 0 {
            return Vec::new();
        }

        let contained = self.contained_in(outer);
        let mut starts = Vec::new();
        let mut run_start = 0;
        for i in 0..contained.len() {
            let run_ends = i + 1 == contained.len() || contained[i + 1] != contained[i] + 1;
            if run_ends {
                let run = &contained[run_start..=i];
                if run.len() >= length {
                    starts.extend_from_slice(&run[..run.len() - length + 1]);
                }
                run_start = i + 1;
            }
        }
        starts
    }
}
