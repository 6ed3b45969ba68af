//! Operations deriving new segmentations from existing ones.
//!
//! Every function here is pure: inputs are borrowed, never modified, and a
//! fresh [`Segmentation`] is returned. The only exception is
//! [`recode_text`], which registers the recoded strings in the store it is
//! given.

mod annotate;
mod concat;
mod filter;
mod recode;
mod sample;
mod select;
mod split;
mod tokenize;

pub use annotate::{annotate, try_annotate};
pub use concat::{concatenate, ConcatOptions};
pub use filter::{filter, try_filter, try_filter_with};
pub use recode::{recode_text, Case, Recoded, Recoder};
pub use sample::{sample, SampleMode, SampleOptions};
pub use select::{
    intersect, select, threshold, IntersectOptions, SelectMode, SelectOptions, ThresholdOptions,
};
pub use split::{split, Delimiter, Splitter};
pub use tokenize::{tokenize, RuleMode, TokenRule, TokenizeOptions};

use crate::error::Result;
use crate::segment::{AnnotationValue, Annotations, Segment};
use crate::segmentation::Segmentation;
use crate::store::StringStore;

/// A segment seen together with its content and position.
///
/// This is what predicates and annotation callbacks receive.
#[derive(Debug, Clone, Copy)]
pub struct SegmentView<'a> {
    segment: &'a Segment,
    content: &'a str,
    position: usize,
}

impl<'a> SegmentView<'a> {
    /// Returns the segment.
    pub fn segment(&self) -> &'a Segment {
        self.segment
    }

    /// Returns the text covered by the segment.
    pub fn content(&self) -> &'a str {
        self.content
    }

    /// Returns the segment's annotations.
    pub fn annotations(&self) -> &'a Annotations {
        self.segment.annotations()
    }

    /// Returns the value of one annotation.
    pub fn annotation(&self, key: &str) -> Option<&'a AnnotationValue> {
        self.segment.annotation(key)
    }

    /// Returns the 0-based position in the input segmentation.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Result of operations that partition their input.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Segments that passed.
    pub selected: Segmentation,
    /// Segments that did not, labelled `NEG_` + label.
    pub rejected: Segmentation,
}

/// Builds a view of every segment of `input`.
pub(crate) fn views<'a>(input: &'a Segmentation, store: &'a StringStore) -> Result<Vec<SegmentView<'a>>> {
    input.check_store(store)?;
    input
        .iter()
        .enumerate()
        .map(|(position, segment)| -> Result<SegmentView<'a>> {
            Ok(SegmentView {
                segment,
                content: segment.content(store)?,
                position,
            })
        })
        .collect()
}

/// Splits `input` in two according to one verdict per segment.
pub(crate) fn partition<I>(input: &Segmentation, label: &str, verdicts: I) -> Selection
where
    I: IntoIterator<Item = bool>,
{
    let mut selected = Vec::new();
    let mut rejected = Vec::new();
    for (segment, keep) in input.iter().zip(verdicts) {
        if keep {
            selected.push(segment.clone());
        } else {
            rejected.push(segment.clone());
        }
    }

    Selection {
        selected: Segmentation::from_trusted(input.store_id(), label, selected),
        rejected: Segmentation::from_trusted(input.store_id(), format!("NEG_{}", label), rejected),
    }
}

/// Returns a copy of `input` where each segment carries its 1-based rank
/// under `key`.
pub fn auto_number(input: &Segmentation, key: &str) -> Segmentation {
    let mut segments = input.segments().to_vec();
    number_segments(&mut segments, key);
    Segmentation::from_trusted(input.store_id(), input.label(), segments)
        .with_annotations(input.annotations().clone())
}

pub(crate) fn number_segments(segments: &mut [Segment], key: &str) {
    for (i, segment) in segments.iter_mut().enumerate() {
        let overrides = Annotations::new().with(key, (i + 1) as i64);
        *segment = segment.annotated(&overrides);
    }
}

/// Collapses runs of adjacent segments with identical spans into one.
///
/// Annotations of later duplicates override those of earlier ones.
pub(crate) fn merge_duplicates(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        if let Some(last) = merged.last_mut() {
            if last.same_span(&segment) {
                *last = last.annotated(segment.annotations());
                continue;
            }
        }
        merged.push(segment);
    }
    merged
}
