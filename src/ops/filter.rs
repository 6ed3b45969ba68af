//! Predicate filtering.

use crate::config::DEFAULT_PARALLEL_THRESHOLD;
use crate::error::{Error, Result};
use crate::ops::{views, SegmentView};
use crate::segmentation::Segmentation;
use crate::store::StringStore;
use log::debug;
use rayon::prelude::*;

/// Keeps the segments for which `predicate` holds, in their original order.
///
/// Large inputs are evaluated on the rayon thread pool.
pub fn filter<P>(input: &Segmentation, store: &StringStore, predicate: P) -> Result<Segmentation>
where
    P: Fn(&SegmentView<'_>) -> bool + Sync,
{
    try_filter::<_, Error>(input, store, |view| Ok(predicate(view)))
}

/// Like [`filter`], with a fallible predicate.
///
/// The error of the first failing segment, in segment order, is returned
/// unchanged.
pub fn try_filter<P, E>(
    input: &Segmentation,
    store: &StringStore,
    predicate: P,
) -> std::result::Result<Segmentation, E>
where
    P: Fn(&SegmentView<'_>) -> std::result::Result<bool, E> + Sync,
    E: From<Error> + Send,
{
    try_filter_with(input, store, DEFAULT_PARALLEL_THRESHOLD, predicate)
}

/// Like [`try_filter`], evaluating the predicate on the rayon thread pool
/// once the input holds at least `parallel_threshold` segments.
pub fn try_filter_with<P, E>(
    input: &Segmentation,
    store: &StringStore,
    parallel_threshold: usize,
    predicate: P,
) -> std::result::Result<Segmentation, E>
where
    P: Fn(&SegmentView<'_>) -> std::result::Result<bool, E> + Sync,
    E: From<Error> + Send,
{
    let views = views(input, store)?;

    let verdicts: Vec<bool> = if views.len() >= parallel_threshold {
        // Collected in full so the reported error is the first in order.
        views
            .par_iter()
            .map(|view| predicate(view))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<std::result::Result<_, E>>()?
    } else {
        views
            .iter()
            .map(|view| predicate(view))
            .collect::<std::result::Result<_, E>>()?
    };

    let kept: Vec<_> = input
        .iter()
        .zip(verdicts)
        .filter_map(|(segment, keep)| keep.then(|| segment.clone()))
        .collect();

    debug!("filter: {} segments -> {} segments", input.len(), kept.len());
    Ok(Segmentation::from_trusted(input.store_id(), input.label(), kept)
        .with_annotations(input.annotations().clone()))
}
