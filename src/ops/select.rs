//! Selection by pattern, frequency, or membership.
//!
//! Each operation partitions its input into a [`Selection`]. The rejected
//! half carries the label `NEG_` followed by the requested label.

use crate::error::{Error, Result};
use crate::ops::{partition, views, SegmentView, Selection};
use crate::segmentation::Segmentation;
use crate::store::StringStore;
use log::debug;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Key standing for segments that lack the requested annotation.
const MISSING_TYPE: &str = "__none__";

/// Whether matching segments are kept or discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectMode {
    /// Keep matching segments.
    #[default]
    Include,
    /// Keep non-matching segments.
    Exclude,
}

impl SelectMode {
    fn keeps(self, matched: bool) -> bool {
        match self {
            SelectMode::Include => matched,
            SelectMode::Exclude => !matched,
        }
    }
}

/// Options of [`select`].
#[derive(Debug, Clone)]
pub struct SelectOptions {
    /// Include or exclude matches.
    pub mode: SelectMode,
    /// Match against this annotation instead of the content.
    pub annotation_key: Option<String>,
    /// Label of the selected segmentation.
    pub label: String,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            mode: SelectMode::Include,
            annotation_key: None,
            label: "selected_data".to_string(),
        }
    }
}

/// Options of [`threshold`].
#[derive(Debug, Clone)]
pub struct ThresholdOptions {
    /// Lowest frequency kept.
    pub min_count: usize,
    /// Highest frequency kept. `None` means the input length.
    pub max_count: Option<usize>,
    /// Count annotation values instead of contents.
    pub annotation_key: Option<String>,
    /// Label of the selected segmentation.
    pub label: String,
}

impl Default for ThresholdOptions {
    fn default() -> Self {
        Self {
            min_count: 0,
            max_count: None,
            annotation_key: None,
            label: "thresholded_data".to_string(),
        }
    }
}

/// Options of [`intersect`].
#[derive(Debug, Clone)]
pub struct IntersectOptions {
    /// Keep segments whose type occurs (`Include`) or does not occur
    /// (`Exclude`) in the filtering segmentation.
    pub mode: SelectMode,
    /// Compare annotation values instead of contents, on both sides.
    pub annotation_key: Option<String>,
    /// Label of the selected segmentation.
    pub label: String,
}

impl Default for IntersectOptions {
    fn default() -> Self {
        Self {
            mode: SelectMode::Include,
            annotation_key: None,
            label: "intersected_data".to_string(),
        }
    }
}

/// Returns the type of a segment: its content or an annotation rendered as
/// text.
fn type_of(view: &SegmentView<'_>, annotation_key: Option<&str>) -> String {
    match annotation_key {
        None => view.content().to_string(),
        Some(key) => view
            .annotation(key)
            .map_or_else(|| MISSING_TYPE.to_string(), |v| v.to_string()),
    }
}

/// Partitions `input` on whether `pattern` is found in each segment.
///
/// A segment lacking the requested annotation never matches.
pub fn select(
    input: &Segmentation,
    store: &StringStore,
    pattern: &Regex,
    options: &SelectOptions,
) -> Result<Selection> {
    let views = views(input, store)?;
    let verdicts = views.iter().map(|view| {
        let matched = match &options.annotation_key {
            None => pattern.is_match(view.content()),
            Some(key) => view
                .annotation(key)
                .is_some_and(|value| pattern.is_match(&value.to_string())),
        };
        options.mode.keeps(matched)
    });

    let selection = partition(input, &options.label, verdicts);
    debug!(
        "select: {} segments -> {} selected",
        input.len(),
        selection.selected.len()
    );
    Ok(selection)
}

/// Partitions `input` on the frequency of each segment's type.
pub fn threshold(
    input: &Segmentation,
    store: &StringStore,
    options: &ThresholdOptions,
) -> Result<Selection> {
    let max_count = options.max_count.unwrap_or(input.len());
    if options.min_count > max_count {
        return Err(Error::InvalidArgument(format!(
            "min_count {} exceeds max_count {}",
            options.min_count, max_count
        )));
    }

    let views = views(input, store)?;
    let types: Vec<String> = views
        .iter()
        .map(|view| type_of(view, options.annotation_key.as_deref()))
        .collect();

    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for t in &types {
        *frequencies.entry(t.as_str()).or_insert(0) += 1;
    }

    let verdicts = types.iter().map(|t| {
        let count = frequencies.get(t.as_str()).copied().unwrap_or(0);
        (options.min_count..=max_count).contains(&count)
    });

    let selection = partition(input, &options.label, verdicts);
    debug!(
        "threshold: {} segments -> {} selected",
        input.len(),
        selection.selected.len()
    );
    Ok(selection)
}

/// Partitions `source` on whether each segment's type occurs among the types
/// of `filtering`.
pub fn intersect(
    source: &Segmentation,
    filtering: &Segmentation,
    store: &StringStore,
    options: &IntersectOptions,
) -> Result<Selection> {
    let key = options.annotation_key.as_deref();
    let known: HashSet<String> = views(filtering, store)?
        .iter()
        .map(|view| type_of(view, key))
        .collect();

    let verdicts = views(source, store)?
        .iter()
        .map(|view| options.mode.keeps(known.contains(&type_of(view, key))))
        .collect::<Vec<_>>();

    let selection = partition(source, &options.label, verdicts);
    debug!(
        "intersect: {} segments against {} types -> {} selected",
        source.len(),
        known.len(),
        selection.selected.len()
    );
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Annotations, Segment};

    fn words(store: &mut StringStore, text: &str) -> Segmentation {
        let id = store.register(text);
        let mut segments = Vec::new();
        let mut offset = 0;
        for word in text.split(' ') {
            let ann = Annotations::new().with("len", word.len() as i64);
            segments.push(Segment::new(store, id, offset, offset + word.len(), ann).unwrap());
            offset += word.len() + 1;
        }
        Segmentation::new(store, segments).unwrap()
    }

    #[test]
    fn test_select_include_and_exclude() {
        let mut store = StringStore::new();
        let seg = words(&mut store, "cat dog cow bird");
        let pattern = Regex::new("^c").unwrap();

        let selection = select(&seg, &store, &pattern, &SelectOptions::default()).unwrap();
        assert_eq!(selection.selected.contents(&store).unwrap(), vec!["cat", "cow"]);
        assert_eq!(selection.rejected.contents(&store).unwrap(), vec!["dog", "bird"]);
        assert_eq!(selection.rejected.label(), "NEG_selected_data");

        let options = SelectOptions {
            mode: SelectMode::Exclude,
            ..SelectOptions::default()
        };
        let selection = select(&seg, &store, &pattern, &options).unwrap();
        assert_eq!(selection.selected.contents(&store).unwrap(), vec!["dog", "bird"]);
    }

    #[test]
    fn test_select_on_annotation() {
        let mut store = StringStore::new();
        let seg = words(&mut store, "cat bird ox");
        let options = SelectOptions {
            annotation_key: Some("len".to_string()),
            ..SelectOptions::default()
        };
        let pattern = Regex::new("^3$").unwrap();
        let selection = select(&seg, &store, &pattern, &options).unwrap();
        assert_eq!(selection.selected.contents(&store).unwrap(), vec!["cat"]);

        let options = SelectOptions {
            annotation_key: Some("missing".to_string()),
            ..SelectOptions::default()
        };
        let selection = select(&seg, &store, &Regex::new("").unwrap(), &options).unwrap();
        assert!(selection.selected.is_empty());
    }

    #[test]
    fn test_threshold() {
        let mut store = StringStore::new();
        let seg = words(&mut store, "a b a c a b");
        let options = ThresholdOptions {
            min_count: 2,
            max_count: Some(2),
            ..ThresholdOptions::default()
        };
        let selection = threshold(&seg, &store, &options).unwrap();
        assert_eq!(selection.selected.contents(&store).unwrap(), vec!["b", "b"]);
        assert_eq!(selection.rejected.len(), 4);
    }

    #[test]
    fn test_threshold_invalid_bounds() {
        let mut store = StringStore::new();
        let seg = words(&mut store, "a b");
        let options = ThresholdOptions {
            min_count: 3,
            ..ThresholdOptions::default()
        };
        assert!(matches!(
            threshold(&seg, &store, &options),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_intersect() {
        let mut store = StringStore::new();
        let source = words(&mut store, "the cat and the dog");
        let stopwords = words(&mut store, "the and");

        let selection = intersect(&source, &stopwords, &store, &IntersectOptions::default()).unwrap();
        assert_eq!(
            selection.selected.contents(&store).unwrap(),
            vec!["the", "and", "the"]
        );

        let options = IntersectOptions {
            mode: SelectMode::Exclude,
            ..IntersectOptions::default()
        };
        let selection = intersect(&source, &stopwords, &store, &options).unwrap();
        assert_eq!(selection.selected.contents(&store).unwrap(), vec!["cat", "dog"]);
    }
}
