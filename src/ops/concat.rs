//! Concatenation of segmentations.

use crate::error::Result;
use crate::ops::{merge_duplicates, number_segments};
use crate::segment::{Annotations, Segment};
use crate::segmentation::Segmentation;
use crate::store::StringStore;
use log::debug;

/// Options of [`concatenate`].
#[derive(Debug, Clone)]
pub struct ConcatOptions {
    /// Label of the output segmentation.
    /// Default: "my_concatenation".
    pub label: String,
    /// Segmentation-level annotations of the output.
    pub annotations: Annotations,
    /// Annotation key receiving the label of each segment's input.
    pub import_labels_as: Option<String>,
    /// Sort segments by string and position.
    pub sort: bool,
    /// Merge adjacent segments with identical spans.
    pub merge_duplicates: bool,
    /// Annotation key receiving a 1-based running number.
    pub auto_number_as: Option<String>,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            label: "my_concatenation".to_string(),
            annotations: Annotations::new(),
            import_labels_as: None,
            sort: false,
            merge_duplicates: false,
            auto_number_as: None,
        }
    }
}

/// Concatenates the segments of `inputs`, in list order.
///
/// Every input must belong to a store covered by `store`; segmentations
/// from different stores can be concatenated against the union of those
/// stores.
pub fn concatenate(
    inputs: &[&Segmentation],
    store: &StringStore,
    options: &ConcatOptions,
) -> Result<Segmentation> {
    for input in inputs {
        input.check_store(store)?;
    }

    let mut segments: Vec<Segment> = Vec::with_capacity(inputs.iter().map(|s| s.len()).sum());
    for input in inputs {
        match &options.import_labels_as {
            Some(key) => {
                let overrides = Annotations::new().with(key.as_str(), input.label());
                segments.extend(input.iter().map(|s| s.annotated(&overrides)));
            }
            None => segments.extend(input.iter().cloned()),
        }
    }

    if options.sort {
        segments.sort_by_key(Segment::address);
    }
    if options.merge_duplicates {
        segments = merge_duplicates(segments);
    }
    if let Some(key) = &options.auto_number_as {
        number_segments(&mut segments, key);
    }

    debug!(
        "concatenate: {} inputs -> {} segments",
        inputs.len(),
        segments.len()
    );
    Ok(Segmentation::from_trusted(store.id(), options.label.as_str(), segments)
        .with_annotations(options.annotations.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::segment::AnnotationValue;

    #[test]
    fn test_concatenate_in_order() {
        let mut store = StringStore::new();
        let a = store.register("a");
        let b = store.register("b");
        let first = Segmentation::from_string(&store, b).unwrap().with_label("first");
        let second = Segmentation::from_string(&store, a).unwrap().with_label("second");

        let options = ConcatOptions {
            import_labels_as: Some("origin".to_string()),
            ..ConcatOptions::default()
        };
        let joined = concatenate(&[&first, &second], &store, &options).unwrap();
        assert_eq!(joined.label(), "my_concatenation");
        assert_eq!(joined.contents(&store).unwrap(), vec!["b", "a"]);
        assert_eq!(
            joined.get(1).unwrap().annotation("origin"),
            Some(&AnnotationValue::from("second"))
        );
    }

    #[test]
    fn test_concatenate_sort_and_merge() {
        let mut store = StringStore::new();
        let id = store.register("abcd");
        let x = Segment::new(&store, id, 2, 4, Annotations::new().with("k", "x")).unwrap();
        let y = Segment::new(&store, id, 0, 2, Annotations::new()).unwrap();
        let z = Segment::new(&store, id, 2, 4, Annotations::new().with("k", "z")).unwrap();
        let first = Segmentation::new(&store, vec![x, y]).unwrap();
        let second = Segmentation::new(&store, vec![z]).unwrap();

        let options = ConcatOptions {
            sort: true,
            merge_duplicates: true,
            auto_number_as: Some("n".to_string()),
            ..ConcatOptions::default()
        };
        let joined = concatenate(&[&first, &second], &store, &options).unwrap();
        assert_eq!(joined.contents(&store).unwrap(), vec!["ab", "cd"]);
        let merged = joined.get(1).unwrap();
        assert_eq!(merged.annotation("k"), Some(&AnnotationValue::from("z")));
        assert_eq!(merged.annotation("n"), Some(&AnnotationValue::Integer(2)));
    }

    #[test]
    fn test_concatenate_across_stores() {
        let mut left = StringStore::new();
        let l = left.register("left");
        let mut right = StringStore::new();
        let r = right.register("right");
        let a = Segmentation::from_string(&left, l).unwrap();
        let b = Segmentation::from_string(&right, r).unwrap();

        assert!(matches!(
            concatenate(&[&a, &b], &left, &ConcatOptions::default()),
            Err(Error::IncompatibleStore { .. })
        ));

        let both = left.union(&right).unwrap();
        let joined = concatenate(&[&a, &b], &both, &ConcatOptions::default()).unwrap();
        assert_eq!(joined.contents(&both).unwrap(), vec!["left", "right"]);
    }
}
