//! Annotation of existing segments.

use crate::error::{Error, Result};
use crate::ops::{views, SegmentView};
use crate::segment::{Annotations, Segment};
use crate::segmentation::Segmentation;
use crate::store::StringStore;
use log::debug;

/// Adds the annotations returned by `f` to every segment.
///
/// Spans and order are unchanged. New keys override existing ones, other
/// keys are kept.
pub fn annotate<F>(input: &Segmentation, store: &StringStore, f: F) -> Result<Segmentation>
where
    F: Fn(&SegmentView<'_>) -> Annotations,
{
    try_annotate::<_, Error>(input, store, |view| Ok(f(view)))
}

/// Like [`annotate`], with a fallible callback whose first error is
/// returned unchanged.
pub fn try_annotate<F, E>(
    input: &Segmentation,
    store: &StringStore,
    f: F,
) -> std::result::Result<Segmentation, E>
where
    F: Fn(&SegmentView<'_>) -> std::result::Result<Annotations, E>,
    E: From<Error>,
{
    let segments = views(input, store)?
        .iter()
        .map(|view| -> std::result::Result<Segment, E> { Ok(view.segment().annotated(&f(view)?)) })
        .collect::<std::result::Result<Vec<_>, E>>()?;

    debug!("annotate: {} segments", segments.len());
    Ok(Segmentation::from_trusted(input.store_id(), input.label(), segments)
        .with_annotations(input.annotations().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{split, Delimiter, Splitter};
    use crate::segment::AnnotationValue;

    #[test]
    fn test_annotate_merges() {
        let mut store = StringStore::new();
        let id = store.register("Big cat");
        let seg = Segmentation::from_string(&store, id).unwrap();
        let words = split(&seg, &store, &Splitter::new(Delimiter::whitespace())).unwrap();
        let words = annotate(&words, &store, |_| Annotations::new().with("kind", "word")).unwrap();

        let annotated = annotate(&words, &store, |v| {
            Annotations::new().with("upper", v.content().starts_with(char::is_uppercase).to_string())
        })
        .unwrap();

        assert_eq!(annotated.len(), 2);
        let first = annotated.get(0).unwrap();
        assert_eq!(first.annotation("kind"), Some(&AnnotationValue::from("word")));
        assert_eq!(first.annotation("upper"), Some(&AnnotationValue::from("true")));
        assert_eq!(
            annotated.get(1).unwrap().annotation("upper"),
            Some(&AnnotationValue::from("false"))
        );
        assert_eq!(annotated.segments()[1].range(), words.segments()[1].range());
    }

    #[test]
    fn test_try_annotate_error() {
        let mut store = StringStore::new();
        let id = store.register("x");
        let seg = Segmentation::from_string(&store, id).unwrap();
        let result = try_annotate(&seg, &store, |_| {
            Err(Error::InvalidArgument("nope".to_string()))
        });
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
