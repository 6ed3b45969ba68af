//! Rule-based tokenization.

use crate::error::Result;
use crate::ops::{merge_duplicates, number_segments};
use crate::segment::{Annotations, Segment};
use crate::segmentation::{Segmentation, DEFAULT_LABEL};
use crate::store::StringStore;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static BACKREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"&([0-9]+)").unwrap());

/// How a rule turns its matches into segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    /// Every match is a segment.
    Tokenize,
    /// The text between matches is a segment.
    Split,
}

/// One tokenization rule.
#[derive(Debug, Clone)]
pub struct TokenRule {
    /// Pattern to search for.
    pub pattern: Regex,
    /// What the matches produce.
    pub mode: RuleMode,
    /// Annotation added to the produced segments.
    ///
    /// In tokenize mode the key and value may refer to capture groups with
    /// `&1`, `&2`, and so on.
    pub annotation: Option<(String, String)>,
}

impl TokenRule {
    /// Creates a rule emitting every match of `pattern`.
    pub fn tokenize(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            mode: RuleMode::Tokenize,
            annotation: None,
        })
    }

    /// Creates a rule emitting the text between matches of `pattern`.
    pub fn split(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            mode: RuleMode::Split,
            annotation: None,
        })
    }

    /// Attaches an annotation to the segments this rule produces.
    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotation = Some((key.into(), value.into()));
        self
    }

    fn annotations_for(&self, captures: Option<&Captures<'_>>) -> Annotations {
        let Some((key, value)) = &self.annotation else {
            return Annotations::new();
        };
        match captures {
            Some(caps) => Annotations::new().with(expand(key, caps), expand(value, caps)),
            None => Annotations::new().with(key.as_str(), value.as_str()),
        }
    }
}

/// Replaces `&N` with the text of capture group `N`.
fn expand(template: &str, caps: &Captures<'_>) -> String {
    BACKREF
        .replace_all(template, |refs: &Captures<'_>| {
            refs[1]
                .parse::<usize>()
                .ok()
                .and_then(|group| caps.get(group))
                .map_or("", |m| m.as_str())
                .to_string()
        })
        .into_owned()
}

/// Options of [`tokenize`].
#[derive(Debug, Clone)]
pub struct TokenizeOptions {
    /// Label of the output segmentation.
    pub label: String,
    /// Copy parent annotations onto the produced segments.
    pub import_annotations: bool,
    /// Merge segments with identical spans produced by different rules.
    pub merge_duplicates: bool,
    /// Annotation key receiving a 1-based running number.
    pub auto_number_as: Option<String>,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            import_annotations: true,
            merge_duplicates: false,
            auto_number_as: None,
        }
    }
}

/// Applies every rule to every segment of `input`.
///
/// The segments produced for one parent are sorted by position before being
/// appended. Rule annotations override imported parent annotations.
pub fn tokenize(
    input: &Segmentation,
    store: &StringStore,
    rules: &[TokenRule],
    options: &TokenizeOptions,
) -> Result<Segmentation> {
    input.check_store(store)?;

    let mut segments = Vec::new();
    for parent in input {
        let content = parent.content(store)?;
        let inherited = if options.import_annotations {
            parent.annotations().clone()
        } else {
            Annotations::new()
        };

        let mut children: Vec<Segment> = Vec::new();
        for rule in rules {
            let mut emit = |start: usize, end: usize, annotations: Annotations| {
                children.push(Segment::from_parts(
                    parent.string_id(),
                    parent.start() + start,
                    parent.start() + end,
                    inherited.merged(&annotations),
                ));
            };

            match rule.mode {
                RuleMode::Tokenize => {
                    for caps in rule.pattern.captures_iter(content) {
                        if let Some(m) = caps.get(0) {
                            emit(m.start(), m.end(), rule.annotations_for(Some(&caps)));
                        }
                    }
                }
                RuleMode::Split => {
                    let mut previous_end = 0;
                    for m in rule.pattern.find_iter(content) {
                        if m.start() > previous_end {
                            emit(previous_end, m.start(), rule.annotations_for(None));
                        }
                        previous_end = m.end();
                    }
                    if previous_end < content.len() {
                        emit(previous_end, content.len(), rule.annotations_for(None));
                    }
                }
            }
        }

        children.sort_by_key(|s| (s.start(), s.end()));
        segments.extend(children);
    }

    if options.merge_duplicates {
        segments = merge_duplicates(segments);
    }
    if let Some(key) = &options.auto_number_as {
        number_segments(&mut segments, key);
    }

    debug!(
        "tokenize: {} segments, {} rules -> {} segments",
        input.len(),
        rules.len(),
        segments.len()
    );
    Ok(Segmentation::from_trusted(input.store_id(), options.label.as_str(), segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::AnnotationValue;

    fn single(text: &str) -> (StringStore, Segmentation) {
        let mut store = StringStore::new();
        let id = store.register(text);
        let seg = Segmentation::from_string(&store, id).unwrap();
        (store, seg)
    }

    #[test]
    fn test_tokenize_words() {
        let (store, seg) = single("Hello, world!");
        let rules = vec![TokenRule::tokenize(r"\w+").unwrap()];
        let words = tokenize(&seg, &store, &rules, &TokenizeOptions::default()).unwrap();
        assert_eq!(words.contents(&store).unwrap(), vec!["Hello", "world"]);
    }

    #[test]
    fn test_rules_sorted_by_position() {
        let (store, seg) = single("ab, cd.");
        let rules = vec![
            TokenRule::tokenize(r"\w+").unwrap().annotate("type", "word"),
            TokenRule::tokenize(r"[,.]").unwrap().annotate("type", "punct"),
        ];
        let tokens = tokenize(&seg, &store, &rules, &TokenizeOptions::default()).unwrap();
        assert_eq!(tokens.contents(&store).unwrap(), vec!["ab", ",", "cd", "."]);
        assert_eq!(
            tokens.get(1).unwrap().annotation("type"),
            Some(&AnnotationValue::from("punct"))
        );
    }

    #[test]
    fn test_backreferences() {
        let (store, seg) = single("a=1 b=2");
        let rules = vec![TokenRule::tokenize(r"(\w)=(\d)(x)?")
            .unwrap()
            .annotate("key_&1", "&2&3")];
        let tokens = tokenize(&seg, &store, &rules, &TokenizeOptions::default()).unwrap();
        assert_eq!(
            tokens.get(0).unwrap().annotation("key_a"),
            Some(&AnnotationValue::from("1"))
        );
        assert_eq!(
            tokens.get(1).unwrap().annotation("key_b"),
            Some(&AnnotationValue::from("2"))
        );
    }

    #[test]
    fn test_split_mode() {
        let (store, seg) = single("one  two");
        let rules = vec![TokenRule::split(r"\s").unwrap()];
        let tokens = tokenize(&seg, &store, &rules, &TokenizeOptions::default()).unwrap();
        assert_eq!(tokens.contents(&store).unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_merge_and_number() {
        let (store, seg) = single("ab cd");
        let rules = vec![
            TokenRule::tokenize(r"\w+").unwrap().annotate("a", "x"),
            TokenRule::tokenize(r"\w+").unwrap().annotate("b", "y"),
        ];
        let options = TokenizeOptions {
            merge_duplicates: true,
            auto_number_as: Some("n".to_string()),
            ..TokenizeOptions::default()
        };
        let tokens = tokenize(&seg, &store, &rules, &options).unwrap();
        assert_eq!(tokens.len(), 2);
        let second = tokens.get(1).unwrap();
        assert_eq!(second.annotation("a"), Some(&AnnotationValue::from("x")));
        assert_eq!(second.annotation("b"), Some(&AnnotationValue::from("y")));
        assert_eq!(second.annotation("n"), Some(&AnnotationValue::Integer(2)));
    }
}
