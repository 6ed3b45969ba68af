//! Splitting segments on delimiters.

use crate::config::{SplitConfig, ZeroLengthPolicy};
use crate::error::{Error, Result};
use crate::segment::{Annotations, Segment};
use crate::segmentation::{Segmentation, DEFAULT_LABEL};
use crate::store::StringStore;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// What separates the pieces of a segment.
#[derive(Debug, Clone)]
pub enum Delimiter {
    /// A literal string. The empty string matches between every character.
    Literal(String),
    /// A regular expression.
    Pattern(Regex),
    /// No delimiter: consecutive chunks of this many characters.
    Window(usize),
    /// Unicode word boundaries. Pieces containing no alphanumeric character
    /// count as delimiters.
    Words,
}

impl Delimiter {
    /// Compiles a regular expression delimiter.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Delimiter::Pattern(Regex::new(pattern)?))
    }

    /// Runs of whitespace.
    pub fn whitespace() -> Self {
        Delimiter::Pattern(WHITESPACE.clone())
    }
}

/// Parameters of [`split`].
#[derive(Debug, Clone)]
pub struct Splitter {
    /// Delimiter to split on.
    pub delimiter: Delimiter,
    /// Handling of zero-length matches.
    pub zero_length: ZeroLengthPolicy,
    /// Emit the delimiter matches as segments too.
    pub keep_delimiters: bool,
    /// Copy parent annotations onto children.
    pub import_annotations: bool,
    /// Label of the output segmentation.
    pub label: String,
}

impl Splitter {
    /// Creates a splitter with default settings.
    pub fn new(delimiter: Delimiter) -> Self {
        Self::from_config(delimiter, &SplitConfig::default())
    }

    /// Creates a splitter taking its settings from a configuration.
    pub fn from_config(delimiter: Delimiter, config: &SplitConfig) -> Self {
        Self {
            delimiter,
            zero_length: config.zero_length,
            keep_delimiters: config.keep_delimiters,
            import_annotations: config.import_annotations,
            label: DEFAULT_LABEL.to_string(),
        }
    }

    /// Sets the output label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets whether delimiter matches are kept as segments.
    pub fn keeping_delimiters(mut self, keep: bool) -> Self {
        self.keep_delimiters = keep;
        self
    }

    /// Sets the zero-length match policy.
    pub fn with_zero_length(mut self, policy: ZeroLengthPolicy) -> Self {
        self.zero_length = policy;
        self
    }

    /// Returns the pieces of `text` as byte ranges, in position order.
    fn pieces(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let matches = match &self.delimiter {
            Delimiter::Window(0) => {
                return Err(Error::InvalidDelimiter("window size must be positive".to_string()))
            }
            Delimiter::Window(size) => return Ok(window_pieces(text, *size)),
            Delimiter::Words => return Ok(word_pieces(text, self.keep_delimiters)),
            Delimiter::Literal(literal) if literal.is_empty() => {
                if self.zero_length == ZeroLengthPolicy::Reject {
                    return Err(Error::InvalidDelimiter(
                        "empty literal matches the empty string".to_string(),
                    ));
                }
                text.char_indices()
                    .map(|(i, _)| i..i)
                    .chain(std::iter::once(text.len()..text.len()))
                    .collect()
            }
            Delimiter::Literal(literal) => text
                .match_indices(literal.as_str())
                .map(|(i, m)| i..i + m.len())
                .collect(),
            Delimiter::Pattern(regex) => pattern_matches(regex, text, self.zero_length)?,
        };

        let mut pieces = Vec::with_capacity(matches.len() + 1);
        let mut previous_end = 0;
        for m in matches {
            if m.start > previous_end {
                pieces.push(previous_end..m.start);
            }
            if self.keep_delimiters && m.start < m.end {
                pieces.push(m.clone());
            }
            previous_end = m.end;
        }
        if previous_end < text.len() {
            pieces.push(previous_end..text.len());
        }
        Ok(pieces)
    }
}

/// Finds non-overlapping, leftmost-first matches of `regex` in `text`.
///
/// After a zero-length match the search resumes one character further on.
fn pattern_matches(regex: &Regex, text: &str, policy: ZeroLengthPolicy) -> Result<Vec<Range<usize>>> {
    let mut matches = Vec::new();
    let mut pos = 0;
    while pos <= text.len() {
        let Some(m) = regex.find_at(text, pos) else {
            break;
        };

        if m.start() < m.end() {
            matches.push(m.range());
            pos = m.end();
            continue;
        }

        if policy == ZeroLengthPolicy::Reject {
            return Err(Error::InvalidDelimiter(format!(
                "pattern {:?} matches the empty string at offset {}",
                regex.as_str(),
                m.start()
            )));
        }
        matches.push(m.range());
        match text[m.end()..].chars().next() {
            Some(c) => pos = m.end() + c.len_utf8(),
            None => break,
        }
    }
    Ok(matches)
}

fn window_pieces(text: &str, size: usize) -> Vec<Range<usize>> {
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).step_by(size).collect();
    bounds.push(text.len());
    bounds
        .windows(2)
        .filter(|w| w[0] < w[1])
        .map(|w| w[0]..w[1])
        .collect()
}

fn word_pieces(text: &str, keep_delimiters: bool) -> Vec<Range<usize>> {
    text.split_word_bound_indices()
        .filter(|(_, piece)| keep_delimiters || piece.chars().any(char::is_alphanumeric))
        .map(|(i, piece)| i..i + piece.len())
        .collect()
}

/// Splits every segment of `input` on the splitter's delimiter.
///
/// Children follow parent order, then position within the parent. Empty
/// pieces are dropped.
pub fn split(input: &Segmentation, store: &StringStore, splitter: &Splitter) -> Result<Segmentation> {
    input.check_store(store)?;

    let mut segments = Vec::new();
    for parent in input {
        let content = parent.content(store)?;
        let annotations = if splitter.import_annotations {
            parent.annotations().clone()
        } else {
            Annotations::new()
        };

        for piece in splitter.pieces(content)? {
            segments.push(Segment::from_parts(
                parent.string_id(),
                parent.start() + piece.start,
                parent.start() + piece.end,
                annotations.clone(),
            ));
        }
    }

    debug!("split: {} segments -> {} segments", input.len(), segments.len());
    Ok(Segmentation::from_trusted(input.store_id(), splitter.label.as_str(), segments))
}
