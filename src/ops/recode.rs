//! Text-level recoding.

use crate::error::{Error, Result};
use crate::segment::Segment;
use crate::segmentation::Segmentation;
use crate::store::StringStore;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static BACKREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"&([0-9]+)").unwrap());

/// Case conversion applied before substitutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    /// Lowercase.
    Lower,
    /// Uppercase.
    Upper,
}

/// A set of text transformations.
#[derive(Debug, Clone, Default)]
pub struct Recoder {
    /// Optional case conversion.
    pub case: Option<Case>,
    /// Strip diacritics.
    pub remove_accents: bool,
    substitutions: Vec<(Regex, String)>,
}

impl Recoder {
    /// Creates a recoder that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the case conversion.
    pub fn with_case(mut self, case: Case) -> Self {
        self.case = Some(case);
        self
    }

    /// Enables diacritic removal.
    pub fn removing_accents(mut self) -> Self {
        self.remove_accents = true;
        self
    }

    /// Appends a substitution. The replacement may use `&N` for capture
    /// group `N`.
    pub fn substitute(mut self, pattern: &str, replacement: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        let escaped = replacement.replace('$', "$$");
        let template = BACKREF
            .replace_all(&escaped, |caps: &Captures<'_>| format!("${{{}}}", &caps[1]))
            .into_owned();
        self.substitutions.push((regex, template));
        Ok(self)
    }

    /// Recodes one text and returns it with the number of substitutions made.
    pub fn recode(&self, text: &str) -> (String, usize) {
        let mut text = match self.case {
            Some(Case::Lower) => text.to_lowercase(),
            Some(Case::Upper) => text.to_uppercase(),
            None => text.to_string(),
        };

        if self.remove_accents {
            text = text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect();
        }

        let mut count = 0;
        for (regex, template) in &self.substitutions {
            let found = regex.find_iter(&text).count();
            if found > 0 {
                count += found;
                text = regex.replace_all(&text, template.as_str()).into_owned();
            }
        }
        (text, count)
    }
}

/// Output of [`recode_text`].
#[derive(Debug, Clone)]
pub struct Recoded {
    /// The recoded segmentation.
    pub segmentation: Segmentation,
    /// Total number of substitutions made.
    pub substitutions: usize,
}

/// Applies `recoder` to the content of every segment.
///
/// A segment whose content changes is replaced by a segment spanning a newly
/// registered string holding the recoded text. Unchanged segments keep their
/// span. Annotations and order are kept.
pub fn recode_text(input: &Segmentation, store: &mut StringStore, recoder: &Recoder) -> Result<Recoded> {
    input.check_store(store)?;
    if !input.is_non_overlapping() {
        return Err(Error::OverlappingSegmentation);
    }

    let mut segments = Vec::with_capacity(input.len());
    let mut substitutions = 0;
    let mut registered = 0;
    for segment in input {
        let (recoded, count) = recoder.recode(segment.content(store)?);
        substitutions += count;

        if recoded == segment.content(store)? {
            segments.push(segment.clone());
            continue;
        }

        let len = recoded.len();
        let id = store.register(recoded);
        registered += 1;
        segments.push(Segment::from_parts(id, 0, len, segment.annotations().clone()));
    }

    debug!(
        "recode: {} segments, {} new strings, {} substitutions",
        input.len(),
        registered,
        substitutions
    );
    let segmentation = Segmentation::from_trusted(store.id(), input.label(), segments)
        .with_annotations(input.annotations().clone());
    Ok(Recoded {
        segmentation,
        substitutions,
    })
}
