//! Concordances: every unit shown with its surroundings.

use crate::config::TableConfig;
use crate::error::Result;
use crate::ops::views;
use crate::segment::Segment;
use crate::segmentation::{ContainmentIndex, Segmentation};
use crate::store::StringStore;
use crate::table::key::MISSING_KEY;
use crate::table::{numbered_rows, Cell, SegmentRef, Table, TableBuilder};
use log::debug;

/// Column holding the text before the unit.
pub const LEFT_COLUMN: &str = "__left__";
/// Column holding the unit itself.
pub const KEY_COLUMN: &str = "__key_segment__";
/// Column holding the text after the unit.
pub const RIGHT_COLUMN: &str = "__right__";
/// Column holding the 1-based position of the containing context.
pub const POSITION_COLUMN: &str = "__pos__";

/// Extent of the context shown around each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextWindow {
    /// Up to this many characters of the source string on each side.
    Characters(usize),
    /// Up to this many neighbouring segments on each side.
    Segments(usize),
}

/// Options of [`concordance`].
#[derive(Debug, Clone)]
pub struct ConcordanceOptions {
    /// Context extent.
    pub window: ContextWindow,
    /// Separator between neighbouring segments.
    pub joiner: String,
    /// Let segment windows run across string boundaries.
    pub cross_strings: bool,
    /// Unit annotation shown in its own column.
    pub annotation_key: Option<String>,
}

impl ConcordanceOptions {
    /// Builds options from a table configuration.
    pub fn from_config(window: ContextWindow, config: &TableConfig) -> Self {
        Self {
            window,
            joiner: config.concordance_joiner.clone(),
            cross_strings: false,
            annotation_key: None,
        }
    }
}

impl Default for ConcordanceOptions {
    fn default() -> Self {
        Self::from_config(ContextWindow::Characters(25), &TableConfig::default())
    }
}

/// Options of [`concordance_in_context`].
#[derive(Debug, Clone, Default)]
pub struct InContextOptions {
    /// Limit on the characters shown on each side. `None` shows the whole
    /// context.
    pub max_chars: Option<usize>,
    /// Unit annotation shown in its own column.
    pub annotation_key: Option<String>,
}

/// Returns the last `n` characters of `text`.
fn tail(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &text[i..],
        None => text,
    }
}

/// Returns the first `n` characters of `text`.
fn head(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

fn annotation_cell(segment: &Segment, key: &str) -> Cell {
    Cell::Text(
        segment
            .annotation(key)
            .map_or_else(|| MISSING_KEY.to_string(), |v| v.to_string()),
    )
}

fn columns(first: Option<&str>, annotation_key: Option<&String>) -> Vec<String> {
    first
        .into_iter()
        .chain([LEFT_COLUMN, KEY_COLUMN, RIGHT_COLUMN])
        .map(str::to_string)
        .chain(annotation_key.cloned())
        .collect()
}

/// Builds a concordance of `units`.
///
/// One row per unit, headed `"1"` to `"n"`. Windows are clipped at string
/// boundaries and at the ends of the segmentation; clipping is never an
/// error.
pub fn concordance(units: &Segmentation, store: &StringStore, options: &ConcordanceOptions) -> Result<Table> {
    let views = views(units, store)?;
    let mut builder = TableBuilder::new(
        numbered_rows(units.len()),
        columns(None, options.annotation_key.as_ref()),
    );
    let source = builder.add_source(units);
    let unit_ref = |index: usize| vec![SegmentRef { source, index }];

    for (row, view) in views.iter().enumerate() {
        let segment = view.segment();
        let (left, right, left_refs, right_refs) = match options.window {
            ContextWindow::Characters(n) => {
                let text = store.get(segment.string_id())?;
                (
                    tail(&text[..segment.start()], n).to_string(),
                    head(&text[segment.end()..], n).to_string(),
                    unit_ref(row),
                    unit_ref(row),
                )
            }
            ContextWindow::Segments(n) => {
                let same_string = |i: &usize| {
                    options.cross_strings || views[*i].segment().string_id() == segment.string_id()
                };
                let before: Vec<usize> = (row.saturating_sub(n)..row)
                    .rev()
                    .take_while(same_string)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                let end = views.len().min(row.saturating_add(1).saturating_add(n));
                let after: Vec<usize> = (row + 1..end).take_while(same_string).collect();
                let join = |indices: &[usize]| {
                    indices
                        .iter()
                        .map(|&i| views[i].content())
                        .collect::<Vec<_>>()
                        .join(options.joiner.as_str())
                };
                (
                    join(&before),
                    join(&after),
                    before.iter().map(|&index| SegmentRef { source, index }).collect(),
                    after.iter().map(|&index| SegmentRef { source, index }).collect(),
                )
            }
        };

        builder.set(row, 0, Cell::Text(left));
        builder.link(row, 0, left_refs);
        builder.set(row, 1, Cell::Text(view.content().to_string()));
        builder.link(row, 1, unit_ref(row));
        builder.set(row, 2, Cell::Text(right));
        builder.link(row, 2, right_refs);
        if let Some(key) = &options.annotation_key {
            builder.set(row, 3, annotation_cell(segment, key));
            builder.link(row, 3, unit_ref(row));
        }
    }

    debug!("concordance: {} units", units.len());
    Ok(builder.build())
}

/// Builds a concordance of the units lying within each context segment.
///
/// Rows follow context order, then unit order. Left and right text never
/// extend past the containing context.
pub fn concordance_in_context(
    units: &Segmentation,
    contexts: &Segmentation,
    store: &StringStore,
    options: &InContextOptions,
) -> Result<Table> {
    units.check_store(store)?;
    let context_views = views(contexts, store)?;
    let index = ContainmentIndex::new(units);

    let hits: Vec<(usize, usize)> = context_views
        .iter()
        .enumerate()
        .flat_map(|(c, view)| {
            index
                .contained_in(view.segment())
                .into_iter()
                .map(move |u| (c, u))
        })
        .collect();

    let mut builder = TableBuilder::new(
        numbered_rows(hits.len()),
        columns(Some(POSITION_COLUMN), options.annotation_key.as_ref()),
    );
    let unit_source = builder.add_source(units);
    let context_source = builder.add_source(contexts);

    for (row, &(c, u)) in hits.iter().enumerate() {
        let context = context_views[c].segment();
        let Some(unit) = units.get(u) else {
            continue;
        };
        let text = store.get(unit.string_id())?;
        let limit = |s: &str| s.chars().count();
        let left_text = &text[context.start()..unit.start()];
        let right_text = &text[unit.end()..context.end()];
        let left = tail(left_text, options.max_chars.unwrap_or_else(|| limit(left_text)));
        let right = head(right_text, options.max_chars.unwrap_or_else(|| limit(right_text)));

        let unit_ref = vec![SegmentRef {
            source: unit_source,
            index: u,
        }];
        let context_ref = vec![SegmentRef {
            source: context_source,
            index: c,
        }];

        builder.set(row, 0, Cell::Count(c as u64 + 1));
        builder.link(row, 0, context_ref.clone());
        builder.set(row, 1, Cell::Text(left.to_string()));
        builder.link(row, 1, context_ref.clone());
        builder.set(row, 2, Cell::Text(unit.content(store)?.to_string()));
        builder.link(row, 2, unit_ref.clone());
        builder.set(row, 3, Cell::Text(right.to_string()));
        builder.link(row, 3, context_ref);
        if let Some(key) = &options.annotation_key {
            builder.set(row, 4, annotation_cell(unit, key));
            builder.link(row, 4, unit_ref);
        }
    }

    debug!(
        "concordance_in_context: {} units in {} contexts -> {} rows",
        units.len(),
        contexts.len(),
        hits.len()
    );
    Ok(builder.build())
}
