//! Lexical complexity measures.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::ops::views;
use crate::segmentation::{ContainmentIndex, Segmentation};
use crate::store::StringStore;
use crate::table::key::{keys_of, WithMissing};
use crate::table::{numbered_rows, Cell, KeySource, SegmentRef, Table, TableBuilder, GLOBAL_ROW};
use log::debug;
use std::collections::HashMap;

/// Number of units.
pub const TOKENS_COLUMN: &str = "__tokens__";
/// Number of distinct unit types.
pub const TYPES_COLUMN: &str = "__types__";
/// Types divided by tokens.
pub const TTR_COLUMN: &str = "__ttr__";
/// Exponential of the entropy of the type distribution.
pub const PERPLEXITY_COLUMN: &str = "__perplexity__";
/// Expected number of types in a random subsample.
pub const EXPECTED_VARIETY_COLUMN: &str = "__expected_variety__";

/// Options of [`complexity`].
#[derive(Debug, Clone)]
pub struct ComplexityOptions {
    /// Key defining unit types.
    pub unit_key: KeySource,
    /// Key grouping contexts into rows.
    /// Default: position, one row per context.
    pub context_key: KeySource,
    /// Size of the subsample for expected variety; `None` omits the column.
    pub subsample_size: Option<usize>,
    /// Key for segments lacking the requested annotation.
    pub missing_key: String,
    /// Input size from which keys are computed across threads.
    pub parallel_threshold: usize,
}

impl ComplexityOptions {
    /// Builds options from a table configuration.
    pub fn from_config(config: &TableConfig) -> Self {
        Self {
            unit_key: KeySource::Content,
            context_key: KeySource::Position,
            subsample_size: None,
            missing_key: config.missing_key.clone(),
            parallel_threshold: config.parallel_threshold,
        }
    }
}

impl Default for ComplexityOptions {
    fn default() -> Self {
        Self::from_config(&TableConfig::default())
    }
}

/// Options of [`complexity_in_window`].
#[derive(Debug, Clone)]
pub struct WindowComplexityOptions {
    /// Number of consecutive units in each window. Must be positive.
    pub window_size: usize,
    /// Key defining unit types.
    pub unit_key: KeySource,
    /// Size of the subsample for expected variety; `None` omits the column.
    pub subsample_size: Option<usize>,
    /// Key for segments lacking the requested annotation.
    pub missing_key: String,
    /// Input size from which keys are computed across threads.
    pub parallel_threshold: usize,
}

impl WindowComplexityOptions {
    /// Builds options from a table configuration.
    pub fn from_config(window_size: usize, config: &TableConfig) -> Self {
        Self {
            window_size,
            unit_key: KeySource::Content,
            subsample_size: None,
            missing_key: config.missing_key.clone(),
            parallel_threshold: config.parallel_threshold,
        }
    }
}

/// Units falling into one row of the table.
#[derive(Debug, Default)]
struct Group {
    frequencies: HashMap<String, u64>,
    members: Vec<usize>,
}

impl Group {
    fn add(&mut self, key: &str, unit: usize) {
        *self.frequencies.entry(key.to_string()).or_insert(0) += 1;
        self.members.push(unit);
    }

    fn tokens(&self) -> u64 {
        self.frequencies.values().sum()
    }

    fn ttr(&self) -> Cell {
        let tokens = self.tokens();
        if tokens == 0 {
            return Cell::Undefined;
        }
        Cell::Number(self.frequencies.len() as f64 / tokens as f64)
    }

    /// exp(H) with H = log(N) - sum(f log f) / N.
    fn perplexity(&self) -> Cell {
        let tokens = self.tokens();
        if tokens == 0 {
            return Cell::Undefined;
        }
        let n = tokens as f64;
        let weighted: f64 = self
            .frequencies
            .values()
            .map(|&f| f as f64 * (f as f64).ln())
            .sum();
        Cell::Number((n.ln() - weighted / n).exp())
    }

    /// Expected number of types among `size` units drawn without
    /// replacement.
    fn expected_variety(&self, size: usize) -> Cell {
        let tokens = self.tokens() as usize;
        if tokens == 0 || tokens < size {
            return Cell::Undefined;
        }
        let expected: f64 = self
            .frequencies
            .values()
            .map(|&f| 1.0 - probability_absent(tokens, f as usize, size))
            .sum();
        Cell::Number(expected)
    }
}

/// Probability that a type of frequency `f` among `total` units does not
/// occur in a subsample of `size` units.
fn probability_absent(total: usize, f: usize, size: usize) -> f64 {
    if f > total - size {
        return 0.0;
    }
    (0..size)
        .map(|i| (total - f - i) as f64 / (total - i) as f64)
        .product()
}

fn measure_columns(subsample_size: Option<usize>) -> Vec<String> {
    let mut columns = vec![
        TOKENS_COLUMN.to_string(),
        TYPES_COLUMN.to_string(),
        TTR_COLUMN.to_string(),
        PERPLEXITY_COLUMN.to_string(),
    ];
    if subsample_size.is_some() {
        columns.push(EXPECTED_VARIETY_COLUMN.to_string());
    }
    columns
}

fn fill_row(builder: &mut TableBuilder, row: usize, group: &Group, source: usize, subsample_size: Option<usize>) {
    let refs: Vec<SegmentRef> = group
        .members
        .iter()
        .map(|&index| SegmentRef { source, index })
        .collect();

    builder.set(row, 0, Cell::Count(group.tokens()));
    builder.link(row, 0, refs.clone());
    builder.set(row, 1, Cell::Count(group.frequencies.len() as u64));
    builder.link(row, 1, refs);
    builder.set(row, 2, group.ttr());
    builder.set(row, 3, group.perplexity());
    if let Some(size) = subsample_size {
        builder.set(row, 4, group.expected_variety(size));
    }
}

/// Computes complexity measures of `units` within each context group.
///
/// Without contexts the whole unit segmentation forms one `"__global__"`
/// row. Every context group gets a row, including groups holding no unit;
/// their ratios are [`Cell::Undefined`].
pub fn complexity(
    units: &Segmentation,
    contexts: Option<&Segmentation>,
    store: &StringStore,
    options: &ComplexityOptions,
) -> Result<Table> {
    if options.subsample_size == Some(0) {
        return Err(Error::InvalidArgument("subsample_size must be positive".to_string()));
    }
    let threshold = options.parallel_threshold;
    let unit_views = views(units, store)?;
    let unit_keys = keys_of(
        &unit_views,
        &WithMissing {
            source: &options.unit_key,
            missing: &options.missing_key,
        },
        threshold,
    );

    let mut rows: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();
    let mut add = |row: &str, unit: Option<usize>| {
        let group = groups.entry(row.to_string()).or_insert_with(|| {
            rows.push(row.to_string());
            Group::default()
        });
        if let Some(u) = unit {
            group.add(&unit_keys[u], u);
        }
    };

    match contexts {
        None => {
            add(GLOBAL_ROW, None);
            for u in 0..units.len() {
                add(GLOBAL_ROW, Some(u));
            }
        }
        Some(contexts) => {
            let context_views = views(contexts, store)?;
            let context_keys = keys_of(
                &context_views,
                &WithMissing {
                    source: &options.context_key,
                    missing: &options.missing_key,
                },
                threshold,
            );
            let index = ContainmentIndex::new(units);
            for (view, key) in context_views.iter().zip(&context_keys) {
                add(key, None);
                for u in index.contained_in(view.segment()) {
                    add(key, Some(u));
                }
            }
        }
    }

    let mut builder = TableBuilder::new(rows.clone(), measure_columns(options.subsample_size));
    let source = builder.add_source(units);
    for (row, header) in rows.iter().enumerate() {
        if let Some(group) = groups.get(header) {
            fill_row(&mut builder, row, group, source, options.subsample_size);
        }
    }

    debug!(
        "complexity: {} units in {} groups",
        units.len(),
        rows.len()
    );
    Ok(builder.build())
}

/// Computes complexity measures over every window of `window_size`
/// consecutive units.
///
/// Rows are windows `"1"` to `"n - window_size + 1"`. Fewer units than
/// `window_size` give a table without rows.
pub fn complexity_in_window(
    units: &Segmentation,
    store: &StringStore,
    options: &WindowComplexityOptions,
) -> Result<Table> {
    if options.window_size == 0 {
        return Err(Error::InvalidArgument("window_size must be positive".to_string()));
    }
    if options.subsample_size == Some(0) {
        return Err(Error::InvalidArgument("subsample_size must be positive".to_string()));
    }
    let unit_views = views(units, store)?;
    let unit_keys = keys_of(
        &unit_views,
        &WithMissing {
            source: &options.unit_key,
            missing: &options.missing_key,
        },
        options.parallel_threshold,
    );

    let n_windows = (units.len() + 1).saturating_sub(options.window_size);
    let mut builder = TableBuilder::new(numbered_rows(n_windows), measure_columns(options.subsample_size));
    let source = builder.add_source(units);
    for w in 0..n_windows {
        let mut group = Group::default();
        for (u, key) in unit_keys.iter().enumerate().skip(w).take(options.window_size) {
            group.add(key, u);
        }
        fill_row(&mut builder, w, &group, source, options.subsample_size);
    }

    debug!(
        "complexity_in_window: {} units in {} windows of {}",
        units.len(),
        n_windows,
        options.window_size
    );
    Ok(builder.build())
}
