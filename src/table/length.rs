//! Length measures: how many units contexts and averaging segments hold.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::ops::views;
use crate::segmentation::{ContainmentIndex, Segmentation};
use crate::store::StringStore;
use crate::table::key::{keys_of, WithMissing};
use crate::table::{numbered_rows, Cell, KeySource, SegmentRef, Table, TableBuilder, GLOBAL_ROW};
use log::debug;

/// Number of units in a group.
pub const LENGTH_COLUMN: &str = "__length__";
/// Mean number of units per averaging segment.
pub const AVERAGE_COLUMN: &str = "__length_average__";
/// Number of averaging segments.
pub const COUNT_COLUMN: &str = "__length_count__";
/// Population standard deviation of the number of units per averaging
/// segment.
pub const STD_DEVIATION_COLUMN: &str = "__length_std_deviation__";

/// Options of [`length_in_context`].
#[derive(Debug, Clone)]
pub struct LengthOptions {
    /// Key grouping contexts into rows.
    /// Default: position, one row per context.
    pub context_key: KeySource,
    /// Collapse every context into a single `"__global__"` row.
    pub merge_contexts: bool,
    /// Add a standard deviation column when averaging.
    pub std_deviation: bool,
    /// Key for contexts lacking the requested annotation.
    pub missing_key: String,
    /// Input size from which keys are computed across threads.
    pub parallel_threshold: usize,
}

impl LengthOptions {
    /// Builds options from a table configuration.
    pub fn from_config(config: &TableConfig) -> Self {
        Self {
            context_key: KeySource::Position,
            merge_contexts: false,
            std_deviation: false,
            missing_key: config.missing_key.clone(),
            parallel_threshold: config.parallel_threshold,
        }
    }
}

impl Default for LengthOptions {
    fn default() -> Self {
        Self::from_config(&TableConfig::default())
    }
}

/// Options of [`length_in_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthWindowOptions {
    /// Number of consecutive averaging segments in each window. Must be
    /// positive.
    pub window_size: usize,
    /// Add a standard deviation column.
    pub std_deviation: bool,
}

/// Mean and population standard deviation.
fn moments(lengths: &[u64]) -> (Cell, Cell) {
    if lengths.is_empty() {
        return (Cell::Undefined, Cell::Undefined);
    }
    let n = lengths.len() as f64;
    let mean = lengths.iter().sum::<u64>() as f64 / n;
    let variance = lengths
        .iter()
        .map(|&l| (l as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    (Cell::Number(mean), Cell::Number(variance.sqrt()))
}

fn averaging_columns(std_deviation: bool) -> Vec<String> {
    let mut columns = vec![AVERAGE_COLUMN.to_string(), COUNT_COLUMN.to_string()];
    if std_deviation {
        columns.push(STD_DEVIATION_COLUMN.to_string());
    }
    columns
}

/// Measures the length of `units` per context group.
///
/// Without `averaging` the single column `"__length__"` counts the units
/// lying in each group's contexts. With `averaging` every group is
/// described by the number of units in each averaging segment it contains:
/// their mean, their count and optionally their standard deviation. A group
/// without averaging segments has an undefined mean.
///
/// Without `contexts` the whole input forms one `"__global__"` row.
pub fn length_in_context(
    units: &Segmentation,
    contexts: Option<&Segmentation>,
    averaging: Option<&Segmentation>,
    store: &StringStore,
    options: &LengthOptions,
) -> Result<Table> {
    units.check_store(store)?;
    if let Some(averaging) = averaging {
        averaging.check_store(store)?;
    }
    let unit_index = ContainmentIndex::new(units);

    // Each group lists the segments it measures: averaging segments when
    // averaging, units otherwise.
    let mut rows: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let averaging_index = averaging.map(ContainmentIndex::new);
    match contexts {
        None => {
            rows.push(GLOBAL_ROW.to_string());
            let len = averaging.map_or(units.len(), Segmentation::len);
            groups.push((0..len).collect());
        }
        Some(contexts) => {
            let context_views = views(contexts, store)?;
            let keys = if options.merge_contexts {
                vec![GLOBAL_ROW.to_string(); contexts.len()]
            } else {
                keys_of(
                    &context_views,
                    &WithMissing {
                        source: &options.context_key,
                        missing: &options.missing_key,
                    },
                    options.parallel_threshold,
                )
            };
            for (view, key) in context_views.iter().zip(keys) {
                let row = match rows.iter().position(|r| *r == key) {
                    Some(row) => row,
                    None => {
                        rows.push(key);
                        groups.push(Vec::new());
                        rows.len() - 1
                    }
                };
                let index = averaging_index.as_ref().unwrap_or(&unit_index);
                groups[row].extend(index.contained_in(view.segment()));
            }
        }
    }

    let table = match averaging {
        None => {
            let mut builder = TableBuilder::new(rows, vec![LENGTH_COLUMN.to_string()]);
            let source = builder.add_source(units);
            for (row, members) in groups.iter().enumerate() {
                builder.set(row, 0, Cell::Count(members.len() as u64));
                builder.link(row, 0, members.iter().map(|&index| SegmentRef { source, index }).collect());
            }
            builder.build()
        }
        Some(averaging) => {
            let mut builder = TableBuilder::new(rows, averaging_columns(options.std_deviation));
            let source = builder.add_source(averaging);
            for (row, members) in groups.iter().enumerate() {
                let lengths: Vec<u64> = members
                    .iter()
                    .filter_map(|&a| averaging.get(a))
                    .map(|segment| unit_index.contained_in(segment).len() as u64)
                    .collect();
                let (mean, std) = moments(&lengths);
                let refs: Vec<SegmentRef> = members.iter().map(|&index| SegmentRef { source, index }).collect();
                builder.set(row, 0, mean);
                builder.link(row, 0, refs.clone());
                builder.set(row, 1, Cell::Count(lengths.len() as u64));
                builder.link(row, 1, refs);
                if options.std_deviation {
                    builder.set(row, 2, std);
                }
            }
            builder.build()
        }
    };

    debug!(
        "length_in_context: {} units -> {} rows",
        units.len(),
        table.dimensions().0
    );
    Ok(table)
}

/// Measures the mean number of units per averaging segment over every
/// window of `window_size` consecutive averaging segments.
///
/// Rows are windows `"1"` to `"n - window_size + 1"`. Fewer averaging
/// segments than `window_size` give a table without rows.
pub fn length_in_window(
    units: &Segmentation,
    averaging: &Segmentation,
    store: &StringStore,
    options: &LengthWindowOptions,
) -> Result<Table> {
    if options.window_size == 0 {
        return Err(Error::InvalidArgument("window_size must be positive".to_string()));
    }
    units.check_store(store)?;
    averaging.check_store(store)?;

    let index = ContainmentIndex::new(units);
    let lengths: Vec<u64> = averaging
        .iter()
        .map(|segment| index.contained_in(segment).len() as u64)
        .collect();

    let n_windows = (lengths.len() + 1).saturating_sub(options.window_size);
    let mut builder = TableBuilder::new(numbered_rows(n_windows), averaging_columns(options.std_deviation));
    let source = builder.add_source(averaging);
    for (row, window) in lengths.windows(options.window_size).enumerate() {
        let (mean, std) = moments(window);
        let refs: Vec<SegmentRef> = (row..row + options.window_size)
            .map(|index| SegmentRef { source, index })
            .collect();
        builder.set(row, 0, mean);
        builder.link(row, 0, refs);
        builder.set(row, 1, Cell::Count(options.window_size as u64));
        if options.std_deviation {
            builder.set(row, 2, std);
        }
    }

    debug!(
        "length_in_window: {} averaging segments in {} windows of {}",
        averaging.len(),
        n_windows,
        options.window_size
    );
    Ok(builder.build())
}
