//! Frequency tables.
//!
//! Counting runs as a rayon fold over the input followed by a reduce of the
//! partial tallies. Merging tallies sums counts, keeps the smallest first
//! position and sorts provenance, so the result never depends on how the
//! work was split.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::ops::views;
use crate::segmentation::{ContainmentIndex, Segmentation};
use crate::store::StringStore;
use crate::table::key::{keys_of, WithMissing};
use crate::table::{numbered_rows, Cell, GroupingKey, KeySource, SegmentRef, Table, TableBuilder, GLOBAL_ROW};
use log::debug;
use rayon::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;

/// Column header of single-column frequency tables.
pub const COUNT_COLUMN: &str = "__count__";

/// Options of [`count`].
#[derive(Debug, Clone)]
pub struct CountOptions {
    /// What is counted.
    pub key: KeySource,
    /// Count sequences of this many consecutive units. Must be positive.
    pub seq_length: usize,
    /// Joins the keys of a sequence.
    pub seq_delimiter: String,
    /// Key for units lacking the requested annotation.
    pub missing_key: String,
    /// Input size from which counting is split across threads.
    pub parallel_threshold: usize,
}

impl CountOptions {
    /// Builds options from a table configuration.
    pub fn from_config(key: KeySource, config: &TableConfig) -> Self {
        Self {
            key,
            seq_length: 1,
            seq_delimiter: config.seq_delimiter.clone(),
            missing_key: config.missing_key.clone(),
            parallel_threshold: config.parallel_threshold,
        }
    }
}

impl Default for CountOptions {
    fn default() -> Self {
        Self::from_config(KeySource::Content, &TableConfig::default())
    }
}

/// Options of [`count_in_context`].
#[derive(Debug, Clone)]
pub struct ContextCountOptions {
    /// Key of the counted units.
    pub unit_key: KeySource,
    /// Key of the contexts, giving the rows.
    pub context_key: KeySource,
    /// Collapse every context into a single `"__global__"` row.
    pub merge_contexts: bool,
    /// Count sequences of this many consecutive units lying in the same
    /// context. Must be positive.
    pub seq_length: usize,
    /// Joins the keys of a sequence.
    pub seq_delimiter: String,
    /// Key for segments lacking the requested annotation.
    pub missing_key: String,
    /// Number of contexts from which counting is split across threads.
    pub parallel_threshold: usize,
}

impl ContextCountOptions {
    /// Builds options from a table configuration.
    pub fn from_config(unit_key: KeySource, context_key: KeySource, config: &TableConfig) -> Self {
        Self {
            unit_key,
            context_key,
            merge_contexts: false,
            seq_length: 1,
            seq_delimiter: config.seq_delimiter.clone(),
            missing_key: config.missing_key.clone(),
            parallel_threshold: config.parallel_threshold,
        }
    }
}

impl Default for ContextCountOptions {
    fn default() -> Self {
        Self::from_config(KeySource::Content, KeySource::Content, &TableConfig::default())
    }
}

/// Options of [`count_in_window`].
#[derive(Debug, Clone)]
pub struct WindowCountOptions {
    /// Number of consecutive units in each window. Must be at least
    /// `seq_length`.
    pub window_size: usize,
    /// What is counted.
    pub key: KeySource,
    /// Count sequences of this many consecutive units. Must be positive.
    pub seq_length: usize,
    /// Joins the keys of a sequence.
    pub seq_delimiter: String,
    /// Key for units lacking the requested annotation.
    pub missing_key: String,
    /// Number of windows from which counting is split across threads.
    pub parallel_threshold: usize,
}

impl WindowCountOptions {
    /// Builds options from a table configuration.
    pub fn from_config(window_size: usize, key: KeySource, config: &TableConfig) -> Self {
        Self {
            window_size,
            key,
            seq_length: 1,
            seq_delimiter: config.seq_delimiter.clone(),
            missing_key: config.missing_key.clone(),
            parallel_threshold: config.parallel_threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) count: u64,
    pub(crate) first: usize,
    pub(crate) members: Vec<usize>,
}

/// Partial counts keyed by `K`.
#[derive(Debug)]
pub(crate) struct Tally<K> {
    entries: HashMap<K, Entry>,
}

impl<K: Hash + Eq> Tally<K> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn add(mut self, key: K, first: usize, members: Vec<usize>) -> Self {
        self.record(key, 1, first, members);
        self
    }

    pub(crate) fn record(&mut self, key: K, count: u64, first: usize, members: Vec<usize>) {
        let entry = self.entries.entry(key).or_insert(Entry {
            count: 0,
            first,
            members: Vec::new(),
        });
        entry.count += count;
        entry.first = entry.first.min(first);
        entry.members.extend(members);
    }

    pub(crate) fn merge(mut self, other: Self) -> Self {
        for (key, entry) in other.entries {
            self.record(key, entry.count, entry.first, entry.members);
        }
        self
    }

    /// Returns the entries by descending count, ties by first position.
    pub(crate) fn into_ranked(self) -> Vec<(K, Entry)> {
        let mut ranked: Vec<(K, Entry)> = self
            .entries
            .into_iter()
            .map(|(key, mut entry)| {
                entry.members.sort_unstable();
                entry.members.dedup();
                (key, entry)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.1.first.cmp(&b.1.first)));
        ranked
    }
}

/// Counts `(key, first, members)` items in parallel.
pub(crate) fn tally<K>(items: Vec<(K, usize, Vec<usize>)>, min_len: usize) -> Tally<K>
where
    K: Hash + Eq + Send,
{
    items
        .into_par_iter()
        .with_min_len(min_len.max(1))
        .fold(Tally::new, |t, (key, first, members)| t.add(key, first, members))
        .reduce(Tally::new, Tally::merge)
}

pub(crate) fn refs(source: usize, members: &[usize]) -> Vec<SegmentRef> {
    members
        .iter()
        .map(|&index| SegmentRef { source, index })
        .collect()
}

/// Returns the key, first position and members of the `length` units
/// starting at `start`.
pub(crate) fn sequence(
    keys: &[String],
    start: usize,
    length: usize,
    delimiter: &str,
) -> (String, usize, Vec<usize>) {
    let end = start + length;
    (keys[start..end].join(delimiter), start, (start..end).collect())
}

/// Counts unit types.
///
/// One row per distinct key, ordered by descending count with ties in order
/// of first occurrence, and a single `"__count__"` column. With
/// `seq_length > 1` the rows are sequences of consecutive unit keys joined
/// with `seq_delimiter`.
pub fn count(units: &Segmentation, store: &StringStore, options: &CountOptions) -> Result<Table> {
    if options.seq_length == 0 {
        return Err(Error::InvalidArgument("seq_length must be positive".to_string()));
    }
    let key = WithMissing {
        source: &options.key,
        missing: &options.missing_key,
    };
    count_keys(
        units,
        store,
        &key,
        options.seq_length,
        &options.seq_delimiter,
        options.parallel_threshold,
    )
}

/// Counts units grouped by a caller-supplied key.
///
/// Only `config.parallel_threshold` is used.
pub fn count_by<K>(units: &Segmentation, store: &StringStore, key: &K, config: &TableConfig) -> Result<Table>
where
    K: GroupingKey + ?Sized,
{
    count_keys(units, store, key, 1, "", config.parallel_threshold)
}

fn count_keys<K>(
    units: &Segmentation,
    store: &StringStore,
    key: &K,
    seq_length: usize,
    seq_delimiter: &str,
    min_len: usize,
) -> Result<Table>
where
    K: GroupingKey + ?Sized,
{
    let views = views(units, store)?;
    let keys = keys_of(&views, key, min_len);

    let items: Vec<(String, usize, Vec<usize>)> = if seq_length == 1 {
        keys.into_iter()
            .enumerate()
            .map(|(i, k)| (k, i, vec![i]))
            .collect()
    } else {
        (0..keys.len().saturating_sub(seq_length - 1))
            .map(|i| sequence(&keys, i, seq_length, seq_delimiter))
            .collect()
    };

    let ranked = tally(items, min_len).into_ranked();
    let mut builder = TableBuilder::new(
        ranked.iter().map(|(k, _)| k.clone()).collect(),
        vec![COUNT_COLUMN.to_string()],
    );
    let source = builder.add_source(units);
    for (row, (_, entry)) in ranked.iter().enumerate() {
        builder.set(row, 0, Cell::Count(entry.count));
        builder.link(row, 0, refs(source, &entry.members));
    }

    debug!("count: {} units -> {} types", units.len(), ranked.len());
    Ok(builder.build())
}

/// Ranks the first or second component of pair entries by total count, ties
/// by first position.
pub(crate) fn rank_margin<F>(entries: &[((String, String), Entry)], pick: F) -> Vec<String>
where
    F: Fn(&(String, String)) -> &String,
{
    let mut margin = Tally::new();
    for (pair, entry) in entries {
        margin.record(pick(pair).clone(), entry.count, entry.first, Vec::new());
    }
    margin.into_ranked().into_iter().map(|(k, _)| k).collect()
}

pub(crate) fn pair_table(
    rows: Vec<String>,
    columns: Vec<String>,
    entries: Vec<((String, String), Entry)>,
    source: &Segmentation,
) -> Table {
    let row_pos: HashMap<&str, usize> = rows.iter().enumerate().map(|(i, k)| (k.as_str(), i)).collect();
    let col_pos: HashMap<&str, usize> = columns.iter().enumerate().map(|(i, k)| (k.as_str(), i)).collect();
    let placed: Vec<(usize, usize, Entry)> = entries
        .into_iter()
        .filter_map(|((a, b), entry)| Some((*row_pos.get(a.as_str())?, *col_pos.get(b.as_str())?, entry)))
        .collect();

    let (n_rows, n_cols) = (rows.len(), columns.len());
    let mut builder = TableBuilder::new(rows, columns);
    let source = builder.add_source(source);
    for r in 0..n_rows {
        for c in 0..n_cols {
            builder.set(r, c, Cell::Count(0));
        }
    }
    for (r, c, entry) in placed {
        builder.set(r, c, Cell::Count(entry.count));
        builder.link(r, c, refs(source, &entry.members));
    }
    builder.build()
}

/// Cross-tabulates two keys of the same units.
///
/// Rows are values of `key_a`, columns values of `key_b`, each ordered by
/// descending total with ties in order of first occurrence. Cells count the
/// units having both values. Only `config.parallel_threshold` is used.
pub fn cross_tab<A, B>(
    units: &Segmentation,
    store: &StringStore,
    key_a: &A,
    key_b: &B,
    config: &TableConfig,
) -> Result<Table>
where
    A: GroupingKey + ?Sized,
    B: GroupingKey + ?Sized,
{
    let min_len = config.parallel_threshold;
    let views = views(units, store)?;
    let keys_a = keys_of(&views, key_a, min_len);
    let keys_b = keys_of(&views, key_b, min_len);

    let items = keys_a
        .into_iter()
        .zip(keys_b)
        .enumerate()
        .map(|(i, pair)| (pair, i, vec![i]))
        .collect();
    let entries: Vec<_> = tally(items, min_len).into_ranked();

    let rows = rank_margin(&entries, |(a, _)| a);
    let columns = rank_margin(&entries, |(_, b)| b);
    debug!(
        "cross_tab: {} units -> {}x{} table",
        units.len(),
        rows.len(),
        columns.len()
    );
    Ok(pair_table(rows, columns, entries, units))
}

/// Counts unit types within each context.
///
/// Rows are context types in order of first occurrence, columns unit types
/// by descending total. A unit counts for a context when its span lies
/// within the context's span. Contexts holding no unit still get a row.
///
/// With `seq_length > 1` the columns are sequences of consecutive units
/// that all lie within one context, their keys joined with
/// `seq_delimiter`.
pub fn count_in_context(
    units: &Segmentation,
    contexts: &Segmentation,
    store: &StringStore,
    options: &ContextCountOptions,
) -> Result<Table> {
    if options.seq_length == 0 {
        return Err(Error::InvalidArgument("seq_length must be positive".to_string()));
    }
    let min_len = options.parallel_threshold;
    let seq_length = options.seq_length;
    let unit_views = views(units, store)?;
    let context_views = views(contexts, store)?;

    let unit_keys = keys_of(
        &unit_views,
        &WithMissing {
            source: &options.unit_key,
            missing: &options.missing_key,
        },
        min_len,
    );
    let context_keys = if options.merge_contexts {
        vec![GLOBAL_ROW.to_string(); contexts.len()]
    } else {
        keys_of(
            &context_views,
            &WithMissing {
                source: &options.context_key,
                missing: &options.missing_key,
            },
            min_len,
        )
    };

    let index = ContainmentIndex::new(units);
    let entries = (0..contexts.len())
        .into_par_iter()
        .with_min_len(min_len.max(1))
        .fold(Tally::new, |mut t, c| {
            let context = context_views[c].segment();
            if seq_length == 1 {
                for u in index.contained_in(context) {
                    t = t.add((context_keys[c].clone(), unit_keys[u].clone()), u, vec![u]);
                }
            } else {
                for start in index.contained_sequences(context, seq_length) {
                    let (key, first, members) =
                        sequence(&unit_keys, start, seq_length, &options.seq_delimiter);
                    t = t.add((context_keys[c].clone(), key), first, members);
                }
            }
            t
        })
        .reduce(Tally::new, Tally::merge)
        .into_ranked();

    let mut rows: Vec<String> = Vec::new();
    for key in &context_keys {
        if !rows.contains(key) {
            rows.push(key.clone());
        }
    }
    let columns = rank_margin(&entries, |(_, unit)| unit);

    debug!(
        "count_in_context: {} units in {} contexts -> {}x{} table",
        units.len(),
        contexts.len(),
        rows.len(),
        columns.len()
    );
    Ok(pair_table(rows, columns, entries, units))
}

/// Counts unit types in every window of `window_size` consecutive units.
///
/// Rows are windows `"1"` to `"n - window_size + 1"`, columns unit types
/// ordered as [`count`] orders its rows. A sequence counts for a window when
/// all its units lie in the window. Fewer units than `window_size` give an
/// empty table.
pub fn count_in_window(units: &Segmentation, store: &StringStore, options: &WindowCountOptions) -> Result<Table> {
    let seq_length = options.seq_length;
    if seq_length == 0 {
        return Err(Error::InvalidArgument("seq_length must be positive".to_string()));
    }
    if options.window_size < seq_length {
        return Err(Error::InvalidArgument(format!(
            "window_size {} is smaller than seq_length {}",
            options.window_size, seq_length
        )));
    }

    let min_len = options.parallel_threshold;
    let views = views(units, store)?;
    if units.len() < options.window_size {
        return Ok(TableBuilder::new(Vec::new(), Vec::new()).build());
    }
    let keys = keys_of(
        &views,
        &WithMissing {
            source: &options.key,
            missing: &options.missing_key,
        },
        min_len,
    );
    let items: Vec<(String, usize, Vec<usize>)> = (0..keys.len() + 1 - seq_length)
        .map(|i| sequence(&keys, i, seq_length, &options.seq_delimiter))
        .collect();

    let overall = items
        .iter()
        .fold(Tally::new(), |t, (key, first, _)| t.add(key.as_str(), *first, Vec::new()))
        .into_ranked();
    let columns: Vec<String> = overall.iter().map(|(k, _)| k.to_string()).collect();
    let col_pos: HashMap<&str, usize> = columns.iter().enumerate().map(|(i, k)| (k.as_str(), i)).collect();

    // Window w holds the sequences starting in w..=w + window_size - seq_length.
    let per_window = options.window_size + 1 - seq_length;
    let n_windows = units.len() + 1 - options.window_size;
    let windows: Vec<Vec<(usize, Entry)>> = (0..n_windows)
        .into_par_iter()
        .with_min_len(min_len.max(1))
        .map(|w| {
            items[w..w + per_window]
                .iter()
                .fold(Tally::new(), |t, (key, first, members)| t.add(key.as_str(), *first, members.clone()))
                .into_ranked()
                .into_iter()
                .filter_map(|(key, entry)| Some((*col_pos.get(key)?, entry)))
                .collect()
        })
        .collect();

    let mut builder = TableBuilder::new(numbered_rows(n_windows), columns.clone());
    let source = builder.add_source(units);
    for (row, entries) in windows.into_iter().enumerate() {
        for col in 0..columns.len() {
            builder.set(row, col, Cell::Count(0));
        }
        for (col, entry) in entries {
            builder.set(row, col, Cell::Count(entry.count));
            builder.link(row, col, refs(source, &entry.members));
        }
    }

    debug!(
        "count_in_window: {} units in {} windows of {} -> {} types",
        units.len(),
        n_windows,
        options.window_size,
        columns.len()
    );
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{split, Delimiter, Splitter};
    use crate::segment::{Annotations, Segment};
    use proptest::prelude::*;

    fn words(text: &str) -> (StringStore, Segmentation) {
        let mut store = StringStore::new();
        let id = store.register(text);
        let seg = Segmentation::from_string(&store, id).unwrap();
        let words = split(&seg, &store, &Splitter::new(Delimiter::whitespace())).unwrap();
        (store, words)
    }

    #[test]
    fn test_count_orders_by_frequency_then_first_occurrence() {
        let (store, units) = words("the cat sat on the mat");
        let table = count(&units, &store, &CountOptions::default()).unwrap();
        assert_eq!(table.row_headers(), &["the", "cat", "sat", "on", "mat"]);
        assert_eq!(table.column_headers(), &[COUNT_COLUMN]);
        assert_eq!(table.get("the", COUNT_COLUMN), Some(&Cell::Count(2)));
        assert_eq!(table.get("mat", COUNT_COLUMN), Some(&Cell::Count(1)));
    }

    #[test]
    fn test_count_provenance() {
        let (store, units) = words("a b a");
        let table = count(&units, &store, &CountOptions::default()).unwrap();
        let origin = table.provenance(0, 0).unwrap();
        assert_eq!(origin.len(), 2);
        assert_eq!(origin[0].content(&store).unwrap(), "a");
        assert_eq!(origin[1].range(), 4..5);
    }

    #[test]
    fn test_count_sequences() {
        let (store, units) = words("a b a b");
        let options = CountOptions {
            seq_length: 2,
            ..CountOptions::default()
        };
        let table = count(&units, &store, &options).unwrap();
        assert_eq!(table.row_headers(), &["a#b", "b#a"]);
        assert_eq!(table.get("a#b", COUNT_COLUMN), Some(&Cell::Count(2)));

        let options = CountOptions {
            seq_length: 0,
            ..CountOptions::default()
        };
        assert!(matches!(count(&units, &store, &options), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_count_missing_annotation() {
        let mut store = StringStore::new();
        let id = store.register("ab");
        let a = Segment::new(&store, id, 0, 1, Annotations::new().with("pos", "N")).unwrap();
        let b = Segment::new(&store, id, 1, 2, Annotations::new()).unwrap();
        let units = Segmentation::new(&store, vec![a, b]).unwrap();

        let options = CountOptions {
            key: KeySource::annotation("pos"),
            ..CountOptions::default()
        };
        let table = count(&units, &store, &options).unwrap();
        assert_eq!(table.row_headers(), &["N", "__none__"]);
    }

    #[test]
    fn test_count_by_closure() {
        let (store, units) = words("Cat cat CAT dog");
        let lower = |_: &Segment, c: &str| c.to_lowercase();
        let table = count_by(&units, &store, &lower, &TableConfig::default()).unwrap();
        assert_eq!(table.get("cat", COUNT_COLUMN), Some(&Cell::Count(3)));
        assert_eq!(table.row_headers(), &["cat", "dog"]);
    }

    #[test]
    fn test_cross_tab() {
        let (store, units) = words("aa b aa cc b aa");
        let first_char = |_: &Segment, c: &str| c[..1].to_string();
        let length = |_: &Segment, c: &str| c.len().to_string();
        let table = cross_tab(&units, &store, &first_char, &length, &TableConfig::default()).unwrap();
        assert_eq!(table.row_headers(), &["a", "b", "c"]);
        assert_eq!(table.column_headers(), &["2", "1"]);
        assert_eq!(table.get("a", "2"), Some(&Cell::Count(3)));
        assert_eq!(table.get("a", "1"), Some(&Cell::Count(0)));
        assert_eq!(table.get("b", "1"), Some(&Cell::Count(2)));
    }

    #[test]
    fn test_count_in_context() {
        let mut store = StringStore::new();
        let id = store.register("a b. b b. c");
        let doc = Segmentation::from_string(&store, id).unwrap();
        let sentences = split(&doc, &store, &Splitter::new(Delimiter::pattern(r"\.\s*").unwrap())).unwrap();
        let units = split(&doc, &store, &Splitter::new(Delimiter::pattern(r"[\s.]+").unwrap())).unwrap();

        let options = ContextCountOptions {
            context_key: KeySource::Position,
            ..ContextCountOptions::default()
        };
        let table = count_in_context(&units, &sentences, &store, &options).unwrap();
        assert_eq!(table.row_headers(), &["1", "2", "3"]);
        assert_eq!(table.column_headers(), &["b", "a", "c"]);
        assert_eq!(table.get("2", "b"), Some(&Cell::Count(2)));
        assert_eq!(table.get("1", "c"), Some(&Cell::Count(0)));

        let merged = ContextCountOptions {
            merge_contexts: true,
            ..options
        };
        let table = count_in_context(&units, &sentences, &store, &merged).unwrap();
        assert_eq!(table.row_headers(), &[GLOBAL_ROW]);
        assert_eq!(table.get(GLOBAL_ROW, "b"), Some(&Cell::Count(3)));
    }

    #[test]
    fn test_count_in_context_sequences() {
        let mut store = StringStore::new();
        let id = store.register("a b a. b a");
        let doc = Segmentation::from_string(&store, id).unwrap();
        let sentences = split(&doc, &store, &Splitter::new(Delimiter::pattern(r"\.\s*").unwrap())).unwrap();
        let units = split(&doc, &store, &Splitter::new(Delimiter::pattern(r"[\s.]+").unwrap())).unwrap();

        let options = ContextCountOptions {
            context_key: KeySource::Position,
            seq_length: 2,
            ..ContextCountOptions::default()
        };
        let table = count_in_context(&units, &sentences, &store, &options).unwrap();
        assert_eq!(table.row_headers(), &["1", "2"]);
        assert_eq!(table.column_headers(), &["b#a", "a#b"]);
        assert_eq!(table.get("1", "a#b"), Some(&Cell::Count(1)));
        assert_eq!(table.get("1", "b#a"), Some(&Cell::Count(1)));
        assert_eq!(table.get("2", "b#a"), Some(&Cell::Count(1)));
        assert_eq!(table.get("2", "a#b"), Some(&Cell::Count(0)));

        let origin = table.provenance(1, 0).unwrap();
        let contents: Vec<&str> = origin.iter().map(|s| s.content(&store).unwrap()).collect();
        assert_eq!(contents, vec!["b", "a"]);

        let options = ContextCountOptions {
            seq_length: 0,
            ..options
        };
        assert!(matches!(
            count_in_context(&units, &sentences, &store, &options),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parallel_counting_matches_sequential() {
        let text: Vec<String> = (0..600).map(|i| format!("w{}", (i * 7) % 23)).collect();
        let mut store = StringStore::new();
        let id = store.register(text.join(" "));
        let doc = Segmentation::from_string(&store, id).unwrap();
        let units = split(&doc, &store, &Splitter::new(Delimiter::whitespace())).unwrap();
        let contexts = split(&doc, &store, &Splitter::new(Delimiter::Window(60))).unwrap();

        let config = |parallel_threshold| TableConfig {
            parallel_threshold,
            ..TableConfig::default()
        };
        let (parallel, sequential) = (config(1), config(usize::MAX));

        for seq_length in [1, 2] {
            let counted = |config: &TableConfig| {
                let options = CountOptions {
                    seq_length,
                    ..CountOptions::from_config(KeySource::Content, config)
                };
                count(&units, &store, &options).unwrap()
            };
            assert_eq!(counted(&parallel), counted(&sequential));
        }

        let first_char = |_: &Segment, c: &str| c[..2].to_string();
        let length = |_: &Segment, c: &str| c.len().to_string();
        assert_eq!(
            cross_tab(&units, &store, &first_char, &length, &parallel).unwrap(),
            cross_tab(&units, &store, &first_char, &length, &sequential).unwrap()
        );
        assert_eq!(
            count_by(&units, &store, &length, &parallel).unwrap(),
            count_by(&units, &store, &length, &sequential).unwrap()
        );

        let in_context = |config: &TableConfig| {
            let options = ContextCountOptions::from_config(KeySource::Content, KeySource::Position, config);
            count_in_context(&units, &contexts, &store, &options).unwrap()
        };
        let table = in_context(&parallel);
        assert_eq!(table, in_context(&sequential));
        assert_eq!(table.row_headers().len(), contexts.len());
        let col = table.column_index("w0").unwrap();
        let origin = table.provenance(0, col).unwrap();
        assert_eq!(origin.len(), 1);
        assert_eq!(origin[0].range(), 0..2);
    }

    #[test]
    fn test_count_in_window() {
        let (store, units) = words("a b a c");
        let options = WindowCountOptions::from_config(2, KeySource::Content, &TableConfig::default());
        let table = count_in_window(&units, &store, &options).unwrap();
        assert_eq!(table.row_headers(), &["1", "2", "3"]);
        assert_eq!(table.column_headers(), &["a", "b", "c"]);
        assert_eq!(table.get("1", "a"), Some(&Cell::Count(1)));
        assert_eq!(table.get("1", "c"), Some(&Cell::Count(0)));
        assert_eq!(table.get("3", "c"), Some(&Cell::Count(1)));
        assert_eq!(table.provenance(2, 0).unwrap()[0].range(), 4..5);

        let options = WindowCountOptions {
            window_size: 3,
            seq_length: 2,
            ..options
        };
        let table = count_in_window(&units, &store, &options).unwrap();
        assert_eq!(table.row_headers(), &["1", "2"]);
        assert_eq!(table.column_headers(), &["a#b", "b#a", "a#c"]);
        assert_eq!(table.get("1", "b#a"), Some(&Cell::Count(1)));
        assert_eq!(table.get("2", "a#b"), Some(&Cell::Count(0)));
        assert_eq!(table.get("2", "a#c"), Some(&Cell::Count(1)));
    }

    #[test]
    fn test_count_in_window_edges() {
        let (store, units) = words("a b");
        let options = WindowCountOptions::from_config(3, KeySource::Content, &TableConfig::default());
        assert_eq!(count_in_window(&units, &store, &options).unwrap().dimensions(), (0, 0));

        let options = WindowCountOptions {
            window_size: 1,
            seq_length: 2,
            ..options
        };
        assert!(matches!(
            count_in_window(&units, &store, &options),
            Err(Error::InvalidArgument(_))
        ));
    }

    proptest! {
        #[test]
        fn test_count_invariant_under_permutation(
            items in prop::collection::vec("[a-d]{1,2}", 1..30),
            seed in any::<u64>(),
        ) {
            use rand::seq::SliceRandom;
            use rand::SeedableRng;

            let mut shuffled = items.clone();
            shuffled.shuffle(&mut rand_chacha::ChaCha8Rng::seed_from_u64(seed));

            let totals = |list: &[String]| {
                let (store, units) = words(&list.join(" "));
                let table = count(&units, &store, &CountOptions::default()).unwrap();
                let mut pairs: Vec<(String, Cell)> = table
                    .row_headers()
                    .iter()
                    .enumerate()
                    .map(|(r, h)| (h.clone(), table.cell(r, 0).unwrap().clone()))
                    .collect();
                pairs.sort_by(|a, b| a.0.cmp(&b.0));
                pairs
            };
            prop_assert_eq!(totals(&items), totals(&shuffled));
        }
    }
}
