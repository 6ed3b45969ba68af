//! Co-occurrence tables.
//!
//! Two unit types co-occur in a context, or in a window, when both are
//! present in it. Cells count the contexts shared by the row type and the
//! column type; the diagonal counts the contexts a type occurs in. Cells
//! carry no provenance.

use crate::error::Result;
use crate::segmentation::Segmentation;
use crate::store::StringStore;
use crate::table::frequency::{count_in_context, count_in_window, ContextCountOptions, WindowCountOptions};
use crate::table::{Cell, Table, TableBuilder};
use log::debug;
use std::collections::HashMap;

/// Presence (0 or 1) of every column type in every row.
fn presence_matrix(table: &Table) -> Vec<Vec<u64>> {
    table
        .presence()
        .rows()
        .take(table.dimensions().0)
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Cell::Count(n) => *n,
                    _ => 0,
                })
                .collect()
        })
        .collect()
}

/// Multiplies the transposed presence matrix of `rows_from` with the one
/// of `columns_from`, over the row headers both tables share.
fn cooccurrence(rows_from: &Table, columns_from: &Table) -> Table {
    let left = presence_matrix(rows_from);
    let right = presence_matrix(columns_from);
    let shared: Vec<(usize, usize)> = {
        let positions: HashMap<&str, usize> = columns_from
            .row_headers()
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();
        rows_from
            .row_headers()
            .iter()
            .enumerate()
            .filter_map(|(i, h)| Some((i, *positions.get(h.as_str())?)))
            .collect()
    };

    let (n_rows, n_cols) = (rows_from.dimensions().1, columns_from.dimensions().1);
    let mut builder = TableBuilder::new(
        rows_from.column_headers().to_vec(),
        columns_from.column_headers().to_vec(),
    );
    for r in 0..n_rows {
        for c in 0..n_cols {
            let n: u64 = shared.iter().map(|&(a, b)| left[a][r] * right[b][c]).sum();
            builder.set(r, c, Cell::Count(n));
        }
    }
    builder.build()
}

/// Counts, for every pair of unit types, the context types in which both
/// occur.
///
/// Rows and columns are the unit types of [`count_in_context`] with the
/// same options, in the same order.
pub fn cooc_in_context(
    units: &Segmentation,
    contexts: &Segmentation,
    store: &StringStore,
    options: &ContextCountOptions,
) -> Result<Table> {
    let contingency = count_in_context(units, contexts, store, options)?;
    let table = cooccurrence(&contingency, &contingency);
    debug!("cooc_in_context: {} unit types", table.dimensions().0);
    Ok(table)
}

/// Counts, for every type of `units` and every type of `other`, the
/// context types in which both occur.
///
/// Rows are the types of `other`, columns the types of `units`. Only
/// context types holding segments of both segmentations contribute.
pub fn cooc_in_context_between(
    units: &Segmentation,
    other: &Segmentation,
    contexts: &Segmentation,
    store: &StringStore,
    options: &ContextCountOptions,
) -> Result<Table> {
    let contingency = count_in_context(units, contexts, store, options)?;
    let other_contingency = count_in_context(other, contexts, store, options)?;
    let table = cooccurrence(&other_contingency, &contingency);
    debug!(
        "cooc_in_context_between: {}x{} unit types",
        table.dimensions().0,
        table.dimensions().1
    );
    Ok(table)
}

/// Counts, for every pair of unit types, the windows in which both occur.
pub fn cooc_in_window(units: &Segmentation, store: &StringStore, options: &WindowCountOptions) -> Result<Table> {
    let contingency = count_in_window(units, store, options)?;
    let table = cooccurrence(&contingency, &contingency);
    debug!("cooc_in_window: {} unit types", table.dimensions().0);
    Ok(table)
}
