//! Tables derived from segmentations.
//!
//! A [`Table`] is an immutable grid with row and column headers, typed cells
//! and, for cells derived from segments, the list of segments each cell was
//! computed from. The table keeps the input segmentations those references
//! point into, so provenance can be resolved without the caller holding on
//! to them.

pub mod complexity;
pub mod concordance;
pub mod cooccurrence;
pub mod frequency;
mod key;
pub mod length;

pub use complexity::{complexity, complexity_in_window, ComplexityOptions, WindowComplexityOptions};
pub use concordance::{
    concordance, concordance_in_context, ConcordanceOptions, ContextWindow, InContextOptions,
};
pub use cooccurrence::{cooc_in_context, cooc_in_context_between, cooc_in_window};
pub use frequency::{
    count, count_by, count_in_context, count_in_window, cross_tab, ContextCountOptions, CountOptions,
    WindowCountOptions,
};
pub use length::{length_in_context, length_in_window, LengthOptions, LengthWindowOptions};
pub use key::{GroupingKey, KeySource, MISSING_KEY};

use crate::error::{Error, Result};
use crate::segment::Segment;
use crate::segmentation::Segmentation;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Row header used when all contexts are collapsed into one group.
pub const GLOBAL_ROW: &str = "__global__";

/// A table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value.
    Empty,
    /// An exact count.
    Count(u64),
    /// A real number.
    Number(f64),
    /// Text.
    Text(String),
    /// Result of a division by zero.
    Undefined,
}

impl Cell {
    /// Returns the numeric value of the cell.
    ///
    /// `Undefined` is NaN. `Empty` and `Text` have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Count(n) => Some(*n as f64),
            Cell::Number(x) => Some(*x),
            Cell::Undefined => Some(f64::NAN),
            Cell::Empty | Cell::Text(_) => None,
        }
    }

    /// Returns the text of a `Text` cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for the division sentinel.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Cell::Undefined)
    }

    /// Total order used for sorting: numbers first, ascending, then text,
    /// then empty cells.
    fn compare(&self, other: &Cell) -> Ordering {
        fn rank(cell: &Cell) -> u8 {
            match cell {
                Cell::Count(_) | Cell::Number(_) | Cell::Undefined => 0,
                Cell::Text(_) => 1,
                Cell::Empty => 2,
            }
        }

        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => rank(self).cmp(&rank(other)),
            },
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Count(n) => write!(f, "{}", n),
            Cell::Number(x) => write!(f, "{}", x),
            Cell::Text(s) => f.write_str(s),
            Cell::Undefined => f.write_str("NaN"),
        }
    }
}

/// Reference to one segment of one of a table's source segmentations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentRef {
    /// Index into [`Table::sources`].
    pub source: usize,
    /// Index of the segment within that source.
    pub index: usize,
}

/// Which totals a table is normalized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Each row separately.
    Rows,
    /// Each column separately.
    Columns,
    /// The whole table.
    Table,
}

/// Norm used by [`Table::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Norm {
    /// Sum of absolute values.
    L1,
    /// Euclidean length.
    L2,
}

/// Weighting of [`Table::association_matrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssociationBias {
    /// Raw exchange matrix, dominated by frequent columns.
    Frequent,
    /// Exchange divided by the geometric mean of both column weights.
    #[default]
    Neutral,
    /// Exchange divided by the product of both column weights, favouring
    /// rare columns.
    Rare,
}

/// Two-dimensional summary of segmentations.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    row_headers: Vec<String>,
    column_headers: Vec<String>,
    cells: Vec<Cell>,
    provenance: HashMap<(usize, usize), Vec<SegmentRef>>,
    sources: Vec<Segmentation>,
}

impl Table {
    /// Returns the row headers.
    pub fn row_headers(&self) -> &[String] {
        &self.row_headers
    }

    /// Returns the column headers.
    pub fn column_headers(&self) -> &[String] {
        &self.column_headers
    }

    /// Returns `(rows, columns)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.row_headers.len(), self.column_headers.len())
    }

    /// Returns the cell at `(row, col)`.
    ///
    /// Fails with [`Error::Range`] if either index is out of bounds; the
    /// error reports the flat cell index against the cell count.
    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell> {
        let (rows, cols) = self.dimensions();
        if row >= rows || col >= cols {
            let flat = row.saturating_mul(cols).saturating_add(col);
            return Err(Error::Range {
                start: flat,
                end: flat.saturating_add(1),
                len: self.cells.len(),
            });
        }
        Ok(&self.cells[row * cols + col])
    }

    /// Looks a cell up by headers.
    pub fn get(&self, row_header: &str, column_header: &str) -> Option<&Cell> {
        let row = self.row_index(row_header)?;
        let col = self.column_index(column_header)?;
        self.cells.get(row * self.column_headers.len() + col)
    }

    /// Returns the position of a row header.
    pub fn row_index(&self, header: &str) -> Option<usize> {
        self.row_headers.iter().position(|h| h == header)
    }

    /// Returns the position of a column header.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.column_headers.iter().position(|h| h == header)
    }

    /// Iterates over rows as cell slices.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.column_headers.len().max(1))
    }

    /// Returns the segmentations provenance refers to.
    pub fn sources(&self) -> &[Segmentation] {
        &self.sources
    }

    /// Returns the raw provenance of a cell.
    pub fn provenance_refs(&self, row: usize, col: usize) -> Option<&[SegmentRef]> {
        self.provenance.get(&(row, col)).map(Vec::as_slice)
    }

    /// Returns the segments a cell was computed from.
    pub fn provenance(&self, row: usize, col: usize) -> Option<Vec<&Segment>> {
        let refs = self.provenance.get(&(row, col))?;
        Some(
            refs.iter()
                .filter_map(|r| self.sources.get(r.source)?.get(r.index))
                .collect(),
        )
    }

    /// Returns a copy with rows stably sorted on one column.
    pub fn sorted_by_column(&self, col: usize, descending: bool) -> Result<Table> {
        let cols = self.column_headers.len();
        if col >= cols {
            return Err(Error::Range {
                start: col,
                end: col + 1,
                len: cols,
            });
        }

        let mut order: Vec<usize> = (0..self.row_headers.len()).collect();
        order.sort_by(|&a, &b| {
            let ordering = self.cells[a * cols + col].compare(&self.cells[b * cols + col]);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let mut builder = TableBuilder::new(
            order.iter().map(|&r| self.row_headers[r].clone()).collect(),
            self.column_headers.clone(),
        );
        builder.sources = self.sources.clone();
        for (new_row, &old_row) in order.iter().enumerate() {
            for c in 0..cols {
                builder.set(new_row, c, self.cells[old_row * cols + c].clone());
                if let Some(refs) = self.provenance.get(&(old_row, c)) {
                    builder.link(new_row, c, refs.clone());
                }
            }
        }
        Ok(builder.build())
    }

    /// Returns a copy with rows and columns swapped.
    pub fn transposed(&self) -> Table {
        let (rows, cols) = self.dimensions();
        let mut builder = TableBuilder::new(self.column_headers.clone(), self.row_headers.clone());
        builder.sources = self.sources.clone();
        for r in 0..rows {
            for c in 0..cols {
                builder.set(c, r, self.cells[r * cols + c].clone());
            }
        }
        for (&(r, c), refs) in &self.provenance {
            builder.link(c, r, refs.clone());
        }
        builder.build()
    }

    /// Divides every numeric cell by the norm of its row, its column, or the
    /// whole table.
    ///
    /// Empty cells count as zero. Text and undefined cells are left as they
    /// are and do not contribute to norms. A zero norm makes the cells it
    /// governs `Undefined`.
    pub fn normalized(&self, normalization: Normalization, norm: Norm) -> Table {
        let (rows, cols) = self.dimensions();
        let value = |r: usize, c: usize| match &self.cells[r * cols + c] {
            Cell::Empty => Some(0.0),
            Cell::Undefined => None,
            cell => cell.as_f64(),
        };
        let contribution = |x: f64| match norm {
            Norm::L1 => x.abs(),
            Norm::L2 => x * x,
        };
        let finish = |sum: f64| match norm {
            Norm::L1 => sum,
            Norm::L2 => sum.sqrt(),
        };

        let mut row_norms = vec![0.0; rows];
        let mut col_norms = vec![0.0; cols];
        let mut total = 0.0;
        for r in 0..rows {
            for c in 0..cols {
                if let Some(x) = value(r, c) {
                    row_norms[r] += contribution(x);
                    col_norms[c] += contribution(x);
                    total += contribution(x);
                }
            }
        }

        let mut builder = TableBuilder::new(self.row_headers.clone(), self.column_headers.clone());
        builder.sources = self.sources.clone();
        builder.provenance = self.provenance.clone();
        for r in 0..rows {
            for c in 0..cols {
                let cell = match value(r, c) {
                    None => self.cells[r * cols + c].clone(),
                    Some(x) => {
                        let divisor = finish(match normalization {
                            Normalization::Rows => row_norms[r],
                            Normalization::Columns => col_norms[c],
                            Normalization::Table => total,
                        });
                        if divisor == 0.0 {
                            Cell::Undefined
                        } else {
                            Cell::Number(x / divisor)
                        }
                    }
                };
                builder.set(r, c, cell);
            }
        }
        builder.build()
    }

    /// Replaces every nonzero numeric cell with 1 and every zero or empty
    /// cell with 0.
    pub fn presence(&self) -> Table {
        let mut builder = TableBuilder::new(self.row_headers.clone(), self.column_headers.clone());
        builder.sources = self.sources.clone();
        builder.provenance = self.provenance.clone();
        for (i, cell) in self.cells.iter().enumerate() {
            let present = match cell {
                Cell::Empty => Cell::Count(0),
                Cell::Count(_) | Cell::Number(_) => Cell::Count(u64::from(cell.as_f64() != Some(0.0))),
                other => other.clone(),
            };
            builder.cells[i] = present;
        }
        builder.build()
    }

    /// Computes Markov associativities between columns.
    ///
    /// With `f` the table of counts, `N` its total, `r_i` the row totals
    /// and `p_j` the column totals divided by `N`, the exchange between
    /// columns `j` and `k` is `sum_i f_ij * f_ik / r_i / N`. The result is
    /// square over the column headers. Rows summing to zero do not
    /// contribute, and cells whose weights are zero are `Undefined`.
    pub fn association_matrix(&self, bias: AssociationBias) -> Table {
        let (rows, cols) = self.dimensions();
        let value = |r: usize, c: usize| match &self.cells[r * cols + c] {
            Cell::Count(_) | Cell::Number(_) => self.cells[r * cols + c].as_f64().unwrap_or(0.0),
            _ => 0.0,
        };
        let row_sums: Vec<f64> = (0..rows).map(|r| (0..cols).map(|c| value(r, c)).sum()).collect();
        let col_sums: Vec<f64> = (0..cols).map(|c| (0..rows).map(|r| value(r, c)).sum()).collect();
        let total: f64 = row_sums.iter().sum();

        let mut builder = TableBuilder::new(self.column_headers.clone(), self.column_headers.clone());
        for j in 0..cols {
            for k in 0..cols {
                let weight = |c: usize| col_sums[c] / total;
                let cell = if total == 0.0 {
                    Cell::Undefined
                } else {
                    let exchange: f64 = (0..rows)
                        .filter(|&r| row_sums[r] != 0.0)
                        .map(|r| value(r, j) * value(r, k) / row_sums[r])
                        .sum::<f64>()
                        / total;
                    let divisor = match bias {
                        AssociationBias::Frequent => 1.0,
                        AssociationBias::Neutral => (weight(j) * weight(k)).sqrt(),
                        AssociationBias::Rare => weight(j) * weight(k),
                    };
                    if divisor == 0.0 {
                        Cell::Undefined
                    } else {
                        Cell::Number(exchange / divisor)
                    }
                };
                builder.set(j, k, cell);
            }
        }
        builder.build()
    }

    /// Counts, for every column, the rows in which it has a nonzero value.
    ///
    /// The result has a single row, `"__document_frequency__"`.
    pub fn document_frequency(&self) -> Table {
        let (rows, cols) = self.dimensions();
        let mut builder = TableBuilder::new(
            vec!["__document_frequency__".to_string()],
            self.column_headers.clone(),
        );
        for c in 0..cols {
            let n = (0..rows)
                .filter(|&r| matches!(self.cells[r * cols + c].as_f64(), Some(x) if x != 0.0 && !x.is_nan()))
                .count();
            builder.set(0, c, Cell::Count(n as u64));
        }
        builder.build()
    }
}

/// Incremental construction of a [`Table`].
#[derive(Debug)]
pub(crate) struct TableBuilder {
    row_headers: Vec<String>,
    column_headers: Vec<String>,
    cells: Vec<Cell>,
    provenance: HashMap<(usize, usize), Vec<SegmentRef>>,
    sources: Vec<Segmentation>,
}

impl TableBuilder {
    /// Starts a table with every cell empty.
    pub(crate) fn new(row_headers: Vec<String>, column_headers: Vec<String>) -> Self {
        let cells = vec![Cell::Empty; row_headers.len() * column_headers.len()];
        Self {
            row_headers,
            column_headers,
            cells,
            provenance: HashMap::new(),
            sources: Vec::new(),
        }
    }

    /// Registers a source segmentation and returns its index.
    pub(crate) fn add_source(&mut self, segmentation: &Segmentation) -> usize {
        self.sources.push(segmentation.clone());
        self.sources.len() - 1
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, cell: Cell) {
        let cols = self.column_headers.len();
        self.cells[row * cols + col] = cell;
    }

    /// Records the segments a cell derives from. Empty lists are ignored.
    pub(crate) fn link(&mut self, row: usize, col: usize, refs: Vec<SegmentRef>) {
        if !refs.is_empty() {
            self.provenance.entry((row, col)).or_default().extend(refs);
        }
    }

    pub(crate) fn build(self) -> Table {
        Table {
            row_headers: self.row_headers,
            column_headers: self.column_headers,
            cells: self.cells,
            provenance: self.provenance,
            sources: self.sources,
        }
    }
}

/// Builds `n` row headers `"1"` to `"n"`.
pub(crate) fn numbered_rows(n: usize) -> Vec<String> {
    (1..=n).map(|i| i.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: &[&[u64]]) -> Table {
        let rows = (0..values.len()).map(|r| format!("r{}", r)).collect();
        let cols = (0..values[0].len()).map(|c| format!("c{}", c)).collect();
        let mut builder = TableBuilder::new(rows, cols);
        for (r, row) in values.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                builder.set(r, c, Cell::Count(v));
            }
        }
        builder.build()
    }

    #[test]
    fn test_cell_access() {
        let table = grid(&[&[1, 2], &[3, 4]]);
        assert_eq!(table.dimensions(), (2, 2));
        assert_eq!(table.cell(1, 0).unwrap(), &Cell::Count(3));
        assert_eq!(table.get("r0", "c1"), Some(&Cell::Count(2)));
        assert!(table.get("r9", "c1").is_none());
        assert!(matches!(table.cell(2, 0), Err(Error::Range { .. })));
        assert!(matches!(table.cell(0, 2), Err(Error::Range { .. })));
    }

    #[test]
    fn test_sorted_by_column_is_stable() {
        let table = grid(&[&[1, 0], &[3, 1], &[1, 2]]);
        let sorted = table.sorted_by_column(0, true).unwrap();
        assert_eq!(sorted.row_headers(), &["r1", "r0", "r2"]);

        let ascending = table.sorted_by_column(1, false).unwrap();
        assert_eq!(ascending.row_headers(), &["r0", "r1", "r2"]);
        assert!(table.sorted_by_column(5, false).is_err());
    }

    #[test]
    fn test_transposed() {
        let table = grid(&[&[1, 2, 3]]);
        let t = table.transposed();
        assert_eq!(t.dimensions(), (3, 1));
        assert_eq!(t.get("c2", "r0"), Some(&Cell::Count(3)));
    }

    #[test]
    fn test_normalized_rows_with_zero_sum() {
        let table = grid(&[&[1, 3], &[0, 0]]);
        let norm = table.normalized(Normalization::Rows, Norm::L1);
        assert_eq!(norm.cell(0, 0).unwrap(), &Cell::Number(0.25));
        assert_eq!(norm.cell(0, 1).unwrap(), &Cell::Number(0.75));
        assert!(norm.cell(1, 0).unwrap().is_undefined());
        assert!(norm.cell(1, 1).unwrap().as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_normalized_l2_and_table() {
        let table = grid(&[&[3, 4]]);
        let l2 = table.normalized(Normalization::Rows, Norm::L2);
        assert_eq!(l2.cell(0, 0).unwrap(), &Cell::Number(0.6));

        let whole = grid(&[&[1, 1], &[1, 1]]).normalized(Normalization::Table, Norm::L1);
        assert_eq!(whole.cell(1, 1).unwrap(), &Cell::Number(0.25));
    }

    #[test]
    fn test_presence_and_document_frequency() {
        let table = grid(&[&[2, 0], &[5, 1]]);
        let presence = table.presence();
        assert_eq!(presence.cell(0, 0).unwrap(), &Cell::Count(1));
        assert_eq!(presence.cell(0, 1).unwrap(), &Cell::Count(0));

        let df = table.document_frequency();
        assert_eq!(df.row_headers(), &["__document_frequency__"]);
        assert_eq!(df.get("__document_frequency__", "c0"), Some(&Cell::Count(2)));
        assert_eq!(df.get("__document_frequency__", "c1"), Some(&Cell::Count(1)));
    }

    #[test]
    fn test_association_matrix() {
        let table = grid(&[&[1, 1], &[0, 2]]);
        // N = 4, r = (2, 2), p = (1/4, 3/4).
        let frequent = table.association_matrix(AssociationBias::Frequent);
        assert_eq!(frequent.row_headers(), &["c0", "c1"]);
        assert_eq!(frequent.column_headers(), &["c0", "c1"]);
        let at = |t: &Table, r: usize, c: usize| t.cell(r, c).unwrap().as_f64().unwrap();
        assert!((at(&frequent, 0, 0) - 0.125).abs() < 1e-12);
        assert!((at(&frequent, 0, 1) - 0.125).abs() < 1e-12);
        assert!((at(&frequent, 1, 1) - 0.625).abs() < 1e-12);

        let neutral = table.association_matrix(AssociationBias::Neutral);
        assert!((at(&neutral, 0, 0) - 0.5).abs() < 1e-12);
        assert!((at(&neutral, 0, 1) - 0.125 / (3.0f64 / 16.0).sqrt()).abs() < 1e-12);

        let rare = table.association_matrix(AssociationBias::Rare);
        assert!((at(&rare, 0, 0) - 2.0).abs() < 1e-12);

        // Rows of a Markov associativity matrix weighted by p sum to one.
        let row_mass: f64 = (0..2).map(|k| at(&rare, 1, k) * [0.25, 0.75][k]).sum();
        assert!((row_mass - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_association_matrix_empty_column() {
        let table = grid(&[&[2, 0], &[1, 0]]);
        let neutral = table.association_matrix(AssociationBias::Neutral);
        assert!((neutral.cell(0, 0).unwrap().as_f64().unwrap() - 1.0).abs() < 1e-12);
        assert!(neutral.cell(0, 1).unwrap().is_undefined());
        assert!(neutral.cell(1, 1).unwrap().is_undefined());

        let zeros = grid(&[&[0, 0]]).association_matrix(AssociationBias::Frequent);
        assert!(zeros.cell(0, 0).unwrap().is_undefined());
    }

    #[test]
    fn test_undefined_display() {
        assert_eq!(Cell::Undefined.to_string(), "NaN");
        assert_eq!(Cell::Count(3).to_string(), "3");
        assert_eq!(Cell::Empty.to_string(), "");
    }
}
