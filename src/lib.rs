//! # Segtable - Annotated Text Segmentations
//!
//! Segtable represents text as *segmentations*: ordered collections of
//! annotated spans over registered source strings. Segmentations are built
//! by splitting, tokenizing, filtering, recoding and concatenating other
//! segmentations, and summarized into tables of frequencies, concordances
//! and complexity measures that remember which spans each cell came from.
//!
//! ## Overview
//!
//! Source text lives in a [`StringStore`]. A [`Segment`] is a span of one
//! registered string plus its annotations, and a [`Segmentation`] is an
//! immutable sequence of segments. Every operation borrows its inputs and
//! returns a new segmentation or [`Table`]; nothing is modified in place.
//!
//! ## Quick Start
//!
//! ```rust
//! use segtable::ops::{split, Delimiter, Splitter};
//! use segtable::table::{count, CountOptions};
//! use segtable::{Cell, Segmentation, StringStore};
//!
//! let mut store = StringStore::new();
//! let id = store.register("the cat sat on the mat");
//! let text = Segmentation::from_string(&store, id)?;
//!
//! let words = split(&text, &store, &Splitter::new(Delimiter::whitespace()))?;
//! assert_eq!(words.len(), 6);
//!
//! let freq = count(&words, &store, &CountOptions::default())?;
//! assert_eq!(freq.row_headers()[0], "the");
//! assert_eq!(freq.get("the", "__count__"), Some(&Cell::Count(2)));
//! # Ok::<(), segtable::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`store`] - String registry and identities
//! - [`segment`] - Segments and annotations
//! - [`segmentation`] - Segmentations and the containment index
//! - [`ops`] - Operations deriving segmentations
//! - [`table`] - Tables, frequency counts, co-occurrences, concordances,
//!   length and complexity measures
//! - [`storage`] - Binary snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod ops;
pub mod segment;
pub mod segmentation;
pub mod storage;
pub mod store;
pub mod table;

// Re-export commonly used types
pub use config::{Config, SplitConfig, TableConfig, ZeroLengthPolicy};
pub use error::{Error, Result};
pub use ops::{SegmentView, Selection};
pub use segment::{AnnotationValue, Annotations, Segment};
pub use segmentation::{ContainmentIndex, Segmentation};
pub use storage::Snapshot;
pub use store::{StoreId, StringId, StringStore};
pub use table::{AssociationBias, Cell, KeySource, Norm, Normalization, SegmentRef, Table};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
