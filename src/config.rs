//! Configuration for segmentation operations and table generation.

use serde::{Deserialize, Serialize};

/// Default number of segments from which work is spread over the thread pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Splitting configuration.
    pub split: SplitConfig,

    /// Table engine configuration.
    pub table: TableConfig,
}

/// What to do when a delimiter matches the empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZeroLengthPolicy {
    /// Accept the match and resume searching one character further on.
    #[default]
    AdvanceOneChar,
    /// Fail with [`crate::Error::InvalidDelimiter`].
    Reject,
}

/// Splitting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Handling of zero-length delimiter matches.
    /// Default: advance one character.
    pub zero_length: ZeroLengthPolicy,

    /// Emit delimiter matches as segments of their own.
    /// Default: false.
    pub keep_delimiters: bool,

    /// Copy parent annotations onto child segments.
    /// Default: true.
    pub import_annotations: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            zero_length: ZeroLengthPolicy::AdvanceOneChar,
            keep_delimiters: false,
            import_annotations: true,
        }
    }
}

/// Table engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Key used for segments lacking the requested annotation.
    /// Default: "__none__".
    pub missing_key: String,

    /// Delimiter joining the keys of a unit sequence.
    /// Default: "#".
    pub seq_delimiter: String,

    /// Separator between sibling segments in a concordance context.
    /// Default: " ".
    pub concordance_joiner: String,

    /// Minimum number of segments before work is spread over the thread pool.
    /// Default: 4096.
    pub parallel_threshold: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            missing_key: "__none__".to_string(),
            seq_delimiter: "#".to_string(),
            concordance_joiner: " ".to_string(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}
