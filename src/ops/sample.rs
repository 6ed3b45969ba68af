//! Random and systematic sampling.

use crate::error::{Error, Result};
use crate::ops::{partition, Selection};
use crate::segmentation::Segmentation;
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// How segments are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Uniform sampling without replacement. `None` seeds from entropy.
    Random {
        /// Seed of the generator.
        seed: Option<u64>,
    },
    /// Every k-th segment starting at the first, with k = round(len / size).
    Systematic,
}

impl Default for SampleMode {
    fn default() -> Self {
        SampleMode::Random { seed: None }
    }
}

/// Options of [`sample`].
#[derive(Debug, Clone)]
pub struct SampleOptions {
    /// Sampling mode.
    pub mode: SampleMode,
    /// Label of the sampled segmentation.
    pub label: String,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            mode: SampleMode::default(),
            label: "sampled_data".to_string(),
        }
    }
}

/// Draws `size` segments from `input`, keeping their original order.
///
/// Segments left out form the rejected half of the selection.
pub fn sample(input: &Segmentation, size: usize, options: &SampleOptions) -> Result<Selection> {
    let len = input.len();
    if size > len {
        return Err(Error::InvalidArgument(format!(
            "sample size {} exceeds segmentation length {}",
            size, len
        )));
    }

    let mut keep = vec![false; len];
    match options.mode {
        SampleMode::Random { seed } => {
            let mut rng = match seed {
                Some(s) => ChaCha8Rng::seed_from_u64(s),
                None => ChaCha8Rng::from_entropy(),
            };
            for i in rand::seq::index::sample(&mut rng, len, size) {
                keep[i] = true;
            }
        }
        SampleMode::Systematic if size > 0 => {
            let step = ((len as f64 / size as f64).round() as usize).max(1);
            for i in (0..len).step_by(step).take(size) {
                keep[i] = true;
            }
        }
        SampleMode::Systematic => {}
    }

    let selection = partition(input, &options.label, keep);
    debug!(
        "sample: {} segments -> {} sampled",
        len,
        selection.selected.len()
    );
    Ok(selection)
}
