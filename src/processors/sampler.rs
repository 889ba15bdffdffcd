use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{CanonicalRow, CleanedDataset};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Draws a reproducible random subset of rows.
///
/// The sample holds `round(n * fraction)` rows in their original order.
/// The same seed, fraction and input always give the same rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampler {
    fraction: f64,
    seed: u64,
}

impl Sampler {
    pub fn new(fraction: f64, seed: u64) -> Result<Self> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ProcessingError::Config(format!(
                "sample fraction must be in (0, 1], got {}",
                fraction
            )));
        }
        Ok(Self { fraction, seed })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.sample_fraction, config.sample_seed)
    }

    pub fn sample_size(&self, total: usize) -> usize {
        ((total as f64 * self.fraction).round() as usize).min(total)
    }

    pub fn sample(&self, dataset: &CleanedDataset) -> Vec<CanonicalRow> {
        self.sample_rows(dataset.rows())
    }

    fn sample_rows<T: Clone>(&self, rows: &[T]) -> Vec<T> {
        let amount = self.sample_size(rows.len());
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut indices = rand::seq::index::sample(&mut rng, rows.len(), amount).into_vec();
        indices.sort_unstable();

        indices.into_iter().map(|i| rows[i].clone()).collect()
    }
}
