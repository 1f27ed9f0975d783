//! Seeded sample synthesizer.

use crate::catalog;
use crate::dataset::{GeneratedDataset, SampleRow};
use crate::error::GeneratorError;
use crate::generator::Result;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Multiplicative group-effect range applied to non-first groups.
const GROUP_EFFECT_RANGE: (f64, f64) = (1.2, 1.6);

/// Noise standard deviation as a fraction of the current value.
const NOISE_FRACTION: f64 = 0.15;

/// Floor keeping all generated values strictly positive.
const VALUE_FLOOR: f64 = 0.01;

/// Parameters for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Domain tag selecting the catalog preset.
    pub domain: String,
    /// Samples to generate per group. Must be at least 1.
    pub samples_per_group: usize,
    /// Number of experimental groups. Must be at least 1.
    pub num_groups: usize,
    /// Whether to add Gaussian measurement noise.
    pub include_noise: bool,
}

impl GenerationRequest {
    /// Creates a request with the canonical two-group, noisy defaults.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            samples_per_group: 50,
            num_groups: 2,
            include_noise: true,
        }
    }

    /// Sets the samples-per-group count.
    pub fn with_samples_per_group(mut self, count: usize) -> Self {
        self.samples_per_group = count;
        self
    }

    /// Sets the group count.
    pub fn with_groups(mut self, count: usize) -> Self {
        self.num_groups = count;
        self
    }

    /// Enables or disables noise.
    pub fn with_noise(mut self, noise: bool) -> Self {
        self.include_noise = noise;
        self
    }
}

/// Seeded synthesizer producing [`GeneratedDataset`]s.
///
/// Uses ChaCha8 seeded from an explicit `u64`, so generation is reproducible:
/// the same seed and request always yield the same rows.
///
/// # Example
///
/// ```ignore
/// let request = GenerationRequest::new("genomics").with_samples_per_group(50);
/// let dataset = SampleSynthesizer::new(42).generate(&request)?;
/// assert_eq!(dataset.total_samples, 100);
/// ```
pub struct SampleSynthesizer {
    rng: ChaCha8Rng,
}

impl SampleSynthesizer {
    /// Creates a synthesizer seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generates a dataset for the given request.
    ///
    /// Guarantees on success:
    /// - row count is exactly `samples_per_group * num_groups`
    /// - every row carries every feature of the resolved preset
    /// - every value is strictly positive and rounded to 3 decimal places
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidParameter`] when either count is zero.
    pub fn generate(mut self, request: &GenerationRequest) -> Result<GeneratedDataset> {
        if request.samples_per_group == 0 {
            return Err(GeneratorError::InvalidParameter(
                "samples_per_group must be at least 1".to_string(),
            ));
        }
        if request.num_groups == 0 {
            return Err(GeneratorError::InvalidParameter(
                "num_groups must be at least 1".to_string(),
            ));
        }

        let params = catalog::lookup(&request.domain);
        let groups = params.group_labels(request.num_groups);
        let features: Vec<String> = params.features.iter().map(|f| f.to_string()).collect();

        let mut data = Vec::with_capacity(request.samples_per_group * request.num_groups);
        for (group_idx, group_label) in groups.iter().enumerate() {
            for sample_num in 0..request.samples_per_group {
                let mut values = Vec::with_capacity(features.len());
                for feature in &features {
                    let value =
                        self.draw_value(params.base_range, group_idx, request.include_noise)?;
                    values.push((feature.clone(), value));
                }
                data.push(SampleRow {
                    sample_id: format!("{}_{:03}", group_label, sample_num + 1),
                    group: group_label.clone(),
                    values,
                });
            }
        }

        tracing::debug!(
            domain = %request.domain,
            rows = data.len(),
            features = features.len(),
            noise = request.include_noise,
            "generated synthetic dataset"
        );

        Ok(GeneratedDataset {
            data_type: request.domain.clone(),
            num_samples_per_group: request.samples_per_group,
            num_groups: request.num_groups,
            total_samples: request.samples_per_group * request.num_groups,
            csv_format: format!("sample_id,group,{}", features.join(",")),
            features,
            groups,
            units: params.units.to_string(),
            noise_included: request.include_noise,
            data,
        })
    }

    /// Draws one feature value: uniform base, coin-gated group effect for
    /// non-first groups, optional noise, positive floor, 3-decimal rounding.
    fn draw_value(
        &mut self,
        base_range: (f64, f64),
        group_idx: usize,
        include_noise: bool,
    ) -> Result<f64> {
        let mut value = self.rng.random_range(base_range.0..base_range.1);

        // Group effect: later groups get a 20-60% boost on roughly half the
        // draws, which keeps them statistically distinguishable from group 0.
        if group_idx > 0 && self.rng.random::<f64>() > 0.5 {
            value *= self
                .rng
                .random_range(GROUP_EFFECT_RANGE.0..GROUP_EFFECT_RANGE.1);
        }

        if include_noise {
            let normal = rand_distr::Normal::new(0.0, value * NOISE_FRACTION)
                .map_err(|e| GeneratorError::NoiseDistribution(e.to_string()))?;
            let noise: f64 = self.rng.sample(normal);
            value = (value + noise).max(VALUE_FLOOR);
        }

        Ok(round3(value.max(VALUE_FLOOR)))
    }
}

/// Rounds to 3 decimal places.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
