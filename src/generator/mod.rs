//! Synthetic sample generation.
//!
//! The synthesizer turns a domain preset from the [`crate::catalog`] into a
//! multi-group dataset with a deliberate, detectable group effect and
//! optional measurement noise. Generation is seeded ChaCha8, so the same
//! request with the same seed always produces the same dataset.

mod synthesizer;

use crate::error::GeneratorError;

pub use synthesizer::{GenerationRequest, SampleSynthesizer};

/// Result type for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;
