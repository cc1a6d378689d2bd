//! Monte Carlo sampler over the impact reference table.
//!
//! Each category is sampled independently from Normal(mean, sd). Draws are
//! not clipped: low-mean categories (Ionizing Radiation sits at mean zero)
//! legitimately produce negative values and they are retained. Summaries use
//! the sample (n-1) standard deviation, even-N median as the mean of the two
//! middle order statistics, and linearly interpolated empirical percentiles.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::error::SimError;
use crate::reference::{ImpactCategory, ReferenceTable};

pub const DEFAULT_NUM_RUNS: usize = 1000;

/// When a category spec carries no uncertainty, fall back to 10% of the mean.
const SD_FALLBACK_FRAC: f64 = 0.1;

/// Splitmix constant; mixes the run seed with the category index so each
/// category gets an independent stream and results do not depend on the
/// order categories are drawn in.
const SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

// =============================================================================
// Output types
// =============================================================================

/// Distributional summary for one impact category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactSummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub ci_95_lower: f64,
    pub ci_95_upper: f64,
}

/// Raw samples plus summaries, keyed by category (display order).
#[derive(Debug, Clone)]
pub struct SamplerOutput {
    pub samples: BTreeMap<ImpactCategory, Vec<f64>>,
    pub summaries: BTreeMap<ImpactCategory, ImpactSummary>,
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation flag, checked between categories. A cancelled
/// run returns `SimError::Cancelled` and leaves no partial state behind.
#[derive(Debug, Default)]
pub struct CancelToken {
    flag: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Sampling
// =============================================================================

fn category_seed(run_seed: u64, idx: usize) -> u64 {
    let mut x = run_seed ^ (idx as u64 + 1).wrapping_mul(SEED_MIX);
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

/// Draw `n` samples per category and summarise them.
///
/// With a seed the run is fully reproducible; without one each call is
/// independent (entropy-seeded per category).
pub fn sample(
    table: &ReferenceTable,
    n: usize,
    seed: Option<u64>,
    cancel: Option<&CancelToken>,
) -> Result<SamplerOutput, SimError> {
    if n == 0 {
        return Err(SimError::Sampler {
            category: "all".to_string(),
            cause: "sample count must be positive".to_string(),
        });
    }

    let mut samples = BTreeMap::new();
    let mut summaries = BTreeMap::new();

    for (idx, category) in table.all_categories().into_iter().enumerate() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(SimError::Cancelled);
            }
        }

        let spec = table.spec_for(category)?;
        let sd = spec.sd.unwrap_or(SD_FALLBACK_FRAC * spec.mean);
        let normal = Normal::new(spec.mean, sd).map_err(|e| SimError::Sampler {
            category: category.name().to_string(),
            cause: e.to_string(),
        })?;

        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(category_seed(s, idx)),
            None => StdRng::from_entropy(),
        };
        let draws: Vec<f64> = (0..n).map(|_| normal.sample(&mut rng)).collect();

        summaries.insert(category, summarise(&draws));
        samples.insert(category, draws);
    }

    Ok(SamplerOutput { samples, summaries })
}

// =============================================================================
// Summary statistics
// =============================================================================

fn summarise(xs: &[f64]) -> ImpactSummary {
    let mean = mean(xs);
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    ImpactSummary {
        mean,
        median: percentile(&sorted, 0.5),
        std_dev: sample_std(xs, mean),
        ci_95_lower: percentile(&sorted, 0.025),
        ci_95_upper: percentile(&sorted, 0.975),
    }
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn sample_std(xs: &[f64], mean: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m2 = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
    (m2 / (xs.len() - 1) as f64).sqrt()
}

/// Empirical percentile over a sorted slice, linearly interpolating between
/// order statistics (rank = p * (n-1)). p = 0.5 reproduces the conventional
/// median, including the mean-of-middle-two rule for even n.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// =============================================================================
// Tests
// =============================================================================
