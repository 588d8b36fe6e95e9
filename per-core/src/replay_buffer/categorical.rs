//! Sampling from a categorical distribution.
use crate::error::PerError;
use rand::Rng;

/// Categorical distribution over `0..n` given unnormalized weights.
///
/// Samples are drawn by binary search on the cumulative weights, costing
/// `O(log n)` per draw after an `O(n)` construction.
#[derive(Debug, Clone)]
pub struct Categorical {
    cdf: Vec<f64>,
    last_positive: usize,
}

impl Categorical {
    /// Builds the distribution.
    ///
    /// Fails if a weight is negative or not finite, or if all weights are zero.
    pub fn new(weights: &[f64]) -> Result<Self, PerError> {
        let mut cdf = Vec::with_capacity(weights.len());
        let mut total = 0f64;
        let mut last_positive = None;

        for (i, &w) in weights.iter().enumerate() {
            if !w.is_finite() || w < 0.0 {
                return Err(PerError::DegenerateDistribution(w));
            }
            if w > 0.0 {
                last_positive = Some(i);
            }
            total += w;
            cdf.push(total);
        }

        match last_positive {
            Some(last_positive) if total.is_finite() => Ok(Self { cdf, last_positive }),
            _ => Err(PerError::DegenerateDistribution(total)),
        }
    }

    /// Sum of the weights.
    pub fn total(&self) -> f64 {
        self.cdf[self.cdf.len() - 1]
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.cdf.len()
    }

    /// Always `false`; a distribution has at least one category.
    pub fn is_empty(&self) -> bool {
        self.cdf.is_empty()
    }

    /// Probability of category `ix`.
    pub fn probability(&self, ix: usize) -> f64 {
        let lower = if ix == 0 { 0.0 } else { self.cdf[ix - 1] };
        (self.cdf[ix] - lower) / self.total()
    }

    /// Draws a category.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let u = rng.gen::<f64>() * self.total();
        let ix = self.cdf.partition_point(|&c| c <= u);
        // `u` can round up to the total
        ix.min(self.last_positive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_zero_weights_are_never_drawn() {
        let dist = Categorical::new(&[0.0, 1.0, 0.0, 3.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 5];
        for _ in 0..20_000 {
            counts[dist.sample(&mut rng)] += 1;
        }
        assert_eq!(counts[0] + counts[2] + counts[4], 0);
        let p3 = counts[3] as f64 / 20_000.0;
        assert!((p3 - 0.75).abs() < 0.02, "p3 = {}", p3);
        assert!((dist.probability(3) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_weights_are_rejected() {
        assert!(matches!(
            Categorical::new(&[0.0, 0.0]),
            Err(PerError::DegenerateDistribution(_))
        ));
        assert!(Categorical::new(&[]).is_err());
        assert!(Categorical::new(&[1.0, f64::NAN]).is_err());
        assert!(Categorical::new(&[1.0, -0.5]).is_err());
    }
}
