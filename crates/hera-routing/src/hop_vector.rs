//! Fixed-width vectors of hop-level scores
//!
//! Index 0 holds direct-contact evidence; index `h > 0` holds evidence
//! attributable to `h`-hop relay chains. The width is fixed per router
//! (the configured hop count) but not known at compile time.

use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Ordered sequence of H non-negative scores
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HopVector(Vec<f64>);

impl HopVector {
    /// All-zero vector of the given width
    pub fn zeros(hop_count: usize) -> Self {
        Self(vec![0.0; hop_count])
    }

    /// Number of hop levels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-width vector
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Score at hop level `h`, zero when out of range
    pub fn get(&self, h: usize) -> f64 {
        self.0.get(h).copied().unwrap_or(0.0)
    }

    /// Borrow the underlying scores
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Add `delta` to hop level `h`
    pub(crate) fn add(&mut self, h: usize, delta: f64) {
        if let Some(slot) = self.0.get_mut(h) {
            *slot += delta;
        }
    }

    /// Multiply every component by `factor`
    pub(crate) fn scale(&mut self, factor: f64) {
        for value in &mut self.0 {
            *value *= factor;
        }
    }

    /// Inner product with a weight vector of the same width
    pub fn dot(&self, weights: &HopVector) -> f64 {
        self.0
            .iter()
            .zip(weights.0.iter())
            .map(|(value, weight)| value * weight)
            .sum()
    }
}

impl From<Vec<f64>> for HopVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl Index<usize> for HopVector {
    type Output = f64;

    fn index(&self, h: usize) -> &f64 {
        &self.0[h]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let v = HopVector::zeros(4);
        assert_eq!(v.len(), 4);
        assert!(v.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_add_and_scale() {
        let mut v = HopVector::zeros(3);
        v.add(0, 2.0);
        v.add(2, 1.0);
        v.add(7, 5.0); // out of range is ignored
        v.scale(0.5);
        assert_eq!(v.as_slice(), &[1.0, 0.0, 0.5]);
        assert_eq!(v[2], 0.5);
        assert_eq!(v.get(9), 0.0);
    }

    #[test]
    fn test_dot() {
        let v = HopVector::from(vec![0.0, 0.49, 0.0]);
        let gamma = HopVector::from(vec![1.0, 0.5, 0.05]);
        assert!((v.dot(&gamma) - 0.245).abs() < 1e-12);
    }
}
