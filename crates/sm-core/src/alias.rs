//! Alias-method sampler for weighted node draws.
//!
//! # Layout
//!
//! Two parallel arrays of length `n`:
//!
//! ```text
//! prob[i]  ∈ [0, 1]   probability of keeping column i
//! alias[i] ∈ 0..n     fallback node of column i
//! ```
//!
//! A draw picks a column `i` uniformly, then keeps `i` unless a uniform
//! `u ∈ [0, 1)` exceeds `prob[i]`, in which case it returns `alias[i]`.
//! Two random numbers per draw, no search, no allocation.

use crate::{NodeId, SimRng, SmError, SmResult};

/// Precomputed alias table over `n` nodes.
///
/// Immutable once built.  Construct from arrival rates with
/// [`from_rates`](Self::from_rates) or from an externally computed table with
/// [`from_parts`](Self::from_parts).
#[derive(Clone, Debug, PartialEq)]
pub struct AliasTable {
    prob:  Vec<f64>,
    alias: Vec<u32>,
}

impl AliasTable {
    /// Build the table for the distribution proportional to `rates`
    /// (Vose's method, O(n)).
    ///
    /// Rates must be finite and non-negative with a positive sum.  Columns
    /// that end up full keep `prob = 1` and alias to themselves.
    pub fn from_rates(rates: &[f64]) -> SmResult<Self> {
        let n = rates.len();
        if n == 0 {
            return Err(SmError::InvalidRates("no nodes".into()));
        }
        if let Some((i, r)) = rates.iter().enumerate().find(|(_, r)| !r.is_finite() || **r < 0.0) {
            return Err(SmError::InvalidRates(format!("rate {r} of node {i} is not a finite non-negative number")));
        }
        let peak = rates.iter().copied().fold(0.0, f64::max);
        if peak <= 0.0 {
            return Err(SmError::InvalidRates("rates sum to zero".into()));
        }

        // Normalise by the largest rate first so the sum stays finite.
        let total: f64 = rates.iter().map(|r| r / peak).sum();
        let mut scaled: Vec<f64> = rates.iter().map(|r| r / peak * n as f64 / total).collect();
        let mut prob  = vec![1.0; n];
        let mut alias: Vec<u32> = (0..n as u32).collect();

        let mut small: Vec<usize> = Vec::with_capacity(n);
        let mut large: Vec<usize> = Vec::with_capacity(n);
        for (i, &s) in scaled.iter().enumerate() {
            if s < 1.0 { small.push(i) } else { large.push(i) }
        }

        while !small.is_empty() && !large.is_empty() {
            let (Some(s), Some(l)) = (small.pop(), large.pop()) else { break };
            prob[s]  = scaled[s];
            alias[s] = l as u32;
            scaled[l] = (scaled[l] + scaled[s]) - 1.0;
            if scaled[l] < 1.0 { small.push(l) } else { large.push(l) }
        }
        // Leftovers on either stack are full columns up to rounding error.

        Ok(Self { prob, alias })
    }

    /// Wrap a precomputed table, checking `0 ≤ prob[i] ≤ 1` and `alias[i] < n`.
    pub fn from_parts(prob: Vec<f64>, alias: Vec<u32>) -> SmResult<Self> {
        if prob.is_empty() {
            return Err(SmError::InvalidAliasTable("no nodes".into()));
        }
        if prob.len() != alias.len() {
            return Err(SmError::InvalidAliasTable(format!(
                "prob has {} entries but alias has {}",
                prob.len(),
                alias.len()
            )));
        }
        let n = prob.len();
        for (i, (&p, &a)) in prob.iter().zip(&alias).enumerate() {
            if !(0.0..=1.0).contains(&p) {
                return Err(SmError::InvalidAliasTable(format!("prob[{i}] = {p} outside [0, 1]")));
            }
            if a as usize >= n {
                return Err(SmError::InvalidAliasTable(format!("alias[{i}] = {a} out of range for {n} nodes")));
            }
        }
        Ok(Self { prob, alias })
    }

    pub fn len(&self) -> usize {
        self.prob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    pub fn prob(&self) -> &[f64] {
        &self.prob
    }

    pub fn alias(&self) -> &[u32] {
        &self.alias
    }

    /// Draw one node.
    #[inline]
    pub fn sample(&self, rng: &mut SimRng) -> NodeId {
        let i = rng.gen_index(self.prob.len());
        if rng.gen_unit() > self.prob[i] {
            NodeId(self.alias[i])
        } else {
            NodeId(i as u32)
        }
    }

    /// The distribution this table samples from.
    pub fn distribution(&self) -> Vec<f64> {
        let n = self.prob.len() as f64;
        let mut p = vec![0.0; self.prob.len()];
        for (i, (&keep, &a)) in self.prob.iter().zip(&self.alias).enumerate() {
            p[i] += keep / n;
            p[a as usize] += (1.0 - keep) / n;
        }
        p
    }
}
