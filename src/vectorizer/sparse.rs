use std::cmp::Ordering;

use num::Float;
use serde::{Deserialize, Serialize};

use crate::utils::sort::sort_by_index_soa;

/// SparseVec
/// Stores only the non-zero components of a feature vector.
/// `indices` are strictly ascending and `values` line up with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVec<N = f32>
where
    N: Float,
{
    dim: usize,
    indices: Vec<u32>,
    values: Vec<N>,
}

impl<N> SparseVec<N>
where
    N: Float,
{
    /// Empty vector of dimension `dim`
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from unsorted `(index, value)` pairs.
    /// Zero values are dropped, duplicate indices are summed,
    /// indices `>= dim` are ignored.
    pub fn from_pairs(dim: usize, pairs: impl IntoIterator<Item = (u32, N)>) -> Self {
        let (mut indices, mut values): (Vec<u32>, Vec<N>) = pairs
            .into_iter()
            .filter(|(idx, val)| (*idx as usize) < dim && !val.is_zero())
            .unzip();
        sort_by_index_soa(&mut indices, &mut values);

        let mut out = Self::zeros(dim);
        for (idx, val) in indices.into_iter().zip(values) {
            match out.indices.last() {
                Some(&last) if last == idx => {
                    if let Some(v) = out.values.last_mut() {
                        *v = *v + val;
                    }
                }
                _ => {
                    out.indices.push(idx);
                    out.values.push(val);
                }
            }
        }
        out
    }

    /// Number of stored (non-zero) entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| v.is_zero())
    }

    /// Value at `index`, zero when not stored
    pub fn get(&self, index: u32) -> N {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or_else(|_| N::zero())
    }

    /// Iterator over stored `(index, value)` in ascending index order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u32, N)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.values
            .iter()
            .map(|v| {
                let v = v.to_f64().unwrap_or(0.0);
                v * v
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Scale in place so the norm becomes 1. Zero vectors stay zero.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            if let Some(norm) = N::from(norm) {
                self.values.iter_mut().for_each(|v| *v = *v / norm);
            }
        }
    }

    /// dot product
    /// d(a, b) = Σ(a_i * b_i)
    pub fn dot(&self, other: &Self) -> f64 {
        let mut a_it = self.iter().peekable();
        let mut b_it = other.iter().peekable();
        let mut sum_ab = 0.0;
        while let (Some(&(ia, va)), Some(&(ib, vb))) = (a_it.peek(), b_it.peek()) {
            match ia.cmp(&ib) {
                Ordering::Equal => {
                    sum_ab += (va * vb).to_f64().unwrap_or(0.0);
                    a_it.next();
                    b_it.next();
                }
                Ordering::Less => {
                    a_it.next();
                }
                Ordering::Greater => {
                    b_it.next();
                }
            }
        }
        sum_ab
    }

    /// cosine similarity
    /// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
    /// 0.0 when either side is the zero vector.
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        let na = self.norm();
        let nb = other.norm();
        if na == 0.0 || nb == 0.0 {
            return 0.0;
        }
        self.dot(other) / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_sorts_merges_and_drops() {
        let v: SparseVec<f32> = SparseVec::from_pairs(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (4, 0.0), (9, 1.0)]);
        let entries: Vec<(u32, f32)> = v.iter().collect();
        assert_eq!(entries, vec![(1, 2.0), (3, 1.5)]);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(0), 0.0);
    }

    #[test]
    fn cosine_of_identical_and_disjoint() {
        let a: SparseVec<f32> = SparseVec::from_pairs(4, vec![(0, 1.0), (2, 3.0)]);
        let b: SparseVec<f32> = SparseVec::from_pairs(4, vec![(1, 1.0)]);
        assert!((a.cosine_similarity(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn zero_vector_has_zero_similarity() {
        let a: SparseVec<f64> = SparseVec::zeros(3);
        let b: SparseVec<f64> = SparseVec::from_pairs(3, vec![(0, 1.0)]);
        assert!(a.is_zero());
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn normalize_gives_unit_norm() {
        let mut a: SparseVec<f64> = SparseVec::from_pairs(3, vec![(0, 3.0), (2, 4.0)]);
        a.l2_normalize();
        assert!((a.norm() - 1.0).abs() < 1e-12);
        assert!((a.get(0) - 0.6).abs() < 1e-12);
    }
}
