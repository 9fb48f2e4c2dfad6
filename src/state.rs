//! Electrical state of the network at one simulated step.
//!
//! The adjacency matrix is authoritative: an edge `(i, j)` exists iff
//! `A[i][j]` is set, and admittance values are only meaningful on edges.

use serde::Deserialize;

use crate::error::{NnsError, Result};
use crate::matrix::Matrix;

/// What to do when adjacency and admittance disagree on the edge set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SparsityPolicy {
    Ignore,
    #[default]
    Warn,
    Reject,
}

/// One snapshot: adjacency `A`, admittance `Y` and node voltages `V`.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    adjacency: Matrix<bool>,
    admittance: Matrix<f64>,
    voltages: Vec<f64>,
}

impl NetworkState {
    /// Assemble a state. All three parts must describe the same node count and
    /// the adjacency must be symmetric off the diagonal.
    pub fn new(adjacency: Matrix<bool>, admittance: Matrix<f64>, voltages: Vec<f64>) -> Result<Self> {
        let n = adjacency.size();
        if admittance.size() != n || voltages.len() != n {
            return Err(NnsError::ShapeMismatch(format!(
                "adjacency is {n}x{n}, admittance is {0}x{0}, voltage has {1} entries",
                admittance.size(),
                voltages.len()
            )));
        }
        if let Some((i, j)) = adjacency.find_asymmetry(|a, b| a == b) {
            return Err(NnsError::InvalidState(format!(
                "adjacency is not symmetric at ({i}, {j})"
            )));
        }
        Ok(Self {
            adjacency,
            admittance,
            voltages,
        })
    }

    pub fn size(&self) -> usize {
        self.voltages.len()
    }

    pub fn adjacency(&self) -> &Matrix<bool> {
        &self.adjacency
    }

    pub fn admittance(&self) -> &Matrix<f64> {
        &self.admittance
    }

    pub fn voltages(&self) -> &[f64] {
        &self.voltages
    }

    pub fn is_edge(&self, i: usize, j: usize) -> bool {
        i != j && self.adjacency.get(i, j).unwrap_or(false)
    }

    /// Admittance of the edge `(i, j)`, `None` if there is no such edge.
    pub fn edge_admittance(&self, i: usize, j: usize) -> Option<f64> {
        if self.is_edge(i, j) {
            self.admittance.get(i, j)
        } else {
            None
        }
    }

    /// Upper-triangle edges `(i, j, admittance)` with `i < j`, row by row.
    pub fn edges(&self) -> Vec<(usize, usize, f64)> {
        let n = self.size();
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.adjacency[(i, j)] {
                    edges.push((i, j, self.admittance[(i, j)]));
                }
            }
        }
        edges
    }

    pub fn edge_count(&self) -> usize {
        let n = self.size();
        (0..n)
            .map(|i| ((i + 1)..n).filter(|&j| self.adjacency[(i, j)]).count())
            .sum()
    }

    /// Off-diagonal entries where `A[i][j] != (Y[i][j] != 0)`.
    pub fn sparsity_mismatches(&self) -> usize {
        let n = self.size();
        let mut mismatches = 0;
        for i in 0..n {
            for j in 0..n {
                if i != j && self.adjacency[(i, j)] != (self.admittance[(i, j)] != 0.0) {
                    mismatches += 1;
                }
            }
        }
        mismatches
    }

    /// Apply a sparsity policy to this state.
    pub fn check_sparsity(&self, policy: SparsityPolicy) -> Result<()> {
        if policy == SparsityPolicy::Ignore {
            return Ok(());
        }
        let mismatches = self.sparsity_mismatches();
        if mismatches == 0 {
            return Ok(());
        }
        match policy {
            SparsityPolicy::Reject => Err(NnsError::InconsistentState { mismatches }),
            _ => {
                tracing::warn!(mismatches, size = self.size(), "adjacency and admittance disagree");
                Ok(())
            }
        }
    }

    /// Keep only the nodes in `nodes`, in the given order.
    pub fn select(&self, nodes: &[usize]) -> Self {
        Self {
            adjacency: self.adjacency.select(nodes),
            admittance: self.admittance.select(nodes),
            voltages: nodes.iter().map(|&i| self.voltages[i]).collect(),
        }
    }

    /// `(min, max)` voltage, `None` for an empty state.
    pub fn voltage_range(&self) -> Option<(f64, f64)> {
        min_max(self.voltages.iter().copied())
    }

    /// `(min, max)` admittance over edges, `None` without edges.
    pub fn admittance_range(&self) -> Option<(f64, f64)> {
        min_max(self.edges().into_iter().map(|(_, _, y)| y))
    }
}

pub(crate) fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn triangle_with_tail() -> NetworkState {
        // 0-1, 1-2, 0-2 and 2-3
        let a = Matrix::from_rows(vec![
            vec![false, true, true, false],
            vec![true, false, true, false],
            vec![true, true, false, true],
            vec![false, false, true, false],
        ])
        .unwrap();
        let y = Matrix::from_rows(vec![
            vec![0.0, 0.01, 0.02, 0.0],
            vec![0.01, 0.0, 0.03, 0.0],
            vec![0.02, 0.03, 0.0, 0.05],
            vec![0.0, 0.0, 0.05, 0.0],
        ])
        .unwrap();
        NetworkState::new(a, y, vec![5.0, 3.0, 1.0, 0.0]).unwrap()
    }

    #[test]
    fn test_new_rejects_shape_mismatch() {
        let a = Matrix::new(2);
        let y = Matrix::new(3);
        let err = NetworkState::new(a, y, vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, NnsError::ShapeMismatch(_)));
    }

    #[test]
    fn test_new_rejects_asymmetric_adjacency() {
        let a = Matrix::from_rows(vec![vec![false, true], vec![false, false]]).unwrap();
        let err = NetworkState::new(a, Matrix::new(2), vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, NnsError::InvalidState(_)));
    }

    #[test]
    fn test_edges_upper_triangle() {
        let state = triangle_with_tail();
        assert_eq!(
            state.edges(),
            vec![(0, 1, 0.01), (0, 2, 0.02), (1, 2, 0.03), (2, 3, 0.05)]
        );
        assert_eq!(state.edge_count(), 4);
    }

    #[test]
    fn test_edge_admittance_ignores_off_edge_values() {
        let a = Matrix::from_rows(vec![vec![false, false], vec![false, false]]).unwrap();
        let y = Matrix::from_rows(vec![vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        let state = NetworkState::new(a, y, vec![0.0, 0.0]).unwrap();
        assert_eq!(state.edge_admittance(0, 1), None);
        assert_eq!(state.admittance_range(), None);
        // diagonal is never counted
        assert_eq!(state.sparsity_mismatches(), 2);
    }

    #[test]
    fn test_sparsity_policies() {
        let a = Matrix::from_rows(vec![vec![false, true], vec![true, false]]).unwrap();
        let y = Matrix::new(2);
        let state = NetworkState::new(a, y, vec![0.0, 0.0]).unwrap();
        assert!(state.check_sparsity(SparsityPolicy::Ignore).is_ok());
        assert!(state.check_sparsity(SparsityPolicy::Warn).is_ok());
        let err = state.check_sparsity(SparsityPolicy::Reject).unwrap_err();
        assert!(matches!(err, NnsError::InconsistentState { mismatches: 2 }));

        assert!(triangle_with_tail().check_sparsity(SparsityPolicy::Reject).is_ok());
    }

    #[test]
    fn test_select_restricts_all_parts() {
        let sub = triangle_with_tail().select(&[2, 3]);
        assert_eq!(sub.size(), 2);
        assert!(sub.is_edge(0, 1));
        assert_abs_diff_eq!(sub.edge_admittance(1, 0).unwrap(), 0.05);
        assert_eq!(sub.voltages(), &[1.0, 0.0]);
    }

    #[test]
    fn test_ranges() {
        let state = triangle_with_tail();
        assert_eq!(state.voltage_range(), Some((0.0, 5.0)));
        let (lo, hi) = state.admittance_range().unwrap();
        assert_abs_diff_eq!(lo, 0.01);
        assert_abs_diff_eq!(hi, 0.05);
    }
}
