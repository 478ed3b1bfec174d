//! QP regularization driver: one full pass for a bound model.

use log::debug;

use super::model::RegularizationModel;
use super::qp::{ConstraintRow, QpProblem, QpSolver};
use crate::error::Error;
use crate::neighbors::NeighborQuery;
use crate::segments::Segment;

/// Objective split between pairwise regularity and fidelity. With a Delaunay
/// neighbor graph (at most ~3 edges per variable) this keeps the slack
/// penalty dominant for every in-tolerance pair, so satisfied constraints
/// close exactly instead of settling on a partial compromise.
const LAMBDA: f64 = 0.9;
/// Guards bound-normalized weights when a bound is zero.
const EPS_BOUND: f64 = 1e-12;

/// Orchestrates one regularization pass: assemble the QP from the model and
/// the neighbor graph, solve it, and write the solution back into segment
/// geometry.
#[derive(Clone, Debug)]
pub struct QpRegularizer<S: QpSolver> {
    solver: S,
}

impl<S: QpSolver> QpRegularizer<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    /// Runs the pass and returns how many segments changed.
    ///
    /// On solver failure every segment keeps its pre-pass geometry and
    /// [`Error::RegularizationFailed`] is returned. Re-running on an already
    /// regularized collection yields zero-norm perturbations.
    pub fn regularize<M: RegularizationModel>(
        &self,
        segments: &mut [Segment],
        neighbor_query: &NeighborQuery,
        model: &mut M,
    ) -> Result<usize, Error> {
        let num_vars = model.variables().len();
        if num_vars == 0 {
            return Ok(0);
        }

        // Candidate equality constraints among the model's variables.
        let mut edges: Vec<(usize, usize, f64)> = Vec::new();
        for (i, j) in neighbor_query.edges() {
            if let (Some(vi), Some(vj)) = (model.variable_of(i), model.variable_of(j)) {
                if let Some(target) = model.target(vi, vj) {
                    edges.push((vi, vj, target));
                }
            }
        }
        let num_edges = edges.len();

        let solution = if num_edges == 0 {
            // The box contains zero, so the all-zero perturbation is the
            // exact optimum; no need to invoke the solver.
            vec![0.0; num_vars]
        } else {
            let mut solution = self.solver.solve(&build_qp(model, &edges))?;
            solution.truncate(num_vars);
            for var in 0..num_vars {
                let bound = model.bound(var);
                solution[var] = solution[var].clamp(-bound, bound);
            }
            solution
        };

        model.update(segments, &solution);
        let modified = model.number_of_modified_segments();
        debug!(
            "QpRegularizer::regularize variables={} candidates={} modified={}",
            num_vars, num_edges, modified
        );
        Ok(modified)
    }
}

/// Variables: one perturbation per registered segment, then one slack per
/// candidate edge. Objective: bound-normalized quadratic fidelity on the
/// perturbations plus an L1 penalty on the slacks. Constraints: box bounds
/// on every perturbation and `|x_i - x_j - t_e| <= z_e` per edge.
fn build_qp<M: RegularizationModel>(model: &M, edges: &[(usize, usize, f64)]) -> QpProblem {
    let num_vars = model.variables().len();
    let num_edges = edges.len();
    let mut problem = QpProblem::new(num_vars + num_edges);

    for var in 0..num_vars {
        let bound = model.bound(var);
        let denom = (bound * bound).max(EPS_BOUND);
        problem.quadratic_diag[var] = 2.0 * (1.0 - LAMBDA) / (num_vars as f64 * denom);
        problem
            .rows
            .push(ConstraintRow::between(vec![(var, 1.0)], -bound, bound));
    }

    for (e, &(vi, vj, target)) in edges.iter().enumerate() {
        let slack = num_vars + e;
        let pair_bound = 0.25 * (model.bound(vi) + model.bound(vj));
        problem.linear[slack] = LAMBDA / (num_edges as f64 * pair_bound.max(EPS_BOUND));
        problem.rows.push(ConstraintRow::upper(
            vec![(vi, 1.0), (vj, -1.0), (slack, -1.0)],
            target,
        ));
        problem.rows.push(ConstraintRow::upper(
            vec![(vi, -1.0), (vj, 1.0), (slack, -1.0)],
            -target,
        ));
    }
    problem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regularize::angles::AngleRegularization;
    use crate::regularize::qp::ClarabelSolver;

    fn near_parallel_pair() -> Vec<Segment> {
        vec![
            Segment::from_coords(0.0, 0.0, 10.0, 0.2),
            Segment::from_coords(0.0, 1.0, 10.0, 1.0),
        ]
    }

    #[test]
    fn empty_model_is_a_no_op() {
        let mut segments = near_parallel_pair();
        let nq = NeighborQuery::new();
        let mut model = AngleRegularization::new(10.0);
        let regularizer = QpRegularizer::new(ClarabelSolver::default());
        let modified = regularizer
            .regularize(&mut segments, &nq, &mut model)
            .unwrap();
        assert_eq!(modified, 0);
    }

    #[test]
    fn aligns_a_near_parallel_pair_exactly() {
        let mut segments = near_parallel_pair();
        let group = vec![0, 1];
        let mut nq = NeighborQuery::new();
        nq.add_group(&segments, &group);
        let mut model = AngleRegularization::new(10.0);
        model.add_group(&segments, &group);
        let regularizer = QpRegularizer::new(ClarabelSolver::default());
        let modified = regularizer
            .regularize(&mut segments, &nq, &mut model)
            .unwrap();
        assert!(modified >= 1);
        let diff = crate::angle::angular_difference_180(
            segments[0].orientation_deg(),
            segments[1].orientation_deg(),
        );
        assert!(diff < 1e-9, "residual angular difference {diff}");
    }

    #[test]
    fn no_candidates_skips_the_solver_and_changes_nothing() {
        let mut segments = vec![
            Segment::from_coords(0.0, 0.0, 10.0, 0.0),
            Segment::from_coords(0.0, 1.0, 10.0, 6.0), // ~31 deg away
        ];
        let group = vec![0, 1];
        let mut nq = NeighborQuery::new();
        nq.add_group(&segments, &group);
        let mut model = AngleRegularization::new(5.0);
        model.add_group(&segments, &group);
        let before = segments.clone();
        let regularizer = QpRegularizer::new(ClarabelSolver::default());
        let modified = regularizer
            .regularize(&mut segments, &nq, &mut model)
            .unwrap();
        assert_eq!(modified, 0);
        assert_eq!(segments, before);
    }
}
