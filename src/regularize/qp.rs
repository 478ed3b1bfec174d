//! Convex QP capability boundary.
//!
//! The driver assembles a backend-neutral [`QpProblem`]; any conforming
//! convex-QP backend can sit behind [`QpSolver`]. The bundled backend is
//! [`ClarabelSolver`], a pure-Rust interior-point solver. The problems built
//! here have a diagonal quadratic objective, which is all the regularization
//! models ever need.

use log::debug;

use crate::error::Error;

/// One linear constraint row: `lower <= sum(coeff * x[col]) <= upper`.
///
/// Either side may be infinite.
#[derive(Clone, Debug)]
pub struct ConstraintRow {
    pub entries: Vec<(usize, f64)>,
    pub lower: f64,
    pub upper: f64,
}

impl ConstraintRow {
    pub fn upper(entries: Vec<(usize, f64)>, upper: f64) -> Self {
        Self {
            entries,
            lower: f64::NEG_INFINITY,
            upper,
        }
    }

    pub fn between(entries: Vec<(usize, f64)>, lower: f64, upper: f64) -> Self {
        Self {
            entries,
            lower,
            upper,
        }
    }
}

/// minimize ½ xᵀ diag(quadratic_diag) x + linearᵀ x subject to the rows.
#[derive(Clone, Debug, Default)]
pub struct QpProblem {
    pub num_variables: usize,
    pub quadratic_diag: Vec<f64>,
    pub linear: Vec<f64>,
    pub rows: Vec<ConstraintRow>,
}

impl QpProblem {
    pub fn new(num_variables: usize) -> Self {
        Self {
            num_variables,
            quadratic_diag: vec![0.0; num_variables],
            linear: vec![0.0; num_variables],
            rows: Vec::new(),
        }
    }
}

/// Narrow solver interface: a solution vector or failure.
pub trait QpSolver {
    fn solve(&self, problem: &QpProblem) -> Result<Vec<f64>, Error>;
}

/// Interior-point backend based on the `clarabel` crate.
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    pub max_iterations: u32,
    pub verbose: bool,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            verbose: false,
        }
    }
}

impl QpSolver for ClarabelSolver {
    fn solve(&self, problem: &QpProblem) -> Result<Vec<f64>, Error> {
        use clarabel::algebra::*;
        use clarabel::solver::*;

        let n = problem.num_variables;
        let p = diagonal_csc(&problem.quadratic_diag);

        // Every finite side of every row becomes one `a x <= b` inequality.
        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        let mut b = Vec::new();
        for row in &problem.rows {
            if row.upper.is_finite() {
                let r = b.len();
                for &(col, val) in &row.entries {
                    triplets.push((r, col, val));
                }
                b.push(row.upper);
            }
            if row.lower.is_finite() {
                let r = b.len();
                for &(col, val) in &row.entries {
                    triplets.push((r, col, -val));
                }
                b.push(-row.lower);
            }
        }
        let m = b.len();
        let a = csc_from_triplets(m, n, triplets);
        let cones = [NonnegativeConeT(m)];

        let mut settings = DefaultSettings::default();
        settings.verbose = self.verbose;
        settings.max_iter = self.max_iterations;

        let mut solver = DefaultSolver::new(&p, &problem.linear, &a, &b, &cones, settings);
        solver.solve();

        let status = solver.solution.status;
        debug!(
            "ClarabelSolver::solve n={} m={} status={:?}",
            n, m, status
        );
        match status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => Ok(solver.solution.x.clone()),
            other => Err(Error::RegularizationFailed {
                reason: format!("solver status {other:?}"),
            }),
        }
    }
}

fn diagonal_csc(diag: &[f64]) -> clarabel::algebra::CscMatrix<f64> {
    let n = diag.len();
    let colptr: Vec<usize> = (0..=n).collect();
    let rowval: Vec<usize> = (0..n).collect();
    clarabel::algebra::CscMatrix::new(n, n, colptr, rowval, diag.to_vec())
}

fn csc_from_triplets(
    m: usize,
    n: usize,
    mut triplets: Vec<(usize, usize, f64)>,
) -> clarabel::algebra::CscMatrix<f64> {
    triplets.sort_by(|x, y| (x.1, x.0).cmp(&(y.1, y.0)));
    let mut colptr = vec![0usize; n + 1];
    for &(_, col, _) in &triplets {
        colptr[col + 1] += 1;
    }
    for k in 0..n {
        colptr[k + 1] += colptr[k];
    }
    let rowval: Vec<usize> = triplets.iter().map(|t| t.0).collect();
    let nzval: Vec<f64> = triplets.iter().map(|t| t.2).collect();
    clarabel::algebra::CscMatrix::new(m, n, colptr, rowval, nzval)
}
