//! Full regularization run: angle pass, parallel-group derivation, offset
//! pass.
//!
//! Stage order follows the reference flow exactly: the neighbor graph built
//! over the input groups feeds the angle pass; the graph is then cleared and
//! rebuilt over the parallel groups that emerge from the solved angles, and
//! that graph feeds the offset pass. A failed pass is logged and recorded in
//! the report while the geometry keeps its pre-pass values, so the offset
//! pass still runs after an angle-pass failure (its parallel groups then
//! simply reflect zero deviation).

use std::time::Instant;

use log::{debug, warn};
use serde::Serialize;

use super::angles::AngleRegularization;
use super::driver::QpRegularizer;
use super::offsets::OffsetRegularization;
use super::params::RegularizationParams;
use super::qp::{ClarabelSolver, QpSolver};
use crate::error::Error;
use crate::neighbors::NeighborQuery;
use crate::segments::Segment;

/// Diagnostic summary of one regularization run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RegularizationReport {
    /// Segments whose orientation changed in the angle pass.
    pub modified_angles: usize,
    /// Segments whose offset changed in the offset pass.
    pub modified_offsets: usize,
    /// Parallel groups derived after the angle pass.
    pub parallel_groups: usize,
    /// The angle-pass QP could not be solved; angles kept original values.
    pub angle_pass_failed: bool,
    /// The offset-pass QP could not be solved; offsets kept their values.
    pub offset_pass_failed: bool,
    pub latency_ms: f64,
}

/// Runs both regularization passes over `segments` with the default QP
/// backend. `groups` partitions the working subset; segments outside every
/// group are left untouched.
pub fn regularize_segments(
    segments: &mut [Segment],
    groups: &[Vec<usize>],
    params: &RegularizationParams,
) -> RegularizationReport {
    regularize_segments_with(segments, groups, params, &ClarabelSolver::default())
}

/// [`regularize_segments`] with a caller-supplied QP backend.
pub fn regularize_segments_with<S: QpSolver>(
    segments: &mut [Segment],
    groups: &[Vec<usize>],
    params: &RegularizationParams,
    solver: &S,
) -> RegularizationReport
where
    S: Clone,
{
    let start = Instant::now();
    let mut report = RegularizationReport::default();
    let regularizer = QpRegularizer::new(solver.clone());

    // Angle pass over the input groups.
    let mut neighbor_query = NeighborQuery::new();
    let mut angles = AngleRegularization::new(params.maximum_angle_deg);
    for group in groups {
        neighbor_query.add_group(segments, group);
        angles.add_group(segments, group);
    }
    match regularizer.regularize(segments, &neighbor_query, &mut angles) {
        Ok(modified) => report.modified_angles = modified,
        Err(err) => {
            warn!("angle pass failed: {err}");
            report.angle_pass_failed = true;
        }
    }

    // Offset pass over the emergent parallel groups.
    let mut pgroups = Vec::new();
    angles.parallel_groups(segments, &mut pgroups);
    report.parallel_groups = pgroups.len();

    neighbor_query.clear();
    let mut offsets = OffsetRegularization::new(params.maximum_offset);
    for pgroup in &pgroups {
        neighbor_query.add_group(segments, pgroup);
        offsets.add_group(segments, pgroup);
    }
    match regularizer.regularize(segments, &neighbor_query, &mut offsets) {
        Ok(modified) => report.modified_offsets = modified,
        Err(err) => {
            warn!("offset pass failed: {err}");
            report.offset_pass_failed = true;
        }
    }

    report.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    debug!(
        "regularize_segments angles={} offsets={} pgroups={} latency_ms={:.3}",
        report.modified_angles, report.modified_offsets, report.parallel_groups, report.latency_ms
    );
    report
}

/// Propagates solver failures instead of recording them, for callers that
/// treat a failed pass as fatal.
pub fn try_regularize_segments(
    segments: &mut [Segment],
    groups: &[Vec<usize>],
    params: &RegularizationParams,
) -> Result<RegularizationReport, Error> {
    let report = regularize_segments(segments, groups, params);
    if report.angle_pass_failed || report.offset_pass_failed {
        return Err(Error::RegularizationFailed {
            reason: "a regularization pass did not converge".into(),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_a_no_op() {
        let mut segments: Vec<Segment> = Vec::new();
        let report = regularize_segments(&mut segments, &[], &RegularizationParams::default());
        assert_eq!(report.modified_angles, 0);
        assert_eq!(report.modified_offsets, 0);
        assert_eq!(report.parallel_groups, 0);
        assert!(!report.angle_pass_failed);
    }

    #[test]
    fn zero_groups_leave_segments_untouched() {
        let mut segments = vec![
            Segment::from_coords(0.0, 0.0, 10.0, 0.2),
            Segment::from_coords(0.0, 1.0, 10.0, 1.0),
        ];
        let before = segments.clone();
        let report = regularize_segments(&mut segments, &[], &RegularizationParams::default());
        assert_eq!(segments, before);
        assert_eq!(report.modified_angles, 0);
    }
}
