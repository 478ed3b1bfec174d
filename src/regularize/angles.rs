//! Angle regularization: align near-parallel / near-perpendicular pairs.

use std::collections::HashMap;

use log::debug;

use super::model::RegularizationModel;
use crate::angle::{
    angular_difference_180, nearest_multiple_of_90, normalize_180, signed_angular_difference_180,
};
use crate::segments::Segment;

/// Perturbations below this are treated as zero (degrees).
const EPS_ZERO_DEG: f64 = 1e-7;
/// A segment counts as modified when its orientation moved further than this.
const EPS_MODIFIED_DEG: f64 = 1e-6;
/// Upper limit on the post-solve cluster width (degrees).
const CLUSTER_TOL_DEG: f64 = 1e-2;
/// Orientation match used when deriving parallel groups (degrees).
const PARALLEL_EPS_DEG: f64 = 1e-6;

/// QP model that rotates segments so near-equal pairwise angular relations
/// (parallel or perpendicular) become exact, each rotation bounded by
/// `maximum_angle` degrees.
#[derive(Clone, Debug)]
pub struct AngleRegularization {
    bound_deg: f64,
    groups: Vec<Vec<usize>>,
    variables: Vec<usize>,
    variable_of: HashMap<usize, usize>,
    original_deg: Vec<f64>,
    modified: usize,
}

impl AngleRegularization {
    /// `maximum_angle_deg` is the hard rotation bound; non-positive values
    /// mean "no deviation allowed".
    pub fn new(maximum_angle_deg: f64) -> Self {
        Self {
            bound_deg: maximum_angle_deg.max(0.0),
            groups: Vec::new(),
            variables: Vec::new(),
            variable_of: HashMap::new(),
            original_deg: Vec::new(),
            modified: 0,
        }
    }

    pub fn maximum_angle_deg(&self) -> f64 {
        self.bound_deg
    }

    /// Registers a group of segments for angle regularization, recording
    /// their original orientations. Out-of-range, duplicate and
    /// already-registered indices are ignored.
    pub fn add_group(&mut self, segments: &[Segment], indices: &[usize]) {
        let mut group = Vec::new();
        for &i in indices {
            if i >= segments.len() || self.variable_of.contains_key(&i) {
                continue;
            }
            self.variable_of.insert(i, self.variables.len());
            self.variables.push(i);
            self.original_deg.push(segments[i].orientation_deg());
            group.push(i);
        }
        if !group.is_empty() {
            self.groups.push(group);
        }
    }

    /// Partitions all registered segments into classes of identical current
    /// orientation (mod 180), each class ordered by segment index, emitted in
    /// discovery order. Pure read over current segment state.
    pub fn parallel_groups(&self, segments: &[Segment], out: &mut Vec<Vec<usize>>) {
        let mut classes: Vec<(f64, Vec<usize>)> = Vec::new();
        let mut indices: Vec<usize> = self.variables.clone();
        indices.sort_unstable();
        for i in indices {
            let theta = segments[i].orientation_deg();
            match classes
                .iter_mut()
                .find(|(rep, _)| angular_difference_180(*rep, theta) <= PARALLEL_EPS_DEG)
            {
                Some((_, members)) => members.push(i),
                None => classes.push((theta, vec![i])),
            }
        }
        out.extend(classes.into_iter().map(|(_, members)| members));
    }
}

impl RegularizationModel for AngleRegularization {
    fn variables(&self) -> &[usize] {
        &self.variables
    }

    fn variable_of(&self, segment: usize) -> Option<usize> {
        self.variable_of.get(&segment).copied()
    }

    fn bound(&self, _var: usize) -> f64 {
        self.bound_deg
    }

    fn target(&self, var_i: usize, var_j: usize) -> Option<f64> {
        let delta = self.original_deg[var_i] - self.original_deg[var_j];
        let target = nearest_multiple_of_90(delta) - delta;
        if target.abs() < self.bound(var_i) + self.bound(var_j) {
            Some(target)
        } else {
            None
        }
    }

    fn update(&mut self, segments: &mut [Segment], solution: &[f64]) {
        // Proposed orientation per variable, solver noise squashed.
        let proposed: Vec<f64> = self
            .variables
            .iter()
            .enumerate()
            .map(|(var, _)| {
                let mut xi = solution[var];
                if xi.abs() <= EPS_ZERO_DEG {
                    xi = 0.0;
                }
                normalize_180(self.original_deg[var] + xi)
            })
            .collect();

        self.modified = 0;
        let tol = self.bound_deg.min(CLUSTER_TOL_DEG);
        for group in &self.groups {
            for cluster in cluster_angles(group, &self.variable_of, &proposed, tol) {
                // Snap the whole cluster to the longest member's orientation.
                let rep = cluster
                    .iter()
                    .max_by(|a, b| {
                        segments[a.0]
                            .length()
                            .partial_cmp(&segments[b.0].length())
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|&(_, theta)| normalize_180(theta))
                    .unwrap_or_default();
                for &(i, _) in &cluster {
                    let var = self.variable_of[&i];
                    // Snapping may not push a segment past its rotation bound.
                    let mut theta = rep;
                    let rotation = signed_angular_difference_180(rep, self.original_deg[var]);
                    if rotation.abs() > self.bound_deg {
                        theta = normalize_180(
                            self.original_deg[var]
                                + rotation.clamp(-self.bound_deg, self.bound_deg),
                        );
                    }
                    if angular_difference_180(segments[i].orientation_deg(), theta) > 0.0 {
                        segments[i].rotate_to(theta);
                    }
                    if angular_difference_180(theta, self.original_deg[var]) > EPS_MODIFIED_DEG {
                        self.modified += 1;
                    }
                }
            }
        }
        debug!(
            "AngleRegularization::update variables={} modified={}",
            self.variables.len(),
            self.modified
        );
    }

    fn number_of_modified_segments(&self) -> usize {
        self.modified
    }
}

/// Clusters a group's proposed orientations: sort, merge gaps <= `tol`, and
/// honor the wraparound between angles near 0 and near 180. Returns clusters
/// of `(segment_index, proposed_theta)`; thetas in a wrapped cluster may be
/// shifted by -180 so they compare linearly.
fn cluster_angles(
    group: &[usize],
    variable_of: &HashMap<usize, usize>,
    proposed: &[f64],
    tol: f64,
) -> Vec<Vec<(usize, f64)>> {
    let mut members: Vec<(usize, f64)> = group
        .iter()
        .map(|&i| (i, proposed[variable_of[&i]]))
        .collect();
    members.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut clusters: Vec<Vec<(usize, f64)>> = Vec::new();
    for member in members {
        let extends = clusters
            .last()
            .and_then(|cluster| cluster.last())
            .is_some_and(|&(_, prev)| member.1 - prev <= tol);
        if extends {
            clusters.last_mut().unwrap().push(member);
        } else {
            clusters.push(vec![member]);
        }
    }
    // 179.99x and 0.00y describe nearly the same direction.
    if clusters.len() > 1 {
        let first_min = clusters.first().unwrap().first().unwrap().1;
        let last_max = clusters.last().unwrap().last().unwrap().1;
        if first_min + 180.0 - last_max <= tol {
            let mut wrapped = clusters.pop().unwrap();
            for entry in &mut wrapped {
                entry.1 -= 180.0;
            }
            wrapped.extend(clusters[0].drain(..));
            clusters[0] = wrapped;
        }
    }
    clusters
}
