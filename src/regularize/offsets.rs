//! Offset regularization: align near-collinear segments within parallel
//! groups.

use std::collections::HashMap;

use log::debug;
use nalgebra::Vector2;

use super::model::RegularizationModel;
use crate::segments::Segment;

/// Perturbations below this are treated as zero (coordinate units).
const EPS_ZERO: f64 = 1e-9;
/// A segment counts as modified when its offset moved further than this.
const EPS_MODIFIED: f64 = 1e-7;
/// Upper limit on the post-solve cluster width (coordinate units).
const CLUSTER_TOL: f64 = 1e-4;

/// QP model that translates segments perpendicular to their (shared)
/// direction so near-equal offsets become exactly equal, each shift bounded
/// by `maximum_offset`.
#[derive(Clone, Debug)]
pub struct OffsetRegularization {
    bound: f64,
    groups: Vec<Vec<usize>>,
    variables: Vec<usize>,
    variable_of: HashMap<usize, usize>,
    original_offset: Vec<f64>,
    group_of: Vec<usize>,
    normals: Vec<Vector2<f64>>,
    modified: usize,
}

impl OffsetRegularization {
    /// `maximum_offset` is the hard perpendicular-shift bound; non-positive
    /// values mean "no deviation allowed".
    pub fn new(maximum_offset: f64) -> Self {
        Self {
            bound: maximum_offset.max(0.0),
            groups: Vec::new(),
            variables: Vec::new(),
            variable_of: HashMap::new(),
            original_offset: Vec::new(),
            group_of: Vec::new(),
            normals: Vec::new(),
            modified: 0,
        }
    }

    pub fn maximum_offset(&self) -> f64 {
        self.bound
    }

    /// Registers one parallel group. The group's reference normal is the
    /// longest member's; every member's offset is its midpoint projected on
    /// that normal. Singleton groups register a variable but can never
    /// produce a pairwise constraint.
    pub fn add_group(&mut self, segments: &[Segment], indices: &[usize]) {
        let mut members: Vec<usize> = Vec::new();
        for &i in indices {
            if i >= segments.len() || self.variable_of.contains_key(&i) || members.contains(&i) {
                continue;
            }
            members.push(i);
        }
        if members.is_empty() {
            return;
        }

        let longest = members
            .iter()
            .copied()
            .max_by(|&a, &b| {
                segments[a]
                    .length()
                    .partial_cmp(&segments[b].length())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap();
        let normal = segments[longest].normal();
        let group_id = self.groups.len();
        for &i in &members {
            self.variable_of.insert(i, self.variables.len());
            self.variables.push(i);
            self.original_offset.push(segments[i].offset_along(&normal));
            self.group_of.push(group_id);
        }
        self.normals.push(normal);
        self.groups.push(members);
    }
}

impl RegularizationModel for OffsetRegularization {
    fn variables(&self) -> &[usize] {
        &self.variables
    }

    fn variable_of(&self, segment: usize) -> Option<usize> {
        self.variable_of.get(&segment).copied()
    }

    fn bound(&self, _var: usize) -> f64 {
        self.bound
    }

    fn target(&self, var_i: usize, var_j: usize) -> Option<f64> {
        if self.group_of[var_i] != self.group_of[var_j] {
            return None;
        }
        let target = self.original_offset[var_j] - self.original_offset[var_i];
        if target.abs() < self.bound(var_i) + self.bound(var_j) {
            Some(target)
        } else {
            None
        }
    }

    fn update(&mut self, segments: &mut [Segment], solution: &[f64]) {
        let proposed: Vec<f64> = self
            .variables
            .iter()
            .enumerate()
            .map(|(var, _)| {
                let mut xi = solution[var];
                if xi.abs() <= EPS_ZERO {
                    xi = 0.0;
                }
                self.original_offset[var] + xi
            })
            .collect();

        self.modified = 0;
        let tol = self.bound.min(CLUSTER_TOL);
        for (group_id, group) in self.groups.iter().enumerate() {
            let normal = self.normals[group_id];
            let mut members: Vec<(usize, f64)> = group
                .iter()
                .map(|&i| (i, proposed[self.variable_of[&i]]))
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

            for cluster in clusters {
                let rep = cluster
                    .iter()
                    .max_by(|a, b| {
                        segments[a.0]
                            .length()
                            .partial_cmp(&segments[b.0].length())
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|&(_, offset)| offset)
                    .unwrap_or_default();
                for &(i, _) in &cluster {
                    let var = self.variable_of[&i];
                    // Snapping may not push a segment past its shift bound.
                    let mut offset = rep;
                    let shift = rep - self.original_offset[var];
                    if shift.abs() > self.bound {
                        offset = self.original_offset[var] + shift.clamp(-self.bound, self.bound);
                    }
                    let delta = offset - segments[i].offset_along(&normal);
                    if delta != 0.0 {
                        segments[i].translate_along(&normal, delta);
                    }
                    if (offset - self.original_offset[var]).abs() > EPS_MODIFIED {
                        self.modified += 1;
                    }
                }
            }
        }
        debug!(
            "OffsetRegularization::update variables={} modified={}",
            self.variables.len(),
            self.modified
        );
    }

    fn number_of_modified_segments(&self) -> usize {
        self.modified
    }
}
