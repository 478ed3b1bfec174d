//! Proximity graph over segments, restricted to same-group membership.
//!
//! Each registered group is triangulated independently: segment midpoints
//! feed a Delaunay triangulation and every triangulation edge becomes a
//! neighbor edge between the corresponding segments. Cross-group edges never
//! exist, so the graph has to be cleared and repopulated whenever the group
//! partition changes (the offset pass rebuilds it on parallel groups).

use std::collections::BTreeSet;

use delaunator::{triangulate, Point};
use log::debug;

use crate::segments::Segment;

/// Delaunay-based neighbor query.
#[derive(Clone, Debug, Default)]
pub struct NeighborQuery {
    edges: BTreeSet<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
}

impl NeighborQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group and extends the graph with its internal edges.
    ///
    /// Out-of-range and duplicate indices are ignored. Groups of size 0 or 1
    /// produce no edges. Collinear midpoints admit no triangles; the
    /// degenerate hull is chained instead so structural adjacency survives.
    pub fn add_group(&mut self, segments: &[Segment], indices: &[usize]) {
        let mut members: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < segments.len())
            .collect();
        members.sort_unstable();
        members.dedup();
        if members.len() < 2 {
            return;
        }

        let before = self.edges.len();
        if members.len() == 2 {
            self.insert_edge(members[0], members[1]);
        } else {
            let points: Vec<Point> = members
                .iter()
                .map(|&i| {
                    let m = segments[i].midpoint();
                    Point { x: m.x, y: m.y }
                })
                .collect();
            let triangulation = triangulate(&points);
            if triangulation.triangles.is_empty() {
                // Degenerate input: the hull is the ordered chain of points.
                for pair in triangulation.hull.windows(2) {
                    self.insert_edge(members[pair[0]], members[pair[1]]);
                }
            } else {
                for tri in triangulation.triangles.chunks_exact(3) {
                    self.insert_edge(members[tri[0]], members[tri[1]]);
                    self.insert_edge(members[tri[1]], members[tri[2]]);
                    self.insert_edge(members[tri[2]], members[tri[0]]);
                }
            }
        }
        debug!(
            "NeighborQuery::add_group members={} new_edges={}",
            members.len(),
            self.edges.len() - before
        );
        self.rebuild_adjacency(segments.len());
    }

    /// Drops all groups and edges.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.adjacency.clear();
    }

    /// Neighbor indices of segment `i`, ascending.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.adjacency.get(i).map_or(&[], Vec::as_slice)
    }

    /// All undirected edges as `(low, high)` pairs, ascending.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().copied()
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    fn insert_edge(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let edge = if a < b { (a, b) } else { (b, a) };
        self.edges.insert(edge);
    }

    fn rebuild_adjacency(&mut self, len: usize) {
        self.adjacency.clear();
        self.adjacency.resize(len, Vec::new());
        for &(a, b) in &self.edges {
            self.adjacency[a].push(b);
            self.adjacency[b].push(a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::Segment;

    fn grid_segments() -> Vec<Segment> {
        vec![
            Segment::from_coords(0.0, 0.0, 1.0, 0.0),
            Segment::from_coords(0.0, 1.0, 1.0, 1.0),
            Segment::from_coords(0.0, 2.0, 1.0, 2.2),
            Segment::from_coords(5.0, 0.0, 6.0, 0.0),
            Segment::from_coords(5.0, 1.0, 6.0, 1.0),
        ]
    }

    #[test]
    fn empty_and_singleton_groups_produce_no_edges() {
        let segments = grid_segments();
        let mut nq = NeighborQuery::new();
        nq.add_group(&segments, &[]);
        nq.add_group(&segments, &[2]);
        assert_eq!(nq.number_of_edges(), 0);
        assert!(nq.neighbors(2).is_empty());
    }

    #[test]
    fn edges_stay_within_groups() {
        let segments = grid_segments();
        let mut nq = NeighborQuery::new();
        nq.add_group(&segments, &[0, 1, 2]);
        nq.add_group(&segments, &[3, 4]);
        for (a, b) in nq.edges() {
            let same_side = (a <= 2) == (b <= 2);
            assert!(same_side, "edge ({a}, {b}) crosses groups");
        }
        assert!(nq.neighbors(0).contains(&1));
        assert!(nq.neighbors(3).contains(&4));
    }

    #[test]
    fn collinear_midpoints_fall_back_to_chain() {
        // Midpoints all on the y-axis: no Delaunay triangle exists.
        let segments = vec![
            Segment::from_coords(-1.0, 0.0, 1.0, 0.0),
            Segment::from_coords(-1.0, 1.0, 1.0, 1.0),
            Segment::from_coords(-1.0, 2.0, 1.0, 2.0),
        ];
        let mut nq = NeighborQuery::new();
        nq.add_group(&segments, &[0, 1, 2]);
        assert!(nq.number_of_edges() >= 2);
        assert!(!nq.neighbors(1).is_empty());
    }

    #[test]
    fn out_of_range_and_duplicate_indices_are_ignored() {
        let segments = grid_segments();
        let mut nq = NeighborQuery::new();
        nq.add_group(&segments, &[0, 0, 1, 99]);
        assert_eq!(nq.number_of_edges(), 1);
        assert_eq!(nq.neighbors(0), &[1]);
    }

    #[test]
    fn clear_drops_everything() {
        let segments = grid_segments();
        let mut nq = NeighborQuery::new();
        nq.add_group(&segments, &[0, 1, 2]);
        assert!(nq.number_of_edges() > 0);
        nq.clear();
        assert_eq!(nq.number_of_edges(), 0);
        assert!(nq.neighbors(0).is_empty());
    }
}
