#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod error;
pub mod neighbors;
pub mod regularize;
pub mod segments;
pub mod shape;

// “Expert” modules – still public, but considered unstable internals.
pub mod angle;

// --- High-level re-exports -------------------------------------------------

// Main entry points: the two-pass pipeline + its report.
pub use crate::regularize::{regularize_segments, RegularizationParams, RegularizationReport};

// Building blocks for callers that drive the passes themselves.
pub use crate::neighbors::NeighborQuery;
pub use crate::regularize::{
    AngleRegularization, ClarabelSolver, OffsetRegularization, QpRegularizer, QpSolver,
};
pub use crate::segments::Segment;

pub use crate::error::Error;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```
/// use shape_regularization::prelude::*;
///
/// let mut segments = vec![
///     Segment::from_coords(0.0, 0.0, 10.0, 0.2),
///     Segment::from_coords(0.0, 1.0, 10.0, 1.0),
/// ];
/// let params = RegularizationParams {
///     maximum_angle_deg: 10.0,
///     maximum_offset: 0.5,
/// };
/// let report = regularize_segments(&mut segments, &[vec![0, 1]], &params);
/// println!("modified={} latency_ms={:.3}", report.modified_angles, report.latency_ms);
/// ```
pub mod prelude {
    pub use crate::regularize::{regularize_segments, RegularizationParams};
    pub use crate::segments::Segment;
}
