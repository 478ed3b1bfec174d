//! Interface to the upstream shape-detection stage.
//!
//! The detector itself (a randomized robust-fitting pipeline over a point
//! cloud with normals) is an external collaborator; the core only consumes
//! its typed results. Shapes form a closed sum type with a per-variant
//! parameter set and a shared capability: assigned point indices and
//! distance from a point to the shape surface.

pub mod io;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A 3D sample with an oriented normal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointWithNormal {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

/// Knobs of the detection stage, mirrored from its reference configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct DetectionParameters {
    /// Probability to miss the largest primitive at each iteration.
    pub probability: f64,
    /// Minimum number of points a detected primitive must cover.
    pub min_points: usize,
    /// Maximum surface distance for a point to count as assigned.
    pub epsilon: f64,
    /// Maximum gap between points of the same connected component.
    pub cluster_epsilon: f64,
    /// Minimum dot product between point and shape normal.
    pub normal_threshold: f64,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            probability: 0.05,
            min_points: 200,
            epsilon: 0.002,
            cluster_epsilon: 0.01,
            normal_threshold: 0.9,
        }
    }
}

/// Closed set of primitive shapes a detector may report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Shape {
    /// Plane `normal . p + d = 0` with a unit normal.
    Plane { normal: Vector3<f64>, d: f64 },
    Sphere {
        center: Point3<f64>,
        radius: f64,
    },
    /// Infinite right cylinder around the axis through `axis_point`.
    Cylinder {
        axis_point: Point3<f64>,
        axis_dir: Vector3<f64>,
        radius: f64,
    },
    /// Right circular cone; `half_angle` in radians.
    Cone {
        apex: Point3<f64>,
        axis_dir: Vector3<f64>,
        half_angle: f64,
    },
    Torus {
        center: Point3<f64>,
        axis_dir: Vector3<f64>,
        major_radius: f64,
        minor_radius: f64,
    },
    /// Primitive the caller does not model further.
    Other { description: String },
}

impl Shape {
    /// Discriminant name, stable across parameter changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Plane { .. } => "Plane",
            Self::Sphere { .. } => "Sphere",
            Self::Cylinder { .. } => "Cylinder",
            Self::Cone { .. } => "Cone",
            Self::Torus { .. } => "Torus",
            Self::Other { .. } => "Other",
        }
    }

    /// Unsigned distance from `p` to the shape surface; `None` for shapes
    /// without a parametric surface model.
    pub fn distance(&self, p: &Point3<f64>) -> Option<f64> {
        match self {
            Self::Plane { normal, d } => Some((normal.dot(&p.coords) + d).abs()),
            Self::Sphere { center, radius } => Some(((p - center).norm() - radius).abs()),
            Self::Cylinder {
                axis_point,
                axis_dir,
                radius,
            } => {
                let v = p - axis_point;
                let along = v.dot(axis_dir);
                let radial = (v - axis_dir * along).norm();
                Some((radial - radius).abs())
            }
            Self::Cone {
                apex,
                axis_dir,
                half_angle,
            } => {
                let v = p - apex;
                let along = v.dot(axis_dir);
                let radial = (v - axis_dir * along).norm();
                Some((radial * half_angle.cos() - along * half_angle.sin()).abs())
            }
            Self::Torus {
                center,
                axis_dir,
                major_radius,
                minor_radius,
            } => {
                let v = p - center;
                let along = v.dot(axis_dir);
                let radial = (v - axis_dir * along).norm();
                let ring = ((radial - major_radius).powi(2) + along * along).sqrt();
                Some((ring - minor_radius).abs())
            }
            Self::Other { .. } => None,
        }
    }

    /// Human-readable parameter summary, one field per shape family.
    pub fn parameters_string(&self) -> String {
        match self {
            Self::Plane { normal, d } => {
                format!("normal: {} {} {} d: {}", normal.x, normal.y, normal.z, d)
            }
            Self::Sphere { center, radius } => {
                format!(
                    "center: {} {} {} radius: {}",
                    center.x, center.y, center.z, radius
                )
            }
            Self::Cylinder {
                axis_point,
                axis_dir,
                radius,
            } => format!(
                "axis: {} {} {} -> {} {} {} radius: {}",
                axis_point.x, axis_point.y, axis_point.z, axis_dir.x, axis_dir.y, axis_dir.z, radius
            ),
            Self::Cone {
                apex,
                axis_dir,
                half_angle,
            } => format!(
                "apex: {} {} {} axis: {} {} {} half-angle: {}",
                apex.x, apex.y, apex.z, axis_dir.x, axis_dir.y, axis_dir.z, half_angle
            ),
            Self::Torus {
                center,
                axis_dir,
                major_radius,
                minor_radius,
            } => format!(
                "center: {} {} {} axis: {} {} {} radii: {} {}",
                center.x,
                center.y,
                center.z,
                axis_dir.x,
                axis_dir.y,
                axis_dir.z,
                major_radius,
                minor_radius
            ),
            Self::Other { description } => description.clone(),
        }
    }
}

/// One detected primitive together with the input points assigned to it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectedShape {
    pub shape: Shape,
    /// Indices into the detector's input cloud.
    pub assigned_points: Vec<usize>,
}

impl DetectedShape {
    /// Mean surface distance over the assigned points; `None` when the shape
    /// has no surface model or no points are assigned.
    pub fn average_distance(&self, points: &[PointWithNormal]) -> Option<f64> {
        if self.assigned_points.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &idx in &self.assigned_points {
            sum += self.shape.distance(&points.get(idx)?.position)?;
        }
        Some(sum / self.assigned_points.len() as f64)
    }
}

/// Capability boundary of the upstream detector.
pub trait ShapeDetection {
    fn set_input(&mut self, points: Vec<PointWithNormal>);
    fn detect(&mut self, parameters: &DetectionParameters) -> Result<(), Error>;
    fn shapes(&self) -> &[DetectedShape];
    fn number_of_unassigned_points(&self) -> usize;
}
