use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::angle::normalize_180;

/// 2D line segment with an ordered source/target pair.
///
/// Segments are mutated in place by regularization: the angle pass rotates a
/// segment about its midpoint, the offset pass translates it along its
/// normal. Derived quantities are therefore computed on demand instead of
/// being cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub source: Point2<f64>,
    pub target: Point2<f64>,
}

impl Segment {
    pub fn new(source: Point2<f64>, target: Point2<f64>) -> Self {
        Self { source, target }
    }

    /// Convenience constructor from raw coordinates.
    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point2::new(x1, y1), Point2::new(x2, y2))
    }

    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.source, &self.target)
    }

    pub fn length(&self) -> f64 {
        (self.target - self.source).norm()
    }

    /// Unit direction from source to target; zero for degenerate segments.
    pub fn direction(&self) -> Vector2<f64> {
        let d = self.target - self.source;
        let len = d.norm();
        if len > 0.0 {
            d / len
        } else {
            Vector2::zeros()
        }
    }

    /// Orientation in degrees, folded into [0, 180).
    pub fn orientation_deg(&self) -> f64 {
        let d = self.target - self.source;
        normalize_180(d.y.atan2(d.x).to_degrees())
    }

    /// Unit normal, the direction rotated by +90 degrees.
    pub fn normal(&self) -> Vector2<f64> {
        let d = self.direction();
        Vector2::new(-d.y, d.x)
    }

    /// Signed perpendicular offset of the midpoint along `normal`.
    pub fn offset_along(&self, normal: &Vector2<f64>) -> f64 {
        self.midpoint().coords.dot(normal)
    }

    /// Rotates the segment about its midpoint so that its orientation equals
    /// `theta_deg` exactly. Length and midpoint are preserved; the sign of
    /// the source->target direction is kept so the segment does not flip.
    pub fn rotate_to(&mut self, theta_deg: f64) {
        let mid = self.midpoint();
        let half = 0.5 * self.length();
        let theta = theta_deg.to_radians();
        let mut dir = Vector2::new(theta.cos(), theta.sin());
        if dir.dot(&self.direction()) < 0.0 {
            dir = -dir;
        }
        self.source = mid - dir * half;
        self.target = mid + dir * half;
    }

    /// Translates the segment by `delta` along `normal`, preserving
    /// orientation and length.
    pub fn translate_along(&mut self, normal: &Vector2<f64>, delta: f64) {
        let shift = normal * delta;
        self.source += shift;
        self.target += shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn derived_quantities() {
        let seg = Segment::from_coords(0.0, 0.0, 4.0, 0.0);
        assert!(approx_eq(seg.length(), 4.0));
        assert!(approx_eq(seg.orientation_deg(), 0.0));
        assert!(approx_eq(seg.midpoint().x, 2.0));
        assert!(approx_eq(seg.normal().y, 1.0));
    }

    #[test]
    fn orientation_folds_reversed_segments() {
        let ab = Segment::from_coords(0.0, 0.0, 1.0, 2.0);
        let ba = Segment::from_coords(1.0, 2.0, 0.0, 0.0);
        assert!(approx_eq(ab.orientation_deg(), ba.orientation_deg()));
    }

    #[test]
    fn rotate_to_sets_exact_orientation() {
        let mut seg = Segment::from_coords(0.0, 0.0, 10.0, 0.2);
        let mid = seg.midpoint();
        let len = seg.length();
        seg.rotate_to(0.0);
        assert_eq!(seg.orientation_deg(), 0.0);
        assert!(approx_eq(seg.length(), len));
        assert!(approx_eq(seg.midpoint().x, mid.x));
        assert!(approx_eq(seg.midpoint().y, mid.y));
        // source stays on the left: direction sign preserved
        assert!(seg.source.x < seg.target.x);
    }

    #[test]
    fn rotate_to_keeps_direction_sign() {
        let mut seg = Segment::from_coords(10.0, 0.2, 0.0, 0.0);
        seg.rotate_to(0.0);
        assert!(seg.source.x > seg.target.x);
    }

    #[test]
    fn translate_along_moves_offset_only() {
        let mut seg = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let normal = seg.normal();
        let before = seg.orientation_deg();
        seg.translate_along(&normal, 2.5);
        assert!(approx_eq(seg.offset_along(&normal), 2.5));
        assert!(approx_eq(seg.orientation_deg(), before));
        assert!(approx_eq(seg.length(), 10.0));
    }
}
