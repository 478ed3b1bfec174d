use serde::Deserialize;

/// Tolerances for one full angle + offset regularization run.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct RegularizationParams {
    /// Hard bound on how far a segment may rotate, in degrees.
    /// Non-positive means "no rotation allowed".
    pub maximum_angle_deg: f64,
    /// Hard bound on the perpendicular shift, in coordinate units.
    /// Non-positive means "no shift allowed".
    pub maximum_offset: f64,
}

impl Default for RegularizationParams {
    fn default() -> Self {
        Self {
            maximum_angle_deg: 25.0,
            maximum_offset: 0.5,
        }
    }
}
