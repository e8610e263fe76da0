//! Anchor points: attachment positions for infill rods on the frame.

use serde::{Deserialize, Serialize};

use super::Point;

/// A potential attachment location on a frame rod.
///
/// Generators assign layers and mark anchors as used while placing rods;
/// the edit session flips `used` when rods are reconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub position: Point,
    /// Index of the frame rod this anchor sits on.
    pub frame_segment_index: usize,
    pub is_vertical_segment: bool,
    /// Angle of the frame rod from vertical, used for cut angles.
    #[serde(default)]
    pub frame_segment_angle_deg: f64,
    /// Assigned layer (1-based), `None` before distribution.
    #[serde(default)]
    pub layer: Option<u32>,
    #[serde(default)]
    pub used: bool,
}

impl AnchorPoint {
    pub fn new(position: Point, frame_segment_index: usize, is_vertical_segment: bool) -> Self {
        Self {
            position,
            frame_segment_index,
            is_vertical_segment,
            frame_segment_angle_deg: 0.0,
            layer: None,
            used: false,
        }
    }

    pub fn with_segment_angle(mut self, angle_deg: f64) -> Self {
        self.frame_segment_angle_deg = angle_deg;
        self
    }
}
