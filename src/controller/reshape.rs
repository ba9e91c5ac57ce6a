//! Deadzone and gate-radius shaping for spatial input groups.
//!
//! Raw 2D/3D input is clamped to a calibrated gate radius; magnitudes below
//! the deadzone collapse to zero and magnitudes above are rescaled so the
//! deadzone boundary maps to zero and the gate boundary maps to full scale.

use crate::controller::reference::ControlState;

/// Shaping parameters, usually read from a group's numeric settings.
#[derive(Clone, Copy, Debug)]
pub struct InputShape {
    deadzone: f64,
    gate_radius: f64,
}

impl InputShape {
    pub fn new(deadzone: f64, gate_radius: f64) -> Self {
        let gate_radius = gate_radius.clamp(0.01, 1.0);
        Self {
            deadzone: deadzone.clamp(0.0, gate_radius),
            gate_radius,
        }
    }

    pub fn deadzone(&self) -> f64 {
        self.deadzone
    }

    pub fn gate_radius(&self) -> f64 {
        self.gate_radius
    }

    /// Scale factor applied to a raw vector of the given magnitude.
    fn scale_for(&self, magnitude: f64) -> f64 {
        if magnitude <= self.deadzone || magnitude == 0.0 {
            return 0.0;
        }
        let clamped = magnitude.min(self.gate_radius);
        let span = (self.gate_radius - self.deadzone).max(f64::EPSILON);
        let shaped = (clamped - self.deadzone) / span * self.gate_radius;
        shaped / magnitude
    }

    pub fn shape_2d(&self, x: ControlState, y: ControlState) -> (ControlState, ControlState) {
        let scale = self.scale_for(x.hypot(y));
        (x * scale, y * scale)
    }

    pub fn shape_3d(
        &self,
        x: ControlState,
        y: ControlState,
        z: ControlState,
    ) -> (ControlState, ControlState, ControlState) {
        let scale = self.scale_for((x * x + y * y + z * z).sqrt());
        (x * scale, y * scale, z * scale)
    }
}

impl Default for InputShape {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magnitude_2d(v: (f64, f64)) -> f64 {
        v.0.hypot(v.1)
    }

    #[test]
    fn inside_deadzone_collapses_to_zero() {
        let shape = InputShape::new(0.2, 1.0);
        assert_eq!(shape.shape_2d(0.1, 0.1), (0.0, 0.0));
        assert_eq!(shape.shape_2d(0.0, 0.2), (0.0, 0.0));
        assert_eq!(shape.shape_3d(0.1, 0.0, 0.1), (0.0, 0.0, 0.0));
    }

    #[test]
    fn magnitude_never_exceeds_gate_radius() {
        let shape = InputShape::new(0.1, 0.8);
        for &(x, y) in &[(1.0, 1.0), (-1.0, 0.5), (0.0, -1.0), (0.9, -0.9)] {
            let shaped = shape.shape_2d(x, y);
            assert!(magnitude_2d(shaped) <= 0.8 + 1e-9, "{:?} -> {:?}", (x, y), shaped);
        }
    }

    #[test]
    fn deadzone_and_gate_boundaries_map_to_extremes() {
        let shape = InputShape::new(0.25, 1.0);
        // Just past the deadzone: nearly zero.
        let near = shape.shape_2d(0.2500001, 0.0);
        assert!(magnitude_2d(near) < 1e-3);
        // At the gate: full scale.
        let full = shape.shape_2d(1.0, 0.0);
        assert!((magnitude_2d(full) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shaping_preserves_direction() {
        let shape = InputShape::new(0.1, 1.0);
        let (x, y) = shape.shape_2d(0.6, 0.3);
        assert!((y / x - 0.5).abs() < 1e-9);
        assert!(x > 0.0 && y > 0.0);
    }

    #[test]
    fn identity_shape_passes_unit_input_through() {
        let shape = InputShape::default();
        let (x, y) = shape.shape_2d(1.0, 0.0);
        assert!((x - 1.0).abs() < 1e-9);
        assert_eq!(y, 0.0);
    }
}
