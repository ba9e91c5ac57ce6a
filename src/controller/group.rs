//! Control groups: typed clusters of controls implementing one input
//! abstraction each, with per-variant state derivation.
//!
//! Control count and order inside a group are fixed by the protocol the group
//! represents; reordering breaks downstream frame encoding. Derivation never
//! consults the enable flag; enable policy belongs to the caller.

use crate::controller::control::{Control, NumericSetting};
use crate::controller::reference::{ControlState, InputSource, Polarity};
use crate::controller::reshape::InputShape;
use tracing::debug;

/// Reference state above which a digital control counts as pressed.
pub const ACTIVATION_THRESHOLD: ControlState = 0.5;

pub const SETTING_DEADZONE: &str = "Dead Zone";
pub const SETTING_GATE_RADIUS: &str = "Gate Radius";
pub const SETTING_THRESHOLD: &str = "Threshold";
pub const SETTING_VERTICAL_OFFSET: &str = "Vertical Offset";
pub const SETTING_MAX_ANGLE: &str = "Maximum Angle";
pub const SETTING_INTENSITY: &str = "Intensity";

/// Variant tag selecting a group's state-derivation algorithm. Fixed at
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    Buttons,
    AnalogStick,
    MixedTriggers,
    Cursor,
    Tilt,
    Force,
    Shake,
    ImuAccelerometer,
    ImuGyroscope,
}

/// Calibrated 2D output of a spatial group.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StickState {
    pub x: ControlState,
    pub y: ControlState,
}

/// Calibrated 3D output of a motion group.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionState {
    pub x: ControlState,
    pub y: ControlState,
    pub z: ControlState,
}

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("group '{group}' is a {actual:?} group, expected {expected:?}")]
    WrongVariant {
        group: String,
        expected: GroupKind,
        actual: GroupKind,
    },

    #[error("bit table for group '{group}' has {got} entries, expected {expected}")]
    BitTableMismatch {
        group: String,
        expected: usize,
        got: usize,
    },

    #[error("analog buffer for group '{group}' has {got} slots, expected {expected}")]
    AnalogBufferMismatch {
        group: String,
        expected: usize,
        got: usize,
    },
}

/// An ordered collection of controls and numeric settings with a fixed
/// derivation variant and a mutable enable flag.
#[derive(Clone, Debug)]
pub struct ControlGroup {
    name: String,
    kind: GroupKind,
    controls: Vec<Control>,
    settings: Vec<NumericSetting>,
    enabled: bool,
}

impl ControlGroup {
    fn empty(name: &str, kind: GroupKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            controls: Vec::new(),
            settings: Vec::new(),
            enabled: true,
        }
    }

    fn with_controls(name: &str, kind: GroupKind, control_names: &[&str]) -> Self {
        let mut group = Self::empty(name, kind);
        for control_name in control_names {
            group
                .controls
                .push(Control::new(*control_name, true, Polarity::Unipolar));
        }
        group
    }

    /// Digital button cluster. One control per protocol bit, in bit order.
    pub fn buttons(name: &str, control_names: &[&str]) -> Self {
        Self::with_controls(name, GroupKind::Buttons, control_names)
    }

    /// Four-directional analog stick with deadzone and gate-radius shaping.
    pub fn analog_stick(name: &str) -> Self {
        let mut group =
            Self::with_controls(name, GroupKind::AnalogStick, &["Up", "Down", "Left", "Right"]);
        group
            .settings
            .push(NumericSetting::float(SETTING_DEADZONE, 0.0, 0.0, 0.5));
        group
            .settings
            .push(NumericSetting::float(SETTING_GATE_RADIUS, 1.0, 0.5, 1.0));
        group
    }

    /// N triggers, each with a digital and an analog half. The digital halves
    /// come first, then the analog halves, both in trigger order.
    pub fn mixed_triggers(name: &str, trigger_names: &[&str]) -> Self {
        let mut group = Self::empty(name, GroupKind::MixedTriggers);
        for trigger_name in trigger_names {
            group
                .controls
                .push(Control::new(*trigger_name, true, Polarity::Unipolar));
        }
        for trigger_name in trigger_names {
            group.controls.push(Control::new(
                format!("{trigger_name}-Analog"),
                false,
                Polarity::Unipolar,
            ));
        }
        group
            .settings
            .push(NumericSetting::float(SETTING_THRESHOLD, 0.9, 0.0, 1.0));
        group
    }

    /// Pointing cursor: shaped plane plus a vertical offset.
    pub fn cursor(name: &str) -> Self {
        let mut group =
            Self::with_controls(name, GroupKind::Cursor, &["Up", "Down", "Left", "Right"]);
        group
            .settings
            .push(NumericSetting::float(SETTING_DEADZONE, 0.0, 0.0, 0.5));
        group
            .settings
            .push(NumericSetting::float(SETTING_GATE_RADIUS, 1.0, 0.5, 1.0));
        group
            .settings
            .push(NumericSetting::float(SETTING_VERTICAL_OFFSET, 0.0, -1.0, 1.0));
        group
    }

    /// Orientation tilt: shaped plane scaled by the maximum tilt angle.
    pub fn tilt(name: &str) -> Self {
        let mut group = Self::with_controls(
            name,
            GroupKind::Tilt,
            &["Forward", "Backward", "Left", "Right"],
        );
        group
            .settings
            .push(NumericSetting::float(SETTING_DEADZONE, 0.0, 0.0, 0.5));
        group
            .settings
            .push(NumericSetting::float(SETTING_GATE_RADIUS, 1.0, 0.5, 1.0));
        group
            .settings
            .push(NumericSetting::float(SETTING_MAX_ANGLE, 90.0, 0.0, 180.0));
        group
    }

    /// Linear swing force on three axes with a 3D deadzone.
    pub fn force(name: &str) -> Self {
        let mut group = Self::with_controls(
            name,
            GroupKind::Force,
            &["Up", "Down", "Left", "Right", "Forward", "Backward"],
        );
        group
            .settings
            .push(NumericSetting::float(SETTING_DEADZONE, 0.0, 0.0, 0.5));
        group
    }

    /// Per-axis shake trigger with a configurable intensity.
    pub fn shake(name: &str) -> Self {
        let mut group = Self::with_controls(name, GroupKind::Shake, &["X", "Y", "Z"]);
        group
            .settings
            .push(NumericSetting::float(SETTING_INTENSITY, 0.5, 0.0, 1.0));
        group
    }

    /// Six directional controls combined as three differential axes.
    pub fn imu_accelerometer(name: &str) -> Self {
        Self::with_controls(
            name,
            GroupKind::ImuAccelerometer,
            &["Left", "Right", "Forward", "Backward", "Up", "Down"],
        )
    }

    /// Six rotational controls combined as three differential axes.
    pub fn imu_gyroscope(name: &str) -> Self {
        Self::with_controls(
            name,
            GroupKind::ImuGyroscope,
            &[
                "Pitch Up",
                "Pitch Down",
                "Roll Left",
                "Roll Right",
                "Yaw Left",
                "Yaw Right",
            ],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!("Group '{}' enabled flag set to {}", self.name, enabled);
        }
        self.enabled = enabled;
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut [Control] {
        &mut self.controls
    }

    pub fn settings(&self) -> &[NumericSetting] {
        &self.settings
    }

    pub fn setting(&self, name: &str) -> Option<&NumericSetting> {
        self.settings.iter().find(|setting| setting.name() == name)
    }

    pub fn setting_mut(&mut self, name: &str) -> Option<&mut NumericSetting> {
        self.settings
            .iter_mut()
            .find(|setting| setting.name() == name)
    }

    /// Refresh every control reference from the device backend.
    pub fn update_references(&mut self, source: &dyn InputSource) {
        for control in &mut self.controls {
            control.reference_mut().update(source);
        }
    }

    fn expect_kind(&self, expected: GroupKind) -> Result<(), GroupError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(GroupError::WrongVariant {
                group: self.name.clone(),
                expected,
                actual: self.kind,
            })
        }
    }

    fn setting_value(&self, name: &str, fallback: f64) -> f64 {
        self.setting(name)
            .map(NumericSetting::value)
            .unwrap_or(fallback)
    }

    fn shape(&self) -> InputShape {
        InputShape::new(
            self.setting_value(SETTING_DEADZONE, 0.0),
            self.setting_value(SETTING_GATE_RADIUS, 1.0),
        )
    }

    /// Differential axis from an opposing control pair.
    fn pair(&self, positive: usize, negative: usize) -> ControlState {
        self.controls[positive].state() - self.controls[negative].state()
    }

    /// OR one caller-supplied bit per pressed control into `mask`.
    ///
    /// OR-only: bits already set by sibling groups sharing the mask are never
    /// cleared; callers pre-zero the mask when they want a fresh one.
    pub fn button_mask(&self, mask: &mut u16, bit_table: &[u16]) -> Result<(), GroupError> {
        self.expect_kind(GroupKind::Buttons)?;
        if bit_table.len() != self.controls.len() {
            return Err(GroupError::BitTableMismatch {
                group: self.name.clone(),
                expected: self.controls.len(),
                got: bit_table.len(),
            });
        }
        for (control, bit) in self.controls.iter().zip(bit_table) {
            if control.state() > ACTIVATION_THRESHOLD {
                *mask |= bit;
            }
        }
        Ok(())
    }

    /// Shaped stick vector; x grows rightward, y grows upward.
    pub fn stick_state(&self) -> Result<StickState, GroupError> {
        self.expect_kind(GroupKind::AnalogStick)?;
        let (x, y) = self.shape().shape_2d(self.pair(3, 2), self.pair(0, 1));
        Ok(StickState { x, y })
    }

    /// Digital bits plus analog values for every trigger.
    ///
    /// The analog reference owns the analog channel whenever it is bound; a
    /// digital-only trigger saturates the channel to 1.0 while pressed. The
    /// bit is driven by the digital reference or by the analog channel
    /// crossing the threshold setting.
    pub fn triggers_state(
        &self,
        mask: &mut u16,
        bit_table: &[u16],
        analog_out: &mut [ControlState],
    ) -> Result<(), GroupError> {
        self.expect_kind(GroupKind::MixedTriggers)?;
        let trigger_count = self.controls.len() / 2;
        if bit_table.len() != trigger_count {
            return Err(GroupError::BitTableMismatch {
                group: self.name.clone(),
                expected: trigger_count,
                got: bit_table.len(),
            });
        }
        if analog_out.len() != trigger_count {
            return Err(GroupError::AnalogBufferMismatch {
                group: self.name.clone(),
                expected: trigger_count,
                got: analog_out.len(),
            });
        }

        let threshold = self.setting_value(SETTING_THRESHOLD, 0.9);
        for index in 0..trigger_count {
            let digital = self.controls[index].reference();
            let analog = self.controls[trigger_count + index].reference();

            let pressed = digital.state() > ACTIVATION_THRESHOLD;
            let value = if analog.is_bound() {
                analog.state()
            } else if pressed {
                1.0
            } else {
                0.0
            };

            if pressed || value > threshold {
                *mask |= bit_table[index];
            }
            analog_out[index] = value.clamp(0.0, 1.0);
        }
        Ok(())
    }

    /// Shaped cursor position with the vertical offset applied.
    pub fn cursor_state(&self) -> Result<StickState, GroupError> {
        self.expect_kind(GroupKind::Cursor)?;
        let (x, y) = self.shape().shape_2d(self.pair(3, 2), self.pair(0, 1));
        let offset = self.setting_value(SETTING_VERTICAL_OFFSET, 0.0);
        Ok(StickState {
            x,
            y: (y + offset).clamp(-1.0, 1.0),
        })
    }

    /// Shaped tilt vector scaled by the maximum angle setting.
    pub fn tilt_state(&self) -> Result<StickState, GroupError> {
        self.expect_kind(GroupKind::Tilt)?;
        let (x, y) = self.shape().shape_2d(self.pair(3, 2), self.pair(0, 1));
        let scale = self.setting_value(SETTING_MAX_ANGLE, 90.0) / 180.0;
        Ok(StickState {
            x: x * scale,
            y: y * scale,
        })
    }

    /// Swing force vector with a 3D deadzone.
    pub fn force_state(&self) -> Result<MotionState, GroupError> {
        self.expect_kind(GroupKind::Force)?;
        let shape = InputShape::new(self.setting_value(SETTING_DEADZONE, 0.0), 1.0);
        let (x, y, z) = shape.shape_3d(self.pair(3, 2), self.pair(4, 5), self.pair(0, 1));
        Ok(MotionState { x, y, z })
    }

    /// Per-axis shake: an active control contributes the intensity setting.
    pub fn shake_state(&self) -> Result<MotionState, GroupError> {
        self.expect_kind(GroupKind::Shake)?;
        let intensity = self.setting_value(SETTING_INTENSITY, 0.5);
        let axis = |index: usize| {
            if self.controls[index].state() > ACTIVATION_THRESHOLD {
                intensity
            } else {
                0.0
            }
        };
        Ok(MotionState {
            x: axis(0),
            y: axis(1),
            z: axis(2),
        })
    }

    /// Differential accelerometer axes, or `None` while unconfigured.
    ///
    /// "Unconfigured" is judged from the first control's bound-count only; a
    /// partially bound group still reports, with unbound axes reading 0.
    pub fn accelerometer_state(&self) -> Result<Option<MotionState>, GroupError> {
        self.expect_kind(GroupKind::ImuAccelerometer)?;
        if !self.controls[0].reference().is_bound() {
            return Ok(None);
        }
        Ok(Some(MotionState {
            x: self.pair(0, 1),
            y: self.pair(3, 2),
            z: self.pair(4, 5),
        }))
    }

    /// Differential gyroscope axes, gated like the accelerometer.
    pub fn gyroscope_state(&self) -> Result<Option<MotionState>, GroupError> {
        self.expect_kind(GroupKind::ImuGyroscope)?;
        if !self.controls[0].reference().is_bound() {
            return Ok(None);
        }
        Ok(Some(MotionState {
            x: self.pair(0, 1),
            y: self.pair(2, 3),
            z: self.pair(4, 5),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(group: &mut ControlGroup, index: usize, state: ControlState) {
        group.controls_mut()[index]
            .reference_mut()
            .set_input(state, 1);
    }

    #[test]
    fn button_mask_sets_exactly_the_pressed_bits() {
        let mut group = ControlGroup::buttons("Buttons", &["A", "B", "X"]);
        press(&mut group, 0, 1.0);
        press(&mut group, 1, 0.5); // at threshold, not past it
        press(&mut group, 2, 0.51);

        let mut mask = 0u16;
        group.button_mask(&mut mask, &[0x01, 0x02, 0x04]).unwrap();
        assert_eq!(mask, 0x05);
    }

    #[test]
    fn button_mask_is_or_only() {
        let group = ControlGroup::buttons("Buttons", &["A"]);
        let mut mask = 0x8000u16;
        group.button_mask(&mut mask, &[0x01]).unwrap();
        assert_eq!(mask, 0x8000);
    }

    #[test]
    fn button_mask_rejects_wrong_bit_table() {
        let group = ControlGroup::buttons("Buttons", &["A", "B"]);
        let mut mask = 0u16;
        let err = group.button_mask(&mut mask, &[0x01]).unwrap_err();
        assert!(matches!(err, GroupError::BitTableMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn stick_state_combines_directional_pairs() {
        let mut group = ControlGroup::analog_stick("Left Stick");
        press(&mut group, 3, 1.0); // Right
        let state = group.stick_state().unwrap();
        assert!((state.x - 1.0).abs() < 1e-9);
        assert_eq!(state.y, 0.0);
    }

    #[test]
    fn stick_deadzone_zeroes_small_input() {
        let mut group = ControlGroup::analog_stick("Left Stick");
        group
            .setting_mut(SETTING_DEADZONE)
            .unwrap()
            .set_value(0.3);
        press(&mut group, 3, 0.2);
        assert_eq!(group.stick_state().unwrap(), StickState::default());
    }

    #[test]
    fn stick_magnitude_respects_gate_radius() {
        let mut group = ControlGroup::analog_stick("Left Stick");
        group
            .setting_mut(SETTING_GATE_RADIUS)
            .unwrap()
            .set_value(0.6);
        press(&mut group, 3, 1.0);
        press(&mut group, 0, 1.0);
        let state = group.stick_state().unwrap();
        assert!(state.x.hypot(state.y) <= 0.6 + 1e-9);
    }

    #[test]
    fn triggers_prefer_bound_analog_channel() {
        let mut group = ControlGroup::mixed_triggers("Triggers", &["L", "R"]);
        // L: digital pressed, analog bound at 0.3 -> bit set, analog 0.3.
        press(&mut group, 0, 1.0);
        press(&mut group, 2, 0.3);
        // R: analog-only past threshold -> bit set, analog 0.95.
        press(&mut group, 3, 0.95);

        let mut mask = 0u16;
        let mut analog = [0.0; 2];
        group
            .triggers_state(&mut mask, &[0x20, 0x02], &mut analog)
            .unwrap();
        assert_eq!(mask, 0x22);
        assert!((analog[0] - 0.3).abs() < 1e-9);
        assert!((analog[1] - 0.95).abs() < 1e-9);
    }

    #[test]
    fn digital_only_trigger_saturates_analog() {
        let mut group = ControlGroup::mixed_triggers("Triggers", &["L", "R"]);
        press(&mut group, 1, 1.0); // R digital
        let mut mask = 0u16;
        let mut analog = [0.0; 2];
        group
            .triggers_state(&mut mask, &[0x20, 0x02], &mut analog)
            .unwrap();
        assert_eq!(mask, 0x02);
        assert_eq!(analog, [0.0, 1.0]);
    }

    #[test]
    fn triggers_reject_short_analog_buffer() {
        let group = ControlGroup::mixed_triggers("Triggers", &["L", "R"]);
        let mut mask = 0u16;
        let mut analog = [0.0; 1];
        let err = group
            .triggers_state(&mut mask, &[0x20, 0x02], &mut analog)
            .unwrap_err();
        assert!(matches!(err, GroupError::AnalogBufferMismatch { .. }));
    }

    #[test]
    fn accelerometer_unbound_group_is_absent() {
        let group = ControlGroup::imu_accelerometer("Accelerometer");
        assert_eq!(group.accelerometer_state().unwrap(), None);
    }

    #[test]
    fn accelerometer_symmetric_pairs_cancel() {
        let mut group = ControlGroup::imu_accelerometer("Accelerometer");
        for index in 0..6 {
            press(&mut group, index, 0.4);
        }
        assert_eq!(
            group.accelerometer_state().unwrap(),
            Some(MotionState::default())
        );
    }

    #[test]
    fn accelerometer_differential_axes() {
        let mut group = ControlGroup::imu_accelerometer("Accelerometer");
        press(&mut group, 0, 0.8); // Left
        press(&mut group, 3, 0.6); // Backward
        press(&mut group, 5, 0.5); // Down
        let state = group.accelerometer_state().unwrap().unwrap();
        assert!((state.x - 0.8).abs() < 1e-9);
        assert!((state.y - 0.6).abs() < 1e-9);
        assert!((state.z + 0.5).abs() < 1e-9);
    }

    #[test]
    fn gyroscope_differential_axes() {
        let mut group = ControlGroup::imu_gyroscope("Gyroscope");
        press(&mut group, 0, 0.7); // Pitch Up
        press(&mut group, 3, 0.4); // Roll Right
        press(&mut group, 4, 0.9); // Yaw Left
        let state = group.gyroscope_state().unwrap().unwrap();
        assert!((state.x - 0.7).abs() < 1e-9);
        assert!((state.y + 0.4).abs() < 1e-9);
        assert!((state.z - 0.9).abs() < 1e-9);
    }

    #[test]
    fn gyroscope_symmetric_pairs_cancel() {
        let mut group = ControlGroup::imu_gyroscope("Gyroscope");
        for index in 0..6 {
            press(&mut group, index, 0.3);
        }
        assert_eq!(
            group.gyroscope_state().unwrap(),
            Some(MotionState::default())
        );
    }

    // Pins the first-control gating shortcut: a partially bound group still
    // reports a measurement.
    #[test]
    fn partially_bound_group_still_reports() {
        let mut group = ControlGroup::imu_accelerometer("Accelerometer");
        press(&mut group, 0, 0.0); // Left bound but centered
        assert!(group.accelerometer_state().unwrap().is_some());

        let mut gyro = ControlGroup::imu_gyroscope("Gyroscope");
        press(&mut gyro, 0, 0.2);
        assert!(gyro.gyroscope_state().unwrap().is_some());
    }

    #[test]
    fn shake_axes_report_intensity() {
        let mut group = ControlGroup::shake("Shake");
        group.setting_mut(SETTING_INTENSITY).unwrap().set_value(0.8);
        press(&mut group, 1, 1.0);
        assert_eq!(
            group.shake_state().unwrap(),
            MotionState {
                x: 0.0,
                y: 0.8,
                z: 0.0
            }
        );
    }

    #[test]
    fn tilt_scales_by_max_angle() {
        let mut group = ControlGroup::tilt("Tilt");
        press(&mut group, 0, 1.0); // Forward
        let state = group.tilt_state().unwrap();
        assert!((state.y - 0.5).abs() < 1e-9); // 90 / 180
        assert_eq!(state.x, 0.0);
    }

    #[test]
    fn cursor_applies_vertical_offset() {
        let mut group = ControlGroup::cursor("IR");
        group
            .setting_mut(SETTING_VERTICAL_OFFSET)
            .unwrap()
            .set_value(0.5);
        press(&mut group, 0, 1.0); // Up
        let state = group.cursor_state().unwrap();
        assert_eq!(state.y, 1.0); // 1.0 + 0.5, clamped
    }

    #[test]
    fn force_applies_3d_deadzone() {
        let mut group = ControlGroup::force("Swing");
        group.setting_mut(SETTING_DEADZONE).unwrap().set_value(0.3);
        press(&mut group, 3, 0.2); // Right, inside deadzone
        assert_eq!(group.force_state().unwrap(), MotionState::default());

        press(&mut group, 3, 1.0);
        let state = group.force_state().unwrap();
        assert!(state.x > 0.9);
    }

    #[test]
    fn wrong_variant_fails_loudly() {
        let group = ControlGroup::analog_stick("Left Stick");
        let mut mask = 0u16;
        let err = group.button_mask(&mut mask, &[0; 4]).unwrap_err();
        assert!(matches!(
            err,
            GroupError::WrongVariant {
                expected: GroupKind::Buttons,
                actual: GroupKind::AnalogStick,
                ..
            }
        ));
        assert!(group.accelerometer_state().is_err());
        assert!(group.triggers_state(&mut mask, &[], &mut []).is_err());
    }

    #[test]
    fn disabled_group_remains_queryable() {
        let mut group = ControlGroup::buttons("Buttons", &["A"]);
        press(&mut group, 0, 1.0);
        group.set_enabled(false);
        let mut mask = 0u16;
        group.button_mask(&mut mask, &[0x01]).unwrap();
        assert_eq!(mask, 0x01);
    }
}
