//! Classic controller extension: a fixed group layout plus the encoder that
//! packs derived state into the peripheral's 8-byte register frame.
//!
//! The field layout is a protocol constant. Byte offsets, bit slices and the
//! inverted button polarity must match the physical peripheral's register
//! map, or downstream bus consumers will misparse the frame.

use crate::controller::emulated::{ControllerError, ControllerState, EmulatedController, GroupId};
use crate::controller::group::{ControlGroup, StickState};
use crate::controller::reference::ControlState;
use crate::extension::Extension;
use tracing::error;

/// Size of one register frame.
pub const FRAME_SIZE: usize = 8;

pub const STICK_CENTER: u8 = 0x80;
pub const STICK_RADIUS: u8 = 0x7F;
pub const TRIGGER_RANGE: u8 = 0xFF;

/// Frame byte offsets.
pub const OFFSET_LX: usize = 0;
pub const OFFSET_LY: usize = 1;
pub const OFFSET_RY: usize = 2;
pub const OFFSET_LT: usize = 3;
/// Bits 7:3 carry the RX high slice, bits 2:0 a coarse LT duplicate.
pub const OFFSET_RX_HIGH: usize = 4;
/// Bits 7:6 carry the RX mid slice, bit 5 the RX low slice, bits 4:0 RT.
pub const OFFSET_RX_LOW: usize = 5;
/// 16-bit button field, little-endian, pressed bits cleared on the wire.
pub const OFFSET_BUTTONS: usize = 6;

// Pressed-mask bit positions (pre-inversion).
pub const BUTTON_A: u16 = 0x1000;
pub const BUTTON_B: u16 = 0x4000;
pub const BUTTON_X: u16 = 0x0800;
pub const BUTTON_Y: u16 = 0x2000;
pub const BUTTON_ZL: u16 = 0x8000;
pub const BUTTON_ZR: u16 = 0x0400;
pub const BUTTON_MINUS: u16 = 0x0010;
pub const BUTTON_PLUS: u16 = 0x0004;
pub const BUTTON_HOME: u16 = 0x0008;
pub const PAD_UP: u16 = 0x0100;
pub const PAD_DOWN: u16 = 0x0040;
pub const PAD_LEFT: u16 = 0x0200;
pub const PAD_RIGHT: u16 = 0x0080;
pub const TRIGGER_L: u16 = 0x0020;
pub const TRIGGER_R: u16 = 0x0002;

pub const BUTTON_NAMES: [&str; 9] = ["A", "B", "X", "Y", "ZL", "ZR", "-", "+", "Home"];
pub const DPAD_NAMES: [&str; 4] = ["Up", "Down", "Left", "Right"];
pub const TRIGGER_NAMES: [&str; 2] = ["L", "R"];

/// Bit tables in the groups' control order.
const BUTTON_BITS: [u16; 9] = [
    BUTTON_A,
    BUTTON_B,
    BUTTON_X,
    BUTTON_Y,
    BUTTON_ZL,
    BUTTON_ZR,
    BUTTON_MINUS,
    BUTTON_PLUS,
    BUTTON_HOME,
];
const DPAD_BITS: [u16; 4] = [PAD_UP, PAD_DOWN, PAD_LEFT, PAD_RIGHT];
const TRIGGER_BITS: [u16; 2] = [TRIGGER_L, TRIGGER_R];
const TRIGGER_COUNT: usize = 2;

/// Identification bytes, transmitted verbatim.
pub const IDENTIFIER: [u8; 6] = [0x00, 0x00, 0xA4, 0x20, 0x01, 0x01];

/// Factory calibration block (stick max/min/center per axis, trigger
/// neutral points, checksum), transmitted verbatim.
pub const CALIBRATION: [u8; 16] = [
    0xFF, 0x00, 0x80, // LX
    0xFF, 0x00, 0x80, // LY
    0xFF, 0x00, 0x80, // RX
    0xFF, 0x00, 0x80, // RY
    0x00, 0x00, // trigger neutral
    0x51, 0xA6, // checksum
];

/// Sub-field views of the 8-bit right-stick X register. The physical
/// peripheral packs this axis into slices spread over two byte positions;
/// consumers reassemble the value from all three fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RightStickSplit {
    /// Bit 0, taken from the unshifted value.
    pub low: u8,
    /// Bits 2:1, taken from the value shifted right once.
    pub mid: u8,
    /// Bits 7:3, taken from the value shifted right three times.
    pub high: u8,
}

pub fn split_right_stick(value: u8) -> RightStickSplit {
    RightStickSplit {
        low: value & 0x01,
        mid: (value >> 1) & 0x03,
        high: (value >> 3) & 0x1F,
    }
}

pub fn join_right_stick(split: RightStickSplit) -> u8 {
    split.low | (split.mid << 1) | (split.high << 3)
}

/// Map a calibrated axis in [-1, 1] onto an 8-bit register around `center`.
/// The cast truncates; wrap-around matches the hardware register width.
fn map_axis(value: ControlState, center: u8, radius: u8) -> u8 {
    (center as i32 + (value * radius as f64) as i32) as u8
}

fn map_trigger(value: ControlState) -> u8 {
    (value.clamp(0.0, 1.0) * TRIGGER_RANGE as f64) as u8
}

/// Emulated Classic controller: fixed group layout over an
/// [`EmulatedController`], plus the register-frame encoder.
pub struct ClassicController {
    controller: EmulatedController,
    buttons: GroupId,
    dpad: GroupId,
    left_stick: GroupId,
    right_stick: GroupId,
    triggers: GroupId,
}

impl ClassicController {
    pub fn new() -> Self {
        let mut state = ControllerState::default();
        let buttons = state.add_group(ControlGroup::buttons("Buttons", &BUTTON_NAMES));
        let dpad = state.add_group(ControlGroup::buttons("D-Pad", &DPAD_NAMES));
        let left_stick = state.add_group(ControlGroup::analog_stick("Left Stick"));
        let right_stick = state.add_group(ControlGroup::analog_stick("Right Stick"));
        let triggers = state.add_group(ControlGroup::mixed_triggers("Triggers", &TRIGGER_NAMES));

        Self {
            controller: EmulatedController::new("Classic Controller", state),
            buttons,
            dpad,
            left_stick,
            right_stick,
            triggers,
        }
    }

    pub fn controller(&self) -> &EmulatedController {
        &self.controller
    }

    /// Shaped stick output, or neutral when the group is disabled.
    fn stick(&self, state: &ControllerState, id: GroupId) -> Result<StickState, ControllerError> {
        let group = state.group(id)?;
        if !group.is_enabled() {
            return Ok(StickState::default());
        }
        Ok(group.stick_state()?)
    }

    /// Logical pressed-mask over buttons, d-pad and trigger digital bits,
    /// with the trigger analog channels riding along. Disabled groups
    /// contribute nothing.
    fn derive_mask(
        &self,
        state: &ControllerState,
        analog_out: &mut [ControlState; TRIGGER_COUNT],
    ) -> Result<u16, ControllerError> {
        let mut mask = 0u16;

        let buttons = state.group(self.buttons)?;
        if buttons.is_enabled() {
            buttons.button_mask(&mut mask, &BUTTON_BITS)?;
        }

        let dpad = state.group(self.dpad)?;
        if dpad.is_enabled() {
            dpad.button_mask(&mut mask, &DPAD_BITS)?;
        }

        let triggers = state.group(self.triggers)?;
        if triggers.is_enabled() {
            triggers.triggers_state(&mut mask, &TRIGGER_BITS, analog_out)?;
        }

        Ok(mask)
    }
}

impl Default for ClassicController {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for ClassicController {
    fn name(&self) -> &str {
        self.controller.name()
    }

    fn identifier(&self) -> &'static [u8] {
        &IDENTIFIER
    }

    fn calibration(&self) -> &'static [u8] {
        &CALIBRATION
    }

    fn frame_len(&self) -> usize {
        FRAME_SIZE
    }

    fn encode_frame(&self, out: &mut [u8]) -> Result<(), ControllerError> {
        if out.len() != FRAME_SIZE {
            return Err(ControllerError::FrameSize {
                expected: FRAME_SIZE,
                got: out.len(),
            });
        }

        // One lock scope: every group is sampled against the same snapshot.
        let state = self.controller.state_lock();

        let left = self.stick(&state, self.left_stick)?;
        let right = self.stick(&state, self.right_stick)?;
        let mut analog = [0.0; TRIGGER_COUNT];
        let mask = self.derive_mask(&state, &mut analog)?;
        drop(state);

        let rx = split_right_stick(map_axis(right.x, STICK_CENTER, STICK_RADIUS));
        let lt = map_trigger(analog[0]);
        let rt = map_trigger(analog[1]);

        let mut frame = [0u8; FRAME_SIZE];
        frame[OFFSET_LX] = map_axis(left.x, STICK_CENTER, STICK_RADIUS);
        frame[OFFSET_LY] = map_axis(left.y, STICK_CENTER, STICK_RADIUS);
        frame[OFFSET_RY] = map_axis(right.y, STICK_CENTER, STICK_RADIUS);
        frame[OFFSET_LT] = lt;
        frame[OFFSET_RX_HIGH] = (rx.high << 3) | (lt >> 5);
        frame[OFFSET_RX_LOW] = (rx.mid << 6) | (rx.low << 5) | (rt >> 3);
        // The peripheral reports pressed as a cleared bit.
        frame[OFFSET_BUTTONS..OFFSET_BUTTONS + 2].copy_from_slice(&(!mask).to_le_bytes());

        out.copy_from_slice(&frame);
        Ok(())
    }

    fn is_button_pressed(&self) -> bool {
        let state = self.controller.state_lock();
        let mut analog = [0.0; TRIGGER_COUNT];
        match self.derive_mask(&state, &mut analog) {
            Ok(mask) => mask != 0,
            Err(err) => {
                // Unreachable for a layout built by `new`; surface it anyway.
                error!("Pressed-mask derivation failed: {}", err);
                false
            }
        }
    }
}
