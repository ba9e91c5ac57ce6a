//! Extension peripherals: encoders that serialize aggregate controller state
//! into the byte-exact register frames consumed by the emulated I/O bus.

pub mod classic;

pub use classic::ClassicController;

use crate::controller::emulated::ControllerError;

/// Bus-facing surface of an emulated extension peripheral.
///
/// Frames are recomputed on every call and have no identity between calls;
/// identification and calibration blocks are transmitted verbatim.
pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    /// Identification bytes reported on the bus.
    fn identifier(&self) -> &'static [u8];

    /// Factory calibration block.
    fn calibration(&self) -> &'static [u8];

    /// Size of one register frame in bytes.
    fn frame_len(&self) -> usize;

    /// Encode one frame of current state into `out` (length `frame_len()`).
    fn encode_frame(&self, out: &mut [u8]) -> Result<(), ControllerError>;

    /// True iff any digital input is currently active. Works on the logical
    /// pressed-mask; the wire-format bit inversion does not apply here.
    fn is_button_pressed(&self) -> bool;
}
