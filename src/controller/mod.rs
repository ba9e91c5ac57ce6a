//! Emulated-controller core: control references, groups, per-variant state
//! derivation and the shared-state lock.

pub mod control;
pub mod emulated;
pub mod group;
pub mod poller;
pub mod reference;
pub mod reshape;

// Re-export types that need to be public
pub use control::{Control, NumericSetting, SettingKind};
pub use emulated::{ControllerError, ControllerState, EmulatedController, GroupId};
pub use group::{
    ControlGroup, GroupError, GroupKind, MotionState, StickState, ACTIVATION_THRESHOLD,
};
pub use poller::{ExtensionFrame, PollerError, PollerHandle, PollerSettings};
pub use reference::{ControlReference, ControlState, InputSource, Polarity};
pub use reshape::InputShape;
