//! Leaf controls and numeric settings attached to control groups.

use crate::controller::reference::{ControlReference, ControlState, Polarity};

/// A named leaf input wrapping exactly one control reference.
///
/// Name and translation flag are fixed at construction; only the reference's
/// binding may change afterwards.
#[derive(Clone, Debug)]
pub struct Control {
    name: String,
    translated: bool,
    reference: ControlReference,
}

impl Control {
    pub fn new(name: impl Into<String>, translated: bool, polarity: Polarity) -> Self {
        Self {
            name: name.into(),
            translated,
            reference: ControlReference::new(polarity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the display name goes through UI translation.
    pub fn is_translated(&self) -> bool {
        self.translated
    }

    pub fn reference(&self) -> &ControlReference {
        &self.reference
    }

    pub fn reference_mut(&mut self) -> &mut ControlReference {
        &mut self.reference
    }

    pub(crate) fn state(&self) -> ControlState {
        self.reference.state()
    }
}

/// Value kind of a numeric setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKind {
    Float,
    Bool,
}

/// A named, range-bounded tunable attached to a group. Values persist across
/// sessions through the profile store; the setting itself only exposes
/// get/set.
#[derive(Clone, Debug)]
pub struct NumericSetting {
    name: String,
    kind: SettingKind,
    default: f64,
    min: f64,
    max: f64,
    value: f64,
}

impl NumericSetting {
    pub fn float(name: impl Into<String>, default: f64, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            kind: SettingKind::Float,
            default,
            min,
            max,
            value: default,
        }
    }

    pub fn bool(name: impl Into<String>, default: bool) -> Self {
        let default = if default { 1.0 } else { 0.0 };
        Self {
            name: name.into(),
            kind: SettingKind::Bool,
            default,
            min: 0.0,
            max: 1.0,
            value: default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SettingKind {
        self.kind
    }

    pub fn default_value(&self) -> f64 {
        self.default
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bool_value(&self) -> bool {
        self.value > 0.5
    }

    /// Set the value, clamped into the setting's range. Bool settings snap
    /// to 0.0 or 1.0.
    pub fn set_value(&mut self, value: f64) {
        self.value = match self.kind {
            SettingKind::Float => value.clamp(self.min, self.max),
            SettingKind::Bool => {
                if value > 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        };
    }

    pub fn reset(&mut self) {
        self.value = self.default;
    }
}
