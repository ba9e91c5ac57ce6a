//! Persistence of controller tunables (enable flags and numeric settings).

pub mod profile;

pub use profile::{ControllerProfile, GroupProfile, ProfileError, SettingProfile};
