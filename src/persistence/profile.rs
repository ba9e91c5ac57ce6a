//! Controller profiles: the persisted shape of group enable flags and
//! numeric-setting values.
//!
//! The controller model only exposes get/set accessors; the TOML wire format
//! lives entirely in this module.

use crate::controller::emulated::ControllerState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("profile serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct SettingProfile {
    pub name: String,
    pub value: f64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct GroupProfile {
    pub name: String,
    pub enabled: bool,
    pub settings: Vec<SettingProfile>,
}

/// Persisted tunables of one emulated controller.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ControllerProfile {
    pub name: String,
    pub groups: Vec<GroupProfile>,
}

impl ControllerProfile {
    /// Snapshot the current enable flags and setting values.
    pub fn capture(name: &str, state: &ControllerState) -> Self {
        let groups = state
            .groups()
            .iter()
            .map(|group| GroupProfile {
                name: group.name().to_string(),
                enabled: group.is_enabled(),
                settings: group
                    .settings()
                    .iter()
                    .map(|setting| SettingProfile {
                        name: setting.name().to_string(),
                        value: setting.value(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            name: name.to_string(),
            groups,
        }
    }

    /// Apply the profile onto a controller. Unknown group or setting names
    /// are skipped with a warning; values are clamped by the settings
    /// themselves.
    pub fn apply(&self, state: &mut ControllerState) {
        for group_profile in &self.groups {
            let group = match state.group_mut_by_name(&group_profile.name) {
                Ok(group) => group,
                Err(_) => {
                    warn!(
                        "Profile '{}' names unknown group '{}', skipping",
                        self.name, group_profile.name
                    );
                    continue;
                }
            };

            group.set_enabled(group_profile.enabled);
            for setting_profile in &group_profile.settings {
                match group.setting_mut(&setting_profile.name) {
                    Some(setting) => setting.set_value(setting_profile.value),
                    None => warn!(
                        "Profile '{}' names unknown setting '{}/{}', skipping",
                        self.name, group_profile.name, setting_profile.name
                    ),
                }
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let raw = fs::read_to_string(path)?;
        let profile = toml::from_str(&raw)?;
        info!("Loaded controller profile from {}", path.display());
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProfileError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        info!("Saved controller profile to {}", path.display());
        Ok(())
    }

    /// Default profile location under the user config dir.
    pub fn default_path(controller_name: &str) -> Option<PathBuf> {
        let file_name = format!(
            "{}.toml",
            controller_name.to_lowercase().replace(' ', "_")
        );
        dirs::config_dir().map(|dir| dir.join("emupad").join(file_name))
    }
}
