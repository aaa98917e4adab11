use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::descriptor::lenient;
use crate::descriptor::{OscCommand, ResolvedButton};

/// Settings persisted by the host for one physical button.
///
/// Every field decodes on its own, so one odd value never costs the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonSettings {
    /// Shown as the group's active button
    #[serde(deserialize_with = "lenient::field")]
    pub pressed: bool,
    /// Descriptor file path
    #[serde(deserialize_with = "lenient::field")]
    pub json: String,
    /// Index into the descriptor's `files`, kept as the host sent it
    #[serde(deserialize_with = "lenient::scalar_text")]
    pub index: String,
    #[serde(deserialize_with = "lenient::field")]
    pub title: Option<String>,
    /// Embedded idle image, empty until resolved
    #[serde(rename = "imageUrl", deserialize_with = "lenient::field")]
    pub image_url: String,
    /// Embedded pressed image
    #[serde(rename = "imageUrlPressed", deserialize_with = "lenient::field")]
    pub image_url_pressed: String,
    #[serde(deserialize_with = "lenient::field")]
    pub scripts: Vec<String>,
    #[serde(rename = "scriptCmds", deserialize_with = "lenient::field")]
    pub script_cmds: Vec<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub osc_commands: Vec<OscCommand>,
    #[serde(deserialize_with = "lenient::delays")]
    pub delays: Vec<u64>,
}

impl ButtonSettings {
    /// Numeric button index, if set
    pub fn index_number(&self) -> Option<usize> {
        self.index.trim().parse().ok()
    }

    /// True when both descriptor file and index are set
    pub fn has_identity(&self) -> bool {
        !self.json.is_empty() && !self.index.is_empty()
    }

    /// Group key for this button on `device_id`
    pub fn identity(&self, device_id: &str) -> Option<ButtonIdentity> {
        if !self.has_identity() {
            return None;
        }

        Some(ButtonIdentity {
            device_id: device_id.to_string(),
            descriptor_file: PathBuf::from(&self.json),
            index: self.index.clone(),
        })
    }

    /// True once images have been resolved at least once
    pub fn is_resolved(&self) -> bool {
        !self.image_url.is_empty()
    }

    /// Copy a resolved descriptor entry in, keeping identity and toggle state
    pub fn apply(&mut self, resolved: ResolvedButton) {
        self.title = Some(resolved.title);
        self.image_url = resolved.image_url;
        self.image_url_pressed = resolved.image_url_pressed;
        self.scripts = resolved.scripts;
        self.script_cmds = resolved.script_cmds;
        self.osc_commands = resolved.osc_commands;
        self.delays = resolved.delays;
    }

    /// Reset to the state of a button whose descriptor can't be read
    pub fn reset_unresolved(&mut self) {
        self.title = Some(format!("button {}", self.index_number().unwrap_or(0) + 1));
        self.image_url.clear();
        self.image_url_pressed.clear();
        self.scripts.clear();
        self.script_cmds.clear();
        self.osc_commands.clear();
        self.delays.clear();
    }
}

/// Physical buttons sharing a descriptor entry on one device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ButtonIdentity {
    pub device_id: String,
    pub descriptor_file: PathBuf,
    pub index: String,
}
