//! Host boundary: the software that owns the physical device
//!
//! The host delivers button events, stores per-button settings and draws
//! titles and images. The engine only talks to it through [`ActionHost`].

mod memory;
pub mod protocol;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::state::ButtonSettings;

pub use memory::MemoryHost;

/// Kind of control an action is placed on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    #[default]
    Keypad,
    Encoder,
}

/// Grid position of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub column: u32,
    pub row: u32,
}

/// One visible action instance on a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    /// Host-assigned instance id
    pub context: String,
    pub device_id: String,
    pub controller: Controller,
    pub coordinates: Option<Coordinates>,
}

impl ActionRef {
    pub fn is_key(&self) -> bool {
        self.controller == Controller::Keypad
    }

    /// Keys placed on the grid; excludes encoders and multi-action members
    pub fn is_grid_key(&self) -> bool {
        self.is_key() && self.coordinates.is_some()
    }
}

/// Settings and display operations the host provides
#[allow(async_fn_in_trait)]
pub trait ActionHost {
    /// Group-button instances currently visible on `device_id`, in a stable order
    async fn visible_actions(&self, device_id: &str) -> Vec<ActionRef>;

    async fn get_settings(&self, action: &ActionRef) -> Result<ButtonSettings>;

    async fn set_settings(&self, action: &ActionRef, settings: &ButtonSettings) -> Result<()>;

    async fn set_title(&self, action: &ActionRef, title: &str) -> Result<()>;

    async fn set_image(&self, action: &ActionRef, image: &str) -> Result<()>;

    /// Briefly show the host's success indicator
    async fn show_ok(&self, action: &ActionRef) -> Result<()>;
}
