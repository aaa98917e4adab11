mod handler;
mod refresh;

use anyhow::Result;

use crate::host::ActionRef;
use crate::state::ButtonSettings;

pub use handler::GroupButtonHandler;
pub use refresh::RefreshHandler;

/// Host events delivered to action handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    WillAppear,
    KeyDown,
    KeyUp,
    PropertyInspectorDidDisappear,
}

/// One event for one action instance, with the settings it carried
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub action: ActionRef,
    pub settings: ButtonSettings,
}

/// Per-action-type event handling; every event defaults to a no-op
#[allow(async_fn_in_trait)]
pub trait ActionHandler {
    async fn will_appear(&mut self, _event: &ActionEvent) -> Result<()> {
        Ok(())
    }

    async fn key_down(&mut self, _event: &ActionEvent) -> Result<()> {
        Ok(())
    }

    async fn key_up(&mut self, _event: &ActionEvent) -> Result<()> {
        Ok(())
    }

    async fn property_inspector_did_disappear(&mut self, _event: &ActionEvent) -> Result<()> {
        Ok(())
    }

    /// Route an event to its method
    async fn handle_event(&mut self, kind: EventKind, event: &ActionEvent) -> Result<()> {
        match kind {
            EventKind::WillAppear => self.will_appear(event).await,
            EventKind::KeyDown => self.key_down(event).await,
            EventKind::KeyUp => self.key_up(event).await,
            EventKind::PropertyInspectorDidDisappear => {
                self.property_inspector_did_disappear(event).await
            }
        }
    }
}
