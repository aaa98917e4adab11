use anyhow::Result;
use tracing::info;

use super::{ActionEvent, ActionHandler};
use crate::group::GroupSync;
use crate::host::ActionHost;

/// Dedicated key that reloads every group button on its device
pub struct RefreshHandler<H> {
    group: GroupSync<H>,
}

impl<H: ActionHost> RefreshHandler<H> {
    pub fn new(group: GroupSync<H>) -> Self {
        Self { group }
    }
}

impl<H: ActionHost> ActionHandler for RefreshHandler<H> {
    async fn key_down(&mut self, event: &ActionEvent) -> Result<()> {
        info!("Refresh requested on {}", event.action.device_id);
        self.group.host().show_ok(&event.action).await?;
        self.group.refresh_group(&event.action.device_id).await;
        Ok(())
    }
}
