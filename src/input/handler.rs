use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{ActionEvent, ActionHandler};
use crate::command::{CommandRunner, CommandSequencer, OscTemplate};
use crate::group::GroupSync;
use crate::host::ActionHost;
use crate::state::ButtonIdentity;

/// Handles the descriptor-driven group button.
///
/// Releasing a key within the long-press threshold runs its OSC sequence;
/// releasing after it (or without a recorded key-down) reloads the whole
/// device from the descriptors.
pub struct GroupButtonHandler<H, R> {
    group: GroupSync<H>,
    sequencer: CommandSequencer<R>,
    osc: OscTemplate,
    long_press: Duration,
    press_times: HashMap<ButtonIdentity, Instant>,
}

impl<H: ActionHost, R: CommandRunner> GroupButtonHandler<H, R> {
    pub fn new(
        group: GroupSync<H>,
        sequencer: CommandSequencer<R>,
        osc: OscTemplate,
        long_press: Duration,
    ) -> Self {
        Self {
            group,
            sequencer,
            osc,
            long_press,
            press_times: HashMap::new(),
        }
    }

    /// Key-downs not yet consumed by a key-up
    pub fn pending_presses(&self) -> usize {
        self.press_times.len()
    }
}

impl<H: ActionHost, R: CommandRunner> ActionHandler for GroupButtonHandler<H, R> {
    async fn will_appear(&mut self, event: &ActionEvent) -> Result<()> {
        let settings = self.group.host().get_settings(&event.action).await?;
        if settings.is_resolved() {
            return self.group.fast_update(&event.action, &settings).await;
        }
        self.group.update_button_details(&event.action).await
    }

    async fn property_inspector_did_disappear(&mut self, event: &ActionEvent) -> Result<()> {
        self.group.update_button_details(&event.action).await
    }

    async fn key_down(&mut self, event: &ActionEvent) -> Result<()> {
        if let Some(identity) = event.settings.identity(&event.action.device_id) {
            self.press_times.insert(identity, Instant::now());
        }
        Ok(())
    }

    async fn key_up(&mut self, event: &ActionEvent) -> Result<()> {
        let device_id = &event.action.device_id;
        let mut settings = event.settings.clone();

        self.group.clear_siblings(device_id, &settings.json).await;
        settings.pressed = true;
        self.group
            .host()
            .set_settings(&event.action, &settings)
            .await?;

        let Some(identity) = settings.identity(device_id) else {
            return Ok(());
        };

        // No key-down on record counts as an arbitrarily long hold
        let press_duration = self
            .press_times
            .remove(&identity)
            .map(|t| t.elapsed())
            .unwrap_or(Duration::MAX);

        if press_duration > self.long_press {
            info!(
                "Button {} held {:?}, refreshing device {}",
                event.action.context, press_duration, device_id
            );
            self.group.refresh_group(device_id).await;
            return Ok(());
        }

        debug!(
            "Button {} released after {:?}",
            event.action.context, press_duration
        );
        self.group.fast_update(&event.action, &settings).await?;

        if !settings.osc_commands.is_empty() {
            let commands = self.osc.render_all(&settings.osc_commands);
            self.sequencer
                .run_sequence(&commands, &settings.delays)
                .await;
        }

        Ok(())
    }
}
