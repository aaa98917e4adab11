pub mod command;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod group;
pub mod host;
pub mod input;
pub mod state;

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use command::{CommandRunner, CommandSequencer, OscTemplate};
use config::Config;
use descriptor::DescriptorResolver;
use group::GroupSync;
use host::protocol::{InboundEvent, InboundMessage, GROUP_BUTTON_ACTION, REFRESH_ACTION};
use host::{ActionHost, MemoryHost};
use input::{ActionEvent, ActionHandler, EventKind, GroupButtonHandler, RefreshHandler};

/// Main application struct: routes host events to the action handlers
pub struct App<H, R> {
    host: Arc<H>,
    button: GroupButtonHandler<H, R>,
    refresh: RefreshHandler<H>,
}

impl<H: ActionHost, R: CommandRunner> App<H, R> {
    pub fn new(config: &Config, host: Arc<H>, runner: R) -> Self {
        let group = GroupSync::new(
            host.clone(),
            DescriptorResolver::new(config.timing.default_delay_ms),
            config.timing.refresh_pause(),
        );
        let button = GroupButtonHandler::new(
            group.clone(),
            CommandSequencer::new(runner, config.runner.delay_policy),
            OscTemplate::new(config.osc.clone()),
            config.timing.long_press(),
        );

        Self {
            host,
            button,
            refresh: RefreshHandler::new(group),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Deliver one event to the handler registered for `action_uuid`.
    ///
    /// Handler errors are logged here and never returned.
    pub async fn dispatch(&mut self, action_uuid: &str, kind: EventKind, event: &ActionEvent) {
        let result = match action_uuid {
            GROUP_BUTTON_ACTION => self.button.handle_event(kind, event).await,
            REFRESH_ACTION => self.refresh.handle_event(kind, event).await,
            other => {
                debug!("Ignoring {:?} for unknown action {}", kind, other);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(
                "{:?} on {} ({}) failed: {}",
                kind, event.action.context, action_uuid, e
            );
        }
    }
}

impl<R: CommandRunner> App<MemoryHost, R> {
    /// Apply one host message to the registry and dispatch it
    pub async fn handle_message(&mut self, message: InboundMessage) {
        let action = message.action_ref();
        let tracked = message.action == GROUP_BUTTON_ACTION;

        let kind = match message.event {
            InboundEvent::WillAppear => {
                if tracked {
                    let settings = message.settings().cloned().unwrap_or_default();
                    self.host.appear(action.clone(), settings).await;
                }
                EventKind::WillAppear
            }
            InboundEvent::WillDisappear => {
                self.host.disappear(&action.context).await;
                return;
            }
            InboundEvent::DidReceiveSettings => {
                if let Some(settings) = message.settings() {
                    self.host
                        .store_settings(&action.context, settings.clone())
                        .await;
                }
                return;
            }
            InboundEvent::KeyDown | InboundEvent::KeyUp => {
                if let (true, Some(settings)) = (tracked, message.settings()) {
                    self.host
                        .store_settings(&action.context, settings.clone())
                        .await;
                }
                if message.event == InboundEvent::KeyDown {
                    EventKind::KeyDown
                } else {
                    EventKind::KeyUp
                }
            }
            InboundEvent::PropertyInspectorDidDisappear => EventKind::PropertyInspectorDidDisappear,
            InboundEvent::Other => {
                debug!("Ignoring unsupported event from {}", action.context);
                return;
            }
        };

        let settings = match message.settings() {
            Some(settings) => settings.clone(),
            None => self
                .host
                .settings(&action.context)
                .await
                .unwrap_or_default(),
        };
        let event = ActionEvent { action, settings };
        self.dispatch(&message.action, kind, &event).await;
    }

    /// Process newline-delimited JSON messages until the input ends.
    ///
    /// Messages are handled one at a time, so an event arriving while a
    /// command sequence runs waits for it to finish.
    pub async fn run<I>(&mut self, input: I) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
    {
        info!("Waiting for host events");
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<InboundMessage>(line) {
                Ok(message) => self.handle_message(message).await,
                Err(e) => warn!("Skipping malformed host message: {}", e),
            }
        }

        info!("Host input closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingRunner;
    use crate::state::ButtonSettings;
    use host::protocol::OutboundMessage;

    fn descriptor(dir: &std::path::Path) -> String {
        let file = dir.join("group.json");
        std::fs::write(
            &file,
            r#"{ "files": [
                { "title": "Red", "osc_commands": [ { "osc_path": "/red", "osc_value": [1], "osc_port": 8000 } ] },
                { "title": "Blue" } ] }"#,
        )
        .unwrap();
        file.to_string_lossy().to_string()
    }

    fn line(event: &str, action: &str, context: &str, column: u32, json: &str, index: u32) -> String {
        serde_json::json!({
            "event": event,
            "action": action,
            "context": context,
            "device": "dev",
            "payload": {
                "settings": { "json": json, "index": index.to_string() },
                "coordinates": { "column": column, "row": 0 },
                "controller": "Keypad"
            }
        })
        .to_string()
    }

    fn with_settings(event: &str, context: &str, settings: &ButtonSettings) -> String {
        serde_json::json!({
            "event": event,
            "action": GROUP_BUTTON_ACTION,
            "context": context,
            "device": "dev",
            "payload": {
                "settings": settings,
                "coordinates": { "column": 0, "row": 0 },
                "controller": "Keypad"
            }
        })
        .to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_processes_event_stream() {
        let dir = tempfile::tempdir().unwrap();
        let json = descriptor(dir.path());
        let runner = RecordingRunner::default();
        let mut app = App::new(&Config::default(), Arc::new(MemoryHost::new()), runner.clone());

        let input = [
            line("willAppear", GROUP_BUTTON_ACTION, "a", 0, &json, 0),
            line("willAppear", GROUP_BUTTON_ACTION, "b", 1, &json, 1),
            "not json".to_string(),
            String::new(),
            r#"{ "event": "dialRotate", "context": "a", "device": "dev" }"#.to_string(),
        ]
        .join("\n");
        app.run(input.as_bytes()).await.unwrap();
        assert_eq!(app.host().face("a").await.unwrap().0, "Red");

        // Key events carry the settings persisted by the appear resolve
        let settings = app.host().settings("a").await.unwrap();
        let press = [
            with_settings("keyDown", "a", &settings),
            with_settings("keyUp", "a", &settings),
        ]
        .join("\n");
        app.run(press.as_bytes()).await.unwrap();

        assert_eq!(app.host().face("a").await.unwrap().0, "Red *");
        assert_eq!(app.host().face("b").await.unwrap().0, "Blue");
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_disappear_and_refresh_action() {
        let dir = tempfile::tempdir().unwrap();
        let json = descriptor(dir.path());
        let mut app = App::new(
            &Config::default(),
            Arc::new(MemoryHost::new()),
            RecordingRunner::default(),
        );

        let input = [
            line("willAppear", GROUP_BUTTON_ACTION, "a", 0, &json, 1),
            line("willAppear", GROUP_BUTTON_ACTION, "b", 1, &json, 0),
            line("willDisappear", GROUP_BUTTON_ACTION, "b", 1, &json, 0),
            line("keyDown", REFRESH_ACTION, "r", 4, "", 0),
        ]
        .join("\n");
        app.run(input.as_bytes()).await.unwrap();

        assert!(app.host().settings("b").await.is_none());
        assert!(app.host().settings("r").await.is_none());
        assert!(app
            .host()
            .sent()
            .contains(&OutboundMessage::ShowOk { context: "r".to_string() }));
        assert_eq!(app.host().face("a").await.unwrap().0, "Blue");
    }

    #[tokio::test]
    async fn test_odd_settings_still_register_the_button() {
        let mut app = App::new(
            &Config::default(),
            Arc::new(MemoryHost::new()),
            RecordingRunner::default(),
        );

        let input = [
            r#"{ "event": "willAppear", "action": "com.oraiopoulos.json-group.execute", "context": "a", "device": "dev",
                 "payload": { "settings": { "json": "", "index": -1, "delays": [250.5] },
                              "coordinates": { "column": 0, "row": 0 } } }"#,
            r#"{ "event": "willAppear", "action": "com.oraiopoulos.json-group.execute", "context": "b", "device": "dev",
                 "payload": { "settings": "broken", "coordinates": "nowhere", "controller": "Pedal" } }"#,
        ]
        .map(|l| l.replace('\n', " "))
        .join("\n");
        app.run(input.as_bytes()).await.unwrap();

        let a = app.host().settings("a").await.unwrap();
        assert_eq!(a.index, "-1");
        assert_eq!(a.delays, Vec::<u64>::new());
        assert_eq!(app.host().face("a").await.unwrap().0, "button 0");

        assert!(app.host().settings("b").await.is_some());
        assert_eq!(app.host().face("b").await.unwrap().0, "button 0");
    }

    #[tokio::test]
    async fn test_property_inspector_close_re_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let json = descriptor(dir.path());
        let mut app = App::new(
            &Config::default(),
            Arc::new(MemoryHost::new()),
            RecordingRunner::default(),
        );

        app.run(line("willAppear", GROUP_BUTTON_ACTION, "a", 0, "", 0).as_bytes())
            .await
            .unwrap();
        assert_eq!(app.host().face("a").await.unwrap().0, "button 0");

        let reconfigure = [
            line("didReceiveSettings", GROUP_BUTTON_ACTION, "a", 0, &json, 0),
            r#"{ "event": "propertyInspectorDidDisappear", "action": "com.oraiopoulos.json-group.execute", "context": "a", "device": "dev" }"#.to_string(),
        ]
        .join("\n");
        app.run(reconfigure.as_bytes()).await.unwrap();

        assert_eq!(app.host().face("a").await.unwrap().0, "Red");
    }
}
