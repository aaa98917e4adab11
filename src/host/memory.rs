use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use super::protocol::{ImagePayload, OutboundMessage, TitlePayload};
use super::{ActionHost, ActionRef};
use crate::state::ButtonSettings;

/// What a registered action currently holds and shows
#[derive(Debug, Clone)]
struct Entry {
    action: ActionRef,
    settings: ButtonSettings,
    title: String,
    image: String,
}

/// Where outgoing host commands go
#[derive(Debug)]
enum Sink {
    Record(Mutex<Vec<OutboundMessage>>),
    Forward(mpsc::UnboundedSender<OutboundMessage>),
}

/// Host view backed by an in-memory registry of visible actions.
///
/// The registry mirrors what the host has told us (appear/disappear and
/// settings updates). Display and settings writes update the registry and
/// are either recorded or forwarded as [`OutboundMessage`]s.
#[derive(Debug)]
pub struct MemoryHost {
    actions: RwLock<BTreeMap<String, Entry>>,
    sink: Sink,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Host that keeps outgoing messages for inspection
    pub fn new() -> Self {
        Self {
            actions: RwLock::new(BTreeMap::new()),
            sink: Sink::Record(Mutex::new(Vec::new())),
        }
    }

    /// Host that forwards outgoing messages to a channel
    pub fn with_outbox(tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            actions: RwLock::new(BTreeMap::new()),
            sink: Sink::Forward(tx),
        }
    }

    /// Register (or re-register) a visible action
    pub async fn appear(&self, action: ActionRef, settings: ButtonSettings) {
        debug!("Action {} appeared on {}", action.context, action.device_id);
        let mut actions = self.actions.write().await;
        let entry = actions.entry(action.context.clone()).or_insert_with(|| Entry {
            action: action.clone(),
            settings: ButtonSettings::default(),
            title: String::new(),
            image: String::new(),
        });
        entry.action = action;
        entry.settings = settings;
    }

    pub async fn disappear(&self, context: &str) {
        debug!("Action {} disappeared", context);
        self.actions.write().await.remove(context);
    }

    /// Record settings the host reports, without echoing them back
    pub async fn store_settings(&self, context: &str, settings: ButtonSettings) {
        if let Some(entry) = self.actions.write().await.get_mut(context) {
            entry.settings = settings;
        }
    }

    pub async fn settings(&self, context: &str) -> Option<ButtonSettings> {
        self.actions
            .read()
            .await
            .get(context)
            .map(|e| e.settings.clone())
    }

    /// Current (title, image) shown by an action
    pub async fn face(&self, context: &str) -> Option<(String, String)> {
        self.actions
            .read()
            .await
            .get(context)
            .map(|e| (e.title.clone(), e.image.clone()))
    }

    /// Messages recorded so far; empty when forwarding
    pub fn sent(&self) -> Vec<OutboundMessage> {
        match &self.sink {
            Sink::Record(sent) => sent.lock().map(|s| s.clone()).unwrap_or_default(),
            Sink::Forward(_) => Vec::new(),
        }
    }

    fn emit(&self, message: OutboundMessage) {
        match &self.sink {
            Sink::Record(sent) => {
                if let Ok(mut sent) = sent.lock() {
                    sent.push(message);
                }
            }
            Sink::Forward(tx) => {
                if tx.send(message).is_err() {
                    warn!("Host outbox closed, dropping message");
                }
            }
        }
    }

    async fn update<F>(&self, action: &ActionRef, f: F) -> Result<()>
    where
        F: FnOnce(&mut Entry),
    {
        let mut actions = self.actions.write().await;
        let entry = actions
            .get_mut(&action.context)
            .ok_or_else(|| anyhow!("Unknown action context {}", action.context))?;
        f(entry);
        Ok(())
    }
}

impl ActionHost for MemoryHost {
    async fn visible_actions(&self, device_id: &str) -> Vec<ActionRef> {
        self.actions
            .read()
            .await
            .values()
            .filter(|e| e.action.device_id == device_id)
            .map(|e| e.action.clone())
            .collect()
    }

    async fn get_settings(&self, action: &ActionRef) -> Result<ButtonSettings> {
        self.settings(&action.context)
            .await
            .ok_or_else(|| anyhow!("Unknown action context {}", action.context))
    }

    async fn set_settings(&self, action: &ActionRef, settings: &ButtonSettings) -> Result<()> {
        self.update(action, |e| e.settings = settings.clone()).await?;
        self.emit(OutboundMessage::SetSettings {
            context: action.context.clone(),
            payload: settings.clone(),
        });
        Ok(())
    }

    async fn set_title(&self, action: &ActionRef, title: &str) -> Result<()> {
        self.update(action, |e| e.title = title.to_string()).await?;
        self.emit(OutboundMessage::SetTitle {
            context: action.context.clone(),
            payload: TitlePayload {
                title: title.to_string(),
            },
        });
        Ok(())
    }

    async fn set_image(&self, action: &ActionRef, image: &str) -> Result<()> {
        self.update(action, |e| e.image = image.to_string()).await?;
        self.emit(OutboundMessage::SetImage {
            context: action.context.clone(),
            payload: ImagePayload {
                image: image.to_string(),
            },
        });
        Ok(())
    }

    async fn show_ok(&self, action: &ActionRef) -> Result<()> {
        self.emit(OutboundMessage::ShowOk {
            context: action.context.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Controller, Coordinates};

    fn key(context: &str, device: &str) -> ActionRef {
        ActionRef {
            context: context.to_string(),
            device_id: device.to_string(),
            controller: Controller::Keypad,
            coordinates: Some(Coordinates { column: 0, row: 0 }),
        }
    }

    #[tokio::test]
    async fn test_visible_actions_filters_by_device() {
        let host = MemoryHost::new();
        host.appear(key("b", "dev1"), ButtonSettings::default()).await;
        host.appear(key("a", "dev1"), ButtonSettings::default()).await;
        host.appear(key("c", "dev2"), ButtonSettings::default()).await;

        let visible: Vec<_> = host
            .visible_actions("dev1")
            .await
            .into_iter()
            .map(|a| a.context)
            .collect();
        assert_eq!(visible, vec!["a", "b"]);

        host.disappear("a").await;
        assert_eq!(host.visible_actions("dev1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_writes_update_registry_and_record() {
        let host = MemoryHost::new();
        let action = key("a", "dev1");
        host.appear(action.clone(), ButtonSettings::default()).await;

        let settings = ButtonSettings {
            pressed: true,
            ..Default::default()
        };
        host.set_settings(&action, &settings).await.unwrap();
        host.set_title(&action, "T").await.unwrap();
        host.set_image(&action, "data:x").await.unwrap();

        assert!(host.get_settings(&action).await.unwrap().pressed);
        assert_eq!(
            host.face("a").await,
            Some(("T".to_string(), "data:x".to_string()))
        );
        assert_eq!(host.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_context_is_an_error() {
        let host = MemoryHost::new();
        let action = key("ghost", "dev1");
        assert!(host.get_settings(&action).await.is_err());
        assert!(host.set_title(&action, "x").await.is_err());
        assert!(host.sent().is_empty());
    }

    #[tokio::test]
    async fn test_forwarding_outbox() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = MemoryHost::with_outbox(tx);
        let action = key("a", "dev1");
        host.appear(action.clone(), ButtonSettings::default()).await;

        host.show_ok(&action).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::ShowOk {
                context: "a".to_string()
            })
        );
        assert!(host.sent().is_empty());
    }
}
