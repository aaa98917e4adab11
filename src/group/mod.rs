//! Keeps every button of a group consistent with the descriptor and each other

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::descriptor::{DescriptorResolver, ResolvedButton};
use crate::error::ResolveError;
use crate::host::{ActionHost, ActionRef};
use crate::state::{project, ButtonSettings};

/// Group-wide operations over the host's visible buttons
pub struct GroupSync<H> {
    host: Arc<H>,
    resolver: DescriptorResolver,
    refresh_pause: Duration,
}

impl<H> Clone for GroupSync<H> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            resolver: self.resolver.clone(),
            refresh_pause: self.refresh_pause,
        }
    }
}

impl<H: ActionHost> GroupSync<H> {
    pub fn new(host: Arc<H>, resolver: DescriptorResolver, refresh_pause: Duration) -> Self {
        Self {
            host,
            resolver,
            refresh_pause,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Grid keys on `device_id`
    pub async fn device_keys(&self, device_id: &str) -> Vec<ActionRef> {
        self.host
            .visible_actions(device_id)
            .await
            .into_iter()
            .filter(ActionRef::is_grid_key)
            .collect()
    }

    /// Grid keys on `device_id` whose descriptor is `descriptor_file`, with their settings
    pub async fn group_members(
        &self,
        device_id: &str,
        descriptor_file: &str,
    ) -> Vec<(ActionRef, ButtonSettings)> {
        let mut members = Vec::new();
        for action in self.device_keys(device_id).await {
            match self.host.get_settings(&action).await {
                Ok(settings) if settings.json == descriptor_file => members.push((action, settings)),
                Ok(_) => {}
                Err(e) => warn!("Skipping {}: {}", action.context, e),
            }
        }
        members
    }

    /// Show the settings' projection without any descriptor access
    pub async fn fast_update(&self, action: &ActionRef, settings: &ButtonSettings) -> Result<()> {
        let face = project(settings);
        self.host.set_title(action, &face.title).await?;
        self.host.set_image(action, &face.image).await?;
        Ok(())
    }

    /// Turn off the pressed state of every button in the group.
    ///
    /// Must finish before the caller marks its own button pressed.
    pub async fn clear_siblings(&self, device_id: &str, descriptor_file: &str) {
        let members = self.group_members(device_id, descriptor_file).await;
        debug!(
            "Clearing {} buttons of group {:?} on {}",
            members.len(),
            descriptor_file,
            device_id
        );

        for (action, mut settings) in members {
            settings.pressed = false;
            if let Err(e) = self.store_and_show(&action, &settings).await {
                warn!("Failed to clear {}: {}", action.context, e);
            }
        }
    }

    async fn store_and_show(&self, action: &ActionRef, settings: &ButtonSettings) -> Result<()> {
        self.host.set_settings(action, settings).await?;
        self.fast_update(action, settings).await
    }

    /// Re-resolve every grid key on the device, one at a time
    pub async fn refresh_group(&self, device_id: &str) {
        let keys = self.device_keys(device_id).await;
        info!("Refreshing {} buttons on {}", keys.len(), device_id);

        for (i, action) in keys.iter().enumerate() {
            if i > 0 && !self.refresh_pause.is_zero() {
                sleep(self.refresh_pause).await;
            }
            if let Err(e) = self.update_button_details(action).await {
                warn!("Failed to refresh {}: {}", action.context, e);
            }
        }
    }

    /// Resolve one button from its descriptor, persist and show it
    pub async fn update_button_details(&self, action: &ActionRef) -> Result<()> {
        let mut settings = self.host.get_settings(action).await?;

        match self.resolve(&settings).await {
            Ok(resolved) => {
                settings.apply(resolved);
                self.store_and_show(action, &settings).await?;
                if action.is_key() {
                    self.host.show_ok(action).await?;
                }
            }
            Err(e) => {
                let index = settings.index_number().unwrap_or(0);
                if settings.has_identity() {
                    warn!("Button {} falls back to defaults: {}", action.context, e);
                }
                self.host
                    .set_title(action, &format!("button {}", index))
                    .await?;
                self.host.set_image(action, "").await?;
                settings.reset_unresolved();
                self.host.set_settings(action, &settings).await?;
            }
        }
        Ok(())
    }

    async fn resolve(&self, settings: &ButtonSettings) -> Result<ResolvedButton, ResolveError> {
        let index = match settings.index_number() {
            Some(index) if settings.has_identity() => index,
            _ => return Err(ResolveError::MissingIdentity),
        };
        self.resolver.resolve(Path::new(&settings.json), index).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::protocol::OutboundMessage;
    use crate::host::{Controller, Coordinates, MemoryHost};
    use std::path::PathBuf;

    fn key(context: &str, column: u32) -> ActionRef {
        ActionRef {
            context: context.to_string(),
            device_id: "dev".to_string(),
            controller: Controller::Keypad,
            coordinates: Some(Coordinates { column, row: 0 }),
        }
    }

    fn member(json: &str, index: &str, pressed: bool) -> ButtonSettings {
        ButtonSettings {
            pressed,
            json: json.to_string(),
            index: index.to_string(),
            title: Some(format!("t{}", index)),
            ..Default::default()
        }
    }

    fn sync(host: &Arc<MemoryHost>) -> GroupSync<MemoryHost> {
        GroupSync::new(host.clone(), DescriptorResolver::new(500), Duration::from_millis(200))
    }

    fn write_descriptor(dir: &Path) -> PathBuf {
        let path = dir.join("group.json");
        std::fs::write(
            &path,
            r#"{ "files": [ { "title": "Red", "script": ["a.sh", "b.sh"] },
                           { "title": "Blue" } ] }"#,
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_clear_siblings_only_touches_group() {
        let host = Arc::new(MemoryHost::new());
        host.appear(key("a", 0), member("g.json", "0", true)).await;
        host.appear(key("b", 1), member("g.json", "1", false)).await;
        host.appear(key("c", 2), member("other.json", "0", true)).await;
        let mut encoder = key("d", 3);
        encoder.controller = Controller::Encoder;
        host.appear(encoder, member("g.json", "2", true)).await;

        sync(&host).clear_siblings("dev", "g.json").await;

        assert!(!host.settings("a").await.unwrap().pressed);
        assert!(!host.settings("b").await.unwrap().pressed);
        assert!(host.settings("c").await.unwrap().pressed);
        assert!(host.settings("d").await.unwrap().pressed);
        assert_eq!(host.face("a").await.unwrap().0, "t0");
    }

    #[tokio::test]
    async fn test_update_button_details_resolves_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_descriptor(dir.path());
        let json = file.to_string_lossy().to_string();

        let host = Arc::new(MemoryHost::new());
        host.appear(key("a", 0), member(&json, "0", true)).await;

        sync(&host).update_button_details(&key("a", 0)).await.unwrap();

        let settings = host.settings("a").await.unwrap();
        assert!(settings.pressed);
        assert_eq!(settings.title.as_deref(), Some("Red"));
        assert_eq!(settings.scripts, vec!["a.sh", "b.sh"]);
        assert_eq!(settings.delays, vec![500]);
        assert_eq!(host.face("a").await.unwrap().0, "Red *");
        assert!(host
            .sent()
            .contains(&OutboundMessage::ShowOk { context: "a".to_string() }));
    }

    #[tokio::test]
    async fn test_update_button_details_falls_back_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("absent.json").to_string_lossy().to_string();

        let host = Arc::new(MemoryHost::new());
        let mut stale = member(&json, "3", false);
        stale.image_url = "data:old".to_string();
        stale.scripts = vec!["old.sh".to_string()];
        host.appear(key("a", 0), stale).await;

        sync(&host).update_button_details(&key("a", 0)).await.unwrap();

        assert_eq!(
            host.face("a").await,
            Some(("button 3".to_string(), String::new()))
        );
        let settings = host.settings("a").await.unwrap();
        assert_eq!(settings.title.as_deref(), Some("button 4"));
        assert_eq!(settings.image_url, "");
        assert!(settings.scripts.is_empty());
        assert!(!host.sent().iter().any(|m| matches!(m, OutboundMessage::ShowOk { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_group_is_device_wide_and_paced() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_descriptor(dir.path());
        let json = file.to_string_lossy().to_string();

        let host = Arc::new(MemoryHost::new());
        host.appear(key("a", 0), member(&json, "0", false)).await;
        host.appear(key("b", 1), member(&json, "1", false)).await;
        host.appear(key("c", 2), member("elsewhere.json", "0", false)).await;
        let mut offgrid = key("d", 3);
        offgrid.coordinates = None;
        host.appear(offgrid, member(&json, "0", false)).await;

        let start = tokio::time::Instant::now();
        sync(&host).refresh_group("dev").await;

        assert_eq!(host.face("a").await.unwrap().0, "Red");
        assert_eq!(host.face("b").await.unwrap().0, "Blue");
        assert_eq!(host.face("c").await.unwrap().0, "button 0");
        assert_eq!(host.face("d").await.unwrap().0, "");
        assert!(start.elapsed() >= Duration::from_millis(400));
    }
}
