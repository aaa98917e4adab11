//! JSON messages exchanged with the host, one per line

use serde::{Deserialize, Serialize};

use super::{ActionRef, Controller, Coordinates};
use crate::descriptor::lenient;
use crate::state::ButtonSettings;

/// Action UUID of the descriptor-driven group button
pub const GROUP_BUTTON_ACTION: &str = "com.oraiopoulos.json-group.execute";

/// Action UUID of the device refresh button
pub const REFRESH_ACTION: &str = "com.oraiopoulos.json-group.refresh";

/// Event names the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InboundEvent {
    WillAppear,
    WillDisappear,
    DidReceiveSettings,
    KeyDown,
    KeyUp,
    PropertyInspectorDidDisappear,
    #[serde(other)]
    Other,
}

/// Message from the host about one action instance
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub event: InboundEvent,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub payload: Option<InboundPayload>,
}

/// Payload fields fall back to defaults on their own so the event still dispatches
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundPayload {
    #[serde(default, deserialize_with = "lenient::field")]
    pub settings: ButtonSettings,
    #[serde(default, deserialize_with = "lenient::field")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, deserialize_with = "lenient::field")]
    pub controller: Controller,
}

impl InboundMessage {
    /// Action reference described by this message
    pub fn action_ref(&self) -> ActionRef {
        let payload = self.payload.clone().unwrap_or_default();
        ActionRef {
            context: self.context.clone(),
            device_id: self.device.clone(),
            controller: payload.controller,
            coordinates: payload.coordinates,
        }
    }

    pub fn settings(&self) -> Option<&ButtonSettings> {
        self.payload.as_ref().map(|p| &p.settings)
    }
}

/// Command sent to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundMessage {
    SetTitle {
        context: String,
        payload: TitlePayload,
    },
    SetImage {
        context: String,
        payload: ImagePayload,
    },
    SetSettings {
        context: String,
        payload: ButtonSettings,
    },
    ShowOk {
        context: String,
    },
}

impl OutboundMessage {
    pub fn context(&self) -> &str {
        match self {
            OutboundMessage::SetTitle { context, .. }
            | OutboundMessage::SetImage { context, .. }
            | OutboundMessage::SetSettings { context, .. }
            | OutboundMessage::ShowOk { context } => context,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePayload {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePayload {
    pub image: String,
}
