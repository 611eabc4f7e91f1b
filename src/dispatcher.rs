//! Outbound dock commands.

use std::sync::Arc;

use log::debug;
use serde_json::json;

use crate::remote::RemoteCall;
use crate::state::{Effect, Rgb, Speed};

/// Fire-and-forget command sender.
///
/// Commands optimistically assume success: the response body is ignored and
/// failures are dropped after a debug log. The next status fetch reflects
/// whatever the backend actually applied.
pub struct CommandDispatcher {
    client: Arc<dyn RemoteCall>,
}

impl CommandDispatcher {
    pub fn new(client: Arc<dyn RemoteCall>) -> Self {
        Self { client }
    }

    /// Switch lighting output on or off.
    pub async fn set_state(&self, enabled: bool) {
        self.send("change_state", json!({ "state": enabled })).await;
    }

    /// Select the lighting pattern.
    pub async fn set_effect(&self, effect: Effect) {
        self.send("change_effect", json!({ "effect": effect.code() })).await;
    }

    /// Select the pattern speed.
    pub async fn set_speed(&self, speed: Speed) {
        self.send("change_speed", json!({ "speed": speed.code() })).await;
    }

    /// Select the static colour.
    pub async fn set_colour(&self, colour: Rgb) {
        self.send("change_colour", json!({ "r": colour.r, "g": colour.g, "b": colour.b }))
            .await;
    }

    async fn send(&self, method: &str, args: serde_json::Value) {
        if let Err(err) = self.client.call(method, args).await {
            debug!("{} failed: {}", method, err);
        }
    }
}
