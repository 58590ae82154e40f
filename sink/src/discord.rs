//! Discord REST implementation of the sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use chaingate_types::{ChannelId, IdentityId, RoleId};

use crate::{Notification, RoleSink, SinkError};

/// Production API root.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Embed accent colour (green).
const EMBED_COLOR: u32 = 0x00ff00;

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub api_base: String,
    pub token: String,
    pub guild_id: String,
    pub request_timeout: Duration,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: String::new(),
            guild_id: String::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Deserialize)]
struct DmChannel {
    id: String,
}

/// Bot-token client for a single guild.
pub struct DiscordSink {
    http: reqwest::Client,
    config: DiscordConfig,
}

impl DiscordSink {
    pub fn new(config: DiscordConfig) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SinkError::RequestFailed(format!("building HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.config.token)
    }

    async fn send_message(
        &self,
        channel_id: &str,
        notification: &Notification,
    ) -> Result<(), SinkError> {
        let response = self
            .http
            .post(self.url(&format!("/channels/{channel_id}/messages")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(&embed_body(notification))
            .send()
            .await?;
        check_status(response.status(), &format!("channel {channel_id}"))
    }
}

fn embed_body(notification: &Notification) -> serde_json::Value {
    let fields: Vec<serde_json::Value> = notification
        .fields
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value, "inline": false }))
        .collect();
    json!({
        "embeds": [{
            "title": notification.title,
            "description": notification.description,
            "color": EMBED_COLOR,
            "fields": fields,
        }]
    })
}

fn check_status(status: StatusCode, what: &str) -> Result<(), SinkError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(SinkError::NotFound(what.to_string())),
        StatusCode::FORBIDDEN => Err(SinkError::Forbidden(what.to_string())),
        s => Err(SinkError::RequestFailed(format!("{what}: HTTP status {s}"))),
    }
}

#[async_trait]
impl RoleSink for DiscordSink {
    async fn grant_role(&self, identity: &IdentityId, role: &RoleId) -> Result<(), SinkError> {
        let path = format!(
            "/guilds/{}/members/{identity}/roles/{role}",
            self.config.guild_id
        );
        let response = self
            .http
            .put(self.url(&path))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?;
        check_status(response.status(), &format!("role {role} for member {identity}"))
    }

    async fn notify_direct(
        &self,
        identity: &IdentityId,
        notification: &Notification,
    ) -> Result<(), SinkError> {
        let response = self
            .http
            .post(self.url("/users/@me/channels"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(&json!({ "recipient_id": identity.as_str() }))
            .send()
            .await?;
        check_status(response.status(), &format!("dm channel for {identity}"))?;
        let channel: DmChannel = response
            .json()
            .await
            .map_err(|e| SinkError::RequestFailed(format!("bad dm channel response: {e}")))?;
        self.send_message(&channel.id, notification).await
    }

    async fn announce(
        &self,
        channel: &ChannelId,
        notification: &Notification,
    ) -> Result<(), SinkError> {
        self.send_message(channel.as_str(), notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(check_status(StatusCode::NO_CONTENT, "x").is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "x"),
            Err(SinkError::NotFound(_))
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, "x"),
            Err(SinkError::Forbidden(_))
        ));
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR, "x"),
            Err(SinkError::RequestFailed(_))
        ));
    }

    #[test]
    fn embed_carries_fields() {
        let n = Notification {
            title: "t".into(),
            description: "d".into(),
            fields: vec![("k".into(), "v".into())],
        };
        let body = embed_body(&n);
        assert_eq!(body["embeds"][0]["title"], "t");
        assert_eq!(body["embeds"][0]["fields"][0]["name"], "k");
        assert_eq!(body["embeds"][0]["color"], EMBED_COLOR);
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        let sink = DiscordSink::new(DiscordConfig {
            api_base: "http://localhost:1/api/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sink.url("/x"), "http://localhost:1/api/x");
    }
}
