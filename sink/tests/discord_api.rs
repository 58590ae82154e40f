//! `DiscordSink` against an in-process stand-in for the REST API.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use chaingate_sink::{DiscordConfig, DiscordSink, Notification, RoleSink, SinkError};
use chaingate_types::{ChannelId, IdentityId, RoleId};

const FORBIDDEN_ROLE: &str = "999";
const MISSING_MEMBER: &str = "404404";

#[derive(Default)]
struct MockApi {
    grants: Mutex<Vec<(String, String, String)>>,
    messages: Mutex<Vec<(String, Value)>>,
    auth: Mutex<Vec<String>>,
}

async fn grant(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Path((guild, member, role)): Path<(String, String, String)>,
) -> StatusCode {
    if let Some(h) = headers.get("authorization") {
        api.auth.lock().unwrap().push(h.to_str().unwrap().to_string());
    }
    if role == FORBIDDEN_ROLE {
        return StatusCode::FORBIDDEN;
    }
    if member == MISSING_MEMBER {
        return StatusCode::NOT_FOUND;
    }
    api.grants.lock().unwrap().push((guild, member, role));
    StatusCode::NO_CONTENT
}

async fn open_dm(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let recipient = body["recipient_id"].as_str().unwrap_or_default().to_string();
    if recipient == MISSING_MEMBER {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Unknown User"})));
    }
    (StatusCode::OK, Json(json!({"id": format!("dm-{recipient}")})))
}

async fn message(
    State(api): State<Arc<MockApi>>,
    Path(channel): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if channel == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Unknown Channel"})));
    }
    api.messages.lock().unwrap().push((channel, body));
    (StatusCode::OK, Json(json!({"id": "1"})))
}

async fn spawn_api() -> (Arc<MockApi>, DiscordSink) {
    let api = Arc::new(MockApi::default());
    let app = Router::new()
        .route("/guilds/:guild/members/:member/roles/:role", put(grant))
        .route("/users/@me/channels", post(open_dm))
        .route("/channels/:channel/messages", post(message))
        .with_state(api.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let sink = DiscordSink::new(DiscordConfig {
        api_base: format!("http://{addr}"),
        token: "secret".into(),
        guild_id: "42".into(),
        ..Default::default()
    })
    .unwrap();
    (api, sink)
}

fn notification() -> Notification {
    Notification::announcement(&IdentityId::new("7").unwrap(), &["Alpha".to_string()])
}

#[tokio::test]
async fn grant_role_hits_guild_member_endpoint() {
    let (api, sink) = spawn_api().await;
    sink.grant_role(&IdentityId::new("7").unwrap(), &RoleId::new("100").unwrap())
        .await
        .unwrap();

    let grants = api.grants.lock().unwrap().clone();
    assert_eq!(grants, vec![("42".into(), "7".into(), "100".into())]);
    assert_eq!(api.auth.lock().unwrap()[0], "Bot secret");
}

#[tokio::test]
async fn grant_role_maps_forbidden_and_not_found() {
    let (_api, sink) = spawn_api().await;
    let forbidden = sink
        .grant_role(&IdentityId::new("7").unwrap(), &RoleId::new(FORBIDDEN_ROLE).unwrap())
        .await;
    assert!(matches!(forbidden, Err(SinkError::Forbidden(_))));

    let missing = sink
        .grant_role(&IdentityId::new(MISSING_MEMBER).unwrap(), &RoleId::new("100").unwrap())
        .await;
    assert!(matches!(missing, Err(SinkError::NotFound(_))));
}

#[tokio::test]
async fn direct_message_opens_channel_then_posts_embed() {
    let (api, sink) = spawn_api().await;
    sink.notify_direct(&IdentityId::new("7").unwrap(), &notification())
        .await
        .unwrap();

    let messages = api.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "dm-7");
    assert_eq!(messages[0].1["embeds"][0]["title"], "🎉 New Verification!");
}

#[tokio::test]
async fn direct_message_to_unknown_user_is_not_found() {
    let (api, sink) = spawn_api().await;
    let result = sink
        .notify_direct(&IdentityId::new(MISSING_MEMBER).unwrap(), &notification())
        .await;
    assert!(matches!(result, Err(SinkError::NotFound(_))));
    assert!(api.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn announce_posts_to_channel() {
    let (api, sink) = spawn_api().await;
    sink.announce(&ChannelId::new("555").unwrap(), &notification())
        .await
        .unwrap();
    assert_eq!(api.messages.lock().unwrap()[0].0, "555");

    let missing = sink
        .announce(&ChannelId::new("missing").unwrap(), &notification())
        .await;
    assert!(matches!(missing, Err(SinkError::NotFound(_))));
}

#[tokio::test]
async fn unreachable_api() {
    let sink = DiscordSink::new(DiscordConfig {
        api_base: "http://127.0.0.1:1".into(),
        ..Default::default()
    })
    .unwrap();
    let result = sink
        .announce(&ChannelId::new("555").unwrap(), &notification())
        .await;
    assert!(matches!(result, Err(SinkError::Unreachable(_))));
}
