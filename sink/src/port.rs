//! The side-effect capability the engine depends on.

use async_trait::async_trait;

use chaingate_types::{ChannelId, IdentityId, RoleId};

use crate::{Notification, SinkError};

#[async_trait]
pub trait RoleSink: Send + Sync {
    /// Grant `role` to `identity`. Granting a role the member already holds succeeds.
    async fn grant_role(&self, identity: &IdentityId, role: &RoleId) -> Result<(), SinkError>;

    /// Send a direct message. Best-effort: callers log and move on.
    async fn notify_direct(
        &self,
        identity: &IdentityId,
        notification: &Notification,
    ) -> Result<(), SinkError>;

    /// Post to a channel. Best-effort: callers log and move on.
    async fn announce(
        &self,
        channel: &ChannelId,
        notification: &Notification,
    ) -> Result<(), SinkError>;
}
