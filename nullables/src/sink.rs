//! Nullable sink: records every platform effect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use chaingate_sink::{Notification, RoleSink, SinkError};
use chaingate_types::{ChannelId, IdentityId, RoleId};

/// Failure a [`NullSink`] returns for a scripted role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkFailure {
    NotFound,
    Forbidden,
    Unreachable,
}

impl SinkFailure {
    fn to_error(self, what: &str) -> SinkError {
        match self {
            SinkFailure::NotFound => SinkError::NotFound(what.to_string()),
            SinkFailure::Forbidden => SinkError::Forbidden(what.to_string()),
            SinkFailure::Unreachable => SinkError::Unreachable(what.to_string()),
        }
    }
}

/// A [`RoleSink`] that remembers what it was asked to do.
#[derive(Default)]
pub struct NullSink {
    grants: Mutex<Vec<(IdentityId, RoleId)>>,
    direct: Mutex<Vec<(IdentityId, Notification)>>,
    announcements: Mutex<Vec<(ChannelId, Notification)>>,
    role_failures: Mutex<HashMap<String, SinkFailure>>,
    fail_messages: AtomicBool,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make grants of `role` fail with `failure`.
    pub fn fail_role(&self, role: &RoleId, failure: SinkFailure) {
        self.role_failures
            .lock()
            .unwrap()
            .insert(role.to_string(), failure);
    }

    /// Make direct messages and announcements fail.
    pub fn fail_messages(&self, fail: bool) {
        self.fail_messages.store(fail, Ordering::SeqCst);
    }

    /// Successful grants, in call order.
    pub fn grants(&self) -> Vec<(IdentityId, RoleId)> {
        self.grants.lock().unwrap().clone()
    }

    pub fn direct_messages(&self) -> Vec<(IdentityId, Notification)> {
        self.direct.lock().unwrap().clone()
    }

    pub fn announcements(&self) -> Vec<(ChannelId, Notification)> {
        self.announcements.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoleSink for NullSink {
    async fn grant_role(&self, identity: &IdentityId, role: &RoleId) -> Result<(), SinkError> {
        if let Some(failure) = self.role_failures.lock().unwrap().get(role.as_str()) {
            return Err(failure.to_error(&format!("role {role}")));
        }
        self.grants
            .lock()
            .unwrap()
            .push((identity.clone(), role.clone()));
        Ok(())
    }

    async fn notify_direct(
        &self,
        identity: &IdentityId,
        notification: &Notification,
    ) -> Result<(), SinkError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(SinkError::Forbidden(format!("dm to {identity}")));
        }
        self.direct
            .lock()
            .unwrap()
            .push((identity.clone(), notification.clone()));
        Ok(())
    }

    async fn announce(
        &self,
        channel: &ChannelId,
        notification: &Notification,
    ) -> Result<(), SinkError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(SinkError::NotFound(format!("channel {channel}")));
        }
        self.announcements
            .lock()
            .unwrap()
            .push((channel.clone(), notification.clone()));
        Ok(())
    }
}
