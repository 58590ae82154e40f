//! Downstream effects of a recorded verification: role grant, direct
//! message, channel announcement.
//!
//! Every call here runs after the store write has committed. Failures are
//! logged and counted, never rolled back into the store.

use std::sync::Arc;
use std::time::Duration;

use chaingate_sink::{Notification, RoleSink, SinkError};
use chaingate_types::{ChannelId, ContractDefinition, IdentityId, TxHash};

use crate::EngineMetrics;

pub struct SideEffects {
    sink: Arc<dyn RoleSink>,
    dm_notifications: bool,
    /// Used when the contract has no channel of its own.
    default_channel: Option<ChannelId>,
    call_timeout: Duration,
    metrics: Arc<EngineMetrics>,
}

impl SideEffects {
    pub fn new(
        sink: Arc<dyn RoleSink>,
        dm_notifications: bool,
        default_channel: Option<ChannelId>,
        call_timeout: Duration,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            sink,
            dm_notifications,
            default_channel,
            call_timeout,
            metrics,
        }
    }

    pub fn sink(&self) -> &Arc<dyn RoleSink> {
        &self.sink
    }

    async fn timed<F>(&self, call: F) -> Result<(), SinkError>
    where
        F: std::future::Future<Output = Result<(), SinkError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SinkError::Unreachable(format!(
                "no answer within {:?}",
                self.call_timeout
            ))),
        }
    }

    /// Grant the contract's role.
    pub async fn grant(
        &self,
        identity: &IdentityId,
        contract: &ContractDefinition,
    ) -> Result<(), SinkError> {
        let result = self
            .timed(self.sink.grant_role(identity, &contract.role_id))
            .await;
        match &result {
            Ok(()) => tracing::info!(contract = %contract.id, role = %contract.role_id, "role granted"),
            Err(e) => {
                self.metrics.role_grant_failures.inc();
                tracing::error!(
                    contract = %contract.id,
                    role = %contract.role_id,
                    error = %e,
                    "role grant failed; verification stays recorded"
                );
            }
        }
        result
    }

    /// Tell the member directly, if enabled. Best-effort.
    pub async fn notify(
        &self,
        identity: &IdentityId,
        contract: &ContractDefinition,
        tx_hash: &TxHash,
    ) {
        if !self.dm_notifications {
            return;
        }
        let notification = Notification::verified_dm(&contract.name, tx_hash);
        if let Err(e) = self
            .timed(self.sink.notify_direct(identity, &notification))
            .await
        {
            self.metrics.notification_failures.inc();
            tracing::warn!(error = %e, "direct notification failed");
        }
    }

    /// Post one announcement listing `contracts`. Best-effort.
    ///
    /// Goes to the channel of the first listed contract that has one, else
    /// the default channel, else nowhere.
    pub async fn announce(&self, identity: &IdentityId, contracts: &[&ContractDefinition]) {
        let Some(channel) = contracts
            .iter()
            .find_map(|c| c.verification_channel_id.as_ref())
            .or(self.default_channel.as_ref())
        else {
            return;
        };
        let names: Vec<String> = contracts.iter().map(|c| c.name.clone()).collect();
        let notification = Notification::announcement(identity, &names);
        if let Err(e) = self.timed(self.sink.announce(channel, &notification)).await {
            self.metrics.notification_failures.inc();
            tracing::warn!(channel = %channel, error = %e, "announcement failed");
        }
    }
}
