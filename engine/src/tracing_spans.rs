//! Span constructors shared by the scheduler and the command path, so log
//! lines from both carry the same field names.

use tracing::{info_span, Span};

use chaingate_types::{IdentityId, WalletAddress};

/// One scheduler cycle.
pub fn cycle_span(run: u64) -> Span {
    info_span!("cycle", run = run)
}

/// One user's verification routine inside a cycle.
pub fn wallet_span(identity: &IdentityId, wallet: &WalletAddress) -> Span {
    info_span!("wallet", identity = %identity, wallet = %wallet.short())
}

/// One on-demand command.
pub fn command_span(command: &'static str, identity: &IdentityId) -> Span {
    info_span!("command", command = command, identity = %identity)
}
