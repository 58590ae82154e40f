//! Human-readable command output.

use std::fmt::Write;

use chaingate_engine::{ContractReport, StatsReport, StatusReport, VerifyReport};
use chaingate_types::{ContractDefinition, IdentityLink, Timestamp};
use chaingate_utils::format_ago;

fn age(ts: Timestamp) -> String {
    format_ago(Some(Timestamp::now().as_secs().saturating_sub(ts.as_secs())))
}

pub fn link(link: &IdentityLink) -> String {
    format!(
        "linked {} to {}\nrun `chaingate verify --identity {}` to check your contracts",
        link.identity, link.wallet, link.identity
    )
}

pub fn verify(report: &VerifyReport) -> String {
    let mut out = format!("verification results for {}\n", report.wallet);
    for (_, name, result) in &report.results {
        let _ = match result {
            ContractReport::Verified { role, tx_hash } => {
                writeln!(out, "  ✅ {name} → role {role} ({})", tx_hash.short())
            }
            ContractReport::VerifiedRoleFailed {
                role,
                tx_hash,
                reason,
            } => writeln!(
                out,
                "  ⚠️ {name}: verified ({}) but role {role} was not granted: {reason}",
                tx_hash.short()
            ),
            ContractReport::AlreadyVerified => writeln!(out, "  📋 {name}: already verified"),
            ContractReport::NotVerified { reason } => writeln!(out, "  ❌ {name}: {reason}"),
        };
    }
    out.trim_end().to_string()
}

pub fn status(status: &StatusReport, total: usize) -> String {
    let mut out = format!(
        "wallet:   {}\nlinked:   {}\nprogress: {}/{} ({}%)\n",
        status.wallet,
        age(status.linked_at),
        status.verified_count,
        total,
        status.progress_percent
    );
    for contract in &status.contracts {
        let mark = if contract.verified { "✅" } else { "❌" };
        let _ = writeln!(out, "  {mark} {}", contract.name);
    }
    out.trim_end().to_string()
}

pub fn stats(stats: &StatsReport, chain_name: &str) -> String {
    let mut out = format!(
        "users:    {} total, {} verified, {} pending\n",
        stats.store.total_users, stats.store.verified_users, stats.store.pending_users
    );
    for ((_, count), name) in stats.store.per_contract.iter().zip(&stats.contract_names) {
        let _ = writeln!(out, "  {name}: {count} verified");
    }
    let last_run = stats.cycles.last_run.map(age).unwrap_or_else(|| format_ago(None));
    let _ = writeln!(
        out,
        "cycles:   {} run, {} checked, {} verified, last {}{}",
        stats.cycles.total_runs,
        stats.cycles.total_checked,
        stats.cycles.total_verified,
        last_run,
        if stats.cycles.currently_running { " (running)" } else { "" }
    );
    let _ = writeln!(out, "chain:    {chain_name}");
    for chain in &stats.chains {
        let _ = match (chain.latest_block, &chain.error) {
            (Some(block), _) => writeln!(out, "  ✅ {}: block {block}", chain.contract),
            (None, Some(e)) => writeln!(out, "  ❌ {}: offline ({e})", chain.contract),
            (None, None) => writeln!(out, "  ❌ {}: offline", chain.contract),
        };
    }
    out.trim_end().to_string()
}

pub fn contracts(contracts: &[ContractDefinition]) -> String {
    let mut out = String::new();
    for (i, c) in contracts.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} [{}] {}... → role {}",
            i + 1,
            c.name,
            c.id,
            c.address.short(),
            c.role_id
        );
    }
    out.trim_end().to_string()
}
