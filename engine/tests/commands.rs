mod common;

use std::time::Duration;

use chaingate_engine::{CommandError, ContractReport};
use chaingate_nullables::SinkFailure;
use chaingate_store::VerificationStore;
use chaingate_types::IdentityId;

use common::*;

const MIXED_CASE: &str = "0xAbCdEf0000000000000000000000000000000001";

#[tokio::test]
async fn link_normalizes_and_rejects_duplicates() {
    let h = Harness::new(config());
    let commands = &h.engine.commands;

    let link = commands.link(&identity(1), MIXED_CASE).unwrap();
    assert_eq!(link.wallet.as_str(), MIXED_CASE.to_lowercase());

    let again = commands.link(&identity(1), "0x0000000000000000000000000000000000000002");
    assert!(matches!(again, Err(CommandError::AlreadyLinked { .. })));

    let taken = commands.link(&identity(2), &MIXED_CASE.to_uppercase().replace("0X", "0x"));
    assert!(matches!(taken, Err(CommandError::WalletTaken(_))));

    let invalid = commands.link(&identity(3), "0x1234");
    assert!(matches!(invalid, Err(CommandError::Invalid(_))));
}

#[tokio::test]
async fn verify_requires_a_link() {
    let h = Harness::new(config());
    let result = h.engine.commands.verify_now(&identity(9), None).await;
    assert!(matches!(result, Err(CommandError::NotLinked(_))));
}

#[tokio::test]
async fn verify_all_reports_each_contract() {
    let h = Harness::new(config());
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("a"), tx(1), 98, 3);

    let report = h.engine.commands.verify_now(&user, None).await.unwrap();
    assert_eq!(report.results.len(), 2);
    assert_eq!(
        report.results[0].2,
        ContractReport::Verified {
            role: role("R1"),
            tx_hash: tx(1)
        }
    );
    assert_eq!(
        report.results[1].2,
        ContractReport::NotVerified {
            reason: "no matching transaction found".into()
        }
    );
    assert_eq!(report.newly_verified(), 1);

    assert!(h.store.is_verified(&w, &cid("a")).unwrap());
    assert_eq!(h.sink.grants(), vec![(user, role("R1"))]);
    assert_eq!(h.sink.announcements().len(), 1);
}

#[tokio::test]
async fn failed_grant_is_reported_but_stays_recorded() {
    let h = Harness::new(config());
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("a"), tx(1), 98, 3);
    h.sink.fail_role(&role("R1"), SinkFailure::Forbidden);

    let report = h.engine.commands.verify_now(&user, Some("a")).await.unwrap();
    match &report.results[0].2 {
        ContractReport::VerifiedRoleFailed {
            role: granted,
            tx_hash,
            reason,
        } => {
            assert_eq!(granted, &role("R1"));
            assert_eq!(tx_hash, &tx(1));
            assert!(reason.contains("forbidden"), "{reason}");
        }
        other => panic!("expected a failed grant, got {other:?}"),
    }
    assert_eq!(report.newly_verified(), 1);
    assert!(h.sink.grants().is_empty());
    assert!(h.store.is_verified(&w, &cid("a")).unwrap());

    // Recorded, so a second run neither re-queries nor re-grants.
    let again = h.engine.commands.verify_now(&user, Some("a")).await.unwrap();
    assert_eq!(again.results[0].2, ContractReport::AlreadyVerified);
}

#[tokio::test]
async fn one_announcement_lists_every_new_verification() {
    let h = Harness::new(config());
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("a"), tx(1), 98, 3);
    h.chain.found(&w, &cid("b"), tx(2), 97, 4);

    let report = h.engine.commands.verify_now(&user, None).await.unwrap();
    assert_eq!(report.newly_verified(), 2);
    assert_eq!(h.sink.grants().len(), 2);
    assert_eq!(h.sink.direct_messages().len(), 2);

    let announcements = h.sink.announcements();
    assert_eq!(announcements.len(), 1);
    assert_eq!(
        announcements[0].1.fields[0].1,
        "✅ Contract A\n✅ Contract B"
    );
}

#[tokio::test]
async fn reasons_are_specific() {
    let mut cfg = config();
    cfg.contracts[0].min_confirmations = Some(3);
    let h = Harness::new(cfg);
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("a"), tx(1), 100, 1);
    h.chain.take_down(&cid("b"));

    let report = h.engine.commands.verify_now(&user, None).await.unwrap();
    assert_eq!(
        report.results[0].2,
        ContractReport::NotVerified {
            reason: "insufficient confirmations (have 1, need 3)".into()
        }
    );
    match &report.results[1].2 {
        ContractReport::NotVerified { reason } => assert!(reason.starts_with("internal error:")),
        other => panic!("expected internal error, got {other:?}"),
    }
    assert!(h.sink.grants().is_empty());
    assert!(h.sink.announcements().is_empty());
}

#[tokio::test]
async fn already_verified_skips_chain_and_grant() {
    let h = Harness::new(config());
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("a"), tx(1), 98, 3);

    h.engine.commands.verify_now(&user, Some("a")).await.unwrap();
    let report = h.engine.commands.verify_now(&user, Some("a")).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].2, ContractReport::AlreadyVerified);
    assert_eq!(h.chain.calls_for(&w, &cid("a")), 1);
    assert_eq!(h.sink.grants().len(), 1);
}

#[tokio::test]
async fn contract_selected_by_name_any_case() {
    let h = Harness::new(config());
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("b"), tx(2), 98, 3);

    let report = h
        .engine
        .commands
        .verify_now(&user, Some("contract b"))
        .await
        .unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].0, cid("b"));
    assert!(h.chain.calls_for(&w, &cid("a")) == 0);
}

#[tokio::test]
async fn unknown_contract_lists_available_names() {
    let h = Harness::new(config());
    let (user, _) = h.link(1);
    let err = h
        .engine
        .commands
        .verify_now(&user, Some("gamma"))
        .await
        .unwrap_err();
    match err {
        CommandError::UnknownContract {
            requested,
            available,
        } => {
            assert_eq!(requested, "gamma");
            assert_eq!(available, "Contract A, Contract B");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn store_write_failure_is_reported_not_granted() {
    let h = Harness::new(config());
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("a"), tx(1), 98, 3);
    h.store.fail_writes(true);

    let report = h.engine.commands.verify_now(&user, Some("a")).await.unwrap();
    assert!(matches!(
        &report.results[0].2,
        ContractReport::NotVerified { reason } if reason.starts_with("internal error:")
    ));
    assert!(h.sink.grants().is_empty());
}

#[tokio::test]
async fn command_racing_a_cycle_grants_once() {
    let mut cfg = config();
    cfg.contracts.truncate(1);
    let h = Harness::new(cfg);
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("a"), tx(1), 98, 3);
    h.chain.set_delay(Duration::from_millis(50));

    let (cycle, command) = tokio::join!(
        h.engine.scheduler.run_cycle(),
        h.engine.commands.verify_now(&user, None)
    );
    let cycle = cycle.unwrap();
    let command = command.unwrap();

    assert_eq!(h.sink.grants(), vec![(user, role("R1"))]);
    assert_eq!(h.store.record_calls(), 2);
    let command_won = matches!(command.results[0].2, ContractReport::Verified { .. });
    assert_eq!(cycle.verified + usize::from(command_won), 1);
}

#[tokio::test]
async fn status_shows_progress() {
    let h = Harness::new(config());
    let (user, w) = h.link(1);
    h.chain.found(&w, &cid("b"), tx(7), 98, 3);
    h.engine.commands.verify_now(&user, None).await.unwrap();

    let status = h.engine.commands.status(&user).unwrap();
    assert_eq!(status.wallet, w);
    assert_eq!(status.verified_count, 1);
    assert_eq!(status.progress_percent, 50);
    assert!(!status.contracts[0].verified);
    assert!(status.contracts[1].verified);
    assert_eq!(status.contracts[1].tx_hash, Some(tx(7)));

    let missing = h.engine.commands.status(&IdentityId::new("nobody").unwrap());
    assert!(matches!(missing, Err(CommandError::NotLinked(_))));
}

#[tokio::test]
async fn stats_combine_store_cycles_and_connectivity() {
    let h = Harness::new(config());
    let (user, w) = h.link(1);
    h.link(2);
    h.chain.found(&w, &cid("a"), tx(1), 98, 3);
    h.chain.set_latest_block(4242);
    h.engine.commands.verify_now(&user, Some("a")).await.unwrap();
    h.engine.scheduler.run_cycle().await.unwrap();
    h.chain.take_down(&cid("b"));

    let stats = h.engine.commands.stats().await.unwrap();
    assert_eq!(stats.store.total_users, 2);
    assert_eq!(stats.store.verified_users, 1);
    assert_eq!(stats.store.pending_users, 2);
    assert_eq!(stats.store.per_contract, vec![(cid("a"), 1), (cid("b"), 0)]);
    assert_eq!(stats.contract_names, vec!["Contract A", "Contract B"]);
    assert_eq!(stats.cycles.total_runs, 1);
    assert_eq!(stats.chains[0].latest_block, Some(4242));
    assert!(stats.chains[1].latest_block.is_none());
    assert!(stats.chains[1].error.is_some());
}
