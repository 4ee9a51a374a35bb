//! # Brutal Tests for the Ledger Anchor (cc-04)
//!
//! Concurrent anchoring races and outage behaviour.

use std::sync::Arc;

use cc_04_ledger_anchor::{confirm, AnchorCheck, AnchorError, LedgerAnchor, LocalLedger};
use shared_types::SystemTimeSource;

fn ledger() -> Arc<LocalLedger> {
    Arc::new(LocalLedger::new("test-net", Arc::new(SystemTimeSource)))
}

// =============================================================================
// RACES
// =============================================================================

/// ATTACK: Race two different hashes for the same certificate.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_anchor_single_winner() {
    let ledger = ledger();
    let mut handles = Vec::new();
    for i in 0..16u8 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.anchor("CERT-RACE", [i; 32]).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(AnchorError::AlreadyAnchored { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(ledger.height(), 1);
    assert!(ledger.verify_chain().intact);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_anchors_stay_linked() {
    let ledger = ledger();
    let mut handles = Vec::new();
    for i in 0..32u8 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.anchor(&format!("CERT-{i}"), [i; 32]).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let report = ledger.verify_chain();
    assert!(report.intact);
    assert_eq!(report.blocks, 32);
}

// =============================================================================
// OUTAGES
// =============================================================================

/// ATTACK: Take the ledger down to dodge a mismatch check.
#[tokio::test]
async fn test_outage_never_reports_confirmed() {
    let ledger = ledger();
    ledger.anchor("CERT-1", [1; 32]).await.unwrap();
    ledger.set_online(false);

    assert_eq!(
        confirm(ledger.as_ref(), "CERT-1", &[9; 32]).await,
        AnchorCheck::Unavailable
    );
    assert!(ledger.lookup("CERT-1").await.is_err());
}
