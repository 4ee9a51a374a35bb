//! # Certificate Lifecycle Flows
//!
//! Eligibility (cc-01) → registry (cc-02) → verification log (cc-03) →
//! ledger (cc-04), all wired by the node container exactly as the binary
//! wires them.

#[cfg(test)]
mod tests {
    use cc_01_eligibility::{EligibilityGap, Grade};
    use cc_02_certificate_registry::{CertificateRegistryApi, CertificateStatus, RegistryError};
    use cc_03_verification_log::{SuspicionFlag, VerificationOutcome};
    use cc_04_ledger_anchor::adapters::local::LOCAL_NETWORK;
    use cc_04_ledger_anchor::{AnchorCheck, AnchorError};
    use shared_types::{hash_to_hex, ManualTimeSource, RequestContext};

    use crate::fixtures::*;

    // =============================================================================
    // ISSUE → VERIFY → REVOKE
    // =============================================================================

    #[tokio::test]
    async fn test_issue_verify_revoke_reissue() {
        let clock = ManualTimeSource::new(START);
        let node = node(node_config(), &clock);

        let certificate = node.registry.issue(issue_request("ada", 85)).await.unwrap();
        assert_eq!(certificate.grade, Grade::Merit);
        assert_eq!(certificate.final_score, 89.5);
        assert_eq!(certificate.completed_at, START - DAY);
        let receipt = certificate.anchor.clone().expect("anchored on issue");
        assert_eq!(receipt.network, LOCAL_NETWORK);
        assert_eq!(node.ledger.as_ref().unwrap().height(), 1);

        let id = certificate.certificate_id.clone();
        let result = node
            .registry
            .verify(id.as_str(), &ctx("198.51.100.7"))
            .await
            .unwrap();
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.anchor_check, AnchorCheck::Confirmed);
        assert!(result.valid);

        clock.advance(60);
        let revoked = node
            .registry
            .revoke(&id, "academic misconduct", "registrar")
            .unwrap();
        assert_eq!(revoked.status, CertificateStatus::Revoked);
        assert_eq!(revoked.content_hash, certificate.content_hash);

        let result = node
            .registry
            .verify(id.as_str(), &ctx("198.51.100.7"))
            .await
            .unwrap();
        assert_eq!(result.outcome, VerificationOutcome::Revoked);
        assert!(result.suspicion.flags.contains(&SuspicionFlag::RevokedPresented));

        // A revoked certificate does not block a fresh one.
        let reissued = node.registry.issue(issue_request("ada", 85)).await.unwrap();
        assert_ne!(reissued.certificate_id, id);
        assert_eq!(
            node.registry
                .list_by_learner(&certificate.learner_id)
                .unwrap()
                .len(),
            2
        );

        let stats = node.registry.stats().unwrap();
        assert_eq!((stats.total, stats.active, stats.revoked), (2, 1, 1));
        assert_eq!(stats.anchored, 2);

        let log = node.log.stats();
        assert_eq!((log.total, log.valid, log.revoked), (2, 1, 1));
        assert!(node.log.verify_chain().intact);
        assert!(node.ledger.as_ref().unwrap().verify_chain().intact);
    }

    #[tokio::test]
    async fn test_ineligible_learner_gets_gaps() {
        let clock = ManualTimeSource::new(START);
        let node = node(node_config(), &clock);

        let err = node
            .registry
            .issue(issue_request("grace", 40))
            .await
            .unwrap_err();
        let RegistryError::NotEligible { gaps } = err else {
            panic!("expected NotEligible, got {err:?}");
        };
        assert!(gaps
            .iter()
            .any(|g| matches!(g, EligibilityGap::QuizNotPassed { required_percent: 70, .. })));
        assert!(gaps
            .iter()
            .any(|g| matches!(g, EligibilityGap::ScoreBelowMinimum { .. })));

        let report = node
            .registry
            .check_eligibility(&outline(), &progress("grace", 40))
            .unwrap();
        assert!(!report.eligible);
        assert_eq!(report.final_score, 58.0);
        assert_eq!(node.registry.stats().unwrap().total, 0);
    }

    // =============================================================================
    // EXPIRY AND ANCHORING POLICIES
    // =============================================================================

    #[tokio::test]
    async fn test_expiry_follows_clock() {
        let clock = ManualTimeSource::new(START);
        let mut config = node_config();
        config.registry.validity_days = Some(30);
        let node = node(config, &clock);

        let certificate = node.registry.issue(issue_request("ada", 95)).await.unwrap();
        assert_eq!(certificate.grade, Grade::Distinction);
        assert_eq!(certificate.expires_at, Some(START + 30 * DAY));
        let id = certificate.certificate_id.as_str();

        clock.advance(29 * DAY);
        let result = node.registry.verify(id, &ctx("198.51.100.7")).await.unwrap();
        assert_eq!(result.outcome, VerificationOutcome::Valid);

        clock.advance(2 * DAY);
        let result = node.registry.verify(id, &ctx("198.51.100.7")).await.unwrap();
        assert_eq!(result.outcome, VerificationOutcome::Expired);
        assert!(!result.valid);
    }

    #[tokio::test]
    async fn test_deferred_anchoring() {
        let clock = ManualTimeSource::new(START);
        let mut config = node_config();
        config.registry.anchor_on_issue = false;
        let node = node(config, &clock);

        let certificate = node.registry.issue(issue_request("ada", 85)).await.unwrap();
        assert!(certificate.anchor.is_none());
        let id = certificate.certificate_id.clone();

        let result = node.registry.verify(id.as_str(), &ctx("198.51.100.7")).await.unwrap();
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.anchor_check, AnchorCheck::NotAnchored);

        let receipt = node.registry.anchor(&id).await.unwrap();
        assert_eq!(receipt.block_height, node.ledger.as_ref().unwrap().height());

        let result = node.registry.verify(id.as_str(), &ctx("198.51.100.7")).await.unwrap();
        assert_eq!(result.anchor_check, AnchorCheck::Confirmed);

        assert!(matches!(
            node.registry.anchor(&id).await,
            Err(RegistryError::AlreadyAnchored(_))
        ));
    }

    #[tokio::test]
    async fn test_node_without_ledger() {
        let clock = ManualTimeSource::new(START);
        let mut config = node_config();
        config.anchor.enabled = false;
        let node = node(config, &clock);

        let certificate = node.registry.issue(issue_request("ada", 85)).await.unwrap();
        assert!(certificate.anchor.is_none());

        let result = node
            .registry
            .verify(certificate.certificate_id.as_str(), &ctx("198.51.100.7"))
            .await
            .unwrap();
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(result.anchor_check, AnchorCheck::NotAnchored);

        assert!(matches!(
            node.registry.anchor(&certificate.certificate_id).await,
            Err(RegistryError::Anchor(AnchorError::Unavailable(_)))
        ));
    }

    // =============================================================================
    // VERIFICATION LOG ACROSS SUBSYSTEMS
    // =============================================================================

    #[tokio::test]
    async fn test_verify_by_hash_shares_the_audit_trail() {
        let clock = ManualTimeSource::new(START);
        let node = node(node_config(), &clock);
        let certificate = node.registry.issue(issue_request("ada", 85)).await.unwrap();

        let result = node
            .registry
            .verify_by_hash(&hash_to_hex(&certificate.content_hash), &ctx("198.51.100.7"))
            .await
            .unwrap();
        assert_eq!(result.outcome, VerificationOutcome::Valid);
        assert_eq!(
            result.certificate.unwrap().certificate_id,
            certificate.certificate_id
        );

        let unknown = node
            .registry
            .verify_by_hash(&"ab".repeat(32), &ctx("198.51.100.7"))
            .await
            .unwrap();
        assert_eq!(unknown.outcome, VerificationOutcome::NotFound);

        assert_eq!(node.log.len(), 2);
        assert_eq!(
            node.registry
                .get(&certificate.certificate_id)
                .unwrap()
                .verification_count,
            1
        );
    }

    #[tokio::test]
    async fn test_enumeration_sweep_flagged() {
        let clock = ManualTimeSource::new(START);
        let node = node(node_config(), &clock);
        let anonymous = RequestContext::new(Some("203.0.113.9".parse().unwrap()));

        let mut last = None;
        for n in 0..5 {
            clock.advance(1);
            let id = format!("CERT-20240315-{n:08X}");
            last = Some(node.registry.verify(&id, &anonymous).await.unwrap());
        }
        let last = last.unwrap();
        assert_eq!(last.outcome, VerificationOutcome::NotFound);
        assert!(last.suspicion.flags.contains(&SuspicionFlag::Enumeration));
        assert!(last.suspicion.flags.contains(&SuspicionFlag::MissingUserAgent));
        assert!(last.suspicion.suspicious);

        let suspicious = node.log.suspicious(10);
        assert_eq!(suspicious.len(), 1);
        assert_eq!(suspicious[0].sequence, 5);
        assert_eq!(node.log.stats().not_found, 5);
    }
}
