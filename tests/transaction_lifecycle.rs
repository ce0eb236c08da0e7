//! Transaction lifecycle against the in-memory chain: nonce serialization,
//! confirmation timeout and the degraded modes.

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use alloy::primitives::TxHash;
use metrics_exporter_prometheus::PrometheusBuilder;

use credential_gateway::blockchain::{ChainAdapter, ChainError};
use credential_gateway::config::TransactionConfig;
use credential_gateway::credentials::{CredentialService, GatewayError, NewCredential};

mod common;

use common::{owner, service, tx_config, FakeChain, CHAIN_ID, OWNER_ADDRESS, OWNER_KEY};

fn new_credential(email: &str) -> NewCredential {
    NewCredential {
        recipient_name: "Ada".into(),
        recipient_email: email.into(),
        issuer_name: "Org".into(),
        credential_type: "Cert".into(),
        description: "Completed".into(),
        metadata_uri: None,
        issuer_address: OWNER_ADDRESS.into(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issues_use_distinct_nonces() {
    let chain = FakeChain::new();
    let service = service(chain.clone(), Some(OWNER_KEY), tx_config()).await;

    let mut handles = Vec::new();
    for i in 0..6 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .issue_credential(new_credential(&format!("user{}@x.com", i)))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let fetched = chain.nonce_fetches.lock().unwrap().clone();
    let distinct: HashSet<u64> = fetched.iter().copied().collect();
    assert_eq!(fetched.len(), 6);
    assert_eq!(distinct.len(), 6, "nonces reused: {:?}", fetched);
    assert_eq!(chain.nonce_of(owner()), 6);
}

#[tokio::test]
async fn test_confirmation_timeout_carries_hash() {
    let chain = FakeChain::new();
    chain.withhold_receipts();
    let service = service(chain.clone(), Some(OWNER_KEY), tx_config()).await;

    let err = service
        .issue_credential(new_credential("a@x.com"))
        .await
        .unwrap_err();
    match err {
        GatewayError::Chain(ChainError::ConfirmationTimeout { tx_hash, waited_secs }) => {
            assert_eq!(waited_secs, 1);
            assert_ne!(tx_hash, TxHash::ZERO);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    // Submitted all the same; it may still mine.
    assert_eq!(chain.submitted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_gas_price_cap_fails_before_submission() {
    let chain = FakeChain::new();
    chain.set_gas_price_gwei(50);
    let config = TransactionConfig {
        max_gas_price_gwei: Some(10),
        ..tx_config()
    };
    let service = service(chain.clone(), Some(OWNER_KEY), config).await;

    let err = service
        .issue_credential(new_credential("a@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Chain(ChainError::TransactionBuild(_))));
    assert_eq!(chain.submitted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_signer_is_a_signing_error() {
    let chain = FakeChain::new();
    let service = service(chain.clone(), None, tx_config()).await;

    let err = service
        .revoke_credential("abc", OWNER_ADDRESS)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Chain(ChainError::Signing(_))));

    // Reads still work without a key.
    let verification = service.verify_credential("abc").await.unwrap();
    assert!(!verification.exists);
}

#[tokio::test]
async fn test_unbound_contract_fails_every_contract_operation() {
    let chain = FakeChain::new();
    let adapter = ChainAdapter::with_rpc(chain.clone(), CHAIN_ID).await;
    let service = CredentialService::new(Arc::new(adapter));

    let err = service.verify_credential("abc").await.unwrap_err();
    assert!(matches!(err, GatewayError::Chain(ChainError::ContractNotInitialized)));

    let err = service
        .issue_credential(new_credential("a@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Chain(ChainError::ContractNotInitialized)));

    // The node itself is still reachable.
    assert!(service.chain().is_connected().await);
}

#[tokio::test]
async fn test_issued_credential_reads_back() {
    let chain = FakeChain::new();
    let service = service(chain.clone(), Some(OWNER_KEY), tx_config()).await;

    let receipt = service
        .issue_credential(new_credential("a@x.com"))
        .await
        .unwrap();
    let credential = service.get_credential(&receipt.credential_id).await.unwrap();

    assert_eq!(credential.credential_id, receipt.credential_id);
    assert_eq!(credential.recipient_email, "a@x.com");
    assert_eq!(credential.issuer_address, owner());
    assert!(credential.is_valid);
    assert!(credential.issue_date.is_some());
}

#[test]
fn test_failed_writes_are_counted_as_errors() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            let chain = FakeChain::new();
            let service = service(chain.clone(), Some(OWNER_KEY), tx_config()).await;

            service.issue_credential(new_credential("a@x.com")).await.unwrap();
            // Mined with a failed receipt: no such credential.
            service.revoke_credential("unknown", OWNER_ADDRESS).await.unwrap_err();
        })
    });

    let rendered = handle.render();
    let sample = |operation: &str, outcome: &str| {
        rendered
            .lines()
            .find(|line| {
                line.starts_with("gateway_credential_operations_total{")
                    && line.contains(&format!("operation=\"{}\"", operation))
                    && line.contains(&format!("outcome=\"{}\"", outcome))
            })
            .map(|line| line.rsplit(' ').next().unwrap_or_default().to_string())
    };
    assert_eq!(sample("issue", "ok").as_deref(), Some("1"), "{}", rendered);
    assert_eq!(sample("revoke", "error").as_deref(), Some("1"), "{}", rendered);
    assert_eq!(sample("revoke", "ok"), None);
}
