//! Gateway flow tests
//!
//! End-to-end paths a front end would drive: fetch key, long-poll for the
//! next one, open a request, run a code reset flow against a durable store.

use std::time::Duration;

use sealgate_harness::{SimClient, SimEnv};
use sealgate_server::{
    ChaoticRecordStore, Gateway, KeyUpdate, MemoryRecordStore, RecordStore, RedbRecordStore,
    ServerConfig, ServerError, storage::ONE_TIME_CODE_FIELD,
};
use tempfile::tempdir;

#[tokio::test(start_paused = true)]
async fn long_poll_returns_the_rotated_key() {
    let env = SimEnv::with_seed(1);
    let gateway = Gateway::new(ServerConfig::default(), MemoryRecordStore::new(), env).unwrap();

    let poller = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.await_key_update().await })
    };
    while gateway.keys().notifier().pending() == 0 {
        tokio::task::yield_now().await;
    }

    gateway.keys().rotate().unwrap();

    assert_eq!(poller.await.unwrap(), KeyUpdate::Rotated(gateway.public_key()));
}

#[tokio::test(start_paused = true)]
async fn long_poll_times_out_after_configured_timeout() {
    let env = SimEnv::with_seed(2);
    let config = ServerConfig { subscription_timeout: Duration::from_secs(5), ..ServerConfig::default() };
    let gateway = Gateway::new(config, MemoryRecordStore::new(), env).unwrap();

    assert_eq!(gateway.await_key_update().await, KeyUpdate::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn client_that_missed_a_rotation_catches_up() {
    let env = SimEnv::with_seed(3);
    let gateway = Gateway::new(ServerConfig::default(), MemoryRecordStore::new(), env).unwrap();

    let (key, epoch) = gateway.keys().current_public_key_with_epoch();
    gateway.keys().rotate().unwrap();

    let update = gateway.await_key_update_since(epoch).await;
    assert_eq!(update, KeyUpdate::Rotated(gateway.public_key()));
    assert_ne!(KeyUpdate::Rotated(key), update);
}

#[tokio::test(start_paused = true)]
async fn password_reset_flow_over_redb() {
    let dir = tempdir().unwrap();
    let store = RedbRecordStore::open(dir.path().join("records.redb")).unwrap();
    let env = SimEnv::with_seed(4);
    let gateway = Gateway::new(ServerConfig::default(), store.clone(), env.clone()).unwrap();

    // Client asks for a code over a verified session.
    let client = SimClient::new(&env, &gateway.public_key(), 32).unwrap();
    let request = client
        .request(&env)
        .unwrap()
        .with_field("account", client.seal("alice").unwrap());
    let account = gateway.open_request(&request).unwrap().field("account").unwrap();
    let code = gateway.issue_code(&account).unwrap();

    // Client proves the code in a later request.
    let request = client
        .request(&env)
        .unwrap()
        .with_field("account", client.seal("alice").unwrap())
        .with_field("code", client.seal(&code).unwrap());
    let opened = gateway.open_request(&request).unwrap();
    let owner = opened.field("account").unwrap();
    assert!(gateway.redeem_code(&owner, &opened.field("code").unwrap()).unwrap());

    // The reset itself may run exactly once.
    assert!(gateway.take_redemption("alice").unwrap());
    assert!(!gateway.take_redemption("alice").unwrap());
    assert_eq!(store.get("alice", ONE_TIME_CODE_FIELD).unwrap().as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn failed_reissue_keeps_the_previous_code_expiring() {
    let env = SimEnv::with_seed(5);
    let memory = MemoryRecordStore::new();
    let healthy = Gateway::new(ServerConfig::default(), memory.clone(), env.clone()).unwrap();
    let broken = Gateway::with_key_ring(
        ServerConfig::default(),
        ChaoticRecordStore::with_seed(memory.clone(), 1.0, 5),
        env,
        healthy.keys().clone(),
    );

    let code = healthy.issue_code("alice").unwrap();
    assert!(broken.issue_code("alice").is_err());
    assert_eq!(memory.get("alice", ONE_TIME_CODE_FIELD).unwrap(), Some(code.clone()));

    tokio::time::sleep(Duration::from_secs(601)).await;
    assert!(!healthy.redeem_code("alice", &code).unwrap());
}

#[test]
fn invalid_config_is_rejected_before_key_generation() {
    let config = ServerConfig { code_ttl: Duration::ZERO, ..ServerConfig::default() };
    let result = Gateway::new(config, MemoryRecordStore::new(), SimEnv::with_seed(6));

    assert!(matches!(result, Err(ServerError::Config(_))));
}
