//! Privilege tests through the gateway
//!
//! A verified session is privileged only while its fingerprint is the one
//! recorded at the account's latest privileged login.

use sealgate_core::Rejection;
use sealgate_harness::{SimClient, SimEnv};
use sealgate_server::{
    AdministratorAuthorizer, ChaoticRecordStore, Gateway, MemoryRecordStore, RecordStore,
    ServerConfig, storage::ADMIN_FINGERPRINT_FIELD,
};

fn gateway(seed: u64) -> (Gateway<MemoryRecordStore, SimEnv>, MemoryRecordStore, SimEnv) {
    let env = SimEnv::with_seed(seed);
    let store = MemoryRecordStore::new();
    let gateway = Gateway::new(ServerConfig::default(), store.clone(), env.clone()).unwrap();
    (gateway, store, env)
}

fn client(gateway: &Gateway<MemoryRecordStore, SimEnv>, env: &SimEnv) -> SimClient {
    SimClient::new(env, &gateway.public_key(), 32).unwrap()
}

#[test]
fn account_without_fingerprint_is_never_privileged() {
    let (gateway, _, env) = gateway(1);

    for _ in 0..4 {
        let client = client(&gateway, &env);
        let request = client.request(&env).unwrap();
        let opened = gateway.open_request(&request).unwrap();

        assert!(!gateway.authorize_admin("alice", opened.session()).unwrap());
    }
}

#[test]
fn login_session_is_privileged_until_the_next_login() {
    let (gateway, store, env) = gateway(2);
    let first = client(&gateway, &env);
    let second = client(&gateway, &env);

    let first_request = first.request(&env).unwrap();
    let first_session = gateway.open_request(&first_request).unwrap().into_session();
    gateway.record_admin_login("alice", &first_session).unwrap();

    assert!(gateway.authorize_admin("alice", &first_session).unwrap());
    assert!(!gateway.authorize_admin("bob", &first_session).unwrap());
    assert_eq!(store.get("alice", ADMIN_FINGERPRINT_FIELD).unwrap(), Some(first.fingerprint()));

    let second_request = second.request(&env).unwrap();
    let second_session = gateway.open_request(&second_request).unwrap().into_session();
    gateway.record_admin_login("alice", &second_session).unwrap();

    assert!(gateway.authorize_admin("alice", &second_session).unwrap());
    assert!(!gateway.authorize_admin("alice", &first_session).unwrap());
}

#[test]
fn same_key_stays_privileged_across_requests_and_rotations() {
    let (gateway, _, env) = gateway(3);
    let mut client = client(&gateway, &env);

    let login = client.request(&env).unwrap();
    gateway.record_admin_login("alice", gateway.open_request(&login).unwrap().session()).unwrap();

    gateway.keys().rotate().unwrap();
    client.refresh_public_key(&gateway.public_key()).unwrap();

    let later = client.request(&env).unwrap();
    let opened = gateway.open_request(&later).unwrap();
    assert!(gateway.authorize_admin("alice", opened.session()).unwrap());
}

#[test]
fn revoked_fingerprint_is_not_privileged() {
    let env = SimEnv::with_seed(4);
    let store = MemoryRecordStore::new();
    let gateway = Gateway::new(ServerConfig::default(), store.clone(), env.clone()).unwrap();
    let authorizer = AdministratorAuthorizer::new(store);
    let client = SimClient::new(&env, &gateway.public_key(), 16).unwrap();

    let request = client.request(&env).unwrap();
    let opened = gateway.open_request(&request).unwrap();
    authorizer.record_login("alice", opened.session()).unwrap();
    authorizer.revoke("alice").unwrap();

    assert!(!authorizer.is_privileged("alice", opened.session()).unwrap());
}

#[test]
fn stale_public_key_is_a_generic_rejection() {
    let (gateway, _, env) = gateway(5);
    let client = client(&gateway, &env);

    gateway.keys().rotate().unwrap();

    let request = client.request(&env).unwrap();
    assert_eq!(gateway.open_request(&request).unwrap_err(), Rejection::KeyRejected);

    let mut wrong_marker = client.clone().with_marker("nope");
    wrong_marker.refresh_public_key(&gateway.public_key()).unwrap();
    let request = wrong_marker.request(&env).unwrap();
    assert_eq!(gateway.open_request(&request).unwrap_err(), Rejection::KeyRejected);
}

#[test]
fn store_failure_is_confined_to_the_request() {
    let env = SimEnv::with_seed(6);
    let store = ChaoticRecordStore::with_seed(MemoryRecordStore::new(), 1.0, 6);
    let gateway = Gateway::new(ServerConfig::default(), store, env.clone()).unwrap();
    let client = SimClient::new(&env, &gateway.public_key(), 32).unwrap();

    let request = client.request(&env).unwrap();
    let opened = gateway.open_request(&request).unwrap();

    assert_eq!(gateway.authorize_admin("alice", opened.session()), Err(Rejection::Internal));
    assert_eq!(gateway.record_admin_login("alice", opened.session()), Err(Rejection::Internal));

    // Key handling does not touch the store and keeps working.
    assert!(gateway.open_request(&client.request(&env).unwrap()).is_ok());
}
