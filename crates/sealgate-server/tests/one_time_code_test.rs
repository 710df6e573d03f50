//! One-time code lifecycle tests
//!
//! Issue, reissue, wrong guesses and expiry, on tokio's paused clock.

use std::time::Duration;

use sealgate_harness::SimEnv;
use sealgate_server::{
    MemoryRecordStore, OneTimeCodes, RecordStore,
    storage::{ONE_TIME_CODE_FIELD, REDEEMED_FIELD},
};

const TTL: Duration = Duration::from_secs(600);

fn codes(seed: u64) -> (OneTimeCodes<MemoryRecordStore, SimEnv>, MemoryRecordStore) {
    let store = MemoryRecordStore::new();
    (OneTimeCodes::new(store.clone(), SimEnv::with_seed(seed), TTL), store)
}

#[tokio::test(start_paused = true)]
async fn reissue_leaves_only_the_second_code_and_timer() {
    let (codes, _) = codes(1);

    let first = codes.issue("alice").unwrap();
    tokio::time::sleep(Duration::from_secs(300)).await;
    let second = codes.issue("alice").unwrap();

    assert_eq!(codes.armed(), 1);
    if first != second {
        assert!(!codes.validate("alice", &first).unwrap());
    }
    assert!(codes.validate("alice", &second).unwrap());

    // Past the first code's deadline, inside the second's.
    tokio::time::sleep(Duration::from_secs(400)).await;
    assert!(codes.validate("alice", &second).unwrap());

    // Past the second code's deadline.
    tokio::time::sleep(Duration::from_secs(250)).await;
    assert!(!codes.validate("alice", &second).unwrap());
    assert_eq!(codes.armed(), 0);
}

#[tokio::test(start_paused = true)]
async fn wrong_code_does_not_clear_the_stored_one() {
    let (codes, store) = codes(2);
    let code = codes.issue("alice").unwrap();
    let wrong = if code == "123456" { "654321" } else { "123456" };

    assert!(!codes.validate("alice", wrong).unwrap());
    assert!(!codes.redeem("alice", wrong).unwrap());

    assert_eq!(store.get("alice", ONE_TIME_CODE_FIELD).unwrap(), Some(code.clone()));
    assert!(codes.validate("alice", &code).unwrap());
    assert_eq!(codes.armed(), 1);
}

#[tokio::test(start_paused = true)]
async fn code_expires_after_the_ttl() {
    let (codes, store) = codes(3);
    let code = codes.issue("alice").unwrap();

    tokio::time::sleep(TTL + Duration::from_secs(1)).await;

    assert!(!codes.validate("alice", &code).unwrap());
    assert!(!codes.redeem("alice", &code).unwrap());
    assert_eq!(store.get("alice", ONE_TIME_CODE_FIELD).unwrap().as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn redeem_before_expiry_then_take_once() {
    let (codes, store) = codes(4);
    let code = codes.issue("alice").unwrap();

    tokio::time::sleep(Duration::from_secs(599)).await;
    assert!(codes.redeem("alice", &code).unwrap());
    assert_eq!(store.get("alice", REDEEMED_FIELD).unwrap().as_deref(), Some("true"));

    // The stopped timer must not touch the row afterwards.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.get("alice", REDEEMED_FIELD).unwrap().as_deref(), Some("true"));

    assert!(codes.take_redemption("alice").unwrap());
    assert!(!codes.take_redemption("alice").unwrap());
}

#[tokio::test(start_paused = true)]
async fn owners_expire_independently() {
    let (codes, _) = codes(5);

    let alice = codes.issue("alice").unwrap();
    tokio::time::sleep(Duration::from_secs(400)).await;
    let bob = codes.issue("bob").unwrap();
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert!(!codes.validate("alice", &alice).unwrap());
    assert!(codes.validate("bob", &bob).unwrap());
}

#[tokio::test(start_paused = true)]
async fn cancelled_code_outlives_its_ttl() {
    let (codes, _) = codes(6);
    let code = codes.issue("alice").unwrap();

    codes.cancel("alice");
    tokio::time::sleep(TTL * 2).await;

    assert!(codes.validate("alice", &code).unwrap());
    assert!(codes.redeem("alice", &code).unwrap());
}
