// ABOUTME: Tests for AllowlistPolicy - default deny and admin gating.
// ABOUTME: Verifies only listed operators may operate.

use super::*;
use crate::address::Address;
use crate::error::PolicyError;

const ADMIN: Address = Address::repeat(0xad);
const MARKET: Address = Address::repeat(0x3a);
const OTHER: Address = Address::repeat(0x0e);

#[tokio::test]
async fn test_empty_allowlist_refuses_everyone() {
    let policy = AllowlistPolicy::new(ADMIN);
    assert!(!policy.may_operate(&MARKET).await.unwrap());
    assert!(!policy.may_operate(&ADMIN).await.unwrap());
}

#[tokio::test]
async fn test_allowed_operator_may_operate() {
    let policy = AllowlistPolicy::new(ADMIN);
    policy.set_allowed(&ADMIN, MARKET, true).await.unwrap();

    assert!(policy.may_operate(&MARKET).await.unwrap());
    assert!(!policy.may_operate(&OTHER).await.unwrap());

    policy.set_allowed(&ADMIN, MARKET, false).await.unwrap();
    assert!(!policy.may_operate(&MARKET).await.unwrap());
}

#[tokio::test]
async fn test_set_allowed_requires_admin() {
    let policy = AllowlistPolicy::new(ADMIN);
    assert_eq!(
        policy.set_allowed(&OTHER, OTHER, true).await,
        Err(PolicyError::NotAuthorized { caller: OTHER })
    );
    assert!(policy.allowed().await.is_empty());
}

#[tokio::test]
async fn test_with_allowed_seeds_set() {
    let policy = AllowlistPolicy::new(ADMIN).with_allowed([OTHER, MARKET]);
    assert_eq!(policy.allowed().await, vec![OTHER, MARKET]);
    assert_eq!(policy.kind(), "allowlist");
}
