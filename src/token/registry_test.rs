// ABOUTME: Tests for TokenRegistry - filter hook points, access rules,
// ABOUTME: atomicity on denial, and published events.

use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

use super::*;
use crate::address::Address;
use crate::error::{FilterError, TokenError};
use crate::events::{EventBus, GateEvent, Observer};
use crate::filter::Authorization;
use crate::policy::{BlacklistPolicy, OperatorPolicy, PolicyDirectory};

const OWNER: Address = Address::repeat(0x01);
const NON_OWNER: Address = Address::repeat(0x02);
const HOLDER: Address = Address::repeat(0x03);
const PROXY: Address = Address::repeat(0x04);
const RECIPIENT: Address = Address::repeat(0x55);

struct Recorder(Arc<Mutex<Vec<GateEvent>>>);

#[async_trait::async_trait]
impl Observer for Recorder {
    async fn on_event(&self, event: &GateEvent) -> Result<(), anyhow::Error> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct Fixture {
    registry: TokenRegistry,
    blacklist: Arc<BlacklistPolicy>,
}

/// Registry with a blacklist installed and token 1 minted to HOLDER.
async fn fixture() -> Fixture {
    let directory = PolicyDirectory::new();
    let blacklist = Arc::new(BlacklistPolicy::new(OWNER));
    directory.register_arc(blacklist.clone()).await;

    let registry = TokenRegistry::new(OWNER, directory);
    registry
        .set_operator_filter(&OWNER, Some(blacklist.address()))
        .await
        .unwrap();
    registry.mint(&OWNER, HOLDER, 1).await.unwrap();

    Fixture {
        registry,
        blacklist,
    }
}

#[tokio::test]
async fn test_owner_transfers_own_token() {
    let Fixture { registry, .. } = fixture().await;

    registry
        .transfer_from(&HOLDER, HOLDER, RECIPIENT, 1)
        .await
        .unwrap();

    assert_eq!(registry.owner_of(1).await.unwrap(), RECIPIENT);
    assert_eq!(registry.balance_of(&HOLDER).await, 0);
    assert_eq!(registry.balance_of(&RECIPIENT).await, 1);
}

#[tokio::test]
async fn test_blocked_owner_still_transfers_own_token() {
    let Fixture {
        registry,
        blacklist,
    } = fixture().await;
    blacklist.set_blocked(&OWNER, HOLDER, true).await.unwrap();

    registry
        .transfer_from(&HOLDER, HOLDER, RECIPIENT, 1)
        .await
        .unwrap();

    assert_eq!(registry.owner_of(1).await.unwrap(), RECIPIENT);
}

#[tokio::test]
async fn test_blocked_operator_cannot_spend_approval() {
    let Fixture {
        registry,
        blacklist,
    } = fixture().await;
    registry
        .set_approval_for_all(&HOLDER, PROXY, true)
        .await
        .unwrap();
    blacklist.set_blocked(&OWNER, PROXY, true).await.unwrap();

    let err = registry
        .transfer_from(&PROXY, HOLDER, RECIPIENT, 1)
        .await
        .unwrap_err();

    assert!(err.is_illegal_operator());
    assert_eq!(registry.owner_of(1).await.unwrap(), HOLDER);
}

#[tokio::test]
async fn test_denied_transfer_changes_nothing() {
    let Fixture {
        registry,
        blacklist,
    } = fixture().await;
    registry.approve(&HOLDER, PROXY, 1).await.unwrap();
    registry
        .set_approval_for_all(&HOLDER, PROXY, true)
        .await
        .unwrap();
    blacklist.set_blocked(&OWNER, PROXY, true).await.unwrap();
    let before = registry.snapshot().await;

    assert!(
        registry
            .transfer_from(&PROXY, HOLDER, RECIPIENT, 1)
            .await
            .is_err()
    );
    assert!(registry.burn(&PROXY, 1).await.is_err());

    assert_eq!(registry.snapshot().await, before);
    assert_eq!(registry.get_approved(1).await.unwrap(), Some(PROXY));
}

#[tokio::test]
async fn test_single_token_approval_is_filtered() {
    let Fixture {
        registry,
        blacklist,
    } = fixture().await;
    registry.approve(&HOLDER, PROXY, 1).await.unwrap();
    blacklist.set_blocked(&OWNER, PROXY, true).await.unwrap();

    let err = registry
        .transfer_from(&PROXY, HOLDER, RECIPIENT, 1)
        .await
        .unwrap_err();
    assert!(err.is_illegal_operator());

    blacklist.set_blocked(&OWNER, PROXY, false).await.unwrap();
    registry
        .transfer_from(&PROXY, HOLDER, RECIPIENT, 1)
        .await
        .unwrap();
    assert_eq!(registry.owner_of(1).await.unwrap(), RECIPIENT);
    assert_eq!(registry.get_approved(1).await.unwrap(), None);
}

#[tokio::test]
async fn test_no_filter_lets_approved_operator_through() {
    let registry = TokenRegistry::new(OWNER, PolicyDirectory::new());
    registry.mint(&OWNER, HOLDER, 1).await.unwrap();
    registry
        .set_approval_for_all(&HOLDER, PROXY, true)
        .await
        .unwrap();

    registry
        .transfer_from(&PROXY, HOLDER, RECIPIENT, 1)
        .await
        .unwrap();
    assert_eq!(registry.owner_of(1).await.unwrap(), RECIPIENT);
}

#[tokio::test]
async fn test_unapproved_caller_rejected_before_filter() {
    let Fixture { registry, .. } = fixture().await;

    let err = registry
        .transfer_from(&PROXY, HOLDER, RECIPIENT, 1)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TokenError::NotApproved { caller, token_id: 1 } if caller == PROXY
    ));
}

#[tokio::test]
async fn test_transfer_validation() {
    let Fixture { registry, .. } = fixture().await;

    assert!(matches!(
        registry.transfer_from(&HOLDER, HOLDER, RECIPIENT, 99).await,
        Err(TokenError::NonexistentToken(99))
    ));
    assert!(matches!(
        registry.transfer_from(&HOLDER, RECIPIENT, HOLDER, 1).await,
        Err(TokenError::IncorrectOwner { .. })
    ));
    assert!(matches!(
        registry
            .transfer_from(&HOLDER, HOLDER, Address::ZERO, 1)
            .await,
        Err(TokenError::InvalidReceiver(_))
    ));
    assert_eq!(registry.owner_of(1).await.unwrap(), HOLDER);
}

#[tokio::test]
async fn test_mint_permitted_with_filter_and_owner_only() {
    let Fixture {
        registry,
        blacklist,
    } = fixture().await;
    blacklist.set_blocked(&OWNER, OWNER, true).await.unwrap();

    registry.mint(&OWNER, HOLDER, 2).await.unwrap();
    assert_eq!(registry.balance_of(&HOLDER).await, 2);

    assert!(matches!(
        registry.mint(&NON_OWNER, HOLDER, 3).await,
        Err(TokenError::NotAuthorized { caller }) if caller == NON_OWNER
    ));
    assert!(!registry.exists(3).await);
}

#[tokio::test]
async fn test_burn_with_filter() {
    let Fixture {
        registry,
        blacklist,
    } = fixture().await;
    blacklist.set_blocked(&OWNER, HOLDER, true).await.unwrap();

    registry.burn(&HOLDER, 1).await.unwrap();

    assert!(!registry.exists(1).await);
    assert_eq!(registry.total_supply().await, 0);
}

#[tokio::test]
async fn test_approve_rules() {
    let Fixture { registry, .. } = fixture().await;

    assert!(matches!(
        registry.approve(&HOLDER, HOLDER, 1).await,
        Err(TokenError::ApproveToOwner(_))
    ));
    assert!(matches!(
        registry.approve(&PROXY, PROXY, 1).await,
        Err(TokenError::NotApproved { .. })
    ));
    assert!(matches!(
        registry.set_approval_for_all(&HOLDER, HOLDER, true).await,
        Err(TokenError::ApproveToCaller(_))
    ));

    registry
        .set_approval_for_all(&HOLDER, PROXY, true)
        .await
        .unwrap();
    registry.approve(&PROXY, RECIPIENT, 1).await.unwrap();
    assert_eq!(registry.get_approved(1).await.unwrap(), Some(RECIPIENT));
}

#[tokio::test]
async fn test_set_operator_filter_access_control() {
    let Fixture {
        registry,
        blacklist,
    } = fixture().await;

    let err = registry
        .set_operator_filter(&NON_OWNER, None)
        .await
        .unwrap_err();

    assert!(matches!(err, FilterError::NotAuthorized { .. }));
    assert_eq!(
        registry.operator_filter().await,
        Some(blacklist.address())
    );
}

#[tokio::test]
async fn test_check_authorized_query() {
    let Fixture {
        registry,
        blacklist,
    } = fixture().await;

    assert_eq!(
        registry.check_authorized(&HOLDER, &HOLDER).await.unwrap(),
        Authorization::OwnerBypass
    );
    blacklist.set_blocked(&OWNER, PROXY, true).await.unwrap();
    assert!(registry.check_authorized(&PROXY, &HOLDER).await.is_err());
}

#[tokio::test]
async fn test_ownership_transfer_moves_filter_control() {
    let Fixture { registry, .. } = fixture().await;

    registry.transfer_ownership(&OWNER, NON_OWNER).await.unwrap();
    assert_eq!(registry.owner().await, Some(NON_OWNER));
    assert!(registry.set_operator_filter(&OWNER, None).await.is_err());
    registry.set_operator_filter(&NON_OWNER, None).await.unwrap();
    assert_eq!(registry.operator_filter().await, None);

    registry.renounce_ownership(&NON_OWNER).await.unwrap();
    assert_eq!(registry.owner().await, None);
    assert!(registry.mint(&NON_OWNER, HOLDER, 2).await.is_err());
}

#[tokio::test]
async fn test_events_published_in_commit_order() {
    let events = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    events.subscribe(Recorder(seen.clone())).await;

    let directory = PolicyDirectory::new();
    let blacklist = BlacklistPolicy::new(OWNER).with_blocked([PROXY]);
    let policy = directory.register(blacklist).await;
    let registry = TokenRegistry::new(OWNER, directory)
        .with_address(Address::repeat(0xee))
        .with_events(events);

    registry
        .set_operator_filter(&OWNER, Some(policy))
        .await
        .unwrap();
    registry.mint(&OWNER, HOLDER, 1).await.unwrap();
    registry
        .set_approval_for_all(&HOLDER, PROXY, true)
        .await
        .unwrap();
    let _ = registry.transfer_from(&PROXY, HOLDER, RECIPIENT, 1).await;

    let registry_address = Address::repeat(0xee);
    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            GateEvent::OperatorFilterChanged {
                registry: registry_address,
                previous: None,
                current: Some(policy),
            },
            GateEvent::Transfer {
                registry: registry_address,
                from: Address::ZERO,
                to: HOLDER,
                token_id: 1,
            },
            GateEvent::ApprovalForAll {
                registry: registry_address,
                owner: HOLDER,
                operator: PROXY,
                approved: true,
            },
            GateEvent::OperatorRejected {
                registry: registry_address,
                policy,
                operator: PROXY,
                token_owner: HOLDER,
            },
        ]
    );
}

#[tokio::test]
async fn test_concurrent_transfers_are_serialized() {
    let registry = Arc::new(TokenRegistry::new(OWNER, PolicyDirectory::new()));
    registry.mint(&OWNER, HOLDER, 1).await.unwrap();

    let mut handles = Vec::new();
    for byte in 0x60..0x68u8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .transfer_from(&HOLDER, HOLDER, Address::repeat(byte), 1)
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    // Once the first transfer commits HOLDER no longer owns token 1.
    assert_eq!(successes, 1);
    assert_eq!(registry.balance_of(&HOLDER).await, 0);
    assert_eq!(registry.total_supply().await, 1);
}

/// Admits operators that hold no tokens of the registry it guards.
struct EmptyHandedPolicy {
    registry: OnceLock<Weak<TokenRegistry>>,
}

#[async_trait::async_trait]
impl OperatorPolicy for EmptyHandedPolicy {
    fn address(&self) -> Address {
        Address::repeat(0x99)
    }

    async fn may_operate(&self, operator: &Address) -> Result<bool, anyhow::Error> {
        let registry = self
            .registry
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| anyhow::anyhow!("registry dropped"))?;
        Ok(registry.total_supply().await > 0 && registry.balance_of(operator).await == 0)
    }
}

#[tokio::test]
async fn test_policy_may_read_the_registry_it_guards() {
    let directory = PolicyDirectory::new();
    let policy = Arc::new(EmptyHandedPolicy {
        registry: OnceLock::new(),
    });
    directory.register_arc(policy.clone()).await;
    let registry = Arc::new(TokenRegistry::new(OWNER, directory));
    let _ = policy.registry.set(Arc::downgrade(&registry));

    registry
        .set_operator_filter(&OWNER, Some(policy.address()))
        .await
        .unwrap();
    registry.mint(&OWNER, HOLDER, 1).await.unwrap();
    registry.mint(&OWNER, HOLDER, 2).await.unwrap();
    registry
        .set_approval_for_all(&HOLDER, PROXY, true)
        .await
        .unwrap();

    tokio::time::timeout(
        Duration::from_secs(2),
        registry.transfer_from(&PROXY, HOLDER, RECIPIENT, 1),
    )
    .await
    .expect("transfer must not wait on the registry it is checking")
    .unwrap();
    assert_eq!(registry.owner_of(1).await.unwrap(), RECIPIENT);

    let check = tokio::time::timeout(
        Duration::from_secs(2),
        registry.check_authorized(&PROXY, &HOLDER),
    )
    .await
    .expect("check must not wait on the registry it is checking");
    assert_eq!(
        check.unwrap(),
        Authorization::PolicyApproved {
            policy: policy.address()
        }
    );

    // The recipient now holds a token, so the policy refuses it.
    registry
        .set_approval_for_all(&HOLDER, RECIPIENT, true)
        .await
        .unwrap();
    let err = tokio::time::timeout(
        Duration::from_secs(2),
        registry.transfer_from(&RECIPIENT, HOLDER, RECIPIENT, 2),
    )
    .await
    .expect("denial must not hang")
    .unwrap_err();
    assert!(err.is_illegal_operator());
    assert_eq!(registry.owner_of(2).await.unwrap(), HOLDER);
}

/// Moves every token it sees minted on to RECIPIENT.
struct Forwarder {
    registry: OnceLock<Weak<TokenRegistry>>,
}

#[async_trait::async_trait]
impl Observer for Forwarder {
    fn accepts(&self, event: &GateEvent) -> bool {
        matches!(event, GateEvent::Transfer { from, .. } if from.is_zero())
    }

    async fn on_event(&self, event: &GateEvent) -> Result<(), anyhow::Error> {
        let GateEvent::Transfer { to, token_id, .. } = event else {
            return Ok(());
        };
        let registry = self
            .registry
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| anyhow::anyhow!("registry dropped"))?;
        registry
            .transfer_from(to, *to, RECIPIENT, *token_id)
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn test_observer_may_call_back_into_the_registry() {
    let events = EventBus::new();
    let forwarder = Arc::new(Forwarder {
        registry: OnceLock::new(),
    });
    events.subscribe_arc(forwarder.clone()).await;
    let registry = Arc::new(TokenRegistry::new(OWNER, PolicyDirectory::new()).with_events(events));
    let _ = forwarder.registry.set(Arc::downgrade(&registry));

    tokio::time::timeout(Duration::from_secs(2), registry.mint(&OWNER, HOLDER, 1))
        .await
        .expect("observer must not wait on the registry")
        .unwrap();

    assert_eq!(registry.owner_of(1).await.unwrap(), RECIPIENT);
    assert_eq!(registry.balance_of(&HOLDER).await, 0);
}
