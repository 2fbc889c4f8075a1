// ABOUTME: Defines BlacklistPolicy - the reference operator policy.
// ABOUTME: Every operator may act unless its own admin has blocked it.

use async_trait::async_trait;

use super::OperatorPolicy;
use super::list::AccountList;
use crate::address::Address;
use crate::error::PolicyError;
use crate::events::{EventBus, GateEvent};

/// A policy that refuses a set of blocked operators and admits everyone else.
///
/// The policy has its own admin, independent of any registry owner, and
/// can be installed in several registries at once.
pub struct BlacklistPolicy {
    list: AccountList,
}

impl BlacklistPolicy {
    /// Create a blacklist at a fresh address, administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self::at(Address::random(), admin)
    }

    /// Create a blacklist at a known address.
    pub fn at(address: Address, admin: Address) -> Self {
        Self {
            list: AccountList::new(address, admin),
        }
    }

    /// Start with `operators` already blocked.
    pub fn with_blocked(mut self, operators: impl IntoIterator<Item = Address>) -> Self {
        self.list.extend(operators);
        self
    }

    /// Publish block changes on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.list.set_events(events);
        self
    }

    /// Set or clear the block flag for `operator`. Admin only.
    ///
    /// Setting a flag to the value it already has changes nothing.
    pub async fn set_blocked(
        &self,
        caller: &Address,
        operator: Address,
        blocked: bool,
    ) -> Result<(), PolicyError> {
        let changed = self
            .list
            .set(caller, operator, blocked, |policy| {
                GateEvent::OperatorBlockChanged {
                    policy,
                    operator,
                    blocked,
                }
            })
            .await?;
        if changed {
            tracing::info!(policy = %self.address(), %operator, blocked, "operator block changed");
        }
        Ok(())
    }

    /// Whether `operator` is currently blocked.
    pub async fn is_blocked(&self, operator: &Address) -> bool {
        self.list.contains(operator).await
    }

    /// All blocked operators, sorted.
    pub async fn blocked(&self) -> Vec<Address> {
        self.list.members().await
    }

    /// The current admin, if not renounced.
    pub async fn admin(&self) -> Option<Address> {
        self.list.admin().await
    }

    /// Hand administration to `new_admin`. Admin only.
    pub async fn transfer_admin(
        &self,
        caller: &Address,
        new_admin: Address,
    ) -> Result<(), PolicyError> {
        self.list.transfer_admin(caller, new_admin).await
    }

    /// Give up administration; the block set is frozen afterwards. Admin only.
    pub async fn renounce_admin(&self, caller: &Address) -> Result<(), PolicyError> {
        self.list.renounce_admin(caller).await
    }
}

#[async_trait]
impl OperatorPolicy for BlacklistPolicy {
    fn address(&self) -> Address {
        self.list.address()
    }

    fn kind(&self) -> &str {
        "blacklist"
    }

    async fn may_operate(&self, operator: &Address) -> Result<bool, anyhow::Error> {
        Ok(!self.is_blocked(operator).await)
    }
}
