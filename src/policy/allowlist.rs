// ABOUTME: Defines AllowlistPolicy - admits only operators its admin listed.
// ABOUTME: The inverse of BlacklistPolicy, sharing the same admin model.

use async_trait::async_trait;

use super::OperatorPolicy;
use super::list::AccountList;
use crate::address::Address;
use crate::error::PolicyError;
use crate::events::{EventBus, GateEvent};

/// A policy that admits only listed operators.
pub struct AllowlistPolicy {
    list: AccountList,
}

impl AllowlistPolicy {
    /// Create an empty allowlist at a fresh address, administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self::at(Address::random(), admin)
    }

    /// Create an allowlist at a known address.
    pub fn at(address: Address, admin: Address) -> Self {
        Self {
            list: AccountList::new(address, admin),
        }
    }

    /// Start with `operators` already allowed.
    pub fn with_allowed(mut self, operators: impl IntoIterator<Item = Address>) -> Self {
        self.list.extend(operators);
        self
    }

    /// Publish allow changes on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.list.set_events(events);
        self
    }

    /// Set or clear the allow flag for `operator`. Admin only.
    pub async fn set_allowed(
        &self,
        caller: &Address,
        operator: Address,
        allowed: bool,
    ) -> Result<(), PolicyError> {
        let changed = self
            .list
            .set(caller, operator, allowed, |policy| {
                GateEvent::OperatorAllowChanged {
                    policy,
                    operator,
                    allowed,
                }
            })
            .await?;
        if changed {
            tracing::info!(policy = %self.address(), %operator, allowed, "operator allow changed");
        }
        Ok(())
    }

    /// Whether `operator` is currently allowed.
    pub async fn is_allowed(&self, operator: &Address) -> bool {
        self.list.contains(operator).await
    }

    /// All allowed operators, sorted.
    pub async fn allowed(&self) -> Vec<Address> {
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

    /// Give up administration. Admin only.
    pub async fn renounce_admin(&self, caller: &Address) -> Result<(), PolicyError> {
        self.list.renounce_admin(caller).await
    }
}

#[async_trait]
impl OperatorPolicy for AllowlistPolicy {
    fn address(&self) -> Address {
        self.list.address()
    }

    fn kind(&self) -> &str {
        "allowlist"
    }

    async fn may_operate(&self, operator: &Address) -> Result<bool, anyhow::Error> {
        Ok(self.is_allowed(operator).await)
    }
}
