// ABOUTME: Shared state for list-based policies: an admin and a set of accounts.
// ABOUTME: Handles admin gating and admin hand-over for blacklist and allowlist.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::access::Admin;
use crate::address::Address;
use crate::error::PolicyError;
use crate::events::{EventBus, GateEvent};

struct ListState {
    admin: Admin,
    members: HashSet<Address>,
}

/// An admin-gated set of accounts living at a policy address.
pub(crate) struct AccountList {
    address: Address,
    state: RwLock<ListState>,
    events: EventBus,
}

impl AccountList {
    pub(crate) fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            state: RwLock::new(ListState {
                admin: Admin::new(admin),
                members: HashSet::new(),
            }),
            events: EventBus::new(),
        }
    }

    pub(crate) fn address(&self) -> Address {
        self.address
    }

    pub(crate) fn set_events(&mut self, events: EventBus) {
        self.events = events;
    }

    /// Seed members before the list is shared.
    pub(crate) fn extend(&mut self, accounts: impl IntoIterator<Item = Address>) {
        self.state.get_mut().members.extend(accounts);
    }

    /// Set or clear membership of `account`.
    ///
    /// `on_change` builds the event to publish; nothing is published when
    /// the flag already had the requested value. The event goes out after
    /// the list lock is released, so observers may query the policy.
    pub(crate) async fn set(
        &self,
        caller: &Address,
        account: Address,
        member: bool,
        on_change: impl FnOnce(Address) -> GateEvent,
    ) -> Result<bool, PolicyError> {
        let changed = {
            let mut state = self.state.write().await;
            state.admin.ensure(caller)?;
            if member {
                state.members.insert(account)
            } else {
                state.members.remove(&account)
            }
        };

        if changed {
            self.events.publish(&on_change(self.address)).await;
        }
        Ok(changed)
    }

    pub(crate) async fn contains(&self, account: &Address) -> bool {
        self.state.read().await.members.contains(account)
    }

    pub(crate) async fn members(&self) -> Vec<Address> {
        let state = self.state.read().await;
        let mut members: Vec<_> = state.members.iter().copied().collect();
        members.sort();
        members
    }

    pub(crate) async fn admin(&self) -> Option<Address> {
        self.state.read().await.admin.get()
    }

    pub(crate) async fn transfer_admin(
        &self,
        caller: &Address,
        new_admin: Address,
    ) -> Result<(), PolicyError> {
        let previous = self.state.write().await.admin.transfer(caller, new_admin)?;
        tracing::info!(policy = %self.address, admin = %new_admin, "policy admin transferred");
        self.events
            .publish(&GateEvent::PolicyAdminChanged {
                policy: self.address,
                previous,
                current: Some(new_admin),
            })
            .await;
        Ok(())
    }

    pub(crate) async fn renounce_admin(&self, caller: &Address) -> Result<(), PolicyError> {
        let previous = self.state.write().await.admin.renounce(caller)?;
        tracing::info!(policy = %self.address, "policy admin renounced");
        self.events
            .publish(&GateEvent::PolicyAdminChanged {
                policy: self.address,
                previous,
                current: None,
            })
            .await;
        Ok(())
    }
}
