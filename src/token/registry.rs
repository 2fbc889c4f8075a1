// ABOUTME: Implements the TokenRegistry - an NFT collection whose transfers,
// ABOUTME: burns and approval-spending moves pass through an OperatorFilter.

use tokio::sync::{Mutex, RwLock};

use super::Ledger;
use crate::address::Address;
use crate::error::{FilterError, TokenError};
use crate::events::{EventBus, GateEvent};
use crate::filter::{Authorization, OperatorFilter};
use crate::policy::PolicyDirectory;

struct RegistryState {
    filter: OperatorFilter,
    ledger: Ledger,
}

/// An NFT registry guarded by an operator filter.
///
/// State-changing calls are serialized by a commit lock held for the
/// whole call, so each one either commits entirely or leaves the registry
/// untouched. The state lock itself is only held for short, non-awaiting
/// sections: the installed policy runs without it, so a policy may read
/// the registry it is guarding. Events are published once both locks are
/// released.
pub struct TokenRegistry {
    address: Address,
    state: RwLock<RegistryState>,
    commit: Mutex<()>,
    events: EventBus,
}

impl TokenRegistry {
    /// Create a registry owned by `owner`, resolving policies in `directory`.
    pub fn new(owner: Address, directory: PolicyDirectory) -> Self {
        Self {
            address: Address::random(),
            state: RwLock::new(RegistryState {
                filter: OperatorFilter::new(owner, directory),
                ledger: Ledger::new(),
            }),
            commit: Mutex::new(()),
            events: EventBus::new(),
        }
    }

    /// Deploy at a known address instead of a random one.
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Publish state changes on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// The registry's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The bus this registry publishes on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The registry owner, or None once renounced.
    pub async fn owner(&self) -> Option<Address> {
        self.state.read().await.filter.owner()
    }

    /// Address of the installed operator filter, or None.
    pub async fn operator_filter(&self) -> Option<Address> {
        self.state.read().await.filter.operator_filter()
    }

    pub async fn owner_of(&self, token_id: u64) -> Result<Address, TokenError> {
        self.state.read().await.ledger.owner_of(token_id)
    }

    pub async fn balance_of(&self, owner: &Address) -> u64 {
        self.state.read().await.ledger.balance_of(owner)
    }

    pub async fn get_approved(&self, token_id: u64) -> Result<Option<Address>, TokenError> {
        self.state.read().await.ledger.get_approved(token_id)
    }

    pub async fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.state
            .read()
            .await
            .ledger
            .is_approved_for_all(owner, operator)
    }

    pub async fn exists(&self, token_id: u64) -> bool {
        self.state.read().await.ledger.exists(token_id)
    }

    pub async fn total_supply(&self) -> usize {
        self.state.read().await.ledger.total_supply()
    }

    /// A copy of the full bookkeeping state.
    pub async fn snapshot(&self) -> Ledger {
        self.state.read().await.ledger.clone()
    }

    /// Run the operator filter without changing anything.
    pub async fn check_authorized(
        &self,
        operator: &Address,
        token_owner: &Address,
    ) -> Result<Authorization, FilterError> {
        let filter = self.state.read().await.filter.clone();
        filter.check_authorized(operator, token_owner).await
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Install `policy`, or remove the current one with `None`. Owner only.
    pub async fn set_operator_filter(
        &self,
        caller: &Address,
        policy: Option<Address>,
    ) -> Result<(), FilterError> {
        let (previous, current) = {
            let _commit = self.commit.lock().await;
            let mut state = self.state.write().await;
            let previous = state.filter.set_operator_filter(caller, policy)?;
            (previous, state.filter.operator_filter())
        };
        self.events
            .publish(&GateEvent::OperatorFilterChanged {
                registry: self.address,
                previous,
                current,
            })
            .await;
        Ok(())
    }

    /// Hand registry ownership to `new_owner`. Owner only.
    pub async fn transfer_ownership(
        &self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), FilterError> {
        let previous = {
            let _commit = self.commit.lock().await;
            let mut state = self.state.write().await;
            state.filter.transfer_ownership(caller, new_owner)?
        };
        self.events
            .publish(&GateEvent::OwnershipTransferred {
                registry: self.address,
                previous,
                current: Some(new_owner),
            })
            .await;
        Ok(())
    }

    /// Leave the registry without an owner. Owner only.
    pub async fn renounce_ownership(&self, caller: &Address) -> Result<(), FilterError> {
        let previous = {
            let _commit = self.commit.lock().await;
            let mut state = self.state.write().await;
            state.filter.renounce_ownership(caller)?
        };
        self.events
            .publish(&GateEvent::OwnershipTransferred {
                registry: self.address,
                previous,
                current: None,
            })
            .await;
        Ok(())
    }

    /// Create `token_id` for `to`. Owner only.
    ///
    /// Minting has no current holder, so the operator filter is not consulted.
    pub async fn mint(&self, caller: &Address, to: Address, token_id: u64) -> Result<(), TokenError> {
        {
            let _commit = self.commit.lock().await;
            let mut state = self.state.write().await;
            if state.filter.owner().as_ref() != Some(caller) {
                return Err(TokenError::NotAuthorized { caller: *caller });
            }
            state.ledger.mint(to, token_id)?;
        }
        tracing::info!(registry = %self.address, %to, token_id, "token minted");
        self.events
            .publish(&GateEvent::Transfer {
                registry: self.address,
                from: Address::ZERO,
                to,
                token_id,
            })
            .await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Approvals
    // ------------------------------------------------------------------

    /// Approve `to` to move `token_id`; the zero address clears it.
    ///
    /// Granting is not filtered; spending the approval is.
    pub async fn approve(&self, caller: &Address, to: Address, token_id: u64) -> Result<(), TokenError> {
        let owner = {
            let _commit = self.commit.lock().await;
            let mut state = self.state.write().await;
            let owner = state.ledger.owner_of(token_id)?;
            if to == owner {
                return Err(TokenError::ApproveToOwner(to));
            }
            if *caller != owner && !state.ledger.is_approved_for_all(&owner, caller) {
                return Err(TokenError::NotApproved {
                    caller: *caller,
                    token_id,
                });
            }
            state.ledger.approve(to, token_id)?;
            owner
        };
        self.events
            .publish(&GateEvent::Approval {
                registry: self.address,
                owner,
                approved: to,
                token_id,
            })
            .await;
        Ok(())
    }

    /// Let `operator` manage every token `caller` holds, or revoke that.
    pub async fn set_approval_for_all(
        &self,
        caller: &Address,
        operator: Address,
        approved: bool,
    ) -> Result<(), TokenError> {
        if operator == *caller {
            return Err(TokenError::ApproveToCaller(operator));
        }
        {
            let _commit = self.commit.lock().await;
            let mut state = self.state.write().await;
            state.ledger.set_approval_for_all(*caller, operator, approved);
        }
        self.events
            .publish(&GateEvent::ApprovalForAll {
                registry: self.address,
                owner: *caller,
                operator,
                approved,
            })
            .await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Custody changes
    // ------------------------------------------------------------------

    /// Move `token_id` from `from` to `to` on behalf of `caller`.
    ///
    /// `caller` must own the token or hold an approval for it, and must
    /// pass the operator filter. On any failure nothing changes.
    pub async fn transfer_from(
        &self,
        caller: &Address,
        from: Address,
        to: Address,
        token_id: u64,
    ) -> Result<(), TokenError> {
        let commit = self.commit.lock().await;
        let (owner, filter) = {
            let state = self.state.read().await;
            let owner = state.ledger.owner_of(token_id)?;
            if !state.ledger.is_approved_or_owner(caller, token_id)? {
                return Err(TokenError::NotApproved {
                    caller: *caller,
                    token_id,
                });
            }
            if from != owner {
                return Err(TokenError::IncorrectOwner {
                    token_id,
                    from,
                    owner,
                });
            }
            if to.is_zero() {
                return Err(TokenError::InvalidReceiver(to));
            }
            (owner, state.filter.clone())
        };

        if let Err(err) = filter.check_authorized(caller, &owner).await {
            drop(commit);
            self.report_rejection(&filter, &err, caller, &owner).await;
            return Err(err.into());
        }

        self.state.write().await.ledger.move_token(to, token_id)?;
        drop(commit);

        tracing::info!(registry = %self.address, %from, %to, token_id, operator = %caller, "token transferred");
        self.events
            .publish(&GateEvent::Transfer {
                registry: self.address,
                from,
                to,
                token_id,
            })
            .await;
        Ok(())
    }

    /// Destroy `token_id` on behalf of `caller`.
    ///
    /// Same access rules as `transfer_from`.
    pub async fn burn(&self, caller: &Address, token_id: u64) -> Result<(), TokenError> {
        let commit = self.commit.lock().await;
        let (owner, filter) = {
            let state = self.state.read().await;
            let owner = state.ledger.owner_of(token_id)?;
            if !state.ledger.is_approved_or_owner(caller, token_id)? {
                return Err(TokenError::NotApproved {
                    caller: *caller,
                    token_id,
                });
            }
            (owner, state.filter.clone())
        };

        if let Err(err) = filter.check_authorized(caller, &owner).await {
            drop(commit);
            self.report_rejection(&filter, &err, caller, &owner).await;
            return Err(err.into());
        }

        self.state.write().await.ledger.burn(token_id)?;
        drop(commit);

        tracing::info!(registry = %self.address, %owner, token_id, operator = %caller, "token burned");
        self.events
            .publish(&GateEvent::Transfer {
                registry: self.address,
                from: owner,
                to: Address::ZERO,
                token_id,
            })
            .await;
        Ok(())
    }

    /// Publish `OperatorRejected` when the filter refused the operator.
    async fn report_rejection(
        &self,
        filter: &OperatorFilter,
        err: &FilterError,
        operator: &Address,
        token_owner: &Address,
    ) {
        if let (FilterError::IllegalOperator { .. }, Some(policy)) = (err, filter.operator_filter()) {
            self.events
                .publish(&GateEvent::OperatorRejected {
                    registry: self.address,
                    policy,
                    operator: *operator,
                    token_owner: *token_owner,
                })
                .await;
        }
    }
}
