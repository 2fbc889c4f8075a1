// ABOUTME: Defines the Ledger - ownership, balances and approvals of NFTs.
// ABOUTME: Pure bookkeeping; access control lives in TokenRegistry.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::address::Address;
use crate::error::TokenError;

/// Ownership and approval state of a token collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    owners: BTreeMap<u64, Address>,
    balances: HashMap<Address, u64>,
    token_approvals: HashMap<u64, Address>,
    operator_approvals: BTreeSet<(Address, Address)>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current owner of `token_id`.
    pub fn owner_of(&self, token_id: u64) -> Result<Address, TokenError> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(TokenError::NonexistentToken(token_id))
    }

    /// Whether `token_id` has been minted and not burned.
    pub fn exists(&self, token_id: u64) -> bool {
        self.owners.contains_key(&token_id)
    }

    /// Number of tokens held by `owner`.
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Number of tokens in existence.
    pub fn total_supply(&self) -> usize {
        self.owners.len()
    }

    /// The account approved for `token_id`, if any.
    pub fn get_approved(&self, token_id: u64) -> Result<Option<Address>, TokenError> {
        self.owner_of(token_id)?;
        Ok(self.token_approvals.get(&token_id).copied())
    }

    /// Whether `operator` may manage every token of `owner`.
    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.operator_approvals.contains(&(*owner, *operator))
    }

    /// Whether `spender` is the owner, the approved account, or an
    /// operator of the owner of `token_id`.
    pub fn is_approved_or_owner(&self, spender: &Address, token_id: u64) -> Result<bool, TokenError> {
        let owner = self.owner_of(token_id)?;
        Ok(*spender == owner
            || self.is_approved_for_all(&owner, spender)
            || self.token_approvals.get(&token_id) == Some(spender))
    }

    pub(crate) fn mint(&mut self, to: Address, token_id: u64) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidReceiver(to));
        }
        if self.exists(token_id) {
            return Err(TokenError::AlreadyMinted(token_id));
        }
        self.owners.insert(token_id, to);
        *self.balances.entry(to).or_default() += 1;
        Ok(())
    }

    /// Remove `token_id` and its approval. Returns the last owner.
    pub(crate) fn burn(&mut self, token_id: u64) -> Result<Address, TokenError> {
        let owner = self
            .owners
            .remove(&token_id)
            .ok_or(TokenError::NonexistentToken(token_id))?;
        self.token_approvals.remove(&token_id);
        self.debit(&owner);
        Ok(owner)
    }

    /// Move `token_id` from its owner to `to`, clearing its approval.
    pub(crate) fn move_token(&mut self, to: Address, token_id: u64) -> Result<Address, TokenError> {
        let from = self.owner_of(token_id)?;
        self.token_approvals.remove(&token_id);
        self.debit(&from);
        *self.balances.entry(to).or_default() += 1;
        self.owners.insert(token_id, to);
        Ok(from)
    }

    /// Approve `to` for `token_id`; the zero address clears the approval.
    pub(crate) fn approve(&mut self, to: Address, token_id: u64) -> Result<(), TokenError> {
        self.owner_of(token_id)?;
        match to.non_zero() {
            Some(to) => self.token_approvals.insert(token_id, to),
            None => self.token_approvals.remove(&token_id),
        };
        Ok(())
    }

    pub(crate) fn set_approval_for_all(&mut self, owner: Address, operator: Address, approved: bool) {
        if approved {
            self.operator_approvals.insert((owner, operator));
        } else {
            self.operator_approvals.remove(&(owner, operator));
        }
    }

    fn debit(&mut self, owner: &Address) {
        if let Some(balance) = self.balances.get_mut(owner) {
            *balance = balance.saturating_sub(1);
            if *balance == 0 {
                self.balances.remove(owner);
            }
        }
    }
}
