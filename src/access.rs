// ABOUTME: Defines Admin - the single principal allowed to run gated operations.
// ABOUTME: Used for registry ownership and for each policy's own admin.

use crate::address::Address;
use crate::error::AccessError;

/// A single administrative principal, or none once renounced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admin {
    principal: Option<Address>,
}

impl Admin {
    /// Create an admin slot held by `principal`.
    ///
    /// The zero address yields a renounced slot.
    pub fn new(principal: Address) -> Self {
        Self {
            principal: principal.non_zero(),
        }
    }

    /// Create a slot that nobody holds.
    pub fn renounced() -> Self {
        Self { principal: None }
    }

    /// The current principal, if any.
    pub fn get(&self) -> Option<Address> {
        self.principal
    }

    /// Whether `caller` currently holds this slot.
    pub fn is(&self, caller: &Address) -> bool {
        self.principal.as_ref() == Some(caller)
    }

    /// Fail with `NotAuthorized` unless `caller` holds this slot.
    pub fn ensure(&self, caller: &Address) -> Result<(), AccessError> {
        if self.is(caller) {
            Ok(())
        } else {
            Err(AccessError::NotAuthorized { caller: *caller })
        }
    }

    /// Hand the slot to `new_admin`. Returns the previous principal.
    pub fn transfer(
        &mut self,
        caller: &Address,
        new_admin: Address,
    ) -> Result<Option<Address>, AccessError> {
        self.ensure(caller)?;
        if new_admin.is_zero() {
            return Err(AccessError::InvalidAdmin);
        }
        Ok(self.principal.replace(new_admin))
    }

    /// Give up the slot for good. Returns the previous principal.
    pub fn renounce(&mut self, caller: &Address) -> Result<Option<Address>, AccessError> {
        self.ensure(caller)?;
        Ok(self.principal.take())
    }
}
