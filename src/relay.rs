// ABOUTME: Defines TransferProxy - a relay that moves tokens under its own identity.
// ABOUTME: Models marketplaces that hold a standing approval from users.

use crate::address::Address;
use crate::error::TokenError;
use crate::token::TokenRegistry;

/// A relay forwarding transfers to a registry as the operator.
///
/// The registry sees the proxy's address, not the user who asked the
/// proxy to act, so the proxy is what the operator filter evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProxy {
    address: Address,
}

impl TransferProxy {
    /// Deploy a proxy at a fresh address.
    pub fn new() -> Self {
        Self::at(Address::random())
    }

    /// Deploy a proxy at a known address.
    pub fn at(address: Address) -> Self {
        Self { address }
    }

    /// The proxy's identity.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Forward `transfer_from(from, to, token_id)` to `registry`.
    ///
    /// Errors come back exactly as the registry raised them.
    pub async fn transfer_from(
        &self,
        registry: &TokenRegistry,
        from: Address,
        to: Address,
        token_id: u64,
    ) -> Result<(), TokenError> {
        tracing::debug!(proxy = %self.address, registry = %registry.address(), token_id, "relaying transfer");
        registry
            .transfer_from(&self.address, from, to, token_id)
            .await
    }
}

impl Default for TransferProxy {
    fn default() -> Self {
        Self::new()
    }
}
