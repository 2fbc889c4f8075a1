// ABOUTME: Defines the OperatorPolicy trait - the single yes/no capability
// ABOUTME: a registry consults before a third party moves a token.

use async_trait::async_trait;

use crate::address::Address;

/// A policy deciding whether an operator may act on behalf of token owners.
///
/// Implementations own whatever state they need; a registry only ever
/// holds the policy's address and resolves it through a
/// [`PolicyDirectory`](super::PolicyDirectory).
#[async_trait]
pub trait OperatorPolicy: Send + Sync {
    /// Returns the address this policy is deployed at.
    fn address(&self) -> Address;

    /// Returns a short human-readable kind, e.g. "blacklist".
    fn kind(&self) -> &str {
        "custom"
    }

    /// Whether `operator` may transfer tokens it does not own.
    ///
    /// Must not mutate state. It may read the registry it guards, but must
    /// not call that registry's state-changing operations, which wait for
    /// the check in progress. Returns `Err` only when the policy itself is
    /// broken; the error is surfaced to the caller of the transfer.
    async fn may_operate(&self, operator: &Address) -> Result<bool, anyhow::Error>;
}
