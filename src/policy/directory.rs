// ABOUTME: Implements the PolicyDirectory - a thread-safe lookup from
// ABOUTME: policy address to the deployed policy instance.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::OperatorPolicy;
use crate::address::Address;

/// A thread-safe directory of deployed policies, keyed by address.
///
/// Registries store only a policy's address and resolve it here on each
/// check, so a policy is never owned by the registries that install it.
#[derive(Default)]
pub struct PolicyDirectory {
    policies: Arc<RwLock<HashMap<Address, Arc<dyn OperatorPolicy>>>>,
}

impl PolicyDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a policy. Returns its address.
    pub async fn register<P: OperatorPolicy + 'static>(&self, policy: P) -> Address {
        self.register_arc(Arc::new(policy)).await
    }

    /// Deploy a policy from an Arc. Returns its address.
    ///
    /// A policy already deployed at the same address is replaced.
    pub async fn register_arc(&self, policy: Arc<dyn OperatorPolicy>) -> Address {
        let address = policy.address();
        let mut policies = self.policies.write().await;
        if policies.insert(address, policy).is_some() {
            tracing::warn!(policy = %address, "replaced policy deployed at same address");
        }
        address
    }

    /// Remove a policy by address.
    ///
    /// Registries that still reference it fail their next third-party check.
    pub async fn unregister(&self, address: &Address) -> Option<Arc<dyn OperatorPolicy>> {
        let mut policies = self.policies.write().await;
        policies.remove(address)
    }

    /// Get a policy by address.
    pub async fn get(&self, address: &Address) -> Option<Arc<dyn OperatorPolicy>> {
        let policies = self.policies.read().await;
        policies.get(address).cloned()
    }

    /// Check whether a policy is deployed at `address`.
    pub async fn contains(&self, address: &Address) -> bool {
        self.policies.read().await.contains_key(address)
    }

    /// List all policy addresses, sorted.
    pub async fn list(&self) -> Vec<Address> {
        let policies = self.policies.read().await;
        let mut addresses: Vec<_> = policies.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Get the number of deployed policies.
    pub async fn count(&self) -> usize {
        let policies = self.policies.read().await;
        policies.len()
    }
}

impl Clone for PolicyDirectory {
    fn clone(&self) -> Self {
        Self {
            policies: Arc::clone(&self.policies),
        }
    }
}
