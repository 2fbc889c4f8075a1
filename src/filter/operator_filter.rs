// ABOUTME: Defines the OperatorFilter - the installed-policy slot of a registry
// ABOUTME: and the three-step authorization check run before custody changes.

use crate::access::Admin;
use crate::address::Address;
use crate::error::FilterError;
use crate::policy::PolicyDirectory;

/// Why an operator was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// No policy is installed.
    Unfiltered,
    /// The operator owns the token; the policy was not consulted.
    OwnerBypass,
    /// The installed policy admitted the operator.
    PolicyApproved { policy: Address },
}

/// The operator filter of one registry.
///
/// Holds the registry owner, the address of the installed policy (if
/// any) and the directory used to resolve that address on each check.
#[derive(Clone)]
pub struct OperatorFilter {
    owner: Admin,
    installed: Option<Address>,
    directory: PolicyDirectory,
}

impl OperatorFilter {
    /// Create a filter owned by `owner` with no policy installed.
    pub fn new(owner: Address, directory: PolicyDirectory) -> Self {
        Self {
            owner: Admin::new(owner),
            installed: None,
            directory,
        }
    }

    /// The registry owner, or None once renounced.
    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    /// Address of the installed policy, or None.
    pub fn operator_filter(&self) -> Option<Address> {
        self.installed
    }

    /// The directory policies are resolved from.
    pub fn directory(&self) -> &PolicyDirectory {
        &self.directory
    }

    /// Install `policy`, or remove the current one with `None`. Owner only.
    ///
    /// The zero address also means "no policy". The target is not checked;
    /// an address with nothing deployed only fails on the next third-party
    /// transfer. Returns the previously installed address.
    pub fn set_operator_filter(
        &mut self,
        caller: &Address,
        policy: Option<Address>,
    ) -> Result<Option<Address>, FilterError> {
        self.owner.ensure(caller)?;
        let policy = policy.and_then(Address::non_zero);
        let previous = std::mem::replace(&mut self.installed, policy);
        match policy {
            Some(policy) => tracing::info!(%policy, "operator filter installed"),
            None => tracing::info!("operator filter removed"),
        }
        Ok(previous)
    }

    /// Hand registry ownership to `new_owner`. Owner only.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<Option<Address>, FilterError> {
        let previous = self.owner.transfer(caller, new_owner)?;
        tracing::info!(owner = %new_owner, "registry ownership transferred");
        Ok(previous)
    }

    /// Leave the registry without an owner. The installed policy can no
    /// longer be changed afterwards. Owner only.
    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<Option<Address>, FilterError> {
        let previous = self.owner.renounce(caller)?;
        tracing::info!("registry ownership renounced");
        Ok(previous)
    }

    /// Decide whether `operator` may move a token held by `token_owner`.
    ///
    /// 1. No policy installed: permitted.
    /// 2. `operator == token_owner`: permitted without consulting the policy.
    /// 3. Otherwise the installed policy decides; a refusal is
    ///    `IllegalOperator`.
    pub async fn check_authorized(
        &self,
        operator: &Address,
        token_owner: &Address,
    ) -> Result<Authorization, FilterError> {
        let Some(policy) = self.installed else {
            tracing::debug!(%operator, "no operator filter installed");
            return Ok(Authorization::Unfiltered);
        };

        if operator == token_owner {
            tracing::debug!(%operator, "operator owns token, filter bypassed");
            return Ok(Authorization::OwnerBypass);
        }

        let Some(instance) = self.directory.get(&policy).await else {
            tracing::warn!(%policy, "installed operator filter is not deployed");
            return Err(FilterError::PolicyUnavailable { policy });
        };

        let permitted = instance
            .may_operate(operator)
            .await
            .map_err(|source| FilterError::PolicyFailed { policy, source })?;

        if permitted {
            tracing::debug!(%operator, %policy, "operator admitted by filter");
            Ok(Authorization::PolicyApproved { policy })
        } else {
            tracing::warn!(%operator, %token_owner, %policy, "operator rejected by filter");
            Err(FilterError::IllegalOperator {
                operator: *operator,
            })
        }
    }
}
