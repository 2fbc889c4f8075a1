// ABOUTME: Configuration for a registry deployment, loaded from JSON.
// ABOUTME: Deploys the registry, its policies, relays and initial mints.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{ConfigError, GateError, PolicyError};
use crate::events::EventBus;
use crate::policy::{AllowlistPolicy, BlacklistPolicy, OperatorPolicy, PolicyDirectory};
use crate::relay::TransferProxy;
use crate::token::TokenRegistry;

/// Which policy implementation to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Blacklist,
    Allowlist,
}

/// A policy to deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub kind: PolicyKind,

    /// The policy's own admin, independent of the registry owner.
    pub admin: Address,

    /// Fixed address; a random one is used when absent.
    #[serde(default)]
    pub address: Option<Address>,

    /// Initially blocked (blacklist) or allowed (allowlist) operators.
    #[serde(default)]
    pub entries: Vec<Address>,
}

/// A token to mint at deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintConfig {
    pub to: Address,
    pub token_id: u64,
}

/// Full description of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Registry owner.
    pub owner: Address,

    /// Fixed registry address; a random one is used when absent.
    #[serde(default)]
    pub registry: Option<Address>,

    /// Name of the policy to install right away.
    #[serde(default)]
    pub filter: Option<String>,

    /// Named accounts, for display and lookup only.
    #[serde(default)]
    pub accounts: BTreeMap<String, Address>,

    #[serde(default)]
    pub policies: BTreeMap<String, PolicyConfig>,

    /// Named relays; `null` picks a random address.
    #[serde(default)]
    pub proxies: BTreeMap<String, Option<Address>>,

    #[serde(default)]
    pub mints: Vec<MintConfig>,
}

impl GateConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// A small ready-to-play deployment: an owner, two holders, one
    /// marketplace relay and a blacklist installed as the filter.
    pub fn demo() -> Self {
        let owner = Address::repeat(0x01);
        let alice = Address::repeat(0xa1);
        let bob = Address::repeat(0xb0);

        let accounts = BTreeMap::from([
            ("owner".to_string(), owner),
            ("alice".to_string(), alice),
            ("bob".to_string(), bob),
        ]);
        let policies = BTreeMap::from([(
            "blocklist".to_string(),
            PolicyConfig {
                kind: PolicyKind::Blacklist,
                admin: owner,
                address: None,
                entries: Vec::new(),
            },
        )]);
        let proxies = BTreeMap::from([("market".to_string(), None)]);

        Self {
            owner,
            registry: None,
            filter: Some("blocklist".to_string()),
            accounts,
            policies,
            proxies,
            mints: vec![MintConfig {
                to: alice,
                token_id: 1,
            }],
        }
    }

    /// Check names and references without deploying anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        let all = self
            .accounts
            .keys()
            .chain(self.policies.keys())
            .chain(self.proxies.keys());
        for name in all {
            if !names.insert(name.as_str()) {
                return Err(ConfigError::DuplicateName(name.clone()));
            }
        }

        // Fixed addresses of deployed components must not collide, or the
        // directory would resolve one policy in place of another.
        let mut addresses = BTreeSet::new();
        let fixed = self
            .registry
            .iter()
            .chain(self.policies.values().filter_map(|p| p.address.as_ref()))
            .chain(self.proxies.values().flatten());
        for address in fixed {
            if !addresses.insert(*address) {
                return Err(ConfigError::DuplicateAddress(*address));
            }
        }

        if let Some(filter) = &self.filter {
            if !self.policies.contains_key(filter) {
                return Err(ConfigError::UnknownPolicy(filter.clone()));
            }
        }
        Ok(())
    }

    /// Deploy everything this configuration describes.
    pub async fn deploy(&self) -> Result<Deployment, GateError> {
        self.validate()?;

        let events = EventBus::new();
        let directory = PolicyDirectory::new();

        let mut policies = BTreeMap::new();
        for (name, config) in &self.policies {
            let address = config.address.unwrap_or_else(Address::random);
            let deployed = match config.kind {
                PolicyKind::Blacklist => DeployedPolicy::Blacklist(Arc::new(
                    BlacklistPolicy::at(address, config.admin)
                        .with_blocked(config.entries.iter().copied())
                        .with_events(events.clone()),
                )),
                PolicyKind::Allowlist => DeployedPolicy::Allowlist(Arc::new(
                    AllowlistPolicy::at(address, config.admin)
                        .with_allowed(config.entries.iter().copied())
                        .with_events(events.clone()),
                )),
            };
            directory.register_arc(deployed.as_policy()).await;
            tracing::debug!(%name, %address, kind = deployed.kind(), "policy deployed");
            policies.insert(name.clone(), deployed);
        }

        let mut registry = TokenRegistry::new(self.owner, directory.clone()).with_events(events.clone());
        if let Some(address) = self.registry {
            registry = registry.with_address(address);
        }

        if let Some(filter) = &self.filter {
            let address = policies
                .get(filter)
                .map(DeployedPolicy::address)
                .ok_or_else(|| ConfigError::UnknownPolicy(filter.clone()))?;
            registry.set_operator_filter(&self.owner, Some(address)).await?;
        }

        for mint in &self.mints {
            registry.mint(&self.owner, mint.to, mint.token_id).await?;
        }

        let proxies = self
            .proxies
            .iter()
            .map(|(name, address)| {
                let proxy = address.map(TransferProxy::at).unwrap_or_default();
                (name.clone(), proxy)
            })
            .collect();

        tracing::info!(registry = %registry.address(), owner = %self.owner, "deployment ready");

        Ok(Deployment {
            registry: Arc::new(registry),
            directory,
            events,
            policies,
            proxies,
            accounts: self.accounts.clone(),
        })
    }
}

/// A policy deployed from configuration, keeping its concrete admin API.
#[derive(Clone)]
pub enum DeployedPolicy {
    Blacklist(Arc<BlacklistPolicy>),
    Allowlist(Arc<AllowlistPolicy>),
}

impl DeployedPolicy {
    pub fn address(&self) -> Address {
        self.as_policy().address()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DeployedPolicy::Blacklist(_) => "blacklist",
            DeployedPolicy::Allowlist(_) => "allowlist",
        }
    }

    /// The policy as the capability registries consult.
    pub fn as_policy(&self) -> Arc<dyn OperatorPolicy> {
        match self {
            DeployedPolicy::Blacklist(policy) => policy.clone(),
            DeployedPolicy::Allowlist(policy) => policy.clone(),
        }
    }

    /// Set the list flag of `operator`: blocked for a blacklist, allowed
    /// for an allowlist.
    pub async fn set_listed(
        &self,
        caller: &Address,
        operator: Address,
        listed: bool,
    ) -> Result<(), PolicyError> {
        match self {
            DeployedPolicy::Blacklist(policy) => policy.set_blocked(caller, operator, listed).await,
            DeployedPolicy::Allowlist(policy) => policy.set_allowed(caller, operator, listed).await,
        }
    }

    /// Operators currently on the list, sorted.
    pub async fn listed(&self) -> Vec<Address> {
        match self {
            DeployedPolicy::Blacklist(policy) => policy.blocked().await,
            DeployedPolicy::Allowlist(policy) => policy.allowed().await,
        }
    }
}

/// Everything a configuration deployed.
pub struct Deployment {
    pub registry: Arc<TokenRegistry>,
    pub directory: PolicyDirectory,
    pub events: EventBus,
    pub policies: BTreeMap<String, DeployedPolicy>,
    pub proxies: BTreeMap<String, TransferProxy>,
    pub accounts: BTreeMap<String, Address>,
}

impl Deployment {
    /// Resolve a name (account, policy, proxy or "registry") or a hex address.
    pub fn resolve(&self, name: &str) -> Option<Address> {
        if name == "registry" {
            return Some(self.registry.address());
        }
        if let Some(address) = self.accounts.get(name) {
            return Some(*address);
        }
        if let Some(policy) = self.policies.get(name) {
            return Some(policy.address());
        }
        if let Some(proxy) = self.proxies.get(name) {
            return Some(proxy.address());
        }
        name.parse().ok()
    }

    /// The best name for `address`, falling back to its hex form.
    pub fn name_of(&self, address: &Address) -> String {
        let named = self
            .accounts
            .iter()
            .find(|(_, a)| *a == address)
            .map(|(name, _)| name.clone())
            .or_else(|| {
                self.policies
                    .iter()
                    .find(|(_, p)| p.address() == *address)
                    .map(|(name, _)| name.clone())
            })
            .or_else(|| {
                self.proxies
                    .iter()
                    .find(|(_, p)| p.address() == *address)
                    .map(|(name, _)| name.clone())
            });
        named.unwrap_or_else(|| address.to_string())
    }
}
