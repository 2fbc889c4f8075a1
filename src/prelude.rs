// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use opfilter::prelude::*;` to get started quickly.

pub use crate::access::Admin;
pub use crate::address::{Address, AddressParseError};
pub use crate::config::{
    DeployedPolicy, Deployment, GateConfig, MintConfig, PolicyConfig, PolicyKind,
};
pub use crate::error::{AccessError, ConfigError, FilterError, GateError, PolicyError, TokenError};
pub use crate::events::{EventBus, GateEvent, Observer};
pub use crate::filter::{Authorization, OperatorFilter};
pub use crate::policy::{AllowlistPolicy, BlacklistPolicy, OperatorPolicy, PolicyDirectory};
pub use crate::relay::TransferProxy;
pub use crate::token::{Ledger, TokenRegistry};
