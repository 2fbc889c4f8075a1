// ABOUTME: Defines all error types for the opfilter library using thiserror.
// ABOUTME: Each concern has its own error enum, unified under GateError.

use crate::address::Address;

/// Top-level error type for the opfilter library.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from admin-gated operations, shared by registries and policies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("caller {caller} is not authorized")]
    NotAuthorized { caller: Address },

    #[error("new admin is the zero address")]
    InvalidAdmin,
}

/// Errors from the operator filter installed in a registry.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("caller {caller} is not authorized")]
    NotAuthorized { caller: Address },

    #[error("new owner is the zero address")]
    InvalidOwner,

    #[error("operator filter: illegal operator {operator}")]
    IllegalOperator { operator: Address },

    #[error("operator filter: policy {policy} is not deployed")]
    PolicyUnavailable { policy: Address },

    #[error("operator filter: policy {policy} failed: {source}")]
    PolicyFailed {
        policy: Address,
        #[source]
        source: anyhow::Error,
    },
}

impl From<AccessError> for FilterError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotAuthorized { caller } => FilterError::NotAuthorized { caller },
            AccessError::InvalidAdmin => FilterError::InvalidOwner,
        }
    }
}

/// Errors from policy administration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("caller {caller} is not authorized")]
    NotAuthorized { caller: Address },

    #[error("new admin is the zero address")]
    InvalidAdmin,
}

impl From<AccessError> for PolicyError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotAuthorized { caller } => PolicyError::NotAuthorized { caller },
            AccessError::InvalidAdmin => PolicyError::InvalidAdmin,
        }
    }
}

/// Errors from token registry operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token {0} does not exist")]
    NonexistentToken(u64),

    #[error("caller {caller} is not authorized")]
    NotAuthorized { caller: Address },

    #[error("token {0} already minted")]
    AlreadyMinted(u64),

    #[error("caller {caller} is not token owner or approved for token {token_id}")]
    NotApproved { caller: Address, token_id: u64 },

    #[error("token {token_id} is owned by {owner}, not {from}")]
    IncorrectOwner {
        token_id: u64,
        from: Address,
        owner: Address,
    },

    #[error("invalid receiver {0}")]
    InvalidReceiver(Address),

    #[error("approval to current owner {0}")]
    ApproveToOwner(Address),

    #[error("approve to caller {0}")]
    ApproveToCaller(Address),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl TokenError {
    /// The filter error behind this failure, if the operator filter denied it.
    pub fn as_filter(&self) -> Option<&FilterError> {
        match self {
            TokenError::Filter(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the call was denied because the operator is blocked by policy.
    pub fn is_illegal_operator(&self) -> bool {
        matches!(
            self.as_filter(),
            Some(FilterError::IllegalOperator { .. })
        )
    }
}

/// Errors from loading and deploying a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),

    #[error("duplicate name '{0}'")]
    DuplicateName(String),

    #[error("address {0} is given to more than one component")]
    DuplicateAddress(Address),
}
