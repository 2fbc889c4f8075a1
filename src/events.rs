// ABOUTME: Event bus for observing registry and policy state changes.
// ABOUTME: Provides events, the Observer trait, and a shared EventBus.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::address::Address;

/// Events published after a state change commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// The operator filter installed in a registry changed.
    OperatorFilterChanged {
        registry: Address,
        previous: Option<Address>,
        current: Option<Address>,
    },

    /// Registry ownership moved (or was renounced when `current` is None).
    OwnershipTransferred {
        registry: Address,
        previous: Option<Address>,
        current: Option<Address>,
    },

    /// A token changed custody. Mints come from, and burns go to, the zero address.
    Transfer {
        registry: Address,
        from: Address,
        to: Address,
        token_id: u64,
    },

    /// A single-token approval was granted or cleared.
    Approval {
        registry: Address,
        owner: Address,
        approved: Address,
        token_id: u64,
    },

    /// An operator approval for all of an owner's tokens was toggled.
    ApprovalForAll {
        registry: Address,
        owner: Address,
        operator: Address,
        approved: bool,
    },

    /// The installed policy refused an operator. Nothing was changed.
    OperatorRejected {
        registry: Address,
        policy: Address,
        operator: Address,
        token_owner: Address,
    },

    /// A blacklist policy changed the block flag of an operator.
    OperatorBlockChanged {
        policy: Address,
        operator: Address,
        blocked: bool,
    },

    /// An allowlist policy changed the allow flag of an operator.
    OperatorAllowChanged {
        policy: Address,
        operator: Address,
        allowed: bool,
    },

    /// A policy's admin moved (or was renounced when `current` is None).
    PolicyAdminChanged {
        policy: Address,
        previous: Option<Address>,
        current: Option<Address>,
    },
}

impl GateEvent {
    /// Short name of the event variant.
    pub fn kind(&self) -> &'static str {
        match self {
            GateEvent::OperatorFilterChanged { .. } => "OperatorFilterChanged",
            GateEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            GateEvent::Transfer { .. } => "Transfer",
            GateEvent::Approval { .. } => "Approval",
            GateEvent::ApprovalForAll { .. } => "ApprovalForAll",
            GateEvent::OperatorRejected { .. } => "OperatorRejected",
            GateEvent::OperatorBlockChanged { .. } => "OperatorBlockChanged",
            GateEvent::OperatorAllowChanged { .. } => "OperatorAllowChanged",
            GateEvent::PolicyAdminChanged { .. } => "PolicyAdminChanged",
        }
    }
}

/// Trait for implementing observers.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Called for each published event this observer accepts.
    ///
    /// Returning `Err` is logged and otherwise ignored; the operation that
    /// produced the event has already committed.
    async fn on_event(&self, event: &GateEvent) -> Result<(), anyhow::Error>;

    /// Optional: Filter which events this observer cares about.
    /// Default returns true for all events.
    fn accepts(&self, event: &GateEvent) -> bool {
        let _ = event;
        true
    }
}

/// Shared list of observers. Clones publish to the same observers.
///
/// Components publish after their own locks are released, so an observer
/// may call back into the component that emitted the event. Events of one
/// caller arrive in the order its calls committed.
#[derive(Clone, Default)]
pub struct EventBus {
    observers: Arc<RwLock<Vec<Arc<dyn Observer>>>>,
}

impl EventBus {
    /// Create a bus with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an observer.
    pub async fn subscribe(&self, observer: impl Observer + 'static) {
        self.subscribe_arc(Arc::new(observer)).await;
    }

    /// Subscribe an observer wrapped in Arc.
    pub async fn subscribe_arc(&self, observer: Arc<dyn Observer>) {
        self.observers.write().await.push(observer);
    }

    /// Deliver an event to every accepting observer, in subscription order.
    pub async fn publish(&self, event: &GateEvent) {
        let observers = self.observers.read().await.clone();
        for observer in observers.iter() {
            if !observer.accepts(event) {
                continue;
            }
            if let Err(err) = observer.on_event(event).await {
                tracing::warn!(event = event.kind(), error = %err, "observer failed");
            }
        }
    }

    /// Get the number of subscribed observers.
    pub async fn len(&self) -> usize {
        self.observers.read().await.len()
    }

    /// Check if no observer is subscribed.
    pub async fn is_empty(&self) -> bool {
        self.observers.read().await.is_empty()
    }

    /// Subscribe a callback that only sees Transfer events.
    ///
    /// The callback receives (from, to, token_id).
    pub async fn on_transfer<F>(&self, f: F)
    where
        F: Fn(&Address, &Address, u64) + Send + Sync + 'static,
    {
        self.subscribe(TransferObserver { callback: f }).await;
    }

    /// Subscribe a callback that only sees OperatorRejected events.
    ///
    /// The callback receives (policy, operator, token_owner).
    pub async fn on_rejected<F>(&self, f: F)
    where
        F: Fn(&Address, &Address, &Address) + Send + Sync + 'static,
    {
        self.subscribe(RejectedObserver { callback: f }).await;
    }
}

/// Observer wrapper for Transfer events.
struct TransferObserver<F> {
    callback: F,
}

#[async_trait]
impl<F> Observer for TransferObserver<F>
where
    F: Fn(&Address, &Address, u64) + Send + Sync,
{
    fn accepts(&self, event: &GateEvent) -> bool {
        matches!(event, GateEvent::Transfer { .. })
    }

    async fn on_event(&self, event: &GateEvent) -> Result<(), anyhow::Error> {
        if let GateEvent::Transfer {
            from, to, token_id, ..
        } = event
        {
            (self.callback)(from, to, *token_id);
        }
        Ok(())
    }
}

/// Observer wrapper for OperatorRejected events.
struct RejectedObserver<F> {
    callback: F,
}

#[async_trait]
impl<F> Observer for RejectedObserver<F>
where
    F: Fn(&Address, &Address, &Address) + Send + Sync,
{
    fn accepts(&self, event: &GateEvent) -> bool {
        matches!(event, GateEvent::OperatorRejected { .. })
    }

    async fn on_event(&self, event: &GateEvent) -> Result<(), anyhow::Error> {
        if let GateEvent::OperatorRejected {
            policy,
            operator,
            token_owner,
            ..
        } = event
        {
            (self.callback)(policy, operator, token_owner);
        }
        Ok(())
    }
}
