// ABOUTME: Token module - NFT bookkeeping and the registry that wraps it
// ABOUTME: with an operator filter at every custody-changing entry point.

mod ledger;
mod registry;

pub use ledger::*;
pub use registry::*;

#[cfg(test)]
mod registry_test;
