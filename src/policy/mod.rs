// ABOUTME: Policy module - the operator policy capability and its variants.
// ABOUTME: Includes blacklist and allowlist policies and the policy directory.

mod allowlist;
mod blacklist;
mod directory;
mod list;
mod traits;

pub use allowlist::*;
pub use blacklist::*;
pub use directory::*;
pub use traits::*;

#[cfg(test)]
mod allowlist_test;
