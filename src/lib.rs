// ABOUTME: Root module for opfilter - operator filtering for NFT registries.
// ABOUTME: Re-exports all public types from submodules.

pub mod access;
pub mod address;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod policy;
pub mod prelude;
pub mod relay;
pub mod token;

pub use address::Address;
pub use error::GateError;
