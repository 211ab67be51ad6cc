//! Deployment playbooks for the Edgeless contracts.
//!
//! Each supported network has an ordered list of playbooks that deploy and
//! wire up the contracts, recording their results in a per-network JSON
//! ledger so that interrupted runs can be resumed.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod env;
pub mod errors;
pub mod ledger;
#[cfg(test)]
mod mock;
pub mod playbooks;
mod solidity;
pub mod types;
pub mod utils;
pub mod verify;
