//! Core domain types for outlet-sync.
//!
//! This crate is I/O-free: identifier newtypes, price parsing, remote
//! product and inventory models, declared source item groups, outlet naming
//! rules, and reconciliation outcomes shared by the engine and the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod naming;
pub mod types;

pub use types::*;
