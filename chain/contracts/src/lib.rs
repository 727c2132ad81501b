//! Cohort Deposit Custody
//!
//! This crate implements pooled, time-boxed participant deposits held in
//! custody for one cohort at a time, with role-gated judgement at cohort end.
//!
//! # Modules
//! - `errors`: Error taxonomy for custody, ledger, access and registry
//! - `events`: Events emitted by custody instances and the registry
//! - `security`: Pause guard, cohort-scoped role registry and capability check
//! - `ledger`: External token ledger interface and an in-memory ledger
//! - `config`: Cohort configuration and extraction policy
//! - `schedule`: Deposit window and finish-time stage gates
//! - `custody`: Per-cohort deposit ledger and lifecycle state machine
//! - `registry`: Cohort creation, lookup, and admin fund extraction
//! - `commitment`: Canonical snapshots and SHA-256 state roots
//!
//! # Version
//! v0.1.0

pub mod commitment;
pub mod config;
pub mod custody;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod schedule;
pub mod security;

/// Contract ABI version — frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
