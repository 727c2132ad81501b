//! Types library for cohort deposit custody
//!
//! Identifier and participant types shared by the custody contracts and
//! anything that drives them (registries, tooling, tests).
//!
//! # Modules
//! - `ids`: Unique identifiers (AccountId, CohortId, TokenId)
//! - `participant`: Participant status lifecycle and per-participant record

pub mod ids;
pub mod participant;
