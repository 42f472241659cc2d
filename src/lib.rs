//! # Swiss Pairing
//!
//! Swiss-system tournament pairing with rematch avoidance.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, matches, standings, pairings)
//! - **calculate**: Standings derived from recorded matches
//! - **pairing**: History tracking and the pairing search
//! - **round**: Round orchestration against a store
//! - **storage**: Persistence port with JSONL and in-memory backends
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod models;
pub mod pairing;
pub mod round;
pub mod storage;

pub use models::*;
