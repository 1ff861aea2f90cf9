//! Group standings across CTF events.
//!
//! Scores are recorded per (event, group) pair and every group carries a cached
//! "best rank": the best position it reached in any event it took part in. The
//! [`standings`] module keeps that cache consistent with the participation table
//! while groups are scored, withdrawn and removed.

pub mod config;
pub mod error;
pub mod standings;
pub mod telemetry;
