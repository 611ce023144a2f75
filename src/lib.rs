//! Incident leaderboards for a roster of agents.
//!
//! The pure core lives in [`aggregate`], [`ranking`] and [`daily`]; [`db`]
//! and [`report`] are the Postgres store and markdown output used by the
//! command-line tool.

pub mod aggregate;
pub mod config;
pub mod daily;
pub mod db;
pub mod error;
pub mod models;
pub mod ranking;
pub mod report;

pub use error::{CoreError, CoreResult};
