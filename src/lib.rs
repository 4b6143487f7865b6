//! liftlog - Personal gym tracker
//!
//! Rotates through workout plans, keeps one activity entry per calendar day
//! and tracks streaks, personal records and body measurements.

pub mod activity;
pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod exercises;
pub mod measurements;
pub mod plan;
pub mod stats;
pub mod tui;

pub use config::{Calendar, Config, CountPolicy};
pub use db::Database;
pub use error::{Error, Result};
