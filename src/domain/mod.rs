//! Core domain types and logic.

pub mod trade;
pub mod journal;
pub mod analytics;
pub mod periods;
pub mod fire;
pub mod regime;
pub mod config_validation;
pub mod error;
