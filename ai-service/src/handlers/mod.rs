//! HTTP handlers for the AI service.

pub mod description;
pub mod health;
pub mod metrics;
