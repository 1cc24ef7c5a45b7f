//! HTTP handlers.

pub mod health;
pub mod jobs;
pub mod sources;

pub use health::{health, ready};
