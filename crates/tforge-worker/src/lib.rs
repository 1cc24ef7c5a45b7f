//! Video generation worker.
//!
//! This crate provides:
//! - The nine stage-agents and the registry that wires them
//! - The coordinator that sequences them and reports progress
//! - Executors for the Redis stream and for the in-process queue
//! - The artifact area the stages write into

pub mod agents;
pub mod artifacts;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod registry;

pub use agents::{Stage, StageAgent};
pub use artifacts::ArtifactArea;
pub use config::{AgentConfig, WorkerConfig};
pub use coordinator::Coordinator;
pub use error::{StageError, StageResult, WorkerError, WorkerResult};
pub use executor::{heartbeat_interval, InFlight, InFlightGuard, JobExecutor, JobRunner, LocalExecutor};
pub use logging::JobLogger;
pub use registry::{AgentRegistry, Collaborators, FeedCredentials};
