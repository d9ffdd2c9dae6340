//! `welcome-worker` library crate.
//!
//! Hosts the scenario controller and the process plumbing around it.
//! The binary entrypoint lives in `main.rs`; everything else is exposed
//! here for integration testing.

pub mod config;
pub mod controller;
pub mod error;
pub mod service;
pub mod simulator;
pub mod telemetry;

pub use config::{LogFormat, WorkerConfig};
pub use controller::{ScenarioController, SequenceInfo};
pub use error::{ControllerError, MalformedEventError, StartupError};
pub use service::WelcomeService;
