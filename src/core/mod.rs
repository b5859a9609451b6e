//! Core domain models for stepline
//!
//! This module defines the fundamental data structures that represent
//! pipelines, steps, triggers and run results.

pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod step;
pub mod trigger;

pub use context::*;
pub use env::{EnvironmentSet, SecretStore};
pub use error::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
pub use trigger::*;
