//! Scenario-based tests for stepline

mod cancellation;
mod environment;
mod failure_handling;
mod success_chain;
mod trigger;
