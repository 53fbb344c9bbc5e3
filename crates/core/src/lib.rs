//! Intent routing and workflow orchestration for ContentIQ.
//!
//! [`IntentClassifier`] maps a free-text prompt to a structured [`Intent`];
//! [`Orchestrator`] executes the fixed pipeline for the classified action and
//! synthesizes an execution summary from the aggregated counters.
//!
//! [`Intent`]: contentiq_shared::Intent

pub mod classifier;
pub mod orchestrator;

pub use classifier::IntentClassifier;
pub use orchestrator::{Orchestrator, ProcessedPrompt, WorkflowOutcome};
