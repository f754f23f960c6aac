//! Answer orchestration.
//!
//! - [`router`] attributes a finished answer to a tool label
//! - [`assistant`] runs the per-query pipeline and owns the shared resources

pub mod assistant;
pub mod router;

pub use assistant::{AskOutcome, Assistant};
pub use router::{Attribution, RoutingPolicy, ToolLabel, ToolRouter};
