//! Concurrent generation-and-validation pipeline
//!
//! - `validator`: pure acceptance rules per section kind
//! - `section`: one section under a bounded retry loop
//! - `orchestrator`: fan-out, join, whole-document check, batch restarts
//! - `regenerate`: redo one section of an existing artifact
//! - `assembler`: display and storage renderings of the document

pub mod assembler;
pub mod orchestrator;
pub mod regenerate;
pub mod section;
pub mod validator;

pub use orchestrator::{Orchestrator, PipelineSettings};
pub use regenerate::{RegenerationController, RegenerationFailure};
pub use section::{run_section, RetryPolicy, SectionContext, SectionOutcome};
pub use validator::{validate, Rejection, Verdict};
