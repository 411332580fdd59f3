//! opq-core: Core types and traits for opq
//!
//! This crate provides the foundational types and traits used throughout
//! the opq asynchronous AI operation engine.

pub mod error;
pub mod operation;
pub mod processor;
pub mod provider;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::Error;
pub use operation::{
    Operation, OperationInput, OperationKind, OperationResult, Priority, Progress, ProgressStatus,
    Usage,
};
pub use processor::{
    KindProfile, OperationProcessor, ProcessContext, ProcessOutcome, ProgressReporter,
};
pub use provider::{CompletionProvider, CompletionRequest, CompletionResponse};

pub type Result<T> = std::result::Result<T, Error>;
