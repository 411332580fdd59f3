//! opq-engine: the asynchronous AI operation engine
//!
//! This crate provides the operation queue and scheduler, the pollable
//! operation store, the progress bus, and the fingerprint-keyed result
//! cache. Processors and providers plug in through the traits in opq-core.

pub mod cache;
pub mod config;
pub mod engine;
pub mod notify;
pub mod store;

pub use cache::{fingerprint, ResultCache};
pub use config::EngineConfig;
pub use engine::{OperationEngine, QueueStatus};
pub use notify::{ProgressBus, ProgressSubscriber};
pub use store::OperationStore;
