//! Pipeline execution engine

pub mod engine;
pub mod events;
pub mod executor;

pub use engine::PipelineOrchestrator;
pub use events::{EventEmitter, EventHandler, ExecutionEvent};
pub use executor::JobExecutor;
