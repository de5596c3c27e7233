pub mod error;
pub mod types;
pub mod providers;
pub mod topic;
pub mod stage;
pub mod registry;
pub mod retry;
pub mod pipeline;
pub mod persist;
pub mod config;
pub mod harness;
pub mod cli;

pub use error::{ConfigError, LLMError, PipelineError, RunError};
pub use providers::LLMProvider;
pub use types::{ChatMessage, CompletionRequest, CompletionResponse, MessageRole, TokenUsage};
pub use topic::Topic;
pub use stage::{BoundStage, ExecutorRole, RoleKind, StageSpec};
pub use registry::Topology;
pub use retry::RetryPolicy;
pub use pipeline::{
    PipelineEvent,
    PipelineExecutor,
    PipelineResult,
    PipelineState,
    StageOutput,
};
pub use persist::{output_filename, persist, render_document};
pub use config::RunConfig;
pub use harness::{Harness, Outcome};
