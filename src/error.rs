use thiserror::Error;

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("invalid response from provider: {0}")]
    InvalidResponse(&'static str),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no stages registered")]
    NoStages,

    #[error("template error in stage {stage}: {source}")]
    Template {
        stage: String,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("stage {stage} failed: {source}")]
    Backend {
        stage: String,
        #[source]
        source: LLMError,
    },

    #[error("stage {stage} timed out after {timeout_ms} ms")]
    Timeout { stage: String, timeout_ms: u64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Everything that can abort a run once a topic is known.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to write article: {0}")]
    Persistence(#[from] std::io::Error),
}
