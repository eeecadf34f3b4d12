use scylla::transport::errors::QueryError;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("OpenAI API key not configured")]
    MissingApiKey,

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    #[error("could not decode row: {0}")]
    Decode(String),

    #[error("datastore error: {0}")]
    Backend(String),
}

/// Everything that can go wrong between building the prompt and flipping the
/// simulation status.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("empty response from completion API")]
    EmptyResponse,

    #[error("completion output is JSON null")]
    NullOutput,

    #[error("completion output is not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("stale threshold of {0}s is out of range")]
    ThresholdOutOfRange(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}
