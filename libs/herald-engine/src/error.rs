#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid topic name: '{0}'")]
    InvalidTopic(String),

    #[error("cache writer stopped")]
    CacheClosed,
}

impl EngineError {
    /// Add context to the error.
    ///
    /// Context is prepended to the message of string-carrying variants.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
