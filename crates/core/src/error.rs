#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: &'static str, message: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::Config`] tied to one setting.
    pub fn config(key: &'static str, message: impl Into<String>) -> Self {
        Self::Config {
            key,
            message: message.into(),
        }
    }
}
