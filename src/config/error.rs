//! Configuration error types.

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment var [{0}] is not set!")]
    MissingEnv(String),

    #[error("Invalid URL in {name}: {value} ({source})")]
    InvalidUrl {
        name: String,
        value: String,
        #[source]
        source: url::ParseError,
    },
}
