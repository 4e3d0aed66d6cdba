//! Tag-generation backends.
//!
//! The request path consumes tag generation only through the
//! [`TagGenerator`] trait, so the backing implementation can be swapped
//! without touching admission or accounting.

pub mod keyword;

pub use keyword::KeywordTagGenerator;

use async_trait::async_trait;
use thiserror::Error;

/// Failure raised by a tag-generation backend.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct GeneratorError(pub String);

impl GeneratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A backend able to turn free text into an ordered list of tags.
///
/// Tags come back most-relevant first and callers preserve that order.
#[async_trait]
pub trait TagGenerator: Send + Sync {
    async fn generate_tags(&self, text: &str) -> Result<Vec<String>, GeneratorError>;
}
