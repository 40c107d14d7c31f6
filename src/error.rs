//! Error kinds for the report pipeline.
//!
//! Each variant maps to one external collaborator: configuration lookup,
//! the document store, and the mail transport. Components hand these back
//! to the orchestrator as values; nothing unwinds past `main`.

use thiserror::Error;

/// A failure that ends a report run.
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is missing from the environment, or has an
    /// unusable value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The document store could not be reached or queried. The run aborts
    /// before producing any output.
    #[error("document store unavailable: {0}")]
    SourceUnavailable(#[from] mongodb::error::Error),

    /// The mail transport rejected or failed to deliver the message.
    #[error("report delivery failed: {0}")]
    Delivery(String),
}
