use thiserror::Error;

/// Application-wide error types for Tally.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request payload failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Operation conflicts with current state (duplicate email,
    /// double completion, and the like).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A redemption was attempted without enough points.
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: i32, available: i32 },

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An upstream service (Cloudinary, the Tally API itself when called
    /// from the CLI) returned an error.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Shorthand for a [`AppError::NotFound`] with a displayable id.
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        AppError::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// True when the caller sent something wrong, as opposed to the
    /// service failing. Drives the 4xx/5xx split in the API layer.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotFound { .. }
                | AppError::Conflict(_)
                | AppError::InsufficientPoints { .. }
                | AppError::Serialization(_)
        )
    }
}
