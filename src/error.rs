use std::path::PathBuf;

use serde::Serialize;

/// Errors raised while building or querying the recommender.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("data not found: {}", path.display())]
    DataNotFound { path: PathBuf },

    #[error("model unavailable ({}): {reason}", path.display())]
    ModelUnavailable { path: PathBuf, reason: String },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("similarity failed: {0}")]
    Similarity(String),
}

/// Convenience type alias.
pub type Result<T> = std::result::Result<T, RecommendError>;

/// Machine readable error category, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataNotFound,
    ModelUnavailable,
    MalformedRecord,
    Config,
    Io,
    Similarity,
}

/// Error as reported across the serving boundary.
/// Carries no backtrace, only the kind and the display message.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

impl RecommendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecommendError::DataNotFound { .. } => ErrorKind::DataNotFound,
            RecommendError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            RecommendError::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            RecommendError::Config(_) => ErrorKind::Config,
            RecommendError::Io(_) => ErrorKind::Io,
            RecommendError::Similarity(_) => ErrorKind::Similarity,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    pub(crate) fn model(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RecommendError::ModelUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<&RecommendError> for ErrorPayload {
    fn from(err: &RecommendError) -> Self {
        err.payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_snake_case_kind() {
        let err = RecommendError::DataNotFound { path: PathBuf::from("grants.tsv") };
        let json = serde_json::to_value(err.payload()).unwrap();
        assert_eq!(json["kind"], "data_not_found");
        assert_eq!(json["message"], "data not found: grants.tsv");
    }

    #[test]
    fn model_helper_keeps_reason() {
        let err = RecommendError::model("model_artifacts/theme_model.cbor", "eof");
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        assert!(err.to_string().contains("eof"));
    }
}
