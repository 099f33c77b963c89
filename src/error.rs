use serde::Serialize;

/// Failures surfaced by detection and normalization.
///
/// Neither variant is retried internally: the caller has to supply a
/// corrected payload, and no placeholder summary is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummaryError {
    #[error("schema validation failed at {path}: {reason}")]
    SchemaValidation { path: String, reason: String },
    #[error("unrecognized match payload: {reason}")]
    UnrecognizedSchema { reason: String },
}

impl SummaryError {
    pub fn validation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SummaryError::SchemaValidation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unrecognized(reason: impl Into<String>) -> Self {
        SummaryError::UnrecognizedSchema {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SummaryError::SchemaValidation { .. } => "SchemaValidationError",
            SummaryError::UnrecognizedSchema { .. } => "UnrecognizedSchemaError",
        }
    }

    /// Field path of a validation failure; `None` when no mapping was attempted.
    pub fn path(&self) -> Option<&str> {
        match self {
            SummaryError::SchemaValidation { path, .. } => Some(path),
            SummaryError::UnrecognizedSchema { .. } => None,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            SummaryError::SchemaValidation { reason, .. } => reason,
            SummaryError::UnrecognizedSchema { reason } => reason,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind().to_string(),
            path: self.path().map(|path| path.to_string()),
            reason: self.reason().to_string(),
        }
    }
}

/// JSON body returned to overlay clients when a payload is rejected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub kind: String,
    pub path: Option<String>,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_carries_path() {
        let err = SummaryError::validation("participants.1.stats.pointsWon", "exceeds pointsPlayed");
        assert_eq!(err.kind(), "SchemaValidationError");
        assert_eq!(err.path(), Some("participants.1.stats.pointsWon"));
        assert_eq!(
            err.to_string(),
            "schema validation failed at participants.1.stats.pointsWon: exceeds pointsPlayed"
        );
    }

    #[test]
    fn test_unrecognized_has_no_path() {
        let body = SummaryError::unrecognized("no meta.type or participants").to_body();
        assert_eq!(body.kind, "UnrecognizedSchemaError");
        assert!(body.path.is_none());
    }
}
