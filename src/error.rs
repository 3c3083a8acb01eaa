use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("select a {0} first")]
    SelectionRequired(&'static str),
    #[error("no valid lines found ({skipped} skipped)")]
    EmptyBatch { skipped: usize },
    #[error("record {id} is protected and cannot be deleted")]
    Protected { id: String },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("username or password is incorrect")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "bad_params",
            Self::SelectionRequired(_) => "selection_required",
            Self::EmptyBatch { .. } => "empty_batch",
            Self::Protected { .. } => "protected_record",
            Self::NotFound { .. } => "not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Store(_) => "store_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { field, .. } => Some(json!({ "field": field })),
            Self::SelectionRequired(what) => Some(json!({ "missing": what })),
            Self::EmptyBatch { skipped } => Some(json!({ "added": 0, "skipped": skipped })),
            Self::Protected { id } => Some(json!({ "id": id })),
            Self::NotFound { kind, id } => Some(json!({ "kind": kind, "id": id })),
            Self::InvalidCredentials | Self::Store(_) => None,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store(e.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
