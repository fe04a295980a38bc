use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bus::event_types::{MSG_SESSION_EXPIRED, MSG_UNEXPECTED};
use crate::forms::FormErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Everything that can go wrong between a form and the backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Rejected locally before any request was made.
    #[error("validation failed: {0}")]
    Validation(FormErrors),
    /// Server rejected specific fields.
    #[error("server rejected fields ({status}): {}", summarize(.errors))]
    FieldErrors {
        status: u16,
        message: Option<String>,
        errors: Vec<FieldError>,
    },
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    /// 401. For backend calls the session interceptor has already run when
    /// this is returned.
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout(value.to_string());
        }
        if value.is_decode() {
            return Self::Decode(value.to_string());
        }
        Self::Transport(value.to_string())
    }
}

/// Error payloads the backend produces. `errors` comes either as a list of
/// `{field, message}` or as a `{field: [messages]}` map.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<ErrorList>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorList {
    List(Vec<FieldError>),
    Map(BTreeMap<String, Vec<String>>),
}

impl ErrorList {
    fn into_field_errors(self) -> Vec<FieldError> {
        match self {
            ErrorList::List(list) => list,
            ErrorList::Map(map) => map
                .into_iter()
                .filter_map(|(field, messages)| {
                    messages
                        .into_iter()
                        .next()
                        .map(|message| FieldError { field, message })
                })
                .collect(),
        }
    }
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 401 {
            return Self::Unauthorized;
        }

        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let errors = parsed
            .errors
            .map(ErrorList::into_field_errors)
            .unwrap_or_default();
        let message = parsed.message.filter(|m| !m.trim().is_empty());

        if !errors.is_empty() {
            return Self::FieldErrors {
                status,
                message,
                errors,
            };
        }

        let message = message.unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() || trimmed.starts_with('{') || trimmed.len() > 200 {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });
        Self::Server { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::FieldErrors { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// Text for the transient notification this error surfaces as.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => "Verifique os campos destacados".to_string(),
            Self::FieldErrors {
                message, errors, ..
            } => message
                .clone()
                .or_else(|| errors.first().map(|e| e.message.clone()))
                .unwrap_or_else(|| MSG_UNEXPECTED.to_string()),
            Self::Server { message, .. } => message.clone(),
            Self::Unauthorized => MSG_SESSION_EXPIRED.to_string(),
            Self::NotFound(what) => format!("{what} não encontrado"),
            Self::Transport(_) => "Falha de conexão com o servidor".to_string(),
            Self::Timeout(_) => "O servidor demorou demais para responder".to_string(),
            Self::Decode(_) => MSG_UNEXPECTED.to_string(),
        }
    }

    /// Whether the global interceptor owns the user-facing reaction.
    pub fn is_handled_globally(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
