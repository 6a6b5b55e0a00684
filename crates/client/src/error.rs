use std::fmt;

/// Failure of one request to the prediction service.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, DNS)
    Network(String),
    /// Non-2xx response. `message` is what the user sees.
    Http { status: u16, message: String, body: String },
    /// Response body did not match the expected shape
    Parse(String),
    /// The request was abandoned by its owner
    Cancelled,
}

impl ApiError {
    pub(crate) fn from_response(status: u16, body: String) -> Self {
        ApiError::Http {
            status,
            message: read_error_message(status, &body),
            body,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Text suitable for a one-line notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Network(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http { status, message, .. } => write!(f, "HTTP {}: {}", status, message),
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Human-readable message for an error response.
///
/// A JSON body's non-blank `detail`, then `message`, wins; otherwise the raw
/// body; an empty body gets a generic message.
pub fn read_error_message(status: u16, body: &str) -> String {
    if body.is_empty() {
        return format!("Request failed with status {}", status);
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message"] {
            if let Some(text) = json[key].as_str() {
                if !text.trim().is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    body.to_string()
}
