//! Errors returned by the gateway and the console
//!
use snafu::prelude::*;

/// Errors returned by uht-admin
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AdminError {
    // Http connection or timeout error
    #[snafu(display("HTTP error {method} url:{url}"))]
    Http {
        method: String,
        url: String,
        source: reqwest::Error,
    },

    /// Controller responded with a non-success status.
    /// `message` is the raw response body.
    #[snafu(display("Controller reported error ({code}) {method} {url}: {message}"))]
    ApiError {
        code: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Encountered a retryable failure, but all retry attempts failed.
    /// `code` and `message` are the status and raw body of the last attempt.
    #[snafu(display("controller request: failed {n} times, last status {code}"))]
    TooManyRetries { n: u32, code: u16, message: String },

    /// Response body was not valid json for the expected shape.
    #[snafu(display("Deserialization: {source}"))]
    Deserialization { source: serde_json::Error },

    /// Request body could not be serialized. If you see this error, please report it as a bug.
    #[snafu(display("Serialization: {source}"))]
    Serialization { source: serde_json::Error },

    /// Response parsed as json but failed schema checks.
    #[snafu(display("Malformed {what} response: {message}"))]
    MalformedResponse { what: String, message: String },

    /// Application error reported by a gateway implementation.
    #[snafu(display("{message}"))]
    Gateway { message: String },

    /// Some other error occurred
    #[snafu(display("{message}"))]
    Other { message: String },
}

impl AdminError {
    /// Returns the message to show to the user.
    ///
    /// When the controller supplied a message in its error body, that message is
    /// returned. Otherwise the error's display text is used.
    pub fn user_message(&self) -> String {
        match self {
            AdminError::ApiError { message, .. } | AdminError::TooManyRetries { message, .. } => {
                server_message(message).unwrap_or_else(|| self.to_string())
            }
            AdminError::Gateway { message } => message.clone(),
            _ => self.to_string(),
        }
    }

    /// true if the failure happened before the request reached the controller,
    /// or the controller reported itself busy
    pub fn is_transient(&self) -> bool {
        match self {
            AdminError::Http { source, .. } => source.is_connect() || source.is_timeout(),
            AdminError::ApiError { code, .. } => matches!(code, 408 | 504),
            AdminError::TooManyRetries { .. } => true,
            _ => false,
        }
    }
}

/// Extracts the human-readable message from a controller error body.
///
/// Accepted shapes: `{"body":{"message":..}}`, `{"message":..}`, and
/// `[{"message":..}, ..]` (first element). Plain-text bodies are returned trimmed.
pub fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return Some(trimmed.to_string());
    };
    let candidate = match &value {
        serde_json::Value::Array(items) => items.first(),
        other => Some(other),
    }?;
    candidate
        .pointer("/body/message")
        .or_else(|| candidate.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

/// Error taxonomy for console failures, used to pick notification titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorClass {
    /// Object or field list could not be fetched. UI continues with empty or partial data.
    #[strum(to_string = "load")]
    Load,
    /// Persisting the delta failed. Selection is retained.
    #[strum(to_string = "save")]
    Save,
    /// Save was requested with an empty delta. Informational.
    #[strum(to_string = "no-changes")]
    NoChanges,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_unwraps_body_message() {
        let body = r#"{"body":{"message":"Failed to load objects"}}"#;
        assert_eq!(
            server_message(body).as_deref(),
            Some("Failed to load objects")
        );
    }

    #[test]
    fn server_message_accepts_top_level_and_array_shapes() {
        assert_eq!(
            server_message(r#"{"message":"Save failed"}"#).as_deref(),
            Some("Save failed")
        );
        assert_eq!(
            server_message(r#"[{"errorCode":"APEX_ERROR","message":"boom"}]"#).as_deref(),
            Some("boom")
        );
    }

    #[test]
    fn server_message_plain_text_and_empty() {
        assert_eq!(server_message("  gateway down \n").as_deref(), Some("gateway down"));
        assert_eq!(server_message("   "), None);
        assert_eq!(server_message(r#"{"code":12}"#), None);
    }

    #[test]
    fn user_message_prefers_server_text() {
        let err = AdminError::ApiError {
            code: 500,
            method: "POST".into(),
            url: "/tracked-configuration".into(),
            message: r#"{"body":{"message":"Save failed"}}"#.into(),
        };
        assert_eq!(err.user_message(), "Save failed");

        let err = AdminError::ApiError {
            code: 500,
            method: "GET".into(),
            url: "/objects".into(),
            message: String::new(),
        };
        assert!(err.user_message().contains("(500) GET /objects"));
    }

    #[test]
    fn transient_status_codes() {
        let busy = AdminError::ApiError {
            code: 504,
            method: "GET".into(),
            url: "/objects".into(),
            message: String::new(),
        };
        assert!(busy.is_transient());
        assert!(!AdminError::Gateway { message: "x".into() }.is_transient());

        let throttled = AdminError::ApiError {
            code: 429,
            method: "GET".into(),
            url: "/objects".into(),
            message: String::new(),
        };
        assert!(!throttled.is_transient());
    }

    #[test]
    fn exhausted_retries_keep_last_server_message() {
        let err = AdminError::TooManyRetries {
            n: 4,
            code: 504,
            message: r#"{"message":"Controller busy, try later"}"#.into(),
        };
        assert_eq!(err.user_message(), "Controller busy, try later");
        assert!(err.is_transient());

        let err = AdminError::TooManyRetries {
            n: 2,
            code: 408,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "controller request: failed 2 times, last status 408");
    }
}
