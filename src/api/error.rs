use thiserror::Error;

/// Failure of a single backend request.
///
/// `Status` renders as the status code followed by the raw response body, verbatim;
/// that string is what surfaces in the dashboard's error banner.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{status} {body}")]
    Status { status: u16, body: String },
    #[error("request to {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response body from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response from {path}")]
    Empty { path: String },
}

impl TransportError {
    /// HTTP status for non-success responses, `None` for client-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_is_code_then_body() {
        let err = TransportError::Status {
            status: 404,
            body: r#"{"detail":"Run not found"}"#.into(),
        };
        assert_eq!(err.to_string(), r#"404 {"detail":"Run not found"}"#);
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_empty_error_has_no_status() {
        let err = TransportError::Empty {
            path: "/runs/r1".into(),
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "empty response from /runs/r1");
    }
}
