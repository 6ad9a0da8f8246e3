/// Result alias for the typed errors below.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl Error {
    /// Message for a failed response, with the body when there is one.
    pub fn status_detail(status: reqwest::StatusCode, context: &str, body: &str) -> String {
        if body.is_empty() {
            format!("{context} [{status}]")
        } else {
            format!("{context} [{status}]: {body}")
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode, context: &str, body: &str) -> Self {
        let detail = Self::status_detail(status, context, body);

        match status.as_u16() {
            401 | 403 => Error::Auth(detail),
            404 => Error::NotFound(detail),
            _ => Error::Transport(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_classifies() {
        assert!(matches!(
            Error::from_status(StatusCode::UNAUTHORIZED, "verify", ""),
            Error::Auth(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::FORBIDDEN, "verify", ""),
            Error::Auth(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::NOT_FOUND, "account", ""),
            Error::NotFound(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::BAD_GATEWAY, "followers", "oops"),
            Error::Transport(msg) if msg.contains("oops")
        ));
    }
}
