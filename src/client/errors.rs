use std::fmt;

/// Why a best-effort fetch came back without data.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    NotConfigured(&'static str),
    UnknownChain(String),
    Network(String),
    Status(u16),
    Malformed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotConfigured(what) => write!(f, "{} not configured", what),
            FetchError::UnknownChain(name) => write!(f, "Unknown chain: {}", name),
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Status(code) => write!(f, "Unexpected HTTP status {}", code),
            FetchError::Malformed(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        // the request URL carries the API key
        let e = e.without_url();
        match e.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None if e.is_decode() => FetchError::Malformed(e.to_string()),
            None => FetchError::Network(e.to_string()),
        }
    }
}
