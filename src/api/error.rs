use thiserror::Error;

/// Failures talking to the Customer Care API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Cannot connect to API at {url}")]
    Connect { url: String },

    #[error("API error {status} from {url}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl ApiError {
    /// Classify a transport error from reqwest.
    pub fn from_reqwest(url: &str, seconds: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
                seconds,
            }
        } else if err.is_connect() {
            ApiError::Connect {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            ApiError::Decode {
                url: url.to_string(),
                source: err,
            }
        } else {
            ApiError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }
}
