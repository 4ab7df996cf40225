use core::time::Duration;

use hyper::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("remote store is not configured")]
    NotConfigured,
    #[error("invalid remote url: {0}")]
    InvalidUrl(#[from] hyper::http::uri::InvalidUri),
    #[error("unsupported url scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("remote url has no host")]
    MissingHost,
    #[error("invalid tls server name {0:?}")]
    InvalidServerName(String),
    #[error("remote answered with status {0}")]
    Status(StatusCode),
    #[error("gave up after {0} redirects")]
    TooManyRedirects(usize),
    #[error("redirect without a usable location header")]
    BadRedirect,
    #[error("unexpected remote payload: {0}")]
    UnexpectedPayload(&'static str),
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("json {0}")]
    Json(#[from] serde_json::Error),
    #[error("hyper {0}")]
    Hyper(#[from] hyper::Error),
    #[error("hyper http {0}")]
    HyperHttp(#[from] hyper::http::Error),
    #[error("io {0}")]
    Io(#[from] std::io::Error),
}
