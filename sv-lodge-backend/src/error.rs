use std::convert::Infallible;

use bytes::Bytes;
use headers::{ContentType, HeaderMapExt as _};
use http::{Response, StatusCode};
use http_body_util::Full;
use serde_json::json;
use sv_lodge_config::ConfigError;
use sv_lodge_remote::error::RemoteError;
use sv_lodge_storage::StorageError;
use tracing::{error, warn};

use crate::forms::ValidationError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("query string error: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
    #[error("webserver error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("IO error: {0}")]
    File(#[from] std::io::Error),
    #[error("could not read request body: {0}")]
    Body(Box<dyn std::error::Error + Send + Sync>),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("please log in first")]
    NotLoggedIn,
    #[error("the admin ledger is only available to administrators")]
    LedgerNotAllowed,
    #[error("room {0} does not exist")]
    UnknownRoom(u32),
    #[error("room {0} is already occupied")]
    RoomOccupied(u32),
    #[error("room {0} has no active booking")]
    NoActiveBooking(u32),
    #[error(
        "The entered amount (₹{paid}) is less than the calculated expected amount \
         (₹{expected}). Confirm to finalize this checkout with a lower payment."
    )]
    LowPayment { paid: f64, expected: f64 },
    #[error("serial number {0} is the last one available")]
    SerialExhausted(u64),
    #[error("not found")]
    NotFound,
}

impl From<Infallible> for AppError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Json(_) | Self::Query(_) | Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Self::LedgerNotAllowed => StatusCode::FORBIDDEN,
            Self::UnknownRoom(_) | Self::NoActiveBooking(_) | Self::NotFound => {
                StatusCode::NOT_FOUND
            }
            Self::RoomOccupied(_) | Self::LowPayment { .. } => StatusCode::CONFLICT,
            Self::Storage(_)
            | Self::Remote(_)
            | Self::Config(_)
            | Self::Hyper(_)
            | Self::File(_)
            | Self::SerialExhausted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error as `{"error": "..."}`. Server side failures are
    /// logged at error level, rejected requests at warn level.
    pub fn build_error_response(self) -> Response<Full<Bytes>> {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        } else {
            warn!("request rejected ({status}): {self}");
        }
        let body = match &self {
            Self::Validation(validation) => json!({
                "error": self.to_string(),
                "fields": validation.fields,
            }),
            Self::LowPayment { paid, expected } => json!({
                "error": self.to_string(),
                "paidAmount": paid,
                "expectedAmount": expected,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
        *response.status_mut() = status;
        response.headers_mut().typed_insert(ContentType::json());
        response
    }
}
