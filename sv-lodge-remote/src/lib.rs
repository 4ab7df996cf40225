pub mod error;
pub mod http;

use core::time::Duration;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use error::RemoteError;
use hyper::Uri;
use sv_lodge_config::RemoteConfig;
use sv_lodge_storage::models::Booking;
use tracing::{debug, info, warn};

use crate::http::HttpClient;

/// The authoritative booking store behind the front desk, usually a
/// spreadsheet script. Upserting by booking id is the remote side's job.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_bookings(&self) -> Result<Vec<Booking>, RemoteError>;

    async fn push_booking(&self, booking: &Booking) -> Result<(), RemoteError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Stand-in used when no remote url is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledRemote;

#[async_trait]
impl RemoteStore for DisabledRemote {
    async fn fetch_bookings(&self) -> Result<Vec<Booking>, RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn push_booking(&self, _booking: &Booking) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct HttpRemoteStore {
    url: Uri,
    client: HttpClient,
}

impl HttpRemoteStore {
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, RemoteError> {
        let url: Uri = url.parse()?;
        if url.host().is_none() {
            return Err(RemoteError::MissingHost);
        }
        Ok(Self {
            url,
            client: HttpClient::new(timeout),
        })
    }

    #[must_use]
    pub const fn url(&self) -> &Uri {
        &self.url
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_bookings(&self) -> Result<Vec<Booking>, RemoteError> {
        let body = self.client.get_bytes(&self.url).await?;
        let bookings = parse_bookings(&body)?;
        debug!("fetched {} bookings from {}", bookings.len(), self.url);
        Ok(bookings)
    }

    async fn push_booking(&self, booking: &Booking) -> Result<(), RemoteError> {
        let body = Bytes::from(serde_json::to_vec(booking)?);
        let response = self.client.post_json(&self.url, body).await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            warn!("remote answered {status} to booking {}", booking.id);
        } else {
            debug!("pushed booking {} ({status})", booking.id);
        }
        Ok(())
    }
}

/// The script answers either with a bare array or with `{"bookings": [...]}`.
pub fn parse_bookings(body: &[u8]) -> Result<Vec<Booking>, RemoteError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        serde_json::Value::Object(mut object) => match object.remove("bookings") {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(bookings @ serde_json::Value::Array(_)) => Ok(serde_json::from_value(bookings)?),
            Some(_) => Err(RemoteError::UnexpectedPayload("`bookings` is not an array")),
        },
        _ => Err(RemoteError::UnexpectedPayload(
            "expected an array or an object with `bookings`",
        )),
    }
}

pub fn from_config(config: &RemoteConfig) -> Result<Arc<dyn RemoteStore>, RemoteError> {
    match &config.url {
        Some(url) => {
            let store = HttpRemoteStore::new(url, config.timeout_secs.map(Duration::from_secs))?;
            info!("syncing with remote store at {}", store.url());
            Ok(Arc::new(store))
        }
        None => {
            info!("no remote store configured, running on local data only");
            Ok(Arc::new(DisabledRemote))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"{
        "id": "abc123xyz", "serialNumber": 3, "roomNumber": 7,
        "guestName": "Asha", "phone": "9876500000", "aadhaar": "111122223333",
        "address": "Nellore", "checkInTime": "2024-05-01T10:00:00.000Z",
        "status": "CLOSED", "checkOutTime": "2024-05-01T12:00:00.000Z",
        "paidAmount": 100, "receptionistName": "Ramesh", "receptionistPhone": "9000000002"
    }"#;

    #[test]
    fn parses_bare_array() {
        let bookings = parse_bookings(format!("[{ROW}]").as_bytes()).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].serial_number, 3);
    }

    #[test]
    fn parses_wrapped_object() {
        let bookings = parse_bookings(format!(r#"{{"bookings": [{ROW}, {ROW}]}}"#).as_bytes())
            .unwrap();
        assert_eq!(bookings.len(), 2);
    }

    #[test]
    fn object_without_bookings_is_empty() {
        assert!(parse_bookings(br#"{"result": "ok"}"#).unwrap().is_empty());
        assert!(parse_bookings(br#"{"bookings": null}"#).unwrap().is_empty());
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(matches!(
            parse_bookings(b"42"),
            Err(RemoteError::UnexpectedPayload(_))
        ));
        assert!(matches!(
            parse_bookings(br#"{"bookings": "none"}"#),
            Err(RemoteError::UnexpectedPayload(_))
        ));
        assert!(matches!(parse_bookings(b"<html>"), Err(RemoteError::Json(_))));
    }

    #[test]
    fn one_bad_row_fails_everything() {
        let body = format!(r#"[{ROW}, {{"id": "x"}}]"#);
        assert!(parse_bookings(body.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn disabled_remote_reports_not_configured() {
        let remote = DisabledRemote;
        assert!(!remote.is_configured());
        assert!(matches!(
            remote.fetch_bookings().await,
            Err(RemoteError::NotConfigured)
        ));
    }

    #[test]
    fn from_config_without_url_is_disabled() {
        let remote = from_config(&RemoteConfig::default()).unwrap();
        assert!(!remote.is_configured());
    }

    #[test]
    fn from_config_rejects_relative_url() {
        let config = RemoteConfig {
            url: Some("/exec".to_owned()),
            timeout_secs: None,
        };
        assert!(from_config(&config).is_err());
    }
}
