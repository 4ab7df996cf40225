pub mod admin;
pub mod dashboard;
pub mod rooms;
pub mod session;
pub mod sync;

use bytes::Bytes;
use headers::{ContentType, HeaderMapExt as _};
use http::{Response, StatusCode, Uri};
use http_body::Body;
use http_body_util::{BodyExt as _, Full};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;

pub type Reply = Result<Response<Full<Bytes>>, AppError>;

pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Reply {
    let body = serde_json::to_vec(value)?;
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().typed_insert(ContentType::json());
    Ok(response)
}

#[must_use]
pub fn text_response(body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    response.headers_mut().typed_insert(ContentType::text_utf8());
    response
}

#[must_use]
pub fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::default());
    *response.status_mut() = status;
    response
}

pub async fn read_json<T, B>(body: B) -> Result<T, AppError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = body
        .collect()
        .await
        .map_err(|err| AppError::Body(err.into()))?
        .to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

/// Missing query string reads as the empty one.
pub fn read_query<T: DeserializeOwned>(uri: &Uri) -> Result<T, AppError> {
    Ok(serde_urlencoded::from_str(uri.query().unwrap_or_default())?)
}

pub fn parse_room(segment: &str) -> Result<u32, AppError> {
    segment.parse().map_err(|_| AppError::NotFound)
}
