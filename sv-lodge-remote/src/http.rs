use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt as _, Full};
use hyper::body::Incoming;
use hyper::header::{CONTENT_TYPE, HOST, LOCATION};
use hyper::{Method, Request, Response, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, trace};

use crate::error::RemoteError;

/// Browsers give up after 20, the spreadsheet script needs one.
pub const MAX_REDIRECTS: usize = 5;

/// A minimal http/1.1 client over plain tcp or rustls with the webpki roots.
/// One connection per request.
#[derive(Clone)]
pub struct HttpClient {
    connector: TlsConnector,
    timeout: Option<Duration>,
}

impl HttpClient {
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut root_cert_store = RootCertStore::empty();
        root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();
        Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        }
    }

    /// GET `url`, following redirects, and return the body of the final
    /// response. Anything but a 2xx at the end is an error. The timeout
    /// covers every hop and the body.
    pub async fn get_bytes(&self, url: &Uri) -> Result<Bytes, RemoteError> {
        self.bounded(self.follow(url)).await
    }

    /// POST a json body. The response head is awaited so the request is
    /// known to be delivered, the body is never read.
    pub async fn post_json(
        &self,
        url: &Uri,
        body: Bytes,
    ) -> Result<Response<Incoming>, RemoteError> {
        self.bounded(self.send_once(Method::POST, url, Some(body))).await
    }

    async fn follow(&self, url: &Uri) -> Result<Bytes, RemoteError> {
        let mut url = url.clone();
        for _ in 0..=MAX_REDIRECTS {
            let response = self.send_once(Method::GET, &url, None).await?;
            let status = response.status();
            if status.is_redirection() {
                url = redirect_target(&url, &response)?;
                debug!("following redirect to {url}");
                continue;
            }
            if !status.is_success() {
                return Err(RemoteError::Status(status));
            }
            return Ok(response.into_body().collect().await?.to_bytes());
        }
        Err(RemoteError::TooManyRedirects(MAX_REDIRECTS))
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| RemoteError::Timeout(timeout))?,
            None => call.await,
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: &Uri,
        body: Option<Bytes>,
    ) -> Result<Response<Incoming>, RemoteError> {
        let https = match url.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            other => {
                return Err(RemoteError::UnsupportedScheme(
                    other.unwrap_or_default().to_owned(),
                ))
            }
        };
        let host = url.host().ok_or(RemoteError::MissingHost)?;
        let port = url.port_u16().unwrap_or(if https { 443 } else { 80 });
        let authority = url.authority().map_or(host, |authority| authority.as_str());
        let path = url.path_and_query().map_or("/", |path| path.as_str());

        let mut request = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, authority);
        if body.is_some() {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        let request = request.body(Full::new(body.unwrap_or_default()))?;
        trace!("{} {url}", request.method());

        let stream = TcpStream::connect((host, port)).await?;
        if https {
            let server_name = ServerName::try_from(host.to_owned())
                .map_err(|_| RemoteError::InvalidServerName(host.to_owned()))?;
            let stream = self.connector.connect(server_name, stream).await?;
            send_over(TokioIo::new(stream), request).await
        } else {
            send_over(TokioIo::new(stream), request).await
        }
    }
}

async fn send_over<I>(
    io: I,
    request: Request<Full<Bytes>>,
) -> Result<Response<Incoming>, RemoteError>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
    tokio::task::spawn(async move {
        if let Err(err) = conn.await {
            debug!("remote connection ended with error: {err}");
        }
    });
    Ok(sender.send_request(request).await?)
}

fn redirect_target<B>(current: &Uri, response: &Response<B>) -> Result<Uri, RemoteError> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(RemoteError::BadRedirect)?;
    resolve_location(current, location)
}

fn resolve_location(current: &Uri, location: &str) -> Result<Uri, RemoteError> {
    let target: Uri = location.parse()?;
    if target.scheme().is_some() {
        return Ok(target);
    }
    if !location.starts_with('/') {
        return Err(RemoteError::BadRedirect);
    }
    let (Some(scheme), Some(authority)) = (current.scheme_str(), current.authority()) else {
        return Err(RemoteError::BadRedirect);
    };
    Ok(format!("{scheme}://{authority}{location}").parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_location_wins() {
        let current: Uri = "https://script.example/macros/exec".parse().unwrap();
        let target = resolve_location(&current, "https://content.example/echo?user=1").unwrap();
        assert_eq!(target.to_string(), "https://content.example/echo?user=1");
    }

    #[test]
    fn relative_location_keeps_origin() {
        let current: Uri = "http://127.0.0.1:8080/moved".parse().unwrap();
        let target = resolve_location(&current, "/data?x=1").unwrap();
        assert_eq!(target.to_string(), "http://127.0.0.1:8080/data?x=1");
    }

    #[test]
    fn path_relative_location_is_refused() {
        let current: Uri = "http://127.0.0.1:8080/moved".parse().unwrap();
        assert!(matches!(
            resolve_location(&current, "data"),
            Err(RemoteError::BadRedirect)
        ));
    }
}
