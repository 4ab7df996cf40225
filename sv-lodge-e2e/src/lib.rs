//! Harness for running the real server against a stub spreadsheet.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::{BodyExt as _, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use sv_lodge_backend::error::AppError;
use sv_lodge_backend::front_desk::FrontDesk;
use sv_lodge_backend::run_server;
use sv_lodge_config::{Config, RemoteConfig};
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A spreadsheet script stand-in: GET lists every row wrapped in
/// `{"bookings": [...]}`, POST upserts one row by `id`.
#[derive(Default)]
pub struct StubSheet {
    rows: Mutex<Vec<Value>>,
    posts: Mutex<usize>,
}

impl StubSheet {
    #[must_use]
    pub fn rows(&self) -> Vec<Value> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn posts(&self) -> usize {
        self.posts.lock().map(|posts| *posts).unwrap_or_default()
    }

    pub fn insert(&self, row: Value) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.push(row);
        }
    }

    fn upsert(&self, row: Value) {
        if let Ok(mut posts) = self.posts.lock() {
            *posts += 1;
        }
        let Ok(mut rows) = self.rows.lock() else {
            return;
        };
        match rows.iter_mut().find(|existing| existing["id"] == row["id"]) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
    }

    async fn serve(
        self: Arc<Self>,
        request: Request<Incoming>,
    ) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
        let response = match *request.method() {
            Method::GET => {
                let body = json!({ "bookings": self.rows() }).to_string();
                Response::new(Full::new(Bytes::from(body)))
            }
            Method::POST => {
                let row = match request.into_body().collect().await {
                    Ok(body) => serde_json::from_slice(&body.to_bytes()).ok(),
                    Err(_) => None,
                };
                if let Some(row) = row {
                    self.upsert(row);
                }
                Response::new(Full::new(Bytes::from_static(b"{\"result\":\"ok\"}")))
            }
            _ => {
                let mut response = Response::new(Full::default());
                *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
                response
            }
        };
        Ok(response)
    }

    /// Serves the sheet on an ephemeral port until the runtime goes away.
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let sheet = Arc::clone(self);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let sheet = Arc::clone(&sheet);
                tokio::spawn(async move {
                    let service = service_fn(move |request| Arc::clone(&sheet).serve(request));
                    if let Err(err) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("stub sheet connection failed: {err}");
                    }
                });
            }
        });
        Ok(addr)
    }
}

/// The real server on an ephemeral port, backed by a temporary directory.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::result::Result<(), AppError>>,
}

impl TestServer {
    pub async fn start(storage: &TempDir, remote: Option<SocketAddr>) -> Result<Self> {
        let config = Config {
            storage_dir: Some(storage.path().to_owned()),
            rooms: 5,
            remote: RemoteConfig {
                url: remote.map(|addr| format!("http://{addr}/exec")),
                timeout_secs: Some(5),
            },
            ..Config::default()
        };
        config.validate()?;
        let desk = Arc::new(FrontDesk::from_config(&config)?);
        desk.initialize().await?;
        desk.pull_from_remote().await;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown, stop) = oneshot::channel::<()>();
        let handle = tokio::spawn(run_server(desk, listener, async move {
            let _ = stop.await;
        }));
        Ok(Self {
            addr,
            shutdown: Some(shutdown),
            handle,
        })
    }

    pub async fn stop(mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.await??;
        Ok(())
    }

    pub async fn json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let (status, body) = fetch(self.addr, method, path, body).await?;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body)?
        };
        Ok((status, value))
    }

    pub async fn text(&self, path: &str) -> Result<(StatusCode, String)> {
        let (status, body) = fetch(self.addr, Method::GET, path, None).await?;
        Ok((status, String::from_utf8(body.to_vec())?))
    }
}

/// One request over a fresh http/1.1 connection.
pub async fn fetch(
    addr: SocketAddr,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Bytes)> {
    let stream = TcpStream::connect(addr).await?;
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
    tokio::task::spawn(async move {
        if let Err(err) = conn.await {
            debug!("connection failed: {err:?}");
        }
    });

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(hyper::header::HOST, addr.to_string());
    if body.is_some() {
        request = request.header(hyper::header::CONTENT_TYPE, "application/json");
    }
    let request = request.body(Full::new(
        body.map(|body| Bytes::from(body.to_string())).unwrap_or_default(),
    ))?;

    let response = sender.send_request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, body))
}
