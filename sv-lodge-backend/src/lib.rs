pub mod clock;
pub mod error;
pub mod forms;
pub mod front_desk;
pub mod ledger;
pub mod lifecycle;
pub mod routes;
pub mod session;

use core::convert::Infallible;
use core::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use error::AppError;
use front_desk::FrontDesk;
use http::{Method, Request, Response};
use http_body::Body;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use routes::{admin, dashboard, parse_room, rooms, session as session_routes, sync, Reply};
use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Runs one request against the front desk. Errors are rendered, never
/// returned.
pub async fn handle<B>(desk: &FrontDesk, request: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    debug!("{} {}", request.method(), request.uri());
    match route(desk, request).await {
        Ok(response) => response,
        Err(err) => err.build_error_response(),
    }
}

async fn route<B>(desk: &FrontDesk, request: Request<B>) -> Reply
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = request.into_parts();
    let segments: Vec<&str> = parts.uri.path().trim_matches('/').split('/').collect();
    match (&parts.method, segments.as_slice()) {
        (&Method::GET, ["api", "session"]) => session_routes::current(desk),
        (&Method::POST, ["api", "session"]) => session_routes::login(desk, body).await,
        (&Method::DELETE, ["api", "session"]) => session_routes::logout(desk),
        (&Method::GET, ["api", "dashboard"]) => dashboard::dashboard(desk),
        (&Method::GET, ["api", "rooms"]) => dashboard::rooms(desk),
        (&Method::GET, ["api", "bookings"]) => dashboard::bookings(desk),
        (&Method::POST, ["api", "sync"]) => sync::sync(desk).await,
        (&Method::POST, ["api", "rooms", room, "check-in"]) => {
            rooms::check_in(desk, parse_room(room)?, body).await
        }
        (&Method::POST, ["api", "rooms", room, "checkout", "quote"]) => {
            rooms::quote(desk, parse_room(room)?, body).await
        }
        (&Method::POST, ["api", "rooms", room, "checkout", "confirm"]) => {
            rooms::confirm(desk, parse_room(room)?, body).await
        }
        (&Method::GET, ["api", "rooms", room, "receipt"]) => {
            rooms::receipt(desk, parse_room(room)?, &parts.uri)
        }
        (&Method::GET, ["api", "admin", "bookings"]) => admin::bookings(desk, &parts.uri),
        (&Method::GET, ["api", "admin", "summary"]) => admin::summary(desk),
        _ => Err(AppError::NotFound),
    }
}

/// Accepts connections on `listener` until `shutdown` resolves, then lets
/// open connections finish before returning.
#[allow(clippy::cognitive_complexity)]
pub async fn run_server(
    desk: Arc<FrontDesk>,
    listener: TcpListener,
    shutdown: impl Future<Output = ()>,
) -> Result<(), AppError> {
    // tell the connections to shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let shutdown_tx = Arc::new(shutdown_tx);

    // wait for the connections to finish shutdown
    let (closed_tx, closed_rx) = watch::channel(());

    info!("listening on {}", listener.local_addr()?);
    tokio::pin!(shutdown);

    #[allow(clippy::redundant_pub_crate)]
    loop {
        select! {
            accept = listener.accept() => {
                let (socket, remote_addr) = match accept {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!("failed to accept connection: {err}");
                        continue;
                    }
                };
                debug!("connection from {remote_addr}");

                let desk = Arc::clone(&desk);
                let shutdown_tx = Arc::clone(&shutdown_tx);
                let closed_rx = closed_rx.clone();

                tokio::spawn(async move {
                    let service = hyper::service::service_fn(move |request: Request<Incoming>| {
                        let desk = Arc::clone(&desk);
                        async move { Ok::<_, Infallible>(handle(&desk, request).await) }
                    });

                    let builder =
                        hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
                    let connection = builder.serve_connection(TokioIo::new(socket), service);
                    tokio::pin!(connection);

                    let mut shutting_down = false;
                    loop {
                        select! {
                            connection_result = connection.as_mut() => {
                                if let Err(err) = connection_result {
                                    error!("failed to serve connection: {err:#}");
                                }
                                break; // (gracefully) finished connection
                            }
                            () = shutdown_tx.closed(), if !shutting_down => {
                                shutting_down = true;
                                connection.as_mut().graceful_shutdown();
                            }
                        }
                    }

                    drop(closed_rx);
                });
            }
            () = &mut shutdown => {
                info!("shutting down, waiting for open connections");
                drop(shutdown_rx); // initiate shutdown
                drop(closed_rx);
                closed_tx.closed().await;
                break;
            }
        }
    }

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
#[allow(clippy::redundant_pub_crate)]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
