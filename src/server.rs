//! HTTP server and graceful shutdown.
//!
//! The server is the thin glue between hyper and the routing core, and the
//! end of the chain in a standalone deployment: a request the core does not
//! handle has nowhere left to go, so it becomes a plain 404. Embedded in a
//! host pipeline you would call [`App::handle`] yourself and forward the
//! `None` case instead.
//!
//! # Graceful shutdown
//!
//! On SIGTERM (what Kubernetes and `kill` send) or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()` — no new connections.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], letting `main` exit cleanly.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::app::App;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and feeding them through `app`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, app: App) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Arc so the app (route table included) is shared across concurrent
        // connection tasks without copying.
        let app = Arc::new(app);

        info!(addr = %self.addr, routes = app.table().len(), "corso listening");

        // JoinSet tracks every spawned connection task so shutdown can wait
        // for all of them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting even if
                // more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { respond(app, req).await }
                        });

                        // auto::Builder speaks both HTTP/1.1 and HTTP/2,
                        // whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the JoinSet does not grow without
                // bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("corso stopped");
        Ok(())
    }
}

// ── Request hand-off ──────────────────────────────────────────────────────────

/// Bridges one hyper request into the routing core and back.
///
/// The error type is [`Infallible`](std::convert::Infallible): every
/// failure becomes a response here, hyper never sees an error.
async fn respond(
    app: Arc<App>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            error!("body read error: {e}");
            return Ok(Response::status(http::StatusCode::BAD_REQUEST).into_http());
        }
    };

    let request = Request::new(parts.method.as_str(), parts.uri.path(), headers, body);

    let response = match app.handle(request).await {
        Some(response) => response,
        // End of the chain: nothing else will handle it.
        None => Response::status(http::StatusCode::NOT_FOUND),
    };

    Ok(response.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT (Ctrl-C) on Unix, Ctrl-C only elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // Never resolves — disables the SIGTERM arm off Unix.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
