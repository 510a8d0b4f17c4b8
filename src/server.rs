use std::{
    net::{SocketAddr, ToSocketAddrs},
    sync::Arc,
};

use axum::{Extension, Router, routing::get};
use tokio::sync::{Mutex, oneshot};
use url::Url;

use crate::{
    api, error,
    error::{ExportError, Result},
    types::CallbackResult,
};

/// Derives the callback server binding from the configured redirect URI:
/// the socket address to listen on and the path the provider redirects to.
pub fn callback_binding(redirect_uri: &str) -> Result<(SocketAddr, String)> {
    let url = Url::parse(redirect_uri)
        .map_err(|e| ExportError::Config(format!("invalid redirect URI {redirect_uri}: {e}")))?;

    let host = url
        .host_str()
        .ok_or_else(|| ExportError::Config(format!("redirect URI {redirect_uri} has no host")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| ExportError::Config(format!("redirect URI {redirect_uri} has no port")))?;

    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| ExportError::Config(format!("cannot resolve {host}:{port}: {e}")))?
        .next()
        .ok_or_else(|| ExportError::Config(format!("cannot resolve {host}:{port}")))?;

    let path = match url.path() {
        "" | "/" => "/callback".to_string(),
        p => p.to_string(),
    };

    Ok((addr, path))
}

/// Runs the single-attempt callback server until `shutdown` fires.
///
/// The router exposes the configured callback path plus a `/health` probe;
/// any other path falls through to axum's 404. The orchestrator owns the
/// sender half of `shutdown` and drops the listener as soon as it observes
/// a terminal result or times out.
pub async fn start_callback_server(
    addr: SocketAddr,
    callback_path: String,
    state: Arc<Mutex<Option<CallbackResult>>>,
    shutdown: oneshot::Receiver<()>,
) {
    let app = Router::new()
        .route("/health", get(api::health))
        .route(&callback_path, get(api::callback).layer(Extension(state)));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => error!("Failed to bind callback server on {}: {}", addr, e),
    };

    let serve = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = shutdown.await;
    });

    if let Err(e) = serve.await {
        error!("Callback server failed: {}", e);
    }
}
