//! HTTP static file front end over a [`VirtualFs`].
//!
//! Every GET or HEAD request path is opened on the file system with its
//! leading `/` removed. Directories and missing files are 404; there are
//! no directory listings.

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::io::{self, Read};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::file::{VirtualFile, VirtualFs};

/// Router serving every path from `fs`
pub fn router<F>(fs: Arc<F>) -> Router
where
    F: VirtualFs + 'static,
{
    Router::new().fallback(serve_file::<F>).with_state(fs)
}

/// Serve `fs` on `listener` until `shutdown` completes
pub async fn run<F, S>(fs: Arc<F>, listener: TcpListener, shutdown: S) -> io::Result<()>
where
    F: VirtualFs + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }
    axum::serve(listener, router(fs))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Completes when `signal` fires.
///
/// If the signal handler cannot be installed this logs and never
/// completes, so the server keeps running instead of stopping at once.
pub async fn shutdown_on<S>(signal: S)
where
    S: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn serve_file<F>(State(fs): State<Arc<F>>, method: Method, uri: Uri) -> Response
where
    F: VirtualFs + 'static,
{
    if method != Method::GET && method != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD")]).into_response();
    }

    let path = percent_decode(uri.path().trim_start_matches('/'));
    if path.is_empty() || path.ends_with('/') {
        debug!("Rejecting directory request {}", uri.path());
        return StatusCode::NOT_FOUND.into_response();
    }

    let mime = content_type(&path);
    let result = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || read_file(fs.as_ref(), &path)).await
    };

    match result {
        Ok(Ok(data)) => {
            let headers = [
                (header::CONTENT_TYPE, mime.to_string()),
                (header::CONTENT_LENGTH, data.len().to_string()),
            ];
            let body = if method == Method::HEAD {
                Body::empty()
            } else {
                Body::from(data)
            };
            (StatusCode::OK, headers, body).into_response()
        }
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Not found: {}", path);
            StatusCode::NOT_FOUND.into_response()
        }
        Ok(Err(e)) => {
            warn!("Failed to serve {}: {}", path, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            warn!("Blocking read for {} failed: {}", path, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn read_file<F: VirtualFs>(fs: &F, path: &str) -> io::Result<Vec<u8>> {
    let mut file = fs.open(path)?;
    let mut data = Vec::with_capacity(file.stat().size as usize);
    file.read_to_end(&mut data)?;
    file.close()?;
    Ok(data)
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = (
                (bytes[i + 1] as char).to_digit(16),
                (bytes[i + 2] as char).to_digit(16),
            );
            if let (Some(hi), Some(lo)) = hex {
                out.push(((hi << 4) | lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn content_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" | "sql" => "text/plain; charset=utf-8",
        "xml" => "text/xml; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
