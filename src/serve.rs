//! Development file server for the build directory.
//!
//! Plain static serving over `tiny_http`: a request path is percent-decoded,
//! resolved under the build directory (directories fall back to
//! `index.html`) and answered with the file or a 404. Requests are handled
//! one at a time on the calling thread.

use percent_encoding::percent_decode_str;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Could not bind {addr}: {message}. Is another server running on that port?")]
    Bind { addr: SocketAddr, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const HTML: &str = "text/html; charset=utf-8";
const PLAIN: &str = "text/plain; charset=utf-8";

/// A bound server, not yet accepting requests.
pub struct FileServer {
    server: Server,
    addr: SocketAddr,
    root: PathBuf,
}

/// Bind `0.0.0.0:port`, serving files from `root`.
pub fn bind(port: u16, root: &Path) -> Result<FileServer, ServeError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server = Server::http(addr).map_err(|e| ServeError::Bind {
        addr,
        message: e.to_string(),
    })?;
    Ok(FileServer {
        server,
        addr,
        root: root.to_path_buf(),
    })
}

impl FileServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Answer requests until the process exits.
    pub fn run(&self) {
        for request in self.server.incoming_requests() {
            if let Err(e) = self.handle(request) {
                tracing::warn!(error = %e, "request failed");
            }
        }
    }

    fn handle(&self, request: Request) -> Result<(), ServeError> {
        let head = request.method() == &Method::Head;
        let Some(path) = resolve_path(request.url(), &self.root) else {
            tracing::debug!(url = request.url(), "not found");
            return send(request, 404, PLAIN, b"404 Not Found".to_vec(), head);
        };
        let body = fs::read(&path)?;
        send(request, 200, content_type(&path), body, head)
    }
}

fn send(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    head: bool,
) -> Result<(), ServeError> {
    let body = if head { Vec::new() } else { body };
    let mut response = Response::from_data(body).with_status_code(StatusCode(status));
    if let Ok(header) = Header::from_bytes("Content-Type", content_type) {
        response = response.with_header(header);
    }
    request.respond(response)?;
    Ok(())
}

/// File under `root` for a request URL, or `None` when missing or outside
/// `root`. Directories resolve to their `index.html`.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = root.join(&clean).canonicalize().ok()?;
    if !local.starts_with(root.canonicalize().ok()?) {
        return None;
    }
    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    index.is_file().then_some(index)
}

/// Decode, drop the query string and trim slashes.
fn normalize_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    decoded.trim_matches('/').to_string()
}

/// `Content-Type` from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html" | "htm") => HTML,
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt" | "md") => PLAIN,
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("tif" | "tiff") => "image/tiff",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("index.html"), "home");
        write(&tmp.path().join("blog/index.html"), "blog");
        write(&tmp.path().join("blog/my post.html"), "post");
        write(&tmp.path().join("assets/site.css"), "a{}");
        tmp
    }

    #[test]
    fn root_and_directories_serve_index() {
        let tmp = site();
        let root = tmp.path().canonicalize().unwrap();
        assert_eq!(resolve_path("/", tmp.path()), Some(root.join("index.html")));
        assert_eq!(
            resolve_path("/blog/", tmp.path()),
            Some(root.join("blog/index.html"))
        );
        assert_eq!(
            resolve_path("/blog", tmp.path()),
            Some(root.join("blog/index.html"))
        );
    }

    #[test]
    fn percent_encoded_and_query_urls_resolve() {
        let tmp = site();
        let root = tmp.path().canonicalize().unwrap();
        assert_eq!(
            resolve_path("/blog/my%20post.html?x=1", tmp.path()),
            Some(root.join("blog/my post.html"))
        );
    }

    #[test]
    fn missing_and_escaping_paths_are_rejected() {
        let tmp = site();
        assert_eq!(resolve_path("/nope.html", tmp.path()), None);
        assert_eq!(resolve_path("/../etc/passwd", tmp.path()), None);
        assert_eq!(resolve_path("/blog/%2e%2e/%2e%2e/x", tmp.path()), None);
        assert_eq!(resolve_path("/assets/", tmp.path()), None);
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type(Path::new("a/index.html")), HTML);
        assert_eq!(content_type(Path::new("site.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("cat.jpg")), "image/jpeg");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }
}
