// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP surface of the storage server.
//
//   POST /upload      multipart `file` (+ optional `action`), stored by filename
//   GET  /uploads/*   stored documents, served as static files
//   anything else     404 "There is no such page"

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use tokio::io::AsyncWriteExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::UploadError;

pub const UPLOAD_ROUTE: &str = "/upload";
pub const FILES_ROUTE: &str = "/uploads";

/// Largest accepted request body.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024; // 64 MiB

/// `action` value asking for a new file rather than a replacement.
const ACTION_NEW: &str = "new";

pub const UPLOADED: &str = "File uploaded and replaced successfully";
pub const NOT_FOUND: &str = "There is no such page";

#[derive(Debug, Clone)]
struct UploadState {
    upload_dir: Arc<PathBuf>,
}

/// Build the server's router around `upload_dir`.
pub fn router(upload_dir: PathBuf) -> Router {
    let files = ServeDir::new(&upload_dir);
    let state = UploadState {
        upload_dir: Arc::new(upload_dir),
    };

    Router::new()
        .route(UPLOAD_ROUTE, post(upload))
        .nest_service(FILES_ROUTE, files)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, NOT_FOUND)
}

/// POST /upload
///
/// `action=new` refuses to overwrite an existing file with 409. Any other
/// action (or none) writes or replaces the file.
async fn upload(
    State(state): State<UploadState>,
    mut multipart: Multipart,
) -> Result<&'static str, UploadError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut action = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::Malformed(err.to_string()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| UploadError::Malformed(err.to_string()))?;
                file = Some((name, data.to_vec()));
            }
            Some("action") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| UploadError::Malformed(err.to_string()))?;
                action = Some(text);
            }
            other => debug!(field = ?other, "Ignoring multipart field"),
        }
    }

    let (raw_name, data) = file.ok_or(UploadError::MissingFile)?;
    let name = stored_name(&raw_name).ok_or(UploadError::InvalidFilename)?;
    let target = state.upload_dir.join(name);

    tokio::fs::create_dir_all(state.upload_dir.as_path()).await?;
    if action.as_deref() == Some(ACTION_NEW) {
        store_new(&target, &data).await.inspect_err(|err| {
            if matches!(err, UploadError::AlreadyExists) {
                info!(name, "Refusing to overwrite existing file");
            }
        })?;
    } else {
        tokio::fs::write(&target, &data).await?;
    }

    info!(name, bytes_len = data.len(), action = ?action, "File stored");
    Ok(UPLOADED)
}

/// Create `target` and write `data` to it, failing if the file already exists.
/// The existence check and the creation are one filesystem operation.
async fn store_new(target: &Path, data: &[u8]) -> Result<(), UploadError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .await
        .map_err(|err| match err.kind() {
            ErrorKind::AlreadyExists => UploadError::AlreadyExists,
            _ => UploadError::Storage(err),
        })?;

    let written = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;
    if let Err(err) = written {
        // Do not leave a truncated file that would block the next `new`.
        let _ = tokio::fs::remove_file(target).await;
        return Err(err.into());
    }
    Ok(())
}

/// The final path component of a client-supplied filename, or `None` if
/// nothing usable remains.
pub fn stored_name(raw: &str) -> Option<&str> {
    let last = raw.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Path::new(last).file_name().and_then(|name| name.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    const BOUNDARY: &str = "folio-test-boundary";

    fn upload_request(filename: &str, action: Option<&str>, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
        if let Some(action) = action {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"action\"\r\n\r\n{action}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(UPLOAD_ROUTE)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn upload_stores_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(dir.path().to_path_buf());

        let (status, body) = send(app, upload_request("a.pdf", Some("replace"), b"%PDF")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, UPLOADED);
        assert_eq!(std::fs::read(dir.path().join("a.pdf")).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn concurrent_new_uploads_store_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(dir.path().to_path_buf());

        let (first, second) = tokio::join!(
            send(app.clone(), upload_request("race.pdf", Some("new"), b"first")),
            send(app.clone(), upload_request("race.pdf", Some("new"), b"second")),
        );
        let statuses = [first.0, second.0];
        assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
        assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 1);

        let stored = std::fs::read(dir.path().join("race.pdf")).unwrap();
        let winner: &[u8] = if first.0 == StatusCode::OK { b"first" } else { b"second" };
        assert_eq!(stored, winner);
    }

    #[tokio::test]
    async fn new_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"old").unwrap();
        let app = router(dir.path().to_path_buf());

        let (status, body) = send(app, upload_request("a.png", Some("new"), b"new")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "File already exists");
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn replace_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"old").unwrap();
        let app = router(dir.path().to_path_buf());

        let (status, _) = send(app, upload_request("a.png", None, b"fresh")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn new_file_is_created_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("store");
        let app = router(nested.clone());

        let (status, _) = send(app, upload_request("b.jpg", Some("new"), b"jpg")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(nested.join("b.jpg").exists());
    }

    #[tokio::test]
    async fn path_components_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(dir.path().to_path_buf());

        let (status, _) = send(app, upload_request("../../escape.png", None, b"x")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(dir.path().join("escape.png").exists());
    }

    #[tokio::test]
    async fn stored_files_are_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.pdf"), b"%PDF-1.5").unwrap();
        let app = router(dir.path().to_path_buf());

        let request = Request::builder()
            .uri("/uploads/doc.pdf")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"%PDF-1.5");
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder().uri("/nowhere").body(Body::empty()).unwrap();
        let (status, body) = send(router(dir.path().to_path_buf()), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_without_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"action\"\r\n\r\nnew\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri(UPLOAD_ROUTE)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, _) = send(router(dir.path().to_path_buf()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn stored_names() {
        assert_eq!(stored_name("report.pdf"), Some("report.pdf"));
        assert_eq!(stored_name("a/b/c.png"), Some("c.png"));
        assert_eq!(stored_name("C:\\Users\\x\\d.jpg"), Some("d.jpg"));
        assert_eq!(stored_name(""), None);
        assert_eq!(stored_name("dir/"), None);
        assert_eq!(stored_name(".."), None);
    }
}
