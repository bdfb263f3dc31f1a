// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-server: a small storage server for Folio exports.
//
// Accepts multipart uploads on `/upload` and serves the stored files back from
// `/uploads/`, which is where a session's `fileUrl` usually points.

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::UploadError;
pub use routes::router;

use tokio::net::TcpListener;
use tracing::info;

/// Bind `config.bind_addr()` and serve until Ctrl+C.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        upload_dir = %config.upload_dir.display(),
        "Storage server listening"
    );

    axum::serve(listener, router(config.upload_dir))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Storage server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
