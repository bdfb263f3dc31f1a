// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio: page-by-page editing of PDFs and images.
//
// Entry point. Initialises logging, resolves the session settings, and drives
// one session through the requested command. Failures are printed the way the
// editor shows them: the notification text plus what to do about it.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use folio_bridge::{Edit, Filter, default_surface_factory};
use folio_core::error::{FolioError, Result};
use folio_core::notify::{DEFAULT_DISMISS_AFTER, Notification, Remedy};
use folio_core::SessionConfig;
use folio_document::DocumentLoader;
use folio_session::{ExportOutcome, Session};

use cli::{Cli, Command, SourceArgs, base_config};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let note = Notification::from_error(&err, DEFAULT_DISMISS_AFTER);
            eprintln!("folio: {}", note.message);
            eprintln!("  {}", hint(note.remedy));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let base = base_config(cli.config.as_deref())?;

    match cli.command {
        Command::Open { source } => {
            let session = open(&source, base).await?;
            report_document(&session);
        }
        Command::Export {
            source,
            page,
            grayscale,
            destination,
        } => {
            let mut session = open(&source, base).await?;
            report_document(&session);

            if let Some(page) = page {
                if !session.select_page_input(&page)? {
                    tracing::warn!(%page, "Page not selected, exporting from the current page");
                }
            }
            if grayscale {
                session.apply_edit(&Edit::Filter(Filter::Grayscale))?;
            }

            match session.export(&destination.mode()).await? {
                ExportOutcome::Downloaded { path } => {
                    println!("downloaded {}", path.display());
                }
                ExportOutcome::Uploaded { filename, endpoint } => {
                    println!("uploaded {filename} to {endpoint}");
                }
            }
        }
    }

    Ok(())
}

/// Build a session for `source` and load its document.
async fn open(source: &SourceArgs, base: SessionConfig) -> Result<Session> {
    let config = source.resolve(base);
    let loader = DocumentLoader::from_config(&config);
    let factory = Arc::from(default_surface_factory(*loader.codec()));
    let mut session = Session::new(config, loader, factory);

    match &source.file {
        Some(path) => session.open_file(path).await?,
        None => {
            if !session.open_remote().await? {
                return Err(FolioError::IncompleteUrl);
            }
        }
    }

    Ok(session)
}

fn report_document(session: &Session) {
    if let Some(store) = session.store() {
        println!(
            "{}: {} page(s), page {} selected",
            store.classification(),
            store.page_count(),
            store.selected_page()
        );
    }
}

fn hint(remedy: Remedy) -> &'static str {
    match remedy {
        Remedy::Retry => "Try the same action again.",
        Remedy::ChooseAnotherDocument => "Open a different document.",
        Remedy::FixConfiguration => {
            "Check the document and upload URLs (--file-url, --api-endpoint, --query)."
        }
    }
}
