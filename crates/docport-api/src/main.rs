//! docport-api - HTTP document conversion server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use docport_api::{app, logging, AppState, ServiceConfig};
use docport_convert::resolve::default_chain;
use docport_convert::{ConversionEngine, ConversionPipeline, PdfTextExtractor, SofficeEngine, Sweeper};
use docport_core::defaults::SHUTDOWN_GRACE_SECS;
use docport_store::ArtifactStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env();
    let _log_guard = logging::init(config.debug);

    info!(
        bind = %config.bind_addr(),
        soffice = %config.soffice_path.display(),
        data_dir = %config.data_dir.display(),
        tmp_dir = %config.tmp_dir.display(),
        file_expiry_hours = ?config.retention.hours(),
        max_content_length = config.max_content_length,
        convert_timeout_secs = config.convert_timeout.as_secs(),
        "Configuration loaded"
    );

    // Storage
    tokio::fs::create_dir_all(&config.tmp_dir)
        .await
        .with_context(|| format!("creating TMP_DIR {}", config.tmp_dir.display()))?;
    let store = Arc::new(ArtifactStore::new(&config.data_dir, config.retention));
    store
        .validate()
        .await
        .with_context(|| format!("validating DATA_DIR {}", config.data_dir.display()))?;
    info!(data_dir = %config.data_dir.display(), "Artifact store validated");

    // Engine
    let engine = Arc::new(
        SofficeEngine::new(&config.soffice_path)
            .with_convert_timeout(config.convert_timeout)
            .with_probe_timeout(config.probe_timeout),
    );
    let status = engine.probe().await;
    if !status.available {
        warn!(
            reason = %status.info,
            "LibreOffice is not available; conversions will fail until POST /health/reprobe succeeds"
        );
    }

    let extractor = Arc::new(PdfTextExtractor::new(
        &config.pdftotext_path,
        &config.pdfinfo_path,
    ));
    let pipeline = Arc::new(
        ConversionPipeline::new(engine, store.clone(), &config.tmp_dir, status)
            .with_resolvers(default_chain(extractor)),
    );

    // Retention
    let sweeper = Sweeper::new(store, config.sweep_interval).start();

    let addr: SocketAddr = config.bind_addr().parse()?;
    let state = AppState::new(pipeline, config);
    let router = app(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        match tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), handle.shutdown()).await {
            Ok(Ok(())) => info!("Sweeper stopped"),
            Ok(Err(e)) => warn!(error = %e, "Sweeper did not stop cleanly"),
            Err(_) => warn!(
                grace_secs = SHUTDOWN_GRACE_SECS,
                "Sweeper still running at shutdown deadline"
            ),
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received; shutting down"),
        _ = terminate => info!("SIGTERM received; shutting down"),
    }
}
