//! Server wiring: store, resize queue, listener and signal handling.

use anyhow::Context;
use getit_config_and_utils::Paths;
use getit_net::{Outcome, TcpServer};
use getit_protocol::Request;
use getit_store::Store;
use std::sync::Arc;
use tracing::{info, warn};

/// Route one decoded request into the dispatcher.
pub(crate) async fn handle_request(store: Arc<Store>, request: Request) -> Outcome {
    if request.is_stream() {
        Outcome::Stream(store.dispatch_stream(&request).await)
    } else {
        Outcome::Single(store.dispatch(&request).await)
    }
}

/// Run the server until the listener closes (signal or `exit` verb).
pub async fn run_server(paths: Paths, port: u16) -> anyhow::Result<()> {
    let (store, resize_rx) = Store::open(&paths).context("failed to open store")?;
    tokio::spawn(store.clone().run_resize_queue(resize_rx));

    let dispatcher = store.clone();
    let server = TcpServer::bind(port, move |request| {
        handle_request(dispatcher.clone(), request)
    })
    .await
    .context("failed to bind listener")?;

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal");
        shutdown.cancel();
    });

    server.run().await.context("server terminated with an error")?;
    info!("Exiting");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to install terminate handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
