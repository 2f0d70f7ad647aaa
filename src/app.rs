use crate::{
    config::Config, model_handle::ModelHandle, pipeline::InferencePipeline, server::HttpServer,
};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let model_handle = ModelHandle::from_config(&config.model);

    // Load eagerly so a missing artifact is reported once, at boot.
    if let Err(e) = model_handle.load() {
        tracing::error!(
            "{}. The UI will report the model as unavailable until the service is restarted.",
            e
        );
    }

    let pipeline = Arc::new(InferencePipeline::new(
        model_handle,
        config.model.get_inference_timeout(),
    ));

    let server = HttpServer::new(pipeline, &config.server, &config.ui).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_handle = server.run(shutdown_tx.subscribe()).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    server_handle.await??;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
