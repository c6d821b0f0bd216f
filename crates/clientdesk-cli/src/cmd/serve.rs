use anyhow::Context;
use clientdesk_core::config::Config;
use clientdesk_core::error::ClientdeskError;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>, open: bool) -> anyhow::Result<()> {
    let configured = match Config::load(root) {
        Ok(config) => config.server.port,
        Err(ClientdeskError::NotInitialized) => Config::new("Studio").server.port,
        Err(e) => return Err(e).context("failed to load config"),
    };
    let port = port.unwrap_or(configured);

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        tokio::select! {
            res = clientdesk_server::serve_on(root_buf, listener, open) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
