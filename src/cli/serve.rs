use crate::web;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let (mut config, store) = super::open_store(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    if config.upload_code_required() {
        tracing::info!("Uploads require the configured upload code");
    } else {
        tracing::info!("Upload code not set, uploads are open");
    }
    if config.access.admin_code.is_none() {
        tracing::warn!("Admin code not set, anyone can delete photos");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server at http://{}", addr);

    let catalog = Arc::clone(store.catalog_handle());
    web::serve(config, catalog, &addr).await?;

    Ok(())
}
