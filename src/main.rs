mod domain;
mod infra;
mod platform;
mod usecase;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::platform::config::{base_dir, config_path, load_config};
use crate::platform::http::{router, AppState};
use crate::usecase::ports::repo::StoreError;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let base_dir = base_dir();
    let config_path = config_path(&base_dir);
    let settings = load_config(&config_path).resolve(&base_dir);
    log::info!("base dir: {}", base_dir.display());
    log::info!("excel dir: {}", settings.excel_dir.display());
    log::info!("design dir: {}", settings.design_dir.display());
    log::info!("static dir: {}", settings.static_dir.display());

    std::fs::create_dir_all(&settings.data_dir).with_context(|| {
        format!("failed to create data dir: {}", settings.data_dir.display())
    })?;

    let state = AppState::from_settings(&settings);
    let default_file = state.files.default_workbook().to_string();
    match state.workbooks.validate_schema(&default_file) {
        Ok(()) => log::info!("report sheet layout verified: {default_file}"),
        Err(StoreError::Schema(err)) => {
            return Err(err).with_context(|| format!("unexpected report layout in {default_file}"));
        }
        Err(err) => log::warn!("could not verify report layout of {default_file}: {err}"),
    }
    state.sales.load();

    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", settings.host, settings.port))?;
    log::info!("listening on {}:{}", settings.host, settings.port);

    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}
