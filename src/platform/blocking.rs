use anyhow::anyhow;

use crate::usecase::ports::repo::StoreError;

/// Runs workbook and filesystem work on the blocking pool so slow share
/// access never stalls the async workers.
pub async fn run_blocking<F, T>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| StoreError::Internal(anyhow!("blocking task failed: {err}")))?
}
