use std::future::Future;
use std::time::Duration;

use tracing::warn;

use docqa_core::{Error, Result};

/// Run `fut` for at most `limit`, turning expiry into [`Error::Timeout`].
pub async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?limit, "external call timed out");
            Err(Error::Timeout { operation: operation.to_string(), limit })
        }
    }
}
