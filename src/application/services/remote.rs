use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::common::errors::{DomainError, Result};

/// Bounds a collection service call by `timeout`.
///
/// An elapsed timer surfaces as a `Timeout` error so callers treat it like
/// any other failed fetch.
pub(crate) async fn bounded<T, F>(timeout: Duration, operation: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    time::timeout(timeout, call)
        .await
        .map_err(|_| DomainError::timeout(
            "Collection",
            format!("{} timed out after {} ms", operation, timeout.as_millis())
        ))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::ErrorKind;

    #[tokio::test]
    async fn test_elapsed_call_becomes_timeout() {
        let result: Result<()> = bounded(Duration::from_millis(10), "list_page", async {
            time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }).await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("list_page"));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<()> = bounded(Duration::from_secs(1), "list_all", async {
            Err(DomainError::fetch("Collection", "502 Bad Gateway"))
        }).await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Fetch);
    }
}
