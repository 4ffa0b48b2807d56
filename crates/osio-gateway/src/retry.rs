//! Explicit, per-call retry policy (spec.md §4.1).
//!
//! Each gateway call accepts an optional `codes` mapping `{http_status ->
//! action}`. The default policy is `500 -> retry`. On `retry`, sleep 1s and
//! try again indefinitely. On `ignore`, the call returns `Ok(None)`. Any
//! other error propagates as [`crate::ClusterError`].

use crate::ClusterError;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Retry,
    Ignore,
}

#[derive(Debug, Clone)]
pub struct Codes(HashMap<u16, RetryAction>);

impl Default for Codes {
    fn default() -> Self {
        let mut m = HashMap::new();
        m.insert(500, RetryAction::Retry);
        Self(m)
    }
}

impl Codes {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn with(mut self, code: u16, action: RetryAction) -> Self {
        self.0.insert(code, action);
        self
    }

    fn action_for(&self, code: u16) -> Option<RetryAction> {
        self.0.get(&code).copied()
    }
}

/// Run `f` under the given retry `codes`. Returns `Ok(None)` when the
/// policy says `ignore`; `Ok(Some(value))` on success; `Err` for anything
/// the policy doesn't explicitly retry or ignore.
pub async fn call_with_retry<T, F, Fut>(codes: &Codes, mut f: F) -> Result<Option<T>, ClusterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, kube::Error>>,
{
    loop {
        match f().await {
            Ok(v) => return Ok(Some(v)),
            Err(kube::Error::Api(resp)) => match codes.action_for(resp.code) {
                Some(RetryAction::Ignore) => return Ok(None),
                Some(RetryAction::Retry) => {
                    tracing::debug!(code = resp.code, "retrying after transient api error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
                None => return Err(ClusterError::Api(kube::Error::Api(resp))),
            },
            Err(e) => return Err(ClusterError::Api(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn ignore_code_yields_none() {
        let codes = Codes::new().with(404, RetryAction::Ignore);
        let result: Result<Option<()>, ClusterError> = call_with_retry(&codes, || async {
            Err(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".into(),
                message: "nope".into(),
                reason: "NotFound".into(),
                code: 404,
            }))
        })
        .await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test(start_paused = true)]
    async fn default_codes_retry_500_until_success() {
        let codes = Codes::default();
        let attempts = Arc::new(AtomicUsize::new(0));
        let a = attempts.clone();
        let result: Result<Option<u8>, ClusterError> = call_with_retry(&codes, move || {
            let a = a.clone();
            async move {
                let n = a.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(kube::Error::Api(kube::core::ErrorResponse {
                        status: "Failure".into(),
                        message: "server error".into(),
                        reason: "InternalError".into(),
                        code: 500,
                    }))
                } else {
                    Ok(7u8)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), Some(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unlisted_code_propagates() {
        let codes = Codes::default();
        let result: Result<Option<()>, ClusterError> = call_with_retry(&codes, || async {
            Err(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".into(),
                message: "nope".into(),
                reason: "Forbidden".into(),
                code: 403,
            }))
        })
        .await;
        assert!(result.is_err());
    }
}
