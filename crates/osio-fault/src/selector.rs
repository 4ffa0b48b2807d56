//! The `get_failure` selector: shuffle-then-try over a pool of prototypes
//! (spec.md §4.4).

use crate::{Failure, FailureType, NoSafeFailures};
use rand::seq::SliceRandom;

/// Shuffle `prototypes` uniformly, call `get()` on each in turn, and return
/// the first success. If every prototype raises [`NoSafeFailures`], the
/// last such error is re-raised.
pub async fn get_failure(prototypes: &[Box<dyn FailureType>]) -> Result<Box<dyn Failure>, NoSafeFailures> {
    let mut order: Vec<usize> = (0..prototypes.len()).collect();
    order.shuffle(&mut rand::thread_rng());

    let mut last_err = NoSafeFailures("no fault prototypes configured".to_string());
    for idx in order {
        match prototypes[idx].get().await {
            Ok(failure) => return Ok(failure),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct AlwaysUnsafe(&'static str);

    impl fmt::Display for AlwaysUnsafe {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "FT({})", self.0)
        }
    }

    #[async_trait::async_trait]
    impl FailureType for AlwaysUnsafe {
        async fn get(&self) -> Result<Box<dyn Failure>, NoSafeFailures> {
            Err(NoSafeFailures(self.0.to_string()))
        }
    }

    struct CountingSuccess {
        calls: Arc<AtomicUsize>,
    }

    impl fmt::Display for CountingSuccess {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "FT(counting success)")
        }
    }

    struct NoOpFailure;

    impl fmt::Display for NoOpFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "F(no-op)")
        }
    }

    #[async_trait::async_trait]
    impl Failure for NoOpFailure {
        async fn invoke(&self) -> Result<(), osio_gateway::ClusterError> {
            Ok(())
        }
        async fn mitigated(&self, _timeout_secs: f64) -> Result<bool, osio_gateway::ClusterError> {
            Ok(true)
        }
        async fn repair(&self) -> Result<(), osio_gateway::ClusterError> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl FailureType for CountingSuccess {
        async fn get(&self) -> Result<Box<dyn Failure>, NoSafeFailures> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NoOpFailure))
        }
    }

    #[tokio::test]
    async fn all_unsafe_reraises_no_safe_failures() {
        let prototypes: Vec<Box<dyn FailureType>> =
            vec![Box::new(AlwaysUnsafe("a")), Box::new(AlwaysUnsafe("b"))];
        let err = get_failure(&prototypes).await.unwrap_err();
        assert!(err.0 == "a" || err.0 == "b");
    }

    #[tokio::test]
    async fn first_success_short_circuits_remaining_prototypes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prototypes: Vec<Box<dyn FailureType>> = vec![
            Box::new(AlwaysUnsafe("a")),
            Box::new(CountingSuccess { calls: calls.clone() }),
        ];
        let failure = get_failure(&prototypes).await.unwrap();
        assert_eq!(failure.to_string(), "F(no-op)");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_prototype_list_yields_no_safe_failures() {
        let prototypes: Vec<Box<dyn FailureType>> = Vec::new();
        assert!(get_failure(&prototypes).await.is_err());
    }
}
