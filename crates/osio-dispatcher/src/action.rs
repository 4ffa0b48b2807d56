//! The [`Action`] trait: a unit of future work ordered by wall-clock time.

/// An abstract unit of future work with one attribute: [`Action::when`] —
/// absolute wall-clock seconds since epoch (spec.md §3, "Action (Event)").
///
/// Executing an action returns a (possibly empty) ordered sequence of
/// follow-on actions. Actions are value-like: they may embed configuration
/// and small amounts of identity, never live connections.
#[async_trait::async_trait]
pub trait Action: Send + Sync {
    /// Absolute wall-clock seconds since epoch at which this action should run.
    fn when(&self) -> f64;

    /// Run this action's work, returning any follow-on actions to enqueue.
    ///
    /// An error here aborts [`crate::Dispatcher::run`] entirely — the queue
    /// is lost and the error propagates to the caller (spec.md §4.2,
    /// "Failure semantics"). This is the escalation path for a fatal
    /// workload health failure.
    async fn execute(self: Box<Self>) -> anyhow::Result<Vec<Box<dyn Action>>>;
}
