use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

/// Keys of the values a task carries into every run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    /// A `ChatHandle`
    Chat,
    Named(&'static str),
}

pub(crate) type ContextValues = HashMap<ContextKey, Arc<dyn Any + Send + Sync>>;

/// Handed to each run of a scheduled task
#[derive(Clone)]
pub struct TaskContext {
    name: Arc<str>,
    cancelled: watch::Receiver<bool>,
    values: Arc<ContextValues>,
}

impl TaskContext {
    pub(crate) fn new(
        name: Arc<str>,
        cancelled: watch::Receiver<bool>,
        values: Arc<ContextValues>,
    ) -> Self {
        Self {
            name,
            cancelled,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value stored under `key`, if present and of type `T`
    pub fn value<T: Any + Send + Sync>(&self, key: ContextKey) -> Option<Arc<T>> {
        self.values
            .get(&key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the task is stopped
    pub async fn cancelled(&mut self) {
        wait_cancelled(&mut self.cancelled).await
    }
}

/// Resolves when the flag turns true or its sender is gone
pub(crate) async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        let cancelled = *rx.borrow_and_update();
        if cancelled || rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_values() {
        let mut values = ContextValues::new();
        values.insert(ContextKey::Named("limit"), Arc::new(5_u32));
        let (_tx, rx) = watch::channel(false);
        let ctx = TaskContext::new(Arc::from("test"), rx, Arc::new(values));

        assert_eq!(ctx.name(), "test");
        assert_eq!(ctx.value::<u32>(ContextKey::Named("limit")).as_deref(), Some(&5));
        // Wrong type and missing key both come back empty
        assert!(ctx.value::<String>(ContextKey::Named("limit")).is_none());
        assert!(ctx.value::<u32>(ContextKey::Chat).is_none());
    }

    #[tokio::test]
    async fn test_cancellation_is_observed() {
        let (tx, rx) = watch::channel(false);
        let mut ctx = TaskContext::new(Arc::from("test"), rx, Arc::new(ContextValues::new()));
        assert!(!ctx.is_cancelled());

        tx.send_replace(true);
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_sender_counts_as_cancelled() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        wait_cancelled(&mut rx).await;
    }
}
